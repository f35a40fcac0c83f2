//! Comment service.

use sea_orm::Set;
use validator::Validate;
use yatube_common::{AppResult, IdGenerator};
use yatube_db::{
    entities::comment,
    repositories::{CommentRepository, PostRepository, UserRepository},
};

use super::form::validate_not_blank;

#[derive(Debug, Validate)]
struct CommentInput<'a> {
    #[validate(custom(function = "validate_not_blank"))]
    text: &'a str,
}

/// Comment service for business logic.
#[derive(Clone)]
pub struct CommentService {
    comment_repo: CommentRepository,
    post_repo: PostRepository,
    user_repo: UserRepository,
    id_gen: IdGenerator,
}

impl CommentService {
    /// Create a new comment service.
    #[must_use]
    pub fn new(
        comment_repo: CommentRepository,
        post_repo: PostRepository,
        user_repo: UserRepository,
    ) -> Self {
        Self {
            comment_repo,
            post_repo,
            user_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Comment on `username`'s post `post_id` as `author_id`.
    ///
    /// Blank text is dropped silently and yields `None`.
    pub async fn add(
        &self,
        author_id: &str,
        username: &str,
        post_id: &str,
        text: &str,
    ) -> AppResult<Option<comment::Model>> {
        let post_author = self.user_repo.get_by_username(username).await?;
        let post = self.post_repo.get_by_author(&post_author.id, post_id).await?;

        let input = CommentInput { text };
        if input.validate().is_err() {
            tracing::debug!(post_id = %post.id, "Blank comment dropped");
            return Ok(None);
        }

        let model = comment::ActiveModel {
            id: Set(self.id_gen.generate()),
            post_id: Set(post.id.clone()),
            author_id: Set(author_id.to_string()),
            text: Set(text.trim().to_string()),
            created: Set(chrono::Utc::now().into()),
        };

        let comment = self.comment_repo.create(model).await?;
        tracing::info!(comment_id = %comment.id, post_id = %post.id, "Comment added");

        Ok(Some(comment))
    }
}
