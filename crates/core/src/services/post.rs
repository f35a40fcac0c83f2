//! Post service: authoring, editing and the post page.

use std::sync::Arc;

use bytes::Bytes;
use image::ImageFormat;
use sea_orm::Set;
use validator::Validate;
use yatube_common::{AppResult, IdGenerator, StorageBackend, generate_storage_key};
use yatube_db::{
    entities::{comment, post, user},
    repositories::{CommentRepository, GroupRepository, PostRepository, PostScope, UserRepository},
};

use super::form::{FieldErrors, FormOutcome, validate_not_blank};
use super::listing::PostEntry;

const INVALID_GROUP: &str = "Select a valid choice. That choice is not one of the available choices.";
const INVALID_IMAGE: &str =
    "Upload a valid image. The file you uploaded was either not an image or a corrupted image.";
const EMPTY_IMAGE: &str = "The submitted file is empty.";

/// An uploaded image file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    pub filename: String,
    pub data: Bytes,
}

/// What to do with a post's image.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ImageChange {
    /// Leave the current image (or lack of one) alone.
    #[default]
    Keep,
    /// Remove the current image.
    Clear,
    /// Replace the current image.
    Upload(ImageUpload),
}

/// Submitted post form.
#[derive(Debug, Clone, Default, Validate)]
pub struct PostInput {
    #[validate(custom(function = "validate_not_blank"))]
    pub text: String,

    /// Group slug; `None` or empty means no group.
    pub group: Option<String>,

    pub image: ImageChange,
}

/// Result of submitting the edit form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOutcome {
    /// The post was updated.
    Saved(post::Model),
    /// The input was rejected; the post is unchanged.
    Invalid {
        post: post::Model,
        errors: FieldErrors,
    },
    /// The editor does not own the post; nothing was touched.
    NotAuthor(post::Model),
}

/// A comment with its author.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentEntry {
    pub comment: comment::Model,
    pub author: user::Model,
}

/// Everything the post page shows.
#[derive(Debug, Clone)]
pub struct PostDetail {
    pub entry: PostEntry,
    /// Oldest first.
    pub comments: Vec<CommentEntry>,
    pub author_posts_count: u64,
}

enum CleanedImage {
    Keep,
    Clear,
    Store { data: Bytes, format: ImageFormat },
}

struct CleanedPost {
    text: String,
    group_id: Option<String>,
    image: CleanedImage,
}

/// Post service for business logic.
#[derive(Clone)]
pub struct PostService {
    post_repo: PostRepository,
    user_repo: UserRepository,
    group_repo: GroupRepository,
    comment_repo: CommentRepository,
    storage: Arc<dyn StorageBackend>,
    id_gen: IdGenerator,
}

impl PostService {
    /// Create a new post service.
    #[must_use]
    pub fn new(
        post_repo: PostRepository,
        user_repo: UserRepository,
        group_repo: GroupRepository,
        comment_repo: CommentRepository,
        storage: Arc<dyn StorageBackend>,
    ) -> Self {
        Self {
            post_repo,
            user_repo,
            group_repo,
            comment_repo,
            storage,
            id_gen: IdGenerator::new(),
        }
    }

    /// Public URL of a post's image.
    #[must_use]
    pub fn image_url(&self, post: &post::Model) -> Option<String> {
        post.image.as_deref().map(|key| self.storage.public_url(key))
    }

    /// Look up `username` and their post `post_id`.
    ///
    /// Unknown user, unknown post, or a post by someone else are all not found.
    pub async fn get_for_author(
        &self,
        username: &str,
        post_id: &str,
    ) -> AppResult<(user::Model, post::Model)> {
        let author = self.user_repo.get_by_username(username).await?;
        let post = self.post_repo.get_by_author(&author.id, post_id).await?;
        Ok((author, post))
    }

    /// Publish a new post written by `author`.
    pub async fn create(
        &self,
        author: &user::Model,
        input: PostInput,
    ) -> AppResult<FormOutcome<post::Model>> {
        let cleaned = match self.clean(input).await? {
            Ok(cleaned) => cleaned,
            Err(errors) => return Ok(FormOutcome::Invalid(errors)),
        };

        let image = match cleaned.image {
            CleanedImage::Store { data, format } => {
                Some(self.store_image(&author.id, &data, format).await?)
            }
            CleanedImage::Keep | CleanedImage::Clear => None,
        };

        let model = post::ActiveModel {
            id: Set(self.id_gen.generate()),
            text: Set(cleaned.text),
            pub_date: Set(chrono::Utc::now().into()),
            author_id: Set(author.id.clone()),
            group_id: Set(cleaned.group_id),
            image: Set(image.clone()),
        };

        let post = match self.post_repo.create(model).await {
            Ok(post) => post,
            Err(e) => {
                self.discard_image(image.as_deref()).await;
                return Err(e);
            }
        };

        tracing::info!(post_id = %post.id, author_id = %author.id, "Post created");
        Ok(FormOutcome::Saved(post))
    }

    /// Edit `username`'s post `post_id` on behalf of `editor_id`.
    ///
    /// Only text, group and image change; the publication date and author
    /// are kept.
    pub async fn edit(
        &self,
        editor_id: &str,
        username: &str,
        post_id: &str,
        input: PostInput,
    ) -> AppResult<EditOutcome> {
        let (author, post) = self.get_for_author(username, post_id).await?;
        if author.id != editor_id {
            tracing::debug!(post_id = %post.id, editor_id = %editor_id, "Edit by non-author ignored");
            return Ok(EditOutcome::NotAuthor(post));
        }

        let cleaned = match self.clean(input).await? {
            Ok(cleaned) => cleaned,
            Err(errors) => return Ok(EditOutcome::Invalid { post, errors }),
        };

        let old_image = post.image.clone();
        let mut active: post::ActiveModel = post.into();
        active.text = Set(cleaned.text);
        active.group_id = Set(cleaned.group_id);

        let new_image = match cleaned.image {
            CleanedImage::Keep => None,
            CleanedImage::Clear => {
                active.image = Set(None);
                None
            }
            CleanedImage::Store { data, format } => {
                let key = self.store_image(&author.id, &data, format).await?;
                active.image = Set(Some(key.clone()));
                Some(key)
            }
        };
        let image_changed = active.image.is_set();

        let updated = match self.post_repo.update(active).await {
            Ok(updated) => updated,
            Err(e) => {
                self.discard_image(new_image.as_deref()).await;
                return Err(e);
            }
        };

        if image_changed {
            self.discard_image(old_image.as_deref()).await;
        }

        tracing::info!(post_id = %updated.id, "Post edited");
        Ok(EditOutcome::Saved(updated))
    }

    /// The post page for `username`'s post `post_id`.
    pub async fn view(&self, username: &str, post_id: &str) -> AppResult<PostDetail> {
        let (author, post) = self.get_for_author(username, post_id).await?;

        let group = match post.group_id.as_deref() {
            Some(group_id) => self.group_repo.find_by_id(group_id).await?,
            None => None,
        };

        let comments = self.comment_repo.find_by_post(&post.id).await?;
        let mut commenter_ids: Vec<String> = comments.iter().map(|c| c.author_id.clone()).collect();
        commenter_ids.sort_unstable();
        commenter_ids.dedup();
        let commenters = self.user_repo.find_by_ids(&commenter_ids).await?;

        let comments = comments
            .into_iter()
            .filter_map(|comment| {
                let author = commenters.iter().find(|u| u.id == comment.author_id)?.clone();
                Some(CommentEntry { comment, author })
            })
            .collect();

        let author_posts_count = self.post_repo.count(PostScope::Author(&author.id)).await?;

        Ok(PostDetail {
            entry: PostEntry {
                post,
                author,
                group,
            },
            comments,
            author_posts_count,
        })
    }

    async fn clean(&self, input: PostInput) -> AppResult<Result<CleanedPost, FieldErrors>> {
        let mut errors = match input.validate() {
            Ok(()) => FieldErrors::new(),
            Err(e) => FieldErrors::from(&e),
        };

        let group_id = match input.group.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(slug) => match self.group_repo.find_by_slug(slug).await? {
                Some(group) => Some(group.id),
                None => {
                    errors.add("group", INVALID_GROUP);
                    None
                }
            },
        };

        let image = match input.image {
            ImageChange::Keep => CleanedImage::Keep,
            ImageChange::Clear => CleanedImage::Clear,
            ImageChange::Upload(upload) if upload.data.is_empty() => {
                errors.add("image", EMPTY_IMAGE);
                CleanedImage::Keep
            }
            ImageChange::Upload(upload) => match inspect_image(&upload.data) {
                Some(format) => CleanedImage::Store {
                    data: upload.data,
                    format,
                },
                None => {
                    tracing::debug!(filename = %upload.filename, "Rejected upload that is not an image");
                    errors.add("image", INVALID_IMAGE);
                    CleanedImage::Keep
                }
            },
        };

        if !errors.is_empty() {
            return Ok(Err(errors));
        }

        Ok(Ok(CleanedPost {
            text: input.text.trim().to_string(),
            group_id,
            image,
        }))
    }

    async fn store_image(
        &self,
        author_id: &str,
        data: &[u8],
        format: ImageFormat,
    ) -> AppResult<String> {
        let extension = format.extensions_str().first().copied().unwrap_or("bin");
        let key = generate_storage_key(author_id, &format!("image.{extension}"));
        let stored = self
            .storage
            .upload(&key, data, format.to_mime_type())
            .await?;
        Ok(stored.key)
    }

    async fn discard_image(&self, key: Option<&str>) {
        if let Some(key) = key
            && let Err(e) = self.storage.delete(key).await
        {
            tracing::warn!(key = %key, error = %e, "Failed to delete image file");
        }
    }
}

/// Detect a supported image format and check that the data decodes.
fn inspect_image(data: &[u8]) -> Option<ImageFormat> {
    let format = image::guess_format(data).ok()?;
    if !matches!(
        format,
        ImageFormat::Gif | ImageFormat::Png | ImageFormat::Jpeg | ImageFormat::WebP
    ) {
        return None;
    }
    image::load_from_memory_with_format(data, format).ok()?;
    Some(format)
}
