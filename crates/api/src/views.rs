//! JSON view models.
//!
//! Each page handler returns one of these; a presentation layer renders it.

#![allow(missing_docs)]

use chrono::{DateTime, FixedOffset};
use serde::Serialize;
use yatube_common::Page;
use yatube_core::{CommentEntry, FieldErrors, PostDetail, PostEntry, PostService, ProfilePage};
use yatube_db::entities::{group, user};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: String,
    pub username: String,
    pub name: Option<String>,
}

impl From<user::Model> for UserView {
    fn from(user: user::Model) -> Self {
        Self {
            id: user.id,
            username: user.username,
            name: user.name,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupView {
    pub title: String,
    pub slug: String,
    pub description: String,
}

impl From<group::Model> for GroupView {
    fn from(group: group::Model) -> Self {
        Self {
            title: group.title,
            slug: group.slug,
            description: group.description,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostView {
    pub id: String,
    pub text: String,
    pub pub_date: DateTime<FixedOffset>,
    pub author: UserView,
    pub group: Option<GroupView>,
    /// Public URL of the attached image.
    pub image: Option<String>,
}

impl PostView {
    #[must_use]
    pub fn new(entry: PostEntry, posts: &PostService) -> Self {
        let image = posts.image_url(&entry.post);
        Self {
            id: entry.post.id,
            text: entry.post.text,
            pub_date: entry.post.pub_date,
            author: entry.author.into(),
            group: entry.group.map(Into::into),
            image,
        }
    }
}

fn post_page(page: Page<PostEntry>, posts: &PostService) -> Page<PostView> {
    page.map(|entry| PostView::new(entry, posts))
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexView {
    pub page: Page<PostView>,
}

impl IndexView {
    #[must_use]
    pub fn new(page: Page<PostEntry>, posts: &PostService) -> Self {
        Self {
            page: post_page(page, posts),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupPageView {
    pub group: GroupView,
    pub page: Page<PostView>,
}

impl GroupPageView {
    #[must_use]
    pub fn new(group: group::Model, page: Page<PostEntry>, posts: &PostService) -> Self {
        Self {
            group: group.into(),
            page: post_page(page, posts),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileView {
    pub author: UserView,
    pub page: Page<PostView>,
    pub following: bool,
    pub followers_count: u64,
    pub following_count: u64,
}

impl ProfileView {
    #[must_use]
    pub fn new(profile: ProfilePage, posts: &PostService) -> Self {
        Self {
            author: profile.author.into(),
            page: post_page(profile.page, posts),
            following: profile.following,
            followers_count: profile.followers_count,
            following_count: profile.following_count,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    pub id: String,
    pub text: String,
    pub created: DateTime<FixedOffset>,
    pub author: UserView,
}

impl From<CommentEntry> for CommentView {
    fn from(entry: CommentEntry) -> Self {
        Self {
            id: entry.comment.id,
            text: entry.comment.text,
            created: entry.comment.created,
            author: entry.author.into(),
        }
    }
}

/// The comment form under a post.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentFormView {
    pub text: String,
    pub errors: FieldErrors,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostPageView {
    pub post: PostView,
    pub author_posts_count: u64,
    pub comments: Vec<CommentView>,
    pub form: CommentFormView,
}

impl PostPageView {
    #[must_use]
    pub fn new(detail: PostDetail, posts: &PostService) -> Self {
        Self {
            post: PostView::new(detail.entry, posts),
            author_posts_count: detail.author_posts_count,
            comments: detail.comments.into_iter().map(Into::into).collect(),
            form: CommentFormView::default(),
        }
    }
}

/// The new/edit post form.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostFormView {
    /// True when editing an existing post.
    pub edit: bool,
    /// ID of the post being edited.
    pub post_id: Option<String>,
    pub text: String,
    /// Selected group slug.
    pub group: Option<String>,
    /// URL of the current image when editing.
    pub image: Option<String>,
    /// Groups to choose from.
    pub groups: Vec<GroupView>,
    pub errors: FieldErrors,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginView {
    pub next: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AboutView {
    pub page: &'static str,
    pub title: &'static str,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenView {
    pub id: String,
    pub username: String,
    pub token: String,
}
