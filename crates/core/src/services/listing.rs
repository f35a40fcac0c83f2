//! Paginated post listings.

use std::collections::HashMap;

use yatube_common::{AppResult, Page, Paginator, config::ListingConfig};
use yatube_db::{
    entities::{group, post, user},
    repositories::{FollowRepository, GroupRepository, PostRepository, PostScope, UserRepository},
};

/// A post together with the rows a listing shows next to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostEntry {
    pub post: post::Model,
    pub author: user::Model,
    pub group: Option<group::Model>,
}

/// An author's profile page.
#[derive(Debug, Clone)]
pub struct ProfilePage {
    pub author: user::Model,
    pub page: Page<PostEntry>,
    /// Whether the viewer follows this author. Always false for anonymous viewers.
    pub following: bool,
    pub followers_count: u64,
    pub following_count: u64,
}

/// Listing service for the index, group, profile and follow pages.
#[derive(Clone)]
pub struct ListingService {
    post_repo: PostRepository,
    user_repo: UserRepository,
    group_repo: GroupRepository,
    follow_repo: FollowRepository,
    per_page_index: u64,
    per_page_group: u64,
}

impl ListingService {
    /// Create a new listing service.
    #[must_use]
    pub const fn new(
        post_repo: PostRepository,
        user_repo: UserRepository,
        group_repo: GroupRepository,
        follow_repo: FollowRepository,
        config: &ListingConfig,
    ) -> Self {
        Self {
            post_repo,
            user_repo,
            group_repo,
            follow_repo,
            per_page_index: config.per_page_index,
            per_page_group: config.per_page_group,
        }
    }

    /// Every post, newest first.
    pub async fn index(&self, page: Option<&str>) -> AppResult<Page<PostEntry>> {
        self.list(PostScope::All, self.per_page_index, page).await
    }

    /// Posts in the group with `slug`.
    pub async fn group(
        &self,
        slug: &str,
        page: Option<&str>,
    ) -> AppResult<(group::Model, Page<PostEntry>)> {
        let group = self.group_repo.get_by_slug(slug).await?;
        let page = self
            .list(PostScope::Group(&group.id), self.per_page_group, page)
            .await?;
        Ok((group, page))
    }

    /// Posts by `username`, plus follow state relative to `viewer_id`.
    pub async fn profile(
        &self,
        username: &str,
        viewer_id: Option<&str>,
        page: Option<&str>,
    ) -> AppResult<ProfilePage> {
        let author = self.user_repo.get_by_username(username).await?;
        let page = self
            .list(PostScope::Author(&author.id), self.per_page_group, page)
            .await?;

        let following = match viewer_id {
            Some(viewer_id) => self.follow_repo.is_following(viewer_id, &author.id).await?,
            None => false,
        };
        let followers_count = self.follow_repo.count_followers(&author.id).await?;
        let following_count = self.follow_repo.count_following(&author.id).await?;

        Ok(ProfilePage {
            author,
            page,
            following,
            followers_count,
            following_count,
        })
    }

    /// Posts by every author `user_id` follows.
    pub async fn follow_feed(&self, user_id: &str, page: Option<&str>) -> AppResult<Page<PostEntry>> {
        self.list(PostScope::FollowedBy(user_id), self.per_page_index, page)
            .await
    }

    async fn list(
        &self,
        scope: PostScope<'_>,
        per_page: u64,
        raw_page: Option<&str>,
    ) -> AppResult<Page<PostEntry>> {
        let paginator = Paginator::new(self.post_repo.count(scope).await?, per_page);
        let number = paginator.resolve(raw_page);

        let posts = if paginator.count() == 0 {
            Vec::new()
        } else {
            self.post_repo
                .find_page(scope, paginator.offset(number), paginator.per_page())
                .await?
        };

        let entries = attach_relations(&self.user_repo, &self.group_repo, posts).await?;
        Ok(Page::new(entries, &paginator, number))
    }
}

/// Load authors and groups for `posts` in two batched queries.
async fn attach_relations(
    user_repo: &UserRepository,
    group_repo: &GroupRepository,
    posts: Vec<post::Model>,
) -> AppResult<Vec<PostEntry>> {
    let mut author_ids: Vec<String> = posts.iter().map(|p| p.author_id.clone()).collect();
    author_ids.sort_unstable();
    author_ids.dedup();

    let mut group_ids: Vec<String> = posts.iter().filter_map(|p| p.group_id.clone()).collect();
    group_ids.sort_unstable();
    group_ids.dedup();

    let authors: HashMap<String, user::Model> = user_repo
        .find_by_ids(&author_ids)
        .await?
        .into_iter()
        .map(|u| (u.id.clone(), u))
        .collect();
    let groups: HashMap<String, group::Model> = group_repo
        .find_by_ids(&group_ids)
        .await?
        .into_iter()
        .map(|g| (g.id.clone(), g))
        .collect();

    Ok(posts
        .into_iter()
        .filter_map(|post| {
            let Some(author) = authors.get(&post.author_id).cloned() else {
                tracing::warn!(post_id = %post.id, "Post author missing, skipping");
                return None;
            };
            let group = post.group_id.as_ref().and_then(|id| groups.get(id).cloned());
            Some(PostEntry {
                post,
                author,
                group,
            })
        })
        .collect())
}
