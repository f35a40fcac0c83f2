//! Business logic services.

#![allow(missing_docs)]

pub mod comment;
pub mod follow;
pub mod form;
pub mod group;
pub mod index_cache;
pub mod listing;
pub mod post;
pub mod user;

pub use comment::CommentService;
pub use follow::FollowService;
pub use form::{FieldErrors, FormOutcome};
pub use group::{CreateGroupInput, GroupService};
pub use index_cache::IndexCache;
pub use listing::{ListingService, PostEntry, ProfilePage};
pub use post::{
    CommentEntry, EditOutcome, ImageChange, ImageUpload, PostDetail, PostInput, PostService,
};
pub use user::{CreateUserInput, UserService};
