//! Common utilities and shared types for yatube-rs.
//!
//! This crate provides foundational components used across all yatube-rs crates:
//!
//! - **Configuration**: Application settings via [`Config`]
//! - **Error handling**: Unified error types via [`AppError`] and [`AppResult`]
//! - **ID Generation**: ULID-based unique identifiers via [`IdGenerator`]
//! - **Pagination**: Page-number resolution and page metadata via [`Paginator`]
//! - **Storage**: File storage for post images
//!
//! # Example
//!
//! ```no_run
//! use yatube_common::{AppResult, Config, Paginator};
//!
//! fn example() -> AppResult<()> {
//!     let config = Config::load()?;
//!     let paginator = Paginator::new(42, config.listing.per_page_index);
//!     println!("page {} of {}", paginator.resolve(Some("2")), paginator.num_pages());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod id;
pub mod pagination;
pub mod storage;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use id::IdGenerator;
pub use pagination::{Page, Paginator};
pub use storage::{LocalStorage, StorageBackend, UploadedFile, generate_storage_key};
