//! # Core Traits (Ports)
//!
//! Any storage backend must implement these traits to be selected at startup.

use async_trait::async_trait;

use crate::errors::Result;
use crate::models::{BackendMode, Comment, Post, UserTable};

/// Whole-collection persistence contract for users, posts and comments.
///
/// Loads hand out snapshots. Saves replace the entire collection, so two
/// callers interleaving load → mutate → save can lose an update; callers that
/// need more must serialize their writes.
#[cfg_attr(feature = "testing", mockall::automock)]
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// The backend this store talks to.
    fn mode(&self) -> BackendMode;

    // User Operations
    async fn load_users(&self) -> Result<UserTable>;
    async fn save_users(&self, users: &UserTable) -> Result<()>;

    // Post Operations
    async fn load_posts(&self) -> Result<Vec<Post>>;
    async fn save_posts(&self, posts: &[Post]) -> Result<()>;

    // Comment Operations
    async fn load_comments(&self) -> Result<Vec<Comment>>;
    async fn save_comments(&self, comments: &[Comment]) -> Result<()>;
}
