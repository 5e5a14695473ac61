//! In-process `RecordStore` for tests and throwaway runs.
//!
//! Holds the same collection shapes as the persistent backends and reports
//! itself as file mode. `set_offline` simulates a backend that drops after
//! selection: every call then fails with `StorageUnavailable`.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use domains::{BackendMode, Comment, DomainError, Post, RecordStore, Result, UserTable};
use tokio::sync::RwLock;

#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<UserTable>,
    posts: RwLock<Vec<Post>>,
    comments: RwLock<Vec<Comment>>,
    offline: AtomicBool,
    saves: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Number of successful saves across all collections.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    fn check(&self, op: &str) -> Result<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(DomainError::unavailable(op, "memory store offline"));
        }
        Ok(())
    }

    fn saved(&self) {
        self.saves.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    fn mode(&self) -> BackendMode {
        BackendMode::File
    }

    async fn load_users(&self) -> Result<UserTable> {
        self.check("load users")?;
        Ok(self.users.read().await.clone())
    }

    async fn save_users(&self, users: &UserTable) -> Result<()> {
        self.check("save users")?;
        *self.users.write().await = users.clone();
        self.saved();
        Ok(())
    }

    async fn load_posts(&self) -> Result<Vec<Post>> {
        self.check("load posts")?;
        Ok(self.posts.read().await.clone())
    }

    async fn save_posts(&self, posts: &[Post]) -> Result<()> {
        self.check("save posts")?;
        *self.posts.write().await = posts.to_vec();
        self.saved();
        Ok(())
    }

    async fn load_comments(&self) -> Result<Vec<Comment>> {
        self.check("load comments")?;
        Ok(self.comments.read().await.clone())
    }

    async fn save_comments(&self, comments: &[Comment]) -> Result<()> {
        self.check("save comments")?;
        *self.comments.write().await = comments.to_vec();
        self.saved();
        Ok(())
    }
}
