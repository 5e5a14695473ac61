//! # Flat-file backend
//!
//! Local filesystem implementation of `RecordStore`.
//! Three JSON documents live under one data directory:
//! `users.json` (object keyed by email), `posts.json` and `comments.json`
//! (arrays). Every save rewrites its document wholesale.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use domains::{BackendMode, Comment, DomainError, Post, RecordStore, Result, UserTable};
use serde::{de::DeserializeOwned, Serialize};
use tokio::fs;
use tracing::debug;
use uuid::Uuid;

const USERS_FILE: &str = "users.json";
const POSTS_FILE: &str = "posts.json";
const COMMENTS_FILE: &str = "comments.json";

#[derive(Debug, Clone)]
pub struct JsonFileStore {
    /// Root directory for the three documents (e.g., "./data")
    root_path: PathBuf,
}

impl JsonFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root_path: root.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root_path
    }

    fn document_path(&self, name: &str) -> PathBuf {
        self.root_path.join(name)
    }

    /// A missing document reads as the empty collection.
    async fn read_document<T>(&self, name: &str) -> Result<T>
    where
        T: DeserializeOwned + Default,
    {
        let path = self.document_path(name);
        let raw = match fs::read(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(T::default()),
            Err(e) => return Err(DomainError::unavailable(&format!("read {name}"), e)),
        };

        // Malformed JSON is not repaired; the load fails.
        serde_json::from_slice(&raw).map_err(|e| DomainError::unavailable(&format!("parse {name}"), e))
    }

    /// Atomic replace: write a uniquely named sibling, then rename over the target.
    async fn write_document<T>(&self, name: &str, value: &T) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        let context = format!("write {name}");
        fs::create_dir_all(&self.root_path)
            .await
            .map_err(|e| DomainError::unavailable(&context, e))?;

        let body = serde_json::to_vec_pretty(value).map_err(|e| DomainError::unavailable(&context, e))?;

        let target = self.document_path(name);
        let tmp = self
            .root_path
            .join(format!(".{name}-{}.tmp", Uuid::new_v4()));

        if let Err(e) = fs::write(&tmp, &body).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(DomainError::unavailable(&context, e));
        }
        fs::rename(&tmp, &target)
            .await
            .map_err(|e| DomainError::unavailable(&context, e))?;

        debug!(file = %target.display(), bytes = body.len(), "rewrote document");
        Ok(())
    }
}

#[async_trait]
impl RecordStore for JsonFileStore {
    fn mode(&self) -> BackendMode {
        BackendMode::File
    }

    async fn load_users(&self) -> Result<UserTable> {
        self.read_document(USERS_FILE).await
    }

    async fn save_users(&self, users: &UserTable) -> Result<()> {
        self.write_document(USERS_FILE, users).await
    }

    async fn load_posts(&self) -> Result<Vec<Post>> {
        self.read_document(POSTS_FILE).await
    }

    async fn save_posts(&self, posts: &[Post]) -> Result<()> {
        self.write_document(POSTS_FILE, posts).await
    }

    async fn load_comments(&self) -> Result<Vec<Comment>> {
        self.read_document(COMMENTS_FILE).await
    }

    async fn save_comments(&self, comments: &[Comment]) -> Result<()> {
        self.write_document(COMMENTS_FILE, comments).await
    }
}
