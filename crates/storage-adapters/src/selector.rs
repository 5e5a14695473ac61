//! # Backend Selector
//!
//! Decides once, at startup, which physical storage the process uses.
//! A configured and reachable document store wins; anything else (no URI,
//! bad URI, timeout, schema or migration failure) falls back to flat files.
//! The fallback is a normal branch, logged and never surfaced as an error.

use std::path::PathBuf;
use std::sync::Arc;

use domains::RecordStore;
use secrecy::SecretString;
use tracing::info;

use crate::file::JsonFileStore;

#[cfg(feature = "db-document")]
use crate::document::DocumentOptions;

pub struct SelectorOptions {
    pub data_dir: PathBuf,
    pub document_uri: Option<SecretString>,
    #[cfg(feature = "db-document")]
    pub document: DocumentOptions,
}

/// The chosen backend, handed to the service layer at construction.
/// `store.mode()` says which one it is.
pub struct SelectedBackend {
    pub store: Arc<dyn RecordStore>,
}

pub async fn select_backend(options: &SelectorOptions) -> SelectedBackend {
    let files = JsonFileStore::new(&options.data_dir);

    if let Some(selected) = probe::try_document_store(options, &files).await {
        return selected;
    }

    info!(data_dir = %files.root().display(), "using flat-file backend");
    SelectedBackend {
        store: Arc::new(files),
    }
}

#[cfg(feature = "db-document")]
mod probe {
    use std::sync::Arc;
    use std::time::Duration;

    use domains::{DomainError, RecordStore};
    use secrecy::ExposeSecret;
    use thiserror::Error;
    use tracing::{info, warn};

    use super::{SelectedBackend, SelectorOptions};
    use crate::document::{Collection, DocumentOptions, DocumentStore};
    use crate::file::JsonFileStore;

    #[derive(Debug, Error)]
    pub(crate) enum ProbeError {
        #[error("connection timed out after {0:?}")]
        Timeout(Duration),

        #[error("connection failed: {0}")]
        Connect(#[from] sqlx::Error),

        #[error("schema setup failed: {0}")]
        Schema(DomainError),

        #[error("migration failed: {0}")]
        Migrate(DomainError),
    }

    /// Per-collection counts copied by [`migrate_from_files`].
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    pub struct MigrationReport {
        pub users: usize,
        pub posts: usize,
        pub comments: usize,
    }

    pub(super) async fn try_document_store(
        options: &SelectorOptions,
        files: &JsonFileStore,
    ) -> Option<SelectedBackend> {
        let uri = options.document_uri.as_ref()?;

        match open(uri.expose_secret(), &options.document, files).await {
            Ok(store) => {
                info!("using document-store backend");
                Some(SelectedBackend {
                    store: Arc::new(store),
                })
            }
            Err(e) => {
                warn!(error = %e, "document store unavailable, falling back to flat files");
                None
            }
        }
    }

    async fn open(
        uri: &str,
        options: &DocumentOptions,
        files: &JsonFileStore,
    ) -> Result<DocumentStore, ProbeError> {
        let store = tokio::time::timeout(options.connect_timeout, DocumentStore::connect(uri, options))
            .await
            .map_err(|_| ProbeError::Timeout(options.connect_timeout))??;

        store.ensure_schema().await.map_err(ProbeError::Schema)?;

        let report = migrate_from_files(&store, files)
            .await
            .map_err(ProbeError::Migrate)?;
        if report != MigrationReport::default() {
            info!(
                users = report.users,
                posts = report.posts,
                comments = report.comments,
                "migrated flat-file data into document store"
            );
        }

        Ok(store)
    }

    /// Copies each flat-file collection into the document store, but only
    /// when the target collection is empty. Never overwrites existing data,
    /// so repeated startups migrate at most once.
    pub async fn migrate_from_files(
        target: &DocumentStore,
        files: &JsonFileStore,
    ) -> domains::Result<MigrationReport> {
        let mut report = MigrationReport::default();

        if target.is_empty(Collection::Users).await? {
            let users = files.load_users().await?;
            if !users.is_empty() {
                target.save_users(&users).await?;
                report.users = users.len();
            }
        }

        if target.is_empty(Collection::Posts).await? {
            let posts = files.load_posts().await?;
            if !posts.is_empty() {
                target.save_posts(&posts).await?;
                report.posts = posts.len();
            }
        }

        if target.is_empty(Collection::Comments).await? {
            let comments = files.load_comments().await?;
            if !comments.is_empty() {
                target.save_comments(&comments).await?;
                report.comments = comments.len();
            }
        }

        Ok(report)
    }
}

#[cfg(not(feature = "db-document"))]
mod probe {
    use tracing::warn;

    use super::{SelectedBackend, SelectorOptions};
    use crate::file::JsonFileStore;

    pub(super) async fn try_document_store(
        options: &SelectorOptions,
        _files: &JsonFileStore,
    ) -> Option<SelectedBackend> {
        if options.document_uri.is_some() {
            warn!("document store configured but built without `db-document`; using flat files");
        }
        None
    }
}

#[cfg(feature = "db-document")]
pub use probe::{migrate_from_files, MigrationReport};
