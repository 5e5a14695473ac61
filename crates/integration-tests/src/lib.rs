//! Shared fixtures for the cross-crate tests.
//!
//! Every scenario runs once per backend in [`Backend::ALL`], so the file,
//! document-store and in-memory stores are held to the same behavior.

use std::sync::Arc;

use chrono::Utc;
use domains::{Actor, RecordStore, Tier, User, UserTable};
use services::{FeedOptions, FeedService};
use storage_adapters::{JsonFileStore, MemoryStore};
use tempfile::TempDir;

pub const ANN: &str = "ann@feed.test";
pub const BOB: &str = "bob@feed.test";
pub const ADMIN: &str = "admin@feed.test";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    File,
    #[cfg(feature = "db-document")]
    Document,
    Memory,
}

impl Backend {
    #[cfg(feature = "db-document")]
    pub const ALL: &'static [Backend] = &[Backend::File, Backend::Document, Backend::Memory];
    #[cfg(not(feature = "db-document"))]
    pub const ALL: &'static [Backend] = &[Backend::File, Backend::Memory];
}

/// A store plus whatever must outlive it (the temp directory for files).
pub struct Harness {
    pub backend: Backend,
    pub store: Arc<dyn RecordStore>,
    pub service: FeedService,
    _dir: Option<TempDir>,
}

impl Harness {
    /// Opens an empty store of the given kind, seeds `ann` (1), `bob` (2)
    /// and `admin` (3), and wraps it in a service with `admin` as admin.
    pub async fn open(backend: Backend) -> Self {
        let (store, dir): (Arc<dyn RecordStore>, Option<TempDir>) = match backend {
            Backend::File => {
                let dir = tempfile::tempdir().unwrap();
                (Arc::new(JsonFileStore::new(dir.path())), Some(dir))
            }
            #[cfg(feature = "db-document")]
            Backend::Document => {
                let store = storage_adapters::DocumentStore::connect("sqlite::memory:", &Default::default())
                    .await
                    .unwrap();
                store.ensure_schema().await.unwrap();
                (Arc::new(store), None)
            }
            Backend::Memory => (Arc::new(MemoryStore::new()), None),
        };

        store.save_users(&users()).await.unwrap();

        let service = FeedService::new(
            store.clone(),
            FeedOptions {
                admin_emails: vec![ADMIN.into()],
                serialize_writes: false,
            },
        );

        Self {
            backend,
            store,
            service,
            _dir: dir,
        }
    }

    pub async fn actor(&self, email: &str) -> Actor {
        self.service.resolve_actor(email).await.unwrap()
    }
}

pub fn user(id: u64, email: &str) -> User {
    User {
        id,
        email: email.into(),
        name: email.split('@').next().unwrap_or_default().into(),
        password_hash: "opaque".into(),
        verified: true,
        tier: Tier::None,
        banned: false,
        created_at: Utc::now(),
        avatar: None,
    }
}

pub fn users() -> UserTable {
    [user(1, ANN), user(2, BOB), user(3, ADMIN)]
        .into_iter()
        .map(|u| (u.email.clone(), u))
        .collect()
}
