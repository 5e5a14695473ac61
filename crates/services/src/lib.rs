//! # services
//!
//! Business logic over the `RecordStore` port: like toggles, comment and post
//! lifecycle with cascade deletes, the read-side feed, user administration and
//! counter audits.
//!
//! # Developer Note
//! Every mutation is load-full → mutate-in-memory → save-full. Two requests
//! interleaving at their await points can lose an update; enable
//! `serialize_writes` to funnel all mutations through one async mutex.

use std::collections::HashSet;
use std::sync::Arc;

use domains::{BackendMode, RecordStore};
use tokio::sync::{Mutex, MutexGuard};

pub mod actor;
pub mod audit;
pub mod comments;
pub mod feed;
pub mod likes;
pub mod posts;
pub mod seed;
pub mod users;

pub use audit::{CounterDrift, CounterField, CounterReport};
pub use posts::CascadeReport;
pub use seed::{CannedExamples, SampleSeeder};

#[derive(Debug, Clone, Default)]
pub struct FeedOptions {
    /// Emails granted admin rights (delete anything, ban, change tiers).
    pub admin_emails: Vec<String>,
    pub serialize_writes: bool,
}

/// The counter-consistency engine and feed assembler.
pub struct FeedService {
    store: Arc<dyn RecordStore>,
    seeder: Option<Arc<dyn SampleSeeder>>,
    admin_emails: HashSet<String>,
    write_gate: Option<Mutex<()>>,
}

impl FeedService {
    pub fn new(store: Arc<dyn RecordStore>, options: FeedOptions) -> Self {
        Self {
            store,
            seeder: None,
            admin_emails: options
                .admin_emails
                .iter()
                .map(|e| normalize_email(e))
                .collect(),
            write_gate: options.serialize_writes.then(|| Mutex::new(())),
        }
    }

    /// Seeds sample posts the first time the feed is read while empty.
    pub fn with_seeder(mut self, seeder: Arc<dyn SampleSeeder>) -> Self {
        self.seeder = Some(seeder);
        self
    }

    pub fn mode(&self) -> BackendMode {
        self.store.mode()
    }

    async fn write_guard(&self) -> Option<MutexGuard<'_, ()>> {
        match &self.write_gate {
            Some(gate) => Some(gate.lock().await),
            None => None,
        }
    }
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
