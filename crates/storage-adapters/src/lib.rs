//! # storage-adapters
//!
//! Concrete `RecordStore` backends and the startup selector that picks one.
//!
//! - [`file::JsonFileStore`]: three JSON documents under a data directory.
//! - [`document::DocumentStore`]: JSON documents in SQLite via sqlx
//!   (feature `db-document`).
//! - [`memory::MemoryStore`]: in-process collections for tests.

#[cfg(feature = "db-document")]
pub mod document;
pub mod file;
pub mod memory;
pub mod selector;

#[cfg(feature = "db-document")]
pub use document::{DocumentOptions, DocumentStore};
pub use file::JsonFileStore;
pub use memory::MemoryStore;
pub use selector::{select_backend, SelectedBackend, SelectorOptions};
