use std::path::Path;
use std::time::Duration;

use domains::{BackendMode, Draft, RecordStore};
use integration_tests::{users, ANN};
use secrecy::SecretString;
use services::{FeedOptions, FeedService};
use storage_adapters::{select_backend, DocumentOptions, JsonFileStore, SelectorOptions};

fn options(dir: &Path, uri: Option<String>) -> SelectorOptions {
    SelectorOptions {
        data_dir: dir.to_path_buf(),
        document_uri: uri.map(SecretString::from),
        document: DocumentOptions {
            connect_timeout: Duration::from_millis(500),
            ..DocumentOptions::default()
        },
    }
}

fn service(store: std::sync::Arc<dyn RecordStore>) -> FeedService {
    FeedService::new(store, FeedOptions::default())
}

#[tokio::test]
async fn document_store_survives_restart_and_migrates_once() {
    let dir = tempfile::tempdir().unwrap();
    let files = JsonFileStore::new(dir.path());
    files.save_users(&users()).await.unwrap();

    let uri = format!("sqlite://{}/feed.db?mode=rwc", dir.path().display());

    // First start: files are copied in.
    let first = select_backend(&options(dir.path(), Some(uri.clone()))).await;
    assert_eq!(first.store.mode(), BackendMode::DocumentStore);
    let feed = service(first.store.clone());
    assert_eq!(feed.mode(), BackendMode::DocumentStore);
    let ann = feed.resolve_actor(ANN).await.unwrap();
    let post = feed.create_post(&ann, Draft::text("stored in sqlite")).await.unwrap();
    drop(feed);
    drop(first);

    // Files change behind our back; the populated store must win.
    files.save_users(&Default::default()).await.unwrap();

    let second = select_backend(&options(dir.path(), Some(uri))).await;
    assert_eq!(second.store.mode(), BackendMode::DocumentStore);
    assert_eq!(second.store.load_users().await.unwrap().len(), 3);
    let posts = second.store.load_posts().await.unwrap();
    assert_eq!(posts.iter().map(|p| p.id).collect::<Vec<_>>(), vec![post.id]);

    // The flat files never saw the post.
    assert!(files.load_posts().await.unwrap().is_empty());
}

#[tokio::test]
async fn unusable_document_store_leaves_a_working_file_backend() {
    let dir = tempfile::tempdir().unwrap();
    JsonFileStore::new(dir.path()).save_users(&users()).await.unwrap();

    let uri = format!("sqlite://{}/no/such/dir/feed.db", dir.path().display());
    let selected = select_backend(&options(dir.path(), Some(uri))).await;
    assert_eq!(selected.store.mode(), BackendMode::File);

    let feed = service(selected.store);
    assert_eq!(feed.mode(), BackendMode::File);
    let ann = feed.resolve_actor(ANN).await.unwrap();
    feed.create_post(&ann, Draft::text("on disk")).await.unwrap();

    let reread = JsonFileStore::new(dir.path()).load_posts().await.unwrap();
    assert_eq!(reread.len(), 1);
    assert_eq!(reread[0].content, "on disk");
}

#[tokio::test]
async fn blank_data_directory_starts_empty() {
    let dir = tempfile::tempdir().unwrap();
    let selected = select_backend(&options(&dir.path().join("fresh"), None)).await;
    assert_eq!(selected.store.mode(), BackendMode::File);
    assert!(selected.store.load_users().await.unwrap().is_empty());
    assert!(selected.store.load_posts().await.unwrap().is_empty());
    assert!(selected.store.load_comments().await.unwrap().is_empty());
}
