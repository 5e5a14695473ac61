//! # Document-store backend
//!
//! This module implements `RecordStore` over sqlx/SQLite, storing each record
//! as a JSON document next to its key columns. Unique indexes on the user's
//! email and on each entity's numeric id are the only constraints.

use std::future::Future;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use domains::{BackendMode, Comment, DomainError, Post, RecordStore, Result, User, UserTable};
use serde::{de::DeserializeOwned, Serialize};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tracing::debug;

/// Schema statements, all idempotent.
const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS users (email TEXT NOT NULL, id INTEGER NOT NULL, doc TEXT NOT NULL)",
    "CREATE UNIQUE INDEX IF NOT EXISTS users_email_key ON users (email)",
    "CREATE TABLE IF NOT EXISTS posts (id INTEGER NOT NULL, doc TEXT NOT NULL)",
    "CREATE UNIQUE INDEX IF NOT EXISTS posts_id_key ON posts (id)",
    "CREATE TABLE IF NOT EXISTS comments (id INTEGER NOT NULL, post_id INTEGER NOT NULL, doc TEXT NOT NULL)",
    "CREATE UNIQUE INDEX IF NOT EXISTS comments_id_key ON comments (id)",
];

/// The three collections kept by every backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Users,
    Posts,
    Comments,
}

impl Collection {
    fn table(self) -> &'static str {
        match self {
            Collection::Users => "users",
            Collection::Posts => "posts",
            Collection::Comments => "comments",
        }
    }
}

#[derive(Debug, Clone)]
pub struct DocumentOptions {
    pub connect_timeout: Duration,
    pub op_timeout: Duration,
    pub max_connections: u32,
}

impl Default for DocumentOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(3),
            op_timeout: Duration::from_secs(5),
            max_connections: 5,
        }
    }
}

pub struct DocumentStore {
    pool: SqlitePool,
    op_timeout: Duration,
}

// Ids are epoch millis, far below i64::MAX.
fn sql_id(id: u64) -> Result<i64> {
    i64::try_from(id).map_err(|_| DomainError::unavailable("encode id", id))
}

fn encode<T: Serialize>(context: &str, record: &T) -> Result<String> {
    serde_json::to_string(record).map_err(|e| DomainError::unavailable(context, e))
}

fn decode<T: DeserializeOwned>(context: &str, docs: Vec<String>) -> Result<Vec<T>> {
    docs.iter()
        .map(|doc| serde_json::from_str(doc).map_err(|e| DomainError::unavailable(context, e)))
        .collect()
}

impl DocumentStore {
    /// Opens the pool. Does not touch the schema; see [`DocumentStore::ensure_schema`].
    pub async fn connect(uri: &str, options: &DocumentOptions) -> std::result::Result<Self, sqlx::Error> {
        let connect_options = SqliteConnectOptions::from_str(uri)?;

        // Every in-memory connection is its own database; pin the pool to one.
        let max_connections = if uri.contains(":memory:") {
            1
        } else {
            options.max_connections.max(1)
        };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(options.connect_timeout)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(connect_options)
            .await?;

        Ok(Self {
            pool,
            op_timeout: options.op_timeout,
        })
    }

    /// Creates the collections and their uniqueness constraints if missing.
    pub async fn ensure_schema(&self) -> Result<()> {
        for statement in SCHEMA {
            self.bounded("ensure schema", sqlx::query(*statement).execute(&self.pool))
                .await?;
        }
        Ok(())
    }

    pub async fn is_empty(&self, collection: Collection) -> Result<bool> {
        let sql = format!("SELECT COUNT(*) FROM {}", collection.table());
        let count: i64 = self
            .bounded("count documents", sqlx::query_scalar(&sql).fetch_one(&self.pool))
            .await?;
        Ok(count == 0)
    }

    /// Runs one store round-trip under the operation timeout.
    async fn bounded<T, F>(&self, context: &str, fut: F) -> Result<T>
    where
        F: Future<Output = std::result::Result<T, sqlx::Error>>,
    {
        match tokio::time::timeout(self.op_timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(DomainError::unavailable(context, e)),
            Err(_) => Err(DomainError::unavailable(context, "operation timed out")),
        }
    }

    async fn load_docs(&self, collection: Collection) -> Result<Vec<String>> {
        let sql = format!("SELECT doc FROM {} ORDER BY rowid", collection.table());
        self.bounded("load documents", sqlx::query_scalar(&sql).fetch_all(&self.pool))
            .await
    }

    /// Delete-all-then-insert-all, inside one transaction.
    async fn replace_all(&self, collection: Collection, rows: Vec<(i64, Option<i64>, String)>) -> Result<()> {
        let table = collection.table();
        let count = rows.len();

        self.bounded("replace documents", async {
            let mut tx = self.pool.begin().await?;

            sqlx::query(&format!("DELETE FROM {table}"))
                .execute(&mut *tx)
                .await?;

            for (id, post_id, doc) in rows {
                match post_id {
                    Some(post_id) => {
                        sqlx::query("INSERT INTO comments (id, post_id, doc) VALUES (?, ?, ?)")
                            .bind(id)
                            .bind(post_id)
                            .bind(doc)
                            .execute(&mut *tx)
                            .await?;
                    }
                    None => {
                        sqlx::query(&format!("INSERT INTO {table} (id, doc) VALUES (?, ?)"))
                            .bind(id)
                            .bind(doc)
                            .execute(&mut *tx)
                            .await?;
                    }
                }
            }

            tx.commit().await
        })
        .await?;

        debug!(table, count, "replaced collection");
        Ok(())
    }
}

#[async_trait]
impl RecordStore for DocumentStore {
    fn mode(&self) -> BackendMode {
        BackendMode::DocumentStore
    }

    async fn load_users(&self) -> Result<UserTable> {
        let docs = self.load_docs(Collection::Users).await?;
        let users: Vec<User> = decode("decode user", docs)?;
        Ok(users.into_iter().map(|u| (u.email.clone(), u)).collect())
    }

    /// Upsert per email; users absent from `users` are left in place.
    async fn save_users(&self, users: &UserTable) -> Result<()> {
        let rows = users
            .values()
            .map(|u| Ok((u.email.clone(), sql_id(u.id)?, encode("encode user", u)?)))
            .collect::<Result<Vec<_>>>()?;

        self.bounded("upsert users", async {
            let mut tx = self.pool.begin().await?;
            for (email, id, doc) in rows {
                sqlx::query(
                    "INSERT INTO users (email, id, doc) VALUES (?, ?, ?) \
                     ON CONFLICT(email) DO UPDATE SET id = excluded.id, doc = excluded.doc",
                )
                .bind(email)
                .bind(id)
                .bind(doc)
                .execute(&mut *tx)
                .await?;
            }
            tx.commit().await
        })
        .await
    }

    async fn load_posts(&self) -> Result<Vec<Post>> {
        let docs = self.load_docs(Collection::Posts).await?;
        decode("decode post", docs)
    }

    async fn save_posts(&self, posts: &[Post]) -> Result<()> {
        let rows = posts
            .iter()
            .map(|p| Ok((sql_id(p.id)?, None, encode("encode post", p)?)))
            .collect::<Result<Vec<_>>>()?;
        self.replace_all(Collection::Posts, rows).await
    }

    async fn load_comments(&self) -> Result<Vec<Comment>> {
        let docs = self.load_docs(Collection::Comments).await?;
        decode("decode comment", docs)
    }

    async fn save_comments(&self, comments: &[Comment]) -> Result<()> {
        let rows = comments
            .iter()
            .map(|c| Ok((sql_id(c.id)?, Some(sql_id(c.post_id)?), encode("encode comment", c)?)))
            .collect::<Result<Vec<_>>>()?;
        self.replace_all(Collection::Comments, rows).await
    }
}
