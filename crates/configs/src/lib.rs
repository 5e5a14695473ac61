//! # configs
//!
//! Layered settings: built-in defaults, then an optional `feed.toml`, then
//! `FEED__SECTION__KEY` environment variables (a `.env` file is read first).
//!
//! ```text
//! FEED__STORAGE__DOCUMENT_URI=sqlite://data/feed.db?mode=rwc
//! FEED__FEED__ADMIN_EMAILS=root@example.com,mod@example.com
//! ```

use std::path::PathBuf;
use std::time::Duration;

use config::{Config, Environment, File};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

const ENV_PREFIX: &str = "FEED";
const DEFAULT_FILE: &str = "feed";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub storage: StorageSettings,
    pub feed: FeedSettings,
    pub log: LogSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl ServerSettings {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    /// Directory holding `users.json`, `posts.json` and `comments.json`.
    pub data_dir: PathBuf,
    /// Connection string of the document store. Unset or empty means flat files.
    #[serde(default)]
    pub document_uri: Option<SecretString>,
    pub connect_timeout_ms: u64,
    pub op_timeout_ms: u64,
    pub max_connections: u32,
}

impl StorageSettings {
    /// The URI, with an empty value treated as absent.
    pub fn document_uri(&self) -> Option<SecretString> {
        self.document_uri
            .as_ref()
            .filter(|uri| !uri.expose_secret().trim().is_empty())
            .cloned()
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn op_timeout(&self) -> Duration {
        Duration::from_millis(self.op_timeout_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeedSettings {
    /// Seed three example posts when the feed is first read while empty.
    pub seed_examples: bool,
    /// Funnel every mutation through one async mutex.
    pub serialize_writes: bool,
    #[serde(default)]
    pub admin_emails: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogSettings {
    /// `EnvFilter` directive; `RUST_LOG` wins when set.
    pub filter: String,
    pub json: bool,
}

impl Settings {
    /// Reads `.env`, `feed.toml` (optional) and the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        if let Ok(path) = dotenvy::dotenv() {
            debug!(path = %path.display(), "loaded .env");
        }
        Self::build(Some(DEFAULT_FILE), None)
    }

    /// Same layering, but with an explicit variable map instead of the
    /// process environment.
    pub fn from_vars<I>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        Self::build(None, Some(vars.into_iter().collect()))
    }

    fn build(file: Option<&str>, vars: Option<config::Map<String, String>>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("storage.data_dir", "data")?
            .set_default("storage.connect_timeout_ms", 3_000)?
            .set_default("storage.op_timeout_ms", 5_000)?
            .set_default("storage.max_connections", 5)?
            .set_default("feed.seed_examples", true)?
            .set_default("feed.serialize_writes", false)?
            .set_default("feed.admin_emails", Vec::<String>::new())?
            .set_default("log.filter", "info")?
            .set_default("log.json", false)?;

        if let Some(name) = file {
            builder = builder.add_source(File::with_name(name).required(false));
        }

        let env = Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("__")
            .separator("__")
            .list_separator(",")
            .with_list_parse_key("feed.admin_emails")
            .try_parsing(true)
            .source(vars);

        let settings: Settings = builder.add_source(env).build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.storage.connect_timeout_ms == 0 || self.storage.op_timeout_ms == 0 {
            return Err(ConfigError::Invalid("storage timeouts must be non-zero".into()));
        }
        if self.storage.max_connections == 0 {
            return Err(ConfigError::Invalid("storage.max_connections must be at least 1".into()));
        }
        Ok(())
    }
}
