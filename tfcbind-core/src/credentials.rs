//! Per-host credentials store and the sources it is loaded from.
//!
//! This module provides:
//! - [`CredentialsStore`] - Host to credential-field mapping
//! - [`CredentialsLoader`] - Trait for anything that can produce a store
//! - [`CredentialsSource`] - Environment, file, static and chained loaders
//!
//! # Sources
//!
//! - `TF_TOKEN_<host>` environment variables, where `_` encodes `.` and
//!   `__` encodes `-` (e.g. `TF_TOKEN_app_terraform_io`)
//! - The JSON credentials file written by `terraform login`:
//!
//! ```text
//! {
//!   "credentials": {
//!     "app.terraform.io": { "token": "..." }
//!   }
//! }
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, trace};

use crate::error::ConfigError;

/// Prefix of the per-host token environment variables.
pub const TOKEN_ENV_PREFIX: &str = "TF_TOKEN_";

/// Credential fields registered for a single host.
pub type CredentialFields = HashMap<String, Value>;

/// Mapping from service host to its credential fields.
///
/// Host keys are normalized to lowercase. The store is read-only once loaded;
/// the session resolver only ever looks entries up.
#[derive(Clone, Default)]
pub struct CredentialsStore {
    hosts: HashMap<String, CredentialFields>,
}

impl CredentialsStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the fields for a host.
    pub fn insert(&mut self, host: impl AsRef<str>, fields: CredentialFields) {
        self.hosts.insert(normalize_host(host.as_ref()), fields);
    }

    /// Register a host with a single `token` field.
    pub fn with_token(mut self, host: impl AsRef<str>, token: impl Into<String>) -> Self {
        let mut fields = CredentialFields::new();
        fields.insert("token".to_string(), Value::String(token.into()));
        self.insert(host, fields);
        self
    }

    /// Look up the fields registered for a host.
    pub fn get(&self, host: &str) -> Option<&CredentialFields> {
        self.hosts.get(&normalize_host(host))
    }

    /// Hosts that have an entry, in no particular order.
    pub fn hosts(&self) -> impl Iterator<Item = &str> {
        self.hosts.keys().map(String::as_str)
    }

    /// Number of hosts with an entry.
    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    /// Whether no host has an entry.
    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }

    /// Add entries from `other` for hosts this store does not define yet.
    ///
    /// An empty record does not count as defining a host, so a later source
    /// can still supply its token.
    pub fn merge_missing(&mut self, other: CredentialsStore) {
        for (host, fields) in other.hosts {
            let slot = self.hosts.entry(host).or_default();
            if slot.is_empty() {
                *slot = fields;
            }
        }
    }

    /// Build a store from `TF_TOKEN_<host>` style variables.
    ///
    /// Variables without the prefix, and empty values, are ignored.
    pub fn from_env_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut store = Self::new();
        for (name, value) in vars {
            let Some(encoded) = name.as_ref().strip_prefix(TOKEN_ENV_PREFIX) else {
                continue;
            };
            let value = value.into();
            if encoded.is_empty() || value.is_empty() {
                continue;
            }
            let host = decode_env_host(encoded);
            trace!("found token variable for host {}", host);
            store = store.with_token(host, value);
        }
        store
    }

    /// Parse the JSON credentials file format.
    pub fn from_json(contents: &str) -> Result<Self, serde_json::Error> {
        let file: CredentialsFile = serde_json::from_str(contents)?;
        let mut store = Self::new();
        for (host, fields) in file.credentials {
            store.insert(host, fields);
        }
        Ok(store)
    }

    /// Load a JSON credentials file.
    ///
    /// A file that does not exist yields an empty store.
    pub async fn load_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = match tokio::fs::read_to_string(path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("credentials file {:?} not found", path);
                return Ok(Self::new());
            }
            Err(e) => {
                return Err(ConfigError::CredentialsFile {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                });
            }
        };

        Self::from_json(&contents).map_err(|e| ConfigError::CredentialsFile {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }
}

impl std::fmt::Debug for CredentialsStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut hosts: Vec<&str> = self.hosts().collect();
        hosts.sort_unstable();
        f.debug_struct("CredentialsStore")
            .field("hosts", &hosts)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct CredentialsFile {
    #[serde(default)]
    credentials: HashMap<String, CredentialFields>,
}

fn normalize_host(host: &str) -> String {
    host.trim().to_lowercase()
}

/// `app_terraform_io` -> `app.terraform.io`, `my__host_com` -> `my-host.com`.
fn decode_env_host(encoded: &str) -> String {
    encoded.replace("__", "-").replace('_', ".").to_lowercase()
}

/// Default location of the credentials file written by `terraform login`.
pub fn default_credentials_path() -> Option<PathBuf> {
    let dirs = directories::BaseDirs::new()?;
    let base = if cfg!(windows) {
        dirs.config_dir().join("terraform.d")
    } else {
        dirs.home_dir().join(".terraform.d")
    };
    Some(base.join("credentials.tfrc.json"))
}

/// Anything that can produce a [`CredentialsStore`].
#[async_trait]
pub trait CredentialsLoader: Send + Sync {
    async fn load(&self) -> Result<CredentialsStore, ConfigError>;
}

#[async_trait]
impl CredentialsLoader for CredentialsStore {
    async fn load(&self) -> Result<CredentialsStore, ConfigError> {
        Ok(self.clone())
    }
}

/// Where credentials are read from.
#[derive(Debug, Clone)]
pub enum CredentialsSource {
    /// `TF_TOKEN_<host>` environment variables.
    EnvVars,

    /// A JSON credentials file.
    File {
        /// Path to the credentials file.
        path: PathBuf,
    },

    /// A store that was loaded elsewhere.
    Static(CredentialsStore),

    /// Merge several sources; the first one defining a host wins.
    Chain(Vec<CredentialsSource>),
}

impl Default for CredentialsSource {
    fn default() -> Self {
        let mut chain = vec![CredentialsSource::EnvVars];
        if let Some(path) = default_credentials_path() {
            chain.push(CredentialsSource::File { path });
        }
        CredentialsSource::Chain(chain)
    }
}

impl CredentialsSource {
    /// Create a file source.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::File { path: path.into() }
    }

    /// Chain multiple sources.
    pub fn chain(sources: Vec<CredentialsSource>) -> Self {
        Self::Chain(sources)
    }

    fn load_boxed(
        &self,
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<CredentialsStore, ConfigError>> + Send + '_>>
    {
        Box::pin(async move {
            match self {
                Self::EnvVars => Ok(CredentialsStore::from_env_vars(std::env::vars())),
                Self::File { path } => CredentialsStore::load_file(path).await,
                Self::Static(store) => Ok(store.clone()),
                Self::Chain(sources) => {
                    let mut merged = CredentialsStore::new();
                    for source in sources {
                        merged.merge_missing(source.load_boxed().await?);
                    }
                    Ok(merged)
                }
            }
        })
    }
}

#[async_trait]
impl CredentialsLoader for CredentialsSource {
    async fn load(&self) -> Result<CredentialsStore, ConfigError> {
        let store = self.load_boxed().await?;
        debug!("loaded credentials for {} host(s)", store.len());
        Ok(store)
    }
}
