//! # tfcbind Core
//!
//! Credential-aware client for Terraform Cloud / Enterprise workspaces.
//!
//! This crate provides:
//! - Per-host token lookup from `TF_TOKEN_*` variables and the
//!   `credentials.tfrc.json` file written by `terraform login`
//! - Session resolution from `TF_URL` (or the public endpoint)
//! - A [`WorkspaceApi`] seam with HTTP and in-memory implementations
//! - [`WorkspaceClient`], which resolves workspaces by name and creates
//!   them when the service reports them missing
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use tfcbind_core::{CredentialsSource, HttpConnector, WorkspaceClient};
//!
//! async fn ensure_prod() -> Result<String, tfcbind_core::ClientError> {
//!     let mut client = WorkspaceClient::new("acme", "secret/tfc");
//!     client.initialize(&CredentialsSource::default(), &HttpConnector::new()).await?;
//!     let id = client.resolve_workspace("prod").await?;
//!     Ok(id.into_string())
//! }
//! ```

pub mod api;
pub mod client;
pub mod credentials;
pub mod error;
pub mod model;
pub mod secret;
pub mod session;

// Re-export commonly used types at crate root
pub use api::{ApiCall, ApiError, Connector, MemoryApi, MemoryConnector, WorkspaceApi};

#[cfg(feature = "http")]
pub use api::{HttpApi, HttpConnector};

pub use client::WorkspaceClient;

pub use credentials::{CredentialsLoader, CredentialsSource, CredentialsStore};

pub use error::{ClientError, ConfigError};

pub use model::{Organization, Workspace, WorkspaceCreateOptions, WorkspaceId};

pub use secret::Secret;

pub use session::{
    ADDRESS_ENV_VAR,
    DEFAULT_ADDRESS,
    SessionConfig,
    resolve_session,
    resolve_session_for,
};
