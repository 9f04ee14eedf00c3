//! Top-level error types for tfcbind.

use std::path::PathBuf;

use thiserror::Error;

use crate::api::ApiError;

/// Error raised while turning local configuration into a session.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The service address could not be parsed, or has no host.
    #[error("not a valid service URL `{address}`: {message}")]
    InvalidAddress { address: String, message: String },

    /// The credentials store has no entry for the service host.
    #[error("no token defined for host `{host}`")]
    MissingToken { host: String },

    /// The credentials entry exists but its token is absent or empty.
    #[error("credentials for host `{host}` have an empty token")]
    EmptyToken { host: String },

    /// A credentials file could not be read or parsed.
    #[error("failed to load credentials from {path:?}: {message}")]
    CredentialsFile { path: PathBuf, message: String },
}

/// Error type returned by [`WorkspaceClient`](crate::WorkspaceClient) operations.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Session configuration failed.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The remote service rejected or failed a call.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// An operation was invoked before [`initialize`](crate::WorkspaceClient::initialize).
    #[error("client session is not initialized")]
    NotInitialized,
}

impl ClientError {
    /// Whether this error is the remote service's not-found signal.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Api(ApiError::NotFound { .. }))
    }
}
