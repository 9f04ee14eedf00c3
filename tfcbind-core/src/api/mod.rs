//! Remote workspace API abstraction.
//!
//! This module provides:
//! - [`WorkspaceApi`] - Trait for the five remote calls the client needs
//! - [`Connector`] - Builds an API handle from a [`SessionConfig`]
//! - [`ApiError`] - Remote failures, with an explicit not-found case
//! - [`MemoryApi`] - In-memory implementation for testing and dry runs
//! - [`HttpApi`] - Terraform Cloud / Enterprise v2 API (with `http` feature)

use async_trait::async_trait;
use thiserror::Error;

use crate::model::{Organization, Workspace, WorkspaceCreateOptions, WorkspaceId};
use crate::session::SessionConfig;

mod memory;
#[cfg(feature = "http")]
mod http;

pub use memory::{ApiCall, MemoryApi, MemoryConnector};
#[cfg(feature = "http")]
pub use http::{HttpApi, HttpConnector};

/// Error type for remote API calls.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The requested organization or workspace does not exist.
    #[error("resource not found: {resource}")]
    NotFound { resource: String },

    /// The token was rejected.
    #[error("unauthorized")]
    Unauthorized,

    /// The service answered with any other error status.
    #[error("remote error (status {status}): {message}")]
    Remote { status: u16, message: String },

    /// A name or ID was rejected before any request was sent.
    #[error("invalid value for {field}: {value:?}")]
    InvalidArgument { field: &'static str, value: String },

    /// The request never produced a response.
    #[error("network error: {message}")]
    Transport { message: String },

    /// The response body could not be decoded.
    #[error("invalid response: {message}")]
    Decode { message: String },
}

impl ApiError {
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// The remote calls the workspace client is built on.
///
/// Every method is a single request/response round-trip. Implementations
/// must report a missing resource as [`ApiError::NotFound`] and nothing else.
#[async_trait]
pub trait WorkspaceApi: Send + Sync {
    /// Read an organization by name.
    async fn read_organization(&self, organization: &str) -> Result<Organization, ApiError>;

    /// Read a workspace by name within an organization.
    async fn read_workspace(&self, organization: &str, name: &str)
        -> Result<Workspace, ApiError>;

    /// Create a workspace within an organization.
    async fn create_workspace(
        &self,
        organization: &str,
        options: &WorkspaceCreateOptions,
    ) -> Result<Workspace, ApiError>;

    /// Read a workspace by its remote ID.
    async fn read_workspace_by_id(&self, id: &WorkspaceId) -> Result<Workspace, ApiError>;

    /// Delete a workspace by its remote ID.
    async fn delete_workspace_by_id(&self, id: &WorkspaceId) -> Result<(), ApiError>;
}

/// Builds an API handle bound to a resolved session.
///
/// Keeps credential resolution independent of transport construction.
pub trait Connector {
    type Api: WorkspaceApi;

    fn connect(&self, session: &SessionConfig) -> Result<Self::Api, ApiError>;
}

/// Whether a value is usable as an organization name, workspace name or ID.
pub fn is_valid_identifier(value: &str) -> bool {
    !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}
