//! Workspace client facade.
//!
//! [`WorkspaceClient`] pairs an authenticated API handle with an
//! organization name and exposes the idempotent workspace operations.
//!
//! # Example
//!
//! ```rust,no_run
//! # #[cfg(feature = "http")]
//! # async fn example() -> Result<(), tfcbind_core::ClientError> {
//! use tfcbind_core::{CredentialsSource, HttpApi, HttpConnector, WorkspaceClient};
//!
//! let mut client: WorkspaceClient<HttpApi> = WorkspaceClient::new("acme", "secret/tfc");
//! client
//!     .initialize(&CredentialsSource::default(), &HttpConnector::new())
//!     .await?;
//!
//! client.check_organization().await?;
//! let id = client.resolve_workspace("prod").await?;
//! println!("workspace prod is {}", id);
//! # Ok(())
//! # }
//! ```

use tracing::{debug, info};

use crate::api::{Connector, WorkspaceApi};
use crate::credentials::CredentialsLoader;
use crate::error::ClientError;
use crate::model::{WorkspaceCreateOptions, WorkspaceId};
use crate::session::resolve_session;

/// Authenticated handle for one organization.
///
/// Construct with [`new`](Self::new), then call [`initialize`](Self::initialize)
/// once before any other operation. Intended for a single owner; the session
/// is only written by `initialize`, which takes `&mut self`.
#[derive(Debug)]
pub struct WorkspaceClient<A> {
    api: Option<A>,
    organization: String,
    secrets_mount_path: String,
}

impl<A: WorkspaceApi> WorkspaceClient<A> {
    /// Create an uninitialized client.
    pub fn new(organization: impl Into<String>, secrets_mount_path: impl Into<String>) -> Self {
        Self {
            api: None,
            organization: organization.into(),
            secrets_mount_path: secrets_mount_path.into(),
        }
    }

    /// Create a client around an already connected API handle.
    pub fn with_api(
        api: A,
        organization: impl Into<String>,
        secrets_mount_path: impl Into<String>,
    ) -> Self {
        Self {
            api: Some(api),
            organization: organization.into(),
            secrets_mount_path: secrets_mount_path.into(),
        }
    }

    /// Load credentials, resolve the session and connect.
    ///
    /// The service address is taken from `TF_URL`. On failure the client is
    /// left exactly as it was.
    pub async fn initialize<L, C>(&mut self, loader: &L, connector: &C) -> Result<(), ClientError>
    where
        L: CredentialsLoader + ?Sized,
        C: Connector<Api = A>,
    {
        let store = loader.load().await?;
        let session = resolve_session(&store)?;
        let api = connector.connect(&session)?;

        info!("initialized session for {}", session.address());
        self.api = Some(api);
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.api.is_some()
    }

    pub fn organization(&self) -> &str {
        &self.organization
    }

    pub fn secrets_mount_path(&self) -> &str {
        &self.secrets_mount_path
    }

    /// The connected API handle, if initialized.
    pub fn api(&self) -> Option<&A> {
        self.api.as_ref()
    }

    fn session(&self) -> Result<&A, ClientError> {
        self.api.as_ref().ok_or(ClientError::NotInitialized)
    }

    /// Succeeds if the configured organization exists.
    pub async fn check_organization(&self) -> Result<(), ClientError> {
        self.session()?
            .read_organization(&self.organization)
            .await?;
        Ok(())
    }

    /// Return the ID of workspace `name`, creating it if it does not exist.
    ///
    /// Only a not-found read leads to creation. Any other read error is
    /// returned as is.
    pub async fn resolve_workspace(&self, name: &str) -> Result<WorkspaceId, ClientError> {
        let api = self.session()?;
        match api.read_workspace(&self.organization, name).await {
            Ok(workspace) => {
                debug!("workspace {}/{} exists as {}", self.organization, name, workspace.id);
                Ok(workspace.id)
            }
            Err(e) if e.is_not_found() => {
                debug!("workspace {}/{} not found, creating", self.organization, name);
                self.create_workspace(name).await
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Create workspace `name` with auto-apply enabled and return its ID.
    pub async fn create_workspace(&self, name: &str) -> Result<WorkspaceId, ClientError> {
        let options = WorkspaceCreateOptions::new(name);
        let workspace = self
            .session()?
            .create_workspace(&self.organization, &options)
            .await?;

        info!("created workspace {}/{} ({})", self.organization, name, workspace.id);
        Ok(workspace.id)
    }

    /// Succeeds if a workspace with this ID still exists.
    pub async fn check_workspace_by_id(&self, id: &WorkspaceId) -> Result<(), ClientError> {
        self.session()?.read_workspace_by_id(id).await?;
        Ok(())
    }

    /// Delete a workspace by ID.
    pub async fn delete_workspace(&self, id: &WorkspaceId) -> Result<(), ClientError> {
        self.session()?.delete_workspace_by_id(id).await?;
        info!("deleted workspace {}", id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ApiCall, ApiError, MemoryApi};

    fn client(api: &MemoryApi) -> WorkspaceClient<MemoryApi> {
        WorkspaceClient::with_api(api.clone(), "acme", "secret/tfc")
    }

    #[tokio::test]
    async fn test_uninitialized_client() {
        let client: WorkspaceClient<MemoryApi> = WorkspaceClient::new("acme", "secret/tfc");

        assert!(!client.is_initialized());
        assert!(matches!(
            client.check_organization().await,
            Err(ClientError::NotInitialized)
        ));
        assert!(matches!(
            client.resolve_workspace("prod").await,
            Err(ClientError::NotInitialized)
        ));
    }

    #[tokio::test]
    async fn test_accessors() {
        let api = MemoryApi::new();
        let client = client(&api);
        assert_eq!(client.organization(), "acme");
        assert_eq!(client.secrets_mount_path(), "secret/tfc");
        assert!(client.is_initialized());
        assert!(client.api().is_some());
    }

    #[tokio::test]
    async fn test_resolve_existing_does_not_create() {
        let api = MemoryApi::new().with_workspace("acme", "prod", "ws-1");
        let id = client(&api).resolve_workspace("prod").await.unwrap();

        assert_eq!(id.as_str(), "ws-1");
        assert_eq!(api.calls(ApiCall::CreateWorkspace), 0);
    }

    #[tokio::test]
    async fn test_resolve_other_error_never_creates() {
        let api = MemoryApi::new().with_organization("acme");
        api.fail_with(
            ApiCall::ReadWorkspace,
            ApiError::Remote {
                status: 500,
                message: "boom".to_string(),
            },
        );

        let err = client(&api).resolve_workspace("prod").await.unwrap_err();

        assert!(matches!(err, ClientError::Api(ApiError::Remote { status: 500, .. })));
        assert_eq!(api.calls(ApiCall::CreateWorkspace), 0);
    }

    #[tokio::test]
    async fn test_create_failure_propagates_from_resolve() {
        let api = MemoryApi::new().with_organization("acme");
        api.fail_with(ApiCall::CreateWorkspace, ApiError::Unauthorized);

        let err = client(&api).resolve_workspace("prod").await.unwrap_err();

        assert!(matches!(err, ClientError::Api(ApiError::Unauthorized)));
        assert_eq!(api.calls(ApiCall::CreateWorkspace), 1);
    }
}
