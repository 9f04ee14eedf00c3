//! In-memory workspace API implementation.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;

use super::{ApiError, Connector, WorkspaceApi};
use crate::model::{Organization, Workspace, WorkspaceCreateOptions, WorkspaceId};
use crate::session::SessionConfig;

/// The remote calls recorded by [`MemoryApi`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiCall {
    ReadOrganization,
    ReadWorkspace,
    CreateWorkspace,
    ReadWorkspaceById,
    DeleteWorkspace,
}

#[derive(Default)]
struct State {
    organizations: HashSet<String>,
    // id -> (organization, workspace)
    workspaces: BTreeMap<String, (String, Workspace)>,
    next_id: u64,
    calls: HashMap<ApiCall, usize>,
    failures: HashMap<ApiCall, ApiError>,
}

impl State {
    fn record(&mut self, call: ApiCall) -> Result<(), ApiError> {
        *self.calls.entry(call).or_default() += 1;
        match self.failures.get(&call) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn find_by_name(&self, organization: &str, name: &str) -> Option<&Workspace> {
        self.workspaces
            .values()
            .find(|(org, ws)| org == organization && ws.name == name)
            .map(|(_, ws)| ws)
    }

    fn allocate_id(&mut self) -> String {
        loop {
            self.next_id += 1;
            let id = format!("ws-{}", self.next_id);
            if !self.workspaces.contains_key(&id) {
                return id;
            }
        }
    }
}

/// In-memory workspace service for testing and development.
///
/// Clones share the same state, so a test can keep a handle while the
/// client owns another. Every call is counted, and any call can be made to
/// fail with a chosen [`ApiError`].
///
/// Created workspaces get sequential IDs (`ws-1`, `ws-2`, ...) that skip
/// IDs already in use.
#[derive(Clone, Default)]
pub struct MemoryApi {
    state: Arc<Mutex<State>>,
}

impl MemoryApi {
    /// Create an empty service with no organizations.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an organization.
    pub fn with_organization(self, name: impl Into<String>) -> Self {
        self.state.lock().organizations.insert(name.into());
        self
    }

    /// Add an existing workspace, creating its organization if needed.
    pub fn with_workspace(
        self,
        organization: impl Into<String>,
        name: impl Into<String>,
        id: impl Into<String>,
    ) -> Self {
        let organization = organization.into();
        let id = id.into();
        {
            let mut state = self.state.lock();
            state.organizations.insert(organization.clone());
            let workspace = Workspace::new(id.clone(), name);
            state.workspaces.insert(id, (organization, workspace));
        }
        self
    }

    /// Make every subsequent `call` fail with `error`.
    pub fn fail_with(&self, call: ApiCall, error: ApiError) {
        self.state.lock().failures.insert(call, error);
    }

    /// Remove all injected failures.
    pub fn clear_failures(&self) {
        self.state.lock().failures.clear();
    }

    /// Number of times `call` was made.
    pub fn calls(&self, call: ApiCall) -> usize {
        self.state.lock().calls.get(&call).copied().unwrap_or(0)
    }

    /// Look up a stored workspace by ID.
    pub fn workspace(&self, id: &str) -> Option<Workspace> {
        self.state.lock().workspaces.get(id).map(|(_, ws)| ws.clone())
    }

    /// Number of stored workspaces.
    pub fn workspace_count(&self) -> usize {
        self.state.lock().workspaces.len()
    }
}

impl std::fmt::Debug for MemoryApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("MemoryApi")
            .field("organizations", &state.organizations.len())
            .field("workspaces", &state.workspaces.len())
            .finish()
    }
}

#[async_trait]
impl WorkspaceApi for MemoryApi {
    async fn read_organization(&self, organization: &str) -> Result<Organization, ApiError> {
        let mut state = self.state.lock();
        state.record(ApiCall::ReadOrganization)?;
        if state.organizations.contains(organization) {
            Ok(Organization::new(organization))
        } else {
            Err(ApiError::not_found(format!("organization {}", organization)))
        }
    }

    async fn read_workspace(
        &self,
        organization: &str,
        name: &str,
    ) -> Result<Workspace, ApiError> {
        let mut state = self.state.lock();
        state.record(ApiCall::ReadWorkspace)?;
        state
            .find_by_name(organization, name)
            .cloned()
            .ok_or_else(|| ApiError::not_found(format!("workspace {}/{}", organization, name)))
    }

    async fn create_workspace(
        &self,
        organization: &str,
        options: &WorkspaceCreateOptions,
    ) -> Result<Workspace, ApiError> {
        let mut state = self.state.lock();
        state.record(ApiCall::CreateWorkspace)?;

        if !state.organizations.contains(organization) {
            return Err(ApiError::not_found(format!("organization {}", organization)));
        }
        if state.find_by_name(organization, &options.name).is_some() {
            return Err(ApiError::Remote {
                status: 422,
                message: "Name has already been taken".to_string(),
            });
        }

        let id = state.allocate_id();
        let mut workspace =
            Workspace::new(id.clone(), options.name.clone()).with_auto_apply(options.auto_apply);
        workspace.created_at = Some(Utc::now());
        state
            .workspaces
            .insert(id, (organization.to_string(), workspace.clone()));
        Ok(workspace)
    }

    async fn read_workspace_by_id(&self, id: &WorkspaceId) -> Result<Workspace, ApiError> {
        let mut state = self.state.lock();
        state.record(ApiCall::ReadWorkspaceById)?;
        state
            .workspaces
            .get(id.as_str())
            .map(|(_, ws)| ws.clone())
            .ok_or_else(|| ApiError::not_found(format!("workspace {}", id)))
    }

    async fn delete_workspace_by_id(&self, id: &WorkspaceId) -> Result<(), ApiError> {
        let mut state = self.state.lock();
        state.record(ApiCall::DeleteWorkspace)?;
        state
            .workspaces
            .remove(id.as_str())
            .map(|_| ())
            .ok_or_else(|| ApiError::not_found(format!("workspace {}", id)))
    }
}

/// Connector handing out clones of a shared [`MemoryApi`].
///
/// Remembers the last session it was asked to connect with.
#[derive(Debug, Clone, Default)]
pub struct MemoryConnector {
    api: MemoryApi,
    last_session: Arc<Mutex<Option<SessionConfig>>>,
}

impl MemoryConnector {
    pub fn new(api: MemoryApi) -> Self {
        Self {
            api,
            last_session: Arc::default(),
        }
    }

    /// The session passed to the most recent [`connect`](Connector::connect).
    pub fn last_session(&self) -> Option<SessionConfig> {
        self.last_session.lock().clone()
    }
}

impl Connector for MemoryConnector {
    type Api = MemoryApi;

    fn connect(&self, session: &SessionConfig) -> Result<MemoryApi, ApiError> {
        *self.last_session.lock() = Some(session.clone());
        Ok(self.api.clone())
    }
}
