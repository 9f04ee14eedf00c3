//! Domain model types for tfcbind.
//!
//! This module defines the core types used throughout tfcbind:
//! - [`WorkspaceId`] - Opaque remote identifier of a workspace
//! - [`Organization`] - Top-level namespace containing workspaces
//! - [`Workspace`] - A workspace as returned by the remote service
//! - [`WorkspaceCreateOptions`] - Attributes sent when creating a workspace

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque remote identifier of a workspace (e.g. `ws-abc123`).
///
/// Unlike names, IDs are compared verbatim and never normalized.
///
/// # Examples
///
/// ```
/// use tfcbind_core::WorkspaceId;
///
/// let id = WorkspaceId::new("ws-1");
/// assert_eq!(id.as_str(), "ws-1");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkspaceId(String);

impl WorkspaceId {
    /// Create a new workspace ID.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the workspace ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the ID and return the inner string.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for WorkspaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for WorkspaceId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for WorkspaceId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl AsRef<str> for WorkspaceId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// An organization on the remote service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    /// Organization name, which doubles as its identifier.
    pub name: String,

    /// Notification email, if the service returned one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl Organization {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: None,
        }
    }
}

/// A workspace within an organization.
///
/// Not persisted locally; every operation reads it fresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workspace {
    /// Remote identifier.
    pub id: WorkspaceId,

    /// Name, unique within the organization.
    pub name: String,

    /// Whether runs apply without manual confirmation.
    #[serde(default)]
    pub auto_apply: bool,

    /// Creation time reported by the service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Workspace {
    /// Create a workspace value with no creation timestamp.
    pub fn new(id: impl Into<WorkspaceId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            auto_apply: false,
            created_at: None,
        }
    }

    /// Set the auto-apply flag.
    pub fn with_auto_apply(mut self, auto_apply: bool) -> Self {
        self.auto_apply = auto_apply;
        self
    }
}

/// Attributes for a workspace create request.
///
/// Auto-apply is on unless explicitly turned off; the policy travels with
/// each request rather than living in shared state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceCreateOptions {
    /// Workspace name.
    pub name: String,

    /// Whether runs apply without manual confirmation.
    pub auto_apply: bool,
}

impl WorkspaceCreateOptions {
    /// Options for `name` with auto-apply enabled.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            auto_apply: true,
        }
    }

    /// Override the auto-apply flag.
    pub fn with_auto_apply(mut self, auto_apply: bool) -> Self {
        self.auto_apply = auto_apply;
        self
    }
}
