//! Terraform Cloud / Enterprise API v2 transport.
//!
//! Speaks the JSON:API dialect used by the service:
//!
//! | call                   | request                                     |
//! |------------------------|---------------------------------------------|
//! | read organization      | `GET organizations/{org}`                   |
//! | read workspace by name | `GET organizations/{org}/workspaces/{name}` |
//! | create workspace       | `POST organizations/{org}/workspaces`       |
//! | read workspace by ID   | `GET workspaces/{id}`                       |
//! | delete workspace       | `DELETE workspaces/{id}`                    |
//!
//! A 404 always maps to [`ApiError::NotFound`].

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use super::{ApiError, Connector, WorkspaceApi, is_valid_identifier};
use crate::model::{Organization, Workspace, WorkspaceCreateOptions, WorkspaceId};
use crate::session::SessionConfig;

const JSON_API: &str = "application/vnd.api+json";

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Builds [`HttpApi`] handles.
#[derive(Debug, Clone)]
pub struct HttpConnector {
    timeout: Duration,
}

impl HttpConnector {
    pub fn new() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Set the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for HttpConnector {
    fn default() -> Self {
        Self::new()
    }
}

impl Connector for HttpConnector {
    type Api = HttpApi;

    fn connect(&self, session: &SessionConfig) -> Result<HttpApi, ApiError> {
        HttpApi::new(session, self.timeout)
    }
}

/// Workspace API client over HTTP.
#[derive(Debug, Clone)]
pub struct HttpApi {
    client: reqwest::Client,
    base: Url,
}

impl HttpApi {
    /// Create a client for the session's address and token.
    pub fn new(session: &SessionConfig, timeout: Duration) -> Result<Self, ApiError> {
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", session.token().expose()))
            .map_err(|_| ApiError::InvalidArgument {
                field: "token",
                value: "[REDACTED]".to_string(),
            })?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);
        headers.insert(ACCEPT, HeaderValue::from_static(JSON_API));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .user_agent(concat!("tfcbind/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ApiError::Transport {
                message: format!("failed to build HTTP client: {}", e),
            })?;

        let mut base = session.address().clone();
        base.path_segments_mut()
            .map_err(|_| ApiError::Transport {
                message: format!("service address {} cannot be a base URL", session.address()),
            })?
            .pop_if_empty()
            .extend(["api", "v2"]);

        Ok(Self { client, base })
    }

    /// The API root, e.g. `https://app.terraform.io/api/v2`.
    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::Transport {
                message: format!("cannot extend {}", self.base),
            })?
            .extend(segments);
        Ok(url)
    }

    async fn execute(
        &self,
        method: Method,
        url: Url,
        body: Option<Vec<u8>>,
        resource: &str,
    ) -> Result<reqwest::Response, ApiError> {
        debug!("{} {}", method, url);

        let mut request = self.client.request(method, url);
        if let Some(body) = body {
            request = request.header(CONTENT_TYPE, JSON_API).body(body);
        }

        let response = request.send().await.map_err(|e| ApiError::Transport {
            message: e.to_string(),
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        match status {
            StatusCode::NOT_FOUND => Err(ApiError::not_found(resource)),
            StatusCode::UNAUTHORIZED => Err(ApiError::Unauthorized),
            _ => {
                let body = response.text().await.map_err(|e| ApiError::Transport {
                    message: format!("failed to read error body: {}", e),
                })?;
                Err(ApiError::Remote {
                    status: status.as_u16(),
                    message: error_message(&body, status),
                })
            }
        }
    }

    async fn fetch_workspace(&self, url: Url, resource: &str) -> Result<Workspace, ApiError> {
        let response = self.execute(Method::GET, url, None, resource).await?;
        decode_workspace(response).await
    }
}

#[async_trait]
impl WorkspaceApi for HttpApi {
    async fn read_organization(&self, organization: &str) -> Result<Organization, ApiError> {
        check_identifier("organization", organization)?;

        let url = self.endpoint(&["organizations", organization])?;
        let resource = format!("organization {}", organization);
        let response = self.execute(Method::GET, url, None, &resource).await?;

        let document: Document<OrganizationAttributes> = decode(response).await?;
        let data = document.data;
        Ok(Organization {
            name: data.attributes.name.or(data.id).unwrap_or_else(|| organization.to_string()),
            email: data.attributes.email,
        })
    }

    async fn read_workspace(
        &self,
        organization: &str,
        name: &str,
    ) -> Result<Workspace, ApiError> {
        check_identifier("organization", organization)?;
        check_identifier("workspace", name)?;

        let url = self.endpoint(&["organizations", organization, "workspaces", name])?;
        self.fetch_workspace(url, &format!("workspace {}/{}", organization, name))
            .await
    }

    async fn create_workspace(
        &self,
        organization: &str,
        options: &WorkspaceCreateOptions,
    ) -> Result<Workspace, ApiError> {
        check_identifier("organization", organization)?;
        check_identifier("workspace", &options.name)?;

        let url = self.endpoint(&["organizations", organization, "workspaces"])?;
        let body = serde_json::to_vec(&CreateDocument {
            data: CreateResource {
                kind: "workspaces",
                attributes: CreateAttributes {
                    name: &options.name,
                    auto_apply: options.auto_apply,
                },
            },
        })
        .map_err(|e| ApiError::Decode {
            message: format!("failed to encode request: {}", e),
        })?;

        let resource = format!("organization {}", organization);
        let response = self.execute(Method::POST, url, Some(body), &resource).await?;
        decode_workspace(response).await
    }

    async fn read_workspace_by_id(&self, id: &WorkspaceId) -> Result<Workspace, ApiError> {
        check_identifier("workspace ID", id.as_str())?;

        let url = self.endpoint(&["workspaces", id.as_str()])?;
        self.fetch_workspace(url, &format!("workspace {}", id)).await
    }

    async fn delete_workspace_by_id(&self, id: &WorkspaceId) -> Result<(), ApiError> {
        check_identifier("workspace ID", id.as_str())?;

        let url = self.endpoint(&["workspaces", id.as_str()])?;
        self.execute(Method::DELETE, url, None, &format!("workspace {}", id))
            .await?;
        Ok(())
    }
}

fn check_identifier(field: &'static str, value: &str) -> Result<(), ApiError> {
    if is_valid_identifier(value) {
        Ok(())
    } else {
        Err(ApiError::InvalidArgument {
            field,
            value: value.to_string(),
        })
    }
}

async fn decode<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
    let bytes = response.bytes().await.map_err(|e| ApiError::Transport {
        message: e.to_string(),
    })?;
    serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode {
        message: e.to_string(),
    })
}

async fn decode_workspace(response: reqwest::Response) -> Result<Workspace, ApiError> {
    let document: Document<WorkspaceAttributes> = decode(response).await?;
    let data = document.data;
    let id = data.id.ok_or_else(|| ApiError::Decode {
        message: "workspace without id".to_string(),
    })?;

    Ok(Workspace {
        id: WorkspaceId::new(id),
        name: data.attributes.name,
        auto_apply: data.attributes.auto_apply,
        created_at: data.attributes.created_at,
    })
}

/// Join the `detail` (or `title`) of every JSON:API error object.
fn error_message(body: &str, status: StatusCode) -> String {
    let details: Vec<String> = serde_json::from_str::<ErrorDocument>(body)
        .map(|doc| {
            doc.errors
                .into_iter()
                .filter_map(|e| e.detail.or(e.title))
                .collect()
        })
        .unwrap_or_default();

    if details.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("unexpected status")
            .to_string()
    } else {
        details.join("; ")
    }
}

#[derive(Debug, Deserialize)]
struct Document<T> {
    data: Resource<T>,
}

#[derive(Debug, Deserialize)]
struct Resource<T> {
    #[serde(default)]
    id: Option<String>,
    attributes: T,
}

#[derive(Debug, Deserialize)]
struct OrganizationAttributes {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct WorkspaceAttributes {
    name: String,
    #[serde(default)]
    auto_apply: bool,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
struct CreateDocument<'a> {
    data: CreateResource<'a>,
}

#[derive(Debug, Serialize)]
struct CreateResource<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    attributes: CreateAttributes<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "kebab-case")]
struct CreateAttributes<'a> {
    name: &'a str,
    auto_apply: bool,
}

#[derive(Debug, Deserialize)]
struct ErrorDocument {
    #[serde(default)]
    errors: Vec<ErrorObject>,
}

#[derive(Debug, Deserialize)]
struct ErrorObject {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    detail: Option<String>,
}
