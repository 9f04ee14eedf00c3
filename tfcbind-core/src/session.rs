//! Host-derived session resolution.
//!
//! The service address comes from `TF_URL` (or the public Terraform Cloud
//! endpoint). Its host selects the token in the [`CredentialsStore`]. A host
//! without a usable token is always an error; there is no anonymous session.

use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::credentials::{CredentialFields, CredentialsStore};
use crate::error::ConfigError;
use crate::secret::Secret;

/// Environment variable overriding the service address.
pub const ADDRESS_ENV_VAR: &str = "TF_URL";

/// Address used when [`ADDRESS_ENV_VAR`] is unset.
pub const DEFAULT_ADDRESS: &str = "https://app.terraform.io";

/// Resolved address and token used to authenticate every remote call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    address: Url,
    token: Secret,
}

impl SessionConfig {
    /// The service address.
    pub fn address(&self) -> &Url {
        &self.address
    }

    /// The host the token was resolved for, including an explicit port.
    pub fn host(&self) -> String {
        host_key(&self.address).unwrap_or_default()
    }

    /// The API token.
    pub fn token(&self) -> &Secret {
        &self.token
    }
}

/// Resolve a session from the process environment and a credentials store.
pub fn resolve_session(store: &CredentialsStore) -> Result<SessionConfig, ConfigError> {
    let address = std::env::var(ADDRESS_ENV_VAR).ok();
    resolve_session_for(address.as_deref(), store)
}

/// Resolve a session for an explicit address override.
///
/// `None` or an empty string selects [`DEFAULT_ADDRESS`].
pub fn resolve_session_for(
    address: Option<&str>,
    store: &CredentialsStore,
) -> Result<SessionConfig, ConfigError> {
    let address = match address.map(str::trim) {
        Some(a) if !a.is_empty() => a,
        _ => DEFAULT_ADDRESS,
    };

    let url = Url::parse(address).map_err(|e| ConfigError::InvalidAddress {
        address: address.to_string(),
        message: e.to_string(),
    })?;

    let host = host_key(&url).ok_or_else(|| ConfigError::InvalidAddress {
        address: address.to_string(),
        message: "missing host".to_string(),
    })?;

    let fields = match lookup(store, &host, address) {
        Some(fields) => fields,
        None => return Err(ConfigError::MissingToken { host }),
    };

    let token = fields.get("token").map(token_to_string).unwrap_or_default();
    if token.is_empty() {
        return Err(ConfigError::EmptyToken { host });
    }

    debug!("resolved session for host {}", host);

    Ok(SessionConfig {
        address: url,
        token: Secret::new(token),
    })
}

/// Non-empty entry for `host`, or for the authority as written in `address`.
///
/// `Url` drops an explicit default port (`https://tfe.local:443` parses to
/// host `tfe.local`), so a store keyed `tfe.local:443` is tried second.
fn lookup<'a>(
    store: &'a CredentialsStore,
    host: &str,
    address: &str,
) -> Option<&'a CredentialFields> {
    let non_empty = |key: &str| store.get(key).filter(|fields| !fields.is_empty());
    non_empty(host).or_else(|| {
        raw_authority(address)
            .filter(|raw| !raw.eq_ignore_ascii_case(host))
            .and_then(|raw| non_empty(&raw))
    })
}

/// `https://user@Host:443/path` -> `host:443`.
fn raw_authority(address: &str) -> Option<String> {
    let (_, rest) = address.split_once("://")?;
    let authority = rest.split(['/', '?', '#']).next()?;
    let authority = authority.rsplit_once('@').map_or(authority, |(_, a)| a);
    (!authority.is_empty()).then(|| authority.to_lowercase())
}

/// Host plus `:port` when the address carries a non-default port.
fn host_key(url: &Url) -> Option<String> {
    let host = url.host_str().filter(|h| !h.is_empty())?;
    Some(match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    })
}

fn token_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
