//! CLI configuration handling.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Settings read from `config.toml`.
///
/// Every field can be overridden on the command line.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Organization the workspaces live in.
    pub organization: Option<String>,

    /// Secrets mount path handed to the workspace client.
    pub secrets_mount_path: String,

    /// Credentials file used instead of the `terraform login` default.
    pub credentials_file: Option<PathBuf>,
}

/// Load configuration from `path`, or from the default location.
///
/// A missing file yields the defaults.
pub fn load_config(path: Option<&Path>) -> Result<CliConfig> {
    match path {
        Some(path) => load_config_from(path),
        None => match default_config_path() {
            Some(path) => load_config_from(&path),
            None => Ok(CliConfig::default()),
        },
    }
}

pub fn load_config_from(path: &Path) -> Result<CliConfig> {
    if !path.exists() {
        return Ok(CliConfig::default());
    }

    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config from {:?}", path))?;
    toml::from_str(&contents).with_context(|| format!("Failed to parse config from {:?}", path))
}

fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("com", "raibid-labs", "tfcbind").map(|d| d.config_dir().join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let temp = TempDir::new().unwrap();
        let config = load_config(Some(&temp.path().join("config.toml"))).unwrap();
        assert_eq!(config, CliConfig::default());
    }

    #[test]
    fn test_parse_config() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(
            &path,
            "organization = \"acme\"\nsecrets_mount_path = \"secret/tfc\"\n",
        )
        .unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.organization.as_deref(), Some("acme"));
        assert_eq!(config.secrets_mount_path, "secret/tfc");
        assert!(config.credentials_file.is_none());
    }

    #[test]
    fn test_invalid_config_is_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(&path, "organization = [").unwrap();

        assert!(load_config(Some(&path)).is_err());
    }
}
