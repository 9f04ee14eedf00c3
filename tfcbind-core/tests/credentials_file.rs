//! Integration tests for loading the JSON credentials file.

use tempfile::TempDir;
use tfcbind_core::{
    ConfigError, CredentialsLoader, CredentialsSource, CredentialsStore, resolve_session_for,
};

/// Helper to write a credentials file into a temporary directory.
fn write_credentials(contents: &str) -> (std::path::PathBuf, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("credentials.tfrc.json");
    std::fs::write(&path, contents).unwrap();
    (path, temp_dir)
}

#[tokio::test]
async fn test_load_credentials_file() {
    let (path, _temp) = write_credentials(
        r#"{
            "credentials": {
                "app.terraform.io": { "token": "abc123" },
                "tfe.internal": { "token": "internal" }
            }
        }"#,
    );

    let store = CredentialsSource::file(&path).load().await.unwrap();

    assert_eq!(store.len(), 2);
    let session = resolve_session_for(None, &store).unwrap();
    assert_eq!(session.token().expose(), "abc123");
}

#[tokio::test]
async fn test_missing_file_is_empty_store() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("does-not-exist.json");

    let store = CredentialsStore::load_file(&path).await.unwrap();

    assert!(store.is_empty());
}

#[tokio::test]
async fn test_malformed_file_is_config_error() {
    let (path, _temp) = write_credentials("credentials \"app.terraform.io\" {}");

    let result = CredentialsSource::file(&path).load().await;

    match result {
        Err(ConfigError::CredentialsFile { path: p, .. }) => assert_eq!(p, path),
        other => panic!("expected CredentialsFile error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_static_store_overrides_file() {
    let (path, _temp) = write_credentials(
        r#"{"credentials": {"app.terraform.io": {"token": "from-file"}}}"#,
    );

    let source = CredentialsSource::chain(vec![
        CredentialsSource::Static(
            CredentialsStore::new().with_token("app.terraform.io", "from-static"),
        ),
        CredentialsSource::file(&path),
    ]);
    let store = source.load().await.unwrap();

    let session = resolve_session_for(None, &store).unwrap();
    assert_eq!(session.token().expose(), "from-static");
}

#[tokio::test]
async fn test_empty_file_record_does_not_hide_later_token() {
    let (path, _temp) = write_credentials(r#"{"credentials": {"app.terraform.io": {}}}"#);

    let source = CredentialsSource::chain(vec![
        CredentialsSource::file(&path),
        CredentialsSource::Static(
            CredentialsStore::new().with_token("app.terraform.io", "from-static"),
        ),
    ]);
    let store = source.load().await.unwrap();

    let session = resolve_session_for(None, &store).unwrap();
    assert_eq!(session.token().expose(), "from-static");
}
