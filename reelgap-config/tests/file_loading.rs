use std::io::Write;

use reelgap_config::{ConfigLoadError, ConfigLoader, MediaServerKind};

fn loader_for(path: &std::path::Path) -> ConfigLoader {
    ConfigLoader::new()
        .with_config_path(path)
        .with_env_file("does-not-exist.env")
}

#[test]
fn loads_toml_file_from_explicit_path() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    writeln!(
        file,
        r#"
        [catalog]
        language = "de-DE"
        request_timeout = "4s"

        [media_servers]
        enabled = ["jellyfin"]

        [[media_servers.servers]]
        name = "jellyfin"
        kind = "jellyfin"
        host = "http://127.0.0.1:8096"
        api_key = "secret"
        "#
    )
    .expect("write config");

    let load = loader_for(file.path()).load().expect("config loads");
    let config = load.config;

    assert_eq!(config.catalog.language, "de-DE");
    assert_eq!(config.catalog.request_timeout.as_secs(), 4);
    assert_eq!(
        config.metadata.config_path.as_deref(),
        Some(file.path())
    );
    assert!(!config.metadata.env_file_loaded);

    let default = config
        .media_servers
        .default_server()
        .expect("default server");
    assert_eq!(default.kind, MediaServerKind::Jellyfin);
    assert_eq!(default.host.as_str(), "http://127.0.0.1:8096/");
}

#[test]
fn explicit_missing_file_is_an_error() {
    let dir = tempfile::tempdir().expect("temp dir");
    let missing = dir.path().join("absent.toml");

    let err = loader_for(&missing).load().unwrap_err();
    assert!(matches!(err, ConfigLoadError::MissingConfig { .. }));
}

#[test]
fn malformed_file_reports_parse_error() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    writeln!(file, "[server\nport = 1").expect("write config");

    let err = loader_for(file.path()).load().unwrap_err();
    assert!(matches!(err, ConfigLoadError::Parse { .. }));
}
