use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::models::MediaServerKind;
use crate::util::{env_prefix, non_empty_var, parse_bool, parse_csv_var, parse_var};

/// Raw configuration as defined in a TOML file.
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct FileConfig {
    #[serde(default)]
    pub server: FileServerConfig,
    #[serde(default)]
    pub database: FileDatabaseConfig,
    #[serde(default)]
    pub catalog: FileCatalogConfig,
    #[serde(default)]
    pub probe: FileProbeConfig,
    #[serde(default)]
    pub media_servers: FileMediaServersConfig,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileServerConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cors_allowed_origins: Option<Vec<String>>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileDatabaseConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_connections: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_migrations: Option<bool>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileCatalogConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tmdb_api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tmdb_base_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_timeout: Option<String>,
}

/// Durations are humantime strings such as `"5s"` or `"250ms"`.
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileProbeConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_retries: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_backoff: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileMediaServersConfig {
    /// Names of the servers to probe, in order. Defaults to every declared
    /// server in declaration order.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub servers: Vec<FileMediaServer>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileMediaServer {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<MediaServerKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub play_host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

/// Environment-derived configuration values.
#[derive(Debug, Default, Clone)]
pub struct EnvConfig {
    pub config_path: Option<PathBuf>,
    pub server_host: Option<String>,
    pub server_port: Option<u16>,
    pub cors_allowed_origins: Option<Vec<String>>,
    pub database_url: Option<String>,
    pub database_max_connections: Option<u32>,
    pub database_run_migrations: Option<bool>,
    pub tmdb_api_key: Option<String>,
    pub tmdb_base_url: Option<String>,
    pub tmdb_language: Option<String>,
    pub tmdb_timeout: Option<String>,
    pub probe_timeout: Option<String>,
    pub probe_max_retries: Option<u32>,
    pub probe_retry_backoff: Option<String>,
    /// Comma-separated `MEDIASERVER` list.
    pub media_servers: Option<Vec<String>>,
    /// Per-server overrides read from `<NAME>_HOST`, `<NAME>_API_KEY`,
    /// `<NAME>_PLAY_HOST` and `<NAME>_KIND`.
    pub media_server_overrides: Vec<FileMediaServer>,
}

impl EnvConfig {
    pub fn gather() -> Self {
        let media_servers = parse_csv_var("MEDIASERVER");

        let mut names: Vec<String> = media_servers.clone().unwrap_or_default();
        for conventional in ["emby", "jellyfin"] {
            if !names.iter().any(|n| n.eq_ignore_ascii_case(conventional)) {
                names.push(conventional.to_string());
            }
        }

        let media_server_overrides = names
            .into_iter()
            .filter_map(|name| Self::gather_server(&name))
            .collect();

        Self {
            config_path: non_empty_var("REELGAP_CONFIG").map(PathBuf::from),
            server_host: non_empty_var("SERVER_HOST"),
            server_port: parse_var("SERVER_PORT"),
            cors_allowed_origins: parse_csv_var("CORS_ALLOWED_ORIGINS"),
            database_url: non_empty_var("DATABASE_URL"),
            database_max_connections: parse_var("DATABASE_MAX_CONNECTIONS"),
            database_run_migrations: non_empty_var("DATABASE_RUN_MIGRATIONS")
                .and_then(|raw| parse_bool(&raw)),
            tmdb_api_key: non_empty_var("TMDB_API_KEY"),
            tmdb_base_url: non_empty_var("TMDB_API_URL"),
            tmdb_language: non_empty_var("TMDB_LANGUAGE"),
            tmdb_timeout: non_empty_var("TMDB_TIMEOUT"),
            probe_timeout: non_empty_var("PROBE_TIMEOUT"),
            probe_max_retries: parse_var("PROBE_MAX_RETRIES"),
            probe_retry_backoff: non_empty_var("PROBE_RETRY_BACKOFF"),
            media_servers,
            media_server_overrides,
        }
    }

    fn gather_server(name: &str) -> Option<FileMediaServer> {
        let prefix = env_prefix(name);
        let server = FileMediaServer {
            name: name.to_string(),
            kind: non_empty_var(&format!("{prefix}_KIND"))
                .and_then(|raw| raw.parse().ok()),
            host: non_empty_var(&format!("{prefix}_HOST")),
            play_host: non_empty_var(&format!("{prefix}_PLAY_HOST")),
            api_key: non_empty_var(&format!("{prefix}_API_KEY")),
        };

        if server.kind.is_none()
            && server.host.is_none()
            && server.play_host.is_none()
            && server.api_key.is_none()
        {
            None
        } else {
            Some(server)
        }
    }
}
