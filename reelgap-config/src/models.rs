use serde::{Deserialize, Serialize};
use std::{fmt, path::PathBuf, time::Duration};
use url::Url;

pub const DEFAULT_TMDB_BASE_URL: &str = "https://api.themoviedb.org/3/";

/// Fully resolved runtime configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub catalog: CatalogConfig,
    pub probe: ProbeConfig,
    pub media_servers: MediaServersConfig,
    pub metadata: ConfigMetadata,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Empty means any origin.
    pub cors_allowed_origins: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub max_connections: u32,
    pub run_migrations: bool,
}

#[derive(Clone)]
pub struct CatalogConfig {
    pub tmdb_api_key: Option<String>,
    pub tmdb_base_url: Url,
    pub language: String,
    pub request_timeout: Duration,
}

impl fmt::Debug for CatalogConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CatalogConfig")
            .field("tmdb_api_key", &self.tmdb_api_key.as_ref().map(|_| "***"))
            .field("tmdb_base_url", &self.tmdb_base_url.as_str())
            .field("language", &self.language)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

/// Live media-server probing limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeConfig {
    pub timeout: Duration,
    pub max_retries: u32,
    pub retry_backoff: Duration,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            max_retries: 0,
            retry_backoff: Duration::from_millis(500),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaServerKind {
    Emby,
    Jellyfin,
}

impl MediaServerKind {
    /// Infers the kind from a conventional server name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "emby" => Some(Self::Emby),
            "jellyfin" => Some(Self::Jellyfin),
            _ => None,
        }
    }
}

impl std::str::FromStr for MediaServerKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| format!("unsupported server kind '{s}'"))
    }
}

#[derive(Clone)]
pub struct MediaServerConfig {
    pub name: String,
    pub kind: MediaServerKind,
    pub host: Url,
    /// Externally reachable address used for play links.
    pub play_host: Option<Url>,
    pub api_key: String,
}

impl fmt::Debug for MediaServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaServerConfig")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("host", &self.host.as_str())
            .field("play_host", &self.play_host.as_ref().map(Url::as_str))
            .field("api_key", &"***")
            .finish()
    }
}

/// Enabled media servers in probe order. The first entry is the default
/// target for play links.
#[derive(Debug, Clone, Default)]
pub struct MediaServersConfig {
    pub servers: Vec<MediaServerConfig>,
}

impl MediaServersConfig {
    pub fn default_server(&self) -> Option<&MediaServerConfig> {
        self.servers.first()
    }

    pub fn get(&self, name: &str) -> Option<&MediaServerConfig> {
        self.servers
            .iter()
            .find(|server| server.name.eq_ignore_ascii_case(name))
    }

    pub fn is_empty(&self) -> bool {
        self.servers.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ConfigMetadata {
    pub config_path: Option<PathBuf>,
    pub env_file_loaded: bool,
}
