use once_cell::sync::Lazy;
use std::{fs, path::PathBuf, time::Duration};
use thiserror::Error;
use url::Url;

use crate::models::{
    CatalogConfig, Config, ConfigMetadata, DEFAULT_TMDB_BASE_URL,
    DatabaseConfig, MediaServerConfig, MediaServerKind, MediaServersConfig,
    ProbeConfig, ServerConfig,
};
use crate::sources::{EnvConfig, FileConfig, FileMediaServer};
use crate::util::parse_duration;
use crate::validation::{self, ConfigWarnings};

static DEFAULT_CONFIG_LOCATIONS: Lazy<Vec<PathBuf>> = Lazy::new(|| {
    vec![
        PathBuf::from("reelgap.toml"),
        PathBuf::from("config/reelgap.toml"),
    ]
});

#[derive(Debug, Default, Clone)]
pub struct ConfigLoaderOptions {
    pub config_path: Option<PathBuf>,
    pub env_file: Option<PathBuf>,
}

#[derive(Debug, Default)]
pub struct ConfigLoader {
    options: ConfigLoaderOptions,
}

#[derive(Debug)]
pub struct ConfigLoad {
    pub config: Config,
    pub warnings: ConfigWarnings,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ConfigLoaderOptions) -> Self {
        Self { options }
    }

    pub fn with_config_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.options.config_path = Some(path.into());
        self
    }

    pub fn with_env_file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.options.env_file = Some(path.into());
        self
    }

    pub fn load(&self) -> Result<ConfigLoad, ConfigLoadError> {
        let env_file_loaded = match &self.options.env_file {
            Some(path) => dotenvy::from_path(path).map(|_| true).or_else(
                |err| match err {
                    dotenvy::Error::Io(_) => Ok(false),
                    _ => Err(err),
                },
            )?,
            None => {
                dotenvy::dotenv().map(|_| true).or_else(|err| match err {
                    dotenvy::Error::Io(_) => Ok(false),
                    _ => Err(err),
                })?
            }
        };

        let env_config = EnvConfig::gather();
        let (file_config, config_path) = self.load_file_config(&env_config)?;

        let mut load = compose(file_config, env_config)?;
        load.config.metadata = ConfigMetadata {
            config_path,
            env_file_loaded,
        };
        Ok(load)
    }

    fn load_file_config(
        &self,
        env_config: &EnvConfig,
    ) -> Result<(Option<FileConfig>, Option<PathBuf>), ConfigLoadError> {
        let (path, explicit) = if let Some(explicit) = &self.options.config_path
        {
            (Some(explicit.clone()), true)
        } else if let Some(from_env) = &env_config.config_path {
            (Some(from_env.clone()), true)
        } else {
            let default = DEFAULT_CONFIG_LOCATIONS
                .iter()
                .find(|candidate| candidate.exists())
                .cloned();
            (default, false)
        };

        let Some(path) = path else {
            return Ok((None, None));
        };

        if !path.exists() {
            if explicit {
                return Err(ConfigLoadError::MissingConfig { path });
            }
            return Ok((None, None));
        }

        let contents =
            fs::read_to_string(&path).map_err(|err| ConfigLoadError::Io {
                path: path.clone(),
                source: err,
            })?;
        let file_config: FileConfig =
            toml::from_str(&contents).map_err(|err| ConfigLoadError::Parse {
                path: path.clone(),
                source: err,
            })?;

        Ok((Some(file_config), Some(path)))
    }
}

/// Merges file and environment values. Environment values win; absent
/// values fall back to built-in defaults.
pub fn compose(
    file_config: Option<FileConfig>,
    env: EnvConfig,
) -> Result<ConfigLoad, ConfigLoadError> {
    let mut warnings = ConfigWarnings::default();
    let config_present = file_config.is_some();
    if !config_present {
        warnings.push_with_hint(
            "No reelgap.toml detected; falling back to environment variables",
            "Pass --config or set REELGAP_CONFIG to use a configuration file",
        );
    }

    let FileConfig {
        server: file_server,
        database: file_database,
        catalog: file_catalog,
        probe: file_probe,
        media_servers: file_media_servers,
    } = file_config.unwrap_or_default();

    let server = ServerConfig {
        host: env
            .server_host
            .clone()
            .or(file_server.host)
            .unwrap_or_else(|| "0.0.0.0".to_string()),
        port: env.server_port.or(file_server.port).unwrap_or(3001),
        cors_allowed_origins: env
            .cors_allowed_origins
            .clone()
            .or(file_server.cors_allowed_origins)
            .unwrap_or_default(),
    };

    let database = DatabaseConfig {
        url: env
            .database_url
            .clone()
            .or(file_database.url)
            .filter(|url| !url.trim().is_empty()),
        max_connections: env
            .database_max_connections
            .or(file_database.max_connections)
            .unwrap_or(5),
        run_migrations: env
            .database_run_migrations
            .or(file_database.run_migrations)
            .unwrap_or(true),
    };

    let tmdb_base_url = env
        .tmdb_base_url
        .clone()
        .or(file_catalog.tmdb_base_url)
        .unwrap_or_else(|| DEFAULT_TMDB_BASE_URL.to_string());
    let catalog = CatalogConfig {
        tmdb_api_key: env
            .tmdb_api_key
            .clone()
            .or(file_catalog.tmdb_api_key)
            .filter(|key| !key.trim().is_empty()),
        tmdb_base_url: parse_base_url("catalog.tmdb_base_url", &tmdb_base_url)?,
        language: env
            .tmdb_language
            .clone()
            .or(file_catalog.language)
            .unwrap_or_else(|| "en-US".to_string()),
        request_timeout: duration_field(
            "catalog.request_timeout",
            env.tmdb_timeout.clone().or(file_catalog.request_timeout),
            Duration::from_secs(10),
        )?,
    };

    let defaults = ProbeConfig::default();
    let probe = ProbeConfig {
        timeout: duration_field(
            "probe.timeout",
            env.probe_timeout.clone().or(file_probe.timeout),
            defaults.timeout,
        )?,
        max_retries: env
            .probe_max_retries
            .or(file_probe.max_retries)
            .unwrap_or(defaults.max_retries),
        retry_backoff: duration_field(
            "probe.retry_backoff",
            env.probe_retry_backoff.clone().or(file_probe.retry_backoff),
            defaults.retry_backoff,
        )?,
    };

    let mut declared = file_media_servers.servers;
    for override_entry in env.media_server_overrides.iter().cloned() {
        merge_server(&mut declared, override_entry);
    }
    let enabled = env
        .media_servers
        .clone()
        .or(file_media_servers.enabled)
        .unwrap_or_else(|| declared.iter().map(|s| s.name.clone()).collect());
    let media_servers =
        resolve_media_servers(&declared, &enabled, &mut warnings)?;

    let config = Config {
        server,
        database,
        catalog,
        probe,
        media_servers,
        metadata: ConfigMetadata::default(),
    };

    warnings.extend(validation::collect_warnings(&config));

    Ok(ConfigLoad { config, warnings })
}

fn merge_server(declared: &mut Vec<FileMediaServer>, incoming: FileMediaServer) {
    match declared
        .iter_mut()
        .find(|existing| existing.name.eq_ignore_ascii_case(&incoming.name))
    {
        Some(existing) => {
            existing.kind = incoming.kind.or(existing.kind);
            existing.host = incoming.host.or(existing.host.take());
            existing.play_host = incoming.play_host.or(existing.play_host.take());
            existing.api_key = incoming.api_key.or(existing.api_key.take());
        }
        None => declared.push(incoming),
    }
}

fn resolve_media_servers(
    declared: &[FileMediaServer],
    enabled: &[String],
    warnings: &mut ConfigWarnings,
) -> Result<MediaServersConfig, ConfigLoadError> {
    let mut servers: Vec<MediaServerConfig> = Vec::new();

    for name in enabled {
        if servers.iter().any(|s| s.name.eq_ignore_ascii_case(name)) {
            warnings.push(format!("Media server '{name}' enabled twice"));
            continue;
        }

        let entry = declared
            .iter()
            .find(|server| server.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| ConfigLoadError::UnknownMediaServer {
                name: name.clone(),
            })?;

        let kind = entry
            .kind
            .or_else(|| MediaServerKind::from_name(&entry.name))
            .ok_or_else(|| ConfigLoadError::IncompleteMediaServer {
                name: entry.name.clone(),
                field: "kind",
            })?;
        let host = entry.host.as_deref().ok_or_else(|| {
            ConfigLoadError::IncompleteMediaServer {
                name: entry.name.clone(),
                field: "host",
            }
        })?;
        let api_key = entry.api_key.clone().ok_or_else(|| {
            ConfigLoadError::IncompleteMediaServer {
                name: entry.name.clone(),
                field: "api_key",
            }
        })?;

        let host = parse_base_url("media_servers.host", host)?;
        let play_host = entry
            .play_host
            .as_deref()
            .map(|raw| parse_base_url("media_servers.play_host", raw))
            .transpose()?;

        servers.push(MediaServerConfig {
            name: entry.name.clone(),
            kind,
            host,
            play_host,
            api_key,
        });
    }

    Ok(MediaServersConfig { servers })
}

/// Parses a base URL and makes sure it ends with `/` so relative joins keep
/// any path prefix.
fn parse_base_url(
    field: &'static str,
    raw: &str,
) -> Result<Url, ConfigLoadError> {
    let trimmed = raw.trim();
    let mut candidate = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("http://{trimmed}")
    };
    if !candidate.ends_with('/') {
        candidate.push('/');
    }
    Url::parse(&candidate)
        .map_err(|source| ConfigLoadError::InvalidUrl { field, source })
}

fn duration_field(
    field: &'static str,
    raw: Option<String>,
    default: Duration,
) -> Result<Duration, ConfigLoadError> {
    match raw {
        Some(raw) => parse_duration(&raw).map_err(|source| {
            ConfigLoadError::InvalidDuration {
                field,
                value: raw.clone(),
                source,
            }
        }),
        None => Ok(default),
    }
}

#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("configuration file missing: {path}")]
    MissingConfig { path: PathBuf },
    #[error("failed to read configuration {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse configuration {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid URL for {field}")]
    InvalidUrl {
        field: &'static str,
        #[source]
        source: url::ParseError,
    },
    #[error("invalid duration '{value}' for {field}")]
    InvalidDuration {
        field: &'static str,
        value: String,
        #[source]
        source: humantime::DurationError,
    },
    #[error("media server '{name}' is enabled but not configured")]
    UnknownMediaServer { name: String },
    #[error("media server '{name}' is missing {field}")]
    IncompleteMediaServer { name: String, field: &'static str },
    #[error(transparent)]
    EnvFile(#[from] dotenvy::Error),
}
