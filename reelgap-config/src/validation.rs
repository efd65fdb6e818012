use crate::models::Config;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigWarning {
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, Default, Clone)]
pub struct ConfigWarnings {
    pub items: Vec<ConfigWarning>,
}

impl ConfigWarnings {
    pub fn push<S: Into<String>>(&mut self, message: S) {
        self.items.push(ConfigWarning {
            message: message.into(),
            hint: None,
        });
    }

    pub fn push_with_hint<S: Into<String>, H: Into<String>>(
        &mut self,
        message: S,
        hint: H,
    ) {
        self.items.push(ConfigWarning {
            message: message.into(),
            hint: Some(hint.into()),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn extend(&mut self, other: ConfigWarnings) {
        self.items.extend(other.items);
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConfigWarning> {
        self.items.iter()
    }
}

/// Non-fatal checks on a composed configuration.
pub fn collect_warnings(config: &Config) -> ConfigWarnings {
    let mut warnings = ConfigWarnings::default();

    if config.catalog.tmdb_api_key.is_none() {
        warnings.push_with_hint(
            "No TMDB API key configured; catalog lookups will be rejected",
            "Set TMDB_API_KEY or [catalog].tmdb_api_key",
        );
    }

    if config.database.url.is_none() {
        warnings.push_with_hint(
            "No database configured; the local media index will be empty",
            "Set DATABASE_URL to use the persisted media server index",
        );
    }

    if config.media_servers.is_empty() {
        warnings.push_with_hint(
            "No media servers enabled; live existence probes are disabled",
            "Set MEDIASERVER=emby,jellyfin together with <NAME>_HOST and <NAME>_API_KEY",
        );
    }

    if config.probe.timeout.is_zero() {
        warnings.push("Probe timeout is zero; every live probe will time out");
    }

    warnings
}
