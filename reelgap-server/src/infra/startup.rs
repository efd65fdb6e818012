//! Builds the availability pipeline from configuration.

use std::sync::Arc;

use anyhow::Context;
use reelgap_config::{Config, MediaServerKind};
use reelgap_core::{
    AvailabilityService, EmbyClient, ExistenceStore, InMemoryExistenceStore,
    MediaServerClient, ProbePolicy, RetryPolicy, ServerExistenceProbe, ServerFlavor,
    TmdbCatalog,
};
use tracing::{info, warn};

const USER_AGENT: &str = concat!("reelgap/", env!("CARGO_PKG_VERSION"));

pub async fn build_service(config: &Config) -> anyhow::Result<AvailabilityService> {
    let catalog_client = reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(config.catalog.request_timeout)
        .build()
        .context("failed to build catalog HTTP client")?;
    // Probe calls are bounded per attempt by the probe policy instead.
    let server_client = reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .build()
        .context("failed to build media server HTTP client")?;

    let catalog = TmdbCatalog::new(
        config.catalog.tmdb_api_key.clone().unwrap_or_default(),
        config.catalog.tmdb_base_url.clone(),
        config.catalog.language.clone(),
        catalog_client,
    );

    let store = build_store(config).await?;
    let probe = build_probe(config, server_client);

    info!(
        media_servers = ?probe.server_names().collect::<Vec<_>>(),
        probe.timeout = ?config.probe.timeout,
        probe.max_retries = config.probe.max_retries,
        "availability pipeline ready"
    );

    Ok(AvailabilityService::new(
        Arc::new(catalog),
        store,
        Arc::new(probe),
    ))
}

async fn build_store(config: &Config) -> anyhow::Result<Arc<dyn ExistenceStore>> {
    match config.database.url.as_deref() {
        #[cfg(feature = "database")]
        Some(url) => {
            let pool = sqlx::postgres::PgPoolOptions::new()
                .max_connections(config.database.max_connections)
                .connect(url)
                .await
                .context("failed to connect to the media index database")?;

            if config.database.run_migrations {
                reelgap_core::MIGRATOR
                    .run(&pool)
                    .await
                    .context("failed to run media index migrations")?;
                info!("media index migrations applied");
            }

            Ok(Arc::new(reelgap_core::PostgresExistenceStore::new(pool)))
        }
        #[cfg(not(feature = "database"))]
        Some(_) => {
            warn!("built without database support; ignoring DATABASE_URL");
            Ok(Arc::new(InMemoryExistenceStore::new()))
        }
        None => {
            warn!("no database configured; local media index is empty");
            Ok(Arc::new(InMemoryExistenceStore::new()))
        }
    }
}

/// Media servers in configured order; the first one serves play links.
pub fn build_probe(config: &Config, client: reqwest::Client) -> ServerExistenceProbe {
    let servers = config
        .media_servers
        .servers
        .iter()
        .map(|server| {
            let flavor = match server.kind {
                MediaServerKind::Emby => ServerFlavor::Emby,
                MediaServerKind::Jellyfin => ServerFlavor::Jellyfin,
            };
            Arc::new(EmbyClient::new(
                server.name.clone(),
                flavor,
                server.host.clone(),
                server.play_host.clone(),
                server.api_key.clone(),
                client.clone(),
            )) as Arc<dyn MediaServerClient>
        })
        .collect();

    let policy = ProbePolicy {
        timeout: config.probe.timeout,
        retry: RetryPolicy {
            max_retries: config.probe.max_retries,
            backoff: config.probe.retry_backoff,
            ..RetryPolicy::default()
        },
    };

    ServerExistenceProbe::new(servers, policy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use reelgap_config::{MediaServerConfig, compose, sources::EnvConfig};
    use reelgap_model::ItemId;
    use url::Url;

    fn config_with_servers() -> Config {
        let mut config = compose(None, EnvConfig::default())
            .expect("default config")
            .config;
        config.media_servers.servers = vec![
            MediaServerConfig {
                name: "jellyfin".into(),
                kind: MediaServerKind::Jellyfin,
                host: Url::parse("http://jf.local:8096/").expect("url"),
                play_host: None,
                api_key: "a".into(),
            },
            MediaServerConfig {
                name: "emby".into(),
                kind: MediaServerKind::Emby,
                host: Url::parse("http://emby.local:8096/").expect("url"),
                play_host: Some(Url::parse("https://watch.example.org/").expect("url")),
                api_key: "b".into(),
            },
        ];
        config
    }

    #[test]
    fn probe_keeps_configured_order_and_default_play_server() {
        let probe = build_probe(&config_with_servers(), reqwest::Client::new());
        assert_eq!(
            probe.server_names().collect::<Vec<_>>(),
            vec!["jellyfin", "emby"]
        );

        let id = ItemId::from("99");
        assert_eq!(
            probe.play_url(None, &id).as_deref(),
            Some("http://jf.local:8096/web/index.html#!/details?id=99")
        );
        assert_eq!(
            probe.play_url(Some("emby"), &id).as_deref(),
            Some("https://watch.example.org/web/index.html#!/item?id=99&context=home")
        );
    }

    #[tokio::test]
    async fn service_without_database_uses_empty_index() {
        let config = compose(None, EnvConfig::default())
            .expect("default config")
            .config;
        assert!(config.database.url.is_none());
        let service = build_service(&config).await.expect("service builds");
        assert!(service.play_url(&ItemId::from("1")).is_none());
    }
}
