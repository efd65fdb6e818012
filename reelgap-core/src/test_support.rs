//! Fakes shared by unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use reelgap_model::{
    CanonicalMedia, EpisodeManifest, ExistenceRecord, ExternalId, ItemId, MediaType,
};
use url::Url;

use crate::catalog::{Catalog, ProviderError};
use crate::servers::{MediaServerClient, ProbeError};

/// Serves `router` on an ephemeral local port and returns its base URL.
pub(crate) async fn spawn_router(router: Router) -> Url {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("listener address");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("test server");
    });
    Url::parse(&format!("http://{addr}/")).expect("test server url")
}

#[derive(Debug, Default)]
pub(crate) struct FakeCatalog {
    media: Vec<CanonicalMedia>,
    manifests: HashMap<ExternalId, EpisodeManifest>,
    failing: bool,
    search_calls: AtomicUsize,
}

impl FakeCatalog {
    pub(crate) fn with_media(media: Vec<CanonicalMedia>) -> Self {
        Self {
            media,
            ..Self::default()
        }
    }

    pub(crate) fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub(crate) fn with_manifest(mut self, id: ExternalId, manifest: EpisodeManifest) -> Self {
        self.manifests.insert(id, manifest);
        self
    }

    pub(crate) fn search_calls(&self) -> usize {
        self.search_calls.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<(), ProviderError> {
        if self.failing {
            Err(ProviderError::ApiError("catalog offline".into()))
        } else {
            Ok(())
        }
    }
}

fn type_matches(wanted: MediaType, found: MediaType) -> bool {
    !wanted.is_known() || wanted == found
}

#[async_trait]
impl Catalog for FakeCatalog {
    async fn resolve_by_id(
        &self,
        id: ExternalId,
        media_type: MediaType,
    ) -> Result<Option<CanonicalMedia>, ProviderError> {
        self.check()?;
        Ok(self
            .media
            .iter()
            .find(|m| {
                let id_hit = match (id.as_catalog_id(), id.as_secondary_id()) {
                    (Some(catalog), _) => m.catalog_id() == Some(catalog),
                    (None, Some(secondary)) => m.secondary_id() == Some(secondary),
                    (None, None) => false,
                };
                id_hit && type_matches(media_type, m.media_type)
            })
            .cloned())
    }

    async fn search(
        &self,
        _title: &str,
        _year: Option<u16>,
        media_type: MediaType,
    ) -> Result<Vec<CanonicalMedia>, ProviderError> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(self
            .media
            .iter()
            .filter(|m| type_matches(media_type, m.media_type))
            .cloned()
            .collect())
    }

    async fn episode_manifest(
        &self,
        series: ExternalId,
    ) -> Result<EpisodeManifest, ProviderError> {
        self.check()?;
        self.manifests
            .get(&series)
            .cloned()
            .ok_or(ProviderError::NotFound)
    }
}

#[derive(Debug, Clone)]
pub(crate) enum ServerBehavior {
    Hit(ExistenceRecord),
    Miss,
    Fail,
    Hang,
    /// Fails the given number of calls, then answers with the record.
    FailThenHit(usize, ExistenceRecord),
}

#[derive(Debug)]
pub(crate) struct FakeServer {
    name: String,
    behavior: ServerBehavior,
    calls: AtomicUsize,
}

impl FakeServer {
    pub(crate) fn new(name: &str, behavior: ServerBehavior) -> Self {
        Self {
            name: name.to_string(),
            behavior,
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MediaServerClient for FakeServer {
    fn name(&self) -> &str {
        &self.name
    }

    async fn probe(
        &self,
        _media: &CanonicalMedia,
    ) -> Result<Option<ExistenceRecord>, ProbeError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.behavior {
            ServerBehavior::Hit(record) => Ok(Some(record.clone())),
            ServerBehavior::Miss => Ok(None),
            ServerBehavior::Fail => Err(ProbeError::Status(503)),
            ServerBehavior::Hang => {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(None)
            }
            ServerBehavior::FailThenHit(failures, record) => {
                if call < *failures {
                    Err(ProbeError::Status(502))
                } else {
                    Ok(Some(record.clone()))
                }
            }
        }
    }

    fn play_url(&self, item_id: &ItemId) -> String {
        format!("http://{}/play/{}", self.name, item_id)
    }
}
