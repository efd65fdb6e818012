//! Ordered existence lookup: local index first, then live media servers.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use reelgap_model::{CanonicalMedia, ExistenceRecord, QueryDescriptor};
use tracing::{debug, warn};

use crate::error::Result;
use crate::servers::ServerExistenceProbe;
use crate::store::{ExistenceStore, IndexLookup};

/// What a single provider knows about a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderOutcome {
    Found(ExistenceRecord),
    Absent,
}

#[derive(Debug, Clone, Copy)]
pub struct ExistenceQuery<'a> {
    pub descriptor: &'a QueryDescriptor,
    /// Canonical identity when identification succeeded.
    pub media: Option<&'a CanonicalMedia>,
}

#[async_trait]
pub trait ExistenceProvider: Send + Sync {
    fn name(&self) -> &'static str;

    async fn check(&self, query: ExistenceQuery<'_>) -> Result<ProviderOutcome>;
}

/// Existence answers from the local index. Store failures abort the chain.
#[derive(Clone)]
pub struct LocalIndexProvider {
    store: Arc<dyn ExistenceStore>,
}

impl LocalIndexProvider {
    pub fn new(store: Arc<dyn ExistenceStore>) -> Self {
        Self { store }
    }
}

impl fmt::Debug for LocalIndexProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalIndexProvider").finish_non_exhaustive()
    }
}

#[async_trait]
impl ExistenceProvider for LocalIndexProvider {
    fn name(&self) -> &'static str {
        "local_index"
    }

    async fn check(&self, query: ExistenceQuery<'_>) -> Result<ProviderOutcome> {
        let lookup = IndexLookup::from_query(query.descriptor, query.media);
        Ok(match self.store.lookup(&lookup).await? {
            Some(record) => ProviderOutcome::Found(record),
            None => ProviderOutcome::Absent,
        })
    }
}

/// Existence answers from live media servers. Needs a canonical identity;
/// unreachable servers count as absent.
#[derive(Debug, Clone)]
pub struct MediaServerProvider {
    probe: Arc<ServerExistenceProbe>,
}

impl MediaServerProvider {
    pub fn new(probe: Arc<ServerExistenceProbe>) -> Self {
        Self { probe }
    }
}

#[async_trait]
impl ExistenceProvider for MediaServerProvider {
    fn name(&self) -> &'static str {
        "media_server"
    }

    async fn check(&self, query: ExistenceQuery<'_>) -> Result<ProviderOutcome> {
        let Some(media) = query.media else {
            debug!("no canonical identity, skipping media server probe");
            return Ok(ProviderOutcome::Absent);
        };

        match self.probe.probe(media).await {
            Ok(Some(record)) => Ok(ProviderOutcome::Found(record)),
            Ok(None) => Ok(ProviderOutcome::Absent),
            Err(unavailable) => {
                warn!(
                    target: "reelgap::probe",
                    key = %media.key(),
                    error = %unavailable,
                    "media server probe unavailable, treating as absent"
                );
                Ok(ProviderOutcome::Absent)
            }
        }
    }
}

/// Runs providers in order and stops at the first that finds the media.
#[derive(Clone, Default)]
pub struct ExistenceChain {
    providers: Vec<Arc<dyn ExistenceProvider>>,
}

impl fmt::Debug for ExistenceChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExistenceChain")
            .field(
                "providers",
                &self.providers.iter().map(|p| p.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl ExistenceChain {
    pub fn new(providers: Vec<Arc<dyn ExistenceProvider>>) -> Self {
        Self { providers }
    }

    /// Local index, then media servers.
    pub fn standard(store: Arc<dyn ExistenceStore>, probe: Arc<ServerExistenceProbe>) -> Self {
        Self::new(vec![
            Arc::new(LocalIndexProvider::new(store)),
            Arc::new(MediaServerProvider::new(probe)),
        ])
    }

    pub fn push(&mut self, provider: Arc<dyn ExistenceProvider>) {
        self.providers.push(provider);
    }

    pub async fn check(&self, query: ExistenceQuery<'_>) -> Result<Option<ExistenceRecord>> {
        for provider in &self.providers {
            if let ProviderOutcome::Found(record) = provider.check(query).await? {
                debug!(provider = provider.name(), item_id = %record.item_id, "media exists");
                return Ok(Some(record));
            }
        }
        Ok(None)
    }

    /// First answer of the named provider only.
    pub async fn check_with(
        &self,
        provider: &str,
        query: ExistenceQuery<'_>,
    ) -> Result<Option<ExistenceRecord>> {
        for candidate in self.providers.iter().filter(|p| p.name() == provider) {
            if let ProviderOutcome::Found(record) = candidate.check(query).await? {
                return Ok(Some(record));
            }
        }
        Ok(None)
    }
}
