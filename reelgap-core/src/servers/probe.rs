use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use reelgap_model::{CanonicalMedia, ExistenceRecord, ItemId};
use tracing::{debug, instrument, warn};

use super::{MediaServerClient, ProbeError, ProbeUnavailable, ServerFailure};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Extra attempts after the first failure. Zero disables retries.
    pub max_retries: u32,
    /// Delay before the first retry; doubles per retry up to `max_backoff`.
    pub backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 0,
            backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbePolicy {
    /// Upper bound for a single call to one server.
    pub timeout: Duration,
    pub retry: RetryPolicy,
}

impl Default for ProbePolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            retry: RetryPolicy::default(),
        }
    }
}

/// Asks the configured servers in order; the first hit wins.
#[derive(Clone)]
pub struct ServerExistenceProbe {
    servers: Vec<Arc<dyn MediaServerClient>>,
    policy: ProbePolicy,
}

impl fmt::Debug for ServerExistenceProbe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerExistenceProbe")
            .field(
                "servers",
                &self.servers.iter().map(|s| s.name()).collect::<Vec<_>>(),
            )
            .field("policy", &self.policy)
            .finish()
    }
}

impl ServerExistenceProbe {
    pub fn new(servers: Vec<Arc<dyn MediaServerClient>>, policy: ProbePolicy) -> Self {
        Self { servers, policy }
    }

    pub fn is_empty(&self) -> bool {
        self.servers.is_empty()
    }

    pub fn server_names(&self) -> impl Iterator<Item = &str> {
        self.servers.iter().map(|s| s.name())
    }

    /// `Ok(None)` when every server answered and none holds the media. When
    /// nothing was found and at least one server failed the failures are
    /// returned so the caller can decide how to degrade.
    #[instrument(skip(self, media), fields(key = %media.key()), level = "debug")]
    pub async fn probe(
        &self,
        media: &CanonicalMedia,
    ) -> Result<Option<ExistenceRecord>, ProbeUnavailable> {
        let mut failures = Vec::new();

        for server in &self.servers {
            match self.probe_with_retry(server.as_ref(), media).await {
                Ok(Some(record)) => {
                    debug!(server = server.name(), item_id = %record.item_id, "found on media server");
                    return Ok(Some(record));
                }
                Ok(None) => {
                    debug!(server = server.name(), "not on media server");
                }
                Err(error) => failures.push(ServerFailure {
                    server: server.name().to_string(),
                    error,
                }),
            }
        }

        if failures.is_empty() {
            Ok(None)
        } else {
            Err(ProbeUnavailable { failures })
        }
    }

    async fn probe_with_retry(
        &self,
        server: &dyn MediaServerClient,
        media: &CanonicalMedia,
    ) -> Result<Option<ExistenceRecord>, ProbeError> {
        let retry = self.policy.retry;
        let mut attempt = 0;
        let mut backoff = retry.backoff;

        loop {
            let result = match tokio::time::timeout(self.policy.timeout, server.probe(media)).await
            {
                Ok(result) => result,
                Err(_) => Err(ProbeError::Timeout(self.policy.timeout)),
            };

            match result {
                Err(err) if attempt < retry.max_retries => {
                    attempt += 1;
                    warn!(
                        server = server.name(),
                        attempt,
                        max_retries = retry.max_retries,
                        error = %err,
                        "media server probe failed, retrying"
                    );
                    tokio::time::sleep(backoff).await;
                    backoff = std::cmp::min(backoff * 2, retry.max_backoff);
                }
                other => return other,
            }
        }
    }

    /// Play link on the named server, or on the first configured server.
    /// `None` when no such server exists.
    pub fn play_url(&self, server: Option<&str>, item_id: &ItemId) -> Option<String> {
        let client = match server {
            Some(name) => self.servers.iter().find(|s| s.name() == name),
            None => self.servers.first(),
        }?;
        Some(client.play_url(item_id))
    }
}
