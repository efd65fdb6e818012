//! Live media server clients and the ordered existence probe.

pub mod emby;
pub mod probe;

use async_trait::async_trait;
use reelgap_model::{CanonicalMedia, ExistenceRecord, ItemId};
use std::time::Duration;
use thiserror::Error;

pub use emby::{EmbyClient, ServerFlavor};
pub use probe::{ProbePolicy, RetryPolicy, ServerExistenceProbe};

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("server returned status {0}")]
    Status(u16),

    #[error("unexpected response: {0}")]
    Decode(String),
}

/// One server that could not answer.
#[derive(Debug)]
pub struct ServerFailure {
    pub server: String,
    pub error: ProbeError,
}

/// Every failing server of a probe that found nothing.
#[derive(Debug, Error)]
#[error("media servers unavailable: {}", summarize(.failures))]
pub struct ProbeUnavailable {
    pub failures: Vec<ServerFailure>,
}

fn summarize(failures: &[ServerFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("{} ({})", f.server, f.error))
        .collect::<Vec<_>>()
        .join(", ")
}

/// A single media server able to answer "do you hold this item".
#[async_trait]
pub trait MediaServerClient: Send + Sync {
    fn name(&self) -> &str;

    /// Looks the media up on the server. For series the returned record
    /// lists the episodes the server holds. A requested season that the
    /// server lacks is reported as `Ok(None)`.
    async fn probe(
        &self,
        media: &CanonicalMedia,
    ) -> Result<Option<ExistenceRecord>, ProbeError>;

    /// Browser URL that opens the item on this server.
    fn play_url(&self, item_id: &ItemId) -> String;
}
