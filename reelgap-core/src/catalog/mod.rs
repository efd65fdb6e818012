//! Metadata catalog port and its TMDB implementation.

pub mod tmdb;

use async_trait::async_trait;
use reelgap_model::{CanonicalMedia, EpisodeManifest, ExternalId, MediaType};

pub use tmdb::TmdbCatalog;

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("API error: {0}")]
    ApiError(String),

    #[error("Not found")]
    NotFound,

    #[error("Rate limited")]
    RateLimited,

    #[error("Invalid API key")]
    InvalidApiKey,

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Unsupported lookup: {0}")]
    Unsupported(String),
}

/// Source of canonical identities and episode listings.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Looks up an entry by id. `MediaType::Unknown` tries movies first,
    /// then series. A missing entry is `Ok(None)`.
    async fn resolve_by_id(
        &self,
        id: ExternalId,
        media_type: MediaType,
    ) -> Result<Option<CanonicalMedia>, ProviderError>;

    /// Free-text search. Results keep catalog relevance order; with
    /// `MediaType::Unknown` movie hits precede series hits.
    async fn search(
        &self,
        title: &str,
        year: Option<u16>,
        media_type: MediaType,
    ) -> Result<Vec<CanonicalMedia>, ProviderError>;

    /// Every (season, episode) slot the catalog lists for a series,
    /// specials included.
    async fn episode_manifest(
        &self,
        series: ExternalId,
    ) -> Result<EpisodeManifest, ProviderError>;
}
