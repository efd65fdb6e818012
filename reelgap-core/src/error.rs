use reelgap_model::ModelError;
use thiserror::Error;

use crate::catalog::ProviderError;
use crate::servers::ProbeUnavailable;

/// Failures of the availability pipeline.
///
/// `UnresolvedMedia` and `NotFound` describe valid terminal states rather
/// than faults. `ProbeUnavailable` is absorbed by the existence chain and
/// never reaches callers of the service.
#[derive(Debug, Error)]
pub enum AvailabilityError {
    #[error("invalid query: {0}")]
    Parse(String),

    #[error("media information not found")]
    UnresolvedMedia,

    #[error("not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    ProbeUnavailable(#[from] ProbeUnavailable),

    #[error("local media index unavailable: {0}")]
    Store(String),

    #[error("catalog unavailable: {0}")]
    CatalogUnavailable(#[from] ProviderError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<ModelError> for AvailabilityError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::UnknownMediaType(_) => Self::Parse(err.to_string()),
            ModelError::InvalidMedia(_) => Self::Internal(err.to_string()),
        }
    }
}

#[cfg(feature = "database")]
impl From<sqlx::Error> for AvailabilityError {
    fn from(err: sqlx::Error) -> Self {
        Self::Store(err.to_string())
    }
}

#[cfg(feature = "database")]
impl From<sqlx::migrate::MigrateError> for AvailabilityError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        Self::Store(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AvailabilityError>;
