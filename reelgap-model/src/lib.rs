//! Core data model definitions shared across Reelgap crates.
#![allow(missing_docs)]

#[cfg(feature = "serde")]
pub mod api;
pub mod error;
pub mod existence;
pub mod gaps;
pub mod ids;
pub mod media;
pub mod media_type;
pub mod prelude;
pub mod query;

pub use error::{ModelError, Result as ModelResult};
pub use existence::{ExistenceLocation, ExistenceRecord, SeasonPresence};
pub use gaps::{Availability, EpisodeManifest, EpisodeRef, MissingSet, SeasonGap};
pub use ids::{CatalogId, CatalogKind, ExternalId, ItemId, MediaKey, SecondaryId};
pub use media::{CanonicalMedia, MediaIdentity};
pub use media_type::MediaType;
pub use query::QueryDescriptor;
