pub use crate::existence::{ExistenceLocation, ExistenceRecord, SeasonPresence};
pub use crate::gaps::{
    Availability, EpisodeManifest, EpisodeRef, MissingSet, SeasonGap,
};
pub use crate::ids::{
    CatalogId, CatalogKind, ExternalId, ItemId, MediaKey, SecondaryId,
};
pub use crate::media::{CanonicalMedia, MediaIdentity};
pub use crate::media_type::MediaType;
pub use crate::query::QueryDescriptor;
