use crate::error::{ModelError, Result};
use crate::ids::{CatalogId, MediaKey, SecondaryId};
use crate::media_type::MediaType;

/// A media entry resolved against a catalog.
///
/// At least one of `catalog_id` / `secondary_id` is always set; use
/// [`CanonicalMedia::new`] to build one. An unresolved lookup is represented
/// by the absence of a value, never by an id-less instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalMedia {
    catalog_id: Option<CatalogId>,
    secondary_id: Option<SecondaryId>,
    pub media_type: MediaType,
    pub title: String,
    pub original_title: Option<String>,
    pub year: Option<u16>,
    pub season: Option<u16>,
}

/// Identity triple of a [`CanonicalMedia`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MediaIdentity {
    pub key: MediaKey,
    pub media_type: MediaType,
    pub season: Option<u16>,
}

impl CanonicalMedia {
    pub fn new(
        catalog_id: Option<CatalogId>,
        secondary_id: Option<SecondaryId>,
        media_type: MediaType,
        title: impl Into<String>,
    ) -> Result<Self> {
        if catalog_id.is_none() && secondary_id.is_none() {
            return Err(ModelError::InvalidMedia(
                "canonical media requires a catalog or secondary id".into(),
            ));
        }
        Ok(Self {
            catalog_id,
            secondary_id,
            media_type,
            title: title.into(),
            original_title: None,
            year: None,
            season: None,
        })
    }

    pub fn movie(id: CatalogId, title: impl Into<String>) -> Self {
        Self::from_catalog(id, MediaType::Movie, title)
    }

    pub fn series(id: CatalogId, title: impl Into<String>) -> Self {
        Self::from_catalog(id, MediaType::Tv, title)
    }

    fn from_catalog(
        id: CatalogId,
        media_type: MediaType,
        title: impl Into<String>,
    ) -> Self {
        Self {
            catalog_id: Some(id),
            secondary_id: None,
            media_type,
            title: title.into(),
            original_title: None,
            year: None,
            season: None,
        }
    }

    pub fn with_year(mut self, year: Option<u16>) -> Self {
        self.year = year;
        self
    }

    pub fn with_original_title(mut self, original: Option<String>) -> Self {
        self.original_title = original;
        self
    }

    pub fn with_season(mut self, season: Option<u16>) -> Self {
        self.season = season;
        self
    }

    /// Attaches a secondary id. Never removes an existing one.
    pub fn with_secondary_id(mut self, id: Option<SecondaryId>) -> Self {
        if id.is_some() {
            self.secondary_id = id;
        }
        self
    }

    pub fn catalog_id(&self) -> Option<CatalogId> {
        self.catalog_id
    }

    pub fn secondary_id(&self) -> Option<SecondaryId> {
        self.secondary_id
    }

    pub fn key(&self) -> MediaKey {
        match (self.catalog_id, self.secondary_id) {
            (Some(id), _) => MediaKey::Catalog(id),
            (None, Some(id)) => MediaKey::Secondary(id),
            (None, None) => unreachable!("constructors guarantee an id"),
        }
    }

    pub fn identity(&self) -> MediaIdentity {
        MediaIdentity {
            key: self.key(),
            media_type: self.media_type,
            season: self.season,
        }
    }

    /// Title candidates in preference order, used for fuzzy matching.
    pub fn titles(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.title.as_str())
            .chain(self.original_title.as_deref())
    }
}
