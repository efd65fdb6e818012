//! Local index of items already present on the configured media servers.

mod memory;
#[cfg(feature = "database")]
mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reelgap_model::{
    CanonicalMedia, CatalogId, ExistenceRecord, ItemId, MediaKey, MediaType,
    QueryDescriptor, SeasonPresence, SecondaryId,
};
use uuid::Uuid;

use crate::error::Result;
use crate::identifier::normalize_title;

pub use memory::InMemoryExistenceStore;
#[cfg(feature = "database")]
pub use postgres::PostgresExistenceStore;

/// Read-only existence check against the local index.
#[async_trait]
pub trait ExistenceStore: Send + Sync {
    /// Finds an indexed item for the query. Pure read; never calls out to a
    /// media server. Errors mean the index itself is unreachable.
    async fn lookup(&self, query: &IndexLookup) -> Result<Option<ExistenceRecord>>;
}

/// Query against the local index. `None` fields do not constrain the match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexLookup {
    pub title: Option<String>,
    pub year: Option<u16>,
    pub media_type: Option<MediaType>,
    pub catalog_id: Option<CatalogId>,
    pub season: Option<u16>,
}

impl IndexLookup {
    /// Builds a lookup from the parsed query, preferring the canonical id
    /// when identification succeeded.
    pub fn from_query(
        descriptor: &QueryDescriptor,
        media: Option<&CanonicalMedia>,
    ) -> Self {
        let catalog_id = media.and_then(CanonicalMedia::catalog_id).or_else(|| {
            descriptor.external_id.and_then(|id| id.as_catalog_id())
        });
        let media_type = media
            .map(|m| m.media_type)
            .unwrap_or(descriptor.media_type());

        Self {
            title: Some(descriptor.title.clone()).filter(|t| !t.trim().is_empty()),
            year: descriptor.year,
            media_type: Some(media_type).filter(|t| t.is_known()),
            catalog_id,
            season: descriptor.season(),
        }
    }

    /// True when the lookup carries something to match on.
    pub fn is_searchable(&self) -> bool {
        self.catalog_id.is_some() || self.title.is_some()
    }
}

/// One item of a media server library as mirrored into the local index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedItem {
    pub id: Uuid,
    pub server: String,
    pub library: Option<String>,
    pub item_id: ItemId,
    pub item_type: MediaType,
    pub title: String,
    pub original_title: Option<String>,
    pub year: Option<u16>,
    pub catalog_id: Option<CatalogId>,
    pub secondary_id: Option<SecondaryId>,
    pub seasons: SeasonPresence,
    pub updated_at: DateTime<Utc>,
}

impl IndexedItem {
    pub fn new(
        server: impl Into<String>,
        item_id: impl Into<ItemId>,
        item_type: MediaType,
        title: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            server: server.into(),
            library: None,
            item_id: item_id.into(),
            item_type,
            title: title.into(),
            original_title: None,
            year: None,
            catalog_id: None,
            secondary_id: None,
            seasons: SeasonPresence::new(),
            updated_at: Utc::now(),
        }
    }

    pub fn with_year(mut self, year: u16) -> Self {
        self.year = Some(year);
        self
    }

    pub fn with_catalog_id(mut self, id: CatalogId) -> Self {
        self.catalog_id = Some(id);
        self
    }

    pub fn with_original_title(mut self, title: impl Into<String>) -> Self {
        self.original_title = Some(title.into());
        self
    }

    pub fn with_library(mut self, library: impl Into<String>) -> Self {
        self.library = Some(library.into());
        self
    }

    pub fn with_seasons(mut self, seasons: SeasonPresence) -> Self {
        self.seasons = seasons;
        self
    }

    /// Catalog id match takes precedence; without one the title (or
    /// original title) and year must agree. A requested season must be
    /// listed in the item's season info.
    pub fn matches(&self, query: &IndexLookup) -> bool {
        if let Some(media_type) = query.media_type
            && media_type.is_known()
            && self.item_type != media_type
        {
            return false;
        }

        if let Some(catalog_id) = query.catalog_id {
            if self.catalog_id != Some(catalog_id) {
                return false;
            }
        } else {
            let Some(title) = query.title.as_deref() else {
                return false;
            };
            let wanted = normalize_title(title);
            let title_hit = std::iter::once(self.title.as_str())
                .chain(self.original_title.as_deref())
                .any(|candidate| normalize_title(candidate) == wanted);
            if !title_hit {
                return false;
            }
            if let Some(year) = query.year
                && self.year != Some(year)
            {
                return false;
            }
        }

        match query.season {
            Some(season) => self.seasons.contains_season(season),
            None => true,
        }
    }

    pub fn media_key(&self) -> Option<MediaKey> {
        self.catalog_id
            .map(MediaKey::Catalog)
            .or_else(|| self.secondary_id.map(MediaKey::Secondary))
    }

    pub fn to_record(&self) -> ExistenceRecord {
        let mut record = ExistenceRecord::local(self.item_id.clone(), self.item_type)
            .with_key(self.media_key())
            .with_seasons(self.seasons.clone());
        record.server = Some(self.server.clone());
        record
    }
}
