//! Turns raw lookup input into a [`QueryDescriptor`].

pub mod title_parser;

use reelgap_model::{CatalogId, ExternalId, MediaType, QueryDescriptor, SecondaryId};
use tracing::debug;

use crate::error::{AvailabilityError, Result};
pub use title_parser::{ParsedTitle, parse_title};

/// Structured hints supplied next to the raw title. Every field beats the
/// value parsed from the title.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryOverrides {
    pub year: Option<u16>,
    pub media_type: Option<MediaType>,
    pub season: Option<u16>,
    pub catalog_id: Option<CatalogId>,
    pub secondary_id: Option<SecondaryId>,
}

impl QueryOverrides {
    /// Reads a media type label such as `movie`, `tv` or `电视剧`. Blank
    /// labels mean no override.
    pub fn with_media_type_label(mut self, label: Option<&str>) -> Result<Self> {
        self.media_type = match label.map(str::trim).filter(|l| !l.is_empty()) {
            Some(label) => Some(label.parse::<MediaType>()?),
            None => None,
        };
        Ok(self)
    }

    pub fn external_id(&self) -> Option<ExternalId> {
        self.catalog_id
            .map(ExternalId::tmdb)
            .or_else(|| self.secondary_id.map(ExternalId::douban))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MetaParser;

impl MetaParser {
    pub fn new() -> Self {
        Self
    }

    /// Applies, in order: values parsed from the title, the type override,
    /// the season override, the year override.
    ///
    /// A season always forces TV. An explicit movie override drops a season
    /// that only came from the title text.
    pub fn parse(
        &self,
        raw_title: Option<&str>,
        overrides: &QueryOverrides,
    ) -> Result<QueryDescriptor> {
        let raw = raw_title.map(str::trim).unwrap_or_default();
        let external_id = overrides.external_id();

        if raw.is_empty() && external_id.is_none() {
            return Err(AvailabilityError::Parse(
                "title is empty and no catalog id was supplied".into(),
            ));
        }

        let parsed = parse_title(raw);
        let mut descriptor =
            QueryDescriptor::new(parsed.name).with_media_type(parsed.media_type);
        if let Some(season) = parsed.season {
            descriptor.set_season(season);
        }
        descriptor.year = parsed.year;

        if let Some(media_type) = overrides.media_type.filter(|t| t.is_known()) {
            if media_type.is_movie() {
                descriptor.clear_season();
            }
            descriptor.set_media_type(media_type);
        }

        if let Some(season) = overrides.season {
            descriptor.set_season(season);
        }

        if let Some(year) = overrides.year {
            descriptor.year = Some(year);
        }

        descriptor.external_id = external_id;

        debug!(
            title = %descriptor.title,
            year = ?descriptor.year,
            media_type = %descriptor.media_type(),
            season = ?descriptor.season(),
            "parsed lookup query"
        );

        Ok(descriptor)
    }
}
