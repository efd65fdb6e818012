//! Resolves parsed queries into canonical catalog identities.

use std::fmt;
use std::sync::Arc;

use reelgap_model::{
    CanonicalMedia, CatalogId, ExternalId, MediaType, QueryDescriptor,
    SecondaryId,
};
use tracing::{debug, instrument, warn};

use crate::catalog::Catalog;

#[derive(Clone)]
pub struct MediaIdentifier {
    catalog: Arc<dyn Catalog>,
}

impl fmt::Debug for MediaIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaIdentifier").finish_non_exhaustive()
    }
}

impl MediaIdentifier {
    pub fn new(catalog: Arc<dyn Catalog>) -> Self {
        Self { catalog }
    }

    /// Resolves a descriptor to a canonical entry.
    ///
    /// Ids (arguments first, then the descriptor's external id) are looked
    /// up directly; the catalog id beats the secondary id. Without ids, or
    /// when the catalog cannot resolve the secondary id, the title is
    /// matched against catalog search results. `None` means the
    /// media could not be identified, including when the catalog failed.
    #[instrument(skip(self, descriptor), fields(title = %descriptor.title), level = "debug")]
    pub async fn resolve(
        &self,
        descriptor: &QueryDescriptor,
        media_type: Option<MediaType>,
        catalog_id: Option<CatalogId>,
        secondary_id: Option<SecondaryId>,
    ) -> Option<CanonicalMedia> {
        let hint = if descriptor.season().is_some() {
            MediaType::Tv
        } else {
            media_type
                .filter(|t| t.is_known())
                .unwrap_or(descriptor.media_type())
        };

        let from_descriptor = descriptor.external_id;
        let catalog_id = catalog_id
            .or_else(|| from_descriptor.and_then(|id| id.as_catalog_id()));
        let secondary_id = secondary_id
            .or_else(|| from_descriptor.and_then(|id| id.as_secondary_id()));

        let resolved = if let Some(id) = catalog_id {
            self.by_id(ExternalId::tmdb(id), hint).await
        } else {
            let by_secondary = match secondary_id {
                Some(id) => self.by_id(ExternalId::douban(id), hint).await,
                None => None,
            };
            match by_secondary {
                Some(media) => Some(media),
                None if descriptor.has_title() => self.by_title(descriptor, hint).await,
                None => None,
            }
        };

        let Some(media) = resolved else {
            debug!("media not identified");
            return None;
        };

        let season = if media.media_type.is_tv() {
            descriptor.season()
        } else {
            None
        };
        let media = media.with_season(season).with_secondary_id(secondary_id);
        debug!(key = %media.key(), media_type = %media.media_type, "media identified");
        Some(media)
    }

    async fn by_id(
        &self,
        id: ExternalId,
        hint: MediaType,
    ) -> Option<CanonicalMedia> {
        match self.catalog.resolve_by_id(id, hint).await {
            Ok(found) => found,
            Err(e) => {
                warn!(%id, error = %e, "catalog lookup by id failed");
                None
            }
        }
    }

    async fn by_title(
        &self,
        descriptor: &QueryDescriptor,
        hint: MediaType,
    ) -> Option<CanonicalMedia> {
        let candidates = match self
            .catalog
            .search(&descriptor.title, descriptor.year, hint)
            .await
        {
            Ok(candidates) => candidates,
            Err(e) => {
                warn!(title = %descriptor.title, error = %e, "catalog search failed");
                return None;
            }
        };

        best_match(&descriptor.title, descriptor.year, hint, candidates)
    }
}

/// Picks the candidate whose title (or original title) equals the query
/// after normalization. Year agreement is required when both sides know the
/// year; exact-year hits rank before year-less ones, then catalog order.
pub fn best_match(
    title: &str,
    year: Option<u16>,
    media_type: MediaType,
    candidates: Vec<CanonicalMedia>,
) -> Option<CanonicalMedia> {
    let wanted = normalize_title(title);
    if wanted.is_empty() {
        return None;
    }

    candidates
        .into_iter()
        .enumerate()
        .filter(|(_, c)| !media_type.is_known() || c.media_type == media_type)
        .filter(|(_, c)| c.titles().any(|t| normalize_title(t) == wanted))
        .filter(|(_, c)| match (year, c.year) {
            (Some(wanted), Some(found)) => wanted == found,
            _ => true,
        })
        .min_by_key(|(index, c)| (year.is_some() && c.year != year, *index))
        .map(|(_, c)| c)
}

/// Lowercases and keeps only letters and digits, so `Show: X!` and
/// `show x` compare equal.
pub fn normalize_title(title: &str) -> String {
    title
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}
