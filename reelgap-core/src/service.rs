//! Request-level entry points: existence checks, gap queries, play links.

use std::sync::Arc;

use reelgap_model::api::{ExistsParams, ExistsResponse, MediaInfoRequest};
use reelgap_model::{Availability, CatalogId, ItemId, SecondaryId};
use tracing::{debug, info, instrument};

use crate::catalog::Catalog;
use crate::chain::{ExistenceChain, ExistenceQuery};
use crate::error::{AvailabilityError, Result};
use crate::gap::GapAnalyzer;
use crate::identifier::MediaIdentifier;
use crate::meta::{MetaParser, QueryOverrides};
use crate::servers::ServerExistenceProbe;
use crate::store::ExistenceStore;

#[derive(Debug, Clone)]
pub struct AvailabilityService {
    parser: MetaParser,
    identifier: MediaIdentifier,
    chain: ExistenceChain,
    gaps: GapAnalyzer,
    probe: Arc<ServerExistenceProbe>,
}

impl AvailabilityService {
    /// Wires the standard pipeline: local index first, then the media
    /// servers of `probe`, whose first server is the default play target.
    pub fn new(
        catalog: Arc<dyn Catalog>,
        store: Arc<dyn ExistenceStore>,
        probe: Arc<ServerExistenceProbe>,
    ) -> Self {
        Self {
            parser: MetaParser::new(),
            identifier: MediaIdentifier::new(catalog.clone()),
            chain: ExistenceChain::standard(store, probe.clone()),
            gaps: GapAnalyzer::new(catalog),
            probe,
        }
    }

    /// Replaces the existence chain, keeping the rest of the pipeline.
    pub fn with_chain(mut self, chain: ExistenceChain) -> Self {
        self.chain = chain;
        self
    }

    /// Answers whether the media exists locally or on a media server.
    ///
    /// The local index is consulted with the parsed query alone. Only on a
    /// miss is the media identified and the chain run again with its
    /// canonical identity, which lets the media servers answer.
    #[instrument(skip(self), level = "debug")]
    pub async fn exists(&self, params: &ExistsParams) -> Result<ExistsResponse> {
        let overrides = QueryOverrides {
            year: params.year,
            season: params.season,
            catalog_id: params.tmdbid.map(CatalogId),
            ..QueryOverrides::default()
        }
        .with_media_type_label(params.mtype.as_deref())?;

        let descriptor = self.parser.parse(params.title.as_deref(), &overrides)?;

        let local = self
            .chain
            .check(ExistenceQuery { descriptor: &descriptor, media: None })
            .await?;
        if local.is_some() {
            return Ok(local.into());
        }

        let Some(media) = self
            .identifier
            .resolve(&descriptor, overrides.media_type, overrides.catalog_id, None)
            .await
        else {
            debug!(title = %descriptor.title, "not indexed and not identified");
            return Ok(ExistsResponse::not_found());
        };

        let record = self
            .chain
            .check(ExistenceQuery { descriptor: &descriptor, media: Some(&media) })
            .await?;
        Ok(record.into())
    }

    /// Computes what is missing for the requested media.
    #[instrument(skip(self), level = "debug")]
    pub async fn missing(&self, request: &MediaInfoRequest) -> Result<Availability> {
        let overrides = QueryOverrides {
            year: request.year,
            season: request.season,
            catalog_id: request.tmdb_id.map(CatalogId),
            secondary_id: request.douban_id.map(SecondaryId),
            ..QueryOverrides::default()
        }
        .with_media_type_label(request.media_type.as_deref())?;

        let descriptor = self.parser.parse(request.title.as_deref(), &overrides)?;

        let media = self
            .identifier
            .resolve(
                &descriptor,
                overrides.media_type,
                overrides.catalog_id,
                overrides.secondary_id,
            )
            .await
            .ok_or(AvailabilityError::UnresolvedMedia)?;

        let existing = self
            .chain
            .check(ExistenceQuery { descriptor: &descriptor, media: Some(&media) })
            .await?;

        let availability = self
            .gaps
            .compute_missing(Some(&media), existing.as_ref())
            .await?;

        info!(
            key = %media.key(),
            media_type = %media.media_type,
            season = ?media.season,
            present = availability.is_present(),
            "availability computed"
        );
        Ok(availability)
    }

    /// Play link on the default media server. `None` when no media server
    /// is configured.
    pub fn play_url(&self, item_id: &ItemId) -> Option<String> {
        self.probe.play_url(None, item_id)
    }

    /// Play link on a named media server.
    pub fn play_url_on(&self, server: &str, item_id: &ItemId) -> Option<String> {
        self.probe.play_url(Some(server), item_id)
    }
}
