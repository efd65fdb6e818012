//! Missing-episode computation for resolved media.

use std::fmt;
use std::sync::Arc;

use reelgap_model::{
    Availability, CanonicalMedia, EpisodeManifest, ExistenceRecord, MissingSet,
    SeasonGap, SeasonPresence,
};
use tracing::{debug, instrument, warn};

use crate::catalog::Catalog;
use crate::error::{AvailabilityError, Result};

#[derive(Clone)]
pub struct GapAnalyzer {
    catalog: Arc<dyn Catalog>,
}

impl fmt::Debug for GapAnalyzer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GapAnalyzer").finish_non_exhaustive()
    }
}

impl GapAnalyzer {
    pub fn new(catalog: Arc<dyn Catalog>) -> Self {
        Self { catalog }
    }

    /// Diffs the catalog's episode listing against what exists.
    ///
    /// Movies are `Present` when any record exists and `Absent(None)`
    /// otherwise. Series are analysed for the requested season only, or for
    /// every regular season when none was requested.
    #[instrument(skip_all, level = "debug")]
    pub async fn compute_missing(
        &self,
        media: Option<&CanonicalMedia>,
        existing: Option<&ExistenceRecord>,
    ) -> Result<Availability> {
        let media = media.ok_or(AvailabilityError::UnresolvedMedia)?;

        if !media.media_type.is_tv() {
            return Ok(match existing {
                Some(_) => Availability::Present,
                None => Availability::Absent(None),
            });
        }

        let manifest = self
            .catalog
            .episode_manifest(media.key().to_external())
            .await
            .map_err(|e| {
                warn!(key = %media.key(), error = %e, "episode manifest unavailable");
                AvailabilityError::CatalogUnavailable(e)
            })?;

        let empty = SeasonPresence::new();
        let present = existing.map(|r| &r.seasons).unwrap_or(&empty);
        let availability = diff_manifest(media, &manifest, present);
        debug!(
            key = %media.key(),
            present = availability.is_present(),
            seasons_missing = availability.missing().map(MissingSet::len).unwrap_or(0),
            "gap analysis done"
        );
        Ok(availability)
    }
}

/// Per-season set difference between the manifest and the present episodes.
pub fn diff_manifest(
    media: &CanonicalMedia,
    manifest: &EpisodeManifest,
    present: &SeasonPresence,
) -> Availability {
    let mut missing = MissingSet::new(media.key());
    let mut anything_present = false;

    for (season, episodes) in manifest.by_season() {
        let wanted = match media.season {
            Some(requested) => season == requested,
            None => season != 0,
        };
        if !wanted || episodes.is_empty() {
            continue;
        }

        let have = present.episodes(season);
        let absent: Vec<u16> = episodes
            .iter()
            .copied()
            .filter(|e| !have.is_some_and(|h| h.contains(e)))
            .collect();

        if absent.len() < episodes.len() {
            anything_present = true;
        }

        missing.push(SeasonGap {
            season,
            episodes: absent,
            total_episode: u16::try_from(episodes.len()).unwrap_or(u16::MAX),
            start_episode: episodes[0],
        });
    }

    if missing.is_empty() {
        Availability::Present
    } else if anything_present {
        Availability::PartiallyPresent(missing)
    } else {
        Availability::Absent(Some(missing))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ProviderError;
    use crate::test_support::FakeCatalog;
    use reelgap_model::{CatalogId, EpisodeRef, ExternalId, ItemId, MediaType};

    fn show_x(season: Option<u16>) -> CanonicalMedia {
        CanonicalMedia::series(CatalogId(77), "Show X").with_season(season)
    }

    fn local(pairs: &[(u16, u16)]) -> ExistenceRecord {
        ExistenceRecord::local(ItemId::from("s-1"), MediaType::Tv)
            .with_seasons(pairs.iter().copied().collect())
    }

    fn analyzer(manifest: EpisodeManifest) -> GapAnalyzer {
        GapAnalyzer::new(Arc::new(
            FakeCatalog::with_media(vec![show_x(None)])
                .with_manifest(ExternalId::tmdb(CatalogId(77)), manifest),
        ))
    }

    #[tokio::test]
    async fn partially_present_season_lists_the_rest() {
        let analyzer = analyzer(EpisodeManifest::from_season_counts([(1, 10)]));
        let media = show_x(Some(1));
        let existing = local(&[(1, 1), (1, 2), (1, 3)]);

        let availability = analyzer
            .compute_missing(Some(&media), Some(&existing))
            .await
            .expect("analysis");

        let Availability::PartiallyPresent(set) = availability else {
            panic!("expected partial availability");
        };
        let gap = set.get(1).expect("season 1 gap");
        assert_eq!(gap.episodes, (4..=10).collect::<Vec<u16>>());
        assert_eq!(gap.total_episode, 10);
        assert_eq!(gap.start_episode, 1);
        assert_eq!(set.len(), 1);
    }

    #[tokio::test]
    async fn fully_present_seasons_yield_no_entry() {
        let analyzer = analyzer(EpisodeManifest::from_season_counts([(1, 2), (2, 2)]));
        let media = show_x(None);
        let existing = local(&[(1, 1), (1, 2), (2, 1)]);

        let availability = analyzer
            .compute_missing(Some(&media), Some(&existing))
            .await
            .expect("analysis");
        let set = availability.missing().expect("gaps");
        assert!(set.get(1).is_none());
        assert_eq!(set.get(2).map(|g| g.episodes.clone()), Some(vec![2]));
    }

    #[tokio::test]
    async fn nothing_local_lists_every_regular_season() {
        let analyzer = analyzer(EpisodeManifest::from_season_counts([(0, 3), (1, 2), (2, 1)]));
        let availability = analyzer
            .compute_missing(Some(&show_x(None)), None)
            .await
            .expect("analysis");

        let Availability::Absent(Some(set)) = availability else {
            panic!("expected absent series");
        };
        assert!(set.get(0).is_none());
        assert!(set.gaps().all(SeasonGap::is_whole_season));
        assert_eq!(set.len(), 2);
    }

    #[tokio::test]
    async fn everything_present_is_present() {
        let analyzer = analyzer(EpisodeManifest::from_season_counts([(1, 2)]));
        let availability = analyzer
            .compute_missing(Some(&show_x(None)), Some(&local(&[(1, 1), (1, 2)])))
            .await
            .expect("analysis");
        assert_eq!(availability, Availability::Present);
    }

    #[tokio::test]
    async fn movies_are_present_or_absent_without_gaps() {
        let analyzer = GapAnalyzer::new(Arc::new(FakeCatalog::default()));
        let movie = CanonicalMedia::movie(CatalogId(123), "Movie Y");
        let record = ExistenceRecord::local(ItemId::from("m-1"), MediaType::Movie);

        assert_eq!(
            analyzer.compute_missing(Some(&movie), None).await.expect("analysis"),
            Availability::Absent(None)
        );
        assert_eq!(
            analyzer
                .compute_missing(Some(&movie), Some(&record))
                .await
                .expect("analysis"),
            Availability::Present
        );
    }

    #[tokio::test]
    async fn unresolved_media_is_an_error() {
        let analyzer = GapAnalyzer::new(Arc::new(FakeCatalog::default()));
        let err = analyzer.compute_missing(None, None).await.unwrap_err();
        assert!(matches!(err, AvailabilityError::UnresolvedMedia));
    }

    #[tokio::test]
    async fn manifest_failure_is_catalog_unavailable() {
        let analyzer = GapAnalyzer::new(Arc::new(FakeCatalog::failing()));
        let err = analyzer
            .compute_missing(Some(&show_x(Some(1))), None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AvailabilityError::CatalogUnavailable(ProviderError::ApiError(_))
        ));
    }

    #[test]
    fn start_episode_follows_the_manifest() {
        let manifest = EpisodeManifest::new(vec![
            EpisodeRef { season: 3, episode: 13 },
            EpisodeRef { season: 3, episode: 14 },
            EpisodeRef { season: 3, episode: 15 },
        ]);
        let availability = diff_manifest(
            &show_x(Some(3)),
            &manifest,
            &[(3, 13)].into_iter().collect(),
        );
        let gap = availability.missing().and_then(|s| s.get(3)).cloned().expect("gap");
        assert_eq!(gap.start_episode, 13);
        assert_eq!(gap.total_episode, 3);
        assert_eq!(gap.episodes, vec![14, 15]);
    }
}
