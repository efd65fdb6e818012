use std::collections::BTreeMap;

use crate::ids::MediaKey;

/// One episode slot of a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EpisodeRef {
    pub season: u16,
    pub episode: u16,
}

/// Ordered (season, episode) list for a series as published by the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EpisodeManifest {
    entries: Vec<EpisodeRef>,
}

impl EpisodeManifest {
    pub fn new(mut entries: Vec<EpisodeRef>) -> Self {
        entries.sort_unstable();
        entries.dedup();
        Self { entries }
    }

    /// Builds a manifest from per-season episode counts, numbering episodes
    /// from 1.
    pub fn from_season_counts(
        counts: impl IntoIterator<Item = (u16, u16)>,
    ) -> Self {
        let entries = counts
            .into_iter()
            .flat_map(|(season, count)| {
                (1..=count).map(move |episode| EpisodeRef { season, episode })
            })
            .collect();
        Self::new(entries)
    }

    pub fn entries(&self) -> &[EpisodeRef] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn by_season(&self) -> BTreeMap<u16, Vec<u16>> {
        let mut seasons: BTreeMap<u16, Vec<u16>> = BTreeMap::new();
        for entry in &self.entries {
            seasons.entry(entry.season).or_default().push(entry.episode);
        }
        seasons
    }
}

/// Missing episodes of a single season.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SeasonGap {
    pub season: u16,
    /// Missing episode numbers, ascending.
    pub episodes: Vec<u16>,
    pub total_episode: u16,
    pub start_episode: u16,
}

impl SeasonGap {
    pub fn is_whole_season(&self) -> bool {
        self.episodes.len() == usize::from(self.total_episode)
    }
}

/// Per-season gaps for one canonical media entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingSet {
    pub media_key: MediaKey,
    seasons: BTreeMap<u16, SeasonGap>,
}

impl MissingSet {
    pub fn new(media_key: MediaKey) -> Self {
        Self {
            media_key,
            seasons: BTreeMap::new(),
        }
    }

    /// Records a gap. Empty gaps are dropped so fully present seasons never
    /// show up.
    pub fn push(&mut self, gap: SeasonGap) {
        if !gap.episodes.is_empty() {
            self.seasons.insert(gap.season, gap);
        }
    }

    pub fn get(&self, season: u16) -> Option<&SeasonGap> {
        self.seasons.get(&season)
    }

    pub fn gaps(&self) -> impl Iterator<Item = &SeasonGap> {
        self.seasons.values()
    }

    pub fn is_empty(&self) -> bool {
        self.seasons.is_empty()
    }

    pub fn len(&self) -> usize {
        self.seasons.len()
    }
}

/// Outcome of a gap query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Availability {
    /// Everything the catalog lists is present.
    Present,
    /// Nothing is present. Series carry the full per-season listing; movies
    /// carry nothing.
    Absent(Option<MissingSet>),
    /// Some episodes of a series are present.
    PartiallyPresent(MissingSet),
}

impl Availability {
    pub fn is_present(&self) -> bool {
        matches!(self, Availability::Present)
    }

    pub fn missing(&self) -> Option<&MissingSet> {
        match self {
            Availability::Present => None,
            Availability::Absent(set) => set.as_ref(),
            Availability::PartiallyPresent(set) => Some(set),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::CatalogId;

    #[test]
    fn manifest_from_counts_groups_by_season() {
        let manifest = EpisodeManifest::from_season_counts([(2, 2), (1, 3)]);
        let seasons = manifest.by_season();
        assert_eq!(seasons.get(&1), Some(&vec![1, 2, 3]));
        assert_eq!(seasons.get(&2), Some(&vec![1, 2]));
        assert_eq!(manifest.entries().first().map(|e| e.season), Some(1));
    }

    #[test]
    fn empty_gap_is_not_recorded() {
        let mut set = MissingSet::new(MediaKey::Catalog(CatalogId(1)));
        set.push(SeasonGap {
            season: 1,
            episodes: vec![],
            total_episode: 10,
            start_episode: 1,
        });
        assert!(set.is_empty());
    }
}
