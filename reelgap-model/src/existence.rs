use std::collections::{BTreeMap, BTreeSet};

use crate::ids::{ItemId, MediaKey};
use crate::media_type::MediaType;

/// Where a positive existence answer came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ExistenceLocation {
    LocalDb,
    Server,
}

/// Episodes known to be present, grouped by season.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct SeasonPresence(BTreeMap<u16, BTreeSet<u16>>);

impl SeasonPresence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, season: u16, episode: u16) {
        self.0.entry(season).or_default().insert(episode);
    }

    /// Registers a season without episodes, for servers that list seasons
    /// before their episodes are scanned.
    pub fn insert_season(&mut self, season: u16) {
        self.0.entry(season).or_default();
    }

    pub fn contains_season(&self, season: u16) -> bool {
        self.0.contains_key(&season)
    }

    pub fn episodes(&self, season: u16) -> Option<&BTreeSet<u16>> {
        self.0.get(&season)
    }

    pub fn seasons(&self) -> impl Iterator<Item = u16> + '_ {
        self.0.keys().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_map(&self) -> &BTreeMap<u16, BTreeSet<u16>> {
        &self.0
    }
}

impl FromIterator<(u16, u16)> for SeasonPresence {
    fn from_iter<T: IntoIterator<Item = (u16, u16)>>(iter: T) -> Self {
        let mut presence = SeasonPresence::new();
        for (season, episode) in iter {
            presence.insert(season, episode);
        }
        presence
    }
}

impl From<BTreeMap<u16, BTreeSet<u16>>> for SeasonPresence {
    fn from(value: BTreeMap<u16, BTreeSet<u16>>) -> Self {
        Self(value)
    }
}

/// Positive answer to an existence check.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ExistenceRecord {
    /// Canonical key when the source knew it; servers matched by title alone
    /// may not report one.
    pub media_key: Option<MediaKey>,
    pub media_type: MediaType,
    pub location: ExistenceLocation,
    pub server: Option<String>,
    pub item_id: ItemId,
    pub seasons: SeasonPresence,
}

impl ExistenceRecord {
    pub fn local(item_id: ItemId, media_type: MediaType) -> Self {
        Self {
            media_key: None,
            media_type,
            location: ExistenceLocation::LocalDb,
            server: None,
            item_id,
            seasons: SeasonPresence::new(),
        }
    }

    pub fn on_server(
        server: impl Into<String>,
        item_id: ItemId,
        media_type: MediaType,
    ) -> Self {
        Self {
            media_key: None,
            media_type,
            location: ExistenceLocation::Server,
            server: Some(server.into()),
            item_id,
            seasons: SeasonPresence::new(),
        }
    }

    pub fn with_key(mut self, key: Option<MediaKey>) -> Self {
        self.media_key = key;
        self
    }

    pub fn with_seasons(mut self, seasons: SeasonPresence) -> Self {
        self.seasons = seasons;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presence_collects_pairs_by_season() {
        let presence: SeasonPresence =
            [(1, 2), (1, 1), (2, 5)].into_iter().collect();
        assert_eq!(presence.seasons().collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(
            presence.episodes(1).map(|e| e.iter().copied().collect::<Vec<_>>()),
            Some(vec![1, 2])
        );
        assert!(!presence.contains_season(3));
    }

    #[test]
    fn empty_season_is_still_listed() {
        let mut presence = SeasonPresence::new();
        presence.insert_season(4);
        assert!(presence.contains_season(4));
        assert_eq!(presence.episodes(4).map(|e| e.len()), Some(0));
    }
}
