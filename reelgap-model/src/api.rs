//! Request and response payloads of the `mediaserver` HTTP endpoints.

use serde::{Deserialize, Deserializer, Serialize};

use crate::existence::{ExistenceLocation, ExistenceRecord};
use crate::gaps::{Availability, SeasonGap};
use crate::ids::ItemId;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            status: "success".to_string(),
            data: Some(data),
            error: None,
            message: None,
        }
    }

    pub fn error(error: String) -> Self {
        Self {
            status: "error".to_string(),
            data: None,
            error: Some(error),
            message: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// Query string of `GET /mediaserver/exists`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExistsParams {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub year: Option<u16>,
    #[serde(default)]
    pub mtype: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub tmdbid: Option<u64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub season: Option<u16>,
}

/// Body of `POST /mediaserver/notexists`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MediaInfoRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub year: Option<u16>,
    #[serde(default, rename = "type")]
    pub media_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub season: Option<u16>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub tmdb_id: Option<u64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub douban_id: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExistingItem {
    pub id: ItemId,
    pub location: ExistenceLocation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExistsResponse {
    pub found: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item: Option<ExistingItem>,
}

impl ExistsResponse {
    pub fn not_found() -> Self {
        Self {
            found: false,
            item: None,
        }
    }
}

impl From<Option<ExistenceRecord>> for ExistsResponse {
    fn from(record: Option<ExistenceRecord>) -> Self {
        match record {
            Some(record) => Self {
                found: true,
                item: Some(ExistingItem {
                    id: record.item_id,
                    location: record.location,
                    server: record.server,
                }),
            },
            None => Self::not_found(),
        }
    }
}

/// Wire shape of a missing-content entry. A movie that is absent is
/// reported as a single entry with no season and no episodes.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NotExistEntry {
    pub season: Option<u16>,
    pub episodes: Vec<u16>,
    pub total_episode: u16,
    pub start_episode: u16,
}

impl From<&SeasonGap> for NotExistEntry {
    fn from(gap: &SeasonGap) -> Self {
        Self {
            season: Some(gap.season),
            episodes: gap.episodes.clone(),
            total_episode: gap.total_episode,
            start_episode: gap.start_episode,
        }
    }
}

impl From<&Availability> for Vec<NotExistEntry> {
    fn from(availability: &Availability) -> Self {
        match availability {
            Availability::Present => Vec::new(),
            Availability::Absent(None) => vec![NotExistEntry::default()],
            Availability::Absent(Some(set))
            | Availability::PartiallyPresent(set) => {
                set.gaps().map(NotExistEntry::from).collect()
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayUrlResponse {
    pub url: String,
}

/// Accepts numbers, numeric strings and empty strings (as absent).
fn lenient_number<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: std::str::FromStr + TryFrom<u64>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u64),
        Text(String),
    }

    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Raw::Number(n)) => T::try_from(n).map(Some).map_err(|_| {
            serde::de::Error::custom(format!("number {n} out of range"))
        }),
        Some(Raw::Text(text)) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                return Ok(None);
            }
            trimmed.parse::<T>().map(Some).map_err(|_| {
                serde::de::Error::custom(format!("invalid number '{trimmed}'"))
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gaps::MissingSet;
    use crate::ids::{CatalogId, MediaKey};

    #[test]
    fn movie_absent_maps_to_single_sentinel() {
        let entries: Vec<NotExistEntry> = (&Availability::Absent(None)).into();
        assert_eq!(entries, vec![NotExistEntry::default()]);
        let present: Vec<NotExistEntry> = (&Availability::Present).into();
        assert!(present.is_empty());
    }

    #[test]
    fn series_gaps_map_to_season_entries() {
        let mut set = MissingSet::new(MediaKey::Catalog(CatalogId(5)));
        set.push(SeasonGap {
            season: 1,
            episodes: vec![4, 5],
            total_episode: 5,
            start_episode: 1,
        });
        let entries: Vec<NotExistEntry> =
            (&Availability::PartiallyPresent(set)).into();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].season, Some(1));
        assert_eq!(entries[0].episodes, vec![4, 5]);
    }
}
