use std::fmt::{Display, Formatter};
use std::str::FromStr;

use crate::error::ModelError;

/// Kind of media a query or record refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum MediaType {
    /// Feature film
    Movie,
    /// Episodic series
    Tv,
    /// Not yet determined
    #[default]
    Unknown,
}

impl MediaType {
    pub fn is_tv(self) -> bool {
        matches!(self, MediaType::Tv)
    }

    pub fn is_movie(self) -> bool {
        matches!(self, MediaType::Movie)
    }

    pub fn is_known(self) -> bool {
        !matches!(self, MediaType::Unknown)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MediaType::Movie => "movie",
            MediaType::Tv => "tv",
            MediaType::Unknown => "unknown",
        }
    }
}

impl Display for MediaType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaType {
    type Err = ModelError;

    /// Accepts the canonical names plus the legacy display labels used by
    /// existing clients.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "movie" | "movies" | "电影" => Ok(MediaType::Movie),
            "tv" | "series" | "show" | "电视剧" => Ok(MediaType::Tv),
            "unknown" | "" | "未知" => Ok(MediaType::Unknown),
            other => Err(ModelError::UnknownMediaType(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_canonical_and_legacy_labels() {
        assert_eq!("movie".parse::<MediaType>(), Ok(MediaType::Movie));
        assert_eq!("TV".parse::<MediaType>(), Ok(MediaType::Tv));
        assert_eq!("电视剧".parse::<MediaType>(), Ok(MediaType::Tv));
        assert_eq!("电影".parse::<MediaType>(), Ok(MediaType::Movie));
        assert_eq!("未知".parse::<MediaType>(), Ok(MediaType::Unknown));
    }

    #[test]
    fn rejects_unrecognised_labels() {
        let err = "documentary".parse::<MediaType>().unwrap_err();
        assert_eq!(err, ModelError::UnknownMediaType("documentary".into()));
    }
}
