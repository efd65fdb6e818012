use crate::ids::ExternalId;
use crate::media_type::MediaType;

/// Normalized form of an incoming lookup. Built by the meta parser, consumed
/// by identification and the local index.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QueryDescriptor {
    pub title: String,
    pub year: Option<u16>,
    media_type: MediaType,
    season: Option<u16>,
    pub external_id: Option<ExternalId>,
}

impl QueryDescriptor {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn media_type(&self) -> MediaType {
        self.media_type
    }

    pub fn season(&self) -> Option<u16> {
        self.season
    }

    /// Sets the type. Ignored while a season is present; clear the season
    /// first to downgrade a series query.
    pub fn set_media_type(&mut self, media_type: MediaType) {
        if self.season.is_none() {
            self.media_type = media_type;
        }
    }

    /// Sets the season and forces the type to TV.
    pub fn set_season(&mut self, season: u16) {
        self.season = Some(season);
        self.media_type = MediaType::Tv;
    }

    pub fn clear_season(&mut self) {
        self.season = None;
    }

    pub fn with_year(mut self, year: u16) -> Self {
        self.year = Some(year);
        self
    }

    pub fn with_media_type(mut self, media_type: MediaType) -> Self {
        self.set_media_type(media_type);
        self
    }

    pub fn with_season(mut self, season: u16) -> Self {
        self.set_season(season);
        self
    }

    pub fn with_external_id(mut self, id: ExternalId) -> Self {
        self.external_id = Some(id);
        self
    }

    pub fn has_title(&self) -> bool {
        !self.title.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn season_forces_tv_over_prior_type() {
        let query = QueryDescriptor::new("Show X")
            .with_media_type(MediaType::Movie)
            .with_season(2);
        assert_eq!(query.media_type(), MediaType::Tv);
        assert_eq!(query.season(), Some(2));
    }

    #[test]
    fn type_change_is_ignored_while_season_set() {
        let mut query = QueryDescriptor::new("Show X").with_season(1);
        query.set_media_type(MediaType::Movie);
        assert_eq!(query.media_type(), MediaType::Tv);

        query.clear_season();
        query.set_media_type(MediaType::Movie);
        assert_eq!(query.media_type(), MediaType::Movie);
    }
}
