use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::fmt;
use tracing::debug;
use url::Url;

use reelgap_model::{
    CanonicalMedia, CatalogId, ExistenceRecord, ItemId, MediaKey, MediaType,
    SeasonPresence,
};

use super::{MediaServerClient, ProbeError};
use crate::identifier::normalize_title;

/// Emby and Jellyfin share the item API; they differ in path prefix and
/// the web client route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerFlavor {
    Emby,
    Jellyfin,
}

impl ServerFlavor {
    fn api_prefix(self) -> &'static str {
        match self {
            ServerFlavor::Emby => "emby/",
            ServerFlavor::Jellyfin => "",
        }
    }

    fn item_route(self) -> &'static str {
        match self {
            ServerFlavor::Emby => "web/index.html#!/item?id={id}&context=home",
            ServerFlavor::Jellyfin => "web/index.html#!/details?id={id}",
        }
    }
}

#[derive(Clone)]
pub struct EmbyClient {
    name: String,
    flavor: ServerFlavor,
    host: Url,
    play_host: Url,
    api_key: String,
    client: Client,
}

impl fmt::Debug for EmbyClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmbyClient")
            .field("name", &self.name)
            .field("flavor", &self.flavor)
            .field("host", &self.host.as_str())
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ItemsResponse {
    #[serde(default)]
    items: Vec<ServerItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ServerItem {
    id: String,
    #[serde(default)]
    name: String,
    original_title: Option<String>,
    production_year: Option<u16>,
    #[serde(default)]
    provider_ids: HashMap<String, String>,
}

impl ServerItem {
    fn tmdb_id(&self) -> Option<u64> {
        self.provider_ids
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case("tmdb"))
            .and_then(|(_, v)| v.trim().parse().ok())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct EpisodeItem {
    parent_index_number: Option<u16>,
    index_number: Option<u16>,
}

impl EmbyClient {
    /// `play_host` is the externally reachable address used in play links;
    /// it defaults to `host`. Both must end with `/`.
    pub fn new(
        name: impl Into<String>,
        flavor: ServerFlavor,
        host: Url,
        play_host: Option<Url>,
        api_key: impl Into<String>,
        client: Client,
    ) -> Self {
        Self {
            name: name.into(),
            flavor,
            play_host: play_host.unwrap_or_else(|| host.clone()),
            host,
            api_key: api_key.into(),
            client,
        }
    }

    pub fn flavor(&self) -> ServerFlavor {
        self.flavor
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, ProbeError> {
        let url = self
            .host
            .join(&format!("{}{}", self.flavor.api_prefix(), path))
            .map_err(|e| ProbeError::Decode(format!("invalid path {path}: {e}")))?;
        debug!(server = %self.name, %url, "media server request");

        let response = self
            .client
            .get(url)
            .header("X-Emby-Token", &self.api_key)
            .query(params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProbeError::Status(status.as_u16()));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| ProbeError::Decode(e.to_string()))
    }

    async fn find_item(
        &self,
        media: &CanonicalMedia,
    ) -> Result<Option<ServerItem>, ProbeError> {
        let item_type = match media.media_type {
            MediaType::Movie => "Movie",
            MediaType::Tv => "Series",
            MediaType::Unknown => "Movie,Series",
        };

        let response: ItemsResponse = self
            .get_json(
                "Items",
                &[
                    ("IncludeItemTypes", item_type.to_string()),
                    ("Recursive", "true".to_string()),
                    ("SearchTerm", media.title.clone()),
                    ("Fields", "ProviderIds,ProductionYear,OriginalTitle".to_string()),
                    ("Limit", "20".to_string()),
                ],
            )
            .await?;

        Ok(pick_item(media, response.items))
    }

    async fn season_presence(&self, item_id: &str) -> Result<SeasonPresence, ProbeError> {
        let response: EpisodesResponse = self
            .get_json(
                &format!("Shows/{item_id}/Episodes"),
                &[("Fields", "ParentIndexNumber,IndexNumber".to_string())],
            )
            .await?;

        Ok(response
            .items
            .into_iter()
            .filter_map(|e| Some((e.parent_index_number?, e.index_number?)))
            .collect())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct EpisodesResponse {
    #[serde(default)]
    items: Vec<EpisodeItem>,
}

/// Provider id match first, then normalized title with agreeing year.
fn pick_item(media: &CanonicalMedia, items: Vec<ServerItem>) -> Option<ServerItem> {
    if let Some(id) = media.catalog_id()
        && let Some(position) = items.iter().position(|i| i.tmdb_id() == Some(id.get()))
    {
        return items.into_iter().nth(position);
    }

    let wanted: Vec<String> = media.titles().map(normalize_title).collect();
    items.into_iter().find(|item| {
        let title_hit = std::iter::once(item.name.as_str())
            .chain(item.original_title.as_deref())
            .map(normalize_title)
            .any(|t| !t.is_empty() && wanted.contains(&t));
        let year_ok = match (media.year, item.production_year) {
            (Some(wanted), Some(found)) => wanted == found,
            _ => true,
        };
        title_hit && year_ok
    })
}

#[async_trait]
impl MediaServerClient for EmbyClient {
    fn name(&self) -> &str {
        &self.name
    }

    async fn probe(
        &self,
        media: &CanonicalMedia,
    ) -> Result<Option<ExistenceRecord>, ProbeError> {
        let Some(item) = self.find_item(media).await? else {
            return Ok(None);
        };

        let key = item
            .tmdb_id()
            .map(|id| MediaKey::Catalog(CatalogId(id)))
            .unwrap_or_else(|| media.key());
        let mut record = ExistenceRecord::on_server(
            self.name.clone(),
            ItemId::new(item.id.clone()),
            media.media_type,
        )
        .with_key(Some(key));

        if media.media_type.is_tv() {
            let seasons = self.season_presence(&item.id).await?;
            if let Some(season) = media.season
                && !seasons.contains_season(season)
            {
                debug!(server = %self.name, season, "series found but season missing");
                return Ok(None);
            }
            record = record.with_seasons(seasons);
        }

        Ok(Some(record))
    }

    fn play_url(&self, item_id: &ItemId) -> String {
        let route = self.flavor.item_route().replace("{id}", item_id.as_str());
        format!("{}{}", self.play_host, route)
    }
}
