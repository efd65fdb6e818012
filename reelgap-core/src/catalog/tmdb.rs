use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::fmt;
use tracing::{debug, info};
use url::Url;

use reelgap_model::{
    CanonicalMedia, CatalogId, CatalogKind, EpisodeManifest, ExternalId,
    MediaType,
};

use super::{Catalog, ProviderError};

/// TMDB v3 catalog over plain REST calls.
#[derive(Clone)]
pub struct TmdbCatalog {
    api_key: String,
    base_url: Url,
    language: String,
    client: Client,
}

impl fmt::Debug for TmdbCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TmdbCatalog")
            .field("base_url", &self.base_url.as_str())
            .field("language", &self.language)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Deserialize)]
struct TmdbSearchResponse {
    #[serde(default)]
    results: Vec<TmdbSearchResult>,
}

#[derive(Debug, Deserialize)]
struct TmdbSearchResult {
    id: u64,
    title: Option<String>,
    name: Option<String>, // TV shows use "name" instead of "title"
    original_title: Option<String>,
    original_name: Option<String>,
    release_date: Option<String>,
    first_air_date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TmdbMovieDetails {
    id: u64,
    title: String,
    original_title: Option<String>,
    release_date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TmdbTvDetails {
    id: u64,
    name: String,
    original_name: Option<String>,
    first_air_date: Option<String>,
    #[serde(default)]
    seasons: Vec<TmdbSeasonSummary>,
}

#[derive(Debug, Deserialize)]
struct TmdbSeasonSummary {
    season_number: u16,
    episode_count: Option<u16>,
}

impl TmdbCatalog {
    pub fn new(
        api_key: impl Into<String>,
        base_url: Url,
        language: impl Into<String>,
        client: Client,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            base_url,
            language: language.into(),
            client,
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        extra: &[(&str, String)],
    ) -> Result<Option<T>, ProviderError> {
        let url = self.base_url.join(path).map_err(|e| {
            ProviderError::ApiError(format!("invalid TMDB path {path}: {e}"))
        })?;
        debug!("TMDB request URL: {}", url);

        let mut params: Vec<(&str, String)> = vec![
            ("api_key", self.api_key.clone()),
            ("language", self.language.clone()),
        ];
        params.extend(extra.iter().cloned());

        let response = self.client.get(url).query(&params).send().await?;

        match response.status() {
            StatusCode::NOT_FOUND => return Ok(None),
            StatusCode::UNAUTHORIZED => return Err(ProviderError::InvalidApiKey),
            StatusCode::TOO_MANY_REQUESTS => {
                return Err(ProviderError::RateLimited);
            }
            status if !status.is_success() => {
                return Err(ProviderError::ApiError(format!(
                    "TMDB API returned status: {status}"
                )));
            }
            _ => {}
        }

        response
            .json::<T>()
            .await
            .map(Some)
            .map_err(|e| ProviderError::ParseError(e.to_string()))
    }

    async fn movie(
        &self,
        id: CatalogId,
    ) -> Result<Option<CanonicalMedia>, ProviderError> {
        let details: Option<TmdbMovieDetails> =
            self.get_json(&format!("movie/{id}"), &[]).await?;
        Ok(details.map(|d| {
            CanonicalMedia::movie(CatalogId(d.id), d.title)
                .with_original_title(d.original_title)
                .with_year(parse_year(d.release_date.as_deref()))
        }))
    }

    async fn tv_details(
        &self,
        id: CatalogId,
    ) -> Result<Option<TmdbTvDetails>, ProviderError> {
        self.get_json(&format!("tv/{id}"), &[]).await
    }

    async fn search_kind(
        &self,
        title: &str,
        year: Option<u16>,
        media_type: MediaType,
    ) -> Result<Vec<CanonicalMedia>, ProviderError> {
        let (endpoint, year_param) = if media_type.is_tv() {
            ("search/tv", "first_air_date_year")
        } else {
            ("search/movie", "year")
        };

        let mut params = vec![("query", title.to_string())];
        if let Some(year) = year {
            params.push((year_param, year.to_string()));
        }

        let response: Option<TmdbSearchResponse> =
            self.get_json(endpoint, &params).await?;
        let results = response.map(|r| r.results).unwrap_or_default();

        info!(
            media_type = %media_type,
            results = results.len(),
            "TMDB search returned results"
        );

        Ok(results
            .into_iter()
            .filter_map(|r| search_result_to_media(r, media_type))
            .collect())
    }
}

fn search_result_to_media(
    result: TmdbSearchResult,
    media_type: MediaType,
) -> Option<CanonicalMedia> {
    let id = CatalogId(result.id);
    let media = if media_type.is_tv() {
        CanonicalMedia::series(id, result.name?)
            .with_original_title(result.original_name)
            .with_year(parse_year(result.first_air_date.as_deref()))
    } else {
        CanonicalMedia::movie(id, result.title?)
            .with_original_title(result.original_title)
            .with_year(parse_year(result.release_date.as_deref()))
    };
    Some(media)
}

fn tv_to_media(details: &TmdbTvDetails) -> CanonicalMedia {
    CanonicalMedia::series(CatalogId(details.id), details.name.clone())
        .with_original_title(details.original_name.clone())
        .with_year(parse_year(details.first_air_date.as_deref()))
}

/// `2019-05-03` → 2019. Empty or malformed dates yield nothing.
fn parse_year(date: Option<&str>) -> Option<u16> {
    date.and_then(|d| d.split('-').next())
        .filter(|y| y.len() == 4)
        .and_then(|y| y.parse().ok())
}

fn require_tmdb(id: ExternalId) -> Result<CatalogId, ProviderError> {
    id.as_catalog_id().ok_or_else(|| {
        ProviderError::Unsupported(format!("TMDB cannot resolve {id}"))
    })
}

#[async_trait]
impl Catalog for TmdbCatalog {
    async fn resolve_by_id(
        &self,
        id: ExternalId,
        media_type: MediaType,
    ) -> Result<Option<CanonicalMedia>, ProviderError> {
        if id.catalog == CatalogKind::Douban {
            debug!(%id, "TMDB does not index secondary ids");
            return Ok(None);
        }
        let id = require_tmdb(id)?;

        match media_type {
            MediaType::Movie => self.movie(id).await,
            MediaType::Tv => {
                Ok(self.tv_details(id).await?.as_ref().map(tv_to_media))
            }
            MediaType::Unknown => match self.movie(id).await? {
                Some(movie) => Ok(Some(movie)),
                None => Ok(self.tv_details(id).await?.as_ref().map(tv_to_media)),
            },
        }
    }

    async fn search(
        &self,
        title: &str,
        year: Option<u16>,
        media_type: MediaType,
    ) -> Result<Vec<CanonicalMedia>, ProviderError> {
        match media_type {
            MediaType::Unknown => {
                let mut results =
                    self.search_kind(title, year, MediaType::Movie).await?;
                results.extend(
                    self.search_kind(title, year, MediaType::Tv).await?,
                );
                Ok(results)
            }
            known => self.search_kind(title, year, known).await,
        }
    }

    async fn episode_manifest(
        &self,
        series: ExternalId,
    ) -> Result<EpisodeManifest, ProviderError> {
        let id = require_tmdb(series)?;
        let details = self.tv_details(id).await?.ok_or(ProviderError::NotFound)?;

        Ok(EpisodeManifest::from_season_counts(
            details
                .seasons
                .iter()
                .map(|s| (s.season_number, s.episode_count.unwrap_or(0))),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::spawn_router;
    use axum::{
        Json, Router,
        extract::{Path, Query},
        http::StatusCode as HttpStatus,
        routing::get,
    };
    use serde_json::{Value, json};
    use std::collections::HashMap;

    fn fake_tmdb() -> Router {
        Router::new()
            .route(
                "/3/movie/{id}",
                get(|Path(id): Path<u64>| async move {
                    if id == 123 {
                        Ok(Json(json!({
                            "id": 123,
                            "title": "Movie Y",
                            "original_title": "Film Y",
                            "release_date": "2019-05-03"
                        })))
                    } else {
                        Err(HttpStatus::NOT_FOUND)
                    }
                }),
            )
            .route(
                "/3/tv/{id}",
                get(|Path(id): Path<u64>| async move {
                    if id == 77 {
                        Ok(Json(json!({
                            "id": 77,
                            "name": "Show X",
                            "first_air_date": "2020-01-01",
                            "seasons": [
                                {"season_number": 0, "episode_count": 2},
                                {"season_number": 1, "episode_count": 10},
                                {"season_number": 2, "episode_count": null}
                            ]
                        })))
                    } else {
                        Err(HttpStatus::NOT_FOUND)
                    }
                }),
            )
            .route(
                "/3/search/tv",
                get(|Query(params): Query<HashMap<String, String>>| async move {
                    if params.get("api_key").map(String::as_str) != Some("key") {
                        return Err(HttpStatus::UNAUTHORIZED);
                    }
                    let body: Value = json!({
                        "results": [
                            {"id": 77, "name": "Show X", "first_air_date": "2020-01-01"},
                            {"id": 78, "name": "Show X Redux", "first_air_date": ""}
                        ]
                    });
                    Ok(Json(body))
                }),
            )
            .route(
                "/3/search/movie",
                get(|| async { Err::<Json<Value>, _>(HttpStatus::TOO_MANY_REQUESTS) }),
            )
    }

    async fn catalog(api_key: &str) -> TmdbCatalog {
        let base = spawn_router(fake_tmdb()).await;
        let base = base.join("3/").expect("base join");
        TmdbCatalog::new(api_key, base, "en-US", Client::new())
    }

    #[tokio::test]
    async fn resolves_movie_by_id() {
        let catalog = catalog("key").await;
        let media = catalog
            .resolve_by_id(ExternalId::tmdb(CatalogId(123)), MediaType::Movie)
            .await
            .expect("request succeeds")
            .expect("movie exists");

        assert_eq!(media.catalog_id(), Some(CatalogId(123)));
        assert_eq!(media.title, "Movie Y");
        assert_eq!(media.original_title.as_deref(), Some("Film Y"));
        assert_eq!(media.year, Some(2019));
        assert_eq!(media.media_type, MediaType::Movie);
    }

    #[tokio::test]
    async fn unknown_type_falls_back_to_series() {
        let catalog = catalog("key").await;
        let media = catalog
            .resolve_by_id(ExternalId::tmdb(CatalogId(77)), MediaType::Unknown)
            .await
            .expect("request succeeds")
            .expect("series exists");
        assert_eq!(media.media_type, MediaType::Tv);
        assert_eq!(media.year, Some(2020));
    }

    #[tokio::test]
    async fn missing_id_is_none() {
        let catalog = catalog("key").await;
        let media = catalog
            .resolve_by_id(ExternalId::tmdb(CatalogId(999)), MediaType::Unknown)
            .await
            .expect("request succeeds");
        assert!(media.is_none());
    }

    #[tokio::test]
    async fn manifest_lists_every_season() {
        let catalog = catalog("key").await;
        let manifest = catalog
            .episode_manifest(ExternalId::tmdb(CatalogId(77)))
            .await
            .expect("manifest");
        let seasons = manifest.by_season();
        assert_eq!(seasons.get(&0).map(Vec::len), Some(2));
        assert_eq!(seasons.get(&1), Some(&(1..=10).collect::<Vec<u16>>()));
        assert!(!seasons.contains_key(&2));
    }

    #[tokio::test]
    async fn search_maps_results_and_blank_dates() {
        let catalog = catalog("key").await;
        let results = catalog
            .search("Show X", None, MediaType::Tv)
            .await
            .expect("search");
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].catalog_id(), Some(CatalogId(77)));
        assert_eq!(results[1].year, None);
    }

    #[tokio::test]
    async fn status_codes_map_to_provider_errors() {
        let catalog = catalog("wrong").await;
        let err = catalog
            .search("Show X", None, MediaType::Tv)
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::InvalidApiKey));

        let err = catalog
            .search("Movie Y", None, MediaType::Movie)
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::RateLimited));
    }

    #[tokio::test]
    async fn secondary_ids_are_not_resolved() {
        let catalog = catalog("key").await;
        let media = catalog
            .resolve_by_id(
                ExternalId::douban(reelgap_model::SecondaryId(5)),
                MediaType::Movie,
            )
            .await
            .expect("no request needed");
        assert!(media.is_none());
    }
}
