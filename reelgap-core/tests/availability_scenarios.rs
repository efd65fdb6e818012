use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
};
use reelgap_core::{
    AvailabilityError, AvailabilityService, EmbyClient, InMemoryExistenceStore,
    IndexedItem, MediaServerClient, ProbePolicy, RetryPolicy, ServerExistenceProbe,
    ServerFlavor, TmdbCatalog,
};
use reelgap_model::api::{ExistsParams, MediaInfoRequest, NotExistEntry};
use reelgap_model::{Availability, CatalogId, ExistenceLocation, MediaType};
use serde_json::{Value, json};
use url::Url;

async fn spawn(router: Router) -> Url {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("serve");
    });
    Url::parse(&format!("http://{addr}/")).expect("url")
}

fn tmdb_routes() -> Router {
    Router::new()
        .route(
            "/3/movie/{id}",
            get(|Path(id): Path<u64>| async move {
                match id {
                    123 => Ok(Json(json!({
                        "id": 123, "title": "Movie Y", "release_date": "2019-05-03"
                    }))),
                    _ => Err(StatusCode::NOT_FOUND),
                }
            }),
        )
        .route(
            "/3/tv/{id}",
            get(|Path(id): Path<u64>| async move {
                match id {
                    77 => Ok(Json(json!({
                        "id": 77,
                        "name": "Show X",
                        "first_air_date": "2020-02-01",
                        "seasons": [
                            {"season_number": 0, "episode_count": 1},
                            {"season_number": 1, "episode_count": 10},
                            {"season_number": 2, "episode_count": 6}
                        ]
                    }))),
                    _ => Err(StatusCode::NOT_FOUND),
                }
            }),
        )
        .route(
            "/3/search/tv",
            get(|Query(q): Query<HashMap<String, String>>| async move {
                let results: Value = if q.get("query").map(String::as_str) == Some("Show X") {
                    json!([{"id": 77, "name": "Show X", "first_air_date": "2020-02-01"}])
                } else {
                    json!([])
                };
                Json(json!({ "results": results }))
            }),
        )
        .route(
            "/3/search/movie",
            get(|Query(q): Query<HashMap<String, String>>| async move {
                let results: Value = if q.get("query").map(String::as_str) == Some("Movie Y") {
                    json!([{"id": 123, "title": "Movie Y", "release_date": "2019-05-03"}])
                } else {
                    json!([])
                };
                Json(json!({ "results": results }))
            }),
        )
}

#[derive(Clone, Default)]
struct EmbyState {
    item_requests: Arc<AtomicUsize>,
}

fn emby_routes(state: EmbyState) -> Router {
    Router::new()
        .route(
            "/emby/Items",
            get(
                |State(state): State<EmbyState>,
                 Query(q): Query<HashMap<String, String>>| async move {
                    state.item_requests.fetch_add(1, Ordering::SeqCst);
                    let items = match q.get("IncludeItemTypes").map(String::as_str) {
                        Some("Series") => json!([
                            {"Id": "series-1", "Name": "Show X", "ProductionYear": 2020,
                             "ProviderIds": {"Tmdb": "77"}}
                        ]),
                        _ => json!([]),
                    };
                    Json(json!({ "Items": items }))
                },
            ),
        )
        .route(
            "/emby/Shows/{id}/Episodes",
            get(|Path(_id): Path<String>| async move {
                Json(json!({"Items": [
                    {"ParentIndexNumber": 1, "IndexNumber": 1},
                    {"ParentIndexNumber": 1, "IndexNumber": 2},
                    {"ParentIndexNumber": 1, "IndexNumber": 3}
                ]}))
            }),
        )
        .with_state(state)
}

struct Harness {
    service: AvailabilityService,
    emby: EmbyState,
}

async fn harness(items: Vec<IndexedItem>) -> Harness {
    let client = reqwest::Client::new();
    let tmdb_base = spawn(tmdb_routes()).await.join("3/").expect("tmdb base");
    let catalog = TmdbCatalog::new("test-key", tmdb_base, "en-US", client.clone());

    let emby = EmbyState::default();
    let emby_host = spawn(emby_routes(emby.clone())).await;
    let server: Arc<dyn MediaServerClient> = Arc::new(EmbyClient::new(
        "emby",
        ServerFlavor::Emby,
        emby_host,
        None,
        "token",
        client,
    ));
    let probe = ServerExistenceProbe::new(
        vec![server],
        ProbePolicy {
            timeout: Duration::from_secs(5),
            retry: RetryPolicy::default(),
        },
    );

    let store = InMemoryExistenceStore::with_items(items).await;
    Harness {
        service: AvailabilityService::new(Arc::new(catalog), Arc::new(store), Arc::new(probe)),
        emby,
    }
}

#[tokio::test]
async fn series_gap_is_computed_from_server_episodes() {
    let harness = harness(Vec::new()).await;

    let availability = harness
        .service
        .missing(&MediaInfoRequest {
            title: Some("Show X".into()),
            season: Some(1),
            ..MediaInfoRequest::default()
        })
        .await
        .expect("gap query");

    let entries: Vec<NotExistEntry> = (&availability).into();
    assert_eq!(
        entries,
        vec![NotExistEntry {
            season: Some(1),
            episodes: (4..=10).collect(),
            total_episode: 10,
            start_episode: 1,
        }]
    );
}

#[tokio::test]
async fn movie_absent_everywhere_is_not_found() {
    let harness = harness(Vec::new()).await;

    let response = harness
        .service
        .exists(&ExistsParams {
            title: Some("Movie Y".into()),
            tmdbid: Some(123),
            ..ExistsParams::default()
        })
        .await
        .expect("exists");
    assert!(!response.found);
    assert!(response.item.is_none());

    let availability = harness
        .service
        .missing(&MediaInfoRequest {
            title: Some("Movie Y".into()),
            tmdb_id: Some(123),
            ..MediaInfoRequest::default()
        })
        .await
        .expect("gap query");
    let entries: Vec<NotExistEntry> = (&availability).into();
    assert_eq!(entries, vec![NotExistEntry::default()]);
}

#[tokio::test]
async fn unknown_title_is_unresolved() {
    let harness = harness(Vec::new()).await;
    let err = harness
        .service
        .missing(&MediaInfoRequest {
            title: Some("Nothing Like This".into()),
            ..MediaInfoRequest::default()
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AvailabilityError::UnresolvedMedia));
}

#[tokio::test]
async fn indexed_series_never_reaches_the_media_server() {
    let item = IndexedItem::new("emby", "local-77", MediaType::Tv, "Show X")
        .with_year(2020)
        .with_catalog_id(CatalogId(77))
        .with_seasons((1..=10).map(|e| (1, e)).collect());
    let harness = harness(vec![item]).await;

    let response = harness
        .service
        .exists(&ExistsParams {
            title: Some("Show X".into()),
            season: Some(1),
            ..ExistsParams::default()
        })
        .await
        .expect("exists");
    assert_eq!(
        response.item.map(|i| i.location),
        Some(ExistenceLocation::LocalDb)
    );

    let availability = harness
        .service
        .missing(&MediaInfoRequest {
            tmdb_id: Some(77),
            season: Some(1),
            ..MediaInfoRequest::default()
        })
        .await
        .expect("gap query");
    assert_eq!(availability, Availability::Present);
    assert_eq!(harness.emby.item_requests.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn repeated_existence_checks_agree() {
    let harness = harness(Vec::new()).await;
    let params = ExistsParams {
        title: Some("Show X".into()),
        mtype: Some("tv".into()),
        ..ExistsParams::default()
    };
    let first = harness.service.exists(&params).await.expect("first");
    let second = harness.service.exists(&params).await.expect("second");
    assert_eq!(first, second);
    assert!(first.found);
}
