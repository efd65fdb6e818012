use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reelgap_model::{
    CatalogId, ExistenceRecord, ItemId, MediaType, SeasonPresence, SecondaryId,
};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use tracing::{debug, warn};
use uuid::Uuid;

use super::{ExistenceStore, IndexLookup, IndexedItem};
use crate::error::{AvailabilityError, Result};
use crate::identifier::normalize_title;

/// Local index backed by the `media_server_items` table.
#[derive(Clone, Debug)]
pub struct PostgresExistenceStore {
    pool: PgPool,
}

impl PostgresExistenceStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Inserts or refreshes an item, keyed by server and server item id.
    pub async fn upsert(&self, item: &IndexedItem) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO media_server_items (
                id, server, library, item_id, item_type, title, original_title,
                year, tmdb_id, douban_id, season_info, updated_at,
                title_key, original_title_key
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            ON CONFLICT (server, item_id) DO UPDATE SET
                library = EXCLUDED.library,
                item_type = EXCLUDED.item_type,
                title = EXCLUDED.title,
                original_title = EXCLUDED.original_title,
                year = EXCLUDED.year,
                tmdb_id = EXCLUDED.tmdb_id,
                douban_id = EXCLUDED.douban_id,
                season_info = EXCLUDED.season_info,
                updated_at = EXCLUDED.updated_at,
                title_key = EXCLUDED.title_key,
                original_title_key = EXCLUDED.original_title_key
            "#,
        )
        .bind(item.id)
        .bind(&item.server)
        .bind(&item.library)
        .bind(item.item_id.as_str())
        .bind(item.item_type.as_str())
        .bind(&item.title)
        .bind(&item.original_title)
        .bind(item.year.map(i32::from))
        .bind(item.catalog_id.map(|id| to_db_id(id.get())).transpose()?)
        .bind(item.secondary_id.map(|id| to_db_id(id.get())).transpose()?)
        .bind(Json(&item.seasons))
        .bind(item.updated_at)
        .bind(normalize_title(&item.title))
        .bind(item.original_title.as_deref().map(normalize_title))
        .execute(self.pool())
        .await?;
        Ok(())
    }

    async fn candidates(&self, query: &IndexLookup) -> Result<Vec<IndexedItem>> {
        let Some(mut builder) = candidate_query(query)? else {
            return Ok(Vec::new());
        };

        let rows: Vec<MediaServerItemRow> =
            builder.build_query_as().fetch_all(self.pool()).await?;

        Ok(rows_to_items(rows))
    }
}

/// Narrows rows by catalog id, or by normalized title key. `None` when the
/// lookup has neither.
fn candidate_query(query: &IndexLookup) -> Result<Option<QueryBuilder<'static, Postgres>>> {
    let mut builder = QueryBuilder::<Postgres>::new(
        r#"
        SELECT
            id, server, library, item_id, item_type, title, original_title,
            year, tmdb_id, douban_id, season_info, updated_at
        FROM media_server_items
        WHERE 1=1
        "#,
    );

    if let Some(catalog_id) = query.catalog_id {
        builder.push(" AND tmdb_id = ");
        builder.push_bind(to_db_id(catalog_id.get())?);
    } else if let Some(title) = query.title.as_deref() {
        let key = normalize_title(title);
        if key.is_empty() {
            return Ok(None);
        }
        builder.push(" AND (title_key = ");
        builder.push_bind(key.clone());
        builder.push(" OR original_title_key = ");
        builder.push_bind(key);
        builder.push(")");
    } else {
        return Ok(None);
    }

    if let Some(media_type) = query.media_type.filter(|t| t.is_known()) {
        builder.push(" AND item_type = ");
        builder.push_bind(media_type.as_str());
    }

    builder.push(" ORDER BY updated_at DESC, id DESC");
    Ok(Some(builder))
}

/// Malformed rows are logged and left out rather than failing the lookup.
fn rows_to_items(rows: Vec<MediaServerItemRow>) -> Vec<IndexedItem> {
    rows.into_iter()
        .filter_map(|row| match IndexedItem::try_from(row) {
            Ok(item) => Some(item),
            Err(e) => {
                warn!(error = %e, "skipping malformed media_server_items row");
                None
            }
        })
        .collect()
}

#[async_trait]
impl ExistenceStore for PostgresExistenceStore {
    async fn lookup(&self, query: &IndexLookup) -> Result<Option<ExistenceRecord>> {
        if !query.is_searchable() {
            return Ok(None);
        }

        let candidates = self.candidates(query).await?;
        debug!(candidates = candidates.len(), "local index candidates");

        // SQL narrows by id or title key; type, year and season are
        // checked here.
        Ok(candidates
            .iter()
            .find(|item| item.matches(query))
            .map(IndexedItem::to_record))
    }
}

#[derive(Debug, FromRow)]
struct MediaServerItemRow {
    id: Uuid,
    server: String,
    library: Option<String>,
    item_id: String,
    item_type: String,
    title: String,
    original_title: Option<String>,
    year: Option<i32>,
    tmdb_id: Option<i64>,
    douban_id: Option<i64>,
    season_info: Json<SeasonPresence>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<MediaServerItemRow> for IndexedItem {
    type Error = AvailabilityError;

    fn try_from(row: MediaServerItemRow) -> Result<Self> {
        let item_type: MediaType = row.item_type.parse().map_err(|_| {
            AvailabilityError::Store(format!(
                "media_server_items.{} has unknown item_type '{}'",
                row.id, row.item_type
            ))
        })?;

        let year = row
            .year
            .map(u16::try_from)
            .transpose()
            .map_err(|_| AvailabilityError::Store(format!("invalid year for {}", row.id)))?;

        Ok(IndexedItem {
            id: row.id,
            server: row.server,
            library: row.library,
            item_id: ItemId::new(row.item_id),
            item_type,
            title: row.title,
            original_title: row.original_title,
            year,
            catalog_id: from_db_id(row.tmdb_id)?.map(CatalogId),
            secondary_id: from_db_id(row.douban_id)?.map(SecondaryId),
            seasons: row.season_info.0,
            updated_at: row.updated_at,
        })
    }
}

fn to_db_id(id: u64) -> Result<i64> {
    i64::try_from(id).map_err(|_| AvailabilityError::Store(format!("id {id} exceeds BIGINT")))
}

fn from_db_id(id: Option<i64>) -> Result<Option<u64>> {
    id.map(|id| {
        u64::try_from(id)
            .map_err(|_| AvailabilityError::Store(format!("negative external id {id}")))
    })
    .transpose()
}
