use async_trait::async_trait;
use reelgap_model::{ExistenceRecord, ItemId};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::{ExistenceStore, IndexLookup, IndexedItem};
use crate::error::Result;

/// Index held in process memory. Used by tests and by servers running
/// without a database.
#[derive(Clone, Debug, Default)]
pub struct InMemoryExistenceStore {
    items: Arc<RwLock<HashMap<(String, ItemId), IndexedItem>>>,
}

impl InMemoryExistenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn with_items(items: impl IntoIterator<Item = IndexedItem>) -> Self {
        let store = Self::new();
        for item in items {
            store.upsert(item).await;
        }
        store
    }

    /// Inserts or replaces the item with the same server and item id.
    pub async fn upsert(&self, item: IndexedItem) {
        let mut guard = self.items.write().await;
        guard.insert((item.server.clone(), item.item_id.clone()), item);
    }

    pub async fn remove(&self, server: &str, item_id: &ItemId) -> Option<IndexedItem> {
        let mut guard = self.items.write().await;
        guard.remove(&(server.to_string(), item_id.clone()))
    }

    pub async fn len(&self) -> usize {
        self.items.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.items.read().await.is_empty()
    }
}

#[async_trait]
impl ExistenceStore for InMemoryExistenceStore {
    async fn lookup(&self, query: &IndexLookup) -> Result<Option<ExistenceRecord>> {
        if !query.is_searchable() {
            return Ok(None);
        }

        let guard = self.items.read().await;
        Ok(guard
            .values()
            .filter(|item| item.matches(query))
            .max_by_key(|item| (item.updated_at, item.id))
            .map(IndexedItem::to_record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use reelgap_model::{CatalogId, MediaType};

    fn movie_y(server: &str, item: &str) -> IndexedItem {
        IndexedItem::new(server, item, MediaType::Movie, "Movie Y")
            .with_year(2019)
            .with_catalog_id(CatalogId(123))
    }

    #[tokio::test]
    async fn lookup_finds_item_by_catalog_id() {
        let store = InMemoryExistenceStore::with_items([movie_y("emby", "m-1")]).await;
        let record = store
            .lookup(&IndexLookup {
                catalog_id: Some(CatalogId(123)),
                ..IndexLookup::default()
            })
            .await
            .expect("lookup succeeds")
            .expect("record found");
        assert_eq!(record.item_id, ItemId::from("m-1"));
        assert_eq!(record.server.as_deref(), Some("emby"));
    }

    #[tokio::test]
    async fn empty_query_matches_nothing() {
        let store = InMemoryExistenceStore::with_items([movie_y("emby", "m-1")]).await;
        let record = store
            .lookup(&IndexLookup::default())
            .await
            .expect("lookup succeeds");
        assert!(record.is_none());
    }

    #[tokio::test]
    async fn newest_matching_item_wins() {
        let mut older = movie_y("emby", "m-old");
        older.updated_at = Utc::now() - Duration::days(3);
        let newer = movie_y("jellyfin", "m-new");
        let store = InMemoryExistenceStore::with_items([older, newer]).await;

        let record = store
            .lookup(&IndexLookup {
                title: Some("Movie Y".into()),
                year: Some(2019),
                ..IndexLookup::default()
            })
            .await
            .expect("lookup succeeds")
            .expect("record found");
        assert_eq!(record.item_id, ItemId::from("m-new"));
    }

    #[tokio::test]
    async fn upsert_replaces_by_server_and_item() {
        let store = InMemoryExistenceStore::new();
        store.upsert(movie_y("emby", "m-1")).await;
        store.upsert(movie_y("emby", "m-1").with_year(2020)).await;
        assert_eq!(store.len().await, 1);

        let removed = store.remove("emby", &ItemId::from("m-1")).await;
        assert_eq!(removed.and_then(|item| item.year), Some(2020));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn repeated_lookups_are_stable() {
        let store = InMemoryExistenceStore::with_items([movie_y("emby", "m-1")]).await;
        let query = IndexLookup {
            title: Some("Movie Y".into()),
            ..IndexLookup::default()
        };
        let first = store.lookup(&query).await.expect("first");
        let second = store.lookup(&query).await.expect("second");
        assert_eq!(first, second);
    }
}
