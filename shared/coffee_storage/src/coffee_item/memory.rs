//! In-memory coffee item store used in tests

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use aws_sdk_dynamodb::error::SdkError;
use tokio::sync::RwLock;

use super::{
    CoffeeItem, CoffeeItemPatch, CoffeeItemStorageError, CoffeeItemStorageResult,
    CoffeeItemStore,
};

/// `HashMap`-backed [`CoffeeItemStore`] with the same semantics as the `DynamoDB` store
///
/// Counts every call so tests can assert that a request never reached the store.
#[derive(Debug, Default)]
pub struct InMemoryCoffeeItemStorage {
    items: RwLock<HashMap<String, CoffeeItem>>,
    access_count: AtomicUsize,
    unavailable: AtomicBool,
}

impl InMemoryCoffeeItemStorage {
    /// Creates an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of store operations invoked so far
    #[must_use]
    pub fn access_count(&self) -> usize {
        self.access_count.load(Ordering::SeqCst)
    }

    /// Makes every subsequent operation fail as if the store timed out
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn record_access(&self) -> bool {
        self.access_count.fetch_add(1, Ordering::SeqCst);
        self.unavailable.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CoffeeItemStore for InMemoryCoffeeItemStorage {
    async fn get(&self, id: &str) -> CoffeeItemStorageResult<Option<CoffeeItem>> {
        if self.record_access() {
            return Err(CoffeeItemStorageError::DynamoDbGetError(
                SdkError::timeout_error("in-memory store unavailable"),
            ));
        }
        Ok(self.items.read().await.get(id).cloned())
    }

    async fn list(&self) -> CoffeeItemStorageResult<Vec<CoffeeItem>> {
        if self.record_access() {
            return Err(CoffeeItemStorageError::DynamoDbScanError(
                SdkError::timeout_error("in-memory store unavailable"),
            ));
        }
        Ok(self.items.read().await.values().cloned().collect())
    }

    async fn put(&self, item: CoffeeItem) -> CoffeeItemStorageResult<CoffeeItem> {
        if self.record_access() {
            return Err(CoffeeItemStorageError::DynamoDbPutError(
                SdkError::timeout_error("in-memory store unavailable"),
            ));
        }
        let mut items = self.items.write().await;
        if items.contains_key(&item.id) {
            return Err(CoffeeItemStorageError::ItemExists(item.id));
        }
        items.insert(item.id.clone(), item.clone());
        Ok(item)
    }

    async fn update(
        &self,
        id: &str,
        patch: &CoffeeItemPatch,
    ) -> CoffeeItemStorageResult<Option<CoffeeItem>> {
        if self.record_access() {
            return Err(CoffeeItemStorageError::DynamoDbUpdateError(
                SdkError::timeout_error("in-memory store unavailable"),
            ));
        }
        let mut items = self.items.write().await;
        Ok(items.get_mut(id).map(|item| {
            patch.apply_to(item);
            item.clone()
        }))
    }

    async fn delete(&self, id: &str) -> CoffeeItemStorageResult<Option<CoffeeItem>> {
        if self.record_access() {
            return Err(CoffeeItemStorageError::DynamoDbDeleteError(
                SdkError::timeout_error("in-memory store unavailable"),
            ));
        }
        Ok(self.items.write().await.remove(id))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::Map;

    use super::*;

    fn espresso() -> CoffeeItem {
        CoffeeItem {
            id: "c002".to_string(),
            name: "Espresso".to_string(),
            price: 2.5,
            availability: None,
            attributes: Map::new(),
        }
    }

    #[tokio::test]
    async fn test_put_rejects_duplicate_id() {
        let storage = InMemoryCoffeeItemStorage::new();
        storage.put(espresso()).await.unwrap();

        let duplicate = CoffeeItem {
            name: "Double Espresso".to_string(),
            ..espresso()
        };
        let result = storage.put(duplicate).await;

        assert!(matches!(result, Err(CoffeeItemStorageError::ItemExists(id)) if id == "c002"));
        let stored = storage.get("c002").await.unwrap().unwrap();
        assert_eq!(stored.name, "Espresso");
    }

    #[tokio::test]
    async fn test_missing_item_operations_return_none() {
        let storage = InMemoryCoffeeItemStorage::new();

        assert!(storage.get("nope").await.unwrap().is_none());
        assert!(storage
            .update("nope", &CoffeeItemPatch::default())
            .await
            .unwrap()
            .is_none());
        assert!(storage.delete("nope").await.unwrap().is_none());
        assert_eq!(storage.access_count(), 3);
    }

    #[tokio::test]
    async fn test_unavailable_store_is_transient() {
        let storage = InMemoryCoffeeItemStorage::new();
        storage.set_unavailable(true);

        let err = storage.list().await.unwrap_err();

        assert!(err.is_transient());
    }
}
