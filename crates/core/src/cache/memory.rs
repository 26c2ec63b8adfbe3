//! In-memory [`CacheStorage`], used by tests and ephemeral workers.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{CacheStorage, StoreInfo};
use crate::Error;
use crate::request::{WorkerRequest, WorkerResponse};

type Store = HashMap<String, WorkerResponse>;

/// Stores kept in a vector so creation order survives.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    stores: RwLock<Vec<(String, Store)>>,
    operations: AtomicUsize,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of storage calls made so far, reads and writes alike.
    pub fn operations(&self) -> usize {
        self.operations.load(Ordering::SeqCst)
    }

    fn touch(&self) {
        self.operations.fetch_add(1, Ordering::SeqCst);
    }

    fn store_mut<'a>(stores: &'a mut Vec<(String, Store)>, name: &str) -> &'a mut Store {
        let index = match stores.iter().position(|(n, _)| n == name) {
            Some(index) => index,
            None => {
                stores.push((name.to_string(), Store::new()));
                stores.len() - 1
            }
        };
        &mut stores[index].1
    }
}

#[async_trait]
impl CacheStorage for MemoryStorage {
    async fn open(&self, name: &str) -> Result<(), Error> {
        self.touch();
        let mut stores = self.stores.write().await;
        Self::store_mut(&mut stores, name);
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>, Error> {
        self.touch();
        Ok(self.stores.read().await.iter().map(|(n, _)| n.clone()).collect())
    }

    async fn delete(&self, name: &str) -> Result<bool, Error> {
        self.touch();
        let mut stores = self.stores.write().await;
        let before = stores.len();
        stores.retain(|(n, _)| n != name);
        Ok(stores.len() != before)
    }

    async fn match_in(&self, name: &str, request: &WorkerRequest) -> Result<Option<WorkerResponse>, Error> {
        self.touch();
        let key = request.cache_key();
        let stores = self.stores.read().await;
        Ok(stores
            .iter()
            .find(|(n, _)| n == name)
            .and_then(|(_, store)| store.get(&key).cloned()))
    }

    async fn match_any(&self, request: &WorkerRequest) -> Result<Option<WorkerResponse>, Error> {
        self.touch();
        let key = request.cache_key();
        let stores = self.stores.read().await;
        Ok(stores.iter().find_map(|(_, store)| store.get(&key).cloned()))
    }

    async fn put(&self, name: &str, request: &WorkerRequest, response: &WorkerResponse) -> Result<(), Error> {
        self.touch();
        let mut stores = self.stores.write().await;
        Self::store_mut(&mut stores, name).insert(request.cache_key(), response.clone());
        Ok(())
    }

    async fn put_all(&self, name: &str, entries: &[(WorkerRequest, WorkerResponse)]) -> Result<(), Error> {
        self.touch();
        let mut stores = self.stores.write().await;
        let store = Self::store_mut(&mut stores, name);
        for (request, response) in entries {
            store.insert(request.cache_key(), response.clone());
        }
        Ok(())
    }

    async fn stats(&self) -> Result<Vec<StoreInfo>, Error> {
        self.touch();
        Ok(self
            .stores
            .read()
            .await
            .iter()
            .map(|(name, store)| StoreInfo { name: name.clone(), entries: store.len() as u64 })
            .collect())
    }
}
