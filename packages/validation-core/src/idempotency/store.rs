//! Storage backend for idempotency records.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

use super::IdempotencyRecord;
use crate::error::{IdempotencyError, IdempotencyResult};

fn poisoned() -> IdempotencyError {
    IdempotencyError::StoreUnreachable(Box::<dyn std::error::Error + Send + Sync>::from("poisoned lock"))
}

#[async_trait]
pub trait IdempotencyStore: Send + Sync {
    async fn get(&self, key: &str) -> IdempotencyResult<Option<IdempotencyRecord>>;
    async fn put(&self, record: IdempotencyRecord) -> IdempotencyResult<()>;
    async fn delete(&self, key: &str) -> IdempotencyResult<()>;
}

#[derive(Default)]
pub struct InMemoryIdempotencyStore {
    records: RwLock<HashMap<String, IdempotencyRecord>>,
}

#[async_trait]
impl IdempotencyStore for InMemoryIdempotencyStore {
    async fn get(&self, key: &str) -> IdempotencyResult<Option<IdempotencyRecord>> {
        let guard = self.records.read().map_err(|_| poisoned())?;
        Ok(guard.get(key).cloned())
    }

    async fn put(&self, record: IdempotencyRecord) -> IdempotencyResult<()> {
        let mut guard = self.records.write().map_err(|_| poisoned())?;
        guard.insert(record.key.clone(), record);
        Ok(())
    }

    async fn delete(&self, key: &str) -> IdempotencyResult<()> {
        let mut guard = self.records.write().map_err(|_| poisoned())?;
        guard.remove(key);
        Ok(())
    }
}
