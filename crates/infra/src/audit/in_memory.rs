use std::cmp::Reverse;
use std::sync::RwLock;

use stockgate_core::{AuditRecordId, Entity};

use super::query::{AuditFilter, AuditQuery};
use super::record::AuditRecord;
use super::r#trait::{AuditStore, AuditStoreError};

/// In-memory append-only trust log.
///
/// Intended for tests/dev. Appending a record whose id is already present is
/// a no-op, so worker retries never duplicate entries.
#[derive(Debug, Default)]
pub struct InMemoryAuditStore {
    records: RwLock<Vec<AuditRecord>>,
}

impl InMemoryAuditStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.read().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, Vec<AuditRecord>>, AuditStoreError> {
        self.records
            .read()
            .map_err(|_| AuditStoreError::Storage("lock poisoned".to_string()))
    }
}

impl AuditStore for InMemoryAuditStore {
    fn append(&self, record: &AuditRecord) -> Result<(), AuditStoreError> {
        let mut records = self
            .records
            .write()
            .map_err(|_| AuditStoreError::Storage("lock poisoned".to_string()))?;
        if records.iter().any(|r| r.same_identity(record)) {
            return Ok(());
        }
        records.push(record.clone());
        Ok(())
    }
}

#[async_trait::async_trait]
impl AuditQuery for InMemoryAuditStore {
    async fn find(&self, filter: &AuditFilter) -> Result<Vec<AuditRecord>, AuditStoreError> {
        let mut out: Vec<AuditRecord> = self
            .read()?
            .iter()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect();
        out.sort_by_key(|r| Reverse((r.timestamp, r.id)));
        Ok(out)
    }

    async fn find_by_id(&self, id: AuditRecordId) -> Result<Option<AuditRecord>, AuditStoreError> {
        Ok(self.read()?.iter().find(|r| r.id == id).cloned())
    }
}
