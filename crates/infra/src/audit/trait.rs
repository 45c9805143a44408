use std::sync::Arc;

use thiserror::Error;

use super::record::AuditRecord;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuditStoreError {
    #[error("audit storage error: {0}")]
    Storage(String),
}

/// Append-only sink for trust-log records.
///
/// Called from the audit worker thread only, never on the decision path.
/// Implementations must tolerate the same record being appended more than
/// once: a failed append is retried.
pub trait AuditStore: Send + Sync {
    fn append(&self, record: &AuditRecord) -> Result<(), AuditStoreError>;
}

impl<S> AuditStore for Arc<S>
where
    S: AuditStore + ?Sized,
{
    fn append(&self, record: &AuditRecord) -> Result<(), AuditStoreError> {
        (**self).append(record)
    }
}
