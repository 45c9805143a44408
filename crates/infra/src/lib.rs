//! Infrastructure layer: trust-log storage, the background audit writer and
//! audit queries.

pub mod audit;

pub use audit::{
    AuditFilter, AuditLogger, AuditLoggerConfig, AuditLoggerHandle, AuditQuery, AuditQueryError, AuditReader,
    AuditRecord, AuditSink, AuditStats, AuditStore, AuditStoreError, InMemoryAuditStore, NoopAuditSink, Page,
    Pagination,
};
