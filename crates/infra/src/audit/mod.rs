//! Trust log: decision records, their storage, the non-blocking logger that
//! feeds it and the administrator-only read path.

pub mod in_memory;
pub mod logger;
pub mod query;
pub mod reader;
pub mod record;
pub mod r#trait;

pub use in_memory::InMemoryAuditStore;
pub use logger::{AuditLogger, AuditLoggerConfig, AuditLoggerHandle, AuditSink, AuditStats, NoopAuditSink};
pub use query::{AuditFilter, AuditQuery, MAX_PAGE_LIMIT, Page, Pagination};
pub use reader::{AuditQueryError, AuditReader};
pub use record::AuditRecord;
pub use r#trait::{AuditStore, AuditStoreError};
