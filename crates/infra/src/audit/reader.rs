//! Administrator-only access to the trust log.
//!
//! Reads bypass the enforcement gateway and the decision engine entirely and
//! never produce audit records of their own.

use thiserror::Error;
use tracing::warn;

use stockgate_auth::{Principal, is_administrator};
use stockgate_core::AuditRecordId;

use super::query::{AuditFilter, AuditQuery, Page, Pagination};
use super::record::AuditRecord;
use super::r#trait::AuditStoreError;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuditQueryError {
    #[error("forbidden: trust log access requires an administrator")]
    Forbidden,

    #[error(transparent)]
    Store(#[from] AuditStoreError),
}

/// Gates every trust-log query behind [`is_administrator`].
#[derive(Debug, Clone)]
pub struct AuditReader<Q> {
    query: Q,
}

impl<Q: AuditQuery> AuditReader<Q> {
    pub fn new(query: Q) -> Self {
        Self { query }
    }

    fn authorize(&self, caller: Option<&Principal>) -> Result<(), AuditQueryError> {
        if is_administrator(caller) {
            return Ok(());
        }
        warn!(
            caller = caller.map(|p| p.username.as_str()).unwrap_or("<anonymous>"),
            "trust log read refused"
        );
        Err(AuditQueryError::Forbidden)
    }

    pub async fn list(
        &self,
        caller: Option<&Principal>,
        filter: &AuditFilter,
    ) -> Result<Vec<AuditRecord>, AuditQueryError> {
        self.authorize(caller)?;
        Ok(self.query.find(filter).await?)
    }

    pub async fn page(
        &self,
        caller: Option<&Principal>,
        filter: &AuditFilter,
        pagination: Pagination,
    ) -> Result<Page<AuditRecord>, AuditQueryError> {
        self.authorize(caller)?;
        Ok(self.query.find_page(filter, pagination).await?)
    }

    pub async fn get(
        &self,
        caller: Option<&Principal>,
        id: AuditRecordId,
    ) -> Result<Option<AuditRecord>, AuditQueryError> {
        self.authorize(caller)?;
        Ok(self.query.find_by_id(id).await?)
    }
}
