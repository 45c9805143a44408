//! Trust-log query interface.
//!
//! Read-only. Every selection comes in two forms: a full list and a page.
//! Results are ordered newest first.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use stockgate_core::{AuditRecordId, PrincipalId};

use super::record::AuditRecord;
use super::r#trait::AuditStoreError;

/// Largest page a single query may return.
pub const MAX_PAGE_LIMIT: u32 = 1000;

/// Pagination parameters for trust-log queries.
///
/// `limit` is capped at [`MAX_PAGE_LIMIT`] when a page is cut, however the
/// value was built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    /// Maximum number of records to return.
    pub limit: u32,
    /// Offset for pagination (0-based).
    pub offset: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            limit: 50,
            offset: 0,
        }
    }
}

impl Pagination {
    pub fn new(limit: Option<u32>, offset: Option<u32>) -> Self {
        Self {
            limit: limit.unwrap_or(50).min(MAX_PAGE_LIMIT),
            offset: offset.unwrap_or(0),
        }
    }
}

/// One page of results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Total number of matches across all pages.
    pub total: u64,
    pub pagination: Pagination,
    pub has_more: bool,
}

impl<T> Page<T> {
    /// Cut one page out of the full, already ordered, match list.
    pub fn slice(all: Vec<T>, pagination: Pagination) -> Self {
        let pagination = Pagination {
            limit: pagination.limit.min(MAX_PAGE_LIMIT),
            ..pagination
        };
        let total = all.len() as u64;
        let start = (pagination.offset as usize).min(all.len());
        let items: Vec<T> = all
            .into_iter()
            .skip(start)
            .take(pagination.limit as usize)
            .collect();
        let has_more = ((start + items.len()) as u64) < total;
        Self {
            items,
            total,
            pagination,
            has_more,
        }
    }
}

/// Selection criteria. Unset fields match everything; set fields are ANDed.
///
/// The timestamp range is inclusive at both ends.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditFilter {
    pub principal_id: Option<PrincipalId>,
    pub username: Option<String>,
    pub resource: Option<String>,
    pub action: Option<String>,
    pub decision_result: Option<bool>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl AuditFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn by_principal(id: PrincipalId) -> Self {
        Self::new().with_principal(id)
    }

    pub fn by_username(username: impl Into<String>) -> Self {
        Self::new().with_username(username)
    }

    pub fn by_resource(resource: impl Into<String>) -> Self {
        Self::new().with_resource(resource)
    }

    pub fn by_action(action: impl Into<String>) -> Self {
        Self::new().with_action(action)
    }

    pub fn by_decision(permitted: bool) -> Self {
        Self::new().with_decision(permitted)
    }

    pub fn between(from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        Self::new().with_range(from, to)
    }

    pub fn by_principal_between(id: PrincipalId, from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        Self::by_principal(id).with_range(from, to)
    }

    pub fn by_username_between(username: impl Into<String>, from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        Self::by_username(username).with_range(from, to)
    }

    pub fn with_principal(mut self, id: PrincipalId) -> Self {
        self.principal_id = Some(id);
        self
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn with_resource(mut self, resource: impl Into<String>) -> Self {
        self.resource = Some(resource.into());
        self
    }

    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    pub fn with_decision(mut self, permitted: bool) -> Self {
        self.decision_result = Some(permitted);
        self
    }

    pub fn with_range(mut self, from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        self.from = Some(from);
        self.to = Some(to);
        self
    }

    pub fn matches(&self, record: &AuditRecord) -> bool {
        self.principal_id.is_none_or(|id| record.principal_id == id)
            && self.username.as_deref().is_none_or(|u| record.username == u)
            && self.resource.as_deref().is_none_or(|r| record.resource == r)
            && self.action.as_deref().is_none_or(|a| record.action == a)
            && self.decision_result.is_none_or(|d| record.decision_result == d)
            && self.from.is_none_or(|from| record.timestamp >= from)
            && self.to.is_none_or(|to| record.timestamp <= to)
    }
}

/// Async query interface over the trust log.
#[async_trait::async_trait]
pub trait AuditQuery: Send + Sync {
    /// Every record matching `filter`, newest first.
    async fn find(&self, filter: &AuditFilter) -> Result<Vec<AuditRecord>, AuditStoreError>;

    /// One page of the records matching `filter`, newest first.
    async fn find_page(
        &self,
        filter: &AuditFilter,
        pagination: Pagination,
    ) -> Result<Page<AuditRecord>, AuditStoreError> {
        Ok(Page::slice(self.find(filter).await?, pagination))
    }

    async fn find_by_id(&self, id: AuditRecordId) -> Result<Option<AuditRecord>, AuditStoreError>;
}

#[async_trait::async_trait]
impl<S> AuditQuery for Arc<S>
where
    S: AuditQuery + ?Sized,
{
    async fn find(&self, filter: &AuditFilter) -> Result<Vec<AuditRecord>, AuditStoreError> {
        (**self).find(filter).await
    }

    async fn find_page(
        &self,
        filter: &AuditFilter,
        pagination: Pagination,
    ) -> Result<Page<AuditRecord>, AuditStoreError> {
        (**self).find_page(filter, pagination).await
    }

    async fn find_by_id(&self, id: AuditRecordId) -> Result<Option<AuditRecord>, AuditStoreError> {
        (**self).find_by_id(id).await
    }
}
