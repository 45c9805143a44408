use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockgate_core::{AuditRecordId, Entity, PolicyId, PrincipalId};
use stockgate_pdp::{Decision, RequestContext};

/// A persisted trust-log entry: one authorization decision and what it was
/// made against.
///
/// Append-only. Nothing in this workspace mutates or deletes records once
/// they are handed to an [`AuditStore`](super::AuditStore).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub id: AuditRecordId,
    pub principal_id: PrincipalId,
    pub username: String,
    pub resource: String,
    pub action: String,
    pub ip_address: Option<String>,
    pub risk_score: f64,
    /// `true` when the request was permitted.
    pub decision_result: bool,
    pub reason: String,
    pub policy_id: Option<PolicyId>,
    pub timestamp: DateTime<Utc>,
}

impl AuditRecord {
    pub fn from_decision(decision: &Decision, ctx: &RequestContext) -> Self {
        Self::from_decision_at(decision, ctx, Utc::now())
    }

    pub fn from_decision_at(decision: &Decision, ctx: &RequestContext, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: AuditRecordId::new(),
            principal_id: ctx.principal.id,
            username: ctx.principal.username.clone(),
            resource: ctx.resource.clone(),
            action: ctx.action.clone(),
            ip_address: ctx.origin.clone(),
            risk_score: ctx.risk_score,
            decision_result: decision.permitted(),
            reason: decision.reason().to_string(),
            policy_id: decision.policy_id(),
            timestamp,
        }
    }
}

impl Entity for AuditRecord {
    type Id = AuditRecordId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
