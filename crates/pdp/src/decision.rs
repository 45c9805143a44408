use serde::{Deserialize, Serialize};
use thiserror::Error;

use stockgate_core::{PolicyId, ValueObject};

pub const REASON_NOT_AUTHENTICATED: &str = "not authenticated";
pub const REASON_NO_APPLICABLE_POLICY: &str = "no applicable policy found";
pub const REASON_NO_POLICY_PERMITTED: &str = "no policy permitted request";
pub const REASON_POLICY_PERMITS: &str = "policy permits request";
pub const REASON_POLICY_DENIES: &str = "policy denies request";
pub const REASON_STORE_UNAVAILABLE: &str = "policy store unavailable";

/// Why a request was denied.
///
/// Condition evaluation faults and audit persistence faults are recovered
/// where they happen and never surface on a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialKind {
    /// No principal was attached to the call; the engine was never consulted.
    NotAuthenticated,
    /// The store had no candidate for the (resource, action) pair.
    NoPolicyMatch,
    /// Candidates existed but none of them permitted the request.
    PolicyNotSatisfied,
    /// The store could not be read. Treated like no match.
    PolicyStoreUnavailable,
}

/// Result of one authorization evaluation.
///
/// Immutable: constructed only through the named constructors so that
/// `permitted` is true exactly when there is no denial kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    permitted: bool,
    reason: String,
    policy_id: Option<PolicyId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    denial: Option<DenialKind>,
}

impl ValueObject for Decision {}

impl Decision {
    pub fn permit(policy_id: PolicyId) -> Self {
        Self {
            permitted: true,
            reason: REASON_POLICY_PERMITS.to_string(),
            policy_id: Some(policy_id),
            denial: None,
        }
    }

    pub fn not_authenticated() -> Self {
        Self::deny(REASON_NOT_AUTHENTICATED, DenialKind::NotAuthenticated)
    }

    pub fn no_applicable_policy() -> Self {
        Self::deny(REASON_NO_APPLICABLE_POLICY, DenialKind::NoPolicyMatch)
    }

    pub fn no_policy_permitted() -> Self {
        Self::deny(REASON_NO_POLICY_PERMITTED, DenialKind::PolicyNotSatisfied)
    }

    pub fn store_unavailable() -> Self {
        Self::deny(REASON_STORE_UNAVAILABLE, DenialKind::PolicyStoreUnavailable)
    }

    fn deny(reason: &str, kind: DenialKind) -> Self {
        Self {
            permitted: false,
            reason: reason.to_string(),
            policy_id: None,
            denial: Some(kind),
        }
    }

    pub fn permitted(&self) -> bool {
        self.permitted
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    pub fn policy_id(&self) -> Option<PolicyId> {
        self.policy_id
    }

    pub fn denial(&self) -> Option<DenialKind> {
        self.denial
    }

    /// Convert into a guard result for `?`-style enforcement.
    pub fn into_result(self) -> Result<Decision, AccessDenied> {
        match self.denial {
            None => Ok(self),
            Some(kind) => Err(AccessDenied {
                kind,
                reason: self.reason,
            }),
        }
    }
}

/// A denied decision, as an error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("access denied: {reason}")]
pub struct AccessDenied {
    pub kind: DenialKind,
    pub reason: String,
}
