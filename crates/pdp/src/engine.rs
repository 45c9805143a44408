//! Policy decision engine.

use serde::Serialize;

use stockgate_core::PolicyId;

use crate::condition::{PatternCache, first_unsatisfied};
use crate::context::RequestContext;
use crate::decision::{Decision, REASON_POLICY_DENIES};
use crate::policy::{Effect, Policy};
use crate::store::PolicyStore;

/// Per-policy evaluation outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PolicyOutcome {
    SubjectMismatch,
    ConditionFailed { condition: String },
    Permit,
    /// The policy applied with a deny effect. Later candidates are still tried.
    Deny,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PolicyTrace {
    pub policy_id: PolicyId,
    pub policy_name: String,
    #[serde(flatten)]
    pub outcome: PolicyOutcome,
}

/// A decision together with the per-policy trail that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Explanation {
    pub decision: Decision,
    pub trace: Vec<PolicyTrace>,
}

/// Evaluates requests against the policies held by a [`PolicyStore`].
///
/// Holds the store handle and a cache of compiled condition patterns; safe to
/// share across threads.
#[derive(Debug, Clone)]
pub struct DecisionEngine<S> {
    store: S,
    patterns: PatternCache,
}

impl<S: PolicyStore> DecisionEngine<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            patterns: PatternCache::new(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Decide a request. Never fails: every fault resolves to a deny.
    pub fn evaluate(&self, ctx: &RequestContext) -> Decision {
        let decision = self.assess(ctx, |_| {});
        tracing::debug!(
            principal = %ctx.principal.id,
            resource = %ctx.resource,
            action = %ctx.action,
            permitted = decision.permitted(),
            reason = decision.reason(),
            "authorization decision"
        );
        decision
    }

    /// Same walk as [`evaluate`](Self::evaluate), recording every policy visited.
    pub fn explain(&self, ctx: &RequestContext) -> Explanation {
        let mut trace = Vec::new();
        let decision = self.assess(ctx, |entry| trace.push(entry));
        Explanation { decision, trace }
    }

    fn assess(&self, ctx: &RequestContext, mut record: impl FnMut(PolicyTrace)) -> Decision {
        let candidates = match self.store.find_policies(&ctx.resource, &ctx.action) {
            Ok(c) => c,
            Err(err) => {
                tracing::warn!(
                    resource = %ctx.resource,
                    action = %ctx.action,
                    error = %err,
                    "policy store unavailable; denying"
                );
                return Decision::store_unavailable();
            }
        };

        if candidates.is_empty() {
            return Decision::no_applicable_policy();
        }

        for policy in candidates {
            let outcome = outcome_of(&policy, ctx, &self.patterns);
            let permit = outcome == PolicyOutcome::Permit;
            if outcome == PolicyOutcome::Deny {
                tracing::debug!(policy = %policy.name, reason = REASON_POLICY_DENIES, "deny policy matched; continuing");
            }
            record(PolicyTrace {
                policy_id: policy.id,
                policy_name: policy.name,
                outcome,
            });
            if permit {
                return Decision::permit(policy.id);
            }
        }

        Decision::no_policy_permitted()
    }
}

fn outcome_of(policy: &Policy, ctx: &RequestContext, patterns: &PatternCache) -> PolicyOutcome {
    if !policy.subject_matches(&ctx.principal.role) {
        return PolicyOutcome::SubjectMismatch;
    }
    if let Some(condition) = first_unsatisfied(&policy.conditions, ctx, patterns) {
        return PolicyOutcome::ConditionFailed {
            condition: condition.to_string(),
        };
    }
    match policy.effect {
        Effect::Permit => PolicyOutcome::Permit,
        Effect::Deny => PolicyOutcome::Deny,
    }
}
