//! Policy enforcement point.

use tracing::debug;

use stockgate_auth::Principal;
use stockgate_infra::AuditSink;
use stockgate_pdp::{
    AccessDenied, Decision, DecisionEngine, Explanation, PolicyStore, RequestContext, RiskInput, RiskScorer,
    RiskWeights,
};

use crate::request::RequestAttributes;

/// Guards protected operations.
///
/// Per call: build the request context, score it, ask the decision engine,
/// hand the outcome to the audit sink exactly once, return the decision.
/// Holds no mutable state.
#[derive(Debug)]
pub struct Gateway<S, A> {
    engine: DecisionEngine<S>,
    scorer: RiskScorer,
    audit: A,
}

impl<S, A> Gateway<S, A>
where
    S: PolicyStore,
    A: AuditSink,
{
    pub fn new(store: S, audit: A) -> Self {
        Self::with_risk_weights(store, audit, RiskWeights::default())
    }

    pub fn with_risk_weights(store: S, audit: A, weights: RiskWeights) -> Self {
        Self {
            engine: DecisionEngine::new(store),
            scorer: RiskScorer::new(weights),
            audit,
        }
    }

    pub fn engine(&self) -> &DecisionEngine<S> {
        &self.engine
    }

    pub fn audit(&self) -> &A {
        &self.audit
    }

    pub fn check_access(
        &self,
        principal: Option<&Principal>,
        resource: &str,
        action: &str,
        request: &RequestAttributes,
    ) -> bool {
        self.decide(principal, resource, action, request).permitted()
    }

    pub fn decide(
        &self,
        principal: Option<&Principal>,
        resource: &str,
        action: &str,
        request: &RequestAttributes,
    ) -> Decision {
        let Some(principal) = principal else {
            debug!(resource, action, "unauthenticated request denied");
            return Decision::not_authenticated();
        };

        let ctx = self.context(principal, resource, action, request);
        let decision = self.engine.evaluate(&ctx);
        self.audit.record(&decision, &ctx);
        decision
    }

    /// [`decide`](Self::decide) as a guard: `gateway.enforce(..)?`.
    pub fn enforce(
        &self,
        principal: Option<&Principal>,
        resource: &str,
        action: &str,
        request: &RequestAttributes,
    ) -> Result<Decision, AccessDenied> {
        self.decide(principal, resource, action, request).into_result()
    }

    /// Dry run with a per-policy trace. Not audited.
    pub fn explain(
        &self,
        principal: Option<&Principal>,
        resource: &str,
        action: &str,
        request: &RequestAttributes,
    ) -> Option<Explanation> {
        principal.map(|p| self.engine.explain(&self.context(p, resource, action, request)))
    }

    fn context(
        &self,
        principal: &Principal,
        resource: &str,
        action: &str,
        request: &RequestAttributes,
    ) -> RequestContext {
        let mut ctx = RequestContext::new(principal.clone(), resource, action).with_hour(request.hour_of_day());
        ctx.origin = request.origin.clone();
        ctx.method = request.method.clone();
        ctx.attributes = request.resource.clone();
        ctx.risk_score = self.scorer.score(&RiskInput::from_context(&ctx));
        ctx
    }
}
