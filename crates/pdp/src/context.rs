use serde::Serialize;

use stockgate_auth::Principal;

use crate::attributes::ResourceAttributes;

/// Everything a single authorization check is evaluated against.
///
/// Built once per check by the enforcement gateway, consumed by the decision
/// engine, then dropped. Only the audit record derived from it is persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestContext {
    pub principal: Principal,
    pub resource: String,
    pub action: String,
    pub attributes: Option<ResourceAttributes>,
    /// Originating network address as reported by the transport (unparsed).
    pub origin: Option<String>,
    /// HTTP-style verb, when the call came in over HTTP.
    pub method: Option<String>,
    /// Local wall-clock hour, 0..=23.
    pub hour_of_day: u32,
    /// Advisory risk score in `[0.0, 1.0]`.
    pub risk_score: f64,
}

impl RequestContext {
    pub fn new(principal: Principal, resource: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            principal,
            resource: resource.into(),
            action: action.into(),
            attributes: None,
            origin: None,
            method: None,
            hour_of_day: 12,
            risk_score: 0.0,
        }
    }

    pub fn with_attributes(mut self, attributes: ResourceAttributes) -> Self {
        self.attributes = Some(attributes);
        self
    }

    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    pub fn with_hour(mut self, hour: u32) -> Self {
        self.hour_of_day = hour % 24;
        self
    }

    pub fn with_risk_score(mut self, score: f64) -> Self {
        self.risk_score = score;
        self
    }

    pub fn quantity(&self) -> Option<i64> {
        self.attributes.as_ref().and_then(|a| a.quantity)
    }

    pub fn resource_name(&self) -> Option<&str> {
        self.attributes.as_ref().and_then(|a| a.name.as_deref())
    }
}
