//! Contextual risk scoring.
//!
//! Additive model over request metadata. The score is advisory: the engine
//! never gates on it, policies opt in through `risk` conditions.

use serde::{Deserialize, Serialize};

use crate::address::AddressClass;
use crate::context::RequestContext;

/// Per-factor score deltas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskWeights {
    pub loopback: f64,
    pub private_network: f64,
    pub global_ipv6: f64,
    pub link_local_ipv6: f64,
    pub public_ipv4: f64,
    pub unknown_address: f64,

    /// Applied when `hour < business_hours_start || hour >= business_hours_end`.
    pub off_hours: f64,
    pub business_hours_start: u32,
    pub business_hours_end: u32,

    pub elevated_role: f64,
    /// Compared case-insensitively.
    pub elevated_roles: Vec<String>,

    pub sensitive_resource: f64,
    pub sensitive_resources: Vec<String>,
    pub inventory_resource: f64,
    pub inventory_resources: Vec<String>,

    pub read: f64,
    pub create: f64,
    pub update: f64,
    pub delete: f64,
    pub other_verb: f64,
}

impl Default for RiskWeights {
    fn default() -> Self {
        Self {
            loopback: -0.10,
            private_network: 0.10,
            global_ipv6: 0.10,
            link_local_ipv6: 0.10,
            public_ipv4: 0.0,
            unknown_address: 0.20,
            off_hours: 0.20,
            business_hours_start: 6,
            business_hours_end: 22,
            elevated_role: 0.10,
            elevated_roles: vec!["ADMIN".to_string()],
            sensitive_resource: 0.30,
            sensitive_resources: ["users", "policies", "trust-logs"]
                .map(String::from)
                .to_vec(),
            inventory_resource: 0.10,
            inventory_resources: [
                "products",
                "product",
                "imports",
                "exports",
                "importslip",
                "exportslip",
            ]
            .map(String::from)
            .to_vec(),
            read: 0.0,
            create: 0.10,
            update: 0.15,
            delete: 0.30,
            other_verb: 0.10,
        }
    }
}

impl RiskWeights {
    pub fn with_elevated_roles<I, T>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.elevated_roles = roles.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_sensitive_resources<I, T>(mut self, resources: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.sensitive_resources = resources.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_business_hours(mut self, start: u32, end: u32) -> Self {
        self.business_hours_start = start;
        self.business_hours_end = end;
        self
    }

    fn address(&self, class: AddressClass) -> f64 {
        match class {
            AddressClass::Loopback => self.loopback,
            AddressClass::Private => self.private_network,
            AddressClass::LinkLocalV6 => self.link_local_ipv6,
            AddressClass::PublicV4 => self.public_ipv4,
            AddressClass::GlobalV6 => self.global_ipv6,
            AddressClass::Unknown => self.unknown_address,
        }
    }

    fn verb(&self, verb: Verb) -> f64 {
        match verb {
            Verb::Read => self.read,
            Verb::Create => self.create,
            Verb::Update => self.update,
            Verb::Delete => self.delete,
            Verb::Other => self.other_verb,
        }
    }
}

/// Coarse operation class, from an HTTP method or an action tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verb {
    Read,
    Create,
    Update,
    Delete,
    Other,
}

impl Verb {
    pub fn classify(raw: &str) -> Self {
        let raw = raw.trim();
        let is = |names: &[&str]| names.iter().any(|n| n.eq_ignore_ascii_case(raw));
        if is(&["read", "get", "head", "options"]) {
            Verb::Read
        } else if is(&["create", "post"]) {
            Verb::Create
        } else if is(&["update", "put", "patch"]) {
            Verb::Update
        } else if is(&["delete"]) {
            Verb::Delete
        } else {
            Verb::Other
        }
    }
}

/// Request metadata the scorer looks at.
#[derive(Debug, Clone, Copy)]
pub struct RiskInput<'a> {
    pub origin: Option<&'a str>,
    pub hour: u32,
    pub role: &'a str,
    pub resource: &'a str,
    /// HTTP method when present, otherwise the action tag.
    pub verb: &'a str,
}

impl<'a> RiskInput<'a> {
    pub fn from_context(ctx: &'a RequestContext) -> Self {
        Self {
            origin: ctx.origin.as_deref(),
            hour: ctx.hour_of_day,
            role: ctx.principal.role.as_str(),
            resource: &ctx.resource,
            verb: ctx.method.as_deref().unwrap_or(&ctx.action),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RiskScorer {
    weights: RiskWeights,
}

impl RiskScorer {
    pub fn new(weights: RiskWeights) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &RiskWeights {
        &self.weights
    }

    /// Score in `[0.0, 1.0]`. A non-finite sum scores as maximum risk.
    pub fn score(&self, input: &RiskInput<'_>) -> f64 {
        let w = &self.weights;
        let mut score = 0.0;

        score += w.address(AddressClass::of_origin(input.origin));

        if input.hour < w.business_hours_start || input.hour >= w.business_hours_end {
            score += w.off_hours;
        }

        if w.elevated_roles.iter().any(|r| r.eq_ignore_ascii_case(input.role)) {
            score += w.elevated_role;
        }

        if w.sensitive_resources.iter().any(|r| r == input.resource) {
            score += w.sensitive_resource;
        } else if w.inventory_resources.iter().any(|r| r == input.resource) {
            score += w.inventory_resource;
        }

        score += w.verb(Verb::classify(input.verb));

        clamp_score(score)
    }
}

fn clamp_score(raw: f64) -> f64 {
    if raw.is_finite() { raw.clamp(0.0, 1.0) } else { 1.0 }
}
