//! Condition evaluator.
//!
//! A condition is a string `type[:operator]:value`. The type token is
//! everything before the first `:`, the value is everything after it.
//! Numeric kinds carry their comparison operator as a suffix on the type
//! token (`quantity>=:1`); a bare numeric kind means "strictly less than".
//!
//! Evaluation never fails. Faults resolve to a fixed answer per kind:
//!
//! | fault                                       | result        |
//! |---------------------------------------------|---------------|
//! | quantity check, resource has no quantity    | satisfied     |
//! | malformed numeric threshold                 | satisfied     |
//! | regex check, resource has no name           | not satisfied |
//! | regex check, invalid pattern                | not satisfied |
//! | ip check, origin missing or unparseable     | not satisfied |
//! | unknown type, or no `:` at all              | satisfied     |
//!
//! Compiled `regex:` patterns are kept in a [`PatternCache`] so repeated
//! evaluations of the same policy do not recompile them.

use core::fmt;
use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::RwLock;

use regex::Regex;

use crate::address::{AddressClass, parse_origin};
use crate::context::RequestContext;

/// Comparison operator of a numeric condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
}

impl Comparison {
    /// Parse the operator suffix of a type token. The empty suffix is `Lt`.
    pub fn from_suffix(suffix: &str) -> Option<Self> {
        match suffix {
            "" | "<" => Some(Self::Lt),
            "<=" => Some(Self::Le),
            ">" => Some(Self::Gt),
            ">=" => Some(Self::Ge),
            "==" => Some(Self::Eq),
            "!=" => Some(Self::Ne),
            _ => None,
        }
    }

    pub fn holds<T: PartialOrd>(self, actual: T, threshold: T) -> bool {
        match self {
            Self::Lt => actual < threshold,
            Self::Le => actual <= threshold,
            Self::Gt => actual > threshold,
            Self::Ge => actual >= threshold,
            Self::Eq => actual == threshold,
            Self::Ne => actual != threshold,
        }
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::Eq => "==",
            Self::Ne => "!=",
        })
    }
}

/// Patterns cached beyond this many are compiled per use instead.
const PATTERN_CACHE_CAPACITY: usize = 512;

/// Compiled `regex:` patterns, keyed by the raw pattern text.
///
/// Invalid patterns are cached too (as `None`) so they are reported once.
#[derive(Debug, Default)]
pub struct PatternCache {
    compiled: RwLock<HashMap<String, Option<Regex>>>,
}

impl Clone for PatternCache {
    fn clone(&self) -> Self {
        let compiled = self.compiled.read().map(|m| m.clone()).unwrap_or_default();
        Self {
            compiled: RwLock::new(compiled),
        }
    }
}

impl PatternCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `pattern` matches the whole of `value`. Invalid patterns never match.
    pub fn full_match(&self, pattern: &str, value: &str) -> bool {
        if let Ok(compiled) = self.compiled.read() {
            if let Some(entry) = compiled.get(pattern) {
                return entry.as_ref().is_some_and(|re| re.is_match(value));
            }
        }

        let entry = compile_anchored(pattern);
        let matched = entry.as_ref().is_some_and(|re| re.is_match(value));
        if let Ok(mut compiled) = self.compiled.write() {
            if compiled.len() < PATTERN_CACHE_CAPACITY {
                compiled.insert(pattern.to_string(), entry);
            }
        }
        matched
    }

    pub fn len(&self) -> usize {
        self.compiled.read().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn compile_anchored(pattern: &str) -> Option<Regex> {
    match Regex::new(&format!("^(?:{pattern})$")) {
        Ok(re) => Some(re),
        Err(err) => {
            tracing::debug!(condition = "regex", pattern, error = %err, "invalid pattern; not satisfied");
            None
        }
    }
}

/// A parsed condition, borrowing from the policy's condition string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition<'a> {
    Quantity(Comparison, &'a str),
    Risk(Comparison, &'a str),
    Hour(Comparison, &'a str),
    Role(&'a str),
    Regex(&'a str),
    Permission(&'a str),
    Ip(&'a str),
    /// Unrecognised type token, or a string without `:`.
    Unknown(&'a str),
}

impl<'a> Condition<'a> {
    pub fn parse(raw: &'a str) -> Self {
        let Some((kind, value)) = raw.split_once(':') else {
            return Condition::Unknown(raw);
        };

        match kind {
            "role" => return Condition::Role(value),
            "regex" => return Condition::Regex(value),
            "permission" => return Condition::Permission(value),
            "ip" => return Condition::Ip(value),
            _ => {}
        }

        if let Some(op) = numeric_op(kind, "quantity") {
            return Condition::Quantity(op, value);
        }
        if let Some(op) = numeric_op(kind, "risk") {
            return Condition::Risk(op, value);
        }
        if let Some(op) = numeric_op(kind, "hour") {
            return Condition::Hour(op, value);
        }

        Condition::Unknown(kind)
    }

    /// Evaluate without a shared pattern cache.
    pub fn evaluate(&self, ctx: &RequestContext) -> bool {
        self.evaluate_with(ctx, &PatternCache::new())
    }

    pub fn evaluate_with(&self, ctx: &RequestContext, patterns: &PatternCache) -> bool {
        match *self {
            Condition::Quantity(op, threshold) => {
                let Some(quantity) = ctx.quantity() else {
                    tracing::debug!(condition = "quantity", "resource has no quantity; treating as satisfied");
                    return true;
                };
                match threshold.trim().parse::<i64>() {
                    Ok(t) => op.holds(quantity, t),
                    Err(err) => {
                        tracing::debug!(condition = "quantity", threshold, error = %err, "malformed threshold; treating as satisfied");
                        true
                    }
                }
            }
            Condition::Risk(op, threshold) => match parse_finite(threshold) {
                Some(t) => op.holds(ctx.risk_score, t),
                None => {
                    tracing::debug!(condition = "risk", threshold, "malformed threshold; treating as satisfied");
                    true
                }
            },
            Condition::Hour(op, threshold) => match threshold.trim().parse::<u32>() {
                Ok(t) => op.holds(ctx.hour_of_day, t),
                Err(err) => {
                    tracing::debug!(condition = "hour", threshold, error = %err, "malformed threshold; treating as satisfied");
                    true
                }
            },
            Condition::Role(role) => ctx.principal.role.eq_ignore_case(role),
            Condition::Regex(pattern) => {
                let Some(name) = ctx.resource_name() else {
                    tracing::debug!(condition = "regex", "resource has no name; not satisfied");
                    return false;
                };
                patterns.full_match(pattern, name)
            }
            Condition::Permission(permission) => ctx.principal.has_permission(permission),
            Condition::Ip(selector) => {
                let Some(ip) = ctx.origin.as_deref().and_then(parse_origin) else {
                    tracing::debug!(condition = "ip", origin = ?ctx.origin, "origin missing or unparseable; not satisfied");
                    return false;
                };
                ip_matches(selector, ip)
            }
            Condition::Unknown(kind) => {
                tracing::debug!(condition = kind, "unknown condition type; treating as satisfied");
                true
            }
        }
    }
}

/// Evaluate a single condition string against a request.
pub fn satisfies(condition: &str, ctx: &RequestContext) -> bool {
    Condition::parse(condition).evaluate(ctx)
}

/// The first condition of `conditions` that does not hold, if any.
pub fn first_unsatisfied<'a>(
    conditions: &'a [String],
    ctx: &RequestContext,
    patterns: &PatternCache,
) -> Option<&'a str> {
    conditions
        .iter()
        .map(String::as_str)
        .find(|c| !Condition::parse(c).evaluate_with(ctx, patterns))
}

fn numeric_op(kind: &str, prefix: &str) -> Option<Comparison> {
    kind.strip_prefix(prefix).and_then(Comparison::from_suffix)
}

fn parse_finite(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

fn ip_matches(selector: &str, ip: IpAddr) -> bool {
    let class = AddressClass::of(ip);
    match selector.trim() {
        "loopback" => class == AddressClass::Loopback,
        "private" => class == AddressClass::Private,
        "public" => matches!(class, AddressClass::PublicV4 | AddressClass::GlobalV6),
        "ipv6" => match ip {
            IpAddr::V6(v6) => v6.to_ipv4_mapped().is_none(),
            IpAddr::V4(_) => false,
        },
        literal => parse_origin(literal).is_some_and(|wanted| wanted == ip),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::ResourceAttributes;
    use stockgate_auth::{Permission, Principal, PrincipalId, Role};

    fn ctx() -> RequestContext {
        let principal = Principal::new(PrincipalId::new(), "alice", Role::USER)
            .with_permissions([Permission::of("product", "read")]);
        RequestContext::new(principal, "product", "update")
    }

    fn with_quantity(q: i64) -> RequestContext {
        ctx().with_attributes(ResourceAttributes::new().with_quantity(q))
    }

    fn with_name(name: &str) -> RequestContext {
        ctx().with_attributes(ResourceAttributes::new().with_name(name))
    }

    #[test]
    fn parses_type_token_before_first_colon() {
        assert_eq!(Condition::parse("quantity>=:1"), Condition::Quantity(Comparison::Ge, "1"));
        assert_eq!(Condition::parse("quantity:5"), Condition::Quantity(Comparison::Lt, "5"));
        assert_eq!(Condition::parse("permission:product:read"), Condition::Permission("product:read"));
        assert_eq!(Condition::parse("ip:::1"), Condition::Ip("::1"));
        assert_eq!(Condition::parse("regex:^a:b$"), Condition::Regex("^a:b$"));
        assert_eq!(Condition::parse("geo:EU"), Condition::Unknown("geo"));
        assert_eq!(Condition::parse("quantity~:3"), Condition::Unknown("quantity~"));
        assert_eq!(Condition::parse("nocolon"), Condition::Unknown("nocolon"));
    }

    #[test]
    fn quantity_at_least_one() {
        assert!(!satisfies("quantity>=:1", &with_quantity(0)));
        assert!(satisfies("quantity>=:1", &with_quantity(1)));
    }

    #[test]
    fn quantity_operators() {
        let c = with_quantity(10);
        assert!(satisfies("quantity:11", &c));
        assert!(!satisfies("quantity:10", &c));
        assert!(satisfies("quantity<=:10", &c));
        assert!(satisfies("quantity>:9", &c));
        assert!(satisfies("quantity==:10", &c));
        assert!(satisfies("quantity!=:3", &c));
        assert!(!satisfies("quantity!=:10", &c));
    }

    #[test]
    fn quantity_faults_fail_open() {
        assert!(satisfies("quantity>=:1", &ctx()));
        assert!(satisfies("quantity>=:lots", &with_quantity(0)));
    }

    #[test]
    fn regex_is_a_full_match() {
        assert!(satisfies("regex:^special_.*$", &with_name("special_widget")));
        assert!(!satisfies("regex:^special_.*$", &with_name("widget")));
        assert!(!satisfies("regex:special", &with_name("special_widget")));
    }

    #[test]
    fn regex_faults_fail_closed() {
        assert!(!satisfies("regex:^special_.*$", &ctx()));
        assert!(!satisfies("regex:([", &with_name("anything")));
    }

    #[test]
    fn role_is_case_insensitive() {
        assert!(satisfies("role:user", &ctx()));
        assert!(satisfies("role:USER", &ctx()));
        assert!(!satisfies("role:ADMIN", &ctx()));
    }

    #[test]
    fn permission_is_literal_membership() {
        assert!(satisfies("permission:product:read", &ctx()));
        assert!(!satisfies("permission:product:delete", &ctx()));
    }

    #[test]
    fn risk_and_hour_gates() {
        let c = ctx().with_risk_score(0.5).with_hour(23);
        assert!(satisfies("risk<:0.8", &c));
        assert!(!satisfies("risk<:0.5", &c));
        assert!(satisfies("risk>=:0.5", &c));
        assert!(satisfies("risk:0.9", &c));
        assert!(satisfies("risk<:NaN", &c));
        assert!(!satisfies("hour<:22", &c));
        assert!(satisfies("hour>=:22", &c));
        assert!(satisfies("hour==:23", &c));
        assert!(satisfies("hour<:late", &c));
    }

    #[test]
    fn ip_selectors() {
        assert!(satisfies("ip:loopback", &ctx().with_origin("127.0.0.1:5000")));
        assert!(satisfies("ip:private", &ctx().with_origin("10.0.0.8")));
        assert!(satisfies("ip:public", &ctx().with_origin("8.8.8.8")));
        assert!(satisfies("ip:ipv6", &ctx().with_origin("2001:db8::1")));
        assert!(!satisfies("ip:ipv6", &ctx().with_origin("::ffff:10.0.0.1")));
        assert!(satisfies("ip:10.0.0.8", &ctx().with_origin("10.0.0.8:443")));
        assert!(!satisfies("ip:10.0.0.9", &ctx().with_origin("10.0.0.8")));
    }

    #[test]
    fn ip_faults_fail_closed() {
        assert!(!satisfies("ip:loopback", &ctx()));
        assert!(!satisfies("ip:loopback", &ctx().with_origin("localhost")));
    }

    #[test]
    fn unknown_kinds_fail_open() {
        assert!(satisfies("geo:EU", &ctx()));
        assert!(satisfies("whatever", &ctx()));
    }

    #[test]
    fn first_unsatisfied_reports_the_failing_condition() {
        let conditions = vec!["role:USER".to_string(), "quantity>=:1".to_string()];
        let patterns = PatternCache::new();
        assert_eq!(first_unsatisfied(&conditions, &with_quantity(0), &patterns), Some("quantity>=:1"));
        assert_eq!(first_unsatisfied(&conditions, &with_quantity(2), &patterns), None);
    }

    #[test]
    fn patterns_are_compiled_once() {
        let patterns = PatternCache::new();
        let check = Condition::parse("regex:^special_.*$");

        assert!(check.evaluate_with(&with_name("special_widget"), &patterns));
        assert!(!check.evaluate_with(&with_name("widget"), &patterns));
        assert!(!Condition::parse("regex:([").evaluate_with(&with_name("x"), &patterns));
        assert!(!Condition::parse("regex:([").evaluate_with(&with_name("x"), &patterns));
        assert_eq!(patterns.len(), 2);
    }

    #[test]
    fn pattern_cache_stops_growing_at_capacity() {
        let patterns = PatternCache::new();
        for i in 0..PATTERN_CACHE_CAPACITY + 10 {
            assert!(patterns.full_match(&format!("w{i}"), &format!("w{i}")));
        }
        assert_eq!(patterns.len(), PATTERN_CACHE_CAPACITY);
        // Uncached patterns still evaluate correctly.
        assert!(patterns.full_match("overflow_.*", "overflow_1"));
        assert!(!patterns.full_match("overflow_.*", "other"));
    }
}
