//! Explicit resource attribute bag.
//!
//! Conditions never inspect caller types at runtime. The caller (or the type
//! itself, via [`DescribeResource`]) publishes the attributes a policy may look
//! at before the access check runs.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use stockgate_core::ValueObject;

/// Attributes of the resource instance targeted by a request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceAttributes {
    /// Stock-like quantity (products, import/export slips).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<i64>,

    /// Name-like attribute used by `regex:` conditions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Additional attributes, carried for audit/display only.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, JsonValue>,
}

impl ValueObject for ResourceAttributes {}

impl ResourceAttributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quantity(mut self, quantity: i64) -> Self {
        self.quantity = Some(quantity);
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }
}

/// Capability interface for domain types that can be access-checked.
///
/// Implement this on products, slips, etc. so the gateway can build the
/// attribute bag without knowing the concrete type.
pub trait DescribeResource {
    fn describe(&self) -> ResourceAttributes;
}

impl DescribeResource for ResourceAttributes {
    fn describe(&self) -> ResourceAttributes {
        self.clone()
    }
}
