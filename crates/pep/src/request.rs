use chrono::{DateTime, FixedOffset, Local, Timelike};
use serde::{Deserialize, Serialize};

use stockgate_pdp::{DescribeResource, ResourceAttributes};

/// Transport-level facts about one protected call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestAttributes {
    /// Peer address as the transport reports it.
    pub origin: Option<String>,
    pub method: Option<String>,
    /// Local wall-clock time the call was received.
    pub received_at: DateTime<FixedOffset>,
    pub resource: Option<ResourceAttributes>,
}

impl Default for RequestAttributes {
    fn default() -> Self {
        Self {
            origin: None,
            method: None,
            received_at: Local::now().fixed_offset(),
            resource: None,
        }
    }
}

impl RequestAttributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    pub fn received_at(mut self, at: DateTime<FixedOffset>) -> Self {
        self.received_at = at;
        self
    }

    pub fn with_resource(mut self, attributes: ResourceAttributes) -> Self {
        self.resource = Some(attributes);
        self
    }

    /// Attach the attributes a domain value publishes about itself.
    pub fn describing<R: DescribeResource + ?Sized>(self, resource: &R) -> Self {
        self.with_resource(resource.describe())
    }

    pub fn hour_of_day(&self) -> u32 {
        self.received_at.hour()
    }
}
