//! `stockgate-pdp` — policy decision point.
//!
//! Pure and synchronous: a [`DecisionEngine`] reads candidate policies from a
//! [`PolicyStore`], checks subjects and conditions against a
//! [`RequestContext`] and returns a [`Decision`]. No IO beyond the store.

pub mod address;
pub mod attributes;
pub mod condition;
pub mod context;
pub mod decision;
pub mod defaults;
pub mod engine;
pub mod policy;
pub mod risk;
pub mod store;

pub use address::AddressClass;
pub use attributes::{DescribeResource, ResourceAttributes};
pub use condition::{Comparison, Condition, PatternCache, satisfies};
pub use context::RequestContext;
pub use decision::{AccessDenied, Decision, DenialKind};
pub use defaults::{PolicySet, default_policies};
pub use engine::{DecisionEngine, Explanation, PolicyOutcome, PolicyTrace};
pub use policy::{Effect, Policy};
pub use risk::{RiskInput, RiskScorer, RiskWeights, Verb};
pub use store::{InMemoryPolicyStore, PolicySnapshot, PolicyStore, PolicyStoreConfig, PolicyStoreError};
