//! Gateway configuration, loadable from JSON.

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use stockgate_infra::AuditLoggerConfig;
use stockgate_observability::ObservabilityConfig;
use stockgate_pdp::{InMemoryPolicyStore, Policy, PolicyStoreConfig, PolicyStoreError, RiskWeights, default_policies};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Everything needed to stand up a gateway. Every section is optional in JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub risk: RiskWeights,
    pub audit: AuditLoggerConfig,
    pub policy_store: PolicyStoreConfig,
    pub observability: ObservabilityConfig,
    /// Seed the built-in warehouse policies into the store.
    pub seed_default_policies: bool,
    /// Extra policies seeded after the defaults.
    pub policies: Vec<Policy>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            risk: RiskWeights::default(),
            audit: AuditLoggerConfig::default(),
            policy_store: PolicyStoreConfig::default(),
            observability: ObservabilityConfig::default(),
            seed_default_policies: true,
            policies: Vec::new(),
        }
    }
}

impl GatewayConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(ConfigError::from)
            .with_context(|| format!("failed to read gateway config {}", path.display()))?;
        Self::from_json_str(&raw).with_context(|| format!("failed to parse gateway config {}", path.display()))
    }

    pub fn with_risk(mut self, risk: RiskWeights) -> Self {
        self.risk = risk;
        self
    }

    pub fn with_audit(mut self, audit: AuditLoggerConfig) -> Self {
        self.audit = audit;
        self
    }

    pub fn with_policy_store(mut self, policy_store: PolicyStoreConfig) -> Self {
        self.policy_store = policy_store;
        self
    }

    pub fn with_seed_default_policies(mut self, seed: bool) -> Self {
        self.seed_default_policies = seed;
        self
    }

    pub fn with_policies(mut self, policies: impl IntoIterator<Item = Policy>) -> Self {
        self.policies.extend(policies);
        self
    }

    /// Build and seed an in-memory policy store. Seeding is idempotent by name.
    pub fn build_policy_store(&self) -> Result<InMemoryPolicyStore, PolicyStoreError> {
        let store = InMemoryPolicyStore::with_config(self.policy_store.clone());
        if self.seed_default_policies {
            store.seed(default_policies())?;
        }
        store.seed(self.policies.iter().cloned())?;
        Ok(store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_json_is_all_defaults() {
        let config = GatewayConfig::from_json_str("{}").unwrap();
        assert_eq!(config, GatewayConfig::default());
    }

    #[test]
    fn partial_sections_keep_their_defaults() {
        let json = r#"{
            "risk": { "delete": 0.5 },
            "audit": { "queue_capacity": 16 },
            "policy_store": { "expand_any_action": true },
            "seed_default_policies": false,
            "policies": [
                { "name": "clerk-read", "resource": "product", "action": "read",
                  "effect": "PERMIT", "subjects": ["CLERK"] }
            ]
        }"#;
        let config = GatewayConfig::from_json_str(json).unwrap();

        assert_eq!(config.risk.delete, 0.5);
        assert_eq!(config.risk.create, 0.10);
        assert_eq!(config.audit.queue_capacity, 16);
        assert_eq!(config.audit.max_attempts, 3);
        assert!(config.policy_store.expand_any_action);

        let store = config.build_policy_store().unwrap();
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn default_store_is_seeded() {
        let store = GatewayConfig::default().build_policy_store().unwrap();
        assert_eq!(store.len(), default_policies().len());
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        assert!(matches!(GatewayConfig::from_json_str("{ nope"), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn missing_file_reports_path_in_context() {
        let err = GatewayConfig::from_path("/definitely/not/here.json").unwrap_err();
        assert!(format!("{err:#}").contains("/definitely/not/here.json"));
    }
}
