//! Policy store abstraction and the in-memory snapshot store.

use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use stockgate_core::{DomainError, Entity, PolicyId};

use crate::policy::{ACTION_ANY, Policy};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PolicyStoreError {
    #[error("policy not found: {0}")]
    NotFound(PolicyId),

    #[error("duplicate policy name: {0}")]
    DuplicateName(String),

    #[error(transparent)]
    Invalid(#[from] DomainError),

    #[error("policy storage error: {0}")]
    Storage(String),
}

/// Read side of policy storage, as seen by the decision engine.
pub trait PolicyStore: Send + Sync {
    /// Candidate policies for an exact (resource, action) pair, in evaluation order.
    fn find_policies(&self, resource: &str, action: &str) -> Result<Vec<Policy>, PolicyStoreError>;

    fn find_policy_by_id(&self, id: PolicyId) -> Result<Option<Policy>, PolicyStoreError>;
}

impl<S> PolicyStore for Arc<S>
where
    S: PolicyStore + ?Sized,
{
    fn find_policies(&self, resource: &str, action: &str) -> Result<Vec<Policy>, PolicyStoreError> {
        (**self).find_policies(resource, action)
    }

    fn find_policy_by_id(&self, id: PolicyId) -> Result<Option<Policy>, PolicyStoreError> {
        (**self).find_policy_by_id(id)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyStoreConfig {
    /// Also return `action = "any"` policies for every action on their
    /// resource, after the exact matches.
    pub expand_any_action: bool,
}

impl PolicyStoreConfig {
    pub fn with_expand_any_action(mut self, expand: bool) -> Self {
        self.expand_any_action = expand;
        self
    }
}

/// Immutable view of every stored policy, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct PolicySnapshot {
    policies: Vec<Policy>,
}

impl PolicySnapshot {
    pub fn policies(&self) -> &[Policy] {
        &self.policies
    }

    fn position_by_name(&self, name: &str) -> Option<usize> {
        self.policies.iter().position(|p| p.name == name)
    }
}

/// In-memory policy store.
///
/// Readers clone the current `Arc<PolicySnapshot>` and release the lock
/// immediately; writers build a new snapshot and swap it in.
#[derive(Debug, Default)]
pub struct InMemoryPolicyStore {
    snapshot: RwLock<Arc<PolicySnapshot>>,
    config: PolicyStoreConfig,
}

impl InMemoryPolicyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: PolicyStoreConfig) -> Self {
        Self {
            snapshot: RwLock::new(Arc::new(PolicySnapshot::default())),
            config,
        }
    }

    pub fn from_policies(policies: impl IntoIterator<Item = Policy>) -> Result<Self, PolicyStoreError> {
        let store = Self::new();
        for policy in policies {
            store.insert(policy)?;
        }
        Ok(store)
    }

    pub fn config(&self) -> &PolicyStoreConfig {
        &self.config
    }

    pub fn snapshot(&self) -> Result<Arc<PolicySnapshot>, PolicyStoreError> {
        self.snapshot
            .read()
            .map(|guard| Arc::clone(&guard))
            .map_err(|_| PolicyStoreError::Storage("lock poisoned".to_string()))
    }

    fn modify<T>(
        &self,
        f: impl FnOnce(&mut PolicySnapshot) -> Result<T, PolicyStoreError>,
    ) -> Result<T, PolicyStoreError> {
        let mut guard = self
            .snapshot
            .write()
            .map_err(|_| PolicyStoreError::Storage("lock poisoned".to_string()))?;
        let mut next = PolicySnapshot::clone(&guard);
        let out = f(&mut next)?;
        *guard = Arc::new(next);
        Ok(out)
    }

    /// Add a new policy. Names are unique across the store.
    pub fn insert(&self, policy: Policy) -> Result<PolicyId, PolicyStoreError> {
        policy.validate()?;
        self.modify(|snap| {
            if snap.position_by_name(&policy.name).is_some() {
                return Err(PolicyStoreError::DuplicateName(policy.name.clone()));
            }
            if snap.policies.iter().any(|p| p.same_identity(&policy)) {
                return Err(DomainError::conflict(format!("duplicate policy id {}", policy.id)).into());
            }
            let id = policy.id;
            snap.policies.push(policy);
            Ok(id)
        })
    }

    /// Insert, or replace the policy with the same name in place (keeping its id).
    pub fn upsert(&self, mut policy: Policy) -> Result<PolicyId, PolicyStoreError> {
        policy.validate()?;
        self.modify(|snap| match snap.position_by_name(&policy.name) {
            Some(idx) => {
                policy.id = snap.policies[idx].id;
                let id = policy.id;
                snap.policies[idx] = policy;
                Ok(id)
            }
            None => {
                let id = policy.id;
                snap.policies.push(policy);
                Ok(id)
            }
        })
    }

    pub fn remove(&self, id: PolicyId) -> Result<Policy, PolicyStoreError> {
        self.modify(|snap| {
            let idx = snap
                .policies
                .iter()
                .position(|p| p.id == id)
                .ok_or(PolicyStoreError::NotFound(id))?;
            Ok(snap.policies.remove(idx))
        })
    }

    pub fn list(&self) -> Result<Vec<Policy>, PolicyStoreError> {
        Ok(self.snapshot()?.policies.clone())
    }

    /// Insert every policy whose name is not already present.
    ///
    /// Returns how many were inserted; running it twice inserts nothing the
    /// second time.
    pub fn seed(&self, policies: impl IntoIterator<Item = Policy>) -> Result<usize, PolicyStoreError> {
        let policies: Vec<Policy> = policies.into_iter().collect();
        for policy in &policies {
            policy.validate()?;
        }
        self.modify(|snap| {
            let mut inserted = 0;
            for policy in policies {
                if snap.position_by_name(&policy.name).is_some() {
                    continue;
                }
                tracing::info!(policy = %policy.name, "seeding policy");
                snap.policies.push(policy);
                inserted += 1;
            }
            Ok(inserted)
        })
    }

    pub fn len(&self) -> usize {
        self.snapshot().map(|s| s.policies.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl PolicyStore for InMemoryPolicyStore {
    fn find_policies(&self, resource: &str, action: &str) -> Result<Vec<Policy>, PolicyStoreError> {
        let snap = self.snapshot()?;
        let exact = snap
            .policies
            .iter()
            .filter(|p| p.resource == resource && p.action == action);

        let mut out: Vec<Policy> = exact.cloned().collect();
        if self.config.expand_any_action && action != ACTION_ANY {
            out.extend(
                snap.policies
                    .iter()
                    .filter(|p| p.resource == resource && p.targets_any_action())
                    .cloned(),
            );
        }
        Ok(out)
    }

    fn find_policy_by_id(&self, id: PolicyId) -> Result<Option<Policy>, PolicyStoreError> {
        Ok(self.snapshot()?.policies.iter().find(|p| p.id == id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with(policies: Vec<Policy>) -> InMemoryPolicyStore {
        InMemoryPolicyStore::from_policies(policies).unwrap()
    }

    #[test]
    fn matching_is_exact_and_ordered() {
        let store = store_with(vec![
            Policy::permit("a", "product", "read"),
            Policy::permit("b", "product", "create"),
            Policy::permit("c", "product", "read"),
            Policy::permit("d", "Product", "read"),
        ]);

        let names: Vec<_> = store
            .find_policies("product", "read")
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["a", "c"]);
    }

    #[test]
    fn any_action_is_literal_unless_expanded() {
        let policies = vec![
            Policy::permit("all", "product", "any"),
            Policy::permit("read", "product", "read"),
        ];

        let plain = store_with(policies.clone());
        assert_eq!(plain.find_policies("product", "read").unwrap().len(), 1);
        assert_eq!(plain.find_policies("product", "any").unwrap().len(), 1);

        let expanding = InMemoryPolicyStore::with_config(PolicyStoreConfig::default().with_expand_any_action(true));
        for p in policies {
            expanding.insert(p).unwrap();
        }
        let names: Vec<_> = expanding
            .find_policies("product", "read")
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["read", "all"]);
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let store = store_with(vec![Policy::permit("a", "product", "read")]);
        let err = store.insert(Policy::permit("a", "exportslip", "create")).unwrap_err();
        assert_eq!(err, PolicyStoreError::DuplicateName("a".to_string()));
    }

    #[test]
    fn invalid_policies_are_rejected() {
        let store = InMemoryPolicyStore::new();
        let err = store.insert(Policy::permit("", "product", "read")).unwrap_err();
        assert!(matches!(err, PolicyStoreError::Invalid(DomainError::Validation(_))));
    }

    #[test]
    fn upsert_replaces_in_place_keeping_id() {
        let store = store_with(vec![
            Policy::permit("a", "product", "read"),
            Policy::permit("b", "product", "read"),
        ]);
        let original = store.list().unwrap()[0].id;

        let id = store
            .upsert(Policy::deny("a", "product", "read").with_description("now denies"))
            .unwrap();
        assert_eq!(id, original);

        let listed = store.list().unwrap();
        assert_eq!(listed[0].name, "a");
        assert_eq!(listed[0].description, "now denies");
        assert_eq!(listed.len(), 2);
    }

    #[test]
    fn remove_and_lookup_by_id() {
        let store = store_with(vec![Policy::permit("a", "product", "read")]);
        let id = store.list().unwrap()[0].id;

        assert!(store.find_policy_by_id(id).unwrap().is_some());
        assert_eq!(store.remove(id).unwrap().name, "a");
        assert!(store.find_policy_by_id(id).unwrap().is_none());
        assert_eq!(store.remove(id).unwrap_err(), PolicyStoreError::NotFound(id));
    }

    #[test]
    fn seed_is_idempotent_by_name() {
        let store = store_with(vec![Policy::permit("a", "product", "read")]);
        let batch = || vec![Policy::permit("a", "product", "read"), Policy::permit("b", "product", "create")];

        assert_eq!(store.seed(batch()).unwrap(), 1);
        assert_eq!(store.seed(batch()).unwrap(), 0);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn readers_keep_their_snapshot_across_writes() {
        let store = store_with(vec![Policy::permit("a", "product", "read")]);
        let before = store.snapshot().unwrap();
        store.insert(Policy::permit("b", "product", "read")).unwrap();

        assert_eq!(before.policies().len(), 1);
        assert_eq!(store.snapshot().unwrap().policies().len(), 2);
    }
}
