use serde::{Deserialize, Serialize};

use stockgate_auth::Role;
use stockgate_core::{DomainError, Entity, PolicyId};

/// Subject sentinel matching every authenticated principal.
pub const SUBJECT_ANY: &str = "ANY";
/// Subject sentinel that also matches every authenticated principal.
///
/// Seed policies list `USER` for "any signed-in user", so it is treated as a
/// wildcard rather than a role tag.
pub const SUBJECT_USER: &str = "USER";
/// Action sentinel for "every action on this resource".
pub const ACTION_ANY: &str = "any";

/// Outcome a policy produces when it applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Effect {
    Permit,
    Deny,
}

/// An authorization rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Policy {
    /// Assigned by the store; JSON policy sets may omit it.
    #[serde(default)]
    pub id: PolicyId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub resource: String,
    pub action: String,
    pub effect: Effect,
    /// Role tags. Empty means every authenticated principal.
    #[serde(default)]
    pub subjects: Vec<String>,
    /// Predicates that must all hold. Empty means unconditionally satisfied.
    #[serde(default)]
    pub conditions: Vec<String>,
}

impl Policy {
    pub fn new(
        name: impl Into<String>,
        resource: impl Into<String>,
        action: impl Into<String>,
        effect: Effect,
    ) -> Self {
        Self {
            id: PolicyId::new(),
            name: name.into(),
            description: String::new(),
            resource: resource.into(),
            action: action.into(),
            effect,
            subjects: Vec::new(),
            conditions: Vec::new(),
        }
    }

    pub fn permit(name: impl Into<String>, resource: impl Into<String>, action: impl Into<String>) -> Self {
        Self::new(name, resource, action, Effect::Permit)
    }

    pub fn deny(name: impl Into<String>, resource: impl Into<String>, action: impl Into<String>) -> Self {
        Self::new(name, resource, action, Effect::Deny)
    }

    pub fn with_id(mut self, id: PolicyId) -> Self {
        self.id = id;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_subjects<I, T>(mut self, subjects: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.subjects = subjects.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_conditions<I, T>(mut self, conditions: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.conditions = conditions.into_iter().map(Into::into).collect();
        self
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("policy name must not be empty"));
        }
        if self.resource.trim().is_empty() {
            return Err(DomainError::validation(format!(
                "policy '{}' has an empty resource",
                self.name
            )));
        }
        if self.action.trim().is_empty() {
            return Err(DomainError::validation(format!(
                "policy '{}' has an empty action",
                self.name
            )));
        }
        Ok(())
    }

    /// Role match is exact; the `ANY`/`USER` sentinels match every role.
    pub fn subject_matches(&self, role: &Role) -> bool {
        self.subjects.is_empty()
            || self
                .subjects
                .iter()
                .any(|s| s == role.as_str() || s == SUBJECT_ANY || s == SUBJECT_USER)
    }

    pub fn targets_any_action(&self) -> bool {
        self.action == ACTION_ANY
    }
}

impl Entity for Policy {
    type Id = PolicyId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_subjects_match_everyone() {
        let p = Policy::permit("open", "product", "read");
        assert!(p.subject_matches(&Role::USER));
        assert!(p.subject_matches(&Role::new("AUDITOR")));
    }

    #[test]
    fn sentinels_match_any_role() {
        let any = Policy::permit("a", "product", "read").with_subjects(["ANY"]);
        let user = Policy::permit("u", "product", "read").with_subjects(["USER"]);
        for role in [Role::ADMIN, Role::new("AUDITOR"), Role::new("guest")] {
            assert!(any.subject_matches(&role));
            assert!(user.subject_matches(&role));
        }
    }

    #[test]
    fn role_subjects_match_exactly() {
        let p = Policy::permit("admins", "product", "delete").with_subjects(["ADMIN"]);
        assert!(p.subject_matches(&Role::ADMIN));
        assert!(!p.subject_matches(&Role::new("admin")));
        assert!(!p.subject_matches(&Role::new("AUDITOR")));
    }

    #[test]
    fn validation_rejects_blank_fields() {
        assert!(Policy::permit(" ", "product", "read").validate().is_err());
        assert!(Policy::permit("p", "", "read").validate().is_err());
        assert!(Policy::permit("p", "product", "").validate().is_err());
        assert!(Policy::permit("p", "product", "read").validate().is_ok());
    }

    #[test]
    fn deserializes_without_id_or_lists() {
        let json = r#"{"name":"p","resource":"product","action":"read","effect":"PERMIT"}"#;
        let p: Policy = serde_json::from_str(json).unwrap();
        assert_eq!(p.effect, Effect::Permit);
        assert!(p.subjects.is_empty());
        assert!(p.conditions.is_empty());
        assert!(p.description.is_empty());
    }
}
