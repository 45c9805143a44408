use serde::{Deserialize, Serialize};

use stockgate_core::PrincipalId;

use crate::{Permission, Role};

/// A fully resolved, already-authenticated principal.
///
/// Construction is decoupled from storage and transport: the identity
/// collaborator (token layer, session store) builds it and hands it to the
/// enforcement gateway explicitly for each call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: PrincipalId,
    pub username: String,
    pub role: Role,
    #[serde(default)]
    pub permissions: Vec<Permission>,
}

impl Principal {
    pub fn new(id: PrincipalId, username: impl Into<String>, role: Role) -> Self {
        Self {
            id,
            username: username.into(),
            role,
            permissions: Vec::new(),
        }
    }

    pub fn with_permissions(mut self, permissions: impl IntoIterator<Item = Permission>) -> Self {
        self.permissions.extend(permissions);
        self
    }

    /// Literal membership test on the fine-grained permission list.
    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.iter().any(|p| p.as_str() == permission)
    }
}
