use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Role tag carried by a principal and matched against policy subjects.
///
/// Roles are opaque strings at this layer: the identity source may hand out
/// roles beyond the two well-known ones below.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(Cow<'static, str>);

impl Role {
    /// Administrative role. Also the only role accepted by the narrow audit
    /// read check in [`crate::admin`].
    pub const ADMIN: Role = Role(Cow::Borrowed("ADMIN"));

    /// Regular authenticated user.
    pub const USER: Role = Role(Cow::Borrowed("USER"));

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Case-insensitive comparison against a raw tag. Folds Unicode case,
    /// not just ASCII.
    pub fn eq_ignore_case(&self, other: &str) -> bool {
        if self.0.is_ascii() && other.is_ascii() {
            return self.0.eq_ignore_ascii_case(other);
        }
        self.0
            .chars()
            .flat_map(char::to_lowercase)
            .eq(other.chars().flat_map(char::to_lowercase))
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}
