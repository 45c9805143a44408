//! Narrow administrator check.
//!
//! Audit-history reads must not go through the full policy pipeline: every
//! enforced check writes an audit record, so reading the trust log through it
//! would keep generating more trust log. Those reads use this primitive instead.

use crate::{Principal, Role};

/// True when the principal holds the `ADMIN` role (case-insensitive).
///
/// Pure and side-effect free: no policy lookup, no audit write.
pub fn is_administrator(principal: Option<&Principal>) -> bool {
    principal.is_some_and(|p| p.role.eq_ignore_case(Role::ADMIN.as_str()))
}

#[cfg(test)]
mod tests {
    use stockgate_core::PrincipalId;

    use super::*;

    #[test]
    fn only_admin_role_passes() {
        let admin = Principal::new(PrincipalId::new(), "root", Role::new("admin"));
        let user = Principal::new(PrincipalId::new(), "alice", Role::USER);

        assert!(is_administrator(Some(&admin)));
        assert!(!is_administrator(Some(&user)));
        assert!(!is_administrator(None));
    }
}
