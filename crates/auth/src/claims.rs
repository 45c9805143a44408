use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use stockgate_core::PrincipalId;

use crate::{Permission, Principal, Role};

/// Identity claims model (transport-agnostic).
///
/// This is the minimal set of claims the core expects once a token has been
/// decoded and its signature verified upstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityClaims {
    /// Subject / principal identifier.
    pub sub: PrincipalId,

    pub username: String,

    pub role: Role,

    #[serde(default)]
    pub permissions: Vec<Permission>,

    pub issued_at: DateTime<Utc>,

    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenValidationError {
    #[error("token has expired")]
    Expired,

    #[error("token not yet valid (issued_at is in the future)")]
    NotYetValid,

    #[error("invalid token time window (expires_at <= issued_at)")]
    InvalidTimeWindow,

    #[error("token has an empty username")]
    MissingUsername,
}

/// Deterministically validate identity claims and resolve the principal.
///
/// Validates the *claims* only. Signature verification / decoding happens
/// before this is called.
pub fn validate_claims(
    claims: &IdentityClaims,
    now: DateTime<Utc>,
) -> Result<Principal, TokenValidationError> {
    if claims.expires_at <= claims.issued_at {
        return Err(TokenValidationError::InvalidTimeWindow);
    }
    if now < claims.issued_at {
        return Err(TokenValidationError::NotYetValid);
    }
    if now >= claims.expires_at {
        return Err(TokenValidationError::Expired);
    }
    if claims.username.trim().is_empty() {
        return Err(TokenValidationError::MissingUsername);
    }

    Ok(Principal {
        id: claims.sub,
        username: claims.username.clone(),
        role: claims.role.clone(),
        permissions: claims.permissions.clone(),
    })
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn claims(issued_at: DateTime<Utc>, ttl: Duration) -> IdentityClaims {
        IdentityClaims {
            sub: PrincipalId::new(),
            username: "alice".to_string(),
            role: Role::USER,
            permissions: vec![Permission::of("products", "read")],
            issued_at,
            expires_at: issued_at + ttl,
        }
    }

    #[test]
    fn valid_claims_resolve_principal() {
        let now = Utc::now();
        let c = claims(now - Duration::minutes(1), Duration::minutes(15));

        let principal = validate_claims(&c, now).unwrap();
        assert_eq!(principal.id, c.sub);
        assert_eq!(principal.username, "alice");
        assert!(principal.has_permission("products:read"));
    }

    #[test]
    fn expired_claims_rejected() {
        let now = Utc::now();
        let c = claims(now - Duration::hours(2), Duration::hours(1));
        assert_eq!(validate_claims(&c, now), Err(TokenValidationError::Expired));
    }

    #[test]
    fn future_claims_rejected() {
        let now = Utc::now();
        let c = claims(now + Duration::minutes(5), Duration::hours(1));
        assert_eq!(validate_claims(&c, now), Err(TokenValidationError::NotYetValid));
    }

    #[test]
    fn inverted_window_rejected() {
        let now = Utc::now();
        let c = claims(now, Duration::zero());
        assert_eq!(
            validate_claims(&c, now),
            Err(TokenValidationError::InvalidTimeWindow)
        );
    }

    #[test]
    fn blank_username_rejected() {
        let now = Utc::now();
        let mut c = claims(now - Duration::minutes(1), Duration::minutes(15));
        c.username = "  ".to_string();
        assert_eq!(
            validate_claims(&c, now),
            Err(TokenValidationError::MissingUsername)
        );
    }
}
