//! `stockgate-auth` — identity boundary consumed by the authorization core.
//!
//! Decoupled from HTTP and storage: an upstream identity layer resolves the
//! [`Principal`], everything here is pure.

pub mod admin;
pub mod claims;
pub mod permissions;
pub mod principal;
pub mod roles;

pub use admin::is_administrator;
pub use claims::{IdentityClaims, TokenValidationError, validate_claims};
pub use permissions::Permission;
pub use principal::Principal;
pub use roles::Role;
pub use stockgate_core::PrincipalId;
