//! `stockgate-core` — foundation building blocks for the authorization core.
//!
//! This crate contains **pure** primitives (no IO, no storage, no transport).

pub mod entity;
pub mod error;
pub mod id;
pub mod value_object;

pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{AuditRecordId, PolicyId, PrincipalId};
pub use value_object::ValueObject;
