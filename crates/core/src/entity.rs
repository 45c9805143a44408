//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// Policies and audit records are entities: two values with the same id are
/// the same record, even if other fields differ between snapshots.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;

    /// Identity comparison, ignoring every other field.
    fn same_identity(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}
