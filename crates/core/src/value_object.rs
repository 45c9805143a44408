//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects are immutable and compared by their attribute values. An
/// access decision or a resource attribute bag is a value object: two decisions
/// with the same outcome, reason and policy are interchangeable.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
