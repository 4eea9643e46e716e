//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects have no identity and are immutable: two instances with the
/// same attributes are equal, and "changing" one means building a new value.
/// Money amounts are the typical example; products are entities.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
