//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects are immutable and defined entirely by their attribute values;
/// two with the same values are equal. [`crate::Money`] is the canonical
/// example here: `Money::from_major(100)` is the same value wherever it
/// appears, while an account with the same balance is still a distinct entity.
///
/// Requiring `Clone + PartialEq + Debug` keeps value objects cheap to copy,
/// comparable by value, and printable in test failures.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
