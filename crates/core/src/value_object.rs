//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects are **immutable** and **compared by value** — two with the
/// same attribute values are the same value. `Money { cents: 100 }` is a
/// value object; `Party { id, name }` is an entity.
///
/// To "modify" a value object, create a new one. The `Clone + PartialEq +
/// Debug` bounds keep them copyable, comparable and debuggable like
/// primitives.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
