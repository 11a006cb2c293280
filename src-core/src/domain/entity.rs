//! Domain Layer - Core Entity Trait
//!
//! Anything the reconciler keys by identifier.

/// Core trait for identifiable rows
pub trait Entity: Clone {
    /// The type of the entity's unique identifier
    type Id: Clone + Eq + std::hash::Hash + std::fmt::Debug;

    /// Returns the entity's unique identifier
    fn id(&self) -> &Self::Id;
}
