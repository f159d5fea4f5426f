//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// The in-memory store keys its tables by `Entity::Id`, so the identifier
/// must be usable as an ordered map key.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + Ord + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}
