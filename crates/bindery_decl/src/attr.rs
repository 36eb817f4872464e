use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;

// -----------------------------------------------------------------------------
// AttrValue

/// A value storable in an [`AttrSet`].
///
/// Implemented for every `'static` type that is `Clone + Debug + Send +
/// Sync`, so plain marker structs work without ceremony.
pub trait AttrValue: Any + Send + Sync + fmt::Debug {
    /// Upcast for downcasting through [`Any`].
    fn as_any(&self) -> &dyn Any;

    /// Clones the value behind the erasure.
    fn clone_value(&self) -> Box<dyn AttrValue>;
}

impl<T> AttrValue for T
where
    T: Any + Send + Sync + fmt::Debug + Clone,
{
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn clone_value(&self) -> Box<dyn AttrValue> {
        Box::new(self.clone())
    }
}

// -----------------------------------------------------------------------------
// AttrSet

/// A collection of attributes attached to a member, creator parameter, or
/// creator.
///
/// Attributes are stored by their `TypeId`, so there is one value per
/// attribute type; later insertions overwrite earlier ones. The engine
/// carries user-defined attribute types through property merging untouched,
/// next to the built-in markers.
///
/// # Example
///
/// ```
/// use bindery_decl::{AttrSet, Rename};
///
/// #[derive(Clone, Copy, Debug, PartialEq)]
/// struct SortKey(u8);
///
/// let attrs = AttrSet::new().with(Rename("id")).with(SortKey(3));
/// assert_eq!(attrs.get::<Rename>(), Some(&Rename("id")));
/// assert_eq!(attrs.get::<SortKey>(), Some(&SortKey(3)));
/// assert!(!attrs.has::<u32>());
/// ```
#[derive(Default)]
pub struct AttrSet {
    table: HashMap<TypeId, Box<dyn AttrValue>>,
}

impl AttrSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an attribute, consuming and returning the set.
    #[inline]
    pub fn with<A: AttrValue>(mut self, attr: A) -> Self {
        self.insert(attr);
        self
    }

    /// Adds an attribute in place.
    pub fn insert<A: AttrValue>(&mut self, attr: A) {
        self.table.insert(TypeId::of::<A>(), Box::new(attr));
    }

    /// Returns the attribute of type `A`, if present.
    pub fn get<A: AttrValue>(&self) -> Option<&A> {
        self.table
            .get(&TypeId::of::<A>())
            .and_then(|value| (**value).as_any().downcast_ref())
    }

    /// Returns `true` if an attribute of type `A` is present.
    #[inline]
    pub fn has<A: AttrValue>(&self) -> bool {
        self.table.contains_key(&TypeId::of::<A>())
    }

    /// Returns an iterator over the stored values.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &dyn AttrValue> {
        self.table.values().map(|value| &**value)
    }

    /// Returns the number of stored attributes.
    #[inline]
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Returns `true` if no attributes are stored.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Unions `self` over `base`: every attribute of both sets is present
    /// in the result, and where both carry the same attribute type the
    /// value from `self` wins.
    pub fn merged_over(&self, base: &AttrSet) -> AttrSet {
        let mut table: HashMap<TypeId, Box<dyn AttrValue>> = base
            .table
            .iter()
            .map(|(id, value)| (*id, (**value).clone_value()))
            .collect();
        for (id, value) in &self.table {
            table.insert(*id, (**value).clone_value());
        }
        AttrSet { table }
    }
}

impl Clone for AttrSet {
    fn clone(&self) -> Self {
        Self {
            table: self
                .table
                .iter()
                .map(|(id, value)| (*id, (**value).clone_value()))
                .collect(),
        }
    }
}

impl fmt::Debug for AttrSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.table.values()).finish()
    }
}

// -----------------------------------------------------------------------------
// Built-in markers

/// Gives a member or creator parameter an explicit logical name, overriding
/// every convention.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rename(pub &'static str);

/// Forces a member into the selected facets even when visibility, transience,
/// or staticness would exclude it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Include {
    pub serialize: bool,
    pub deserialize: bool,
}

impl Include {
    /// Force membership in both facets.
    pub const fn both() -> Self {
        Self {
            serialize: true,
            deserialize: true,
        }
    }

    /// Force membership in the serialization facet only.
    pub const fn serialize_only() -> Self {
        Self {
            serialize: true,
            deserialize: false,
        }
    }

    /// Force membership in the deserialization facet only.
    pub const fn deserialize_only() -> Self {
        Self {
            serialize: false,
            deserialize: true,
        }
    }
}

/// Removes a member from the selected facets.
///
/// Claiming a facet that an [`Include`] on the same member also claims is a
/// configuration error reported when the type's descriptor is built.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Exclude {
    pub serialize: bool,
    pub deserialize: bool,
}

impl Exclude {
    /// Remove from both facets.
    pub const fn both() -> Self {
        Self {
            serialize: true,
            deserialize: true,
        }
    }

    /// Remove from the serialization facet only.
    pub const fn serialize_only() -> Self {
        Self {
            serialize: true,
            deserialize: false,
        }
    }

    /// Remove from the deserialization facet only.
    pub const fn deserialize_only() -> Self {
        Self {
            serialize: false,
            deserialize: true,
        }
    }
}

/// Designates a creator as the one the engine must use. At most one creator
/// per type may carry this marker.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UseCreator;

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq)]
    struct Weight(u32);

    #[derive(Clone, Copy, Debug, PartialEq)]
    struct Hidden;

    #[test]
    fn typed_storage_and_lookup() {
        let attrs = AttrSet::new().with(Weight(7)).with(Hidden);
        assert_eq!(attrs.len(), 2);
        assert_eq!(attrs.get::<Weight>(), Some(&Weight(7)));
        assert!(attrs.has::<Hidden>());
        assert!(attrs.get::<Rename>().is_none());
    }

    #[test]
    fn later_insertion_overwrites() {
        let attrs = AttrSet::new().with(Weight(1)).with(Weight(2));
        assert_eq!(attrs.len(), 1);
        assert_eq!(attrs.get::<Weight>(), Some(&Weight(2)));
    }

    #[test]
    fn merged_over_prefers_self() {
        let field = AttrSet::new().with(Weight(1)).with(Hidden);
        let method = AttrSet::new().with(Weight(9));

        let merged = method.merged_over(&field);
        assert_eq!(merged.get::<Weight>(), Some(&Weight(9)));
        assert!(merged.has::<Hidden>());
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn clones_own_independent_typed_entries() {
        let attrs = AttrSet::new().with(Weight(3)).with(Rename("w"));
        let copy = attrs.clone();
        drop(attrs);

        assert_eq!(copy.len(), 2);
        assert_eq!(copy.get::<Weight>(), Some(&Weight(3)));
        assert_eq!(copy.get::<Rename>(), Some(&Rename("w")));
    }

    #[test]
    fn marker_constructors_cover_single_facets() {
        assert!(Include::serialize_only().serialize);
        assert!(!Include::serialize_only().deserialize);
        assert!(Exclude::deserialize_only().deserialize);
        assert!(!Exclude::deserialize_only().serialize);
    }
}
