use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::class::ClassDecl;
use crate::describe::Describe;

// -----------------------------------------------------------------------------
// TypeTag

/// Identity of a concrete Rust type as seen by the binding engine.
///
/// A tag carries the [`TypeId`], the full type path from
/// [`std::any::type_name`], and, for bean types, a lazy link to the type's
/// [`ClassDecl`]. Equality and hashing go through the `TypeId` only.
///
/// # Example
///
/// ```
/// use bindery_decl::TypeTag;
///
/// let tag = TypeTag::of::<u32>();
/// assert!(tag.is::<u32>());
/// assert_eq!(tag.name(), "u32");
/// assert!(tag.decl().is_none());
/// ```
#[derive(Clone, Copy)]
pub struct TypeTag {
    id: TypeId,
    path: &'static str,
    decl: Option<fn() -> &'static ClassDecl>,
}

impl TypeTag {
    /// Creates the tag of a plain type with no declaration attached.
    pub fn of<T: Any>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            path: std::any::type_name::<T>(),
            decl: None,
        }
    }

    /// Creates the tag of a bean type, linking its declaration lazily.
    ///
    /// The link is a function pointer; nothing is built until the engine
    /// asks for the declaration.
    pub fn bean<T: Describe>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            path: std::any::type_name::<T>(),
            decl: Some(T::class_decl),
        }
    }

    /// Returns the `TypeId` behind this tag.
    #[inline]
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Returns the full type path, e.g. `alloc::string::String`.
    #[inline]
    pub fn path(&self) -> &'static str {
        self.path
    }

    /// Returns the bare type name without module segments or generic
    /// arguments, e.g. `String`.
    pub fn name(&self) -> &'static str {
        let base = self.path.split('<').next().unwrap_or(self.path);
        base.rsplit("::").next().unwrap_or(base)
    }

    /// Returns the class declaration for bean tags.
    #[inline]
    pub fn decl(&self) -> Option<&'static ClassDecl> {
        self.decl.map(|link| link())
    }

    /// Returns `true` if this tag identifies `T`.
    #[inline]
    pub fn is<T: Any>(&self) -> bool {
        self.id == TypeId::of::<T>()
    }
}

impl PartialEq for TypeTag {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeTag {}

impl Hash for TypeTag {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeTag({})", self.path)
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path)
    }
}

// -----------------------------------------------------------------------------
// TypeRef

/// The declared type of a member: either a concrete tag or a generic
/// variable bound by the declaring type's instantiation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TypeRef {
    /// A concrete type.
    Concrete(TypeTag),
    /// A generic parameter of the declaring type, by name.
    Var(&'static str),
}

impl TypeRef {
    /// A concrete reference to a plain type.
    pub fn of<T: Any>() -> Self {
        TypeRef::Concrete(TypeTag::of::<T>())
    }

    /// A concrete reference to a bean type.
    pub fn bean<T: Describe>() -> Self {
        TypeRef::Concrete(TypeTag::bean::<T>())
    }

    /// A reference to the declaring type's generic parameter `name`.
    pub const fn var(name: &'static str) -> Self {
        TypeRef::Var(name)
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_identity_ignores_path() {
        let a = TypeTag::of::<String>();
        let b = TypeTag::of::<String>();
        assert_eq!(a, b);
        assert!(a.is::<String>());
        assert!(!a.is::<u8>());
    }

    #[test]
    fn short_name_strips_modules_and_generics() {
        assert_eq!(TypeTag::of::<String>().name(), "String");
        assert_eq!(TypeTag::of::<Vec<String>>().name(), "Vec");
        assert_eq!(TypeTag::of::<u32>().name(), "u32");
    }

    #[test]
    fn plain_tags_carry_no_decl() {
        assert!(TypeTag::of::<i64>().decl().is_none());
        match TypeRef::of::<i64>() {
            TypeRef::Concrete(tag) => assert!(tag.is::<i64>()),
            TypeRef::Var(_) => panic!("expected a concrete reference"),
        }
    }
}
