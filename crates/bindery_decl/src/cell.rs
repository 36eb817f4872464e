//! Static storage for class declarations.
//!
//! [`DeclCell`] backs non-generic [`Describe`](crate::Describe)
//! implementations with a plain `OnceLock`.
//!
//! [`GenericDeclCell`] serves generic types: the `static CELL` inside a
//! generic `class_decl` body is shared by every instantiation, so the cell
//! keys declarations by `TypeId` and leaks exactly one `ClassDecl` per
//! instantiation to obtain the `&'static` lifetime.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{OnceLock, PoisonError, RwLock};

use crate::class::ClassDecl;

// -----------------------------------------------------------------------------
// DeclCell

/// Storage for the declaration of one non-generic type.
pub struct DeclCell(OnceLock<ClassDecl>);

impl DeclCell {
    /// Creates an empty cell.
    #[inline]
    pub const fn new() -> Self {
        Self(OnceLock::new())
    }

    /// Returns the stored declaration, building it on first use.
    #[inline]
    pub fn get_or_build<F>(&'static self, build: F) -> &'static ClassDecl
    where
        F: FnOnce() -> ClassDecl,
    {
        self.0.get_or_init(build)
    }
}

// -----------------------------------------------------------------------------
// GenericDeclCell

/// Storage for the declarations of a generic type, one per instantiation.
///
/// # Example
///
/// ```
/// use bindery_decl::{ClassDecl, CreatorDecl, Describe, GenericDeclCell, TypeRef, TypeTag};
/// use std::any::Any;
///
/// #[derive(Default)]
/// struct Holder<T> {
///     value: T,
/// }
///
/// impl<T: Any + Default> Describe for Holder<T> {
///     fn class_decl() -> &'static ClassDecl {
///         static CELL: GenericDeclCell = GenericDeclCell::new();
///         CELL.get_or_build::<Self, _>(|| {
///             ClassDecl::new(TypeTag::bean::<Self>())
///                 .with_type_params(vec!["T"])
///                 .with_type_arg("T", TypeTag::of::<T>())
///                 .with_creator(CreatorDecl::no_args(Self::default))
///         })
///     }
/// }
///
/// assert!(Holder::<u8>::class_decl().type_arg("T").is_some_and(|t| t.is::<u8>()));
/// assert!(Holder::<i64>::class_decl().type_arg("T").is_some_and(|t| t.is::<i64>()));
/// ```
pub struct GenericDeclCell(OnceLock<RwLock<HashMap<TypeId, &'static ClassDecl>>>);

impl GenericDeclCell {
    /// Creates an empty cell.
    #[inline]
    pub const fn new() -> Self {
        Self(OnceLock::new())
    }

    /// Returns the declaration stored for instantiation `T`, building it on
    /// first use. Concurrent first builders race; one result is installed
    /// and kept.
    #[inline]
    pub fn get_or_build<T, F>(&'static self, build: F) -> &'static ClassDecl
    where
        T: Any + ?Sized,
        F: FnOnce() -> ClassDecl,
    {
        self.get_or_build_by_id(TypeId::of::<T>(), build)
    }

    fn get_or_build_by_id(
        &'static self,
        id: TypeId,
        build: impl FnOnce() -> ClassDecl,
    ) -> &'static ClassDecl {
        let table = self.0.get_or_init(|| RwLock::new(HashMap::new()));
        if let Some(found) = table
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .copied()
        {
            return found;
        }

        let mut table = table.write().unwrap_or_else(PoisonError::into_inner);
        // One leaked declaration per instantiation, held forever.
        *table.entry(id).or_insert_with(|| Box::leak(Box::new(build())))
    }
}

// -----------------------------------------------------------------------------
// Tests
