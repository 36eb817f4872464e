use std::any::Any;

use crate::class::ClassDecl;
use crate::tag::TypeTag;

/// Connects a Rust type to its class declaration.
///
/// Implementations build the declaration once inside a static
/// [`DeclCell`](crate::DeclCell) (or [`GenericDeclCell`](crate::GenericDeclCell)
/// for generic types) and hand out the same `&'static` reference forever.
///
/// # Example
///
/// ```
/// use bindery_decl::{ClassDecl, CreatorDecl, DeclCell, Describe, TypeTag};
///
/// #[derive(Default)]
/// struct Marker;
///
/// impl Describe for Marker {
///     fn class_decl() -> &'static ClassDecl {
///         static CELL: DeclCell = DeclCell::new();
///         CELL.get_or_build(|| {
///             ClassDecl::new(TypeTag::bean::<Marker>())
///                 .with_creator(CreatorDecl::no_args(Marker::default))
///         })
///     }
/// }
///
/// assert!(Marker::tag().is::<Marker>());
/// assert!(std::ptr::eq(Marker::class_decl(), Marker::class_decl()));
/// ```
pub trait Describe: Any {
    /// The type's declaration.
    fn class_decl() -> &'static ClassDecl;

    /// The type's tag, carrying the declaration link.
    fn tag() -> TypeTag
    where
        Self: Sized,
    {
        TypeTag::bean::<Self>()
    }
}
