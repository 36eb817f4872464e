use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::creator::CreatorDecl;
use crate::describe::Describe;
use crate::member::{FieldDecl, MethodDecl};
use crate::tag::{TypeRef, TypeTag};

type CastRefFn = Arc<dyn for<'a> Fn(&'a dyn Any) -> Option<&'a dyn Any> + Send + Sync>;
type CastMutFn = Arc<dyn for<'a> Fn(&'a mut dyn Any) -> Option<&'a mut dyn Any> + Send + Sync>;

// -----------------------------------------------------------------------------
// ParentLink

/// The ancestry edge of a declaration.
///
/// Links the parent's declaration lazily and carries typed upcast
/// projections so the engine can read and write inherited members through a
/// reference to the child. When the parent is generic, `with_args` binds its
/// parameters; the bindings may reference the child's own variables.
///
/// # Example
///
/// ```
/// use bindery_decl::{ClassDecl, CreatorDecl, DeclCell, Describe, ParentLink, TypeTag};
///
/// #[derive(Default)]
/// struct Base {
///     id: u64,
/// }
///
/// struct Derived {
///     base: Base,
/// }
///
/// impl Describe for Base {
///     fn class_decl() -> &'static ClassDecl {
///         static CELL: DeclCell = DeclCell::new();
///         CELL.get_or_build(|| {
///             ClassDecl::new(TypeTag::bean::<Base>())
///                 .with_creator(CreatorDecl::no_args(Base::default))
///         })
///     }
/// }
///
/// let link = ParentLink::new(
///     |d: &Derived| &d.base,
///     |d: &mut Derived| &mut d.base,
/// );
/// assert!(link.decl().ty().is::<Base>());
/// ```
pub struct ParentLink {
    decl: fn() -> &'static ClassDecl,
    cast_ref: CastRefFn,
    cast_mut: CastMutFn,
    args: Box<[(&'static str, TypeRef)]>,
}

impl ParentLink {
    /// Links `P` as the parent, erasing the typed projections.
    pub fn new<C, P>(up_ref: fn(&C) -> &P, up_mut: fn(&mut C) -> &mut P) -> Self
    where
        C: Any,
        P: Describe,
    {
        let cast_ref: CastRefFn = Arc::new(move |bean: &dyn Any| {
            bean.downcast_ref::<C>().map(|c| up_ref(c) as &dyn Any)
        });
        let cast_mut: CastMutFn = Arc::new(move |bean: &mut dyn Any| {
            bean.downcast_mut::<C>().map(|c| up_mut(c) as &mut dyn Any)
        });
        Self {
            decl: P::class_decl,
            cast_ref,
            cast_mut,
            args: Box::new([]),
        }
    }

    /// Binds the parent's generic parameters for this edge.
    pub fn with_args(mut self, args: Vec<(&'static str, TypeRef)>) -> Self {
        self.args = args.into_boxed_slice();
        self
    }

    /// The parent's declaration.
    #[inline]
    pub fn decl(&self) -> &'static ClassDecl {
        (self.decl)()
    }

    /// The parent's type-argument bindings for this edge.
    #[inline]
    pub fn args(&self) -> &[(&'static str, TypeRef)] {
        &self.args
    }

    /// Projects a child reference onto the parent. `None` when the value is
    /// not the declaring child type.
    pub fn cast_ref<'a>(&self, bean: &'a dyn Any) -> Option<&'a dyn Any> {
        (self.cast_ref)(bean)
    }

    /// Mutable counterpart of [`ParentLink::cast_ref`].
    pub fn cast_mut<'a>(&self, bean: &'a mut dyn Any) -> Option<&'a mut dyn Any> {
        (self.cast_mut)(bean)
    }
}

impl fmt::Debug for ParentLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParentLink")
            .field("parent", &self.decl().ty())
            .field("args", &self.args)
            .finish_non_exhaustive()
    }
}

// -----------------------------------------------------------------------------
// ClassDecl

/// The complete declaration of one type (or one generic instantiation).
///
/// Construction is chainable and cannot fail; conflicts such as ambiguous
/// creators or colliding property names are detected by the engine when the
/// descriptor is built, so a bad declaration never poisons unrelated types.
pub struct ClassDecl {
    ty: TypeTag,
    params: Box<[&'static str]>,
    args: Vec<(&'static str, TypeTag)>,
    fields: Vec<FieldDecl>,
    methods: Vec<MethodDecl>,
    creators: Vec<CreatorDecl>,
    parent: Option<ParentLink>,
}

impl ClassDecl {
    /// Starts an empty declaration for the tagged type.
    pub fn new(ty: TypeTag) -> Self {
        Self {
            ty,
            params: Box::new([]),
            args: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            creators: Vec::new(),
            parent: None,
        }
    }

    /// Declares the type's generic parameter names.
    pub fn with_type_params(mut self, params: Vec<&'static str>) -> Self {
        self.params = params.into_boxed_slice();
        self
    }

    /// Binds one generic parameter for this instantiation.
    pub fn with_type_arg(mut self, name: &'static str, tag: TypeTag) -> Self {
        self.args.push((name, tag));
        self
    }

    /// Adds a field declaration.
    pub fn with_field(mut self, field: FieldDecl) -> Self {
        self.fields.push(field);
        self
    }

    /// Adds a property-shaped method declaration.
    pub fn with_method(mut self, method: MethodDecl) -> Self {
        self.methods.push(method);
        self
    }

    /// Adds a creator declaration.
    pub fn with_creator(mut self, creator: CreatorDecl) -> Self {
        self.creators.push(creator);
        self
    }

    /// Sets the parent link.
    pub fn with_parent(mut self, parent: ParentLink) -> Self {
        self.parent = Some(parent);
        self
    }

    /// The declared type's tag.
    #[inline]
    pub fn ty(&self) -> &TypeTag {
        &self.ty
    }

    /// Generic parameter names, empty for non-generic types.
    #[inline]
    pub fn type_params(&self) -> &[&'static str] {
        &self.params
    }

    /// This instantiation's type-argument bindings.
    #[inline]
    pub fn type_args(&self) -> &[(&'static str, TypeTag)] {
        &self.args
    }

    /// Looks up one type-argument binding by parameter name.
    pub fn type_arg(&self, name: &str) -> Option<TypeTag> {
        self.args
            .iter()
            .find(|(param, _)| *param == name)
            .map(|(_, tag)| *tag)
    }

    #[inline]
    pub fn fields(&self) -> &[FieldDecl] {
        &self.fields
    }

    #[inline]
    pub fn methods(&self) -> &[MethodDecl] {
        &self.methods
    }

    #[inline]
    pub fn creators(&self) -> &[CreatorDecl] {
        &self.creators
    }

    #[inline]
    pub fn parent(&self) -> Option<&ParentLink> {
        self.parent.as_ref()
    }
}

impl fmt::Debug for ClassDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassDecl")
            .field("ty", &self.ty)
            .field("params", &self.params)
            .field("fields", &self.fields)
            .field("methods", &self.methods)
            .field("creators", &self.creators)
            .field("parent", &self.parent)
            .finish()
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::DeclCell;
    use crate::member::Vis;

    #[derive(Default)]
    struct Engine {
        horsepower: u32,
    }

    struct Car {
        engine: Engine,
        doors: u8,
    }

    impl Describe for Engine {
        fn class_decl() -> &'static ClassDecl {
            static CELL: DeclCell = DeclCell::new();
            CELL.get_or_build(|| {
                ClassDecl::new(TypeTag::bean::<Engine>())
                    .with_field(FieldDecl::new(
                        "horsepower",
                        TypeRef::of::<u32>(),
                        |e: &Engine| e.horsepower,
                        |e: &mut Engine, v| e.horsepower = v,
                    ))
                    .with_creator(CreatorDecl::no_args(Engine::default))
            })
        }
    }

    #[test]
    fn builder_accumulates_members() {
        let decl = ClassDecl::new(TypeTag::of::<Car>())
            .with_field(FieldDecl::new(
                "doors",
                TypeRef::of::<u8>(),
                |c: &Car| c.doors,
                |c: &mut Car, v| c.doors = v,
            ))
            .with_method(
                MethodDecl::getter("get_doors", TypeRef::of::<u8>(), |c: &Car| c.doors)
                    .with_vis(Vis::Public),
            );

        assert_eq!(decl.fields().len(), 1);
        assert_eq!(decl.methods().len(), 1);
        assert!(decl.creators().is_empty());
        assert!(decl.parent().is_none());
    }

    #[test]
    fn type_args_resolve_by_name() {
        let decl = ClassDecl::new(TypeTag::of::<Car>())
            .with_type_params(vec!["T"])
            .with_type_arg("T", TypeTag::of::<u8>());

        assert!(decl.type_arg("T").is_some_and(|tag| tag.is::<u8>()));
        assert!(decl.type_arg("E").is_none());
    }

    #[test]
    fn parent_link_projects_through_any() {
        let link = ParentLink::new(|c: &Car| &c.engine, |c: &mut Car| &mut c.engine);

        let mut car = Car {
            engine: Engine { horsepower: 90 },
            doors: 5,
        };

        let projected = link.cast_ref(&car).unwrap();
        assert_eq!(
            projected.downcast_ref::<Engine>().map(|e| e.horsepower),
            Some(90)
        );

        let projected = link.cast_mut(&mut car).unwrap();
        projected.downcast_mut::<Engine>().unwrap().horsepower = 120;
        assert_eq!(car.engine.horsepower, 120);

        let not_a_car = 5u8;
        assert!(link.cast_ref(&not_a_car).is_none());
    }
}
