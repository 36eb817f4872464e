use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::attr::AttrSet;
use crate::tag::TypeRef;

// -----------------------------------------------------------------------------
// CreatorArgs

/// The argument pack handed to a creator thunk.
///
/// One slot per declared parameter, in declaration order. A slot is `None`
/// when the wire carried no value for that parameter; thunks substitute a
/// default in that case.
pub struct CreatorArgs {
    values: Vec<Option<Box<dyn Any>>>,
}

impl CreatorArgs {
    /// Packs converted argument values. Used by the engine.
    pub fn new(values: Vec<Option<Box<dyn Any>>>) -> Self {
        Self { values }
    }

    /// Takes the argument at `index` out of the pack.
    ///
    /// Returns `None` when the slot is absent, already taken, or holds a
    /// value of a different type; a mistyped value is left in place.
    pub fn take<T: Any>(&mut self, index: usize) -> Option<T> {
        let slot = self.values.get_mut(index)?;
        let boxed = slot.take()?;
        match boxed.downcast::<T>() {
            Ok(value) => Some(*value),
            Err(boxed) => {
                *slot = Some(boxed);
                None
            }
        }
    }

    /// Number of argument slots.
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if the pack has no slots.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

// -----------------------------------------------------------------------------
// ParamDecl

/// Declaration of one creator parameter.
///
/// The name is optional because source parameter names are not always
/// recorded; the engine then falls back to `Rename` attributes or reports a
/// configuration error.
#[derive(Debug)]
pub struct ParamDecl {
    name: Option<&'static str>,
    ty: TypeRef,
    attrs: AttrSet,
}

impl ParamDecl {
    /// A parameter with a recorded source name.
    pub fn named(name: &'static str, ty: TypeRef) -> Self {
        Self {
            name: Some(name),
            ty,
            attrs: AttrSet::new(),
        }
    }

    /// A parameter without a recorded name.
    pub fn unnamed(ty: TypeRef) -> Self {
        Self {
            name: None,
            ty,
            attrs: AttrSet::new(),
        }
    }

    /// Replaces the attribute set.
    pub fn with_attrs(mut self, attrs: AttrSet) -> Self {
        self.attrs = attrs;
        self
    }

    #[inline]
    pub fn name(&self) -> Option<&'static str> {
        self.name
    }

    #[inline]
    pub fn ty(&self) -> &TypeRef {
        &self.ty
    }

    #[inline]
    pub fn attrs(&self) -> &AttrSet {
        &self.attrs
    }
}

// -----------------------------------------------------------------------------
// CreatorDecl

/// How a creator produces instances.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CreatorKind {
    /// A constructor of the type itself.
    Constructor,
    /// A static factory function returning the type.
    Factory,
}

/// Erased creator invocation.
pub type NewFn = Arc<dyn Fn(CreatorArgs) -> Box<dyn Any> + Send + Sync>;

/// Declaration of a way to construct the bean.
///
/// # Example
///
/// ```
/// use bindery_decl::{CreatorArgs, CreatorDecl, CreatorKind, ParamDecl, TypeRef};
///
/// struct Span {
///     from: u32,
///     to: u32,
/// }
///
/// let creator = CreatorDecl::constructor(
///     vec![
///         ParamDecl::named("from", TypeRef::of::<u32>()),
///         ParamDecl::named("to", TypeRef::of::<u32>()),
///     ],
///     |mut args: CreatorArgs| Span {
///         from: args.take(0).unwrap_or_default(),
///         to: args.take(1).unwrap_or_default(),
///     },
/// );
/// assert_eq!(creator.kind(), CreatorKind::Constructor);
/// assert_eq!(creator.params().len(), 2);
/// ```
pub struct CreatorDecl {
    kind: CreatorKind,
    params: Box<[ParamDecl]>,
    attrs: AttrSet,
    invoke: NewFn,
}

impl CreatorDecl {
    fn erased<B, F>(kind: CreatorKind, params: Vec<ParamDecl>, make: F) -> Self
    where
        B: Any,
        F: Fn(CreatorArgs) -> B + Send + Sync + 'static,
    {
        Self {
            kind,
            params: params.into_boxed_slice(),
            attrs: AttrSet::new(),
            invoke: Arc::new(move |args| {
                let bean: Box<dyn Any> = Box::new(make(args));
                bean
            }),
        }
    }

    /// Declares a no-argument constructor.
    pub fn no_args<B, F>(make: F) -> Self
    where
        B: Any,
        F: Fn() -> B + Send + Sync + 'static,
    {
        Self::erased(CreatorKind::Constructor, Vec::new(), move |_| make())
    }

    /// Declares a constructor taking the given parameters.
    pub fn constructor<B, F>(params: Vec<ParamDecl>, make: F) -> Self
    where
        B: Any,
        F: Fn(CreatorArgs) -> B + Send + Sync + 'static,
    {
        Self::erased(CreatorKind::Constructor, params, make)
    }

    /// Declares a static factory taking the given parameters.
    pub fn factory<B, F>(params: Vec<ParamDecl>, make: F) -> Self
    where
        B: Any,
        F: Fn(CreatorArgs) -> B + Send + Sync + 'static,
    {
        Self::erased(CreatorKind::Factory, params, make)
    }

    /// Replaces the attribute set.
    pub fn with_attrs(mut self, attrs: AttrSet) -> Self {
        self.attrs = attrs;
        self
    }

    #[inline]
    pub fn kind(&self) -> CreatorKind {
        self.kind
    }

    #[inline]
    pub fn params(&self) -> &[ParamDecl] {
        &self.params
    }

    #[inline]
    pub fn attrs(&self) -> &AttrSet {
        &self.attrs
    }

    /// Invokes the creator with a converted argument pack.
    pub fn invoke(&self, args: CreatorArgs) -> Box<dyn Any> {
        (self.invoke)(args)
    }
}

impl fmt::Debug for CreatorDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CreatorDecl")
            .field("kind", &self.kind)
            .field("params", &self.params)
            .field("attrs", &self.attrs)
            .finish_non_exhaustive()
    }
}

// -----------------------------------------------------------------------------
// Tests
