use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::attr::AttrSet;
use crate::tag::TypeRef;

// -----------------------------------------------------------------------------
// Erased access thunks

/// Erased property read: borrows the bean, returns a boxed copy of the
/// value. `None` means the bean was not the declaring type.
pub type GetFn = Arc<dyn Fn(&dyn Any) -> Option<Box<dyn Any>> + Send + Sync>;

/// Erased property write. Returns `false` when the bean or the value was
/// not of the declared type; the value is dropped in that case.
pub type SetFn = Arc<dyn Fn(&mut dyn Any, Box<dyn Any>) -> bool + Send + Sync>;

fn erase_get<B: Any, T: Any>(read: fn(&B) -> T) -> GetFn {
    Arc::new(move |bean: &dyn Any| {
        let bean = bean.downcast_ref::<B>()?;
        let value: Box<dyn Any> = Box::new(read(bean));
        Some(value)
    })
}

fn erase_set<B: Any, T: Any>(write: fn(&mut B, T)) -> SetFn {
    Arc::new(move |bean: &mut dyn Any, value: Box<dyn Any>| {
        let Some(bean) = bean.downcast_mut::<B>() else {
            return false;
        };
        let Ok(value) = value.downcast::<T>() else {
            return false;
        };
        write(bean, *value);
        true
    })
}

// -----------------------------------------------------------------------------
// Vis

/// Declared visibility of a member.
///
/// The engine only distinguishes public from everything else; any
/// non-public reach collapses to [`Vis::Private`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Vis {
    Public,
    Private,
}

// -----------------------------------------------------------------------------
// FieldDecl

/// Declaration of a stored field.
///
/// Carries the declared name, type reference, visibility and
/// static/transient flags, attributes, and erased access thunks. The typed
/// constructors erase plain `fn(&B) -> T` / `fn(&mut B, T)` accessors, so a
/// declaration site never spells out the erasure.
///
/// # Example
///
/// ```
/// use bindery_decl::{FieldDecl, TypeRef, Vis};
///
/// struct Door {
///     open: bool,
/// }
///
/// let field = FieldDecl::new(
///     "open",
///     TypeRef::of::<bool>(),
///     |d: &Door| d.open,
///     |d: &mut Door, v| d.open = v,
/// );
/// assert_eq!(field.name(), "open");
/// assert_eq!(field.vis(), Vis::Public);
/// ```
pub struct FieldDecl {
    name: &'static str,
    ty: TypeRef,
    vis: Vis,
    is_static: bool,
    transient: bool,
    attrs: AttrSet,
    get: GetFn,
    set: Option<SetFn>,
}

impl FieldDecl {
    /// Declares a readable and writable field. Defaults to public,
    /// non-static, non-transient, with no attributes.
    pub fn new<B: Any, T: Any>(
        name: &'static str,
        ty: TypeRef,
        read: fn(&B) -> T,
        write: fn(&mut B, T),
    ) -> Self {
        Self {
            name,
            ty,
            vis: Vis::Public,
            is_static: false,
            transient: false,
            attrs: AttrSet::new(),
            get: erase_get(read),
            set: Some(erase_set(write)),
        }
    }

    /// Declares a field that can only be read, e.g. one set solely by the
    /// creator.
    pub fn read_only<B: Any, T: Any>(name: &'static str, ty: TypeRef, read: fn(&B) -> T) -> Self {
        Self {
            name,
            ty,
            vis: Vis::Public,
            is_static: false,
            transient: false,
            attrs: AttrSet::new(),
            get: erase_get(read),
            set: None,
        }
    }

    /// Sets the declared visibility.
    pub fn with_vis(mut self, vis: Vis) -> Self {
        self.vis = vis;
        self
    }

    /// Marks the field static. Static fields are excluded from both facets
    /// unless an `Include` marker forces them in.
    pub fn with_static(mut self) -> Self {
        self.is_static = true;
        self
    }

    /// Marks the field transient, excluding it from both facets unless an
    /// `Include` marker forces it in.
    pub fn with_transient(mut self) -> Self {
        self.transient = true;
        self
    }

    /// Replaces the attribute set.
    pub fn with_attrs(mut self, attrs: AttrSet) -> Self {
        self.attrs = attrs;
        self
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[inline]
    pub fn ty(&self) -> &TypeRef {
        &self.ty
    }

    #[inline]
    pub fn vis(&self) -> Vis {
        self.vis
    }

    #[inline]
    pub fn is_static(&self) -> bool {
        self.is_static
    }

    #[inline]
    pub fn is_transient(&self) -> bool {
        self.transient
    }

    #[inline]
    pub fn attrs(&self) -> &AttrSet {
        &self.attrs
    }

    /// The erased read thunk.
    #[inline]
    pub fn get_fn(&self) -> &GetFn {
        &self.get
    }

    /// The erased write thunk, absent for read-only fields.
    #[inline]
    pub fn set_fn(&self) -> Option<&SetFn> {
        self.set.as_ref()
    }
}

impl fmt::Debug for FieldDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDecl")
            .field("name", &self.name)
            .field("ty", &self.ty)
            .field("vis", &self.vis)
            .field("is_static", &self.is_static)
            .field("transient", &self.transient)
            .field("attrs", &self.attrs)
            .finish_non_exhaustive()
    }
}

// -----------------------------------------------------------------------------
// MethodDecl

/// Which side of a property a method serves.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MethodKind {
    Getter,
    Setter,
}

/// Declaration of a property-shaped method.
///
/// A method is a getter or a setter by construction; the declared name is
/// the raw method identifier (`get_b`, `set_b`, ...) and the type reference
/// describes the property value, not the method signature.
pub struct MethodDecl {
    name: &'static str,
    kind: MethodKind,
    ty: TypeRef,
    vis: Vis,
    is_static: bool,
    attrs: AttrSet,
    get: Option<GetFn>,
    set: Option<SetFn>,
}

impl MethodDecl {
    /// Declares a getter-shaped method.
    pub fn getter<B: Any, T: Any>(name: &'static str, ty: TypeRef, read: fn(&B) -> T) -> Self {
        Self {
            name,
            kind: MethodKind::Getter,
            ty,
            vis: Vis::Public,
            is_static: false,
            attrs: AttrSet::new(),
            get: Some(erase_get(read)),
            set: None,
        }
    }

    /// Declares a setter-shaped method.
    pub fn setter<B: Any, T: Any>(name: &'static str, ty: TypeRef, write: fn(&mut B, T)) -> Self {
        Self {
            name,
            kind: MethodKind::Setter,
            ty,
            vis: Vis::Public,
            is_static: false,
            attrs: AttrSet::new(),
            get: None,
            set: Some(erase_set(write)),
        }
    }

    /// Sets the declared visibility.
    pub fn with_vis(mut self, vis: Vis) -> Self {
        self.vis = vis;
        self
    }

    /// Marks the method static, excluding it unless forced in.
    pub fn with_static(mut self) -> Self {
        self.is_static = true;
        self
    }

    /// Replaces the attribute set.
    pub fn with_attrs(mut self, attrs: AttrSet) -> Self {
        self.attrs = attrs;
        self
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[inline]
    pub fn kind(&self) -> MethodKind {
        self.kind
    }

    #[inline]
    pub fn ty(&self) -> &TypeRef {
        &self.ty
    }

    #[inline]
    pub fn vis(&self) -> Vis {
        self.vis
    }

    #[inline]
    pub fn is_static(&self) -> bool {
        self.is_static
    }

    #[inline]
    pub fn attrs(&self) -> &AttrSet {
        &self.attrs
    }

    /// The erased read thunk, present for getters.
    #[inline]
    pub fn get_fn(&self) -> Option<&GetFn> {
        self.get.as_ref()
    }

    /// The erased write thunk, present for setters.
    #[inline]
    pub fn set_fn(&self) -> Option<&SetFn> {
        self.set.as_ref()
    }
}

impl fmt::Debug for MethodDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodDecl")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("ty", &self.ty)
            .field("vis", &self.vis)
            .field("attrs", &self.attrs)
            .finish_non_exhaustive()
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Lamp {
        watts: u32,
    }

    #[test]
    fn field_thunks_roundtrip() {
        let field = FieldDecl::new(
            "watts",
            TypeRef::of::<u32>(),
            |l: &Lamp| l.watts,
            |l: &mut Lamp, v| l.watts = v,
        );

        let mut lamp = Lamp::default();
        let set = field.set_fn().unwrap();
        assert!(set(&mut lamp, Box::new(60u32)));
        assert_eq!(lamp.watts, 60);

        let read = field.get_fn()(&lamp).unwrap();
        assert_eq!(read.downcast_ref::<u32>(), Some(&60));
    }

    #[test]
    fn set_rejects_foreign_bean_and_value() {
        let field = FieldDecl::new(
            "watts",
            TypeRef::of::<u32>(),
            |l: &Lamp| l.watts,
            |l: &mut Lamp, v| l.watts = v,
        );
        let set = field.set_fn().unwrap();

        let mut lamp = Lamp::default();
        assert!(!set(&mut lamp, Box::new("sixty")));

        let mut not_a_lamp = String::new();
        assert!(!set(&mut not_a_lamp, Box::new(60u32)));
        assert!(field.get_fn()(&not_a_lamp).is_none());
    }

    #[test]
    fn read_only_field_has_no_setter() {
        let field = FieldDecl::read_only("watts", TypeRef::of::<u32>(), |l: &Lamp| l.watts);
        assert!(field.set_fn().is_none());
        assert!(!field.is_transient());
    }

    #[test]
    fn method_shapes_are_one_sided() {
        let getter = MethodDecl::getter("get_watts", TypeRef::of::<u32>(), |l: &Lamp| l.watts);
        assert_eq!(getter.kind(), MethodKind::Getter);
        assert!(getter.get_fn().is_some());
        assert!(getter.set_fn().is_none());

        let setter =
            MethodDecl::setter("set_watts", TypeRef::of::<u32>(), |l: &mut Lamp, v| {
                l.watts = v;
            });
        assert_eq!(setter.kind(), MethodKind::Setter);
        assert!(setter.get_fn().is_none());
        assert!(setter.set_fn().is_some());
    }
}
