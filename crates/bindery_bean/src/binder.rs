use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use bindery_decl::Describe;

use crate::convert::{
    BindContext, BoxConvert, Convert, OptionConvert, SeqConvert, SerdeConvert, StrMapConvert,
    standard_table,
};
use crate::descriptor::BeanDescriptor;
use crate::error::BindError;
use crate::resolve::{
    AccessChain, AccessResolve, ConventionNames, ExplicitNames, MarkerAccess, NameChain,
    NameResolve, SourceParamNames, VisibilityAccess,
};

// -----------------------------------------------------------------------------
// BindConfig

/// Build-time behavior switches.
#[derive(Clone, Copy, Debug)]
pub(crate) struct BindConfig {
    pub(crate) prefer_no_args_creator: bool,
    pub(crate) use_args_creators: bool,
    pub(crate) verify_decl: bool,
}

impl Default for BindConfig {
    fn default() -> Self {
        Self {
            prefer_no_args_creator: true,
            use_args_creators: false,
            verify_decl: true,
        }
    }
}

// -----------------------------------------------------------------------------
// Binder

struct Shared {
    config: BindConfig,
    names: NameChain,
    access: AccessChain,
    converters: HashMap<TypeId, Arc<dyn Convert>>,
    cache: RwLock<HashMap<TypeId, Arc<BeanDescriptor>>>,
}

/// The binding facade: builds descriptors on demand and moves described
/// beans between typed values and JSON.
///
/// A binder is immutable once built; clones are cheap and share the
/// descriptor cache, so one binder can serve any number of threads.
///
/// # Example
///
/// ```
/// use bindery_bean::Binder;
/// use bindery_decl::{ClassDecl, CreatorDecl, DeclCell, Describe, FieldDecl, TypeRef, TypeTag};
///
/// #[derive(Default)]
/// struct Circle {
///     radius: f64,
/// }
///
/// impl Describe for Circle {
///     fn class_decl() -> &'static ClassDecl {
///         static CELL: DeclCell = DeclCell::new();
///         CELL.get_or_build(|| {
///             ClassDecl::new(TypeTag::bean::<Circle>())
///                 .with_field(FieldDecl::new(
///                     "radius",
///                     TypeRef::of::<f64>(),
///                     |c: &Circle| c.radius,
///                     |c: &mut Circle, v| c.radius = v,
///                 ))
///                 .with_creator(CreatorDecl::no_args(Circle::default))
///         })
///     }
/// }
///
/// let binder = Binder::new();
/// assert_eq!(
///     binder.to_json(&Circle { radius: 2.0 }).unwrap(),
///     r#"{"radius":2.0}"#,
/// );
///
/// let circle: Circle = binder.from_json(r#"{"radius":3.5}"#).unwrap();
/// assert_eq!(circle.radius, 3.5);
/// ```
#[derive(Clone)]
pub struct Binder {
    shared: Arc<Shared>,
}

impl Binder {
    /// A binder with the default resolvers, converters, and configuration.
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Starts configuring a binder.
    pub fn builder() -> BinderBuilder {
        BinderBuilder::new()
    }

    #[inline]
    pub(crate) fn config(&self) -> &BindConfig {
        &self.shared.config
    }

    #[inline]
    pub(crate) fn names(&self) -> &NameChain {
        &self.shared.names
    }

    #[inline]
    pub(crate) fn access(&self) -> &AccessChain {
        &self.shared.access
    }

    #[inline]
    pub(crate) fn converters(&self) -> &HashMap<TypeId, Arc<dyn Convert>> {
        &self.shared.converters
    }

    #[inline]
    pub(crate) fn cache(&self) -> &RwLock<HashMap<TypeId, Arc<BeanDescriptor>>> {
        &self.shared.cache
    }

    /// Opens a conversion context on this binder, for driving descriptors
    /// directly.
    pub fn context(&self) -> BindContext<'_> {
        BindContext::new(self)
    }

    /// Serializes a described bean into a wire tree.
    pub fn to_value<T: Describe>(&self, bean: &T) -> Result<Value, BindError> {
        let descriptor = self.descriptor::<T>()?;
        descriptor.to_value(bean, &self.context())
    }

    /// Builds a described bean from a wire tree.
    pub fn from_value<T: Describe>(&self, value: &Value) -> Result<T, BindError> {
        let descriptor = self.descriptor::<T>()?;
        let bean = descriptor.from_value(value, &self.context())?;
        match bean.downcast::<T>() {
            Ok(bean) => Ok(*bean),
            Err(_) => Err(BindError::TypeMismatch {
                expected: type_name::<T>(),
            }),
        }
    }

    /// Serializes a described bean to a JSON string.
    pub fn to_json<T: Describe>(&self, bean: &T) -> Result<String, BindError> {
        let value = self.to_value(bean)?;
        Ok(serde_json::to_string(&value)?)
    }

    /// Parses a JSON string into a described bean.
    pub fn from_json<T: Describe>(&self, json: &str) -> Result<T, BindError> {
        let value: Value = serde_json::from_str(json)?;
        self.from_value(&value)
    }
}

impl Default for Binder {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Binder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cached = self
            .shared
            .cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len();
        f.debug_struct("Binder")
            .field("config", &self.shared.config)
            .field("converters", &self.shared.converters.len())
            .field("cached_descriptors", &cached)
            .finish_non_exhaustive()
    }
}

// -----------------------------------------------------------------------------
// BinderBuilder

/// Configures and assembles a [`Binder`].
///
/// Custom resolvers are consulted before the defaults, and converter
/// registrations replace earlier ones for the same type, so anything the
/// builder adds overrides the standard behavior.
pub struct BinderBuilder {
    config: BindConfig,
    names: Vec<Box<dyn NameResolve>>,
    access: Vec<Box<dyn AccessResolve>>,
    converters: HashMap<TypeId, Arc<dyn Convert>>,
}

impl BinderBuilder {
    fn new() -> Self {
        Self {
            config: BindConfig::default(),
            names: Vec::new(),
            access: Vec::new(),
            converters: standard_table(),
        }
    }

    /// Whether a no-argument creator outranks parameterized ones. On by
    /// default.
    pub fn prefer_no_args_creator(mut self, on: bool) -> Self {
        self.config.prefer_no_args_creator = on;
        self
    }

    /// Allows creators with parameters to be selected without a
    /// [`bindery_decl::UseCreator`] marker. Off by default.
    pub fn use_args_creators(mut self, on: bool) -> Self {
        self.config.use_args_creators = on;
        self
    }

    /// Whether the declaration found behind a tag must describe the
    /// requested type. On by default.
    pub fn verify_decl(mut self, on: bool) -> Self {
        self.config.verify_decl = on;
        self
    }

    /// Adds a name resolver consulted before the defaults.
    pub fn with_name_resolver(mut self, resolver: impl NameResolve + 'static) -> Self {
        self.names.push(Box::new(resolver));
        self
    }

    /// Adds an access resolver consulted before the defaults.
    pub fn with_access_resolver(mut self, resolver: impl AccessResolve + 'static) -> Self {
        self.access.push(Box::new(resolver));
        self
    }

    /// Registers a converter for `T`, replacing any earlier registration.
    pub fn with_converter<T: Any>(mut self, convert: impl Convert + 'static) -> Self {
        self.converters.insert(TypeId::of::<T>(), Arc::new(convert));
        self
    }

    /// Registers the serde-backed converter for `T`.
    pub fn with_serde<T>(self) -> Self
    where
        T: Serialize + DeserializeOwned + Any,
    {
        self.with_converter::<T>(SerdeConvert::<T>::new())
    }

    /// Registers element-wise conversion for `Vec<T>`.
    pub fn with_seq<T: Any>(self) -> Self {
        self.with_converter::<Vec<T>>(SeqConvert::<T>::new())
    }

    /// Registers element-wise conversion for `Vec<T>` of described beans.
    pub fn with_bean_seq<T: Describe>(self) -> Self {
        self.with_converter::<Vec<T>>(SeqConvert::<T>::of_beans())
    }

    /// Registers conversion for `Option<T>`, `None` mapping to `null`.
    pub fn with_option<T: Any>(self) -> Self {
        self.with_converter::<Option<T>>(OptionConvert::<T>::new())
    }

    /// Registers conversion for `Option<T>` of a described bean.
    pub fn with_bean_option<T: Describe>(self) -> Self {
        self.with_converter::<Option<T>>(OptionConvert::<T>::of_beans())
    }

    /// Registers conversion for `HashMap<String, T>`.
    pub fn with_str_map<T: Any>(self) -> Self {
        self.with_converter::<HashMap<String, T>>(StrMapConvert::<T>::new())
    }

    /// Registers conversion for `HashMap<String, T>` of described beans.
    pub fn with_bean_str_map<T: Describe>(self) -> Self {
        self.with_converter::<HashMap<String, T>>(StrMapConvert::<T>::of_beans())
    }

    /// Registers conversion for `Box<T>`, transparent on the wire.
    pub fn with_box<T: Any>(self) -> Self {
        self.with_converter::<Box<T>>(BoxConvert::<T>::new())
    }

    /// Registers conversion for `Box<T>` of a described bean.
    pub fn with_bean_box<T: Describe>(self) -> Self {
        self.with_converter::<Box<T>>(BoxConvert::<T>::of_beans())
    }

    /// Finishes the binder, appending the default resolvers after any
    /// custom ones.
    pub fn build(self) -> Binder {
        let mut names = self.names;
        names.push(Box::new(ExplicitNames));
        names.push(Box::new(SourceParamNames));
        names.push(Box::new(ConventionNames));

        let mut access = self.access;
        access.push(Box::new(MarkerAccess));
        access.push(Box::new(VisibilityAccess));

        Binder {
            shared: Arc::new(Shared {
                config: self.config,
                names: NameChain::new(names),
                access: AccessChain::new(access),
                converters: self.converters,
                cache: RwLock::new(HashMap::new()),
            }),
        }
    }
}

// -----------------------------------------------------------------------------
// Tests
