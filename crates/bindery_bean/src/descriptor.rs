use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};

use bindery_decl::{AttrSet, CreatorArgs, CreatorDecl, CreatorKind, GetFn, SetFn, TypeTag};

use crate::convert::{BindContext, Convert, value_kind};
use crate::error::BindError;

// -----------------------------------------------------------------------------
// Bound properties

/// The read side of one property: the winning thunk with its converter and
/// merged attributes.
pub struct PropertyAccessor {
    pub(crate) name: String,
    pub(crate) ty: TypeTag,
    pub(crate) attrs: AttrSet,
    pub(crate) declared_by: &'static str,
    pub(crate) get: GetFn,
    pub(crate) convert: Arc<dyn Convert>,
}

impl PropertyAccessor {
    /// The logical property name, as it appears on the wire.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The resolved value type.
    #[inline]
    pub fn ty(&self) -> &TypeTag {
        &self.ty
    }

    /// Attributes merged across the members backing this side.
    #[inline]
    pub fn attrs(&self) -> &AttrSet {
        &self.attrs
    }

    pub(crate) fn read(&self, bean: &dyn Any, ctx: &BindContext<'_>) -> Result<Value, BindError> {
        let value = (self.get)(bean).ok_or(BindError::TypeMismatch {
            expected: self.declared_by,
        })?;
        self.convert
            .to_value(value.as_ref(), ctx)
            .map_err(|e| e.in_property(self.declared_by, self.name.as_str()))
    }
}

/// The write side of one property.
pub struct PropertyMutator {
    pub(crate) name: String,
    pub(crate) ty: TypeTag,
    pub(crate) attrs: AttrSet,
    pub(crate) declared_by: &'static str,
    pub(crate) set: SetFn,
    pub(crate) convert: Arc<dyn Convert>,
}

impl PropertyMutator {
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn ty(&self) -> &TypeTag {
        &self.ty
    }

    #[inline]
    pub fn attrs(&self) -> &AttrSet {
        &self.attrs
    }

    pub(crate) fn write(
        &self,
        bean: &mut dyn Any,
        value: &Value,
        ctx: &BindContext<'_>,
    ) -> Result<(), BindError> {
        let converted = self
            .convert
            .from_value(value, ctx)
            .map_err(|e| e.in_property(self.declared_by, self.name.as_str()))?;
        if (self.set)(bean, converted) {
            Ok(())
        } else {
            Err(BindError::TypeMismatch {
                expected: self.declared_by,
            }
            .in_property(self.declared_by, self.name.as_str()))
        }
    }
}

// -----------------------------------------------------------------------------
// Bound creator

/// One creator parameter with its converter and merged attributes.
pub struct BoundParam {
    pub(crate) name: String,
    pub(crate) ty: TypeTag,
    pub(crate) attrs: AttrSet,
    pub(crate) convert: Arc<dyn Convert>,
}

impl BoundParam {
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn ty(&self) -> &TypeTag {
        &self.ty
    }

    #[inline]
    pub fn attrs(&self) -> &AttrSet {
        &self.attrs
    }
}

/// The selected creator, ready to instantiate beans from wire fields.
pub struct BoundCreator {
    pub(crate) owner: &'static str,
    pub(crate) decl: &'static CreatorDecl,
    pub(crate) params: Vec<BoundParam>,
}

impl BoundCreator {
    #[inline]
    pub fn kind(&self) -> CreatorKind {
        self.decl.kind()
    }

    #[inline]
    pub fn params(&self) -> &[BoundParam] {
        &self.params
    }

    /// Converts and consumes the creator's fields out of `fields`, then
    /// invokes the creator. Absent fields become empty argument slots.
    pub(crate) fn instantiate(
        &self,
        fields: &mut Map<String, Value>,
        ctx: &BindContext<'_>,
    ) -> Result<Box<dyn Any>, BindError> {
        let mut values = Vec::with_capacity(self.params.len());
        for param in &self.params {
            match fields.remove(&param.name) {
                Some(value) => {
                    let converted = param
                        .convert
                        .from_value(&value, ctx)
                        .map_err(|e| e.in_property(self.owner, param.name.as_str()))?;
                    values.push(Some(converted));
                }
                None => values.push(None),
            }
        }
        Ok(self.decl.invoke(CreatorArgs::new(values)))
    }
}

// -----------------------------------------------------------------------------
// BeanDescriptor

/// A member the build dropped, with the reason. Diagnostic only.
#[derive(Clone, Debug)]
pub struct SkippedMember {
    pub member: String,
    pub reason: String,
}

/// Everything needed to serialize and deserialize one bean type.
///
/// Descriptors are built once per type by the binder and shared behind an
/// [`Arc`]; all state is immutable after construction.
pub struct BeanDescriptor {
    pub(crate) declared: TypeTag,
    pub(crate) accessors: Vec<PropertyAccessor>,
    pub(crate) mutators: HashMap<String, PropertyMutator>,
    pub(crate) creator: BoundCreator,
    pub(crate) skipped: Vec<SkippedMember>,
}

impl BeanDescriptor {
    /// The described type.
    #[inline]
    pub fn declared(&self) -> &TypeTag {
        &self.declared
    }

    /// Readable properties, in ascending name order.
    #[inline]
    pub fn accessors(&self) -> &[PropertyAccessor] {
        &self.accessors
    }

    /// Looks up one readable property by name.
    pub fn accessor(&self, name: &str) -> Option<&PropertyAccessor> {
        self.accessors
            .binary_search_by(|a| a.name.as_str().cmp(name))
            .ok()
            .map(|i| &self.accessors[i])
    }

    /// Writable properties, keyed by name.
    #[inline]
    pub fn mutators(&self) -> &HashMap<String, PropertyMutator> {
        &self.mutators
    }

    /// Looks up one writable property by name.
    pub fn mutator(&self, name: &str) -> Option<&PropertyMutator> {
        self.mutators.get(name)
    }

    /// The creator deserialization instantiates through.
    #[inline]
    pub fn creator(&self) -> &BoundCreator {
        &self.creator
    }

    /// Members the build dropped, with reasons.
    #[inline]
    pub fn skipped(&self) -> &[SkippedMember] {
        &self.skipped
    }

    /// Serializes a bean of the described type into an object tree with
    /// one entry per readable property, in ascending name order.
    pub fn to_value(&self, bean: &dyn Any, ctx: &BindContext<'_>) -> Result<Value, BindError> {
        if bean.type_id() != self.declared.id() {
            return Err(BindError::TypeMismatch {
                expected: self.declared.path(),
            });
        }
        let mut fields = Map::new();
        for accessor in &self.accessors {
            fields.insert(accessor.name.clone(), accessor.read(bean, ctx)?);
        }
        Ok(Value::Object(fields))
    }

    /// Builds a bean from an object tree: creator parameters are consumed
    /// first, remaining entries go through the mutators, and entries
    /// matching no property are ignored.
    pub fn from_value(&self, value: &Value, ctx: &BindContext<'_>) -> Result<Box<dyn Any>, BindError> {
        let Value::Object(object) = value else {
            return Err(BindError::UnexpectedShape {
                type_path: self.declared.path(),
                expected: "an object",
                found: value_kind(value),
            });
        };
        let mut fields = object.clone();
        let mut bean = self.creator.instantiate(&mut fields, ctx)?;
        for (name, field_value) in &fields {
            let Some(mutator) = self.mutators.get(name) else {
                continue;
            };
            mutator.write(bean.as_mut(), field_value, ctx)?;
        }
        Ok(bean)
    }
}

impl fmt::Debug for BeanDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let accessors: Vec<&str> = self.accessors.iter().map(|a| a.name.as_str()).collect();
        f.debug_struct("BeanDescriptor")
            .field("declared", &self.declared)
            .field("accessors", &accessors)
            .field("mutators", &self.mutators.len())
            .field("creator", &self.creator.kind())
            .field("skipped", &self.skipped)
            .finish_non_exhaustive()
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Binder;
    use crate::convert::SerdeConvert;
    use bindery_decl::{FieldDecl, TypeRef};
    use serde_json::json;

    #[derive(Default)]
    struct Dial {
        n: u32,
    }

    fn dial_descriptor() -> BeanDescriptor {
        let field = FieldDecl::new(
            "n",
            TypeRef::of::<u32>(),
            |d: &Dial| d.n,
            |d: &mut Dial, v| d.n = v,
        );
        let creator: &'static CreatorDecl = Box::leak(Box::new(CreatorDecl::no_args(Dial::default)));
        let convert: Arc<dyn Convert> = Arc::new(SerdeConvert::<u32>::new());
        let path = TypeTag::of::<Dial>().path();

        let mut mutators = HashMap::new();
        mutators.insert(
            "n".to_string(),
            PropertyMutator {
                name: "n".to_string(),
                ty: TypeTag::of::<u32>(),
                attrs: AttrSet::new(),
                declared_by: path,
                set: field.set_fn().unwrap().clone(),
                convert: convert.clone(),
            },
        );

        BeanDescriptor {
            declared: TypeTag::of::<Dial>(),
            accessors: vec![PropertyAccessor {
                name: "n".to_string(),
                ty: TypeTag::of::<u32>(),
                attrs: AttrSet::new(),
                declared_by: path,
                get: field.get_fn().clone(),
                convert,
            }],
            mutators,
            creator: BoundCreator {
                owner: path,
                decl: creator,
                params: Vec::new(),
            },
            skipped: Vec::new(),
        }
    }

    #[test]
    fn serializes_properties_into_an_object() {
        let binder = Binder::new();
        let ctx = BindContext::new(&binder);
        let descriptor = dial_descriptor();

        let value = descriptor.to_value(&Dial { n: 12 }, &ctx).unwrap();
        assert_eq!(value, json!({"n": 12}));
    }

    #[test]
    fn rejects_values_of_other_types() {
        let binder = Binder::new();
        let ctx = BindContext::new(&binder);
        let descriptor = dial_descriptor();

        let err = descriptor.to_value(&"not a dial", &ctx).unwrap_err();
        assert!(err.is_type_mismatch());
    }

    #[test]
    fn instantiates_then_mutates() {
        let binder = Binder::new();
        let ctx = BindContext::new(&binder);
        let descriptor = dial_descriptor();

        let bean = descriptor
            .from_value(&json!({"n": 5, "stray": true}), &ctx)
            .unwrap();
        let dial = bean.downcast::<Dial>().ok().unwrap();
        assert_eq!(dial.n, 5);
    }

    #[test]
    fn non_object_wire_shapes_are_rejected() {
        let binder = Binder::new();
        let ctx = BindContext::new(&binder);
        let descriptor = dial_descriptor();

        let err = descriptor.from_value(&json!([1, 2]), &ctx).unwrap_err();
        assert!(matches!(
            err,
            BindError::UnexpectedShape {
                expected: "an object",
                found: "an array",
                ..
            }
        ));
    }

    #[test]
    fn accessor_lookup_uses_the_sorted_order() {
        let descriptor = dial_descriptor();
        assert!(descriptor.accessor("n").is_some());
        assert!(descriptor.accessor("m").is_none());
        assert!(descriptor.mutator("n").is_some());
    }

    #[test]
    fn debug_output_summarizes_the_shape() {
        let descriptor = dial_descriptor();
        let rendered = format!("{descriptor:?}");
        assert!(rendered.contains("BeanDescriptor"));
        assert!(rendered.contains("Dial"));
        assert!(rendered.contains("\"n\""));
    }
}
