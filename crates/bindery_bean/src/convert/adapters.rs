use std::any::{Any, type_name};
use std::collections::HashMap;
use std::marker::PhantomData;

use serde_json::{Map, Value};

use bindery_decl::{Describe, TypeTag};

use crate::error::BindError;

use super::{BindContext, Convert, value_kind};

// -----------------------------------------------------------------------------
// SeqConvert

/// Converter for `Vec<T>`, converting elements through the registry.
///
/// [`SeqConvert::new`] resolves elements by their plain type; use
/// [`SeqConvert::of_beans`] when the elements are described beans, so the
/// element tag carries their declaration.
pub struct SeqConvert<T: Any> {
    elem: TypeTag,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Any> SeqConvert<T> {
    pub fn new() -> Self {
        Self {
            elem: TypeTag::of::<T>(),
            _marker: PhantomData,
        }
    }

    pub fn of_beans() -> Self
    where
        T: Describe,
    {
        Self {
            elem: T::tag(),
            _marker: PhantomData,
        }
    }
}

impl<T: Any> Default for SeqConvert<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Any> Convert for SeqConvert<T> {
    fn to_value(&self, value: &dyn Any, ctx: &BindContext<'_>) -> Result<Value, BindError> {
        let seq = value
            .downcast_ref::<Vec<T>>()
            .ok_or(BindError::TypeMismatch {
                expected: type_name::<Vec<T>>(),
            })?;
        let mut items = Vec::with_capacity(seq.len());
        for item in seq {
            items.push(ctx.element_to_value(&self.elem, type_name::<Vec<T>>(), item)?);
        }
        Ok(Value::Array(items))
    }

    fn from_value(&self, value: &Value, ctx: &BindContext<'_>) -> Result<Box<dyn Any>, BindError> {
        let Value::Array(items) = value else {
            return Err(BindError::UnexpectedShape {
                type_path: type_name::<Vec<T>>(),
                expected: "an array",
                found: value_kind(value),
            });
        };
        let mut seq: Vec<T> = Vec::with_capacity(items.len());
        for item in items {
            let boxed = ctx.element_from_value(&self.elem, type_name::<Vec<T>>(), item)?;
            let typed = boxed.downcast::<T>().map_err(|_| BindError::TypeMismatch {
                expected: type_name::<T>(),
            })?;
            seq.push(*typed);
        }
        Ok(Box::new(seq))
    }
}

// -----------------------------------------------------------------------------
// OptionConvert

/// Converter for `Option<T>`, mapping `None` to `null`.
pub struct OptionConvert<T: Any> {
    elem: TypeTag,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Any> OptionConvert<T> {
    pub fn new() -> Self {
        Self {
            elem: TypeTag::of::<T>(),
            _marker: PhantomData,
        }
    }

    pub fn of_beans() -> Self
    where
        T: Describe,
    {
        Self {
            elem: T::tag(),
            _marker: PhantomData,
        }
    }
}

impl<T: Any> Default for OptionConvert<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Any> Convert for OptionConvert<T> {
    fn to_value(&self, value: &dyn Any, ctx: &BindContext<'_>) -> Result<Value, BindError> {
        let slot = value
            .downcast_ref::<Option<T>>()
            .ok_or(BindError::TypeMismatch {
                expected: type_name::<Option<T>>(),
            })?;
        match slot {
            None => Ok(Value::Null),
            Some(inner) => ctx.element_to_value(&self.elem, type_name::<Option<T>>(), inner),
        }
    }

    fn from_value(&self, value: &Value, ctx: &BindContext<'_>) -> Result<Box<dyn Any>, BindError> {
        if value.is_null() {
            return Ok(Box::new(None::<T>));
        }
        let boxed = ctx.element_from_value(&self.elem, type_name::<Option<T>>(), value)?;
        let typed = boxed.downcast::<T>().map_err(|_| BindError::TypeMismatch {
            expected: type_name::<T>(),
        })?;
        Ok(Box::new(Some(*typed)))
    }
}

// -----------------------------------------------------------------------------
// StrMapConvert

/// Converter for `HashMap<String, T>`, mapping to an object keyed by the
/// map keys.
pub struct StrMapConvert<T: Any> {
    elem: TypeTag,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Any> StrMapConvert<T> {
    pub fn new() -> Self {
        Self {
            elem: TypeTag::of::<T>(),
            _marker: PhantomData,
        }
    }

    pub fn of_beans() -> Self
    where
        T: Describe,
    {
        Self {
            elem: T::tag(),
            _marker: PhantomData,
        }
    }
}

impl<T: Any> Default for StrMapConvert<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Any> Convert for StrMapConvert<T> {
    fn to_value(&self, value: &dyn Any, ctx: &BindContext<'_>) -> Result<Value, BindError> {
        let map = value
            .downcast_ref::<HashMap<String, T>>()
            .ok_or(BindError::TypeMismatch {
                expected: type_name::<HashMap<String, T>>(),
            })?;
        let mut object = Map::new();
        for (key, item) in map {
            object.insert(
                key.clone(),
                ctx.element_to_value(&self.elem, type_name::<HashMap<String, T>>(), item)?,
            );
        }
        Ok(Value::Object(object))
    }

    fn from_value(&self, value: &Value, ctx: &BindContext<'_>) -> Result<Box<dyn Any>, BindError> {
        let Value::Object(object) = value else {
            return Err(BindError::UnexpectedShape {
                type_path: type_name::<HashMap<String, T>>(),
                expected: "an object",
                found: value_kind(value),
            });
        };
        let mut map: HashMap<String, T> = HashMap::with_capacity(object.len());
        for (key, item) in object {
            let boxed =
                ctx.element_from_value(&self.elem, type_name::<HashMap<String, T>>(), item)?;
            let typed = boxed.downcast::<T>().map_err(|_| BindError::TypeMismatch {
                expected: type_name::<T>(),
            })?;
            map.insert(key.clone(), *typed);
        }
        Ok(Box::new(map))
    }
}

// -----------------------------------------------------------------------------
// BoxConvert

/// Converter for `Box<T>`, transparent on the wire.
pub struct BoxConvert<T: Any> {
    elem: TypeTag,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Any> BoxConvert<T> {
    pub fn new() -> Self {
        Self {
            elem: TypeTag::of::<T>(),
            _marker: PhantomData,
        }
    }

    pub fn of_beans() -> Self
    where
        T: Describe,
    {
        Self {
            elem: T::tag(),
            _marker: PhantomData,
        }
    }
}

impl<T: Any> Default for BoxConvert<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Any> Convert for BoxConvert<T> {
    fn to_value(&self, value: &dyn Any, ctx: &BindContext<'_>) -> Result<Value, BindError> {
        let boxed = value
            .downcast_ref::<Box<T>>()
            .ok_or(BindError::TypeMismatch {
                expected: type_name::<Box<T>>(),
            })?;
        ctx.element_to_value(&self.elem, type_name::<Box<T>>(), &**boxed)
    }

    fn from_value(&self, value: &Value, ctx: &BindContext<'_>) -> Result<Box<dyn Any>, BindError> {
        let boxed = ctx.element_from_value(&self.elem, type_name::<Box<T>>(), value)?;
        let typed = boxed.downcast::<T>().map_err(|_| BindError::TypeMismatch {
            expected: type_name::<T>(),
        })?;
        // The property value is the box itself, so it gets boxed again for
        // the erased thunk.
        let slot: Box<dyn Any> = Box::new(typed);
        Ok(slot)
    }
}

// -----------------------------------------------------------------------------
// BeanConvert

/// Converter that routes a described bean through its descriptor.
pub(crate) struct BeanConvert {
    tag: TypeTag,
}

impl BeanConvert {
    pub(crate) fn new(tag: TypeTag) -> Self {
        Self { tag }
    }
}

impl Convert for BeanConvert {
    fn to_value(&self, value: &dyn Any, ctx: &BindContext<'_>) -> Result<Value, BindError> {
        let descriptor = ctx.binder().descriptor_for(&self.tag)?;
        descriptor.to_value(value, ctx)
    }

    fn from_value(&self, value: &Value, ctx: &BindContext<'_>) -> Result<Box<dyn Any>, BindError> {
        let descriptor = ctx.binder().descriptor_for(&self.tag)?;
        descriptor.from_value(value, ctx)
    }
}

// -----------------------------------------------------------------------------
// Tests
