use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::BindError;

use super::{BindContext, Convert};

// -----------------------------------------------------------------------------
// SerdeConvert

/// Converter for any type serde can already serialize and deserialize.
///
/// This is the leaf of every conversion: primitives, strings, and raw
/// [`Value`] trees all go through it, and custom value-like types can opt
/// in with [`crate::BinderBuilder::with_serde`].
pub struct SerdeConvert<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> SerdeConvert<T> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for SerdeConvert<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Convert for SerdeConvert<T>
where
    T: Serialize + DeserializeOwned + Any,
{
    fn to_value(&self, value: &dyn Any, _ctx: &BindContext<'_>) -> Result<Value, BindError> {
        let typed = value.downcast_ref::<T>().ok_or(BindError::TypeMismatch {
            expected: type_name::<T>(),
        })?;
        Ok(serde_json::to_value(typed)?)
    }

    fn from_value(&self, value: &Value, _ctx: &BindContext<'_>) -> Result<Box<dyn Any>, BindError> {
        let typed: T = serde_json::from_value(value.clone())?;
        Ok(Box::new(typed))
    }
}

// -----------------------------------------------------------------------------
// Standard registrations

fn seed<T>(table: &mut HashMap<TypeId, Arc<dyn Convert>>)
where
    T: Serialize + DeserializeOwned + Any,
{
    table.insert(TypeId::of::<T>(), Arc::new(SerdeConvert::<T>::new()));
}

/// The converter registrations every binder starts from.
pub(crate) fn standard_table() -> HashMap<TypeId, Arc<dyn Convert>> {
    let mut table = HashMap::new();
    seed::<()>(&mut table);
    seed::<bool>(&mut table);
    seed::<char>(&mut table);
    seed::<u8>(&mut table);
    seed::<u16>(&mut table);
    seed::<u32>(&mut table);
    seed::<u64>(&mut table);
    seed::<usize>(&mut table);
    seed::<i8>(&mut table);
    seed::<i16>(&mut table);
    seed::<i32>(&mut table);
    seed::<i64>(&mut table);
    seed::<isize>(&mut table);
    seed::<f32>(&mut table);
    seed::<f64>(&mut table);
    seed::<String>(&mut table);
    seed::<Value>(&mut table);
    table
}

// -----------------------------------------------------------------------------
// Tests
