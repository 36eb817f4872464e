//! Value conversion.
//!
//! A [`Convert`] turns typed bean values into [`serde_json::Value`] trees
//! and back. The binder holds a registry keyed by value type; descriptors
//! bind one converter per property at build time, and container adapters
//! resolve their element converters through the [`BindContext`] at run
//! time.

use std::any::Any;

use serde_json::Value;

use bindery_decl::TypeTag;

use crate::binder::Binder;
use crate::error::BindError;

mod adapters;
mod primitives;

pub use adapters::{BoxConvert, OptionConvert, SeqConvert, StrMapConvert};
pub use primitives::SerdeConvert;

pub(crate) use adapters::BeanConvert;
pub(crate) use primitives::standard_table;

// -----------------------------------------------------------------------------
// Convert

/// A two-way conversion between one value type and the wire tree.
pub trait Convert: Send + Sync {
    /// Serializes a value of the converter's type.
    fn to_value(&self, value: &dyn Any, ctx: &BindContext<'_>) -> Result<Value, BindError>;

    /// Deserializes a value, boxed for the erased write thunks.
    fn from_value(&self, value: &Value, ctx: &BindContext<'_>) -> Result<Box<dyn Any>, BindError>;
}

// -----------------------------------------------------------------------------
// BindContext

/// Per-call conversion state, handed down through nested converters.
pub struct BindContext<'a> {
    binder: &'a Binder,
}

impl<'a> BindContext<'a> {
    pub(crate) fn new(binder: &'a Binder) -> Self {
        Self { binder }
    }

    /// The binder this conversion runs under.
    #[inline]
    pub fn binder(&self) -> &'a Binder {
        self.binder
    }

    /// Serializes one container element through the binder's registry.
    pub fn element_to_value(
        &self,
        elem: &TypeTag,
        container: &'static str,
        value: &dyn Any,
    ) -> Result<Value, BindError> {
        self.binder
            .element_converter(elem, container)?
            .to_value(value, self)
    }

    /// Deserializes one container element through the binder's registry.
    pub fn element_from_value(
        &self,
        elem: &TypeTag,
        container: &'static str,
        value: &Value,
    ) -> Result<Box<dyn Any>, BindError> {
        self.binder
            .element_converter(elem, container)?
            .from_value(value, self)
    }
}

/// Human-readable shape of a wire value, for mismatch reports.
pub(crate) fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// -----------------------------------------------------------------------------
// Tests
