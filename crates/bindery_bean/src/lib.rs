#![doc = include_str!("../README.md")]

pub mod convert;
pub mod resolve;

mod binder;
mod descriptor;
mod error;
mod pipeline;
mod provider;

pub use binder::{Binder, BinderBuilder};
pub use convert::{BindContext, Convert};
pub use descriptor::{
    BeanDescriptor, BoundCreator, BoundParam, PropertyAccessor, PropertyMutator, SkippedMember,
};
pub use error::{BindError, BuildError};
