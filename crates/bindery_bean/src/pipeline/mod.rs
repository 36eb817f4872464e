//! Descriptor construction.
//!
//! Building a [`crate::BeanDescriptor`] runs in stages: `candidates` walks
//! the declaration and its ancestors into a flat member list, `merge` folds
//! the named candidates into properties, `creator` picks the instantiation
//! route, and `assemble` binds converters and produces the descriptor.

mod assemble;
mod candidates;
mod creator;
mod merge;

pub(crate) use assemble::assemble;
