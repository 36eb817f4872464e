#![doc = include_str!("../README.md")]

mod attr;
mod cell;
mod class;
mod creator;
mod describe;
mod member;
mod tag;

pub use attr::{AttrSet, AttrValue, Exclude, Include, Rename, UseCreator};
pub use cell::{DeclCell, GenericDeclCell};
pub use class::{ClassDecl, ParentLink};
pub use creator::{CreatorArgs, CreatorDecl, CreatorKind, NewFn, ParamDecl};
pub use describe::Describe;
pub use member::{FieldDecl, GetFn, MethodDecl, MethodKind, SetFn, Vis};
pub use tag::{TypeRef, TypeTag};
