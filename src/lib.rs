#![doc = include_str!("../README.md")]

pub use bindery_bean as bean;
pub use bindery_decl as decl;
