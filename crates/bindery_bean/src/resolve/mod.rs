//! Pluggable resolution strategies.
//!
//! Both chains are ordered: the engine consults resolvers front to back and
//! the first definitive answer wins. Custom resolvers registered through the
//! builder are prepended, so they outrank the defaults.

use bindery_decl::{AttrSet, TypeTag, Vis};

mod access;
mod name;

pub use access::{AccessChain, AccessResolve, MarkerAccess, VisibilityAccess, Vote};
pub use name::{ConventionNames, ExplicitNames, NameChain, NameResolve, SourceParamNames};

// -----------------------------------------------------------------------------
// MemberRef

/// The structural role of a declared member.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MemberKind {
    Field,
    Getter,
    Setter,
    Param,
}

/// A resolver's view of one member candidate.
///
/// Resolvers see declared facts only; logical names, merging, and winners
/// are none of their business.
#[derive(Clone, Copy)]
pub struct MemberRef<'a> {
    pub kind: MemberKind,
    /// Declared identifier; `None` for creator parameters without recorded
    /// names.
    pub name: Option<&'static str>,
    pub attrs: &'a AttrSet,
    pub vis: Vis,
    pub is_static: bool,
    pub transient: bool,
    /// The declaring type.
    pub owner: &'a TypeTag,
    /// Position within the creator's parameter list, for `Param` members.
    pub param_index: Option<usize>,
}

impl MemberRef<'_> {
    /// Human-readable designation for diagnostics.
    pub fn describe(&self) -> String {
        match (self.kind, self.name) {
            (MemberKind::Param, _) => {
                format!("creator parameter {}", self.param_index.unwrap_or(0))
            }
            (MemberKind::Field, Some(name)) => format!("field `{name}`"),
            (_, Some(name)) => format!("method `{name}`"),
            (_, None) => String::from("unnamed member"),
        }
    }
}
