use std::borrow::Cow;

use bindery_decl::Rename;

use super::{MemberKind, MemberRef};

// -----------------------------------------------------------------------------
// NameResolve

/// Maps a raw member identifier to a logical property name.
///
/// Returning `None` passes the question to the next resolver in the chain;
/// a candidate no resolver can name is dropped with a diagnostic, never an
/// error. Creator parameters are the one exception: the creator cannot run
/// without its parameter names, so an unresolved parameter fails the build.
pub trait NameResolve: Send + Sync {
    fn resolve(&self, member: &MemberRef<'_>) -> Option<Cow<'static, str>>;
}

// -----------------------------------------------------------------------------
// Default resolvers

/// Honors explicit [`Rename`] markers on any member kind.
pub struct ExplicitNames;

impl NameResolve for ExplicitNames {
    fn resolve(&self, member: &MemberRef<'_>) -> Option<Cow<'static, str>> {
        member.attrs.get::<Rename>().map(|r| Cow::Borrowed(r.0))
    }
}

/// Recovers creator-parameter names recorded in the declaration.
///
/// Declarations carry source parameter names when the declaring site knows
/// them; this resolver makes creators usable without `Rename` markers.
pub struct SourceParamNames;

impl NameResolve for SourceParamNames {
    fn resolve(&self, member: &MemberRef<'_>) -> Option<Cow<'static, str>> {
        if member.kind != MemberKind::Param {
            return None;
        }
        member.name.map(Cow::Borrowed)
    }
}

/// Applies naming conventions: fields keep their declared name, getter and
/// setter method names lose their `get`/`is`/`set` prefix.
///
/// Both `camelCase` and `snake_case` method names are understood: the
/// prefix must be followed by an underscore or an uppercase letter, and the
/// first character of the remainder is lowercased (`getB` and `get_b` both
/// become `b`). Method names without a conventional prefix stay unresolved.
pub struct ConventionNames;

impl NameResolve for ConventionNames {
    fn resolve(&self, member: &MemberRef<'_>) -> Option<Cow<'static, str>> {
        match member.kind {
            MemberKind::Field => member.name.map(Cow::Borrowed),
            MemberKind::Getter => strip_prefixed(member.name?, &["get", "is"]),
            MemberKind::Setter => strip_prefixed(member.name?, &["set"]),
            MemberKind::Param => None,
        }
    }
}

fn strip_prefixed(raw: &'static str, prefixes: &[&str]) -> Option<Cow<'static, str>> {
    for prefix in prefixes {
        let Some(rest) = raw.strip_prefix(prefix) else {
            continue;
        };
        let rest = match rest.strip_prefix('_') {
            Some(snake) => snake,
            // Without an underscore, the boundary must be an uppercase
            // letter; "island" is not an "is" getter.
            None => {
                if !rest.chars().next().is_some_and(char::is_uppercase) {
                    continue;
                }
                rest
            }
        };
        if rest.is_empty() {
            continue;
        }
        let mut chars = rest.chars();
        let Some(first) = chars.next() else {
            continue;
        };
        return Some(if first.is_uppercase() {
            Cow::Owned(first.to_lowercase().chain(chars).collect::<String>())
        } else {
            Cow::Borrowed(rest)
        });
    }
    None
}

// -----------------------------------------------------------------------------
// NameChain

/// An ordered chain of name resolvers; the first `Some` wins.
pub struct NameChain {
    resolvers: Vec<Box<dyn NameResolve>>,
}

impl NameChain {
    pub fn new(resolvers: Vec<Box<dyn NameResolve>>) -> Self {
        Self { resolvers }
    }
}

impl NameResolve for NameChain {
    fn resolve(&self, member: &MemberRef<'_>) -> Option<Cow<'static, str>> {
        self.resolvers.iter().find_map(|r| r.resolve(member))
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::*;
    use bindery_decl::{AttrSet, TypeTag, Vis};

    fn member(kind: MemberKind, name: &'static str, attrs: &AttrSet) -> Cow<'static, str> {
        try_member(kind, name, attrs).unwrap()
    }

    fn try_member(
        kind: MemberKind,
        name: &'static str,
        attrs: &AttrSet,
    ) -> Option<Cow<'static, str>> {
        let owner = TypeTag::of::<()>();
        let chain = NameChain::new(vec![
            Box::new(ExplicitNames),
            Box::new(SourceParamNames),
            Box::new(ConventionNames),
        ]);
        chain.resolve(&MemberRef {
            kind,
            name: Some(name),
            attrs,
            vis: Vis::Public,
            is_static: false,
            transient: false,
            owner: &owner,
            param_index: if kind == MemberKind::Param {
                Some(0)
            } else {
                None
            },
        })
    }

    #[test]
    fn fields_keep_their_name() {
        let attrs = AttrSet::new();
        assert_eq!(member(MemberKind::Field, "age", &attrs), "age");
    }

    #[test]
    fn getter_prefixes_are_stripped() {
        let attrs = AttrSet::new();
        assert_eq!(member(MemberKind::Getter, "getB", &attrs), "b");
        assert_eq!(member(MemberKind::Getter, "get_b", &attrs), "b");
        assert_eq!(member(MemberKind::Getter, "getFullName", &attrs), "fullName");
        assert_eq!(member(MemberKind::Getter, "is_ready", &attrs), "ready");
        assert_eq!(member(MemberKind::Getter, "isOk", &attrs), "ok");
    }

    #[test]
    fn setter_prefix_is_stripped() {
        let attrs = AttrSet::new();
        assert_eq!(member(MemberKind::Setter, "setB", &attrs), "b");
        assert_eq!(member(MemberKind::Setter, "set_width", &attrs), "width");
    }

    #[test]
    fn prefix_needs_a_boundary() {
        let attrs = AttrSet::new();
        assert_eq!(try_member(MemberKind::Getter, "island", &attrs), None);
        assert_eq!(try_member(MemberKind::Getter, "getaway", &attrs), None);
        assert_eq!(try_member(MemberKind::Getter, "get", &attrs), None);
        assert_eq!(try_member(MemberKind::Setter, "settle", &attrs), None);
        assert_eq!(try_member(MemberKind::Getter, "width", &attrs), None);
    }

    #[test]
    fn rename_outranks_conventions() {
        let attrs = AttrSet::new().with(Rename("columns"));
        assert_eq!(member(MemberKind::Getter, "get_width", &attrs), "columns");
        assert_eq!(member(MemberKind::Field, "width", &attrs), "columns");
    }

    #[test]
    fn params_resolve_from_recorded_names() {
        let attrs = AttrSet::new();
        assert_eq!(member(MemberKind::Param, "seat", &attrs), "seat");

        let renamed = AttrSet::new().with(Rename("seat_no"));
        assert_eq!(member(MemberKind::Param, "seat", &renamed), "seat_no");
    }
}
