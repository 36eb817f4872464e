use bindery_decl::{Exclude, Include, Vis};

use super::{MemberKind, MemberRef};
use crate::error::BuildError;

// -----------------------------------------------------------------------------
// Vote

/// A resolver's answer for one member in one role.
///
/// `Abstain` defers to the next resolver in the chain, which is how marker
/// resolution overrides visibility rules without replacing them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Vote {
    Yes,
    No,
    Abstain,
}

// -----------------------------------------------------------------------------
// AccessResolve

/// Decides whether a member serves as an accessor (read side) or a mutator
/// (write side) of some property.
///
/// The two roles are voted independently: a member may be excluded from
/// serialization yet still feed deserialization, and vice versa.
pub trait AccessResolve: Send + Sync {
    fn is_accessor(&self, member: &MemberRef<'_>) -> Result<Vote, BuildError>;
    fn is_mutator(&self, member: &MemberRef<'_>) -> Result<Vote, BuildError>;
}

// -----------------------------------------------------------------------------
// Default resolvers

/// Honors [`Include`] and [`Exclude`] markers.
///
/// A marker only participates in the facets it claims, so
/// `Exclude::serialize_only()` abstains on the mutator vote. Both markers
/// claiming the same facet on one member is a declaration bug and fails the
/// build.
pub struct MarkerAccess;

impl MarkerAccess {
    fn facet_vote(member: &MemberRef<'_>, serialize: bool) -> Result<Vote, BuildError> {
        let included = member.attrs.get::<Include>().is_some_and(|m| {
            if serialize { m.serialize } else { m.deserialize }
        });
        let excluded = member.attrs.get::<Exclude>().is_some_and(|m| {
            if serialize { m.serialize } else { m.deserialize }
        });
        if included && excluded {
            return Err(BuildError::ConflictingMarkers {
                type_path: member.owner.path(),
                member: member.describe(),
            });
        }
        Ok(if excluded {
            Vote::No
        } else if included {
            Vote::Yes
        } else {
            Vote::Abstain
        })
    }
}

impl AccessResolve for MarkerAccess {
    fn is_accessor(&self, member: &MemberRef<'_>) -> Result<Vote, BuildError> {
        Self::facet_vote(member, true)
    }

    fn is_mutator(&self, member: &MemberRef<'_>) -> Result<Vote, BuildError> {
        Self::facet_vote(member, false)
    }
}

/// The standard visibility rules.
///
/// Public instance fields serve both roles; getters only read and setters
/// only write; static and transient members are out on both sides. This
/// resolver never abstains on members it recognizes, so it belongs at the
/// end of the chain.
pub struct VisibilityAccess;

impl VisibilityAccess {
    fn visible_field(member: &MemberRef<'_>) -> Vote {
        if member.is_static || member.transient || member.vis != Vis::Public {
            Vote::No
        } else {
            Vote::Yes
        }
    }

    fn visible_method(member: &MemberRef<'_>) -> Vote {
        if member.is_static || member.vis != Vis::Public {
            Vote::No
        } else {
            Vote::Yes
        }
    }
}

impl AccessResolve for VisibilityAccess {
    fn is_accessor(&self, member: &MemberRef<'_>) -> Result<Vote, BuildError> {
        Ok(match member.kind {
            MemberKind::Field => Self::visible_field(member),
            MemberKind::Getter => Self::visible_method(member),
            MemberKind::Setter | MemberKind::Param => Vote::No,
        })
    }

    fn is_mutator(&self, member: &MemberRef<'_>) -> Result<Vote, BuildError> {
        Ok(match member.kind {
            MemberKind::Field => Self::visible_field(member),
            MemberKind::Setter => Self::visible_method(member),
            MemberKind::Getter | MemberKind::Param => Vote::No,
        })
    }
}

// -----------------------------------------------------------------------------
// AccessChain

/// An ordered chain of access resolvers; the first non-abstaining vote wins.
pub struct AccessChain {
    resolvers: Vec<Box<dyn AccessResolve>>,
}

impl AccessChain {
    pub fn new(resolvers: Vec<Box<dyn AccessResolve>>) -> Self {
        Self { resolvers }
    }
}

impl AccessResolve for AccessChain {
    fn is_accessor(&self, member: &MemberRef<'_>) -> Result<Vote, BuildError> {
        for resolver in &self.resolvers {
            let vote = resolver.is_accessor(member)?;
            if vote != Vote::Abstain {
                return Ok(vote);
            }
        }
        Ok(Vote::Abstain)
    }

    fn is_mutator(&self, member: &MemberRef<'_>) -> Result<Vote, BuildError> {
        for resolver in &self.resolvers {
            let vote = resolver.is_mutator(member)?;
            if vote != Vote::Abstain {
                return Ok(vote);
            }
        }
        Ok(Vote::Abstain)
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::*;
    use bindery_decl::{AttrSet, TypeTag};

    fn chain() -> AccessChain {
        AccessChain::new(vec![Box::new(MarkerAccess), Box::new(VisibilityAccess)])
    }

    fn member<'a>(
        kind: MemberKind,
        vis: Vis,
        attrs: &'a AttrSet,
        owner: &'a TypeTag,
    ) -> MemberRef<'a> {
        MemberRef {
            kind,
            name: Some("sample"),
            attrs,
            vis,
            is_static: false,
            transient: false,
            owner,
            param_index: None,
        }
    }

    #[test]
    fn public_field_serves_both_roles() {
        let owner = TypeTag::of::<()>();
        let attrs = AttrSet::new();
        let m = member(MemberKind::Field, Vis::Public, &attrs, &owner);
        assert_eq!(chain().is_accessor(&m).unwrap(), Vote::Yes);
        assert_eq!(chain().is_mutator(&m).unwrap(), Vote::Yes);
    }

    #[test]
    fn private_field_is_out_without_markers() {
        let owner = TypeTag::of::<()>();
        let attrs = AttrSet::new();
        let m = member(MemberKind::Field, Vis::Private, &attrs, &owner);
        assert_eq!(chain().is_accessor(&m).unwrap(), Vote::No);
        assert_eq!(chain().is_mutator(&m).unwrap(), Vote::No);
    }

    #[test]
    fn include_overrides_visibility() {
        let owner = TypeTag::of::<()>();
        let attrs = AttrSet::new().with(Include::both());
        let m = member(MemberKind::Field, Vis::Private, &attrs, &owner);
        assert_eq!(chain().is_accessor(&m).unwrap(), Vote::Yes);
        assert_eq!(chain().is_mutator(&m).unwrap(), Vote::Yes);
    }

    #[test]
    fn exclude_facets_are_independent() {
        let owner = TypeTag::of::<()>();
        let attrs = AttrSet::new().with(Exclude::serialize_only());
        let m = member(MemberKind::Field, Vis::Public, &attrs, &owner);
        assert_eq!(chain().is_accessor(&m).unwrap(), Vote::No);
        assert_eq!(chain().is_mutator(&m).unwrap(), Vote::Yes);
    }

    #[test]
    fn getters_never_mutate_and_setters_never_read() {
        let owner = TypeTag::of::<()>();
        let attrs = AttrSet::new();
        let getter = member(MemberKind::Getter, Vis::Public, &attrs, &owner);
        assert_eq!(chain().is_accessor(&getter).unwrap(), Vote::Yes);
        assert_eq!(chain().is_mutator(&getter).unwrap(), Vote::No);

        let setter = member(MemberKind::Setter, Vis::Public, &attrs, &owner);
        assert_eq!(chain().is_accessor(&setter).unwrap(), Vote::No);
        assert_eq!(chain().is_mutator(&setter).unwrap(), Vote::Yes);
    }

    #[test]
    fn transient_blocks_fields_but_include_wins() {
        let owner = TypeTag::of::<()>();
        let plain = AttrSet::new();
        let mut m = member(MemberKind::Field, Vis::Public, &plain, &owner);
        m.transient = true;
        assert_eq!(chain().is_accessor(&m).unwrap(), Vote::No);

        let forced = AttrSet::new().with(Include::both());
        let mut m = member(MemberKind::Field, Vis::Public, &forced, &owner);
        m.transient = true;
        assert_eq!(chain().is_accessor(&m).unwrap(), Vote::Yes);
    }

    #[test]
    fn conflicting_markers_fail() {
        let owner = TypeTag::of::<()>();
        let attrs = AttrSet::new()
            .with(Include::serialize_only())
            .with(Exclude::serialize_only());
        let m = member(MemberKind::Field, Vis::Public, &attrs, &owner);
        let err = chain().is_accessor(&m).unwrap_err();
        assert!(matches!(err, BuildError::ConflictingMarkers { .. }));

        // The conflict sits on the serialize facet only.
        assert_eq!(chain().is_mutator(&m).unwrap(), Vote::Yes);
    }
}
