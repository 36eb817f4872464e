use std::collections::BTreeMap;

use bindery_decl::{AttrSet, ParamDecl};

use crate::error::BuildError;
use crate::resolve::MemberKind;

use super::candidates::Candidate;

// -----------------------------------------------------------------------------
// Named candidates

/// A candidate whose logical name resolved, tagged with the roles the access
/// chain granted it.
///
/// Candidates granted neither role stay in the list: they produce no
/// property on their own, but their attributes still flow into properties
/// and creator parameters that share their name.
pub(crate) struct NamedCandidate {
    pub(crate) name: String,
    pub(crate) serves_accessor: bool,
    pub(crate) serves_mutator: bool,
    pub(crate) inner: Candidate,
}

/// The winning candidate for one side of a property, with the merged
/// attribute set for that side.
#[derive(Debug)]
pub(crate) struct Winner {
    pub(crate) index: usize,
    pub(crate) attrs: AttrSet,
}

/// One logical property after merging.
#[derive(Debug)]
pub(crate) struct MergedProperty {
    pub(crate) name: String,
    pub(crate) accessor: Option<Winner>,
    pub(crate) mutator: Option<Winner>,
}

// -----------------------------------------------------------------------------
// Merging

#[derive(Default)]
struct Bucket {
    all: Vec<usize>,
    accessors: Vec<usize>,
    mutators: Vec<usize>,
}

/// Folds named candidates into properties, one per distinct name, in
/// ascending name order.
///
/// Each side picks its most derived candidate; at equal depth a method
/// shadows a field, and two members of the same shape competing for the
/// same side is a declaration conflict. The winning side's attributes are
/// the union of the winner's and those of a same-depth field with the same
/// name, the winner's taking precedence.
pub(crate) fn merge(cands: &[NamedCandidate]) -> Result<Vec<MergedProperty>, BuildError> {
    let mut buckets: BTreeMap<&str, Bucket> = BTreeMap::new();
    for (index, cand) in cands.iter().enumerate() {
        let bucket = buckets.entry(cand.name.as_str()).or_default();
        bucket.all.push(index);
        if cand.serves_accessor {
            bucket.accessors.push(index);
        }
        if cand.serves_mutator {
            bucket.mutators.push(index);
        }
    }

    let mut properties = Vec::with_capacity(buckets.len());
    for (name, bucket) in buckets {
        let accessor = pick_winner(cands, &bucket.accessors, "accessor")?.map(|index| Winner {
            index,
            attrs: side_attrs(cands, &bucket.all, index),
        });
        let mutator = pick_winner(cands, &bucket.mutators, "mutator")?.map(|index| Winner {
            index,
            attrs: side_attrs(cands, &bucket.all, index),
        });
        if accessor.is_none() && mutator.is_none() {
            continue;
        }
        properties.push(MergedProperty {
            name: name.to_string(),
            accessor,
            mutator,
        });
    }
    Ok(properties)
}

fn pick_winner(
    cands: &[NamedCandidate],
    indices: &[usize],
    role: &'static str,
) -> Result<Option<usize>, BuildError> {
    let mut best: Option<usize> = None;
    for &index in indices {
        let Some(current) = best else {
            best = Some(index);
            continue;
        };
        let held = &cands[current].inner;
        let next = &cands[index].inner;
        if next.depth < held.depth {
            best = Some(index);
        } else if next.depth == held.depth {
            match (next.kind != MemberKind::Field, held.kind != MemberKind::Field) {
                (true, false) => best = Some(index),
                (false, true) => {}
                _ => {
                    return Err(BuildError::DuplicateMember {
                        type_path: next.owner.path(),
                        name: cands[index].name.clone(),
                        role,
                    });
                }
            }
        }
    }
    Ok(best)
}

fn side_attrs(cands: &[NamedCandidate], all: &[usize], winner: usize) -> AttrSet {
    let won = &cands[winner].inner;
    if won.kind == MemberKind::Field {
        return won.attrs.clone();
    }
    let paired_field = all
        .iter()
        .map(|&i| &cands[i].inner)
        .find(|c| c.kind == MemberKind::Field && c.depth == won.depth);
    match paired_field {
        Some(field) => won.attrs.merged_over(&field.attrs),
        None => won.attrs.clone(),
    }
}

// -----------------------------------------------------------------------------
// Creator parameter attributes

/// Attributes for a creator parameter: the parameter's own set layered over
/// same-named depth-0 methods, layered over a same-named depth-0 field.
pub(crate) fn param_attrs(param: &ParamDecl, name: &str, cands: &[NamedCandidate]) -> AttrSet {
    let mut attrs = AttrSet::new();
    for cand in cands.iter().filter(|c| c.name == name) {
        if cand.inner.depth == 0 && cand.inner.kind == MemberKind::Field {
            attrs = cand.inner.attrs.merged_over(&attrs);
        }
    }
    for cand in cands.iter().filter(|c| c.name == name) {
        if cand.inner.depth == 0 && cand.inner.kind != MemberKind::Field {
            attrs = cand.inner.attrs.merged_over(&attrs);
        }
    }
    param.attrs().merged_over(&attrs)
}

// -----------------------------------------------------------------------------
// Tests
