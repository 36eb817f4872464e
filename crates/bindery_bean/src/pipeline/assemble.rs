use std::collections::HashMap;

use bindery_decl::{ClassDecl, Vis};

use crate::binder::Binder;
use crate::descriptor::{
    BeanDescriptor, BoundCreator, BoundParam, PropertyAccessor, PropertyMutator, SkippedMember,
};
use crate::error::BuildError;
use crate::provider::BuildGuard;
use crate::resolve::{AccessResolve, MemberKind, MemberRef, NameResolve, Vote};

use super::candidates::{gather, resolve_ref};
use super::creator::select_creator;
use super::merge::{NamedCandidate, merge, param_attrs};

// -----------------------------------------------------------------------------
// Assembly

/// Runs the full pipeline for one declaration and binds the result.
///
/// Candidates whose name stays unresolved are dropped with a diagnostic;
/// everything else that fails here fails the whole build for this type.
pub(crate) fn assemble(
    binder: &Binder,
    decl: &'static ClassDecl,
    guard: &mut BuildGuard,
) -> Result<BeanDescriptor, BuildError> {
    let type_path = decl.ty().path();
    let gathered = gather(decl)?;

    let mut named = Vec::with_capacity(gathered.members.len());
    let mut skipped = Vec::new();
    for cand in gathered.members {
        let member = cand.member_ref();
        let Some(name) = binder.names().resolve(&member) else {
            skipped.push(SkippedMember {
                member: member.describe(),
                reason: "no resolver produced a property name".to_string(),
            });
            continue;
        };
        let accessor_vote = binder.access().is_accessor(&member)?;
        let mutator_vote = binder.access().is_mutator(&member)?;
        let serves_accessor = cand.get.is_some() && accessor_vote == Vote::Yes;
        let serves_mutator = cand.set.is_some() && mutator_vote == Vote::Yes;
        named.push(NamedCandidate {
            name: name.into_owned(),
            serves_accessor,
            serves_mutator,
            inner: cand,
        });
    }

    let properties = merge(&named)?;
    let chosen = select_creator(type_path, gathered.creators, binder.config())?;

    let mut params = Vec::with_capacity(chosen.params().len());
    for (index, param) in chosen.params().iter().enumerate() {
        let member = MemberRef {
            kind: MemberKind::Param,
            name: param.name(),
            attrs: param.attrs(),
            vis: Vis::Public,
            is_static: false,
            transient: false,
            owner: decl.ty(),
            param_index: Some(index),
        };
        let Some(name) = binder.names().resolve(&member) else {
            return Err(BuildError::UnnamedCreatorParam { type_path, index });
        };
        let ty = resolve_ref(param.ty(), &gathered.root_env, type_path)?;
        let convert =
            binder
                .try_converter(&ty, guard)?
                .ok_or_else(|| BuildError::NoConverter {
                    value_type: ty.path(),
                    context: format!("creator parameter `{name}` of `{type_path}`"),
                })?;
        let attrs = param_attrs(param, &name, &named);
        params.push(BoundParam {
            name: name.into_owned(),
            ty,
            attrs,
            convert,
        });
    }

    // Properties arrive name-ordered from the merge, which keeps the
    // accessor list sorted for lookup.
    let mut accessors = Vec::new();
    let mut mutators = HashMap::new();
    for prop in properties {
        if let Some(winner) = prop.accessor
            && let Some(get) = named[winner.index].inner.get.clone()
        {
            let cand = &named[winner.index].inner;
            let convert =
                binder
                    .try_converter(&cand.ty, guard)?
                    .ok_or_else(|| BuildError::NoConverter {
                        value_type: cand.ty.path(),
                        context: format!("property `{}` of `{}`", prop.name, type_path),
                    })?;
            accessors.push(PropertyAccessor {
                name: prop.name.clone(),
                ty: cand.ty,
                attrs: winner.attrs,
                declared_by: type_path,
                get,
                convert,
            });
        }
        if let Some(winner) = prop.mutator
            && let Some(set) = named[winner.index].inner.set.clone()
        {
            let cand = &named[winner.index].inner;
            let convert =
                binder
                    .try_converter(&cand.ty, guard)?
                    .ok_or_else(|| BuildError::NoConverter {
                        value_type: cand.ty.path(),
                        context: format!("property `{}` of `{}`", prop.name, type_path),
                    })?;
            mutators.insert(
                prop.name.clone(),
                PropertyMutator {
                    name: prop.name,
                    ty: cand.ty,
                    attrs: winner.attrs,
                    declared_by: type_path,
                    set,
                    convert,
                },
            );
        }
    }

    Ok(BeanDescriptor {
        declared: *decl.ty(),
        accessors,
        mutators,
        creator: BoundCreator {
            owner: type_path,
            decl: chosen,
            params,
        },
        skipped,
    })
}
