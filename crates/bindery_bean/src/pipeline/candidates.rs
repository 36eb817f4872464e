use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use bindery_decl::{
    AttrSet, ClassDecl, CreatorDecl, GetFn, MethodKind, ParentLink, SetFn, TypeRef, TypeTag, Vis,
};

use crate::error::BuildError;
use crate::resolve::{MemberKind, MemberRef};

// -----------------------------------------------------------------------------
// Type environments

/// Bindings from generic parameter names to concrete tags, scoped to one
/// declaration level.
pub(crate) type Env = HashMap<&'static str, TypeTag>;

/// Resolves a declared type reference against an environment.
pub(crate) fn resolve_ref(
    r: &TypeRef,
    env: &Env,
    owner_path: &'static str,
) -> Result<TypeTag, BuildError> {
    match *r {
        TypeRef::Concrete(tag) => Ok(tag),
        TypeRef::Var(param) => env.get(param).copied().ok_or(BuildError::UnboundTypeParam {
            type_path: owner_path,
            param,
        }),
    }
}

// -----------------------------------------------------------------------------
// Candidate

/// One raw member flattened out of the ancestry, with its projection depth
/// and thunks rebased onto the described type.
pub(crate) struct Candidate {
    pub(crate) depth: usize,
    pub(crate) kind: MemberKind,
    pub(crate) name: &'static str,
    pub(crate) ty: TypeTag,
    pub(crate) attrs: AttrSet,
    pub(crate) vis: Vis,
    pub(crate) is_static: bool,
    pub(crate) transient: bool,
    pub(crate) owner: TypeTag,
    pub(crate) get: Option<GetFn>,
    pub(crate) set: Option<SetFn>,
}

impl Candidate {
    pub(crate) fn member_ref(&self) -> MemberRef<'_> {
        MemberRef {
            kind: self.kind,
            name: Some(self.name),
            attrs: &self.attrs,
            vis: self.vis,
            is_static: self.is_static,
            transient: self.transient,
            owner: &self.owner,
            param_index: None,
        }
    }
}

/// Everything the later stages need from the declaration walk.
pub(crate) struct Gathered {
    pub(crate) members: Vec<Candidate>,
    pub(crate) creators: &'static [CreatorDecl],
    pub(crate) root_env: Env,
}

// -----------------------------------------------------------------------------
// Gathering

/// Walks the declaration and its ancestor chain into a flat candidate list.
///
/// Depth 0 is the described type itself and grows towards the root. Each
/// level's type environment starts from the parent link's argument bindings,
/// resolved in the child's environment, and falls back to the parent
/// declaration's own bindings. Thunks of inherited members are composed with
/// the upcast projections so they accept the described type directly.
pub(crate) fn gather(decl: &'static ClassDecl) -> Result<Gathered, BuildError> {
    let root_env: Env = decl.type_args().iter().copied().collect();

    let mut members = Vec::new();
    let mut chain: Vec<&'static ParentLink> = Vec::new();
    let mut env = root_env.clone();
    let mut current = decl;
    let mut depth = 0usize;

    loop {
        let owner = *current.ty();
        let owner_path = owner.path();

        for field in current.fields() {
            members.push(Candidate {
                depth,
                kind: MemberKind::Field,
                name: field.name(),
                ty: resolve_ref(field.ty(), &env, owner_path)?,
                attrs: field.attrs().clone(),
                vis: field.vis(),
                is_static: field.is_static(),
                transient: field.is_transient(),
                owner,
                get: Some(compose_get(&chain, field.get_fn().clone())),
                set: field.set_fn().map(|set| compose_set(&chain, set.clone())),
            });
        }

        for method in current.methods() {
            let kind = match method.kind() {
                MethodKind::Getter => MemberKind::Getter,
                MethodKind::Setter => MemberKind::Setter,
            };
            members.push(Candidate {
                depth,
                kind,
                name: method.name(),
                ty: resolve_ref(method.ty(), &env, owner_path)?,
                attrs: method.attrs().clone(),
                vis: method.vis(),
                is_static: method.is_static(),
                transient: false,
                owner,
                get: method.get_fn().map(|get| compose_get(&chain, get.clone())),
                set: method.set_fn().map(|set| compose_set(&chain, set.clone())),
            });
        }

        let Some(link) = current.parent() else {
            break;
        };
        let parent = link.decl();

        let mut parent_env = Env::new();
        for (param, r) in link.args() {
            parent_env.insert(param, resolve_ref(r, &env, owner_path)?);
        }
        // Link bindings win over whatever the parent recorded for itself.
        for (param, tag) in parent.type_args() {
            parent_env.entry(param).or_insert(*tag);
        }

        chain.push(link);
        env = parent_env;
        current = parent;
        depth += 1;
    }

    Ok(Gathered {
        members,
        creators: decl.creators(),
        root_env,
    })
}

fn compose_get(chain: &[&'static ParentLink], get: GetFn) -> GetFn {
    if chain.is_empty() {
        return get;
    }
    let chain: Arc<[&'static ParentLink]> = chain.into();
    Arc::new(move |bean: &dyn Any| {
        let mut target = bean;
        for link in chain.iter() {
            target = link.cast_ref(target)?;
        }
        get(target)
    })
}

fn compose_set(chain: &[&'static ParentLink], set: SetFn) -> SetFn {
    if chain.is_empty() {
        return set;
    }
    let chain: Arc<[&'static ParentLink]> = chain.into();
    Arc::new(move |bean: &mut dyn Any, value: Box<dyn Any>| {
        let mut target = bean;
        for link in chain.iter() {
            let Some(next) = link.cast_mut(target) else {
                return false;
            };
            target = next;
        }
        set(target, value)
    })
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::*;
    use bindery_decl::{DeclCell, Describe, FieldDecl, GenericDeclCell};

    #[derive(Default)]
    struct Base {
        id: u64,
    }

    struct Leaf {
        base: Base,
        label: String,
    }

    impl Describe for Base {
        fn class_decl() -> &'static ClassDecl {
            static CELL: DeclCell = DeclCell::new();
            CELL.get_or_build(|| {
                ClassDecl::new(TypeTag::bean::<Base>())
                    .with_field(FieldDecl::new(
                        "id",
                        TypeRef::of::<u64>(),
                        |b: &Base| b.id,
                        |b: &mut Base, v| b.id = v,
                    ))
                    .with_creator(CreatorDecl::no_args(Base::default))
            })
        }
    }

    impl Describe for Leaf {
        fn class_decl() -> &'static ClassDecl {
            static CELL: DeclCell = DeclCell::new();
            CELL.get_or_build(|| {
                ClassDecl::new(TypeTag::bean::<Leaf>())
                    .with_field(FieldDecl::new(
                        "label",
                        TypeRef::of::<String>(),
                        |l: &Leaf| l.label.clone(),
                        |l: &mut Leaf, v| l.label = v,
                    ))
                    .with_creator(CreatorDecl::no_args(|| Leaf {
                        base: Base::default(),
                        label: String::new(),
                    }))
                    .with_parent(ParentLink::new(
                        |l: &Leaf| &l.base,
                        |l: &mut Leaf| &mut l.base,
                    ))
            })
        }
    }

    #[test]
    fn gathers_ancestors_with_depth() {
        let gathered = gather(Leaf::class_decl()).unwrap();
        assert_eq!(gathered.members.len(), 2);

        let label = gathered.members.iter().find(|c| c.name == "label").unwrap();
        assert_eq!(label.depth, 0);
        assert!(label.owner.is::<Leaf>());
        assert!(label.ty.is::<String>());

        let id = gathered.members.iter().find(|c| c.name == "id").unwrap();
        assert_eq!(id.depth, 1);
        assert!(id.owner.is::<Base>());
        assert!(id.ty.is::<u64>());
    }

    #[test]
    fn inherited_thunks_project_through_the_child() {
        let gathered = gather(Leaf::class_decl()).unwrap();
        let id = gathered.members.iter().find(|c| c.name == "id").unwrap();

        let mut leaf = Leaf {
            base: Base { id: 7 },
            label: "x".into(),
        };

        let read = id.get.as_ref().unwrap()(&leaf).unwrap();
        assert_eq!(read.downcast_ref::<u64>(), Some(&7));

        let set = id.set.as_ref().unwrap();
        assert!(set(&mut leaf, Box::new(9u64)));
        assert_eq!(leaf.base.id, 9);

        // A value of the wrong type fails the projection, not the process.
        let mut other = 3u32;
        assert!(!set(&mut other, Box::new(9u64)));
    }

    #[derive(Default)]
    struct Holder<T: Any> {
        value: T,
    }

    impl<T: Any + Clone + Default> Describe for Holder<T> {
        fn class_decl() -> &'static ClassDecl {
            static CELL: GenericDeclCell = GenericDeclCell::new();
            CELL.get_or_build::<Self, _>(|| {
                ClassDecl::new(TypeTag::bean::<Self>())
                    .with_type_params(vec!["T"])
                    .with_field(FieldDecl::new(
                        "value",
                        TypeRef::var("T"),
                        |h: &Holder<T>| h.value.clone(),
                        |h: &mut Holder<T>, v| h.value = v,
                    ))
                    .with_creator(CreatorDecl::no_args(Holder::<T>::default))
            })
        }
    }

    #[derive(Default)]
    struct Tally {
        holder: Holder<u32>,
    }

    impl Describe for Tally {
        fn class_decl() -> &'static ClassDecl {
            static CELL: DeclCell = DeclCell::new();
            CELL.get_or_build(|| {
                ClassDecl::new(TypeTag::bean::<Tally>())
                    .with_creator(CreatorDecl::no_args(Tally::default))
                    .with_parent(
                        ParentLink::new(|t: &Tally| &t.holder, |t: &mut Tally| &mut t.holder)
                            .with_args(vec![("T", TypeRef::of::<u32>())]),
                    )
            })
        }
    }

    #[test]
    fn parent_args_bind_inherited_variables() {
        let gathered = gather(Tally::class_decl()).unwrap();
        let value = gathered.members.iter().find(|c| c.name == "value").unwrap();
        assert_eq!(value.depth, 1);
        assert!(value.ty.is::<u32>());

        let mut tally = Tally::default();
        assert!(value.set.as_ref().unwrap()(&mut tally, Box::new(5u32)));
        assert_eq!(tally.holder.value, 5);
    }

    #[test]
    fn unbound_parameter_fails_the_walk() {
        let decl: &'static ClassDecl = Box::leak(Box::new(
            ClassDecl::new(TypeTag::of::<Base>()).with_field(FieldDecl::new(
                "id",
                TypeRef::var("Q"),
                |b: &Base| b.id,
                |b: &mut Base, v| b.id = v,
            )),
        ));
        let err = gather(decl).err().unwrap();
        assert!(matches!(err, BuildError::UnboundTypeParam { param: "Q", .. }));
    }
}
