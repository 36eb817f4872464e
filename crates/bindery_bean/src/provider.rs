use std::any::TypeId;
use std::sync::{Arc, PoisonError};

use bindery_decl::{Describe, TypeTag};

use crate::binder::Binder;
use crate::convert::{BeanConvert, Convert};
use crate::descriptor::BeanDescriptor;
use crate::error::{BindError, BuildError};
use crate::pipeline::assemble;

// -----------------------------------------------------------------------------
// BuildGuard

/// Tracks the types currently being assembled on this call path, so a
/// declaration cycle defers the nested build instead of recursing forever.
pub(crate) struct BuildGuard {
    in_progress: Vec<TypeId>,
}

impl BuildGuard {
    pub(crate) fn new() -> Self {
        Self {
            in_progress: Vec::new(),
        }
    }

    fn contains(&self, id: TypeId) -> bool {
        self.in_progress.contains(&id)
    }

    fn push(&mut self, id: TypeId) {
        self.in_progress.push(id);
    }

    fn pop(&mut self) {
        self.in_progress.pop();
    }
}

// -----------------------------------------------------------------------------
// Descriptor provision

impl Binder {
    /// The descriptor for `T`, built on first use and cached.
    ///
    /// Failed builds are not cached; the error is reported again on every
    /// attempt and other types are unaffected.
    pub fn descriptor<T: Describe>(&self) -> Result<Arc<BeanDescriptor>, BuildError> {
        self.descriptor_for(&T::tag())
    }

    /// The descriptor for a tagged type. The tag must carry a declaration.
    pub fn descriptor_for(&self, tag: &TypeTag) -> Result<Arc<BeanDescriptor>, BuildError> {
        let mut guard = BuildGuard::new();
        self.descriptor_for_guarded(tag, &mut guard)
    }

    pub(crate) fn descriptor_for_guarded(
        &self,
        tag: &TypeTag,
        guard: &mut BuildGuard,
    ) -> Result<Arc<BeanDescriptor>, BuildError> {
        {
            let cache = self.cache().read().unwrap_or_else(PoisonError::into_inner);
            if let Some(descriptor) = cache.get(&tag.id()) {
                return Ok(descriptor.clone());
            }
        }

        let decl = tag.decl().ok_or(BuildError::MissingDecl {
            type_path: tag.path(),
        })?;
        if self.config().verify_decl && decl.ty().id() != tag.id() {
            return Err(BuildError::DeclMismatch {
                requested: tag.path(),
                declared: decl.ty().path(),
            });
        }

        guard.push(tag.id());
        let built = assemble(self, decl, guard);
        guard.pop();
        let built = built?;

        // Concurrent builders race to insert; the first one wins and the
        // losing build is discarded, so every caller shares one descriptor.
        let mut cache = self
            .cache()
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        Ok(cache
            .entry(tag.id())
            .or_insert_with(|| Arc::new(built))
            .clone())
    }

    /// A converter for the tagged type, if one can be provided: registered
    /// converters first, then a bean converter when the tag carries a
    /// declaration.
    ///
    /// Bean descriptors are warmed eagerly so a nested build error surfaces
    /// here rather than mid-conversion; a cycle back into a type already
    /// being assembled is left for lazy resolution.
    pub(crate) fn try_converter(
        &self,
        tag: &TypeTag,
        guard: &mut BuildGuard,
    ) -> Result<Option<Arc<dyn Convert>>, BuildError> {
        if let Some(convert) = self.converters().get(&tag.id()) {
            return Ok(Some(convert.clone()));
        }
        if tag.decl().is_some() {
            if !guard.contains(tag.id()) {
                self.descriptor_for_guarded(tag, guard)?;
            }
            return Ok(Some(Arc::new(BeanConvert::new(*tag))));
        }
        Ok(None)
    }

    /// Run-time converter lookup for container elements.
    pub(crate) fn element_converter(
        &self,
        tag: &TypeTag,
        container: &'static str,
    ) -> Result<Arc<dyn Convert>, BindError> {
        if let Some(convert) = self.converters().get(&tag.id()) {
            return Ok(convert.clone());
        }
        if tag.decl().is_some() {
            return Ok(Arc::new(BeanConvert::new(*tag)));
        }
        Err(BuildError::NoConverter {
            value_type: tag.path(),
            context: format!("elements of `{container}`"),
        }
        .into())
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::*;
    use bindery_decl::{ClassDecl, CreatorDecl, DeclCell, FieldDecl, TypeRef};

    #[derive(Default)]
    struct Wheel {
        spokes: u32,
    }

    impl Describe for Wheel {
        fn class_decl() -> &'static ClassDecl {
            static CELL: DeclCell = DeclCell::new();
            CELL.get_or_build(|| {
                ClassDecl::new(TypeTag::bean::<Wheel>())
                    .with_field(FieldDecl::new(
                        "spokes",
                        TypeRef::of::<u32>(),
                        |w: &Wheel| w.spokes,
                        |w: &mut Wheel, v| w.spokes = v,
                    ))
                    .with_creator(CreatorDecl::no_args(Wheel::default))
            })
        }
    }

    #[test]
    fn descriptors_are_cached_per_type() {
        let binder = Binder::new();
        let first = binder.descriptor::<Wheel>().unwrap();
        let second = binder.descriptor::<Wheel>().unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        // Clones share the cache.
        let third = binder.clone().descriptor::<Wheel>().unwrap();
        assert!(Arc::ptr_eq(&first, &third));
    }

    #[test]
    fn undeclared_tags_are_refused() {
        let binder = Binder::new();
        let err = binder.descriptor_for(&TypeTag::of::<Wheel>()).unwrap_err();
        assert!(matches!(err, BuildError::MissingDecl { .. }));
    }

    #[test]
    fn concurrent_builders_share_one_descriptor() {
        let binder = Binder::new();
        let descriptors: Vec<Arc<BeanDescriptor>> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..4)
                .map(|_| scope.spawn(|| binder.descriptor::<Wheel>().unwrap()))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        for pair in descriptors.windows(2) {
            assert!(Arc::ptr_eq(&pair[0], &pair[1]));
        }
    }
}
