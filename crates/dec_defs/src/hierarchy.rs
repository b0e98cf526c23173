use alloc::rc::Rc;
use alloc::vec::Vec;
use core::any::TypeId;

use dec_reflect::TypeHandle;
use dec_reflect::registry::{FromType, TypeDirectory};
use dec_utils::TypeIdMap;
use dec_utils::hash::HashSet;

use crate::def::{AnyDef, Def};
use crate::error::HierarchyError;
use crate::handle::DefSlot;

// -----------------------------------------------------------------------------
// TypeTraitDef

/// Marks a registered type as a definition type.
///
/// Concrete types get it through [`FromType`]; abstract bases, which are
/// only named and never instantiated, through [`TypeTraitDef::abstract_base`]
/// on a [`TypeMeta::opaque`](dec_reflect::registry::TypeMeta::opaque) entry.
#[derive(Clone, Copy)]
pub struct TypeTraitDef {
    make: Option<fn() -> Rc<dyn AnyDef>>,
    base: Option<TypeHandle>,
}

impl TypeTraitDef {
    /// An abstract definition type with an optional base of its own.
    #[inline]
    pub const fn abstract_base(base: Option<TypeHandle>) -> Self {
        Self { make: None, base }
    }

    #[inline]
    pub fn is_abstract(&self) -> bool {
        self.make.is_none()
    }

    #[inline]
    pub fn base(&self) -> Option<TypeHandle> {
        self.base
    }

    /// Creates an unnamed, default-valued definition.
    ///
    /// Returns `None` for abstract types.
    #[inline]
    pub fn make(&self) -> Option<Rc<dyn AnyDef>> {
        self.make.map(|make| make())
    }
}

impl<T: Def> FromType<T> for TypeTraitDef {
    fn from_type() -> Self {
        Self {
            make: Some(|| -> Rc<dyn AnyDef> { Rc::new(DefSlot::new("", T::create())) }),
            base: T::base(),
        }
    }
}

// -----------------------------------------------------------------------------
// Roots

fn def_trait<'d>(directory: &'d TypeDirectory, handle: TypeHandle) -> Option<&'d TypeTraitDef> {
    directory.get(&handle.id())?.get_trait::<TypeTraitDef>()
}

/// Finds the hierarchy root of a definition type: the highest
/// non-abstract type on its base chain.
///
/// The root partitions definition names, two definitions may only share a
/// name if their roots differ.
pub fn root_of(directory: &TypeDirectory, ty: TypeHandle) -> Result<TypeHandle, HierarchyError> {
    let Some(def) = def_trait(directory, ty) else {
        return Err(HierarchyError::NotADef {
            ty: ty.type_path(),
        });
    };
    if def.is_abstract() {
        return Err(HierarchyError::AbstractDef {
            ty: ty.type_path(),
        });
    }

    let mut root = ty;
    let mut visited: HashSet<TypeId> = HashSet::default();
    visited.insert(ty.id());

    let mut current = ty;
    let mut next = def.base();
    while let Some(base) = next {
        if !visited.insert(base.id()) {
            return Err(HierarchyError::Cycle {
                ty: ty.type_path(),
            });
        }
        let Some(base_def) = def_trait(directory, base) else {
            return Err(HierarchyError::MissingBase {
                ty: current.type_path(),
                base: base.type_path(),
            });
        };
        if !base_def.is_abstract() {
            root = base;
        }
        current = base;
        next = base_def.base();
    }
    Ok(root)
}

// -----------------------------------------------------------------------------
// Hierarchy

fn base_chain(directory: &TypeDirectory, ty: TypeHandle) -> Vec<TypeId> {
    let mut chain = Vec::new();
    let mut next = def_trait(directory, ty).and_then(TypeTraitDef::base);
    while let Some(base) = next {
        chain.push(base.id());
        next = def_trait(directory, base).and_then(TypeTraitDef::base);
    }
    chain
}

/// The hierarchy roots of every concrete definition type of a directory,
/// with the base chain of each.
#[derive(Debug, Default, Clone)]
pub struct Hierarchy {
    roots: TypeIdMap<TypeHandle>,
    bases: TypeIdMap<Vec<TypeId>>,
}

impl Hierarchy {
    /// Creates an empty hierarchy, in which no type is a definition type.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Computes the roots of every registered definition type.
    ///
    /// Types with a broken base chain are left out and their problem is
    /// returned.
    pub fn build(directory: &TypeDirectory) -> (Self, Vec<HierarchyError>) {
        let mut hierarchy = Self::new();
        let mut errors = Vec::new();
        for meta in directory.iter() {
            let Some(def) = meta.get_trait::<TypeTraitDef>() else {
                continue;
            };
            if def.is_abstract() {
                continue;
            }
            let handle = TypeHandle::from_meta(meta);
            match root_of(directory, handle) {
                Ok(root) => {
                    hierarchy.roots.insert(meta.id(), root);
                    hierarchy.bases.insert(meta.id(), base_chain(directory, handle));
                }
                Err(error) => errors.push(error),
            }
        }
        (hierarchy, errors)
    }

    /// The root of a concrete definition type.
    #[inline]
    pub fn root(&self, ty: &TypeId) -> Option<TypeHandle> {
        self.roots.get(ty).copied()
    }

    /// Returns `true` if the concrete definition type `ty` is `of` or
    /// derives from it, abstract bases included.
    pub fn derives_from(&self, ty: &TypeId, of: &TypeId) -> bool {
        (ty == of && self.contains(ty))
            || self.bases.get(ty).is_some_and(|chain| chain.contains(of))
    }

    #[inline]
    pub fn contains(&self, ty: &TypeId) -> bool {
        self.roots.contains(ty)
    }

    /// Number of concrete definition types.
    #[inline]
    pub fn len(&self) -> usize {
        self.roots.len()
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use core::any::TypeId;

    use dec_reflect::registry::{FromType, TypeDirectory, TypeMeta};
    use dec_reflect::{TypeHandle, impl_reflect_struct};

    use super::{Hierarchy, TypeTraitDef, root_of};
    use crate::def::Def;
    use crate::error::HierarchyError;
    use crate::fixtures::{BaseDef, ItemDef, ThingDef, register_defs};

    struct Abstract;

    #[derive(Default)]
    struct LoopA;

    #[derive(Default)]
    struct LoopB;

    impl_reflect_struct!(LoopA {});
    impl_reflect_struct!(LoopB {});

    impl Def for LoopA {
        fn base() -> Option<TypeHandle> {
            Some(TypeHandle::of::<LoopB>())
        }
    }

    impl Def for LoopB {
        fn base() -> Option<TypeHandle> {
            Some(TypeHandle::of::<LoopA>())
        }
    }

    #[test]
    fn roots_follow_the_base_chain() {
        let mut directory = TypeDirectory::new();
        register_defs(&mut directory);

        let (hierarchy, errors) = Hierarchy::build(&directory);
        assert!(errors.is_empty(), "{errors:?}");
        assert_eq!(hierarchy.root(&TypeId::of::<BaseDef>()).map(|r| r.id()), Some(TypeId::of::<BaseDef>()));
        assert_eq!(hierarchy.root(&TypeId::of::<ThingDef>()).map(|r| r.id()), Some(TypeId::of::<BaseDef>()));
        assert_eq!(hierarchy.root(&TypeId::of::<ItemDef>()).map(|r| r.id()), Some(TypeId::of::<ItemDef>()));
        assert!(!hierarchy.contains(&TypeId::of::<i32>()));

        let (base, thing, item) = (
            TypeId::of::<BaseDef>(),
            TypeId::of::<ThingDef>(),
            TypeId::of::<ItemDef>(),
        );
        assert!(hierarchy.derives_from(&thing, &base));
        assert!(hierarchy.derives_from(&thing, &thing));
        assert!(!hierarchy.derives_from(&base, &thing));
        assert!(!hierarchy.derives_from(&item, &base));
    }

    #[test]
    fn abstract_bases_are_skipped() {
        let mut directory = TypeDirectory::new();
        register_defs(&mut directory);
        let mut meta = TypeMeta::opaque::<Abstract>().with_path("Abstract");
        meta.insert_trait(TypeTraitDef::abstract_base(None));
        directory.insert(meta);

        assert_eq!(
            root_of(&directory, TypeHandle::of::<Abstract>()),
            Err(HierarchyError::AbstractDef {
                ty: core::any::type_name::<Abstract>()
            })
        );
        let (hierarchy, errors) = Hierarchy::build(&directory);
        assert!(errors.is_empty());
        assert_eq!(hierarchy.len(), 3);
    }

    #[test]
    fn broken_chains_are_errors() {
        let mut directory = TypeDirectory::new();
        directory
            .register_as::<LoopA>("LoopA")
            .insert_trait(<TypeTraitDef as FromType<LoopA>>::from_type());
        directory
            .register_as::<LoopB>("LoopB")
            .insert_trait(<TypeTraitDef as FromType<LoopB>>::from_type());
        assert!(matches!(
            root_of(&directory, TypeHandle::of::<LoopA>()),
            Err(HierarchyError::Cycle { .. })
        ));

        let mut directory = TypeDirectory::new();
        directory
            .register_as::<ThingDef>("Thing")
            .insert_trait(<TypeTraitDef as FromType<ThingDef>>::from_type());
        let (hierarchy, errors) = Hierarchy::build(&directory);
        assert_eq!(hierarchy.len(), 0);
        assert!(matches!(errors[..], [HierarchyError::MissingBase { .. }]));
        assert!(matches!(
            root_of(&directory, TypeHandle::of::<i32>()),
            Err(HierarchyError::NotADef { .. })
        ));
    }
}
