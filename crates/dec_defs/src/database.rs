use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::any::TypeId;

use dec_reflect::TypeHandle;
use dec_reflect::walker::{DefLookup, DefResolver};
use dec_utils::TypeIdMap;
use dec_utils::hash::HashMap;

use crate::def::{AnyDef, Def};
use crate::error::{DefError, HierarchyError};
use crate::handle::DefHandle;
use crate::hierarchy::Hierarchy;
use crate::loader::validate_name;

// -----------------------------------------------------------------------------
// Database

/// Registered definitions.
///
/// Names are unique per hierarchy root. Each concrete type also keeps its
/// definitions in registration order, which is the [`DefInfo::index`]
/// of each of them.
///
/// [`DefInfo::index`]: crate::DefInfo::index
///
/// # Examples
///
/// ```
/// use dec_defs::{Database, Def, Hierarchy};
/// use dec_defs::{TypeTraitDef};
/// use dec_reflect::impl_reflect_struct;
/// use dec_reflect::registry::{FromType, TypeDirectory};
///
/// #[derive(Default)]
/// struct ColorDef {
///     hue: f32,
/// }
/// impl_reflect_struct!(ColorDef { hue });
/// impl Def for ColorDef {}
///
/// let mut directory = TypeDirectory::new();
/// directory
///     .register_as::<ColorDef>("Color")
///     .insert_trait(<TypeTraitDef as FromType<ColorDef>>::from_type());
///
/// let mut database = Database::new();
/// database.set_hierarchy(Hierarchy::build(&directory).0);
///
/// let red = database.create::<ColorDef>("Red").unwrap();
/// red.borrow_mut().hue = 0.0;
/// assert_eq!(database.get::<ColorDef>("Red"), Some(red));
/// assert!(database.create::<ColorDef>("Red").is_err());
/// ```
#[derive(Default)]
pub struct Database {
    hierarchy: Hierarchy,
    lookup: TypeIdMap<HashMap<String, Rc<dyn AnyDef>>>,
    by_type: TypeIdMap<Vec<Rc<dyn AnyDef>>>,
    order: Vec<Rc<dyn AnyDef>>,
}

impl Database {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the hierarchy roots used to key names.
    #[inline]
    pub fn set_hierarchy(&mut self, hierarchy: Hierarchy) {
        self.hierarchy = hierarchy;
    }

    #[inline]
    pub fn hierarchy(&self) -> &Hierarchy {
        &self.hierarchy
    }

    /// Number of registered definitions.
    #[inline]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Every definition, in registration order.
    #[inline]
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &Rc<dyn AnyDef>> {
        self.order.iter()
    }

    /// Looks a definition up by concrete type and name.
    ///
    /// Returns `None` if the name is registered to another type of the
    /// same hierarchy.
    pub fn get<T: Def>(&self, name: &str) -> Option<DefHandle<T>> {
        let def = self.get_dyn(TypeId::of::<T>(), name)?;
        DefHandle::from_dyn(Rc::clone(def))
    }

    /// Looks a definition up by the hierarchy of `ty` and name.
    pub fn get_dyn(&self, ty: TypeId, name: &str) -> Option<&Rc<dyn AnyDef>> {
        let root = self.hierarchy.root(&ty)?;
        self.lookup.get(&root.id())?.get(name)
    }

    /// Every definition of concrete type `T`, in index order.
    pub fn all<T: Def>(&self) -> Vec<DefHandle<T>> {
        self.by_type
            .get_type::<T>()
            .map(|list| {
                list.iter()
                    .filter_map(|def| DefHandle::from_dyn(Rc::clone(def)))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Creates and registers a default-valued definition.
    pub fn create<T: Def>(&mut self, name: &str) -> Result<DefHandle<T>, DefError> {
        let root = self.root_for::<T>()?;
        self.check_name(root, name)?;

        let handle = DefHandle::new(name, T::create());
        self.insert(root.id(), handle.to_dyn());
        Ok(handle)
    }

    /// Removes a definition.
    ///
    /// References to it still hold the value; writing them emits
    /// `{name}_DELETED` and reports an error.
    pub fn delete<T: Def>(&mut self, handle: &DefHandle<T>) -> Result<(), DefError> {
        let def = handle.to_dyn();
        let root = self.registered_root(&def)?;
        self.remove(root.id(), &def);
        def.info().set_deleted(true);
        Ok(())
    }

    /// Renames a definition, keeping its registration order.
    pub fn rename<T: Def>(&mut self, handle: &DefHandle<T>, name: &str) -> Result<(), DefError> {
        let def = handle.to_dyn();
        let root = self.registered_root(&def)?;
        if *def.info().name() == *name {
            return Ok(());
        }
        self.check_name(root, name)?;

        let old = String::from(&*def.info().name());
        if let Some(names) = self.lookup.get_mut(&root.id()) {
            names.remove(&old);
            names.insert(String::from(name), Rc::clone(&def));
        }
        def.info().set_name(name);
        log::trace!("renamed definition `{old}` to `{name}`");
        Ok(())
    }

    /// Removes every definition. Hierarchy roots are kept.
    pub fn clear(&mut self) {
        self.lookup.clear();
        self.by_type.clear();
        self.order.clear();
        log::debug!("definition database cleared");
    }

    fn root_for<T: Def>(&self) -> Result<TypeHandle, DefError> {
        self.hierarchy.root(&TypeId::of::<T>()).ok_or_else(|| {
            DefError::Hierarchy(HierarchyError::NotADef {
                ty: T::type_path(),
            })
        })
    }

    fn check_name(&self, root: TypeHandle, name: &str) -> Result<(), DefError> {
        validate_name(name).map_err(|reason| DefError::InvalidName {
            name: String::from(name),
            reason,
        })?;
        if self
            .lookup
            .get(&root.id())
            .is_some_and(|names| names.contains_key(name))
        {
            return Err(DefError::Duplicate {
                root: root.type_path(),
                name: String::from(name),
            });
        }
        Ok(())
    }

    fn registered_root(&self, def: &Rc<dyn AnyDef>) -> Result<TypeHandle, DefError> {
        let name = def.info().name();
        let found = self.hierarchy.root(&def.def_type().id()).filter(|root| {
            self.lookup
                .get(&root.id())
                .and_then(|names| names.get(&*name))
                .is_some_and(|found| Rc::ptr_eq(found, def))
        });
        found.ok_or_else(|| DefError::NotRegistered {
            name: String::from(&*name),
        })
    }

    /// Registers a definition under `root`.
    ///
    /// A definition already registered under the same name is replaced in
    /// place, marked deleted and returned.
    pub(crate) fn insert(&mut self, root: TypeId, def: Rc<dyn AnyDef>) -> Option<Rc<dyn AnyDef>> {
        let name = String::from(&*def.info().name());
        let old = self
            .lookup
            .get_or_insert(root, HashMap::default)
            .insert(name, Rc::clone(&def));

        let ty = def.def_type().id();
        match old {
            Some(old) => {
                old.info().set_deleted(true);
                if let Some(slot) = self.order.iter_mut().find(|d| Rc::ptr_eq(&**d, &old)) {
                    *slot = Rc::clone(&def);
                }
                let old_ty = old.def_type().id();
                if old_ty == ty {
                    let index = old.info().index();
                    def.info().set_index(index);
                    if let Some(slot) = self.by_type.get_mut(&ty).and_then(|l| l.get_mut(index)) {
                        *slot = Rc::clone(&def);
                    }
                } else {
                    self.unlist(old_ty, &old);
                    self.list(ty, Rc::clone(&def));
                }
                Some(old)
            }
            None => {
                self.order.push(Rc::clone(&def));
                self.list(ty, def);
                None
            }
        }
    }

    fn remove(&mut self, root: TypeId, def: &Rc<dyn AnyDef>) {
        if let Some(names) = self.lookup.get_mut(&root) {
            names.remove(&*def.info().name());
        }
        self.order.retain(|d| !Rc::ptr_eq(d, def));
        self.unlist(def.def_type().id(), def);
    }

    fn list(&mut self, ty: TypeId, def: Rc<dyn AnyDef>) {
        let list = self.by_type.get_or_insert(ty, Vec::new);
        def.info().set_index(list.len());
        list.push(def);
    }

    fn unlist(&mut self, ty: TypeId, def: &Rc<dyn AnyDef>) {
        if let Some(list) = self.by_type.get_mut(&ty) {
            list.retain(|d| !Rc::ptr_eq(d, def));
            for (index, d) in list.iter().enumerate() {
                d.info().set_index(index);
            }
        }
    }
}

impl DefResolver for Database {
    fn resolve_def(&self, expected: TypeId, name: &str) -> DefLookup {
        let Some(root) = self.hierarchy.root(&expected) else {
            return DefLookup::NotADef;
        };
        let Some(def) = self.lookup.get(&root.id()).and_then(|names| names.get(name)) else {
            return DefLookup::Missing;
        };
        let found = def.def_type();
        if !self.hierarchy.derives_from(&found.id(), &expected) {
            return DefLookup::Mismatch {
                found: found.type_path(),
            };
        }
        // The handle travels as `Rc<Rc<dyn AnyDef>>` so callers can get
        // both the typed slot and the erased definition back.
        let handle: Rc<Rc<dyn AnyDef>> = Rc::new(Rc::clone(def));
        DefLookup::Found(handle)
    }
}

impl core::fmt::Debug for Database {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_list().entries(self.order.iter()).finish()
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use alloc::string::String;
    use alloc::vec::Vec;

    use dec_reflect::impl_reflect_struct;

    use crate::def::Def;
    use crate::error::DefError;
    use crate::fixtures::{BaseDef, Fixture, ItemDef, ThingDef};

    #[derive(Default)]
    struct UnregisteredDef;

    impl_reflect_struct!(UnregisteredDef {});
    impl Def for UnregisteredDef {}

    #[test]
    fn create_get_and_list() {
        let mut fx = Fixture::new();
        let db = &mut fx.engine.database;
        let sword = db.create::<ItemDef>("Sword").unwrap();
        let shield = db.create::<ItemDef>("Shield").unwrap();
        let base = db.create::<BaseDef>("Plain").unwrap();

        assert_eq!(db.len(), 3);
        assert_eq!(db.get::<ItemDef>("Shield"), Some(shield.clone()));
        assert_eq!(db.all::<ItemDef>(), [sword.clone(), shield.clone()]);
        assert_eq!((sword.info().index(), shield.info().index()), (0, 1));
        assert_eq!(base.info().index(), 0);
        assert!(db.get::<ItemDef>("Plain").is_none());
        assert!(db.get::<ThingDef>("Plain").is_none());
    }

    #[test]
    fn names_are_unique_per_root() {
        let mut fx = Fixture::new();
        let db = &mut fx.engine.database;
        db.create::<BaseDef>("Same").unwrap();
        db.create::<ItemDef>("Same").unwrap();

        assert!(matches!(
            db.create::<ThingDef>("Same"),
            Err(DefError::Duplicate { .. })
        ));
        assert!(matches!(
            db.create::<ItemDef>("two words"),
            Err(DefError::InvalidName { .. })
        ));
        assert!(matches!(db.create::<UnregisteredDef>("X"), Err(DefError::Hierarchy(_))));
    }

    #[test]
    fn delete_and_rename() {
        let mut fx = Fixture::new();
        let db = &mut fx.engine.database;
        let a = db.create::<ItemDef>("A").unwrap();
        let b = db.create::<ItemDef>("B").unwrap();
        let c = db.create::<ItemDef>("C").unwrap();

        db.delete(&b).unwrap();
        assert!(b.info().is_deleted());
        assert!(db.get::<ItemDef>("B").is_none());
        assert_eq!(c.info().index(), 1);
        assert!(matches!(db.delete(&b), Err(DefError::NotRegistered { .. })));

        assert!(matches!(db.rename(&a, "C"), Err(DefError::Duplicate { .. })));
        db.rename(&a, "First").unwrap();
        assert_eq!(&*a.name(), "First");
        assert_eq!(db.get::<ItemDef>("First"), Some(a.clone()));
        assert!(db.get::<ItemDef>("A").is_none());

        let names: Vec<String> = db.iter().map(|d| String::from(&*d.info().name())).collect();
        assert_eq!(names, ["First", "C"]);

        db.clear();
        assert!(db.is_empty());
        assert!(db.all::<ItemDef>().is_empty());
    }
}
