use alloc::string::String;

use dec_reflect::registry::{FromType, TypeMeta};
use dec_reflect::{Reflect, TypeHandle};

use crate::def::Def;
use crate::engine::Engine;
use crate::hierarchy::{Hierarchy, TypeTraitDef};

impl Engine {
    /// Registers a value type under `name`.
    #[inline]
    pub fn register<T: Reflect>(&mut self, name: impl Into<String>) -> &mut TypeMeta {
        self.directory.register_as::<T>(name)
    }

    /// Registers a definition type under `name`.
    ///
    /// Its base, if any, must be registered before definitions are
    /// loaded, in any order.
    pub fn register_def<T: Def>(&mut self, name: impl Into<String>) {
        self.directory
            .register_as::<T>(name)
            .insert_trait(<TypeTraitDef as FromType<T>>::from_type());
        self.refresh_hierarchy();
    }

    /// Registers a type which is only used as a base of definition types
    /// and never instantiated.
    pub fn register_abstract<T: ?Sized + 'static>(
        &mut self,
        name: impl Into<String>,
        base: Option<TypeHandle>,
    ) {
        let mut meta = TypeMeta::opaque::<T>().with_path(name);
        meta.insert_trait(TypeTraitDef::abstract_base(base));
        self.directory.insert(meta);
        self.refresh_hierarchy();
    }

    /// Recomputes hierarchy roots. Broken chains are reported when a
    /// parser is created, not here, since bases may be registered later.
    fn refresh_hierarchy(&mut self) {
        let (hierarchy, _) = Hierarchy::build(&self.directory);
        self.database.set_hierarchy(hierarchy);
    }
}
