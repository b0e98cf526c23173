use alloc::format;
use alloc::vec::Vec;

use dec_reflect::diagnostics::{Category, Location};

use crate::def::Def;
use crate::engine::{Engine, EngineStatus};
use crate::handle::DefHandle;
use crate::hierarchy::Hierarchy;
use crate::loader::DefParser;

impl Engine {
    /// Starts loading definitions.
    ///
    /// Hierarchy problems of the registered types are reported here, the
    /// affected types are left out of the load. Loading into an engine
    /// which already holds a load is reported; call [`clear`](Self::clear)
    /// first.
    pub fn parser(&mut self) -> DefParser<'_> {
        let location = Location::new("<engine>", None);
        if self.status() != EngineStatus::Uninitialized {
            self.reporter.error(
                Category::Configuration,
                &location,
                format!(
                    "definitions are loaded more than once (engine is {:?}), call `clear` first",
                    self.status()
                ),
            );
        }

        let (hierarchy, errors) = Hierarchy::build(&self.directory);
        for error in errors {
            self.reporter.error(Category::Configuration, &location, format!("{error}"));
        }
        self.database.set_hierarchy(hierarchy);

        self.set_status(EngineStatus::Processing);
        DefParser::new(self)
    }

    /// Returns the definition of type `T` named `name`.
    #[inline]
    pub fn get<T: Def>(&self, name: &str) -> Option<DefHandle<T>> {
        self.database.get(name)
    }

    /// Returns every definition of type `T`, in registration order.
    #[inline]
    pub fn all<T: Def>(&self) -> Vec<DefHandle<T>> {
        self.database.all()
    }

    /// Drops every loaded definition and returns to
    /// [`EngineStatus::Uninitialized`]. Types and converters are kept.
    pub fn clear(&mut self) {
        self.database.clear();
        self.reporter.reset_counts();
        self.set_status(EngineStatus::Uninitialized);
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use alloc::string::String;
    use alloc::vec::Vec;

    use dec_reflect::{TypeHandle, impl_reflect_struct};

    use crate::def::Def;
    use crate::engine::EngineStatus;
    use crate::fixtures::{BaseDef, Fixture, ThingDef};

    struct Marker;

    #[derive(Default)]
    struct OrphanDef {
        size: u8,
    }

    impl_reflect_struct!(OrphanDef { size });

    impl Def for OrphanDef {
        fn base() -> Option<TypeHandle> {
            Some(TypeHandle::of::<Marker>())
        }
    }

    #[test]
    fn hierarchy_errors_are_reported_on_load() {
        let mut fx = Fixture::new();
        fx.engine.register_def::<OrphanDef>("Orphan");
        fx.load(
            r#"<Defs>
                <Orphan defName="O"><size>2</size></Orphan>
                <Base defName="A"><v>2</v></Base>
            </Defs>"#,
        );

        assert!(fx.collected.has_error("is not a registered definition type"));
        assert!(fx.collected.has_error("no valid hierarchy root"));
        assert!(fx.engine.get::<OrphanDef>("O").is_none());
        assert_eq!(fx.engine.get::<BaseDef>("A").unwrap().borrow().v, 2);

        // Registering the base later fixes the next load.
        fx.collected.clear();
        fx.engine.clear();
        fx.engine.register_abstract::<Marker>("Marker", None);
        fx.load(r#"<Defs><Orphan defName="O"><size>3</size></Orphan></Defs>"#);
        fx.assert_clean();
        assert_eq!(fx.engine.get::<OrphanDef>("O").unwrap().borrow().size, 3);
        assert_eq!(fx.engine.status(), EngineStatus::Finished);
    }

    #[test]
    fn all_lists_in_order() {
        let mut fx = Fixture::new();
        fx.load(
            r#"<Defs>
                <Thing defName="B" />
                <Base defName="X" />
                <Thing defName="A" />
            </Defs>"#,
        );
        fx.assert_clean();

        let names: Vec<String> = fx
            .engine
            .all::<ThingDef>()
            .iter()
            .map(|d| String::from(&*d.name()))
            .collect();
        assert_eq!(names, ["B", "A"]);
        assert_eq!(fx.engine.all::<BaseDef>().len(), 1);
    }
}
