//! Definition types and an engine shared by the tests of this crate.

use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;
use core::cell::Cell;

use dec_reflect::diagnostics::{Collected, Reporter};
use dec_reflect::registry::{FromType, TypeDirectory};
use dec_reflect::{TypeHandle, impl_reflect_struct};

use crate::config::EngineConfig;
use crate::def::Def;
use crate::engine::Engine;
use crate::handle::DefRef;
use crate::hierarchy::{Hierarchy, TypeTraitDef};

thread_local! {
    static SETUP_COUNTER: Cell<usize> = const { Cell::new(0) };
}

#[derive(Debug, Default)]
pub struct BaseDef {
    pub v: i32,
    pub label: String,
}

#[derive(Debug, Default)]
pub struct ThingDef {
    pub base: BaseDef,
    pub w: i32,
}

#[derive(Debug, Default)]
pub struct ItemDef {
    pub damage: i32,
    pub weight: i32,
    pub upgrade: DefRef<ItemDef>,
    /// Position in the `post_load` order, not loaded.
    pub setup_order: Option<usize>,
}

impl_reflect_struct!(BaseDef { v, label });
impl_reflect_struct!(ThingDef { ..base: BaseDef, w });
impl_reflect_struct!(ItemDef { damage, weight, upgrade });

impl Def for BaseDef {}

impl Def for ThingDef {
    fn base() -> Option<TypeHandle> {
        Some(TypeHandle::of::<BaseDef>())
    }
}

impl Def for ItemDef {
    fn config_errors(&self, errors: &mut Vec<String>) {
        if self.weight > 100 {
            errors.push(format!("weight {} is over 100", self.weight));
        }
    }

    fn post_load(&mut self, _: &mut Vec<String>) {
        let order = SETUP_COUNTER.replace(SETUP_COUNTER.get() + 1);
        self.setup_order = Some(order);
    }
}

/// Registers `Base`, `Thing` and `Item`.
pub fn register_defs(directory: &mut TypeDirectory) {
    directory
        .register_as::<BaseDef>("Base")
        .insert_trait(<TypeTraitDef as FromType<BaseDef>>::from_type());
    directory
        .register_as::<ThingDef>("Thing")
        .insert_trait(<TypeTraitDef as FromType<ThingDef>>::from_type());
    directory
        .register_as::<ItemDef>("Item")
        .insert_trait(<TypeTraitDef as FromType<ItemDef>>::from_type());
}

pub struct Fixture {
    pub engine: Engine,
    pub collected: Collected,
}

impl Fixture {
    /// An engine with the fixture types, collecting its diagnostics.
    pub fn new() -> Self {
        SETUP_COUNTER.set(0);
        let (reporter, collected) = Reporter::collecting();
        let mut engine = Engine::new(EngineConfig::lenient()).with_reporter(reporter);
        register_defs(&mut engine.directory);
        engine
            .database
            .set_hierarchy(Hierarchy::build(&engine.directory).0);
        Self { engine, collected }
    }

    pub fn load(&mut self, input: &str) {
        self.load_all(&[input]);
    }

    /// Loads each input as its own document, in one parser.
    pub fn load_all(&mut self, inputs: &[&str]) {
        let mut parser = self.engine.parser();
        for (index, input) in inputs.iter().enumerate() {
            parser.add_string(input, &format!("defs{index}"));
        }
        parser.finish();
    }

    pub fn assert_clean(&self) {
        assert!(self.collected.errors().is_empty(), "{:?}", self.collected);
    }
}
