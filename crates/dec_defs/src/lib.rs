//! Named definitions on top of `dec_reflect`.
//!
//! A definition (def) is a named, registered value loaded from a `Defs`
//! document. Defs may inherit the content of other defs through `parent`,
//! and refer to each other by name through [`DefRef`].
//!
//! - [`Def`]: the trait a definition type implements, with its finalize hooks.
//! - [`DefHandle`], [`DefRef`] and [`AnyDefRef`]: shared handles to registered defs.
//! - [`Hierarchy`]: the declared base chains and their roots.
//! - [`Database`]: defs keyed by hierarchy root and name.
//! - [`DefParser`]: the two-pass loader, with parent inheritance and
//!   modules patching earlier ones.
//! - [`Engine`]: the context object owning all of the above.
//! - [`global`]: a thread-local [`Engine`] for hosts which want one.
//!
//! # Examples
//!
//! ```
//! use dec_defs::{Def, Engine, EngineConfig};
//! use dec_reflect::{TypeHandle, impl_reflect_struct};
//!
//! #[derive(Default)]
//! struct BaseDef {
//!     v: i32,
//! }
//!
//! #[derive(Default)]
//! struct ThingDef {
//!     base: BaseDef,
//!     w: i32,
//! }
//!
//! impl_reflect_struct!(BaseDef { v });
//! impl_reflect_struct!(ThingDef { ..base: BaseDef, w });
//!
//! impl Def for BaseDef {}
//! impl Def for ThingDef {
//!     fn base() -> Option<TypeHandle> {
//!         Some(TypeHandle::of::<BaseDef>())
//!     }
//! }
//!
//! let mut engine = Engine::new(EngineConfig::default());
//! engine.register_def::<BaseDef>("Base");
//! engine.register_def::<ThingDef>("Thing");
//!
//! let mut parser = engine.parser();
//! parser.add_string(
//!     r#"<Defs>
//!         <Base defName="B" abstract="true"><v>1</v></Base>
//!         <Thing defName="T" parent="B"><w>2</w></Thing>
//!     </Defs>"#,
//!     "things.xml",
//! );
//! parser.finish();
//!
//! let thing = engine.get::<ThingDef>("T").unwrap();
//! assert_eq!((thing.borrow().base.v, thing.borrow().w), (1, 2));
//! assert!(engine.get::<BaseDef>("B").is_none());
//! ```
#![cfg_attr(docsrs, feature(doc_cfg))]

extern crate alloc;

// -----------------------------------------------------------------------------
// Modules

mod config;
mod database;
mod def;
mod engine;
mod error;
mod handle;
mod hierarchy;
mod loader;

pub mod global;

#[cfg(test)]
mod fixtures;

// -----------------------------------------------------------------------------
// Exports

pub use config::EngineConfig;
pub use database::Database;
pub use def::{AnyDef, Def, DefInfo};
pub use engine::{Engine, EngineStatus};
pub use error::{DefError, HierarchyError};
pub use handle::{AnyDefRef, DefHandle, DefRef};
pub use hierarchy::{Hierarchy, TypeTraitDef, root_of};
pub use loader::{CORE_MODULE, DEF_ATTRS, DEFS_TAG, DefModule, DefParser, compose_defs, validate_name};
