//! Typed object-graph walking for the `dec` engine.
//!
//! This crate turns live Rust values into a textual node tree and back.
//! It is the core used both for definition files and for persisted graphs
//! (save files), and it owns every piece that touches a single value:
//!
//! - [`diagnostics`]: severity-tagged reporting, location-tagged errors.
//! - [`document`]: the node arena and its XML form.
//! - [`registry`]: the [`TypeDirectory`](registry::TypeDirectory) and
//!   the [`ConverterRegistry`](registry::ConverterRegistry).
//! - [`reflection`]: the [`Reflect`] dispatch trait, self-describing
//!   [`Recordable`](reflection::Recordable) types and field descriptors.
//! - [`walker`]: read and write contexts, the dispatch order.
//! - [`refs`]: identity tracking on write, stubs on read, [`Shared`](refs::Shared).
//! - [`record`]: whole-document entry points, `write`, `read` and `deep_clone`.
//!
//! # Dispatch order
//!
//! Every node goes through the same order, first match wins:
//!
//! 1. `null="true"` marker.
//! 2. `ref="..."` marker, resolved against the reference table.
//! 3. Primitives, 4. strings, 5. enums, 6. type handles,
//!    7. definition references: text conversions implemented by the type.
//! 8. A converter registered for the type.
//! 9. A [`Recordable`](reflection::Recordable) type.
//! 10. Collections, element by element.
//! 11. Field descriptors generated by [`impl_reflect_struct!`].
//!
//! Data problems never abort a walk. Each branch falls back to a default
//! value and reports a [`Diagnostic`](diagnostics::Diagnostic) through the
//! [`Reporter`](diagnostics::Reporter).
#![cfg_attr(docsrs, feature(doc_cfg))]

// -----------------------------------------------------------------------------
// Extern Self

// Usually, we need to use `crate` in the crate itself and use `dec_reflect` in doc testing.
// But `macro_rules` can only use fixed path, so we use `extern crate self as dec_reflect`.
extern crate self as dec_reflect;

extern crate alloc;

// -----------------------------------------------------------------------------
// Modules

mod compat;
mod impls;

pub mod diagnostics;
pub mod document;
pub mod record;
pub mod reflection;
pub mod refs;
pub mod registry;
pub mod walker;

// -----------------------------------------------------------------------------
// Top-level exports

pub use impls::{Converted, TypeHandle};
pub use reflection::{Object, ParseMode, Recordable, Recorder, Reflect, ReflectKind};
pub use refs::{Shared, shared};

// -----------------------------------------------------------------------------
// Macro paths

#[doc(hidden)]
pub mod __macro_exports {
    pub use std::sync::OnceLock;
}
