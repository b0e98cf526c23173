//! The graph walker.
//!
//! [`read_value`] and [`write_value`] are the two entry points. Both take a
//! context ([`ReadCx`] / [`WriteCx`]) which carries the document, the
//! shared [`Env`] and the per-call reference tables.
//!
//! On read, the per-node metadata is handled first, in this order:
//!
//! 1. `null="true"` calls [`Reflect::parse_null`](crate::Reflect::parse_null).
//! 2. `ref="id"` calls [`Reflect::from_ref`](crate::Reflect::from_ref).
//! 3. `class="Type"` calls [`Reflect::apply_class`](crate::Reflect::apply_class).
//! 4. `mode="..."` is passed down to the type's `parse`.
//!
//! Any other attribute is reported as a likely typo. Then
//! [`dispatch_parse`] checks the converter registry for converter-eligible
//! kinds before calling the type's own [`Reflect::parse`](crate::Reflect::parse).
//!
//! The write side mirrors this in [`dispatch_compose`], and defers shared
//! objects to a [`WorkList`](dec_utils::WorkList) once the recursion depth
//! passes [`Limits::max_recursion_depth`].

// -----------------------------------------------------------------------------
// Modules

mod factories;
mod read;
mod write;

// -----------------------------------------------------------------------------
// Exports

pub use factories::Factories;
pub use read::{ReadCx, dispatch_parse, read_value, read_value_with};
pub use write::{WriteCx, WriteTask, dispatch_compose, write_value};

// -----------------------------------------------------------------------------
// Env

use alloc::rc::Rc;
use core::any::{Any, TypeId};

use crate::diagnostics::Reporter;
use crate::registry::{ConverterRegistry, TypeDirectory};

/// Depth settings of the walker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Depth below a reference record at which a shared object is promoted
    /// to a reference of its own, bounding read-side recursion.
    pub depth_limit: usize,
    /// Write-side recursion depth after which shared objects are deferred
    /// to the work-list instead of being written in place.
    pub max_recursion_depth: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            depth_limit: 20,
            max_recursion_depth: 100,
        }
    }
}

/// Everything a walk borrows from the engine: type directory, converters,
/// the reporter and, when definitions are loaded, a definition lookup.
#[derive(Clone, Copy)]
pub struct Env<'a> {
    pub directory: &'a TypeDirectory,
    pub converters: &'a ConverterRegistry,
    pub reporter: &'a Reporter,
    pub defs: Option<&'a dyn DefResolver>,
    pub limits: Limits,
}

impl<'a> Env<'a> {
    /// Creates an environment without definition lookups.
    pub fn new(
        directory: &'a TypeDirectory,
        converters: &'a ConverterRegistry,
        reporter: &'a Reporter,
    ) -> Self {
        Self {
            directory,
            converters,
            reporter,
            defs: None,
            limits: Limits::default(),
        }
    }

    /// Enables definition references.
    pub fn with_defs(mut self, defs: &'a dyn DefResolver) -> Self {
        self.defs = Some(defs);
        self
    }

    /// Replaces the depth settings.
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }
}

// -----------------------------------------------------------------------------
// DefResolver

/// Result of a definition lookup.
pub enum DefLookup {
    /// The registered definition, as its type-erased handle. Its type is
    /// the expected one or derives from it.
    Found(Rc<dyn Any>),
    /// No definition of that name in the hierarchy.
    Missing,
    /// The name belongs to a definition of the same hierarchy whose type
    /// is not the expected one and does not derive from it.
    Mismatch { found: &'static str },
    /// The expected type is not a definition type.
    NotADef,
}

/// Named definition lookups, implemented by the definition database.
///
/// Lookups are keyed by the hierarchy root of `expected` and the name.
pub trait DefResolver {
    fn resolve_def(&self, expected: TypeId, name: &str) -> DefLookup;
}
