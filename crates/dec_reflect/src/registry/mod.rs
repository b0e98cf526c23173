//! Type metadata and converters.
//!
//! ## Menu
//!
//! - [`TypeTrait`]: A capability attached to a registered type.
//! - [`FromType`]: Creates a `TypeTrait` from a type.
//! - [`TypeMeta`]: The dotted path, the kind and a [`TypeTrait`] table.
//! - [`TypeDirectory`]: Name to type resolution, with namespace prefixes.
//! - [`ConverterRegistry`]: Type to converter lookup, built once.
//! - TypeTraits:
//!     - [`TypeTraitShared`]: Creates and fills reference stubs.
//!     - [`TypeTraitObject`]: Creates polymorphic instances from a class name.

// -----------------------------------------------------------------------------
// Modules

mod converter;
mod from_type;
mod traits;
mod type_directory;
mod type_meta;
mod type_trait;

// -----------------------------------------------------------------------------
// Exports

pub use converter::{Converter, ConverterRegistry, ConverterRegistryBuilder};
pub use converter::{RecordConverter, TextConverter, TypeClaim};
pub use from_type::FromType;
pub use traits::{FillFn, TypeTraitObject, TypeTraitShared};
pub use type_directory::{Resolution, TypeDirectory, dotted_path};
pub use type_meta::TypeMeta;
pub use type_trait::TypeTrait;
