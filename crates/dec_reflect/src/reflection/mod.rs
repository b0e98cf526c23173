//! The dispatch traits.
//!
//! - [`Reflect`]: implemented by every walkable type, statically dispatched.
//! - [`Object`]: the object-safe form of `Reflect`, for polymorphic slots
//!   and field descriptors.
//! - [`Recordable`]: self-describing types, one `record` call per field
//!   used for both directions.
//! - [`Struct`]: field descriptors generated by [`impl_reflect_struct!`].
//!
//! [`impl_reflect_struct!`]: crate::impl_reflect_struct

// -----------------------------------------------------------------------------
// Modules

mod enums;
mod recordable;
mod reflect;
mod structs;

// -----------------------------------------------------------------------------
// Exports

pub use enums::{enum_from_text, parse_enum};
pub use recordable::{Direction, Recordable, Recorder, compose_record, parse_record};
pub use reflect::{Object, ParseMode, Reflect, ReflectKind};
pub use structs::{FieldSet, Struct, StructInfo, StructInfoBuilder, compose_struct, parse_struct};
