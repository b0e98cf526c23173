mod object;
mod shared;

pub use object::TypeTraitObject;
pub use shared::{FillFn, TypeTraitShared};
