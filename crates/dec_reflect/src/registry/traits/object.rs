use alloc::boxed::Box;

use crate::reflection::{Object, Reflect};
use crate::registry::FromType;

/// Creates boxed instances of a type, used for `class="..."` on
/// polymorphic slots.
#[derive(Clone, Copy)]
pub struct TypeTraitObject {
    func: fn() -> Box<dyn Object>,
}

impl TypeTraitObject {
    /// Creates a fresh instance.
    #[inline]
    pub fn create(&self) -> Box<dyn Object> {
        (self.func)()
    }
}

impl<T: Reflect> FromType<T> for TypeTraitObject {
    fn from_type() -> Self {
        Self {
            func: || Box::new(T::create()),
        }
    }
}
