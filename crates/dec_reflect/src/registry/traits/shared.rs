use alloc::rc::Rc;
use core::any::Any;
use core::cell::RefCell;

use crate::document::NodeId;
use crate::reflection::Reflect;
use crate::refs::fill_stub;
use crate::registry::FromType;
use crate::walker::ReadCx;

/// Reads the content of a reference record into its stub.
///
/// Returns the value now held by the slot, which must be the stub itself.
pub type FillFn = fn(Rc<dyn Any>, &mut ReadCx<'_>, NodeId) -> Option<Rc<dyn Any>>;

/// Creates and fills reference stubs of a type.
///
/// Only registered for kinds which may be reference targets.
#[derive(Clone, Copy)]
pub struct TypeTraitShared {
    make: fn() -> Rc<dyn Any>,
    fill: FillFn,
}

impl TypeTraitShared {
    /// Creates an empty stub, a `Shared<T>` holding `T::create()`.
    #[inline]
    pub fn make_stub(&self) -> Rc<dyn Any> {
        (self.make)()
    }

    /// Returns the fill function.
    #[inline]
    pub fn fill_fn(&self) -> FillFn {
        self.fill
    }
}

impl<T: Reflect> FromType<T> for TypeTraitShared {
    fn from_type() -> Self {
        Self {
            make: || Rc::new(RefCell::new(T::create())),
            fill: fill_stub::<T>,
        }
    }
}
