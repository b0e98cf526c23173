use alloc::boxed::Box;
use core::any::Any;

// -----------------------------------------------------------------------------
// TypeTrait

/// A capability stored in the trait table of a [`TypeMeta`].
///
/// Any `Clone + 'static` type is a `TypeTrait`. They are usually small
/// tables of function pointers built through [`FromType`].
///
/// [`TypeMeta`]: crate::registry::TypeMeta
/// [`FromType`]: crate::registry::FromType
pub trait TypeTrait: Any {
    /// Clones the trait into a new box.
    fn clone_type_trait(&self) -> Box<dyn TypeTrait>;
}

impl<T: Clone + Any> TypeTrait for T {
    #[inline]
    fn clone_type_trait(&self) -> Box<dyn TypeTrait> {
        Box::new(self.clone())
    }
}

impl dyn TypeTrait {
    /// Returns `true` if the trait is a `T`.
    #[inline]
    pub fn is<T: TypeTrait>(&self) -> bool {
        (self as &dyn Any).is::<T>()
    }

    /// Downcasts to a concrete trait reference.
    #[inline]
    pub fn downcast_ref<T: TypeTrait>(&self) -> Option<&T> {
        (self as &dyn Any).downcast_ref::<T>()
    }

    /// Downcasts to a concrete mutable trait reference.
    #[inline]
    pub fn downcast_mut<T: TypeTrait>(&mut self) -> Option<&mut T> {
        (self as &mut dyn Any).downcast_mut::<T>()
    }
}

impl core::fmt::Debug for dyn TypeTrait {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("TypeTrait")
    }
}
