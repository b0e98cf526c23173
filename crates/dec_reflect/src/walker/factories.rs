use alloc::boxed::Box;
use alloc::rc::Rc;
use core::any::TypeId;
use core::fmt;

use dec_utils::TypeIdMap;

use crate::reflection::{Object, Reflect};

type Maker = Rc<dyn Fn() -> Box<dyn Object>>;

// -----------------------------------------------------------------------------
// Factories

/// Host-supplied constructors for values created while reading.
///
/// Given to [`Recorder::record_with`](crate::Recorder::record_with), a
/// table replaces [`Reflect::create`] for the values created below that
/// field: the field itself when it is an empty `Option`, list items, map
/// entries, set elements, the content of new [`Shared`](crate::Shared)
/// values and `class` instances of `Box<dyn Object>` slots. The created
/// value is then read as usual, so fields the node leaves out keep what
/// the factory set.
///
/// The table stops at the next [`Recordable`](crate::Recordable): its own
/// fields are created without factories unless it passes them on. Reference
/// records are created before any field is read and never use factories.
///
/// Cloning is cheap, the constructors are shared.
///
/// # Examples
///
/// ```
/// use dec_reflect::walker::Factories;
///
/// let factories = Factories::new().with(|| 50_i32);
/// assert!(factories.contains::<i32>());
/// assert!(!factories.contains::<u8>());
/// ```
#[derive(Clone, Default)]
pub struct Factories {
    makers: Rc<TypeIdMap<Maker>>,
}

impl Factories {
    /// Creates an empty table.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the constructor of `T`, replacing an earlier one.
    pub fn with<T: Reflect>(mut self, make: impl Fn() -> T + 'static) -> Self {
        self.insert(make);
        self
    }

    /// Adds the constructor of `T`, replacing an earlier one.
    pub fn insert<T: Reflect>(&mut self, make: impl Fn() -> T + 'static) {
        let maker: Maker = Rc::new(move || Box::new(make()) as Box<dyn Object>);
        Rc::make_mut(&mut self.makers).insert(TypeId::of::<T>(), maker);
    }

    #[inline]
    pub fn contains<T: Reflect>(&self) -> bool {
        self.makers.contains(&TypeId::of::<T>())
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.makers.is_empty()
    }

    /// Creates a `T`, if a constructor is registered for it.
    pub fn make<T: Reflect>(&self) -> Option<T> {
        let object = self.make_object(TypeId::of::<T>())?;
        object.take::<T>().map(|value| *value)
    }

    /// Creates a value of the type `id`, for polymorphic slots.
    pub fn make_object(&self, id: TypeId) -> Option<Box<dyn Object>> {
        self.makers.get(&id).map(|make| make())
    }
}

impl fmt::Debug for Factories {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Factories")
            .field("len", &self.makers.len())
            .finish()
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use alloc::string::String;

    use super::Factories;

    #[test]
    fn later_constructors_replace_earlier_ones() {
        let factories = Factories::new()
            .with(|| String::from("first"))
            .with(|| 7_u32)
            .with(|| String::from("second"));
        assert_eq!(factories.make::<String>().as_deref(), Some("second"));
        assert_eq!(factories.make::<u32>(), Some(7));
        assert_eq!(factories.make::<i64>(), None);
    }

    #[test]
    fn clones_share_until_changed() {
        let base = Factories::new().with(|| 1_i32);
        let mut extended = base.clone();
        extended.insert(|| 2_u8);
        assert!(!base.contains::<u8>());
        assert_eq!(extended.make::<i32>(), Some(1));
        assert_eq!(extended.make::<u8>(), Some(2));
    }
}
