use alloc::boxed::Box;
use alloc::string::String;
use core::any::TypeId;
use core::ops::Deref;

use dec_utils::TypeIdMap;

use crate::reflection::{Reflect, ReflectKind};
use crate::registry::{FromType, TypeTrait, TypeTraitObject, TypeTraitShared, dotted_path};

// -----------------------------------------------------------------------------
// TypeMeta

/// Runtime storage for type metadata, registered into the
/// [`TypeDirectory`](crate::registry::TypeDirectory).
///
/// This includes the dotted path used in documents, the [`ReflectKind`]
/// and a [`TypeTrait`] table.
///
/// # Example
///
/// ```
/// # use dec_reflect::registry::{TypeMeta, TypeTraitShared};
/// let meta = TypeMeta::of::<Vec<i32>>();
/// assert!(meta.has_trait::<TypeTraitShared>());
///
/// let meta = TypeMeta::of::<i32>();
/// assert_eq!(meta.path(), "i32");
/// assert!(!meta.has_trait::<TypeTraitShared>());
/// ```
pub struct TypeMeta {
    id: TypeId,
    path: String,
    type_path: &'static str,
    kind: Option<ReflectKind>,
    trait_table: TypeIdMap<Box<dyn TypeTrait>>,
}

impl TypeMeta {
    /// Creates the metadata of a reflected type.
    ///
    /// [`TypeTraitObject`] is always inserted, [`TypeTraitShared`] only for
    /// kinds which may be reference targets.
    pub fn of<T: Reflect>() -> Self {
        let mut meta = Self {
            id: TypeId::of::<T>(),
            path: dotted_path(T::type_path()),
            type_path: T::type_path(),
            kind: Some(T::KIND),
            trait_table: TypeIdMap::new(),
        };
        meta.insert_trait::<TypeTraitObject>(FromType::<T>::from_type());
        if !T::KIND.is_value() {
            meta.insert_trait::<TypeTraitShared>(FromType::<T>::from_type());
        }
        meta
    }

    /// Creates the metadata of a type which is only named, never walked.
    ///
    /// Used for abstract hierarchy roots.
    pub fn opaque<T: 'static + ?Sized>() -> Self {
        let type_path = core::any::type_name::<T>();
        Self {
            id: TypeId::of::<T>(),
            path: dotted_path(type_path),
            type_path,
            kind: None,
            trait_table: TypeIdMap::new(),
        }
    }

    /// Replaces the dotted path.
    #[inline]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    #[inline(always)]
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// The dotted path, as written in documents.
    #[inline(always)]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The Rust type path.
    #[inline(always)]
    pub fn type_path(&self) -> &'static str {
        self.type_path
    }

    /// The kind, `None` for opaque types.
    #[inline(always)]
    pub fn kind(&self) -> Option<ReflectKind> {
        self.kind
    }

    /// Inserts a new [`TypeTrait`].
    #[inline]
    pub fn insert_trait<T: TypeTrait>(&mut self, data: T) {
        self.insert_trait_by_id(TypeId::of::<T>(), Box::new(data));
    }

    #[inline(never)]
    fn insert_trait_by_id(&mut self, id: TypeId, val: Box<dyn TypeTrait>) {
        self.trait_table.insert(id, val);
    }

    /// Removes a [`TypeTrait`], returns `true` if it existed.
    #[inline]
    pub fn remove_trait<T: TypeTrait>(&mut self) -> bool {
        self.trait_table.remove(&TypeId::of::<T>()).is_some()
    }

    /// Gets a [`TypeTrait`] reference, or `None` if it doesn't exist.
    #[inline]
    pub fn get_trait<T: TypeTrait>(&self) -> Option<&T> {
        self.trait_table
            .get(&TypeId::of::<T>())
            .map(Deref::deref)
            .and_then(<dyn TypeTrait>::downcast_ref)
    }

    /// Returns `true` if the [`TypeTrait`] exists.
    #[inline]
    pub fn has_trait<T: TypeTrait>(&self) -> bool {
        self.trait_table.contains(&TypeId::of::<T>())
    }

    /// Returns the number of [`TypeTrait`]s.
    #[inline]
    pub fn trait_len(&self) -> usize {
        self.trait_table.len()
    }
}

impl Clone for TypeMeta {
    fn clone(&self) -> Self {
        let mut new_map = TypeIdMap::with_capacity(self.trait_len());
        for (id, type_trait) in self.trait_table.iter() {
            new_map.insert(*id, (**type_trait).clone_type_trait());
        }

        Self {
            id: self.id,
            path: self.path.clone(),
            type_path: self.type_path,
            kind: self.kind,
            trait_table: new_map,
        }
    }
}

impl core::fmt::Debug for TypeMeta {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TypeMeta")
            .field("path", &self.path)
            .field("type_path", &self.type_path)
            .field("kind", &self.kind)
            .field("traits", &self.trait_len())
            .finish()
    }
}
