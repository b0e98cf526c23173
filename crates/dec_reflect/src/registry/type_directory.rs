use alloc::borrow::Cow;
use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;
use core::any::TypeId;

use dec_utils::TypeIdMap;
use dec_utils::hash::HashMap;

use crate::diagnostics::{Category, Location, Reporter};
use crate::reflection::Reflect;
use crate::registry::TypeMeta;

// -----------------------------------------------------------------------------
// Paths

/// Converts a Rust type path into the dotted form used in documents.
///
/// # Examples
///
/// ```
/// use dec_reflect::registry::dotted_path;
/// assert_eq!(dotted_path("game::items::Sword"), "game.items.Sword");
/// ```
pub fn dotted_path(type_path: &str) -> String {
    type_path.replace("::", ".")
}

// -----------------------------------------------------------------------------
// Resolution

/// Outcome of [`TypeDirectory::resolve`].
#[derive(Debug)]
pub enum Resolution<'a> {
    /// Exactly one match.
    Found(&'a TypeMeta),
    /// Several matches, in lookup order.
    Ambiguous(Vec<&'a TypeMeta>),
    /// Generic arguments cannot be named in documents.
    Generic,
    Missing,
}

// -----------------------------------------------------------------------------
// TypeDirectory

/// Resolves textual type names to registered types.
///
/// Types are registered under their dotted path. A name is looked up as
/// given, then under each namespace prefix in order.
///
/// # Examples
///
/// ```
/// use dec_reflect::registry::{Resolution, TypeDirectory};
///
/// let mut directory = TypeDirectory::new();
/// directory.register_as::<Vec<i32>>("game.items.Bag");
/// directory.set_prefixes(["game.items"]);
///
/// assert!(matches!(directory.resolve("Bag"), Resolution::Found(_)));
/// assert_eq!(directory.name_of(&std::any::TypeId::of::<Vec<i32>>()), Some("Bag"));
/// ```
#[derive(Clone)]
pub struct TypeDirectory {
    metas: TypeIdMap<TypeMeta>,
    by_path: HashMap<String, TypeId>,
    prefixes: Vec<String>,
}

impl TypeDirectory {
    /// Creates a directory with the primitives and `String` registered
    /// under their short names.
    pub fn new() -> Self {
        let mut directory = Self::empty();
        macro_rules! register_builtin {
            ($($ty:ty),*) => { $( directory.register::<$ty>(); )* };
        }
        register_builtin!(
            (), bool, char, String, f32, f64, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64,
            u128, usize
        );
        directory
    }

    /// Creates a directory without any type.
    pub fn empty() -> Self {
        Self {
            metas: TypeIdMap::new(),
            by_path: HashMap::default(),
            prefixes: Vec::new(),
        }
    }

    /// Registers `T` under its dotted type path.
    ///
    /// Registering twice keeps the first metadata.
    pub fn register<T: Reflect>(&mut self) -> &mut TypeMeta {
        let id = TypeId::of::<T>();
        if !self.metas.contains(&id) {
            return self.insert(TypeMeta::of::<T>());
        }
        self.metas.get_or_insert(id, TypeMeta::of::<T>)
    }

    /// Registers `T` under an explicit dotted path.
    pub fn register_as<T: Reflect>(&mut self, path: impl Into<String>) -> &mut TypeMeta {
        self.insert(TypeMeta::of::<T>().with_path(path))
    }

    /// Inserts metadata, replacing any earlier entry of the same type.
    pub fn insert(&mut self, meta: TypeMeta) -> &mut TypeMeta {
        let id = meta.id();
        if let Some(old) = self.metas.get(&id)
            && self.by_path.get(old.path()) == Some(&id)
        {
            let old_path = String::from(old.path());
            self.by_path.remove(&old_path);
        }
        if let Some(previous) = self.by_path.insert(String::from(meta.path()), id)
            && previous != id
        {
            log::warn!("type path `{}` now names a different type", meta.path());
        }
        self.metas.remove(&id);
        self.metas.get_or_insert(id, move || meta)
    }

    /// Replaces the namespace prefixes, tried in order.
    pub fn set_prefixes<I, S>(&mut self, prefixes: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.prefixes = prefixes
            .into_iter()
            .map(Into::into)
            .map(|p: String| String::from(p.trim_end_matches('.')))
            .collect();
    }

    #[inline]
    pub fn prefixes(&self) -> &[String] {
        &self.prefixes
    }

    #[inline]
    pub fn get(&self, id: &TypeId) -> Option<&TypeMeta> {
        self.metas.get(id)
    }

    #[inline]
    pub fn get_mut(&mut self, id: &TypeId) -> Option<&mut TypeMeta> {
        self.metas.get_mut(id)
    }

    #[inline]
    pub fn get_type<T: ?Sized + 'static>(&self) -> Option<&TypeMeta> {
        self.metas.get_type::<T>()
    }

    #[inline]
    pub fn contains(&self, id: &TypeId) -> bool {
        self.metas.contains(id)
    }

    /// Returns the metadata registered under exactly `path`.
    #[inline]
    pub fn get_with_path(&self, path: &str) -> Option<&TypeMeta> {
        self.by_path.get(path).and_then(|id| self.metas.get(id))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.metas.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.metas.is_empty()
    }

    /// Iterates over all metadata in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = &TypeMeta> {
        self.metas.values()
    }

    /// Resets to the state of [`TypeDirectory::new`], keeping prefixes.
    pub fn clear(&mut self) {
        let prefixes = core::mem::take(&mut self.prefixes);
        *self = Self::new();
        self.prefixes = prefixes;
    }

    /// Resolves a name written in a document.
    pub fn resolve(&self, name: &str) -> Resolution<'_> {
        if name.contains('<') {
            return Resolution::Generic;
        }

        let mut found: Vec<&TypeMeta> = Vec::new();
        let mut visit = |path: &str| {
            if let Some(meta) = self.get_with_path(path)
                && !found.iter().any(|m| m.id() == meta.id())
            {
                found.push(meta);
            }
        };

        visit(name);
        for prefix in &self.prefixes {
            visit(&format!("{prefix}.{name}"));
        }

        match found.len() {
            0 => Resolution::Missing,
            1 => Resolution::Found(found[0]),
            _ => Resolution::Ambiguous(found),
        }
    }

    /// Resolves a name, reporting failures.
    ///
    /// An ambiguous name resolves to its first candidate.
    pub fn resolve_reported(
        &self,
        name: &str,
        reporter: &Reporter,
        location: &Location,
    ) -> Option<&TypeMeta> {
        match self.resolve(name) {
            Resolution::Found(meta) => Some(meta),
            Resolution::Ambiguous(candidates) => {
                let list: Vec<&str> = candidates.iter().map(|m| m.path()).collect();
                reporter.error(
                    Category::Reference,
                    location,
                    format!("type name `{name}` is ambiguous between {}", list.join(", ")),
                );
                candidates.first().copied()
            }
            Resolution::Generic => {
                reporter.error(
                    Category::Reference,
                    location,
                    format!("generic type `{name}` cannot be named, register it under a plain path"),
                );
                None
            }
            Resolution::Missing => {
                reporter.error(
                    Category::Reference,
                    location,
                    format!("unknown type `{name}`"),
                );
                None
            }
        }
    }

    /// Returns the shortest name which resolves back to `id`.
    ///
    /// A namespace prefix is stripped only if the short name is not
    /// ambiguous.
    pub fn name_of(&self, id: &TypeId) -> Option<&str> {
        let path = self.metas.get(id)?.path();

        let mut best: Option<&str> = None;
        for prefix in &self.prefixes {
            if let Some(rest) = path
                .strip_prefix(prefix.as_str())
                .and_then(|rest| rest.strip_prefix('.'))
                && best.is_none_or(|b| rest.len() < b.len())
                && matches!(self.resolve(rest), Resolution::Found(meta) if meta.id() == *id)
            {
                best = Some(rest);
            }
        }
        Some(best.unwrap_or(path))
    }

    /// Like [`TypeDirectory::name_of`], falling back to the dotted Rust
    /// path of unregistered types.
    pub fn name_or_path(&self, id: &TypeId, type_path: &str) -> Cow<'_, str> {
        match self.name_of(id) {
            Some(name) => Cow::Borrowed(name),
            None => Cow::Owned(dotted_path(type_path)),
        }
    }
}

impl Default for TypeDirectory {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for TypeDirectory {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TypeDirectory")
            .field("types", &self.metas.len())
            .field("prefixes", &self.prefixes)
            .finish()
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[derive(Default)]
    struct Sword;
    crate::impl_reflect_record!(Sword);
    impl crate::Recordable for Sword {
        fn record(&mut self, _: &mut crate::Recorder<'_, '_>) {}
    }

    #[test]
    fn builtins_use_short_names() {
        let directory = TypeDirectory::new();
        assert!(matches!(directory.resolve("i32"), Resolution::Found(m) if m.id() == TypeId::of::<i32>()));
        assert!(matches!(directory.resolve("String"), Resolution::Found(_)));
        assert_eq!(directory.name_of(&TypeId::of::<bool>()), Some("bool"));
    }

    #[test]
    fn prefixes_shorten_and_resolve() {
        let mut directory = TypeDirectory::new();
        directory.register_as::<Sword>("game.items.Sword");
        directory.set_prefixes(vec!["game.items."]);

        assert!(matches!(directory.resolve("Sword"), Resolution::Found(_)));
        assert!(matches!(directory.resolve("game.items.Sword"), Resolution::Found(_)));
        assert_eq!(directory.name_of(&TypeId::of::<Sword>()), Some("Sword"));
    }

    #[test]
    fn ambiguous_names_keep_full_path() {
        let mut directory = TypeDirectory::new();
        directory.register_as::<Sword>("a.Thing");
        directory.register_as::<Vec<i32>>("b.Thing");
        directory.set_prefixes(["a", "b"]);

        match directory.resolve("Thing") {
            Resolution::Ambiguous(found) => {
                assert_eq!(found.len(), 2);
                assert_eq!(found[0].id(), TypeId::of::<Sword>());
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(directory.name_of(&TypeId::of::<Sword>()), Some("a.Thing"));

        let (reporter, collected) = Reporter::collecting();
        let first = directory.resolve_reported("Thing", &reporter, &Location::new("t", None));
        assert_eq!(first.map(TypeMeta::id), Some(TypeId::of::<Sword>()));
        assert!(collected.has_error("ambiguous"));
    }

    #[test]
    fn generic_and_missing_names() {
        let directory = TypeDirectory::new();
        assert!(matches!(directory.resolve("Vec<i32>"), Resolution::Generic));
        assert!(matches!(directory.resolve("Nope"), Resolution::Missing));
    }

    #[test]
    fn reregistering_moves_the_path() {
        let mut directory = TypeDirectory::new();
        directory.register_as::<Sword>("old.Sword");
        directory.register_as::<Sword>("new.Sword");
        assert!(directory.get_with_path("old.Sword").is_none());
        assert!(directory.get_with_path("new.Sword").is_some());
    }
}
