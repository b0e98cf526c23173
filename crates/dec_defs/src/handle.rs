use alloc::format;
use alloc::rc::Rc;
use alloc::string::String;
use core::any::TypeId;
use core::cell::{Ref, RefCell, RefMut};
use core::fmt;
use core::hash::{Hash, Hasher};
use core::marker::PhantomData;

use dec_reflect::diagnostics::Category;
use dec_reflect::document::NodeId;
use dec_reflect::walker::{DefLookup, ReadCx, WriteCx};
use dec_reflect::{ParseMode, Reflect, ReflectKind};

use crate::def::{AnyDef, Def, DefInfo};

// -----------------------------------------------------------------------------
// DefSlot

/// The shared allocation behind a [`DefHandle`].
pub(crate) struct DefSlot<T> {
    pub(crate) info: DefInfo,
    pub(crate) value: RefCell<T>,
}

impl<T> DefSlot<T> {
    pub(crate) fn new(name: &str, value: T) -> Self {
        Self {
            info: DefInfo::new(name),
            value: RefCell::new(value),
        }
    }
}

// -----------------------------------------------------------------------------
// DefHandle

/// A registered definition of type `T`.
///
/// Handles are cheap to clone, and two handles are equal when they point
/// to the same definition.
pub struct DefHandle<T>(Rc<DefSlot<T>>);

impl<T: Def> DefHandle<T> {
    pub(crate) fn new(name: &str, value: T) -> Self {
        Self(Rc::new(DefSlot::new(name, value)))
    }

    /// Downcasts a type-erased definition.
    pub fn from_dyn(def: Rc<dyn AnyDef>) -> Option<Self> {
        let any: Rc<dyn core::any::Any> = def;
        any.downcast::<DefSlot<T>>().ok().map(Self)
    }

    /// The type-erased definition.
    #[inline]
    pub fn to_dyn(&self) -> Rc<dyn AnyDef> {
        self.0.clone()
    }
}

impl<T> DefHandle<T> {
    #[inline]
    pub fn info(&self) -> &DefInfo {
        &self.0.info
    }

    #[inline]
    pub fn name(&self) -> Ref<'_, str> {
        self.0.info.name()
    }

    /// Borrows the content.
    ///
    /// # Panics
    ///
    /// Panics if the content is mutably borrowed.
    #[inline]
    pub fn borrow(&self) -> Ref<'_, T> {
        self.0.value.borrow()
    }

    /// Mutably borrows the content.
    ///
    /// # Panics
    ///
    /// Panics if the content is borrowed.
    #[inline]
    pub fn borrow_mut(&self) -> RefMut<'_, T> {
        self.0.value.borrow_mut()
    }

    #[inline]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl<T> Clone for DefHandle<T> {
    #[inline]
    fn clone(&self) -> Self {
        Self(Rc::clone(&self.0))
    }
}

impl<T> PartialEq for DefHandle<T> {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl<T> Eq for DefHandle<T> {}

impl<T> Hash for DefHandle<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        Rc::as_ptr(&self.0).hash(state);
    }
}

impl<T> fmt::Debug for DefHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", core::any::type_name::<T>(), &*self.name())
    }
}

// -----------------------------------------------------------------------------
// DefRef

/// A field referring to a definition by name.
///
/// Written as the definition's name; an empty node reads as no reference.
/// Names are looked up by the hierarchy root of `T`, and a `DefRef<T>` only
/// holds definitions whose concrete type is `T`. Fields which may name any
/// type of a hierarchy use [`AnyDefRef`].
pub struct DefRef<T>(pub Option<DefHandle<T>>);

impl<T> DefRef<T> {
    /// No reference.
    #[inline]
    pub const fn none() -> Self {
        Self(None)
    }

    #[inline]
    pub fn get(&self) -> Option<&DefHandle<T>> {
        self.0.as_ref()
    }

    #[inline]
    pub fn is_none(&self) -> bool {
        self.0.is_none()
    }
}

impl<T> Default for DefRef<T> {
    #[inline]
    fn default() -> Self {
        Self(None)
    }
}

impl<T> Clone for DefRef<T> {
    #[inline]
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T> PartialEq for DefRef<T> {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl<T> Eq for DefRef<T> {}

impl<T> Hash for DefRef<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl<T> fmt::Debug for DefRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Some(handle) => write!(f, "DefRef({handle:?})"),
            None => f.write_str("DefRef(None)"),
        }
    }
}

impl<T> From<DefHandle<T>> for DefRef<T> {
    #[inline]
    fn from(handle: DefHandle<T>) -> Self {
        Self(Some(handle))
    }
}

/// Looks `name` up in the hierarchy of `expected`, reporting failures.
fn resolve(cx: &ReadCx<'_>, node: NodeId, expected: TypeId, type_path: &str, name: &str) -> Option<Rc<dyn AnyDef>> {
    if name.is_empty() {
        return None;
    }
    let Some(defs) = cx.env().defs else {
        cx.error(
            Category::Configuration,
            node,
            format!("cannot look up `{name}`, no definition database is loaded"),
        );
        return None;
    };
    match defs.resolve_def(expected, name) {
        DefLookup::Found(any) => match any.downcast::<Rc<dyn AnyDef>>() {
            Ok(def) => Some(Rc::unwrap_or_clone(def)),
            Err(_) => {
                cx.error(
                    Category::Integrity,
                    node,
                    format!("definition `{name}` came back as an unknown handle"),
                );
                None
            }
        },
        DefLookup::Missing => {
            cx.error(
                Category::Reference,
                node,
                format!("no `{type_path}` named `{name}`"),
            );
            None
        }
        DefLookup::Mismatch { found } => {
            cx.error(
                Category::Reference,
                node,
                format!("definition `{name}` is a `{found}`, not a `{type_path}`"),
            );
            None
        }
        DefLookup::NotADef => {
            cx.error(
                Category::Configuration,
                node,
                format!("`{type_path}` is not a registered definition type"),
            );
            None
        }
    }
}

fn lookup<T: Def>(cx: &ReadCx<'_>, node: NodeId, name: &str) -> Option<DefHandle<T>> {
    let def = resolve(cx, node, TypeId::of::<T>(), T::type_path(), name)?;
    let found = def.def_type();
    let handle = DefHandle::from_dyn(def);
    if handle.is_none() {
        cx.error(
            Category::Reference,
            node,
            format!(
                "definition `{name}` is a `{}`, which a `DefRef<{}>` cannot hold, use `AnyDefRef`",
                found.type_path(),
                T::type_path()
            ),
        );
    }
    handle
}

fn compose_name(cx: &mut WriteCx<'_>, node: NodeId, info: &DefInfo) {
    let name = String::from(&*info.name());
    if info.is_deleted() {
        cx.error(
            Category::Reference,
            node,
            format!("definition `{name}` was deleted, writing `{name}_DELETED`"),
        );
        cx.doc_mut().set_text(node, format!("{name}_DELETED"));
    } else {
        cx.doc_mut().set_text(node, name);
    }
}

impl<T: Def> Reflect for DefRef<T> {
    const KIND: ReflectKind = ReflectKind::DefRef;

    fn create() -> Self {
        Self(None)
    }

    fn compose(&mut self, cx: &mut WriteCx<'_>, node: NodeId) {
        if let Some(handle) = &self.0 {
            compose_name(cx, node, handle.info());
        }
    }

    fn parse(&mut self, cx: &mut ReadCx<'_>, node: NodeId, mode: ParseMode) {
        cx.check_mode(node, mode, &[ParseMode::Replace]);
        let text = cx.expect_text(node, T::type_path());
        self.0 = lookup(cx, node, text.trim());
    }

    fn parse_null(&mut self, _: &mut ReadCx<'_>, _: NodeId) {
        self.0 = None;
    }

    fn from_key_text(cx: &mut ReadCx<'_>, node: NodeId, text: &str) -> Option<Self> {
        lookup(cx, node, text).map(|handle| Self(Some(handle)))
    }
}

// -----------------------------------------------------------------------------
// AnyDefRef

/// A field referring by name to a definition of type `R` or of a type
/// deriving from it.
///
/// `R` must be a concrete definition type, usually the hierarchy root. The
/// definition is held type-erased; [`AnyDefRef::downcast`] recovers the
/// typed handle.
pub struct AnyDefRef<R> {
    def: Option<Rc<dyn AnyDef>>,
    _marker: PhantomData<fn() -> R>,
}

impl<R> AnyDefRef<R> {
    /// No reference.
    #[inline]
    pub const fn none() -> Self {
        Self {
            def: None,
            _marker: PhantomData,
        }
    }

    #[inline]
    pub fn get(&self) -> Option<&Rc<dyn AnyDef>> {
        self.def.as_ref()
    }

    #[inline]
    pub fn is_none(&self) -> bool {
        self.def.is_none()
    }

    /// The typed handle, if the definition is a `T`.
    pub fn downcast<T: Def>(&self) -> Option<DefHandle<T>> {
        self.def.clone().and_then(DefHandle::from_dyn)
    }
}

impl<R> Default for AnyDefRef<R> {
    #[inline]
    fn default() -> Self {
        Self::none()
    }
}

impl<R> Clone for AnyDefRef<R> {
    #[inline]
    fn clone(&self) -> Self {
        Self {
            def: self.def.clone(),
            _marker: PhantomData,
        }
    }
}

impl<R> PartialEq for AnyDefRef<R> {
    fn eq(&self, other: &Self) -> bool {
        match (&self.def, &other.def) {
            (Some(a), Some(b)) => Rc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        }
    }
}

impl<R> Eq for AnyDefRef<R> {}

impl<R> fmt::Debug for AnyDefRef<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.def {
            Some(def) => write!(f, "AnyDefRef({}:{})", def.def_type().type_path(), &*def.info().name()),
            None => f.write_str("AnyDefRef(None)"),
        }
    }
}

impl<T: Def, R> From<DefHandle<T>> for AnyDefRef<R> {
    #[inline]
    fn from(handle: DefHandle<T>) -> Self {
        Self {
            def: Some(handle.to_dyn()),
            _marker: PhantomData,
        }
    }
}

impl<R: Def> Reflect for AnyDefRef<R> {
    const KIND: ReflectKind = ReflectKind::DefRef;

    fn create() -> Self {
        Self::none()
    }

    fn compose(&mut self, cx: &mut WriteCx<'_>, node: NodeId) {
        if let Some(def) = &self.def {
            compose_name(cx, node, def.info());
        }
    }

    fn parse(&mut self, cx: &mut ReadCx<'_>, node: NodeId, mode: ParseMode) {
        cx.check_mode(node, mode, &[ParseMode::Replace]);
        let text = cx.expect_text(node, R::type_path());
        self.def = resolve(cx, node, TypeId::of::<R>(), R::type_path(), text.trim());
    }

    fn parse_null(&mut self, _: &mut ReadCx<'_>, _: NodeId) {
        self.def = None;
    }

    fn from_key_text(cx: &mut ReadCx<'_>, node: NodeId, text: &str) -> Option<Self> {
        let def = resolve(cx, node, TypeId::of::<R>(), R::type_path(), text)?;
        Some(Self {
            def: Some(def),
            _marker: PhantomData,
        })
    }
}

// -----------------------------------------------------------------------------
// Tests
