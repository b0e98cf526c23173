use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;
use core::any::Any;
use core::cell::{Cell, Ref, RefCell};

use dec_reflect::diagnostics::{Category, Location};
use dec_reflect::document::NodeId;
use dec_reflect::walker::{ReadCx, WriteCx, read_value_with, write_value};
use dec_reflect::{Reflect, TypeHandle};

use crate::handle::DefSlot;
use crate::loader::DEF_ATTRS;

// -----------------------------------------------------------------------------
// Def

/// A definition type.
///
/// The content is walked like any other [`Reflect`] value, usually through
/// `impl_reflect_struct!`. Inheriting from another definition type is
/// declared with [`Def::base`]; the base's fields must be flattened into
/// this type (`..base: Base` in `impl_reflect_struct!`) so that content
/// written for the base also applies here.
///
/// The hooks run once every definition of a load is populated and every
/// reference between them resolved: first [`config_errors`] on all of
/// them, then [`post_load`] on all of them.
///
/// [`config_errors`]: Def::config_errors
/// [`post_load`]: Def::post_load
pub trait Def: Reflect {
    /// The definition type this one inherits from.
    fn base() -> Option<TypeHandle> {
        None
    }

    /// Validates the loaded content. Each pushed message is reported as
    /// an error at the definition.
    fn config_errors(&self, errors: &mut Vec<String>) {
        let _ = errors;
    }

    /// One-time setup after validation.
    fn post_load(&mut self, errors: &mut Vec<String>) {
        let _ = errors;
    }
}

// -----------------------------------------------------------------------------
// DefInfo

/// Bookkeeping of a registered definition.
#[derive(Debug, Default)]
pub struct DefInfo {
    name: RefCell<String>,
    index: Cell<usize>,
    deleted: Cell<bool>,
    location: RefCell<Location>,
}

impl DefInfo {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            name: RefCell::new(String::from(name)),
            ..Self::default()
        }
    }

    /// The unique name within the hierarchy root.
    #[inline]
    pub fn name(&self) -> Ref<'_, str> {
        Ref::map(self.name.borrow(), String::as_str)
    }

    /// Position among the registered definitions of the same type.
    #[inline]
    pub fn index(&self) -> usize {
        self.index.get()
    }

    /// Returns `true` once the definition was removed from its database.
    #[inline]
    pub fn is_deleted(&self) -> bool {
        self.deleted.get()
    }

    /// Where the definition was declared.
    #[inline]
    pub fn location(&self) -> Location {
        self.location.borrow().clone()
    }

    #[inline]
    pub(crate) fn set_name(&self, name: &str) {
        let mut current = self.name.borrow_mut();
        current.clear();
        current.push_str(name);
    }

    #[inline]
    pub(crate) fn set_index(&self, index: usize) {
        self.index.set(index);
    }

    #[inline]
    pub(crate) fn set_deleted(&self, deleted: bool) {
        self.deleted.set(deleted);
    }

    #[inline]
    pub(crate) fn set_location(&self, location: Location) {
        *self.location.borrow_mut() = location;
    }
}

// -----------------------------------------------------------------------------
// AnyDef

/// Object-safe access to a registered definition of any type.
///
/// `Rc<dyn AnyDef>` upcasts to `Rc<dyn Any>`, which downcasts back to the
/// typed slot behind a [`DefHandle`](crate::DefHandle).
pub trait AnyDef: Any {
    fn info(&self) -> &DefInfo;

    /// The concrete definition type.
    fn def_type(&self) -> TypeHandle;

    /// Reads a definition node into the value, skipping [`DEF_ATTRS`].
    fn read_node(&self, cx: &mut ReadCx<'_>, node: NodeId);

    /// Writes the value into a definition node.
    fn write_node(&self, cx: &mut WriteCx<'_>, node: NodeId);

    fn config_errors(&self, errors: &mut Vec<String>);

    fn post_load(&self, errors: &mut Vec<String>);
}

impl<T: Def> AnyDef for DefSlot<T> {
    #[inline]
    fn info(&self) -> &DefInfo {
        &self.info
    }

    #[inline]
    fn def_type(&self) -> TypeHandle {
        TypeHandle::of::<T>()
    }

    fn read_node(&self, cx: &mut ReadCx<'_>, node: NodeId) {
        match self.value.try_borrow_mut() {
            Ok(mut value) => read_value_with(cx, node, &mut *value, &DEF_ATTRS),
            Err(_) => cx.error(
                Category::Integrity,
                node,
                format!("definition `{}` is borrowed elsewhere and cannot be read", self.info.name()),
            ),
        }
    }

    fn write_node(&self, cx: &mut WriteCx<'_>, node: NodeId) {
        match self.value.try_borrow_mut() {
            Ok(mut value) => write_value(cx, &mut *value, node),
            Err(_) => cx.error(
                Category::Integrity,
                node,
                format!("definition `{}` is borrowed elsewhere and cannot be written", self.info.name()),
            ),
        }
    }

    fn config_errors(&self, errors: &mut Vec<String>) {
        self.value.borrow().config_errors(errors);
    }

    fn post_load(&self, errors: &mut Vec<String>) {
        self.value.borrow_mut().post_load(errors);
    }
}

impl core::fmt::Debug for dyn AnyDef {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}:{}", self.def_type().type_path(), &*self.info().name())
    }
}
