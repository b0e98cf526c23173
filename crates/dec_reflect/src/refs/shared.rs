use alloc::format;
use alloc::rc::Rc;
use core::any::TypeId;
use core::cell::RefCell;

use crate::diagnostics::Category;
use crate::document::NodeId;
use crate::reflection::{ParseMode, Reflect, ReflectKind};
use crate::refs::TrackedObject;
use crate::registry::TypeMeta;
use crate::walker::{ReadCx, WriteCx, WriteTask, dispatch_parse, write_value};

// -----------------------------------------------------------------------------
// Shared

/// A shared, mutable object with identity.
///
/// Two fields holding clones of the same `Shared` read back as clones of
/// one object.
pub type Shared<T> = Rc<RefCell<T>>;

/// Wraps a value into a [`Shared`].
#[inline]
pub fn shared<T>(value: T) -> Shared<T> {
    Rc::new(RefCell::new(value))
}

#[inline]
fn identity<T>(value: &Shared<T>) -> usize {
    Rc::as_ptr(value) as *const () as usize
}

// -----------------------------------------------------------------------------
// SharedContent

/// Writes the content of a shared object, used for deferred writes.
pub trait SharedContent {
    fn compose_content(&self, cx: &mut WriteCx<'_>, node: NodeId);
}

impl<T: Reflect> SharedContent for RefCell<T> {
    fn compose_content(&self, cx: &mut WriteCx<'_>, node: NodeId) {
        match self.try_borrow_mut() {
            Ok(mut value) => write_value(cx, &mut *value, node),
            Err(_) => cx.error(
                Category::Integrity,
                node,
                format!("`{}` is borrowed elsewhere and cannot be written", T::type_path()),
            ),
        }
    }
}

// -----------------------------------------------------------------------------
// Reflect

impl<T: Reflect> Reflect for Shared<T> {
    const KIND: ReflectKind = ReflectKind::Shared;

    fn create() -> Self {
        shared(T::create())
    }

    fn create_in(cx: &ReadCx<'_>) -> Self {
        shared(T::create_in(cx))
    }

    fn compose(&mut self, cx: &mut WriteCx<'_>, node: NodeId) {
        let key = identity(self);

        if cx.in_record_mode() && !T::KIND.is_value() {
            let object = Rc::clone(self);
            if cx.track_shared(key, node, || TrackedObject::new::<T>(object)) {
                return;
            }
            if cx.should_defer() {
                cx.defer(WriteTask::ComposeShared {
                    node,
                    object: Rc::clone(self) as Rc<dyn SharedContent>,
                });
                return;
            }
            self.compose_content(cx, node);
            return;
        }

        if !cx.enter_inline(key) {
            cx.error(
                Category::Shape,
                node,
                format!(
                    "cycle through `{}` cannot be written without references, written as null",
                    T::type_path()
                ),
            );
            cx.doc_mut().set_attr(node, "null", "true");
            return;
        }
        self.compose_content(cx, node);
        cx.leave_inline(key);
    }

    fn parse(&mut self, cx: &mut ReadCx<'_>, node: NodeId, mode: ParseMode) {
        match self.try_borrow_mut() {
            Ok(mut value) => dispatch_parse(cx, node, &mut *value, mode),
            Err(_) => cx.error(
                Category::Integrity,
                node,
                format!("`{}` is borrowed elsewhere and cannot be read", T::type_path()),
            ),
        }
    }

    fn from_ref(cx: &mut ReadCx<'_>, node: NodeId, id: &str) -> Option<Self> {
        cx.resolve_ref::<T>(node, id)
    }

    fn apply_class(&mut self, cx: &mut ReadCx<'_>, node: NodeId, meta: &TypeMeta) {
        if meta.id() != TypeId::of::<T>() {
            cx.error(
                Category::Reference,
                node,
                format!(
                    "explicit type `{}` cannot be assigned to expected type `{}`",
                    meta.path(),
                    T::type_path()
                ),
            );
        }
    }
}
