use alloc::format;
use core::any::{Any, TypeId};

use crate::diagnostics::Category;
use crate::document::NodeId;
use crate::reflection::{ParseMode, Reflect, ReflectKind};
use crate::registry::{TypeMeta, dotted_path};
use crate::walker::{ReadCx, WriteCx};

/// A runtime type, written as its registered name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeHandle {
    id: TypeId,
    type_path: &'static str,
}

impl TypeHandle {
    #[inline]
    pub fn of<T: Any + ?Sized>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            type_path: core::any::type_name::<T>(),
        }
    }

    /// The handle of a registered type.
    #[inline]
    pub fn from_meta(meta: &TypeMeta) -> Self {
        Self {
            id: meta.id(),
            type_path: meta.type_path(),
        }
    }

    #[inline]
    pub fn id(&self) -> TypeId {
        self.id
    }

    #[inline]
    pub fn type_path(&self) -> &'static str {
        self.type_path
    }

    #[inline]
    pub fn is<T: Any + ?Sized>(&self) -> bool {
        self.id == TypeId::of::<T>()
    }
}

fn resolve(cx: &ReadCx<'_>, node: NodeId, text: &str) -> Option<TypeHandle> {
    let name = text.trim();
    if name.is_empty() {
        cx.error(Category::Shape, node, "empty type name");
        return None;
    }
    let env = cx.env();
    env.directory
        .resolve_reported(name, env.reporter, &cx.location(node))
        .map(TypeHandle::from_meta)
}

impl Reflect for TypeHandle {
    const KIND: ReflectKind = ReflectKind::Type;

    fn create() -> Self {
        Self::of::<()>()
    }

    fn compose(&mut self, cx: &mut WriteCx<'_>, node: NodeId) {
        let name = match cx.env().directory.name_of(&self.id) {
            Some(name) => alloc::string::String::from(name),
            None => {
                cx.error(
                    Category::Configuration,
                    node,
                    format!("`{}` is not registered in the type directory", self.type_path),
                );
                dotted_path(self.type_path)
            }
        };
        cx.doc_mut().set_text(node, name);
    }

    fn parse(&mut self, cx: &mut ReadCx<'_>, node: NodeId, mode: ParseMode) {
        cx.check_mode(node, mode, &[ParseMode::Replace]);
        let text = cx.expect_text(node, "TypeHandle");
        if let Some(handle) = resolve(cx, node, text) {
            *self = handle;
        }
    }

    fn from_key_text(cx: &mut ReadCx<'_>, node: NodeId, text: &str) -> Option<Self> {
        resolve(cx, node, text)
    }
}
