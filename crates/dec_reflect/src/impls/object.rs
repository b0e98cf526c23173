use alloc::boxed::Box;
use alloc::format;
use alloc::string::String;
use core::any::TypeId;

use crate::diagnostics::Category;
use crate::document::NodeId;
use crate::reflection::{Object, ParseMode, Reflect, ReflectKind};
use crate::registry::{TypeMeta, TypeTraitObject, dotted_path};
use crate::walker::{ReadCx, WriteCx};

/// A polymorphic slot, written with `class="..."`.
///
/// A fresh slot holds `()`, which `class` replaces with a new instance.
impl Reflect for Box<dyn Object> {
    const KIND: ReflectKind = ReflectKind::Object;

    fn type_path() -> &'static str {
        "Box<dyn Object>"
    }

    fn create() -> Self {
        Box::new(())
    }

    fn compose(&mut self, cx: &mut WriteCx<'_>, node: NodeId) {
        let inner: &mut dyn Object = &mut **self;
        let id = inner.object_type_id();
        let class = match cx.env().directory.name_of(&id) {
            Some(name) => String::from(name),
            None => {
                cx.error(
                    Category::Configuration,
                    node,
                    format!(
                        "`{}` is not registered in the type directory, its `class` cannot be read back",
                        inner.object_type_path()
                    ),
                );
                dotted_path(inner.object_type_path())
            }
        };
        cx.doc_mut().set_attr(node, "class", class);
        inner.compose_object(cx, node);
    }

    fn parse(&mut self, cx: &mut ReadCx<'_>, node: NodeId, mode: ParseMode) {
        let inner: &mut dyn Object = &mut **self;
        if inner.is::<()>() && cx.doc().attr(node, "class").is_none() {
            let n = cx.doc().node(node);
            if n.has_children() || n.has_text() {
                cx.error(
                    Category::Reference,
                    node,
                    "a polymorphic value needs an explicit `class`",
                );
                return;
            }
        }
        inner.parse_object(cx, node, mode);
    }

    fn apply_class(&mut self, cx: &mut ReadCx<'_>, node: NodeId, meta: &TypeMeta) {
        let current = (**self).object_type_id();
        if current == meta.id() {
            return;
        }
        if current != TypeId::of::<()>() {
            cx.error(
                Category::Reference,
                node,
                format!(
                    "explicit type `{}` does not match the existing `{}`, keeping it",
                    meta.path(),
                    (**self).object_type_path()
                ),
            );
            return;
        }
        if let Some(object) = cx.factories().and_then(|f| f.make_object(meta.id())) {
            *self = object;
            return;
        }
        match meta.get_trait::<TypeTraitObject>() {
            Some(factory) => *self = factory.create(),
            None => cx.error(
                Category::Reference,
                node,
                format!("`{}` cannot be created from a class name", meta.path()),
            ),
        }
    }
}
