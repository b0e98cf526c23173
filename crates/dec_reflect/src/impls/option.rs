use crate::document::NodeId;
use crate::reflection::{ParseMode, Reflect, ReflectKind};
use crate::registry::TypeMeta;
use crate::walker::{ReadCx, WriteCx, dispatch_compose, dispatch_parse};

/// `None` is written as `null="true"`, `Some` as the inner value.
impl<T: Reflect> Reflect for Option<T> {
    const KIND: ReflectKind = ReflectKind::Option;

    fn create() -> Self {
        None
    }

    fn compose(&mut self, cx: &mut WriteCx<'_>, node: NodeId) {
        match self {
            Some(value) => dispatch_compose(cx, value, node),
            None => cx.doc_mut().set_attr(node, "null", "true"),
        }
    }

    fn parse(&mut self, cx: &mut ReadCx<'_>, node: NodeId, mode: ParseMode) {
        let value = self.get_or_insert_with(|| T::create_in(cx));
        dispatch_parse(cx, node, value, mode);
    }

    fn parse_null(&mut self, _: &mut ReadCx<'_>, _: NodeId) {
        *self = None;
    }

    fn from_ref(cx: &mut ReadCx<'_>, node: NodeId, id: &str) -> Option<Self> {
        T::from_ref(cx, node, id).map(Some)
    }

    fn apply_class(&mut self, cx: &mut ReadCx<'_>, node: NodeId, meta: &TypeMeta) {
        let value = self.get_or_insert_with(|| T::create_in(cx));
        value.apply_class(cx, node, meta);
    }

    fn from_key_text(cx: &mut ReadCx<'_>, node: NodeId, text: &str) -> Option<Self> {
        T::from_key_text(cx, node, text).map(Some)
    }
}
