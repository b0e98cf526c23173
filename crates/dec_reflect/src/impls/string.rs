use alloc::string::String;

use crate::document::NodeId;
use crate::reflection::{ParseMode, Reflect, ReflectKind};
use crate::walker::{ReadCx, WriteCx};

impl Reflect for String {
    const KIND: ReflectKind = ReflectKind::String;

    fn type_path() -> &'static str {
        "String"
    }

    fn create() -> Self {
        String::new()
    }

    fn compose(&mut self, cx: &mut WriteCx<'_>, node: NodeId) {
        if !self.is_empty() {
            cx.doc_mut().set_text(node, self.as_str());
        }
    }

    fn parse(&mut self, cx: &mut ReadCx<'_>, node: NodeId, mode: ParseMode) {
        cx.check_mode(node, mode, &[ParseMode::Replace]);
        let text = cx.expect_text(node, "String");
        self.clear();
        self.push_str(text);
    }

    fn from_key_text(_: &mut ReadCx<'_>, _: NodeId, text: &str) -> Option<Self> {
        Some(String::from(text))
    }
}
