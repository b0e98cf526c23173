//! [`Reflect`](crate::Reflect) for std types.

// -----------------------------------------------------------------------------
// Modules

mod converted;
mod maps;
mod object;
mod option;
mod primitives;
mod sequences;
mod sets;
mod string;
mod tuples;
mod type_handle;

// -----------------------------------------------------------------------------
// Exports

pub use converted::Converted;
pub use type_handle::TypeHandle;

// -----------------------------------------------------------------------------
// Helpers

use alloc::format;

use crate::diagnostics::Category;
use crate::document::NodeId;
use crate::walker::ReadCx;

/// Tag of collection items.
pub(crate) const ITEM_TAG: &str = "li";

/// Calls `f` for every `li` child of `node`, reporting other children.
pub(crate) fn for_each_item(
    cx: &mut ReadCx<'_>,
    node: NodeId,
    type_path: &str,
    mut f: impl FnMut(&mut ReadCx<'_>, NodeId),
) {
    cx.reject_text(node, type_path);
    let doc = cx.doc();
    for &child in doc.children(node) {
        if doc.tag(child) == ITEM_TAG {
            f(cx, child);
        } else {
            cx.error(
                Category::Shape,
                child,
                format!(
                    "items of `{type_path}` must be `<{ITEM_TAG}>`, found `<{}>`",
                    doc.tag(child)
                ),
            );
        }
    }
}
