use alloc::collections::VecDeque;
use alloc::format;
use alloc::vec::Vec;

use crate::diagnostics::Category;
use crate::document::NodeId;
use crate::impls::{ITEM_TAG, for_each_item};
use crate::reflection::{ParseMode, Reflect, ReflectKind};
use crate::walker::{ReadCx, WriteCx, read_value, write_value};

// -----------------------------------------------------------------------------
// Vec, VecDeque

macro_rules! impl_reflect_list {
    ($ty:ident, $push:ident) => {
        impl<T: Reflect> Reflect for $ty<T> {
            const KIND: ReflectKind = ReflectKind::List;

            fn create() -> Self {
                $ty::new()
            }

            fn compose(&mut self, cx: &mut WriteCx<'_>, node: NodeId) {
                for item in self.iter_mut() {
                    let child = cx.doc_mut().add_child(node, ITEM_TAG);
                    write_value(cx, item, child);
                }
            }

            fn parse(&mut self, cx: &mut ReadCx<'_>, node: NodeId, mode: ParseMode) {
                let mode = cx.check_mode(node, mode, &[ParseMode::Replace, ParseMode::Append]);
                if mode != ParseMode::Append {
                    self.clear();
                }
                for_each_item(cx, node, Self::type_path(), |cx, child| {
                    let mut item = T::create_in(cx);
                    read_value(cx, child, &mut item);
                    self.$push(item);
                });
            }
        }
    };
}

impl_reflect_list!(Vec, push);
impl_reflect_list!(VecDeque, push_back);

// -----------------------------------------------------------------------------
// Arrays

impl<T: Reflect, const N: usize> Reflect for [T; N] {
    const KIND: ReflectKind = ReflectKind::Array;

    fn create() -> Self {
        core::array::from_fn(|_| T::create())
    }

    fn compose(&mut self, cx: &mut WriteCx<'_>, node: NodeId) {
        for item in self.iter_mut() {
            let child = cx.doc_mut().add_child(node, ITEM_TAG);
            write_value(cx, item, child);
        }
    }

    fn parse(&mut self, cx: &mut ReadCx<'_>, node: NodeId, mode: ParseMode) {
        cx.check_mode(node, mode, &[ParseMode::Patch]);

        let doc = cx.doc();
        let count = doc
            .children(node)
            .iter()
            .filter(|c| doc.tag(**c) == ITEM_TAG)
            .count();
        if count != N {
            cx.error(
                Category::Shape,
                node,
                format!(
                    "`{}` expects {N} items, found {count}",
                    Self::type_path()
                ),
            );
        }

        let mut slots = self.iter_mut();
        for_each_item(cx, node, Self::type_path(), |cx, child| {
            if let Some(slot) = slots.next() {
                read_value(cx, child, slot);
            }
        });
    }
}
