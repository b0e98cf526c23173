use alloc::format;

use crate::diagnostics::Category;
use crate::document::NodeId;
use crate::impls::{ITEM_TAG, for_each_item};
use crate::reflection::{ParseMode, Reflect, ReflectKind};
use crate::walker::{ReadCx, WriteCx, read_value, write_value};

macro_rules! impl_reflect_tuple {
    ($len:literal; $($name:ident $index:tt),+) => {
        impl<$($name: Reflect),+> Reflect for ($($name,)+) {
            const KIND: ReflectKind = ReflectKind::Tuple;

            fn create() -> Self {
                ($($name::create(),)+)
            }

            fn compose(&mut self, cx: &mut WriteCx<'_>, node: NodeId) {
                $(
                    let child = cx.doc_mut().add_child(node, ITEM_TAG);
                    write_value(cx, &mut self.$index, child);
                )+
            }

            fn parse(&mut self, cx: &mut ReadCx<'_>, node: NodeId, mode: ParseMode) {
                cx.check_mode(node, mode, &[ParseMode::Patch]);

                let doc = cx.doc();
                let count = doc.children(node).iter().filter(|c| doc.tag(**c) == ITEM_TAG).count();
                if count != $len {
                    cx.error(
                        Category::Shape,
                        node,
                        format!("`{}` expects {} items, found {count}", Self::type_path(), $len),
                    );
                }

                let mut position = 0usize;
                for_each_item(cx, node, Self::type_path(), |cx, child| {
                    match position {
                        $( $index => read_value(cx, child, &mut self.$index), )+
                        _ => {}
                    }
                    position += 1;
                });
            }
        }
    };
}

impl_reflect_tuple!(1; A 0);
impl_reflect_tuple!(2; A 0, B 1);
impl_reflect_tuple!(3; A 0, B 1, C 2);
impl_reflect_tuple!(4; A 0, B 1, C 2, D 3);
impl_reflect_tuple!(5; A 0, B 1, C 2, D 3, E 4);
impl_reflect_tuple!(6; A 0, B 1, C 2, D 3, E 4, F 5);
