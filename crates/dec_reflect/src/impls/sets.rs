use alloc::collections::BTreeSet;
use alloc::format;
use core::hash::{BuildHasher, Hash};

use crate::diagnostics::Category;
use crate::document::NodeId;
use crate::impls::ITEM_TAG;
use crate::reflection::{ParseMode, Reflect, ReflectKind};
use crate::walker::{ReadCx, WriteCx, read_value, write_value};

/// Reads every element of a set node, `<li>..</li>` or the shorthand
/// `<Element />` for elements readable from a tag name.
fn parse_elements<T: Reflect>(
    cx: &mut ReadCx<'_>,
    node: NodeId,
    type_path: &str,
    mut insert: impl FnMut(&mut ReadCx<'_>, NodeId, T),
) {
    cx.reject_text(node, type_path);
    let doc = cx.doc();
    for &child in doc.children(node) {
        let tag = doc.tag(child);
        if tag == ITEM_TAG {
            let mut element = T::create_in(cx);
            read_value(cx, child, &mut element);
            insert(cx, child, element);
        } else if let Some(element) = T::from_key_text(cx, child, tag) {
            let n = doc.node(child);
            if n.has_children() || n.text.as_deref().is_some_and(|t| !t.trim().is_empty()) {
                cx.error(
                    Category::Shape,
                    child,
                    format!("shorthand element `<{tag}>` of `{type_path}` must be empty"),
                );
            }
            insert(cx, child, element);
        }
    }
}

#[cold]
fn duplicate_element(cx: &ReadCx<'_>, node: NodeId, type_path: &str) {
    cx.error(
        Category::Shape,
        node,
        format!("duplicate element in `{type_path}`"),
    );
}

// Hash sets are written in iteration order, reproducible only with a fixed
// hasher such as the one of `dec_utils::hash::HashSet`.
macro_rules! impl_reflect_set {
    ($($ty:ident)::+ <T $(, $s:ident)?> where $($bound:tt)*) => {
        impl<T $(, $s)?> Reflect for $($ty)::+<T $(, $s)?>
        where
            $($bound)*
        {
            const KIND: ReflectKind = ReflectKind::Set;

            fn create() -> Self {
                Self::default()
            }

            fn compose(&mut self, cx: &mut WriteCx<'_>, node: NodeId) {
                for element in self.iter() {
                    let child = cx.doc_mut().add_child(node, ITEM_TAG);
                    write_value(cx, &mut element.clone(), child);
                }
            }

            fn parse(&mut self, cx: &mut ReadCx<'_>, node: NodeId, mode: ParseMode) {
                let mode = cx.check_mode(
                    node,
                    mode,
                    &[ParseMode::Replace, ParseMode::Patch, ParseMode::Append],
                );
                if matches!(mode, ParseMode::Default | ParseMode::Replace) {
                    self.clear();
                }

                let type_path = Self::type_path();
                parse_elements(cx, node, type_path, |cx, child, element: T| {
                    if !self.insert(element) && mode != ParseMode::Patch {
                        duplicate_element(cx, child, type_path);
                    }
                });
            }
        }
    };
}

impl_reflect_set!(std::collections::HashSet<T, S> where T: Reflect + Clone + Eq + Hash, S: BuildHasher + Default + 'static);
impl_reflect_set!(dec_utils::hash::hashbrown::HashSet<T, S> where T: Reflect + Clone + Eq + Hash, S: BuildHasher + Default + 'static);
impl_reflect_set!(BTreeSet<T> where T: Reflect + Clone + Ord);
