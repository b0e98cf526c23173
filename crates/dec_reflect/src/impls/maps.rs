use alloc::collections::{BTreeMap, BTreeSet};
use alloc::format;
use core::hash::{BuildHasher, Hash};

use dec_utils::hash::HashSet;

use crate::diagnostics::Category;
use crate::document::NodeId;
use crate::impls::ITEM_TAG;
use crate::reflection::{ParseMode, Reflect, ReflectKind};
use crate::walker::{ReadCx, WriteCx, read_value, write_value};

const KEY_TAG: &str = "key";
const VALUE_TAG: &str = "value";

// -----------------------------------------------------------------------------
// Entries

fn compose_entry<K: Reflect + Clone, V: Reflect>(
    cx: &mut WriteCx<'_>,
    node: NodeId,
    key: &K,
    value: &mut V,
) {
    let item = cx.doc_mut().add_child(node, ITEM_TAG);
    let key_node = cx.doc_mut().add_child(item, KEY_TAG);
    write_value(cx, &mut key.clone(), key_node);
    let value_node = cx.doc_mut().add_child(item, VALUE_TAG);
    write_value(cx, value, value_node);
}

/// Reads every entry of a map node.
///
/// Entries are either `<li><key>..</key><value>..</value></li>` or the
/// shorthand `<Key>value</Key>` for keys readable from a tag name.
fn parse_entries<K: Reflect, V: Reflect>(
    cx: &mut ReadCx<'_>,
    node: NodeId,
    type_path: &str,
    mut insert: impl FnMut(&mut ReadCx<'_>, NodeId, K, V),
) {
    cx.reject_text(node, type_path);
    let doc = cx.doc();
    for &child in doc.children(node) {
        let tag = doc.tag(child);
        if tag == ITEM_TAG {
            let (Some(key_node), Some(value_node)) =
                (doc.child_named(child, KEY_TAG), doc.child_named(child, VALUE_TAG))
            else {
                cx.error(
                    Category::Shape,
                    child,
                    format!("entries of `{type_path}` need `<{KEY_TAG}>` and `<{VALUE_TAG}>` children"),
                );
                continue;
            };
            if doc.children(child).len() > 2 {
                cx.error(
                    Category::Shape,
                    child,
                    format!("entry of `{type_path}` has children besides `<{KEY_TAG}>` and `<{VALUE_TAG}>`"),
                );
            }

            let mut key = K::create_in(cx);
            read_value(cx, key_node, &mut key);
            let mut value = V::create_in(cx);
            read_value(cx, value_node, &mut value);
            insert(cx, child, key, value);
        } else {
            let Some(key) = K::from_key_text(cx, child, tag) else {
                continue;
            };
            let mut value = V::create_in(cx);
            read_value(cx, child, &mut value);
            insert(cx, child, key, value);
        }
    }
}

#[cold]
fn duplicate_key(cx: &ReadCx<'_>, node: NodeId, type_path: &str) {
    cx.error(
        Category::Shape,
        node,
        format!("duplicate key in `{type_path}`, the last one wins"),
    );
}

// -----------------------------------------------------------------------------
// HashMap

// Hash maps are written in iteration order. Shared values inside them take
// their reference ids in that order, so the output is only reproducible
// when the hasher is: `dec_utils::hash::HashMap` is, std's `RandomState`
// is not.
macro_rules! impl_reflect_hash_map {
    ($($map:ident)::+) => {
        impl<K, V, S> Reflect for $($map)::+<K, V, S>
        where
            K: Reflect + Clone + Eq + Hash,
            V: Reflect,
            S: BuildHasher + Default + 'static,
        {
            const KIND: ReflectKind = ReflectKind::Map;

            fn create() -> Self {
                Self::default()
            }

            fn compose(&mut self, cx: &mut WriteCx<'_>, node: NodeId) {
                for (key, value) in self.iter_mut() {
                    compose_entry(cx, node, key, value);
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
                let mut seen: HashSet<K> = HashSet::default();
                parse_entries(cx, node, type_path, |cx, child, key: K, value: V| {
                    let repeated = !seen.insert(key.clone());
                    if repeated || (mode == ParseMode::Append && self.contains_key(&key)) {
                        duplicate_key(cx, child, type_path);
                    }
                    self.insert(key, value);
                });
            }
        }
    };
}

impl_reflect_hash_map!(std::collections::HashMap);
impl_reflect_hash_map!(dec_utils::hash::hashbrown::HashMap);

// -----------------------------------------------------------------------------
// BTreeMap

impl<K, V> Reflect for BTreeMap<K, V>
where
    K: Reflect + Clone + Ord,
    V: Reflect,
{
    const KIND: ReflectKind = ReflectKind::Map;

    fn create() -> Self {
        BTreeMap::new()
    }

    fn compose(&mut self, cx: &mut WriteCx<'_>, node: NodeId) {
        for (key, value) in self.iter_mut() {
            compose_entry(cx, node, key, value);
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
        let mut seen: BTreeSet<K> = BTreeSet::new();
        parse_entries(cx, node, type_path, |cx, child, key: K, value: V| {
            let repeated = !seen.insert(key.clone());
            if repeated || (mode == ParseMode::Append && self.contains_key(&key)) {
                duplicate_key(cx, child, type_path);
            }
            self.insert(key, value);
        });
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use alloc::collections::BTreeMap;

    use dec_utils::hash::HashMap;

    use crate::diagnostics::{Collected, Reporter};
    use crate::document::Document;
    use crate::registry::{ConverterRegistry, TypeDirectory};
    use crate::walker::{Env, ReadCx, read_value};
    use crate::{Reflect, impl_reflect_enum};

    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
    enum Slot {
        Head,
        Hand,
        Feet,
    }

    impl_reflect_enum!(Slot { Head, Hand, Feet });

    fn read<T: Reflect>(xml: &str, target: &mut T) -> Collected {
        let (reporter, collected) = Reporter::collecting();
        let directory = TypeDirectory::new();
        let converters = ConverterRegistry::empty();
        let env = Env::new(&directory, &converters, &reporter);
        let doc = Document::from_xml(xml, "map.xml", &reporter).unwrap();
        let mut cx = ReadCx::new(env, &doc, "map.xml");
        read_value(&mut cx, doc.root().unwrap(), target);
        collected
    }

    #[test]
    fn shorthand_and_long_entries_mix() {
        let mut map: BTreeMap<Slot, i32> = BTreeMap::new();
        let collected = read(
            "<m><Head>1</Head><li><key>Hand</key><value>2</value></li><Feet>3</Feet></m>",
            &mut map,
        );
        assert!(collected.errors().is_empty(), "{collected:?}");
        assert_eq!(map.len(), 3);
        assert_eq!(map[&Slot::Head], 1);
        assert_eq!(map[&Slot::Hand], 2);
        assert_eq!(map[&Slot::Feet], 3);

        let mut hashed: HashMap<Slot, i32> = HashMap::default();
        let collected = read(
            "<m><li><key>Feet</key><value>4</value></li><Hand>5</Hand></m>",
            &mut hashed,
        );
        assert!(collected.errors().is_empty(), "{collected:?}");
        assert_eq!(hashed.get(&Slot::Feet), Some(&4));
        assert_eq!(hashed.get(&Slot::Hand), Some(&5));
    }

    #[test]
    fn duplicates_are_found_across_entry_forms() {
        let mut map: BTreeMap<Slot, i32> = BTreeMap::new();
        let collected = read(
            "<m><Head>1</Head><li><key>Head</key><value>3</value></li></m>",
            &mut map,
        );
        assert!(collected.has_error("duplicate key"));
        assert_eq!(map.len(), 1);
        assert_eq!(map[&Slot::Head], 3);
    }
}
