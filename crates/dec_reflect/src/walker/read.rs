use alloc::format;
use alloc::rc::Rc;
use alloc::string::String;
use core::any::TypeId;
use core::cell::RefCell;

#[cfg(feature = "debug")]
use alloc::vec::Vec;

use crate::diagnostics::{Category, Location};
use crate::document::{Document, NodeId};
use crate::reflection::{ParseMode, Reflect};
use crate::refs::{Shared, StubTable};
use crate::walker::{Env, Factories};

// -----------------------------------------------------------------------------
// ReadCx

/// State of one read: the document, the environment and, for recorded
/// graphs, the table of pre-created reference stubs.
pub struct ReadCx<'a> {
    env: Env<'a>,
    doc: &'a Document,
    source: &'a str,
    stubs: Option<StubTable>,
    factories: Option<Factories>,
    record_depth: u32,
    #[cfg(feature = "debug")]
    path: Vec<&'static str>,
}

impl<'a> ReadCx<'a> {
    /// Creates a context for definition documents, references are refused.
    pub fn new(env: Env<'a>, doc: &'a Document, source: &'a str) -> Self {
        Self {
            env,
            doc,
            source,
            stubs: None,
            factories: None,
            record_depth: 0,
            #[cfg(feature = "debug")]
            path: Vec::new(),
        }
    }

    /// Switches to recorded-graph mode with the given stubs.
    pub(crate) fn with_stubs(mut self, stubs: StubTable) -> Self {
        self.stubs = Some(stubs);
        self
    }

    #[inline]
    pub fn env(&self) -> Env<'a> {
        self.env
    }

    #[inline]
    pub fn doc(&self) -> &'a Document {
        self.doc
    }

    #[inline]
    pub fn source(&self) -> &'a str {
        self.source
    }

    #[inline]
    pub fn location(&self, node: NodeId) -> Location {
        self.doc.location(node, self.source)
    }

    /// Returns `true` when reading a recorded graph.
    #[inline]
    pub fn in_record_mode(&self) -> bool {
        self.stubs.is_some()
    }

    /// Field descriptors are refused in recorded graphs and inside
    /// [`Recordable`](crate::Recordable) callbacks.
    #[inline]
    pub fn reflection_allowed(&self) -> bool {
        !self.in_record_mode() && self.record_depth == 0
    }

    #[inline]
    pub(crate) fn enter_record(&mut self) {
        self.record_depth += 1;
    }

    #[inline]
    pub(crate) fn leave_record(&mut self) {
        self.record_depth -= 1;
    }

    /// The constructors active for values created at this point.
    #[inline]
    pub fn factories(&self) -> Option<&Factories> {
        self.factories.as_ref()
    }

    /// Replaces the active constructors, returning the previous ones.
    #[inline]
    pub(crate) fn swap_factories(&mut self, factories: Option<Factories>) -> Option<Factories> {
        core::mem::replace(&mut self.factories, factories)
    }

    #[inline]
    pub(crate) fn stubs(&self) -> Option<&StubTable> {
        self.stubs.as_ref()
    }

    /// Reports an error at `node`.
    pub fn error(&self, category: Category, node: NodeId, message: impl Into<String>) {
        let message = self.decorate(message.into());
        self.env.reporter.error(category, &self.location(node), message);
    }

    /// Reports a warning at `node`.
    pub fn warn(&self, category: Category, node: NodeId, message: impl Into<String>) {
        let message = self.decorate(message.into());
        self.env.reporter.warn(category, &self.location(node), message);
    }

    #[cfg(feature = "debug")]
    fn decorate(&self, message: String) -> String {
        if cfg!(debug_assertions) && !self.path.is_empty() {
            format!("{message} (while reading {})", self.path.join(" > "))
        } else {
            message
        }
    }

    #[cfg(not(feature = "debug"))]
    #[inline(always)]
    fn decorate(&self, message: String) -> String {
        message
    }

    /// Returns the text of a leaf node, reporting child elements.
    ///
    /// An empty node reads as the empty string.
    pub fn expect_text(&self, node: NodeId, type_path: &str) -> &'a str {
        let n = self.doc.node(node);
        if n.has_children() {
            self.error(
                Category::Shape,
                node,
                format!("`{type_path}` expects text, found child elements"),
            );
        }
        n.text.as_deref().unwrap_or("")
    }

    /// Reports text on a node which should only have child elements.
    pub fn reject_text(&self, node: NodeId, type_path: &str) {
        if self.doc.text(node).is_some_and(|t| !t.trim().is_empty()) {
            self.error(
                Category::Shape,
                node,
                format!("`{type_path}` expects child elements, found text"),
            );
        }
    }

    /// Returns `mode` if it is the default or listed in `allowed`,
    /// otherwise reports it and falls back to the default.
    pub fn check_mode(&self, node: NodeId, mode: ParseMode, allowed: &[ParseMode]) -> ParseMode {
        if mode == ParseMode::Default || allowed.contains(&mode) {
            mode
        } else {
            self.error(
                Category::Shape,
                node,
                format!("mode `{}` is not valid here, using the default", mode.as_str()),
            );
            ParseMode::Default
        }
    }

    /// Looks a reference id up in the stub table.
    pub(crate) fn resolve_ref<T: Reflect>(&self, node: NodeId, id: &str) -> Option<Shared<T>> {
        let Some(stubs) = self.stubs() else {
            self.error(
                Category::Reference,
                node,
                format!("`ref=\"{id}\"` is only valid inside recorded graphs"),
            );
            return None;
        };
        let Some(stub) = stubs.get(id) else {
            self.error(
                Category::Reference,
                node,
                format!("unknown reference `{id}`"),
            );
            return None;
        };
        match Rc::clone(&stub.value).downcast::<RefCell<T>>() {
            Ok(value) => Some(value),
            Err(_) => {
                self.error(
                    Category::Reference,
                    node,
                    format!(
                        "reference `{id}` is a `{}`, which cannot be assigned to `{}`",
                        stub.type_path,
                        T::type_path()
                    ),
                );
                None
            }
        }
    }
}

// -----------------------------------------------------------------------------
// Metadata

struct NodeMeta<'d> {
    null: bool,
    reference: Option<&'d str>,
    class: Option<&'d str>,
    mode: ParseMode,
}

fn consume_meta<'a>(cx: &ReadCx<'a>, node: NodeId, skip: &[&str]) -> NodeMeta<'a> {
    let doc = cx.doc();
    let n = doc.node(node);
    let mut meta = NodeMeta {
        null: false,
        reference: None,
        class: None,
        mode: ParseMode::Default,
    };

    for attr in &n.attrs {
        match attr.name.as_str() {
            name if skip.contains(&name) => {}
            "null" => match attr.value.as_str() {
                "true" => meta.null = true,
                "false" => {}
                other => cx.error(
                    Category::Shape,
                    node,
                    format!("invalid `null` value `{other}`, expected `true` or `false`"),
                ),
            },
            "ref" => meta.reference = Some(attr.value.as_str()),
            "class" => meta.class = Some(attr.value.as_str()),
            "mode" => match ParseMode::from_name(&attr.value) {
                Some(mode) => meta.mode = mode,
                None => cx.error(
                    Category::Shape,
                    node,
                    format!("unknown mode `{}`, using the default", attr.value),
                ),
            },
            name => cx.error(
                Category::Shape,
                node,
                format!("unknown attribute `{name}` on <{}>", n.tag),
            ),
        }
    }

    if meta.null && (meta.reference.is_some() || meta.class.is_some()) {
        cx.error(
            Category::Shape,
            node,
            "`null` cannot be combined with `ref` or `class`, reading as null",
        );
        meta.reference = None;
        meta.class = None;
    }
    if meta.reference.is_some() && (meta.class.is_some() || meta.mode != ParseMode::Default) {
        cx.error(
            Category::Shape,
            node,
            "`ref` cannot be combined with `class` or `mode`, they are ignored",
        );
    }
    if (meta.null || meta.reference.is_some()) && (n.has_text() || n.has_children()) {
        cx.error(
            Category::Shape,
            node,
            "a `null` or `ref` node must be empty, its content is ignored",
        );
    }

    meta
}

// -----------------------------------------------------------------------------
// Entry points

/// Reads `node` into `target`, starting with the node's metadata.
///
/// `target` is the override target: fields absent from the node keep
/// their current value.
#[inline]
pub fn read_value<T: Reflect>(cx: &mut ReadCx<'_>, node: NodeId, target: &mut T) {
    read_value_with(cx, node, target, &[]);
}

/// Like [`read_value`], ignoring the attributes named in `skip`.
///
/// Used for nodes whose attributes belong to an outer layer, such as
/// `defName` on definitions or `id` on reference records.
pub fn read_value_with<T: Reflect>(
    cx: &mut ReadCx<'_>,
    node: NodeId,
    target: &mut T,
    skip: &[&str],
) {
    #[cfg(feature = "debug")]
    cx.path.push(T::type_path());

    read_inner(cx, node, target, skip);

    #[cfg(feature = "debug")]
    cx.path.pop();
}

fn read_inner<T: Reflect>(cx: &mut ReadCx<'_>, node: NodeId, target: &mut T, skip: &[&str]) {
    let meta = consume_meta(cx, node, skip);

    if meta.null {
        target.parse_null(cx, node);
        return;
    }

    if let Some(id) = meta.reference {
        if let Some(value) = T::from_ref(cx, node, id) {
            *target = value;
        }
        return;
    }

    if let Some(class) = meta.class {
        let env = cx.env();
        let location = cx.location(node);
        if let Some(found) = env.directory.resolve_reported(class, env.reporter, &location) {
            target.apply_class(cx, node, found);
        }
    }

    dispatch_parse(cx, node, target, meta.mode);
}

/// Reads the content of `node` into `target`, after metadata handling.
///
/// Converters take priority for converter-eligible kinds.
pub fn dispatch_parse<T: Reflect>(cx: &mut ReadCx<'_>, node: NodeId, target: &mut T, mode: ParseMode) {
    if T::KIND.converter_eligible() {
        let converters = cx.env().converters;
        if let Some(converter) = converters.get(&TypeId::of::<T>()) {
            converter.parse(target, cx, node, mode);
            return;
        }
    }
    target.parse(cx, node, mode);
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use alloc::collections::BTreeMap;
    use alloc::string::String;
    use alloc::vec;
    use alloc::vec::Vec;

    use super::read_value;
    use crate::diagnostics::{Collected, Reporter};
    use crate::document::Document;
    use crate::registry::{ConverterRegistry, TypeDirectory};
    use crate::walker::{Env, ReadCx};
    use crate::{Reflect, Shared, TypeHandle, impl_reflect_enum, impl_reflect_struct};

    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
    enum Element {
        Fire,
        Ice,
    }

    impl_reflect_enum!(Element { Fire, Ice });

    #[derive(Default)]
    struct Weapon {
        damage: i32,
        tags: Vec<String>,
        bonus: BTreeMap<Element, i32>,
        owner: Option<Shared<Weapon>>,
    }

    impl_reflect_struct!(Weapon { damage, tags, bonus, owner });

    fn read<T: Reflect>(xml: &str, target: &mut T) -> Collected {
        let (reporter, collected) = Reporter::collecting();
        let directory = TypeDirectory::new();
        let converters = ConverterRegistry::empty();
        let env = Env::new(&directory, &converters, &reporter);
        let doc = Document::from_xml(xml, "test.xml", &reporter).unwrap();
        let mut cx = ReadCx::new(env, &doc, "test.xml");
        let root = doc.root().unwrap();
        read_value(&mut cx, root, target);
        collected
    }

    #[test]
    fn fields_override_the_target() {
        let mut weapon = Weapon {
            damage: 3,
            tags: vec![String::from("old")],
            ..Weapon::default()
        };
        let collected = read(
            "<Weapon><tags><li>sharp</li><li>heavy</li></tags><bonus><Fire>2</Fire></bonus></Weapon>",
            &mut weapon,
        );
        assert!(collected.errors().is_empty(), "{collected:?}");
        assert_eq!(weapon.damage, 3);
        assert_eq!(weapon.tags, ["sharp", "heavy"]);
        assert_eq!(weapon.bonus.get(&Element::Fire), Some(&2));
    }

    #[test]
    fn modes_combine_collections() {
        let mut weapon = Weapon {
            tags: vec![String::from("old")],
            ..Weapon::default()
        };
        weapon.bonus.insert(Element::Ice, 1);
        let collected = read(
            "<Weapon><tags mode=\"append\"><li>new</li></tags>\
             <bonus mode=\"patch\"><Fire>5</Fire></bonus></Weapon>",
            &mut weapon,
        );
        assert!(collected.errors().is_empty(), "{collected:?}");
        assert_eq!(weapon.tags, ["old", "new"]);
        assert_eq!(weapon.bonus.len(), 2);

        let collected = read("<Weapon><bonus mode=\"append\"><Ice>3</Ice></bonus></Weapon>", &mut weapon);
        assert!(collected.has_error("duplicate key"));
        assert_eq!(weapon.bonus.get(&Element::Ice), Some(&3));
    }

    #[test]
    fn map_entries_in_long_form() {
        let mut map: BTreeMap<String, i32> = BTreeMap::new();
        let collected = read(
            "<m><li><key>a b</key><value>1</value></li><li><key>a b</key><value>2</value></li></m>",
            &mut map,
        );
        assert!(collected.has_error("duplicate key"));
        assert_eq!(map.get("a b"), Some(&2));
    }

    #[test]
    fn unknown_fields_get_a_hint() {
        let mut weapon = Weapon::default();
        let collected = read("<Weapon><Damage>4</Damage><damage>2</damage></Weapon>", &mut weapon);
        assert!(collected.has_error("did you mean `damage`"));
        assert_eq!(weapon.damage, 2);
    }

    #[test]
    fn metadata_is_checked() {
        let mut weapon = Weapon::default();
        let collected = read(
            "<Weapon colour=\"red\"><owner ref=\"ref00000\" /><damage null=\"true\" /></Weapon>",
            &mut weapon,
        );
        assert!(collected.has_error("unknown attribute `colour`"));
        assert!(collected.has_error("only valid inside recorded graphs"));
        assert!(collected.has_error("cannot be null"));
        assert!(weapon.owner.is_none());
    }

    #[test]
    fn shared_values_are_inline_in_definitions() {
        let mut weapon = Weapon::default();
        let collected = read("<Weapon><owner><damage>7</damage></owner></Weapon>", &mut weapon);
        assert!(collected.errors().is_empty(), "{collected:?}");
        assert_eq!(weapon.owner.as_ref().unwrap().borrow().damage, 7);
    }

    #[test]
    fn leaves_report_bad_text() {
        let mut value = 0i32;
        let collected = read("<v>twelve</v>", &mut value);
        assert!(collected.has_error("cannot be read as `i32`"));
        assert_eq!(value, 0);

        let mut element = Element::Fire;
        let collected = read("<v>Water</v>", &mut element);
        assert!(collected.has_error("expected one of: Fire, Ice"));

        let mut pair = (0u8, String::new());
        let collected = read("<v><li>1</li></v>", &mut pair);
        assert!(collected.has_error("expects 2 items"));
        assert_eq!(pair.0, 1);
    }

    #[test]
    fn type_handles_resolve_names() {
        let mut handle = TypeHandle::of::<()>();
        let collected = read("<v>i64</v>", &mut handle);
        assert!(collected.errors().is_empty());
        assert!(handle.is::<i64>());

        let collected = read("<v>Vec&lt;i64&gt;</v>", &mut handle);
        assert!(collected.has_error("generic type"));
    }
}
