//! The textual node tree.
//!
//! A [`Document`] is an arena of [`Node`]s addressed by [`NodeId`]. Every
//! node has a tag, attributes (the per-node metadata), ordered children and
//! optional raw text. Text and children are mutually exclusive for valid
//! input. The walker reports a node which has both.
//!
//! Documents are read from and written to XML with `quick-xml`:
//!
//! ```
//! use dec_reflect::diagnostics::Reporter;
//! use dec_reflect::document::Document;
//!
//! let reporter = Reporter::logging();
//! let doc = Document::from_xml("<Defs><Item defName=\"Sword\"><damage>4</damage></Item></Defs>", "items.xml", &reporter).unwrap();
//!
//! let root = doc.root().unwrap();
//! let item = doc.children(root)[0];
//! assert_eq!(doc.attr(item, "defName"), Some("Sword"));
//! assert_eq!(doc.text(doc.child_named(item, "damage").unwrap()), Some("4"));
//! ```

// -----------------------------------------------------------------------------
// Modules

mod xml_read;
mod xml_write;

// -----------------------------------------------------------------------------
// Types

use alloc::string::String;
use alloc::vec::Vec;
use core::mem;

use crate::diagnostics::{Location, Reporter};

/// Index of a [`Node`] inside its [`Document`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    /// The position of the node in the arena.
    #[inline(always)]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// A `name="value"` pair on a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

/// A single element of the tree.
#[derive(Debug, Clone, Default)]
pub struct Node {
    pub tag: String,
    pub attrs: Vec<Attribute>,
    pub text: Option<String>,
    pub children: Vec<NodeId>,
    /// Line of the opening tag, if the node came from text.
    pub line: Option<u32>,
}

impl Node {
    /// Returns the value of an attribute.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    /// Returns `true` if the node carries text.
    #[inline]
    pub fn has_text(&self) -> bool {
        self.text.is_some()
    }

    /// Returns `true` if the node has element children.
    #[inline]
    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }
}

/// The content moved out of a node by [`Document::take_content`].
#[derive(Debug, Default)]
pub struct NodeContent {
    pub attrs: Vec<Attribute>,
    pub text: Option<String>,
    pub children: Vec<NodeId>,
}

// -----------------------------------------------------------------------------
// Document

/// An arena of nodes plus the list of top-level nodes.
#[derive(Debug, Clone, Default)]
pub struct Document {
    nodes: Vec<Node>,
    roots: Vec<NodeId>,
}

impl Document {
    /// Creates an empty document.
    #[inline]
    pub const fn new() -> Self {
        Self {
            nodes: Vec::new(),
            roots: Vec::new(),
        }
    }

    /// Parses XML text. Problems are reported as structural errors.
    ///
    /// Returns `None` if the text is not well-formed.
    pub fn from_xml(input: &str, source: &str, reporter: &Reporter) -> Option<Self> {
        xml_read::parse(input, source, reporter)
    }

    /// Writes the document as XML.
    ///
    /// With `pretty`, nested elements are indented by two spaces.
    /// Text content is never re-indented.
    pub fn to_xml(&self, pretty: bool) -> String {
        xml_write::write(self, pretty)
    }

    /// Number of nodes in the arena, attached or not.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Creates a node which is not attached anywhere yet.
    pub fn create(&mut self, tag: impl Into<String>) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node {
            tag: tag.into(),
            ..Node::default()
        });
        id
    }

    /// Creates a top-level node.
    pub fn add_root(&mut self, tag: impl Into<String>) -> NodeId {
        let id = self.create(tag);
        self.roots.push(id);
        id
    }

    /// Creates a node as the last child of `parent`.
    pub fn add_child(&mut self, parent: NodeId, tag: impl Into<String>) -> NodeId {
        let id = self.create(tag);
        self.nodes[parent.index()].children.push(id);
        id
    }

    /// Attaches an existing node as the last child of `parent`.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[parent.index()].children.push(child);
    }

    /// Detaches `child` from `parent`. The node stays in the arena.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[parent.index()].children.retain(|c| *c != child);
    }

    /// The top-level nodes.
    #[inline]
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// The first top-level node.
    #[inline]
    pub fn root(&self) -> Option<NodeId> {
        self.roots.first().copied()
    }

    #[inline]
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    #[inline]
    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }

    #[inline]
    pub fn tag(&self, id: NodeId) -> &str {
        &self.node(id).tag
    }

    #[inline]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).children
    }

    #[inline]
    pub fn text(&self, id: NodeId) -> Option<&str> {
        self.node(id).text.as_deref()
    }

    #[inline]
    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.node(id).attr(name)
    }

    /// Sets an attribute, replacing an existing value.
    pub fn set_attr(&mut self, id: NodeId, name: &str, value: impl Into<String>) {
        let value = value.into();
        let node = self.node_mut(id);
        match node.attrs.iter_mut().find(|a| a.name == name) {
            Some(attr) => attr.value = value,
            None => node.attrs.push(Attribute {
                name: name.into(),
                value,
            }),
        }
    }

    /// Sets the text of a node.
    pub fn set_text(&mut self, id: NodeId, text: impl Into<String>) {
        self.node_mut(id).text = Some(text.into());
    }

    /// The first child with the given tag.
    pub fn child_named(&self, id: NodeId, tag: &str) -> Option<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .find(|c| self.tag(*c) == tag)
    }

    /// Moves attributes, text and children out of a node, leaving it empty.
    pub fn take_content(&mut self, id: NodeId) -> NodeContent {
        let node = self.node_mut(id);
        NodeContent {
            attrs: mem::take(&mut node.attrs),
            text: node.text.take(),
            children: mem::take(&mut node.children),
        }
    }

    /// The location of a node, for diagnostics.
    pub fn location(&self, id: NodeId, source: &str) -> Location {
        Location::new(source, self.node(id).line)
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::Document;

    #[test]
    fn build_and_move() {
        let mut doc = Document::new();
        let root = doc.add_root("Record");
        let a = doc.add_child(root, "a");
        doc.set_attr(a, "class", "Thing");
        doc.set_attr(a, "class", "Other");
        let b = doc.add_child(a, "b");
        doc.set_text(b, "1");

        assert_eq!(doc.attr(a, "class"), Some("Other"));
        assert_eq!(doc.node(a).attrs.len(), 1);

        let content = doc.take_content(a);
        assert_eq!(content.children, [b]);
        assert!(doc.children(a).is_empty());
        assert!(doc.attr(a, "class").is_none());

        let moved = doc.create("Ref");
        doc.node_mut(moved).children = content.children;
        assert_eq!(doc.child_named(moved, "b"), Some(b));
    }
}
