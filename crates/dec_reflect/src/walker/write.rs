use alloc::format;
use alloc::rc::Rc;
use alloc::string::String;
use core::any::TypeId;

#[cfg(feature = "debug")]
use alloc::vec::Vec;

use dec_utils::WorkList;
use dec_utils::hash::HashSet;

use crate::diagnostics::{Category, Location};
use crate::document::{Document, NodeId};
use crate::reflection::Reflect;
use crate::refs::{IdentityTracker, SharedContent, TrackedObject};
use crate::walker::Env;

/// Source name used in write-side diagnostics.
const OUTPUT: &str = "<output>";

// -----------------------------------------------------------------------------
// WriteTask

/// Work postponed to keep the write-side recursion bounded.
pub enum WriteTask {
    /// Write the content of a shared object into an already created node.
    ComposeShared {
        node: NodeId,
        object: Rc<dyn SharedContent>,
    },
}

// -----------------------------------------------------------------------------
// WriteCx

/// State of one write: the output document, the environment and, for
/// recorded graphs, the identity tracker.
pub struct WriteCx<'a> {
    env: Env<'a>,
    doc: Document,
    tracker: Option<IdentityTracker>,
    inline: HashSet<usize>,
    tasks: WorkList<WriteTask>,
    depth: usize,
    record_depth: u32,
    #[cfg(feature = "debug")]
    path: Vec<&'static str>,
}

impl<'a> WriteCx<'a> {
    /// Creates a context for definition documents.
    ///
    /// Shared objects are written inline and cycles are reported.
    pub fn new(env: Env<'a>) -> Self {
        Self {
            env,
            doc: Document::new(),
            tracker: None,
            inline: HashSet::default(),
            tasks: WorkList::new(),
            depth: 0,
            record_depth: 0,
            #[cfg(feature = "debug")]
            path: Vec::new(),
        }
    }

    /// Creates a context for recorded graphs, with identity tracking.
    pub(crate) fn recording(env: Env<'a>) -> Self {
        let mut cx = Self::new(env);
        cx.tracker = Some(IdentityTracker::new());
        cx
    }

    #[inline]
    pub fn env(&self) -> Env<'a> {
        self.env
    }

    #[inline]
    pub fn doc(&self) -> &Document {
        &self.doc
    }

    #[inline]
    pub fn doc_mut(&mut self) -> &mut Document {
        &mut self.doc
    }

    /// Returns `true` when writing a recorded graph.
    #[inline]
    pub fn in_record_mode(&self) -> bool {
        self.tracker.is_some()
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

    /// Reports an error at `node` of the output.
    pub fn error(&self, category: Category, node: NodeId, message: impl Into<String>) {
        let message = format!("<{}>: {}", self.doc.tag(node), self.decorate(message.into()));
        self.env
            .reporter
            .error(category, &Location::new(OUTPUT, None), message);
    }

    /// Reports a warning at `node` of the output.
    pub fn warn(&self, category: Category, node: NodeId, message: impl Into<String>) {
        let message = format!("<{}>: {}", self.doc.tag(node), self.decorate(message.into()));
        self.env
            .reporter
            .warn(category, &Location::new(OUTPUT, None), message);
    }

    #[cfg(feature = "debug")]
    fn decorate(&self, message: String) -> String {
        if cfg!(debug_assertions) && !self.path.is_empty() {
            format!("{message} (while writing {})", self.path.join(" > "))
        } else {
            message
        }
    }

    #[cfg(not(feature = "debug"))]
    #[inline(always)]
    fn decorate(&self, message: String) -> String {
        message
    }

    /// Registers a shared object seen at `node`.
    ///
    /// Returns `true` if the object was already seen, in which case `node`
    /// now holds a reference and the caller must not write the content.
    pub(crate) fn track_shared(
        &mut self,
        key: usize,
        node: NodeId,
        make: impl FnOnce() -> TrackedObject,
    ) -> bool {
        match self.tracker.as_mut() {
            Some(tracker) => tracker.register(&mut self.doc, key, node, make),
            None => false,
        }
    }

    /// Marks a shared object as being written inline.
    ///
    /// Returns `false` if it is already on the stack, which is a cycle.
    #[inline]
    pub(crate) fn enter_inline(&mut self, key: usize) -> bool {
        self.inline.insert(key)
    }

    #[inline]
    pub(crate) fn leave_inline(&mut self, key: usize) {
        self.inline.remove(&key);
    }

    /// Returns `true` once the recursion depth calls for deferral.
    #[inline]
    pub(crate) fn should_defer(&self) -> bool {
        self.depth > self.env.limits.max_recursion_depth
    }

    #[inline]
    pub(crate) fn defer(&mut self, task: WriteTask) {
        self.tasks.push(task);
    }

    /// Runs deferred tasks until none are left.
    ///
    /// Each task starts over at depth zero.
    pub fn drain(&mut self) {
        while let Some(task) = self.tasks.pop() {
            let depth = core::mem::replace(&mut self.depth, 0);
            match task {
                WriteTask::ComposeShared { node, object } => object.compose_content(self, node),
            }
            self.depth = depth;
        }
    }

    /// Returns the finished document.
    pub fn into_document(mut self) -> Document {
        self.drain();
        self.doc
    }

    pub(crate) fn into_parts(mut self) -> (Document, Option<IdentityTracker>) {
        self.drain();
        (self.doc, self.tracker)
    }
}

// -----------------------------------------------------------------------------
// Entry points

/// Writes `value` into `node`.
pub fn write_value<T: Reflect>(cx: &mut WriteCx<'_>, value: &mut T, node: NodeId) {
    cx.depth += 1;
    #[cfg(feature = "debug")]
    cx.path.push(T::type_path());

    dispatch_compose(cx, value, node);

    #[cfg(feature = "debug")]
    cx.path.pop();
    cx.depth -= 1;
}

/// Writes the content of `value` into `node`.
///
/// Converters take priority for converter-eligible kinds.
pub fn dispatch_compose<T: Reflect>(cx: &mut WriteCx<'_>, value: &mut T, node: NodeId) {
    if T::KIND.converter_eligible() {
        let converters = cx.env().converters;
        if let Some(converter) = converters.get(&TypeId::of::<T>()) {
            converter.compose(value, cx, node);
            return;
        }
    }
    value.compose(cx, node);
}
