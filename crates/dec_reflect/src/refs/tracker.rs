use alloc::format;
use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::any::{Any, TypeId};

use dec_utils::hash::HashMap;

use crate::diagnostics::{Category, Location};
use crate::document::{Attribute, Document, NodeId};
use crate::reflection::Reflect;
use crate::refs::Shared;
use crate::registry::{FromType, TypeTraitShared, dotted_path};
use crate::walker::Env;

/// Tag of a reference record.
pub const REF_TAG: &str = "Ref";

/// Formats a reference id.
#[inline]
pub(crate) fn ref_name(id: u32) -> String {
    format!("ref{id:05}")
}

// -----------------------------------------------------------------------------
// TrackedObject

/// A shared object met during a write.
pub(crate) struct TrackedObject {
    node: NodeId,
    ref_id: Option<u32>,
    type_id: TypeId,
    type_path: &'static str,
    shared: TypeTraitShared,
    // Keeps the address unique for the whole write.
    _keepalive: Rc<dyn Any>,
}

impl TrackedObject {
    pub(crate) fn new<T: Reflect>(object: Shared<T>) -> Self {
        Self {
            node: NodeId::default(),
            ref_id: None,
            type_id: TypeId::of::<T>(),
            type_path: T::type_path(),
            shared: FromType::<T>::from_type(),
            _keepalive: object,
        }
    }
}

/// What a clone needs to recreate one reference without name lookups.
pub(crate) struct StubSeed {
    pub id: String,
    pub shared: TypeTraitShared,
    pub type_path: &'static str,
}

// -----------------------------------------------------------------------------
// IdentityTracker

/// Write-side identity table.
///
/// Every shared object is registered on first sight with the node it was
/// written into. Seeing it again assigns it a reference id. When the walk
/// is over, [`IdentityTracker::finish`] moves referenced objects out into
/// reference records and splits nesting deeper than the depth limit.
#[derive(Default)]
pub struct IdentityTracker {
    handles: HashMap<usize, usize>,
    by_node: HashMap<NodeId, usize>,
    objects: Vec<TrackedObject>,
    // Objects given an id and not yet extracted, in id order.
    unextracted: Vec<(u32, usize)>,
    next_id: u32,
}

impl IdentityTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct shared objects met so far.
    #[inline]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Number of objects which need a reference record.
    pub fn referenced(&self) -> usize {
        self.objects.iter().filter(|o| o.ref_id.is_some()).count()
    }

    /// Registers the object at address `key`, met at `node`.
    ///
    /// Returns `true` if it was already known: `node` then gets a `ref`
    /// attribute instead of content.
    pub(crate) fn register(
        &mut self,
        doc: &mut Document,
        key: usize,
        node: NodeId,
        make: impl FnOnce() -> TrackedObject,
    ) -> bool {
        if let Some(&index) = self.handles.get(&key) {
            let id = self.assign(index);
            doc.set_attr(node, "ref", ref_name(id));
            return true;
        }

        let mut object = make();
        object.node = node;
        let index = self.objects.len();
        self.objects.push(object);
        self.handles.insert(key, index);
        self.by_node.insert(node, index);
        false
    }

    fn assign(&mut self, index: usize) -> u32 {
        if let Some(id) = self.objects[index].ref_id {
            return id;
        }
        let id = self.next_id;
        self.next_id += 1;
        self.objects[index].ref_id = Some(id);
        self.unextracted.push((id, index));
        id
    }

    /// Moves every referenced object into a record under `refs`, then
    /// promotes objects nested deeper than the depth limit, until the
    /// document is stable.
    ///
    /// With `require_names`, unregistered types are reported since the
    /// output could not be read back.
    pub(crate) fn finish(
        &mut self,
        doc: &mut Document,
        refs: NodeId,
        data: NodeId,
        env: Env<'_>,
        require_names: bool,
    ) -> Vec<StubSeed> {
        let mut seeds = Vec::new();
        let mut roots = Vec::new();
        roots.push(data);

        let mut reported = false;
        loop {
            roots.extend(self.extract(doc, refs, env, require_names, &mut seeds));
            if !self.promote(doc, &roots, env, &mut reported) {
                break;
            }
            roots.clear();
        }

        log::debug!(
            "recorded {} shared objects, {} as references",
            self.objects.len(),
            seeds.len()
        );
        seeds
    }

    fn extract(
        &mut self,
        doc: &mut Document,
        refs: NodeId,
        env: Env<'_>,
        require_names: bool,
        seeds: &mut Vec<StubSeed>,
    ) -> Vec<NodeId> {
        let pending = core::mem::take(&mut self.unextracted);

        let mut records = Vec::with_capacity(pending.len());
        for (id, index) in pending {
            let object = &self.objects[index];

            let class = match env.directory.name_of(&object.type_id) {
                Some(name) => String::from(name),
                None => {
                    if require_names {
                        env.reporter.error(
                            Category::Configuration,
                            &Location::new("<output>", None),
                            format!(
                                "`{}` is shared but not registered in the type directory, \
                                 the reference cannot be read back",
                                object.type_path
                            ),
                        );
                    }
                    dotted_path(object.type_path)
                }
            };
            let name = ref_name(id);

            let content = doc.take_content(object.node);
            let record = doc.add_child(refs, REF_TAG);
            {
                let node = doc.node_mut(record);
                node.attrs.push(Attribute {
                    name: String::from("id"),
                    value: name.clone(),
                });
                node.attrs.push(Attribute {
                    name: String::from("class"),
                    value: class,
                });
                node.attrs
                    .extend(content.attrs.into_iter().filter(|a| a.name != "ref"));
                node.text = content.text;
                node.children = content.children;
            }
            doc.set_attr(object.node, "ref", name.clone());

            seeds.push(StubSeed {
                id: name,
                shared: object.shared,
                type_path: object.type_path,
            });
            records.push(record);
        }
        records
    }

    /// Walks `roots` and gives a reference id to every inline object found
    /// at the depth limit. Returns `true` if any was promoted.
    fn promote(&mut self, doc: &Document, roots: &[NodeId], env: Env<'_>, reported: &mut bool) -> bool {
        let limit = env.limits.depth_limit as isize;
        let floor = -(env.limits.max_recursion_depth as isize);

        let mut promoted = false;
        let mut stack: Vec<(NodeId, isize)> = roots.iter().map(|&r| (r, limit)).collect();
        while let Some((node, remaining)) = stack.pop() {
            if let Some(&index) = self.by_node.get(&node) {
                let object = &self.objects[index];
                if object.ref_id.is_none() && remaining <= 0 {
                    self.assign(index);
                    promoted = true;
                    continue;
                }
            }

            if remaining <= floor && !*reported {
                *reported = true;
                env.reporter.error(
                    Category::Structural,
                    &Location::new("<output>", None),
                    format!(
                        "<{}> is nested too deeply without shared objects to split at, \
                         reading it back may exhaust the stack",
                        doc.tag(node)
                    ),
                );
            }

            for &child in doc.children(node) {
                stack.push((child, remaining - 1));
            }
        }
        promoted
    }
}
