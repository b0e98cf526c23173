use alloc::format;
use alloc::rc::Rc;
use alloc::string::String;
use core::any::Any;
use core::cell::RefCell;

use dec_utils::hash::HashMap;

use crate::diagnostics::Category;
use crate::document::NodeId;
use crate::reflection::Reflect;
use crate::refs::Shared;
use crate::registry::FillFn;
use crate::walker::{ReadCx, read_value_with};

/// Attributes of a reference record which belong to the record itself.
pub(crate) const RECORD_ATTRS: &[&str] = &["id", "class"];

// -----------------------------------------------------------------------------
// Stub

/// A pre-created shared object, filled once every stub exists.
#[derive(Clone)]
pub struct Stub {
    pub value: Rc<dyn Any>,
    pub fill: FillFn,
    pub type_path: &'static str,
}

// -----------------------------------------------------------------------------
// StubTable

/// Read-side reference table, from reference id to stub.
#[derive(Default)]
pub struct StubTable {
    stubs: HashMap<String, Stub>,
}

impl StubTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a stub, returns `false` if the id is taken.
    pub fn insert(&mut self, id: impl Into<String>, stub: Stub) -> bool {
        let id = id.into();
        if self.stubs.contains_key(&id) {
            return false;
        }
        self.stubs.insert(id, stub);
        true
    }

    #[inline]
    pub fn get(&self, id: &str) -> Option<&Stub> {
        self.stubs.get(id)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.stubs.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.stubs.is_empty()
    }
}

// -----------------------------------------------------------------------------
// Fill

/// Reads a reference record into its stub.
///
/// Returns the object the slot holds afterwards, the caller checks it is
/// still the stub.
pub(crate) fn fill_stub<T: Reflect>(
    stub: Rc<dyn Any>,
    cx: &mut ReadCx<'_>,
    node: NodeId,
) -> Option<Rc<dyn Any>> {
    let Ok(typed) = stub.downcast::<RefCell<T>>() else {
        cx.error(
            Category::Integrity,
            node,
            format!("reference stub is not a `{}`", T::type_path()),
        );
        return None;
    };
    let mut slot: Shared<T> = typed;
    read_value_with(cx, node, &mut slot, RECORD_ATTRS);
    Some(slot)
}
