//! Object identity in recorded graphs.
//!
//! [`Shared<T>`] is the only type with identity. When a graph is written,
//! the [`IdentityTracker`] notices shared objects seen twice and turns them
//! into reference records, `<Ref id="ref00000" class="...">`, under the
//! document's `refs` node. Every other occurrence becomes `ref="ref00000"`.
//!
//! On read, a [`StubTable`] creates an empty shared object per record
//! before any content is read, so references resolve in any order and
//! cycles close naturally.

// -----------------------------------------------------------------------------
// Modules

mod shared;
mod stubs;
mod tracker;

// -----------------------------------------------------------------------------
// Exports

pub use shared::{Shared, SharedContent, shared};
pub use stubs::{Stub, StubTable};
pub use tracker::{IdentityTracker, REF_TAG};

pub(crate) use stubs::fill_stub;
pub(crate) use tracker::{StubSeed, TrackedObject};
