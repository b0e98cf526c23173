//! Small utilities shared by the `dec` crates.
//!
//! - [`hash`]: hash containers with fixed seeds, re-exports *hashbrown* and *foldhash*.
//! - [`TypeIdMap`]: a map keyed by [`TypeId`](core::any::TypeId).
//! - [`WorkList`]: a LIFO list of tagged tasks, drained by a flat loop.
#![cfg_attr(docsrs, feature(doc_cfg))]
#![no_std]

// -----------------------------------------------------------------------------
// No STD Support

extern crate alloc;

// -----------------------------------------------------------------------------
// Modules

mod typeid_map;
mod work_list;

pub mod hash;

// -----------------------------------------------------------------------------
// Top-level exports

pub use typeid_map::TypeIdMap;
pub use work_list::WorkList;
