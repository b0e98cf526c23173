use alloc::string::String;

use dec_reflect::{Reflect, record};

use crate::engine::Engine;
use crate::loader::compose_defs;

impl Engine {
    /// Writes a persisted graph. Definition references are written by name.
    #[inline]
    pub fn write<T: Reflect>(&self, value: &mut T) -> String {
        record::write(self.env(), value, self.config.pretty)
    }

    /// Reads a persisted graph written by [`write`](Self::write).
    ///
    /// Returns `None` if the text is not a readable graph at all.
    #[inline]
    pub fn read<T: Reflect>(&self, input: &str, source: &str) -> Option<T> {
        record::read(self.env(), input, source)
    }

    /// Copies a graph, sharing and cycles included. Definition references
    /// keep pointing at the same definitions.
    #[inline]
    pub fn deep_clone<T: Reflect>(&self, value: &mut T) -> T {
        record::deep_clone(self.env(), value)
    }

    /// Writes every loaded definition into a `Defs` document.
    pub fn compose_defs(&self) -> String {
        compose_defs(self.env(), &self.database).to_xml(self.config.pretty)
    }
}

// -----------------------------------------------------------------------------
// Tests
