//! Provide `FixedHasher` and `NoOpHasher`.
//!
//! `FixedHasher` is based on the `foldhash` crate and uses a fixed seed,
//! so the hash only depends on the input.
//!
//! `NoOpHasher` passes a single `u64` straight through. It is meant for
//! keys which already are good hashes, such as [`TypeId`](core::any::TypeId).

use core::hash::{BuildHasher, Hasher};

use foldhash::fast::{FixedState, FoldHasher};

// -----------------------------------------------------------------------------
// FixedHasher

const FIXED_HASH_STATE: FixedState = FixedState::with_seed(0x6465_635F_7265_636F);

/// A hasher whose results only depend on the input.
///
/// A type alias for [`foldhash::fast::FoldHasher`].
pub type FixedHasher = FoldHasher<'static>;

/// Hash state with a fixed seed, based on `foldhash`.
///
/// # Examples
///
/// ```
/// use core::hash::{BuildHasher, Hash, Hasher};
/// use dec_utils::hash::FixedHashState;
///
/// let a = FixedHashState.hash_one("defName");
/// let b = FixedHashState.hash_one("defName");
/// assert_eq!(a, b);
/// ```
#[derive(Copy, Clone, Default, Debug)]
pub struct FixedHashState;

impl BuildHasher for FixedHashState {
    type Hasher = FixedHasher;

    #[inline(always)]
    fn build_hasher(&self) -> Self::Hasher {
        FIXED_HASH_STATE.build_hasher()
    }
}

// -----------------------------------------------------------------------------
// NoOpHasher

/// A hasher which keeps the last written `u64` as the hash.
///
/// Other writes fold the bytes in reverse order, so `write_u64(10)` and
/// `write_u32(10)` agree when called once.
#[derive(Copy, Clone, Default, Debug)]
pub struct NoOpHasher {
    hash: u64,
}

impl Hasher for NoOpHasher {
    #[inline]
    fn finish(&self) -> u64 {
        self.hash
    }

    fn write(&mut self, bytes: &[u8]) {
        for byte in bytes.iter().rev() {
            self.hash = self.hash.rotate_left(8).wrapping_add(*byte as u64);
        }
    }

    #[inline]
    fn write_u64(&mut self, i: u64) {
        self.hash = i;
    }
}

/// Builds [`NoOpHasher`]s.
///
/// # Examples
///
/// ```
/// use core::hash::{BuildHasher, Hash, Hasher};
/// use dec_utils::hash::NoOpHashState;
///
/// let mut hasher = NoOpHashState.build_hasher();
/// 3_u64.hash(&mut hasher);
/// assert_eq!(hasher.finish(), 3_u64);
/// ```
#[derive(Copy, Clone, Default, Debug)]
pub struct NoOpHashState;

impl BuildHasher for NoOpHashState {
    type Hasher = NoOpHasher;

    #[inline(always)]
    fn build_hasher(&self) -> Self::Hasher {
        NoOpHasher { hash: 0 }
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use core::hash::{BuildHasher, Hasher};

    use super::{FixedHashState, NoOpHashState};

    #[test]
    fn fixed_state_is_stable() {
        assert_eq!(FixedHashState.hash_one(42_u32), FixedHashState.hash_one(42_u32));
        assert_ne!(FixedHashState.hash_one(1_u32), FixedHashState.hash_one(2_u32));
    }

    #[test]
    fn no_op_widths_agree() {
        let mut a = NoOpHashState.build_hasher();
        a.write_u64(10);
        let mut b = NoOpHashState.build_hasher();
        b.write_u32(10);
        assert_eq!(a.finish(), b.finish());
    }
}
