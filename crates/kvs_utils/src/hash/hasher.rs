//! Provide `FixedHasher`.
//!
//! `FixedHasher` is based on the `foldhash` crate and
//! provides stable hash results through a fixed hash seed.

use core::hash::BuildHasher;

use foldhash::fast::{FixedState, FoldHasher};

/// A fixed hash seed.
const FIXED_HASH_STATE: FixedState = FixedState::with_seed(0x6B76_735F_6B65_7973);

/// A hasher whose results depend only on the input.
///
/// A type alias for [`foldhash::fast::FoldHasher`].
///
/// Which can be created through [`FixedHashState::build_hasher`].
pub type FixedHasher = FoldHasher<'static>;

/// Fixed Hash State based upon a random but fixed seed.
///
/// Two maps built from the same keys hash them identically across runs,
/// which keeps debug output and test failures reproducible.
///
/// # Examples
///
/// ```
/// use core::hash::BuildHasher;
/// use kvs_utils::hash::FixedHashState;
///
/// let first = FixedHashState.hash_one("Name");
/// let second = FixedHashState.hash_one("Name");
///
/// assert_eq!(first, second);
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
// Tests
