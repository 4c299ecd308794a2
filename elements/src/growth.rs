// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Buffer sizing policy for the dense variants.

/// Minimum allocation granule for dense buffers, in elements.
pub const DEFAULT_CHUNK_SIZE: u32 = 32;

/// Highest index a dense variant may address, exclusive. Writes at or beyond
/// this index force the sparse representation.
pub const DEFAULT_DENSE_THRESHOLD: u64 = 1 << 20;

/// Pure sizing function shared by every dense variant.
///
/// Capacities are chunk-aligned and then doubled, so a run of appends
/// reallocates O(log n) times. The policy is fixed at construction and
/// carried by value; there is no process-wide knob.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GrowthPolicy {
    chunk_size: u32,
    dense_threshold: u64,
}

impl Default for GrowthPolicy {
    fn default() -> Self {
        GrowthPolicy {
            chunk_size: DEFAULT_CHUNK_SIZE,
            dense_threshold: DEFAULT_DENSE_THRESHOLD,
        }
    }
}

impl GrowthPolicy {
    /// `chunk_size` must be a power of two no larger than the threshold.
    pub fn new(chunk_size: u32, dense_threshold: u64) -> Self {
        assert!(chunk_size.is_power_of_two());
        assert!(u64::from(chunk_size) <= dense_threshold);
        GrowthPolicy {
            chunk_size,
            dense_threshold,
        }
    }

    #[inline]
    pub fn chunk_size(&self) -> u32 {
        self.chunk_size
    }

    #[inline]
    pub fn dense_threshold(&self) -> u64 {
        self.dense_threshold
    }

    /// True if `index` is addressable by a dense variant under this policy.
    #[inline]
    pub fn fits_dense(&self, index: u64) -> bool {
        index < self.dense_threshold
    }

    /// Capacity of a freshly created dense buffer.
    #[inline]
    pub fn initial_capacity(&self) -> usize {
        self.chunk_size as usize
    }

    /// Next buffer capacity able to hold `required_len` elements.
    ///
    /// Monotonic in `required_len`, always `>= required_len`, and clamped to
    /// the dense threshold (a dense buffer never needs more slots than the
    /// threshold admits indices).
    pub fn next_capacity(&self, required_len: u64) -> usize {
        debug_assert!(required_len <= self.dense_threshold);
        let chunk = u64::from(self.chunk_size);
        let aligned = (required_len + chunk - 1) & !(chunk - 1);
        let doubled = aligned.max(chunk).saturating_mul(2);
        doubled.clamp(required_len, self.dense_threshold.max(required_len)) as usize
    }
}
