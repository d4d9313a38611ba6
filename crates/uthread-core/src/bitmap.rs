//! Fixed-size bitmap over thread ids
//!
//! One bit per possible thread id. Used for the blocked set and for id
//! allocation. Storage is sized once at construction so no operation
//! allocates; every mutation happens with preemption masked, so plain
//! words are enough (no atomics).

use crate::id::ThreadId;

/// Number of bits per block
const BITS_PER_BLOCK: usize = 64;

/// Bitmap with one bit per thread id in `0..capacity`
#[derive(Debug, Clone)]
pub struct ThreadBitmap {
    /// Bitmap blocks (each u64 holds 64 thread bits)
    blocks: Box<[u64]>,

    /// Number of addressable ids
    capacity: usize,
}

impl ThreadBitmap {
    /// Create an empty bitmap for ids `0..capacity`
    pub fn new(capacity: usize) -> Self {
        let num_blocks = (capacity + BITS_PER_BLOCK - 1) / BITS_PER_BLOCK;
        Self {
            blocks: vec![0u64; num_blocks].into_boxed_slice(),
            capacity,
        }
    }

    /// Number of addressable ids
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    fn locate(&self, id: ThreadId) -> Option<(usize, u64)> {
        let idx = id.as_usize();
        if idx >= self.capacity {
            return None;
        }
        Some((idx / BITS_PER_BLOCK, 1u64 << (idx % BITS_PER_BLOCK)))
    }

    /// Set the bit for `id`. Returns false if it was already set.
    #[inline]
    pub fn set(&mut self, id: ThreadId) -> bool {
        match self.locate(id) {
            Some((block, mask)) => {
                let was_set = self.blocks[block] & mask != 0;
                self.blocks[block] |= mask;
                !was_set
            }
            None => false,
        }
    }

    /// Clear the bit for `id`. Returns false if it was not set.
    #[inline]
    pub fn clear(&mut self, id: ThreadId) -> bool {
        match self.locate(id) {
            Some((block, mask)) => {
                let was_set = self.blocks[block] & mask != 0;
                self.blocks[block] &= !mask;
                was_set
            }
            None => false,
        }
    }

    /// Check the bit for `id`
    #[inline]
    pub fn is_set(&self, id: ThreadId) -> bool {
        match self.locate(id) {
            Some((block, mask)) => self.blocks[block] & mask != 0,
            None => false,
        }
    }

    /// Find the lowest clear id
    pub fn first_clear(&self) -> Option<ThreadId> {
        for (block_idx, &block) in self.blocks.iter().enumerate() {
            if block == u64::MAX {
                continue;
            }
            let idx = block_idx * BITS_PER_BLOCK + (!block).trailing_zeros() as usize;
            if idx < self.capacity {
                return Some(ThreadId::new(idx as u32));
            }
            return None;
        }
        None
    }

    /// Iterate over set ids in ascending order
    pub fn iter(&self) -> impl Iterator<Item = ThreadId> + '_ {
        self.blocks.iter().enumerate().flat_map(|(block_idx, &block)| {
            let mut bits = block;
            core::iter::from_fn(move || {
                if bits == 0 {
                    return None;
                }
                let bit = bits.trailing_zeros() as usize;
                bits &= bits - 1;
                Some(ThreadId::new((block_idx * BITS_PER_BLOCK + bit) as u32))
            })
        })
    }
}
