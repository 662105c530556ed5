//! # Free-Idx-Stack — Slot Bookkeeping
//!
//! Tracks which slots of a fixed-size pool are occupied and which are free.
//!
//! Two structures are kept in lockstep:
//! - an occupancy bitmap, one bit per slot (`1` → occupied, `0` → free),
//! - a LIFO stack of free slot indices.
//!
//! The stack is seeded in descending order so the first pops hand out
//! `0, 1, 2, ...`; after that the most recently released slot is reused first.
//!
//! # Example
//! ```text
//! n_slots = 3
//!
//! stack  = [2, 1, 0]   top → 0
//! pop    → 0, 1, 2
//! push 1 → stack = [1]  top → 1
//! ```

/// Occupancy bitmap plus free-index stack for `n_slots` slots.
#[derive(Debug)]
pub struct FreeIdxStack {
    /// Occupied (1) or free (0) per slot, 64 slots per word.
    bitmap: Box<[u64]>,
    /// Free slot indices. Only `stack[..len]` is meaningful.
    stack: Box<[u32]>,
    /// Number of free indices currently on the stack.
    len: u32,
}

impl FreeIdxStack {
    /// Number of bits to right-shift for dividing by 64 (`2^6`).
    pub const DIV_BY: u32 = 6;

    /// Number of bits per bitmap entry.
    pub const MAP_WIDTH: u32 = 64;

    /// Mask representing the lower 6 bits (`0..63`) used for bit indexing.
    const MASK_64: u32 = 0b111111;

    /// Sentinel value used to indicate no valid free index.
    pub const NULL_IDX: u32 = u32::MAX;

    /// Creates bookkeeping for `n_slots` slots, all free.
    ///
    /// # Panics
    /// - If `n_slots == 0`
    /// - If `n_slots == NULL_IDX`
    pub fn new(n_slots: u32) -> Self {
        assert!(n_slots > 0, "Number of slots must be greater than zero");
        assert!(n_slots != Self::NULL_IDX, "Exceeded maximum slot count");

        let words = n_slots.div_ceil(Self::MAP_WIDTH) as usize;
        let bitmap = vec![0u64; words].into_boxed_slice();

        // Descending so that index 0 sits on top.
        let stack = (0..n_slots).rev().collect::<Box<_>>();

        Self {
            bitmap,
            stack,
            len: n_slots,
        }
    }

    /// Total number of slots managed.
    pub fn n_slots(&self) -> u32 {
        self.stack.len() as u32
    }

    /// Number of free slots.
    pub const fn free_len(&self) -> u32 {
        self.len
    }

    /// Number of occupied slots.
    pub fn occupied_len(&self) -> u32 {
        self.n_slots() - self.len
    }

    /// The index the next [`pop_free`](Self::pop_free) will return, if any.
    pub fn peek_free(&self) -> Option<u32> {
        self.len.checked_sub(1).map(|top| self.stack[top as usize])
    }

    /// Pops a free index and marks it occupied.
    ///
    /// Returns [`Self::NULL_IDX`] when every slot is occupied.
    pub fn pop_free(&mut self) -> u32 {
        if self.len == 0 {
            return Self::NULL_IDX;
        }
        self.len -= 1;
        let idx = self.stack[self.len as usize];
        let (word, mask) = Self::locate(idx);
        self.bitmap[word] |= mask;
        idx
    }

    /// Marks `idx` free and pushes it on top of the stack.
    ///
    /// Returns `false` without touching anything if `idx` is already free, so a
    /// repeated release cannot push the same index twice.
    ///
    /// # Panics
    /// If `idx >= n_slots`. Callers range-check first.
    pub fn retire(&mut self, idx: u32) -> bool {
        assert!(idx < self.n_slots(), "slot index {idx} out of range");
        let (word, mask) = Self::locate(idx);
        if self.bitmap[word] & mask == 0 {
            return false;
        }
        self.bitmap[word] &= !mask;
        // Can't overflow: an occupied slot means at least one stack cell is unused.
        self.stack[self.len as usize] = idx;
        self.len += 1;
        true
    }

    /// Checks whether slot `idx` is occupied. Out-of-range indices are never occupied.
    pub fn is_occupied(&self, idx: u32) -> bool {
        if idx >= self.n_slots() {
            return false;
        }
        let (word, mask) = Self::locate(idx);
        self.bitmap[word] & mask == mask
    }

    /// Iterates occupied slot indices in ascending order.
    pub fn occupied(&self) -> impl Iterator<Item = u32> + '_ {
        (0..self.n_slots()).filter(|&idx| self.is_occupied(idx))
    }

    /// Free indices from the bottom of the stack to the top.
    pub fn free_indices(&self) -> &[u32] {
        &self.stack[..self.len as usize]
    }

    const fn locate(idx: u32) -> (usize, u64) {
        let word = (idx >> Self::DIV_BY) as usize;
        let mask = 1u64 << (idx & Self::MASK_64);
        (word, mask)
    }
}
