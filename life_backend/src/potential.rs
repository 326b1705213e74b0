//! Potential set: one bit per cell marking cells that must be evaluated
//! in the coming generation.
//!
//! INVARIANT: before a step begins, every alive cell and all 8 of its
//! neighbors are set. A cell outside the set cannot change this generation.
//! Extra bits are harmless, missing bits are bugs.

use crate::coords::neighbors;
use crate::types::{GRID_WORDS, TOTAL_CELLS};

#[derive(Clone, PartialEq, Eq)]
pub struct PotentialSet {
    words: Vec<u64>,
}

impl Default for PotentialSet {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for PotentialSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PotentialSet")
            .field("set_bits", &self.count())
            .finish()
    }
}

impl PotentialSet {
    pub fn new() -> Self {
        Self {
            words: vec![0u64; GRID_WORDS],
        }
    }

    #[inline(always)]
    pub fn test(&self, idx: usize) -> bool {
        self.words[idx >> 6] & (1u64 << (idx & 63)) != 0
    }

    #[inline(always)]
    pub fn set(&mut self, idx: usize) {
        self.words[idx >> 6] |= 1u64 << (idx & 63);
    }

    /// Add cell AND all 8 neighbors. Every writer that makes a cell alive
    /// or kills one goes through this.
    #[inline(always)]
    pub fn set_with_neighbors(&mut self, idx: usize) {
        self.set(idx);
        for n in neighbors(idx) {
            self.set(n);
        }
    }

    pub fn clear_all(&mut self) {
        self.words.fill(0);
    }

    /// Visit set bits in ascending index order. Cost is one check per word
    /// plus one iteration per set bit.
    #[inline]
    pub fn for_each_set<F: FnMut(usize)>(&self, mut f: F) {
        for (word_idx, &w) in self.words.iter().enumerate() {
            let mut word = w;
            if word == 0 {
                continue;
            }
            while word != 0 {
                let bit_pos = word.trailing_zeros() as usize;
                f((word_idx << 6) | bit_pos);
                word &= word - 1;
            }
        }
    }

    pub fn iter(&self) -> SetBits<'_> {
        SetBits {
            words: &self.words,
            word_idx: 0,
            current: self.words.first().copied().unwrap_or(0),
        }
    }

    /// Popcount, for diagnostics.
    pub fn count(&self) -> u32 {
        self.words.iter().map(|w| w.count_ones()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|&w| w == 0)
    }

    /// Discard everything and mark every alive cell with its neighbors.
    pub fn rebuild_from<F: Fn(usize) -> bool>(&mut self, is_alive_at: F) {
        self.clear_all();
        for idx in 0..TOTAL_CELLS {
            if is_alive_at(idx) {
                self.set_with_neighbors(idx);
            }
        }
    }
}

pub struct SetBits<'a> {
    words: &'a [u64],
    word_idx: usize,
    current: u64,
}

impl Iterator for SetBits<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        while self.current == 0 {
            self.word_idx += 1;
            self.current = *self.words.get(self.word_idx)?;
        }
        let bit_pos = self.current.trailing_zeros() as usize;
        self.current &= self.current - 1;
        Some((self.word_idx << 6) | bit_pos)
    }
}
