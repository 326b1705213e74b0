//! Main grid: 1 byte per cell = 256 KB. The canonical world state;
//! every other structure is derived from it.

use crate::cell::{coins_of, is_alive, owner_of};
use crate::types::TOTAL_CELLS;

#[derive(Clone, PartialEq, Eq)]
pub struct Grid {
    cells: Vec<u8>,
}

impl Default for Grid {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Grid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Grid")
            .field("alive", &self.alive_count())
            .finish()
    }
}

impl Grid {
    pub fn new() -> Self {
        Self {
            cells: vec![0u8; TOTAL_CELLS],
        }
    }

    /// Returns None unless `bytes` is exactly one full grid.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() != TOTAL_CELLS {
            return None;
        }
        Some(Self {
            cells: bytes.to_vec(),
        })
    }

    #[inline(always)]
    pub fn get(&self, idx: usize) -> u8 {
        self.cells[idx]
    }

    #[inline(always)]
    pub fn set(&mut self, idx: usize, cell: u8) {
        self.cells[idx] = cell;
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.cells
    }

    pub fn clear(&mut self) {
        self.cells.fill(0);
    }

    /// Non-empty cells with their index: alive, claimed, or coin-bearing.
    pub fn occupied(&self) -> impl Iterator<Item = (usize, u8)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, &c)| c != 0)
            .map(|(i, &c)| (i, c))
    }

    pub fn alive_count(&self) -> u32 {
        self.cells.iter().filter(|&&c| is_alive(c)).count() as u32
    }

    /// Total coins sitting on the grid.
    pub fn total_coins(&self) -> u64 {
        self.cells.iter().map(|&c| coins_of(c) as u64).sum()
    }

    pub fn alive_by_owner<const N: usize>(&self) -> [u32; N] {
        let mut counts = [0u32; N];
        for &c in &self.cells {
            let owner = owner_of(c) as usize;
            if is_alive(c) && owner < N {
                counts[owner] += 1;
            }
        }
        counts
    }
}
