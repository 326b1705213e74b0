//! Toroidal coordinate helpers.
//!
//! The grid side is a power of two, so wrapping is a mask: x=-1 becomes
//! x=511 and x=512 becomes x=0.

use crate::types::{GRID_MASK, GRID_SHIFT, GRID_SIZE};

/// Convert (x, y) to flat array index.
/// y * 512 + x = (y << 9) | x
#[inline(always)]
pub fn to_index(x: usize, y: usize) -> usize {
    ((y & GRID_MASK) << GRID_SHIFT) | (x & GRID_MASK)
}

#[inline(always)]
pub fn to_coord(idx: usize) -> (usize, usize) {
    let x = idx & GRID_MASK; // idx % 512
    let y = (idx >> GRID_SHIFT) & GRID_MASK; // idx / 512
    (x, y)
}

/// Wrap signed player input into the grid. Negative values wrap from the far edge.
#[inline(always)]
pub fn wrap_coord(x: i32, y: i32) -> usize {
    let wx = x.rem_euclid(GRID_SIZE as i32) as usize;
    let wy = y.rem_euclid(GRID_SIZE as i32) as usize;
    to_index(wx, wy)
}

/// Strict lookup without wrapping.
#[inline(always)]
pub fn checked_index(x: i32, y: i32) -> Option<usize> {
    let in_range = |v: i32| v >= 0 && (v as usize) < GRID_SIZE;
    if in_range(x) && in_range(y) {
        Some(to_index(x as usize, y as usize))
    } else {
        None
    }
}

/// The 8 toroidally wrapped neighbors, always in the order
/// NW, N, NE, W, E, SW, S, SE.
#[inline(always)]
pub fn neighbors(idx: usize) -> [usize; 8] {
    let (x, y) = to_coord(idx);

    let xm = x.wrapping_sub(1) & GRID_MASK;
    let xp = (x + 1) & GRID_MASK;
    let ym = y.wrapping_sub(1) & GRID_MASK;
    let yp = (y + 1) & GRID_MASK;

    [
        (ym << GRID_SHIFT) | xm, // NW
        (ym << GRID_SHIFT) | x,  // N
        (ym << GRID_SHIFT) | xp, // NE
        (y << GRID_SHIFT) | xm,  // W
        (y << GRID_SHIFT) | xp,  // E
        (yp << GRID_SHIFT) | xm, // SW
        (yp << GRID_SHIFT) | x,  // S
        (yp << GRID_SHIFT) | xp, // SE
    ]
}
