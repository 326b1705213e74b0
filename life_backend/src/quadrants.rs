//! Quadrant wipe and per-quadrant territory statistics.
//!
//! The 512x512 world is split into a 4x4 board of 128x128 quadrants. Every
//! `WIPE_INTERVAL_NS` one quadrant has all its living cells killed, cycling
//! 0..16, which keeps long-lived static patterns from filling the world.

use crate::cell::{coins_of, is_alive, owner_of, with_alive};
use crate::coords::{neighbors, to_coord, to_index};
use crate::engine::LifeEngine;
use crate::types::{
    NextWipe, QuadrantInfo, MAX_PLAYERS, QUADRANTS_PER_SIDE, QUADRANT_SIZE, TOTAL_QUADRANTS,
    WIPE_INTERVAL_NS,
};

/// Get quadrant index (0-15) from cell index.
#[inline(always)]
pub fn quadrant_of(idx: usize) -> usize {
    let (x, y) = to_coord(idx);
    let qx = x / QUADRANT_SIZE;
    let qy = y / QUADRANT_SIZE;
    qy * QUADRANTS_PER_SIDE + qx
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WipeReport {
    pub quadrant: usize,
    pub killed: u32,
}

impl LifeEngine {
    /// Kill every alive cell in a quadrant, preserving owner and coins.
    pub fn wipe_quadrant(&mut self, quadrant: usize) -> WipeReport {
        let quadrant = quadrant % TOTAL_QUADRANTS;
        let qx_start = (quadrant % QUADRANTS_PER_SIDE) * QUADRANT_SIZE;
        let qy_start = (quadrant / QUADRANTS_PER_SIDE) * QUADRANT_SIZE;

        let mut killed = 0u32;
        let mut deaths = [0i32; MAX_PLAYERS + 1];

        for y in qy_start..(qy_start + QUADRANT_SIZE) {
            for x in qx_start..(qx_start + QUADRANT_SIZE) {
                let idx = to_index(x, y);
                let cell = self.grid.get(idx);
                if !is_alive(cell) {
                    continue;
                }

                self.grid.set(idx, with_alive(cell, false));

                // Same bookkeeping as a death in the stepper: alive cells just
                // outside the quadrant keep their marks and border cells may
                // now be born.
                for n_idx in neighbors(idx) {
                    self.potential.set_with_neighbors(n_idx);
                }

                let owner = owner_of(cell) as usize;
                if owner <= MAX_PLAYERS {
                    deaths[owner] -= 1;
                }
                killed += 1;
            }
        }

        self.players.apply_count_deltas(&deaths);
        WipeReport { quadrant, killed }
    }

    /// Wipe the next quadrant once the interval has elapsed. The first call
    /// only starts the clock.
    pub fn run_wipe_if_needed(&mut self, now_ns: u64) -> Option<WipeReport> {
        if self.last_wipe_ns == 0 {
            self.last_wipe_ns = now_ns;
            return None;
        }
        if now_ns.saturating_sub(self.last_wipe_ns) < WIPE_INTERVAL_NS {
            return None;
        }

        self.last_wipe_ns = now_ns;
        let quadrant = self.next_wipe_quadrant;
        self.next_wipe_quadrant = (quadrant + 1) % TOTAL_QUADRANTS;
        Some(self.wipe_quadrant(quadrant))
    }

    pub fn next_wipe(&self, now_ns: u64) -> NextWipe {
        let elapsed = now_ns.saturating_sub(self.last_wipe_ns);
        let remaining_ns = WIPE_INTERVAL_NS.saturating_sub(elapsed);
        NextWipe {
            quadrant: self.next_wipe_quadrant as u8,
            seconds_remaining: remaining_ns / 1_000_000_000,
        }
    }

    /// Territory and coins per player for all 16 quadrants (full grid scan).
    pub fn quadrant_info(&self) -> Vec<QuadrantInfo> {
        let mut territory = [[0u32; MAX_PLAYERS + 1]; TOTAL_QUADRANTS];
        let mut coins = [[0u32; MAX_PLAYERS + 1]; TOTAL_QUADRANTS];

        for (idx, cell) in self.grid.occupied() {
            let owner = owner_of(cell) as usize;
            if owner == 0 || owner > MAX_PLAYERS {
                continue;
            }
            let q = quadrant_of(idx);
            territory[q][owner] += 1;
            coins[q][owner] += coins_of(cell) as u32;
        }

        (0..TOTAL_QUADRANTS)
            .map(|q| {
                let territory_by_player: Vec<u32> = territory[q][1..].to_vec();
                let coins_by_player: Vec<u32> = coins[q][1..].to_vec();
                QuadrantInfo {
                    quadrant: q as u8,
                    total_territory: territory_by_player.iter().sum(),
                    total_coins: coins_by_player.iter().sum(),
                    territory_by_player,
                    coins_by_player,
                }
            })
            .collect()
    }
}
