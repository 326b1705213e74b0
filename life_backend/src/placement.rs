use candid::Principal;

use crate::cell::{add_coins, coins_of, is_alive, pack};
use crate::coords::wrap_coord;
use crate::engine::LifeEngine;
use crate::types::{LifeError, PlaceResult, MAX_COINS};

impl LifeEngine {
    /// Place cells on the grid. Costs 1 coin per placed cell.
    ///
    /// Registration and the balance check run before anything is touched; the
    /// balance must cover every requested coordinate. Coordinates wrap. Cells
    /// that are already alive or already hold `MAX_COINS` are skipped and not
    /// charged.
    pub fn place_cells(
        &mut self,
        caller: Principal,
        cells: &[(i32, i32)],
    ) -> Result<PlaceResult, LifeError> {
        // Seat and balance are checked before anything is claimed, so a
        // rejected newcomer does not occupy a slot.
        self.players.peek_slot(&caller)?;

        let cost = cells.len() as u64;
        let balance = self.players.balance(&caller).unwrap_or(0);
        if balance < cost {
            return Err(LifeError::InsufficientBalance {
                needed: cost,
                available: balance,
            });
        }

        let (player_num, _is_new) = self.players.get_or_create_slot(caller)?;

        let mut placed = 0u32;
        for &(x, y) in cells {
            let idx = wrap_coord(x, y);
            let cell = self.grid.get(idx);

            if is_alive(cell) || coins_of(cell) >= MAX_COINS {
                continue;
            }

            let updated = add_coins(pack(player_num, true, coins_of(cell)), 1);
            self.grid.set(idx, updated);
            self.potential.set_with_neighbors(idx);
            placed += 1;
        }

        let new_balance = self.players.debit(&caller, placed as u64);
        self.players.add_cells(player_num, placed);

        Ok(PlaceResult {
            placed,
            generation: self.generation,
            new_balance,
        })
    }
}
