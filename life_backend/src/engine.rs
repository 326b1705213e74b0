//! Sparse generation stepper.
//!
//! Instead of visiting all 262,144 cells every generation, only cells in the
//! potential set are evaluated (~20,000 typical). Every path that changes a
//! cell's alive bit must re-mark that neighborhood for the next step.

use arrayvec::ArrayVec;
use candid::Principal;

use crate::cell::{coins_of, is_alive, owner_of, pack, with_alive};
use crate::coords::{checked_index, neighbors, to_coord};
use crate::grid::Grid;
use crate::players::PlayerRegistry;
use crate::potential::PotentialSet;
use crate::types::{GameState, LifeError, SlotInfo, SparseCell, MAX_PLAYERS, TOTAL_CELLS};

/// Per-owner alive neighbor tally; index 0 (unclaimed) is never a candidate.
pub type OwnerCounts = [u8; MAX_PLAYERS + 1];

/// Find majority owner among neighbors, with tie-breaking by cell position.
///
/// Ties go to `tied[cell_idx % tied.len()]` with `tied` in ascending id order,
/// so the same contested shape favors different players at different places.
/// No owned neighbors defaults to player 1.
pub fn find_majority_owner(counts: &OwnerCounts, cell_idx: usize) -> u8 {
    let max_count = counts[1..].iter().max().copied().unwrap_or(0);
    if max_count == 0 {
        return 1;
    }

    let tied: ArrayVec<u8, MAX_PLAYERS> = (1..=MAX_PLAYERS)
        .filter(|&p| counts[p] == max_count)
        .map(|p| p as u8)
        .collect();

    if tied.len() == 1 {
        return tied[0];
    }
    tied[cell_idx % tied.len()]
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CellChange {
    /// Stays alive: no grid write, neighborhood stays in the potential set
    Survives,
    /// Dead cell with exactly 3 alive neighbors comes alive
    Birth { new_owner: u8 },
    /// Alive cell with the wrong count dies, keeping owner and coins
    Death,
    /// Nothing to do
    StaysDead,
}

/// Compute what should happen to a cell WITHOUT modifying the grid.
pub fn compute_cell_fate(grid: &Grid, idx: usize) -> CellChange {
    let currently_alive = is_alive(grid.get(idx));

    let mut alive_count = 0u8;
    let mut owner_counts: OwnerCounts = [0u8; MAX_PLAYERS + 1];

    for n_idx in neighbors(idx) {
        let n = grid.get(n_idx);
        if is_alive(n) {
            alive_count += 1;
            let owner = owner_of(n) as usize;
            if owner > 0 && owner < owner_counts.len() {
                owner_counts[owner] += 1;
            }
        }
    }

    match (currently_alive, alive_count) {
        (true, 2) | (true, 3) => CellChange::Survives,
        (false, 3) => CellChange::Birth {
            new_owner: find_majority_owner(&owner_counts, idx),
        },
        (true, _) => CellChange::Death,
        (false, _) => CellChange::StaysDead,
    }
}

/// What one generation did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StepReport {
    pub evaluated: u32,
    pub births: u32,
    pub deaths: u32,
    pub captures: u32,
    pub coins_captured: u64,
}

/// The whole simulated world. All mutation goes through `&mut self`.
#[derive(Clone, Debug)]
pub struct LifeEngine {
    pub(crate) grid: Grid,
    pub(crate) potential: PotentialSet,
    pub(crate) next_potential: PotentialSet,
    pub(crate) players: PlayerRegistry,
    pub(crate) generation: u64,
    pub(crate) is_running: bool,
    pub(crate) next_wipe_quadrant: usize,
    pub(crate) last_wipe_ns: u64,
}

impl Default for LifeEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl LifeEngine {
    pub fn new() -> Self {
        Self {
            grid: Grid::new(),
            potential: PotentialSet::new(),
            next_potential: PotentialSet::new(),
            players: PlayerRegistry::new(),
            generation: 0,
            is_running: true,
            next_wipe_quadrant: 0,
            last_wipe_ns: 0,
        }
    }

    // ------------------------------------------------------------------
    // Stepping
    // ------------------------------------------------------------------

    /// Advance one generation.
    ///
    /// Two passes: fates are computed against the unmodified grid first, then
    /// applied, so every cell sees the state at the start of the generation.
    pub fn step_generation(&mut self) -> StepReport {
        let mut report = StepReport::default();
        let mut changes: Vec<(usize, CellChange)> = Vec::new();

        // PASS 1: compute fates (grid is read-only)
        let grid = &self.grid;
        self.potential.for_each_set(|idx| {
            report.evaluated += 1;
            let change = compute_cell_fate(grid, idx);
            if change != CellChange::StaysDead {
                changes.push((idx, change));
            }
        });

        // PASS 2: apply
        let mut count_deltas = [0i32; MAX_PLAYERS + 1];
        self.next_potential.clear_all();
        for (idx, change) in changes {
            self.apply_cell_change(idx, change, &mut count_deltas, &mut report);
        }
        self.players.apply_count_deltas(&count_deltas);

        std::mem::swap(&mut self.potential, &mut self.next_potential);
        self.generation += 1;
        report
    }

    fn apply_cell_change(
        &mut self,
        idx: usize,
        change: CellChange,
        count_deltas: &mut [i32; MAX_PLAYERS + 1],
        report: &mut StepReport,
    ) {
        let cell = self.grid.get(idx);

        match change {
            CellChange::Survives => {
                self.next_potential.set_with_neighbors(idx);
            }

            CellChange::Birth { new_owner } => {
                let old_owner = owner_of(cell);
                let old_coins = coins_of(cell);

                // Capture: another player's coins go to whoever overtakes the cell
                if old_owner != 0 && old_owner != new_owner && old_coins > 0 {
                    if let Some(principal) = self.players.principal_at(new_owner) {
                        self.players.credit(principal, old_coins as u64);
                    }
                    report.captures += 1;
                    report.coins_captured += old_coins as u64;
                }

                // A newborn always starts empty
                self.grid.set(idx, pack(new_owner, true, 0));
                self.next_potential.set_with_neighbors(idx);

                count_deltas[(new_owner as usize).min(MAX_PLAYERS)] += 1;
                report.births += 1;
            }

            CellChange::Death => {
                self.grid.set(idx, with_alive(cell, false));

                // Every neighbor lost a live neighbor; their counts changed
                for n_idx in neighbors(idx) {
                    self.next_potential.set_with_neighbors(n_idx);
                }

                let owner = owner_of(cell) as usize;
                if owner <= MAX_PLAYERS {
                    count_deltas[owner] -= 1;
                }
                report.deaths += 1;
            }

            CellChange::StaysDead => {}
        }
    }

    /// Discard the potential set and rebuild it from alive cells.
    pub fn rebuild_potential_from_grid(&mut self) {
        let grid = &self.grid;
        self.potential.rebuild_from(|idx| is_alive(grid.get(idx)));
        self.next_potential.clear_all();
    }

    /// Check the potential-set invariant. Returns the first index that
    /// should be marked but is not.
    pub fn audit_potential(&self) -> Result<(), usize> {
        for idx in 0..TOTAL_CELLS {
            if !is_alive(self.grid.get(idx)) {
                continue;
            }
            if !self.potential.test(idx) {
                return Err(idx);
            }
            if let Some(n) = neighbors(idx).into_iter().find(|&n| !self.potential.test(n)) {
                return Err(n);
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    pub fn pause(&mut self) {
        self.is_running = false;
    }

    pub fn resume(&mut self) {
        self.is_running = true;
    }

    /// Wipe the world. Wallets persist because they belong to principals,
    /// not to the game.
    pub fn reset(&mut self) {
        self.grid.clear();
        self.potential.clear_all();
        self.next_potential.clear_all();
        self.generation = 0;
        self.players.clear_slots();
        self.is_running = true;
        self.next_wipe_quadrant = 0;
        self.last_wipe_ns = 0;
    }

    // ------------------------------------------------------------------
    // Players
    // ------------------------------------------------------------------

    pub fn join_game(&mut self, caller: Principal) -> Result<u8, LifeError> {
        self.players.get_or_create_slot(caller).map(|(slot, _)| slot)
    }

    pub fn join_slot(&mut self, caller: Principal, slot: u8, now_ns: u64) -> Result<u8, LifeError> {
        self.players.join_slot(caller, slot, now_ns)
    }

    pub fn faucet(&mut self, caller: Principal) -> u64 {
        self.players.faucet(caller)
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_running(&self) -> bool {
        self.is_running
    }

    pub fn alive_count(&self) -> u32 {
        self.grid.alive_count()
    }

    pub fn potential_count(&self) -> u32 {
        self.potential.count()
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn potential(&self) -> &PotentialSet {
        &self.potential
    }

    pub fn players(&self) -> &PlayerRegistry {
        &self.players
    }

    pub fn balance_of(&self, caller: &Principal) -> Result<u64, LifeError> {
        self.players.balance(caller).ok_or(LifeError::NotAPlayer)
    }

    /// Strict single-cell lookup; out-of-range input is rejected, not wrapped.
    pub fn cell_at(&self, x: i32, y: i32) -> Result<SparseCell, LifeError> {
        let idx = checked_index(x, y).ok_or(LifeError::InvalidCoordinate { x, y })?;
        let cell = self.grid.get(idx);
        Ok(SparseCell {
            x: x as u16,
            y: y as u16,
            owner: owner_of(cell),
            coins: coins_of(cell),
        })
    }

    /// Per-slot summary for slot selection (full grid scan).
    pub fn slots_info(&self) -> Vec<SlotInfo> {
        let mut alive_counts = [0u32; MAX_PLAYERS + 1];
        let mut territory_counts = [0u32; MAX_PLAYERS + 1];
        let mut coin_counts = [0u32; MAX_PLAYERS + 1];

        for (_, cell) in self.grid.occupied() {
            let owner = owner_of(cell) as usize;
            if owner == 0 || owner > MAX_PLAYERS {
                continue;
            }
            if is_alive(cell) {
                alive_counts[owner] += 1;
            } else {
                territory_counts[owner] += 1;
            }
            coin_counts[owner] += coins_of(cell) as u32;
        }

        (1..=MAX_PLAYERS as u8)
            .map(|slot| SlotInfo {
                slot,
                occupied: self.players.is_occupied(slot),
                cell_count: alive_counts[slot as usize],
                territory_cells: territory_counts[slot as usize],
                territory_coins: coin_counts[slot as usize],
            })
            .collect()
    }

    /// Sparse state: alive cells plus dead cells that are claimed or hold coins.
    pub fn state_for(&self, caller: &Principal) -> GameState {
        let mut alive_cells = Vec::new();
        let mut territory = Vec::new();

        for (idx, cell) in self.grid.occupied() {
            let (x, y) = to_coord(idx);
            let sparse = SparseCell {
                x: x as u16,
                y: y as u16,
                owner: owner_of(cell),
                coins: coins_of(cell),
            };
            if is_alive(cell) {
                alive_cells.push(sparse);
            } else {
                territory.push(sparse);
            }
        }

        GameState {
            generation: self.generation,
            alive_cells,
            territory,
            players: self.players.slots().to_vec(),
            balances: self.players.slot_balances(),
            player_num: self.players.slot_of(caller),
            is_running: self.is_running,
        }
    }
}
