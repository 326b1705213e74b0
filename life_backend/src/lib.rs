//! Life: Sparse On-Chain Game of Life
//!
//! A 100% on-chain multiplayer Game of Life running at 10 generations/second
//! using sparse iteration. Instead of processing all 262,144 cells every
//! generation, only cells that can possibly change state are visited.
//!
//! Players place cells with coins from their wallet. Dead cells keep their
//! owner and coins as territory; a birth that overtakes another player's
//! coin-bearing cell captures those coins.

use candid::Principal;
use ic_cdk::{init, post_upgrade, pre_upgrade, query, update};
use ic_stable_structures::memory_manager::{MemoryId, MemoryManager, VirtualMemory};
use ic_stable_structures::DefaultMemoryImpl;
use std::cell::RefCell;
use std::time::Duration;

// =============================================================================
// MODULE DECLARATIONS
// =============================================================================

pub mod benchmarks;
pub mod cell;
pub mod coords;
pub mod engine;
pub mod grid;
pub mod persistence;
pub mod placement;
pub mod players;
pub mod potential;
pub mod quadrants;
pub mod scheduler;
pub mod types;


// =============================================================================
// RE-EXPORTS
// =============================================================================

pub use engine::{find_majority_owner, LifeEngine, StepReport};
pub use types::{
    GameState, LifeError, NextWipe, PlaceResult, QuadrantInfo, SlotInfo, SparseCell,
};

use benchmarks::BenchmarkData;
use types::{ADMIN_PRINCIPAL, GENERATIONS_PER_TICK, GRID_SIZE, TICK_INTERVAL_MS};

// =============================================================================
// STATE
// =============================================================================

type Memory = VirtualMemory<DefaultMemoryImpl>;

// Fresh ids; earlier layouts wrote raw stable memory or used 20/21
const MEMORY_ID_GRID: MemoryId = MemoryId::new(30);
const MEMORY_ID_METADATA: MemoryId = MemoryId::new(31);

thread_local! {
    static MEMORY_MANAGER: RefCell<MemoryManager<DefaultMemoryImpl>> =
        RefCell::new(MemoryManager::init(DefaultMemoryImpl::default()));

    static ENGINE: RefCell<LifeEngine> = RefCell::new(LifeEngine::new());
}

fn memory(id: MemoryId) -> Memory {
    MEMORY_MANAGER.with(|m| m.borrow().get(id))
}

fn with_engine<R>(f: impl FnOnce(&LifeEngine) -> R) -> R {
    ENGINE.with(|e| f(&e.borrow()))
}

fn with_engine_mut<R>(f: impl FnOnce(&mut LifeEngine) -> R) -> R {
    ENGINE.with(|e| f(&mut e.borrow_mut()))
}

// =============================================================================
// TIMER
// =============================================================================

fn start_simulation_timer() {
    // The async block has no await points, so it runs to completion inside
    // the timer callback and never interleaves with placements.
    ic_cdk_timers::set_timer_interval(Duration::from_millis(TICK_INTERVAL_MS), || async {
        crate::benchmark!(Tick);
        let now = ic_cdk::api::time();
        let report = with_engine_mut(|engine| engine.tick(now));
        if !report.ran {
            return;
        }
        if let Some(wipe) = report.wipe {
            ic_cdk::println!("Wiped quadrant {} ({} cells)", wipe.quadrant, wipe.killed);
        }
        for slot in &report.released_slots {
            ic_cdk::println!("Slot {} released after grace period", slot);
        }
    });
}

// =============================================================================
// LIFECYCLE HOOKS
// =============================================================================

#[init]
fn init() {
    with_engine_mut(|engine| engine.resume());
    start_simulation_timer();
    ic_cdk::println!(
        "Life Backend Initialized - {}x{} sparse world, {} gen/sec",
        GRID_SIZE,
        GRID_SIZE,
        GENERATIONS_PER_TICK
    );
}

#[pre_upgrade]
fn pre_upgrade() {
    crate::benchmark!(Snapshot);
    let grid_memory = memory(MEMORY_ID_GRID);
    let metadata_memory = memory(MEMORY_ID_METADATA);
    let result =
        with_engine(|engine| persistence::save_snapshot(engine, &grid_memory, &metadata_memory));
    if let Err(e) = result {
        ic_cdk::trap(format!("pre_upgrade: snapshot failed: {}", e));
    }
    ic_cdk::println!("Life Backend pre_upgrade: snapshot saved");
}

#[post_upgrade]
fn post_upgrade() {
    crate::benchmark!(Restore);
    let grid_memory = memory(MEMORY_ID_GRID);
    let metadata_memory = memory(MEMORY_ID_METADATA);

    match persistence::restore_snapshot(&grid_memory, &metadata_memory) {
        Ok(Some((engine, report))) => {
            ENGINE.with(|e| *e.borrow_mut() = engine);
            ic_cdk::println!(
                "Life Backend post_upgrade: generation {}, {} players, {} alive, {} potential",
                report.generation,
                report.players,
                report.alive_cells,
                report.potential_cells
            );
        }
        Ok(None) => {
            ic_cdk::println!("Life Backend post_upgrade: no snapshot found, starting fresh world");
        }
        // Never silently replace a world we failed to read
        Err(e) => ic_cdk::trap(format!("post_upgrade: restore failed: {}", e)),
    }

    start_simulation_timer();
}

// =============================================================================
// AUTHENTICATION
// =============================================================================

fn require_authenticated() -> Result<Principal, LifeError> {
    let caller = ic_cdk::api::msg_caller();
    if caller == Principal::anonymous() {
        return Err(LifeError::NotAuthenticated);
    }
    Ok(caller)
}

fn require_admin() -> Result<(), LifeError> {
    let caller = ic_cdk::api::msg_caller();
    let admin = Principal::from_text(ADMIN_PRINCIPAL).map_err(|_| LifeError::Unauthorized)?;
    if caller != admin {
        return Err(LifeError::Unauthorized);
    }
    Ok(())
}

// =============================================================================
// UPDATE METHODS
// =============================================================================

/// Join the game and get assigned a player number (1-9).
#[update]
fn join_game() -> Result<u8, String> {
    let caller = require_authenticated()?;
    Ok(with_engine_mut(|engine| engine.join_game(caller))?)
}

/// Join at a specific slot, inheriting any territory left under that id.
#[update]
fn join_slot(slot: u8) -> Result<u8, String> {
    let caller = require_authenticated()?;
    let now = ic_cdk::api::time();
    Ok(with_engine_mut(|engine| engine.join_slot(caller, slot, now))?)
}

/// Place cells on the grid. Costs 1 coin per placed cell.
#[update]
fn place_cells(cells: Vec<(i32, i32)>) -> Result<PlaceResult, String> {
    crate::benchmark!(PlaceCells);
    let caller = require_authenticated()?;
    Ok(with_engine_mut(|engine| engine.place_cells(caller, &cells))?)
}

/// Add 1000 coins to the caller's wallet.
#[update]
fn faucet() -> Result<u64, String> {
    let caller = require_authenticated()?;
    Ok(with_engine_mut(|engine| engine.faucet(caller)))
}

#[update]
fn pause_game() -> Result<(), String> {
    require_admin()?;
    with_engine_mut(|engine| engine.pause());
    ic_cdk::println!("Simulation paused");
    Ok(())
}

#[update]
fn resume_game() -> Result<(), String> {
    require_admin()?;
    with_engine_mut(|engine| engine.resume());
    ic_cdk::println!("Simulation resumed");
    Ok(())
}

/// Reset the world. Wallets persist across resets.
#[update]
fn reset_game() -> Result<(), String> {
    require_admin()?;
    with_engine_mut(|engine| engine.reset());
    ic_cdk::println!("World reset");
    Ok(())
}

#[update]
fn reset_benchmarks() -> Result<(), String> {
    require_admin()?;
    benchmarks::reset(ic_cdk::api::time());
    Ok(())
}

// =============================================================================
// QUERY METHODS
// =============================================================================

/// Current game state (sparse: only non-empty cells).
#[query]
fn get_state() -> GameState {
    crate::benchmark!(GetState);
    let caller = ic_cdk::api::msg_caller();
    with_engine(|engine| engine.state_for(&caller))
}

#[query]
fn get_generation() -> u64 {
    with_engine(|engine| engine.generation())
}

#[query]
fn get_alive_count() -> u32 {
    with_engine(|engine| engine.alive_count())
}

/// Number of cells in the potential set (diagnostic).
#[query]
fn get_potential_count() -> u32 {
    with_engine(|engine| engine.potential_count())
}

#[query]
fn get_balance() -> Result<u64, String> {
    let caller = ic_cdk::api::msg_caller();
    Ok(with_engine(|engine| engine.balance_of(&caller))?)
}

#[query]
fn is_running() -> bool {
    with_engine(|engine| engine.is_running())
}

#[query]
fn get_cell(x: i32, y: i32) -> Result<SparseCell, String> {
    Ok(with_engine(|engine| engine.cell_at(x, y))?)
}

#[query]
fn get_next_wipe() -> NextWipe {
    let now = ic_cdk::api::time();
    with_engine(|engine| engine.next_wipe(now))
}

#[query]
fn get_slots_info() -> Vec<SlotInfo> {
    with_engine(|engine| engine.slots_info())
}

#[query]
fn get_quadrant_info() -> Vec<QuadrantInfo> {
    with_engine(|engine| engine.quadrant_info())
}

/// Full scan checking that every alive cell's neighborhood is marked.
/// Returns the first unmarked index, if any.
#[query]
fn audit_potential() -> Result<Option<u32>, String> {
    require_admin()?;
    Ok(with_engine(|engine| engine.audit_potential().err().map(|idx| idx as u32)))
}

#[query]
fn get_benchmarks() -> BenchmarkData {
    benchmarks::snapshot()
}

#[query]
fn greet(name: String) -> String {
    format!(
        "Hello, {}! Welcome to Life - a {}x{} sparse Game of Life at {} gen/sec.",
        name, GRID_SIZE, GRID_SIZE, GENERATIONS_PER_TICK
    )
}

ic_cdk::export_candid!();
