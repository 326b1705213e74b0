use candid::{CandidType, Deserialize, Principal};
use serde::Serialize;
use std::fmt;

// =============================================================================
// CONSTANTS
// =============================================================================

pub const GRID_SIZE: usize = 512;
pub const GRID_SHIFT: usize = 9; // 2^9 = 512
pub const GRID_MASK: usize = 0x1FF; // 511
pub const TOTAL_CELLS: usize = GRID_SIZE * GRID_SIZE; // 262,144
pub const GRID_WORDS: usize = TOTAL_CELLS / 64; // 4,096 u64s per bitset

pub const MAX_PLAYERS: usize = 9;
pub const MAX_COINS: u8 = 7;
pub const FAUCET_AMOUNT: u64 = 1000;

// 10 generations per second, batched into one timer tick
pub const GENERATIONS_PER_TICK: u32 = 10;
pub const TICK_INTERVAL_MS: u64 = 1000;

// Quadrant wipe: one 128x128 quadrant cleared every 5 minutes
pub const WIPE_INTERVAL_NS: u64 = 300_000_000_000;
pub const QUADRANT_SIZE: usize = 128;
pub const QUADRANTS_PER_SIDE: usize = GRID_SIZE / QUADRANT_SIZE;
pub const TOTAL_QUADRANTS: usize = QUADRANTS_PER_SIDE * QUADRANTS_PER_SIDE;

// How long a slot may hold zero alive cells before it is freed for reuse
pub const SLOT_GRACE_PERIOD_NS: u64 = 600_000_000_000; // 10 minutes

/// Only this principal can pause, resume or reset the world.
pub const ADMIN_PRINCIPAL: &str = "67ktx-ln42b-uzmo5-bdiyn-gu62c-cd4h4-a5qt3-2w3rs-cixdl-iaso2-mqe";

// =============================================================================
// ERRORS
// =============================================================================

#[derive(CandidType, Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
pub enum LifeError {
    GameFull,
    InsufficientBalance { needed: u64, available: u64 },
    InvalidCoordinate { x: i32, y: i32 },
    InvalidSlot(u8),
    SlotOccupied(u8),
    NotAPlayer,
    NotAuthenticated,
    Unauthorized,
}

impl fmt::Display for LifeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LifeError::GameFull => write!(f, "Game full - max {} players", MAX_PLAYERS),
            LifeError::InsufficientBalance { needed, available } => {
                write!(f, "Need {} coins, have {}", needed, available)
            }
            LifeError::InvalidCoordinate { x, y } => write!(
                f,
                "Invalid coordinate ({}, {}): must be within 0-{}",
                x,
                y,
                GRID_SIZE - 1
            ),
            LifeError::InvalidSlot(slot) => {
                write!(f, "Invalid slot {}: must be 1-{}", slot, MAX_PLAYERS)
            }
            LifeError::SlotOccupied(slot) => write!(f, "Slot {} is already occupied", slot),
            LifeError::NotAPlayer => write!(f, "Not a player"),
            LifeError::NotAuthenticated => write!(
                f,
                "Authentication required. Please log in with Internet Identity."
            ),
            LifeError::Unauthorized => write!(f, "Admin access required"),
        }
    }
}

impl From<LifeError> for String {
    fn from(e: LifeError) -> Self {
        e.to_string()
    }
}

// =============================================================================
// API TYPES
// =============================================================================

#[derive(CandidType, Deserialize, Serialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct SparseCell {
    pub x: u16,
    pub y: u16,
    pub owner: u8,
    pub coins: u8,
}

/// Sparse world snapshot: only alive cells and claimed or coin-bearing
/// dead cells are listed, never the full grid.
#[derive(CandidType, Deserialize, Serialize, Clone, Debug)]
pub struct GameState {
    pub generation: u64,
    pub alive_cells: Vec<SparseCell>,
    pub territory: Vec<SparseCell>,
    pub players: Vec<Principal>,
    pub balances: Vec<u64>,
    pub player_num: Option<u8>,
    pub is_running: bool,
}

#[derive(CandidType, Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
pub struct PlaceResult {
    pub placed: u32,
    pub generation: u64,
    pub new_balance: u64,
}

#[derive(CandidType, Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
pub struct SlotInfo {
    pub slot: u8,             // 1-9
    pub occupied: bool,
    pub cell_count: u32,      // alive cells owned by this slot
    pub territory_cells: u32, // dead cells still owned by this slot
    pub territory_coins: u32, // coins on any cell owned by this slot
}

#[derive(CandidType, Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
pub struct QuadrantInfo {
    pub quadrant: u8,                  // 0-15
    pub territory_by_player: Vec<u32>, // [P1, P2, ..., P9]
    pub total_territory: u32,
    pub coins_by_player: Vec<u32>,
    pub total_coins: u32,
}

#[derive(CandidType, Deserialize, Serialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct NextWipe {
    pub quadrant: u8,
    pub seconds_remaining: u64,
}
