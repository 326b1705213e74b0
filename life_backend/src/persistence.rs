//! Upgrade persistence.
//!
//! Two independent stable regions:
//! - grid: exactly `TOTAL_CELLS` raw bytes at offset 0
//! - metadata: 12-byte header (magic, version, payload length) followed by a
//!   candid-encoded `Metadata` record
//!
//! The potential set and per-slot alive counts are never persisted. They are
//! derived from the grid and rebuilt on every restore.

use candid::{CandidType, Deserialize, Principal};
use ic_stable_structures::Memory;
use std::fmt;

use crate::cell::owner_of;
use crate::engine::LifeEngine;
use crate::grid::Grid;
use crate::players::PlayerRegistry;
use crate::types::{GRID_SIZE, MAX_PLAYERS, TOTAL_CELLS, TOTAL_QUADRANTS};

pub const METADATA_MAGIC: [u8; 4] = *b"LIFE";
pub const METADATA_VERSION: u32 = 1;
const HEADER_LEN: u64 = 12;
const MAX_METADATA_LEN: u32 = 16 * 1024 * 1024;
const WASM_PAGE_SIZE_BYTES: u64 = 65536;

#[derive(CandidType, Deserialize, Clone, Debug, Default)]
struct Metadata {
    grid_size: u32,
    generation: u64,
    players: Vec<Principal>,
    balances: Vec<(Principal, u64)>,
    is_running: bool,
    #[serde(default)]
    zero_cells_since: Vec<Option<u64>>,
    #[serde(default)]
    next_wipe_quadrant: u8,
    #[serde(default)]
    last_wipe_ns: u64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PersistenceError {
    BadMagic([u8; 4]),
    UnsupportedVersion(u32),
    BadLength(u32),
    Decode(String),
    Encode(String),
    GridSizeMismatch { stored: u32, expected: u32 },
    GridTooShort { bytes: u64 },
    MissingGrid,
    MissingMetadata,
    CorruptCell { index: usize, byte: u8 },
    OutOfMemory,
}

impl fmt::Display for PersistenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PersistenceError::BadMagic(m) => write!(f, "metadata magic mismatch: {:?}", m),
            PersistenceError::UnsupportedVersion(v) => write!(
                f,
                "unsupported metadata version {} (expected {})",
                v, METADATA_VERSION
            ),
            PersistenceError::BadLength(len) => write!(f, "implausible metadata length {}", len),
            PersistenceError::Decode(e) => write!(f, "metadata decode failed: {}", e),
            PersistenceError::Encode(e) => write!(f, "metadata encode failed: {}", e),
            PersistenceError::GridSizeMismatch { stored, expected } => write!(
                f,
                "grid size mismatch: stored {}, expected {}",
                stored, expected
            ),
            PersistenceError::GridTooShort { bytes } => write!(
                f,
                "grid region holds {} bytes, need {}",
                bytes, TOTAL_CELLS
            ),
            PersistenceError::MissingGrid => write!(f, "metadata present but grid region is empty"),
            PersistenceError::MissingMetadata => {
                write!(f, "grid present but metadata region is empty")
            }
            PersistenceError::CorruptCell { index, byte } => {
                write!(f, "cell {} has invalid owner (byte {:#04x})", index, byte)
            }
            PersistenceError::OutOfMemory => write!(f, "stable memory grow failed"),
        }
    }
}

/// Summary of a successful restore, for logging.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RestoreReport {
    pub generation: u64,
    pub players: usize,
    pub alive_cells: u32,
    pub potential_cells: u32,
}

fn ensure_capacity<M: Memory>(memory: &M, bytes: u64) -> Result<(), PersistenceError> {
    let needed_pages = bytes.div_ceil(WASM_PAGE_SIZE_BYTES);
    let current = memory.size();
    if current < needed_pages && memory.grow(needed_pages - current) < 0 {
        return Err(PersistenceError::OutOfMemory);
    }
    Ok(())
}

/// Write the grid blob and the metadata record.
pub fn save_snapshot<M: Memory>(
    engine: &LifeEngine,
    grid_memory: &M,
    metadata_memory: &M,
) -> Result<(), PersistenceError> {
    ensure_capacity(grid_memory, TOTAL_CELLS as u64)?;
    grid_memory.write(0, engine.grid.as_bytes());

    let metadata = Metadata {
        grid_size: GRID_SIZE as u32,
        generation: engine.generation,
        players: engine.players.slots.clone(),
        balances: engine
            .players
            .balances
            .iter()
            .map(|(&k, &v)| (k, v))
            .collect(),
        is_running: engine.is_running,
        zero_cells_since: engine.players.zero_cells_since.clone(),
        next_wipe_quadrant: engine.next_wipe_quadrant as u8,
        last_wipe_ns: engine.last_wipe_ns,
    };
    let encoded =
        candid::encode_one(&metadata).map_err(|e| PersistenceError::Encode(e.to_string()))?;
    if encoded.len() as u64 > MAX_METADATA_LEN as u64 {
        return Err(PersistenceError::BadLength(encoded.len() as u32));
    }

    ensure_capacity(metadata_memory, HEADER_LEN + encoded.len() as u64)?;
    let mut header = [0u8; HEADER_LEN as usize];
    header[0..4].copy_from_slice(&METADATA_MAGIC);
    header[4..8].copy_from_slice(&METADATA_VERSION.to_le_bytes());
    header[8..12].copy_from_slice(&(encoded.len() as u32).to_le_bytes());
    metadata_memory.write(0, &header);
    metadata_memory.write(HEADER_LEN, &encoded);
    Ok(())
}

fn read_metadata<M: Memory>(memory: &M) -> Result<Metadata, PersistenceError> {
    let available = memory.size() * WASM_PAGE_SIZE_BYTES;
    if available < HEADER_LEN {
        return Err(PersistenceError::BadLength(0));
    }

    let mut header = [0u8; HEADER_LEN as usize];
    memory.read(0, &mut header);

    let mut magic = [0u8; 4];
    magic.copy_from_slice(&header[0..4]);
    if magic != METADATA_MAGIC {
        return Err(PersistenceError::BadMagic(magic));
    }

    let version = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);
    if version != METADATA_VERSION {
        return Err(PersistenceError::UnsupportedVersion(version));
    }

    let len = u32::from_le_bytes([header[8], header[9], header[10], header[11]]);
    if len == 0 || len > MAX_METADATA_LEN || HEADER_LEN + len as u64 > available {
        return Err(PersistenceError::BadLength(len));
    }

    let mut payload = vec![0u8; len as usize];
    memory.read(HEADER_LEN, &mut payload);
    candid::decode_one::<Metadata>(&payload).map_err(|e| PersistenceError::Decode(e.to_string()))
}

/// Restore a world from stable memory.
///
/// Returns `Ok(None)` when both regions are empty (nothing was ever saved).
/// Anything else that does not parse is an error; callers must not fall back
/// to an empty world.
pub fn restore_snapshot<M: Memory>(
    grid_memory: &M,
    metadata_memory: &M,
) -> Result<Option<(LifeEngine, RestoreReport)>, PersistenceError> {
    let grid_pages = grid_memory.size();
    let metadata_pages = metadata_memory.size();

    match (grid_pages, metadata_pages) {
        (0, 0) => return Ok(None),
        (0, _) => return Err(PersistenceError::MissingGrid),
        (_, 0) => return Err(PersistenceError::MissingMetadata),
        _ => {}
    }

    let metadata = read_metadata(metadata_memory)?;
    if metadata.grid_size != GRID_SIZE as u32 {
        return Err(PersistenceError::GridSizeMismatch {
            stored: metadata.grid_size,
            expected: GRID_SIZE as u32,
        });
    }

    let grid_bytes = grid_pages * WASM_PAGE_SIZE_BYTES;
    if grid_bytes < TOTAL_CELLS as u64 {
        return Err(PersistenceError::GridTooShort { bytes: grid_bytes });
    }
    let mut buf = vec![0u8; TOTAL_CELLS];
    grid_memory.read(0, &mut buf);
    if let Some((index, &byte)) = buf
        .iter()
        .enumerate()
        .find(|(_, &c)| owner_of(c) as usize > MAX_PLAYERS)
    {
        return Err(PersistenceError::CorruptCell { index, byte });
    }
    let grid = Grid::from_bytes(&buf).ok_or(PersistenceError::GridTooShort {
        bytes: buf.len() as u64,
    })?;

    let mut engine = LifeEngine::new();
    engine.grid = grid;
    engine.generation = metadata.generation;
    engine.is_running = metadata.is_running;
    engine.next_wipe_quadrant = metadata.next_wipe_quadrant as usize % TOTAL_QUADRANTS;
    engine.last_wipe_ns = metadata.last_wipe_ns;
    engine.players =
        PlayerRegistry::restore(metadata.players, metadata.balances, metadata.zero_cells_since);

    // Derived state is recomputed from the grid, never trusted from storage
    engine.rebuild_potential_from_grid();
    let alive_by_owner = engine.grid.alive_by_owner::<{ MAX_PLAYERS + 1 }>();
    engine.players.set_cell_counts(&alive_by_owner);

    let report = RestoreReport {
        generation: engine.generation,
        players: engine.players.slots().len(),
        alive_cells: engine.alive_count(),
        potential_cells: engine.potential_count(),
    };
    Ok(Some((engine, report)))
}
