//! Instruction accounting per operation.
//!
//! Tracks how many instructions each entry point burns so the per-tick
//! budget can be watched on a live canister.

use candid::CandidType;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;

/// Maximum number of samples to keep per operation
const MAX_SAMPLES: usize = 100;

#[derive(Clone, Debug, CandidType, Deserialize, Serialize)]
pub struct OperationStats {
    pub call_count: u64,
    pub total_instructions: u64,
    pub min_instructions: u64,
    pub max_instructions: u64,
    /// Recent samples (circular buffer)
    pub recent_samples: Vec<u64>,
    sample_index: usize,
}

impl Default for OperationStats {
    fn default() -> Self {
        Self::new()
    }
}

impl OperationStats {
    pub fn new() -> Self {
        Self {
            call_count: 0,
            total_instructions: 0,
            min_instructions: u64::MAX,
            max_instructions: 0,
            recent_samples: Vec::with_capacity(MAX_SAMPLES),
            sample_index: 0,
        }
    }

    pub fn record(&mut self, instructions: u64) {
        self.call_count += 1;
        self.total_instructions = self.total_instructions.saturating_add(instructions);
        self.min_instructions = self.min_instructions.min(instructions);
        self.max_instructions = self.max_instructions.max(instructions);

        if self.recent_samples.len() < MAX_SAMPLES {
            self.recent_samples.push(instructions);
        } else {
            self.recent_samples[self.sample_index] = instructions;
            self.sample_index = (self.sample_index + 1) % MAX_SAMPLES;
        }
    }

    pub fn average(&self) -> u64 {
        if self.call_count == 0 {
            0
        } else {
            self.total_instructions / self.call_count
        }
    }

    pub fn recent_average(&self) -> u64 {
        if self.recent_samples.is_empty() {
            0
        } else {
            self.recent_samples.iter().sum::<u64>() / self.recent_samples.len() as u64
        }
    }
}

#[derive(Clone, Debug, Default, CandidType, Deserialize, Serialize)]
pub struct BenchmarkData {
    /// Full timer tick (batch of generations + housekeeping)
    pub tick: OperationStats,
    pub place_cells: OperationStats,
    pub get_state: OperationStats,
    pub snapshot: OperationStats,
    pub restore: OperationStats,
    pub last_reset_ns: u64,
}

impl BenchmarkData {
    pub fn reset(&mut self, now_ns: u64) {
        *self = Self::default();
        self.last_reset_ns = now_ns;
    }
}

#[derive(Clone, Copy, Debug)]
pub enum BenchmarkOperation {
    Tick,
    PlaceCells,
    GetState,
    Snapshot,
    Restore,
}

thread_local! {
    static BENCHMARKS: RefCell<BenchmarkData> = RefCell::new(BenchmarkData::default());
}

/// Current instruction count; 0 off-chain.
#[inline]
pub fn get_instructions() -> u64 {
    #[cfg(target_arch = "wasm32")]
    {
        ic_cdk::api::performance_counter(0)
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        0
    }
}

/// RAII guard: records the instructions spent between creation and drop.
pub struct BenchmarkGuard {
    start: u64,
    operation: BenchmarkOperation,
}

impl BenchmarkGuard {
    pub fn new(operation: BenchmarkOperation) -> Self {
        Self {
            start: get_instructions(),
            operation,
        }
    }
}

impl Drop for BenchmarkGuard {
    fn drop(&mut self) {
        let elapsed = get_instructions().saturating_sub(self.start);
        BENCHMARKS.with(|b| {
            let mut b = b.borrow_mut();
            let stats = match self.operation {
                BenchmarkOperation::Tick => &mut b.tick,
                BenchmarkOperation::PlaceCells => &mut b.place_cells,
                BenchmarkOperation::GetState => &mut b.get_state,
                BenchmarkOperation::Snapshot => &mut b.snapshot,
                BenchmarkOperation::Restore => &mut b.restore,
            };
            stats.record(elapsed);
        });
    }
}

#[macro_export]
macro_rules! benchmark {
    ($op:ident) => {
        let _guard = $crate::benchmarks::BenchmarkGuard::new(
            $crate::benchmarks::BenchmarkOperation::$op,
        );
    };
}

pub fn snapshot() -> BenchmarkData {
    BENCHMARKS.with(|b| b.borrow().clone())
}

pub fn reset(now_ns: u64) {
    BENCHMARKS.with(|b| b.borrow_mut().reset(now_ns));
}
