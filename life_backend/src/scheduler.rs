//! Batched simulation tick.
//!
//! Each timer tick runs `GENERATIONS_PER_TICK` steps back to back to
//! amortize the per-message overhead, then does time-based housekeeping.

use crate::engine::{LifeEngine, StepReport};
use crate::quadrants::WipeReport;
use crate::types::GENERATIONS_PER_TICK;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    /// False when the world is paused and nothing ran
    pub ran: bool,
    pub generations: u32,
    pub steps: StepReport,
    pub wipe: Option<WipeReport>,
    pub released_slots: Vec<u8>,
}

impl LifeEngine {
    pub fn tick(&mut self, now_ns: u64) -> TickReport {
        if !self.is_running {
            return TickReport::default();
        }

        let mut steps = StepReport::default();
        for _ in 0..GENERATIONS_PER_TICK {
            let r = self.step_generation();
            steps.evaluated += r.evaluated;
            steps.births += r.births;
            steps.deaths += r.deaths;
            steps.captures += r.captures;
            steps.coins_captured = steps.coins_captured.saturating_add(r.coins_captured);
        }

        let wipe = self.run_wipe_if_needed(now_ns);
        let released_slots = self.players.release_idle_slots(now_ns);

        TickReport {
            ran: true,
            generations: GENERATIONS_PER_TICK,
            steps,
            wipe,
            released_slots,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::pack;
    use crate::coords::to_index;

    fn with_blinker() -> LifeEngine {
        let mut engine = LifeEngine::new();
        for y in 99..=101 {
            let idx = to_index(100, y);
            engine.grid.set(idx, pack(1, true, 0));
            engine.potential.set_with_neighbors(idx);
        }
        engine
    }

    #[test]
    fn test_paused_tick_does_nothing() {
        let mut engine = with_blinker();
        engine.pause();
        let report = engine.tick(5);
        assert!(!report.ran);
        assert_eq!(engine.generation(), 0);
        assert_eq!(engine.last_wipe_ns, 0);
    }

    #[test]
    fn test_tick_runs_a_batch() {
        let mut engine = with_blinker();
        let report = engine.tick(5);
        assert!(report.ran);
        assert_eq!(report.generations, GENERATIONS_PER_TICK);
        assert_eq!(engine.generation(), GENERATIONS_PER_TICK as u64);
        // Blinker has period 2, batch size is even
        assert!(crate::cell::is_alive(engine.grid.get(to_index(100, 99))));
        assert_eq!(report.steps.births, GENERATIONS_PER_TICK * 2);
        assert_eq!(report.steps.deaths, GENERATIONS_PER_TICK * 2);
    }

    #[test]
    fn test_resume_after_pause() {
        let mut engine = with_blinker();
        engine.pause();
        engine.tick(1);
        engine.resume();
        assert!(engine.tick(2).ran);
        assert_eq!(engine.generation(), GENERATIONS_PER_TICK as u64);
    }
}
