use tracing::{debug, info, warn};

use crate::config::DetectorConfig;
use crate::state::{CounterState, WINDOW_SECONDS};

const WINDOW_MASK: u32 = (WINDOW_SECONDS as u32) - 1;

/// Sliding-window SYN rate detector.
///
/// Counts SYNs into the current second, closes the second into a ring of
/// eight buckets when the clock moves on, and re-evaluates the flood flag
/// once per full window, when bucket 0 is written. The flag keeps its value
/// between evaluations.
#[derive(Debug, Clone, Copy)]
pub struct SynFloodDetector {
    threshold: u64,
}

impl SynFloodDetector {
    /// `threshold` is the SYN total over the whole window that marks a flood.
    pub fn new(threshold: u64) -> Self {
        Self { threshold }
    }

    pub fn from_config(config: &DetectorConfig) -> Self {
        Self::new(config.window_threshold())
    }

    pub fn threshold(&self) -> u64 {
        self.threshold
    }

    /// Account one SYN seen at wall-clock second `now_secs`.
    #[inline]
    pub fn record_syn(&self, state: &mut CounterState, now_secs: u32) {
        state.in_progress = state.in_progress.saturating_add(1);

        if now_secs == state.window_second {
            return;
        }

        let slot = (now_secs & WINDOW_MASK) as usize;
        state.buckets[slot] = state.in_progress;
        state.in_progress = 0;
        state.window_second = now_secs;

        if slot == 0 {
            self.evaluate_window(state);
        }
    }

    fn evaluate_window(&self, state: &mut CounterState) {
        let total = state.window_total();
        let was_active = state.active;
        state.active = total >= self.threshold;

        match (was_active, state.active) {
            (false, true) => warn!(
                total,
                threshold = self.threshold,
                second = state.window_second,
                "SYN flood detected, shedding new connections"
            ),
            (true, false) => info!(
                total,
                threshold = self.threshold,
                second = state.window_second,
                "SYN flood subsided"
            ),
            _ => debug!(total, active = state.active, "SYN window evaluated"),
        }
    }
}
