use serde::{Deserialize, Serialize};

use crate::config::VerdictConfig;
use crate::state::CounterState;

/// Per-frame decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// Hand the frame to normal processing
    Pass,
    /// Discard silently
    Drop,
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Verdict::Pass => write!(f, "PASS"),
            Verdict::Drop => write!(f, "DROP"),
        }
    }
}

/// Deterministic round-robin shedding while a core is under attack.
///
/// Each SYN takes the next slot of a cycle of `pass_ticks + drop_ticks`
/// slots: the first `pass_ticks` slots pass, the rest drop. With the
/// defaults that is 10 admitted, 20 shed, in strict arrival order.
#[derive(Debug, Clone, Copy)]
pub struct VerdictEngine {
    pass_ticks: u64,
    cycle: u64,
}

impl VerdictEngine {
    pub fn new(pass_ticks: u64, drop_ticks: u64) -> Self {
        Self {
            pass_ticks,
            cycle: pass_ticks.saturating_add(drop_ticks),
        }
    }

    pub fn from_config(config: &VerdictConfig) -> Self {
        Self::new(config.pass_ticks, config.drop_ticks)
    }

    pub fn cycle_len(&self) -> u64 {
        self.cycle
    }

    /// Decide one SYN. The cycle position only moves while the core is active.
    #[inline]
    pub fn decide(&self, state: &mut CounterState) -> Verdict {
        if !state.active {
            return Verdict::Pass;
        }

        let slot = state.verdict_counter;
        state.verdict_counter = if slot.saturating_add(1) >= self.cycle {
            0
        } else {
            slot + 1
        };

        if slot < self.pass_ticks {
            Verdict::Pass
        } else {
            Verdict::Drop
        }
    }
}

impl Default for VerdictEngine {
    fn default() -> Self {
        Self::from_config(&VerdictConfig::default())
    }
}
