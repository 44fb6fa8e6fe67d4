//! Per-core detection state.
//!
//! Each receive core owns exactly one [`CounterState`]. The [`CoreTable`]
//! hands slots out by `&mut`, so a core's state is only ever touched by the
//! worker holding that borrow and no locking is needed.

use serde::Serialize;

/// Seconds covered by the detection window (ring size)
pub const WINDOW_SECONDS: usize = 8;

/// Largest table the runtime will allocate
pub const MAX_CORES: usize = 1024;

/// Detection and admission state for one core
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CounterState {
    pub(crate) active: bool,
    pub(crate) window_second: u32,
    pub(crate) verdict_counter: u64,
    pub(crate) in_progress: u64,
    pub(crate) buckets: [u64; WINDOW_SECONDS],
}

impl CounterState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether this core currently considers itself under a SYN flood
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Second of the last bucket rotation
    pub fn window_second(&self) -> u32 {
        self.window_second
    }

    /// Position in the admission cycle
    pub fn verdict_counter(&self) -> u64 {
        self.verdict_counter
    }

    /// SYNs counted for the second that has not closed yet
    pub fn in_progress(&self) -> u64 {
        self.in_progress
    }

    /// SYN counts of the last closed seconds, indexed by `second % 8`
    pub fn buckets(&self) -> &[u64; WINDOW_SECONDS] {
        &self.buckets
    }

    /// Sum over the whole window
    pub fn window_total(&self) -> u64 {
        self.buckets
            .iter()
            .fold(0u64, |total, count| total.saturating_add(*count))
    }
}

/// One zeroed [`CounterState`] per core, allocated once for the run.
#[derive(Debug, Clone)]
pub struct CoreTable {
    slots: Vec<CounterState>,
}

impl CoreTable {
    pub fn new(cores: usize) -> Self {
        Self {
            slots: vec![CounterState::default(); cores],
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn get(&self, core: usize) -> Option<&CounterState> {
        self.slots.get(core)
    }

    /// Exclusive borrow of one core's state; `None` for an unknown core.
    pub fn slot_mut(&mut self, core: usize) -> Option<&mut CounterState> {
        self.slots.get_mut(core)
    }

    /// Split the table into per-core exclusive borrows, in core order.
    pub fn slots_mut(&mut self) -> std::slice::IterMut<'_, CounterState> {
        self.slots.iter_mut()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CounterState> {
        self.slots.iter()
    }

    /// Cores currently in the flood state
    pub fn active_cores(&self) -> Vec<usize> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, state)| state.active)
            .map(|(core, _)| core)
            .collect()
    }
}
