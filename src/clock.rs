use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Source of wall-clock time, truncated to whole seconds.
pub trait Clock {
    fn now_secs(&self) -> u32;
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now_secs(&self) -> u32 {
        (**self).now_secs()
    }
}

/// UNIX wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_secs(&self) -> u32 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs() as u32)
            .unwrap_or_default()
    }
}

/// Clock that only moves when told to
#[derive(Debug, Default)]
pub struct ManualClock {
    secs: AtomicU32,
}

impl ManualClock {
    pub fn new(secs: u32) -> Self {
        Self {
            secs: AtomicU32::new(secs),
        }
    }

    pub fn set(&self, secs: u32) {
        self.secs.store(secs, Ordering::Relaxed);
    }

    pub fn advance(&self, secs: u32) {
        self.secs.fetch_add(secs, Ordering::Relaxed);
    }
}

impl Clock for ManualClock {
    fn now_secs(&self) -> u32 {
        self.secs.load(Ordering::Relaxed)
    }
}
