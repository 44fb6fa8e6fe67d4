//! Per-frame pipeline: header walk, SYN accounting, admission verdict.

use tracing::trace;

use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::detector::SynFloodDetector;
use crate::error::ParseError;
use crate::packet::{self, TcpSegment};
use crate::state::CounterState;
use crate::verdict::{Verdict, VerdictEngine};

/// How far classification got for one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Walk failed: truncated, not IP, not TCP, bad extension chain
    Unclassified(ParseError),
    /// TCP without SYN
    NotSyn(TcpSegment),
    /// SYN, but the calling core has no state slot
    NoState(TcpSegment),
    /// SYN run through the detector and verdict engine
    Syn(TcpSegment),
}

impl Outcome {
    pub fn is_syn(&self) -> bool {
        matches!(self, Outcome::Syn(_) | Outcome::NoState(_))
    }
}

/// Verdict plus the classification that produced it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub verdict: Verdict,
    pub outcome: Outcome,
}

/// Inline SYN flood guard.
///
/// Stateless apart from its configuration: per-core state is passed in by
/// the caller on every call, so one guard can serve every core.
#[derive(Debug)]
pub struct SynGuard<C = SystemClock> {
    detector: SynFloodDetector,
    engine: VerdictEngine,
    clock: C,
}

impl SynGuard<SystemClock> {
    pub fn new(config: &Config) -> Self {
        Self::with_clock(config, SystemClock)
    }
}

impl<C: Clock> SynGuard<C> {
    pub fn with_clock(config: &Config, clock: C) -> Self {
        Self {
            detector: SynFloodDetector::from_config(&config.detector),
            engine: VerdictEngine::from_config(&config.verdict),
            clock,
        }
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn detector(&self) -> &SynFloodDetector {
        &self.detector
    }

    pub fn engine(&self) -> &VerdictEngine {
        &self.engine
    }

    /// Verdict for one frame received on the core owning `state`.
    #[inline]
    pub fn evaluate(&self, frame: &[u8], state: Option<&mut CounterState>) -> Verdict {
        self.decide(frame, state).verdict
    }

    /// Like [`SynGuard::evaluate`], also reporting how the frame classified.
    pub fn decide(&self, frame: &[u8], state: Option<&mut CounterState>) -> Decision {
        self.decide_at(frame, state, self.clock.now_secs())
    }

    /// Classify with an explicit timestamp instead of the guard's clock.
    ///
    /// The clock is only consulted for SYNs; this variant lets replay feed
    /// capture timestamps.
    pub fn decide_at(
        &self,
        frame: &[u8],
        state: Option<&mut CounterState>,
        now_secs: u32,
    ) -> Decision {
        let segment = match packet::locate_tcp(frame) {
            Ok(segment) => segment,
            Err(e) => {
                trace!(error = %e, len = frame.len(), "frame unclassified, passing");
                return Decision {
                    verdict: Verdict::Pass,
                    outcome: Outcome::Unclassified(e),
                };
            }
        };

        if !segment.syn {
            return Decision {
                verdict: Verdict::Pass,
                outcome: Outcome::NotSyn(segment),
            };
        }

        let Some(state) = state else {
            trace!("SYN on core without state slot, passing");
            return Decision {
                verdict: Verdict::Pass,
                outcome: Outcome::NoState(segment),
            };
        };

        self.detector.record_syn(state, now_secs);
        let verdict = self.engine.decide(state);
        trace!(
            network = ?segment.network,
            vlan_tags = segment.vlan_tags,
            active = state.active,
            %verdict,
            "SYN classified"
        );

        Decision {
            verdict,
            outcome: Outcome::Syn(segment),
        }
    }
}
