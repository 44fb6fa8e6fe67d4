//! Fuzz target for the per-frame classifier
//!
//! Feeds arbitrary bytes, with a structured timeline of SYN timestamps, to
//! the guard. Malformed frames must pass without touching core state.
//!
//! Run with: cargo +nightly fuzz run fuzz_classifier

#![no_main]

use arbitrary::Arbitrary;
use droplet::clock::ManualClock;
use droplet::{Config, CounterState, Outcome, SynGuard, Verdict};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct Input {
    start: u32,
    steps: Vec<(u8, Vec<u8>)>,
}

fuzz_target!(|input: Input| {
    let guard = SynGuard::with_clock(&Config::default(), ManualClock::new(input.start));
    let mut state = CounterState::new();

    for (advance, frame) in input.steps.iter().take(256) {
        guard.clock().advance(u32::from(*advance % 4));

        let before = state.clone();
        let decision = guard.decide(frame, Some(&mut state));

        match decision.outcome {
            Outcome::Unclassified(_) | Outcome::NotSyn(_) => {
                assert_eq!(decision.verdict, Verdict::Pass);
                assert_eq!(state, before, "non-SYN frame changed state");
            }
            Outcome::Syn(segment) => {
                assert!(segment.offset + 20 <= frame.len());
                if !state.is_active() {
                    assert_eq!(decision.verdict, Verdict::Pass);
                }
            }
            Outcome::NoState(_) => unreachable!("state slot was provided"),
        }

        assert!(state.verdict_counter() < guard.engine().cycle_len());
    }
});
