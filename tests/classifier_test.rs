// Classifier integration tests
// Drive whole frames through SynGuard with a manual clock and check the
// verdict sequence and per-core state.

use droplet::clock::ManualClock;
use droplet::packet::ethernet::{ETH_P_8021AD, ETH_P_8021Q};
use droplet::packet::ipv6::{NEXTHDR_DEST, NEXTHDR_HOP, NEXTHDR_ROUTING};
use droplet::packet::tcp::{TCP_FLAG_ACK, TCP_FLAG_RST};
use droplet::packet::IPPROTO_UDP;
use droplet::testing::{ExtensionHeader, PacketBuilder};
use droplet::{Config, CoreTable, CounterState, Outcome, ParseError, SynGuard, Verdict};
use proptest::prelude::*;

const START: u32 = 1_700_000_000;

fn guard() -> SynGuard<ManualClock> {
    SynGuard::with_clock(&Config::default(), ManualClock::new(START))
}

/// Push `per_second` SYNs for each of 8 consecutive seconds, then one more SYN
/// in the following second to close the window.
fn flood(guard: &SynGuard<ManualClock>, state: &mut CounterState, frame: &[u8], per_second: u64) {
    // Align on a window boundary so the next 8 seconds fill slots 0..7
    let base = (START / 8 + 1) * 8;
    for second in 0..8 {
        guard.clock().set(base + second);
        for _ in 0..per_second {
            guard.evaluate(frame, Some(state));
        }
    }
    guard.clock().set(base + 8);
    guard.evaluate(frame, Some(state));
}

#[cfg(test)]
mod detection {
    use super::*;

    #[test]
    fn test_flood_at_threshold_activates() {
        let guard = guard();
        let mut state = CounterState::new();
        let syn = PacketBuilder::ipv4().build();

        flood(&guard, &mut state, &syn, 6000);

        assert!(state.is_active());
        assert_eq!(state.window_total(), 48_000);
    }

    #[test]
    fn test_flood_below_threshold_stays_passive() {
        let guard = guard();
        let mut state = CounterState::new();
        let syn = PacketBuilder::ipv4().build();

        flood(&guard, &mut state, &syn, 5999);

        assert!(!state.is_active());
        assert_eq!(state.window_total(), 47_992);
        assert_eq!(state.verdict_counter(), 0);
    }

    #[test]
    fn test_inactive_syns_always_pass() {
        let guard = guard();
        let mut state = CounterState::new();
        let syn = PacketBuilder::ipv6().build();

        for _ in 0..500 {
            assert_eq!(guard.evaluate(&syn, Some(&mut state)), Verdict::Pass);
        }
        assert_eq!(state.verdict_counter(), 0);
    }

    #[test]
    fn test_shedding_sequence_after_activation() {
        let guard = guard();
        let mut state = CounterState::new();
        let syn = PacketBuilder::ipv4().build();

        // Build up everything but the closing SYN, which is SYN k = 0
        let base = (START / 8 + 1) * 8;
        for second in 0..8 {
            guard.clock().set(base + second);
            for _ in 0..6000 {
                assert_eq!(guard.evaluate(&syn, Some(&mut state)), Verdict::Pass);
            }
        }
        guard.clock().set(base + 8);

        for k in 0..90u64 {
            let verdict = guard.evaluate(&syn, Some(&mut state));
            let expected = if k % 30 < 10 { Verdict::Pass } else { Verdict::Drop };
            assert_eq!(verdict, expected, "SYN {}", k);
        }
        assert!(state.is_active());
    }

    #[test]
    fn test_recovery_after_quiet_window() {
        let guard = guard();
        let mut state = CounterState::new();
        let syn = PacketBuilder::ipv4().build();

        flood(&guard, &mut state, &syn, 6000);
        assert!(state.is_active());

        // One SYN per second for the next window
        let second = state.window_second();
        for offset in 1..=8 {
            guard.clock().set(second + offset);
            guard.evaluate(&syn, Some(&mut state));
        }
        assert!(!state.is_active());
    }

    #[test]
    fn test_bucket_holds_latest_second_after_wrap() {
        let guard = guard();
        let mut state = CounterState::new();
        let syn = PacketBuilder::ipv4().build();

        for offset in 0..16u32 {
            guard.clock().set(START + offset);
            for _ in 0..(offset as u64 + 1) * 10 {
                guard.evaluate(&syn, Some(&mut state));
            }
        }
        let now = START + 16;
        guard.clock().set(now);
        guard.evaluate(&syn, Some(&mut state));

        // Second START+15 carried 160 SYNs minus the one that opened it,
        // plus the SYN that closed it.
        assert_eq!(state.buckets()[(now % 8) as usize], 160);
    }

    #[test]
    fn test_cores_are_independent() {
        let guard = guard();
        let mut table = CoreTable::new(2);
        let syn = PacketBuilder::ipv4().build();

        if let Some(state) = table.slot_mut(0) {
            flood(&guard, state, &syn, 6000);
        }

        assert!(table.get(0).unwrap().is_active());
        assert!(!table.get(1).unwrap().is_active());
        assert_eq!(guard.evaluate(&syn, table.slot_mut(1)), Verdict::Pass);
        assert_eq!(table.active_cores(), vec![0]);
    }

    #[test]
    fn test_unknown_core_passes() {
        let guard = guard();
        let mut table = CoreTable::new(1);
        let syn = PacketBuilder::ipv4().build();
        assert_eq!(guard.evaluate(&syn, table.slot_mut(5)), Verdict::Pass);
    }
}

#[cfg(test)]
mod classification {
    use super::*;

    fn active_state() -> CounterState {
        let guard = guard();
        let mut state = CounterState::new();
        flood(&guard, &mut state, &PacketBuilder::ipv4().build(), 6000);
        assert!(state.is_active());
        state
    }

    #[test]
    fn test_non_syn_tcp_untouched() {
        let guard = guard();
        let mut state = active_state();
        let before = state.clone();

        for flags in [TCP_FLAG_ACK, TCP_FLAG_RST, 0] {
            let frame = PacketBuilder::ipv4().with_tcp_flags(flags).build();
            assert_eq!(guard.evaluate(&frame, Some(&mut state)), Verdict::Pass);
        }
        assert_eq!(state, before);
    }

    #[test]
    fn test_udp_untouched() {
        let guard = guard();
        let mut state = active_state();
        let before = state.clone();

        let v4 = PacketBuilder::ipv4().with_protocol(IPPROTO_UDP).build();
        let v6 = PacketBuilder::ipv6().with_protocol(IPPROTO_UDP).build();
        assert_eq!(guard.evaluate(&v4, Some(&mut state)), Verdict::Pass);
        assert_eq!(guard.evaluate(&v6, Some(&mut state)), Verdict::Pass);
        assert_eq!(state, before);
    }

    #[test]
    fn test_ipv6_extension_chain_syn() {
        let guard = guard();
        let mut state = CounterState::new();
        let frame = PacketBuilder::ipv6()
            .with_extension(ExtensionHeader::new(NEXTHDR_HOP, 0))
            .with_extension(ExtensionHeader::new(NEXTHDR_DEST, 1))
            .with_extension(ExtensionHeader::new(NEXTHDR_ROUTING, 2))
            .build();

        let decision = guard.decide(&frame, Some(&mut state));
        match decision.outcome {
            Outcome::Syn(segment) => assert_eq!(segment.offset, 14 + 40 + 8 + 16 + 24),
            other => panic!("expected SYN, got {:?}", other),
        }
        assert_eq!(state.in_progress() + state.buckets().iter().sum::<u64>(), 1);
    }

    #[test]
    fn test_eleven_extensions_pass_untouched() {
        let guard = guard();
        let mut state = active_state();
        let before = state.clone();

        let mut builder = PacketBuilder::ipv6();
        for _ in 0..11 {
            builder = builder.with_extension(ExtensionHeader::new(NEXTHDR_DEST, 0));
        }
        let frame = builder.build();

        let decision = guard.decide(&frame, Some(&mut state));
        assert_eq!(decision.verdict, Verdict::Pass);
        assert_eq!(
            decision.outcome,
            Outcome::Unclassified(ParseError::ExtensionChainTooLong(10))
        );
        assert_eq!(state, before);
    }

    #[test]
    fn test_double_vlan_matches_untagged() {
        let guard_plain = guard();
        let guard_tagged = guard();
        let mut plain = CounterState::new();
        let mut tagged = CounterState::new();

        let untagged_frame = PacketBuilder::ipv4().build();
        let tagged_frame = PacketBuilder::ipv4()
            .with_vlan(ETH_P_8021AD, 100)
            .with_vlan(ETH_P_8021Q, 200)
            .build();

        let base = (START / 8 + 1) * 8;
        for second in 0..10 {
            guard_plain.clock().set(base + second);
            guard_tagged.clock().set(base + second);
            for _ in 0..7000 {
                assert_eq!(
                    guard_plain.evaluate(&untagged_frame, Some(&mut plain)),
                    guard_tagged.evaluate(&tagged_frame, Some(&mut tagged))
                );
            }
        }
        assert!(plain.is_active());
        assert_eq!(plain, tagged);
    }
}

proptest! {
    #[test]
    fn prop_truncated_frames_pass_without_state_change(cut in 0usize..54) {
        let guard = guard();
        let frame = PacketBuilder::ipv4().build();
        let mut state = CounterState::new();

        let verdict = guard.evaluate(&frame[..cut], Some(&mut state));
        prop_assert_eq!(verdict, Verdict::Pass);
        prop_assert_eq!(state, CounterState::default());
    }

    #[test]
    fn prop_truncated_ipv6_chain_passes(cut in 0usize..(14 + 40 + 8 + 16 + 20)) {
        let guard = guard();
        let frame = PacketBuilder::ipv6()
            .with_extension(ExtensionHeader::new(NEXTHDR_HOP, 0))
            .with_extension(ExtensionHeader::new(NEXTHDR_DEST, 1))
            .build();
        let mut state = CounterState::new();

        prop_assert_eq!(guard.evaluate(&frame[..cut], Some(&mut state)), Verdict::Pass);
        prop_assert_eq!(state, CounterState::default());
    }

    #[test]
    fn prop_arbitrary_bytes_never_panic(bytes in proptest::collection::vec(any::<u8>(), 0..256)) {
        let guard = guard();
        let mut state = CounterState::new();
        let _ = guard.evaluate(&bytes, Some(&mut state));
    }

    #[test]
    fn prop_malformed_replay_is_idempotent(cut in 0usize..34, repeats in 1usize..50) {
        let guard = guard();
        let frame = PacketBuilder::ipv4().with_vlan(ETH_P_8021Q, 9).build();
        let mut state = CounterState::new();

        for _ in 0..repeats {
            prop_assert_eq!(guard.evaluate(&frame[..cut], Some(&mut state)), Verdict::Pass);
        }
        prop_assert_eq!(state, CounterState::default());
    }
}
