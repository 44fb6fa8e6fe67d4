//! Fuzz target for the legacy pcap reader
//!
//! Any byte stream must produce either frames or an error, never a panic.
//!
//! Run with: cargo +nightly fuzz run fuzz_pcap

#![no_main]

use droplet::replay::read_pcap_from;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(frames) = read_pcap_from(data) {
        for frame in &frames {
            assert!(frame.data.len() <= data.len());
        }
    }
});
