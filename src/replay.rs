//! Capture replay.
//!
//! Feeds frames from a legacy pcap file through a [`SynGuard`], spreading
//! them over the cores of a [`CoreTable`]. Each core runs on its own thread
//! with an exclusive borrow of its state slot, and sees its frames in capture
//! order with capture timestamps standing in for the wall clock.

use anyhow::{anyhow, bail, Context, Result};
use pcap_parser::traits::PcapReaderIterator;
use pcap_parser::{LegacyPcapReader, Linktype, PcapBlockOwned, PcapError};
use serde::Serialize;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::thread;
use tracing::{debug, info, warn};

use crate::classifier::{Outcome, SynGuard};
use crate::clock::Clock;
use crate::state::{CoreTable, CounterState};
use crate::verdict::Verdict;

const READER_BUFFER: usize = 65_536;

/// One captured frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub timestamp_secs: u32,
    pub data: Vec<u8>,
}

/// Read every frame of a legacy pcap file.
pub fn read_pcap(path: &Path) -> Result<Vec<Frame>> {
    let file = File::open(path).with_context(|| format!("Cannot open {:?}", path))?;
    read_pcap_from(BufReader::new(file))
}

/// Read every frame from a legacy pcap stream.
pub fn read_pcap_from<R: Read>(reader: R) -> Result<Vec<Frame>> {
    let mut reader =
        LegacyPcapReader::new(READER_BUFFER, reader).context("Not a valid legacy pcap file")?;
    let mut frames = Vec::new();

    loop {
        match reader.next() {
            Ok((offset, block)) => {
                let frame = match block {
                    PcapBlockOwned::LegacyHeader(ref header) => {
                        if header.network != Linktype::ETHERNET {
                            bail!(
                                "Unsupported link type {:?}, only Ethernet captures can be replayed",
                                header.network
                            );
                        }
                        None
                    }
                    PcapBlockOwned::Legacy(ref packet) => Some(Frame {
                        timestamp_secs: packet.ts_sec,
                        data: packet.data.to_vec(),
                    }),
                    PcapBlockOwned::NG(_) => {
                        warn!("pcapng block encountered - only legacy pcap supported");
                        None
                    }
                };
                drop(block);
                reader.consume(offset);

                if let Some(frame) = frame {
                    frames.push(frame);
                }
            }
            Err(PcapError::Eof) => break,
            Err(PcapError::Incomplete(_)) => {
                reader
                    .refill()
                    .map_err(|e| anyhow!("pcap refill error: {:?}", e))?;
            }
            Err(e) => return Err(anyhow!("pcap parse error: {:?}", e)),
        }
    }

    debug!(frames = frames.len(), "pcap loaded");
    Ok(frames)
}

/// Per-core replay totals
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CoreSummary {
    pub core: usize,
    pub frames: u64,
    pub syn_frames: u64,
    pub passed: u64,
    pub dropped: u64,
    pub active: bool,
    pub window_total: u64,
}

/// Replay results. Tallied by the driver; the classifier itself keeps no
/// counters besides its detection state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReplayReport {
    pub total_frames: u64,
    pub syn_frames: u64,
    pub unclassified_frames: u64,
    pub passed: u64,
    pub dropped: u64,
    pub cores: Vec<CoreSummary>,
}

impl ReplayReport {
    /// Calculate drop rate percentage
    pub fn drop_rate(&self) -> f64 {
        if self.total_frames == 0 {
            0.0
        } else {
            (self.dropped as f64 / self.total_frames as f64) * 100.0
        }
    }

    /// Calculate SYN frame percentage
    pub fn syn_percentage(&self) -> f64 {
        if self.total_frames == 0 {
            0.0
        } else {
            (self.syn_frames as f64 / self.total_frames as f64) * 100.0
        }
    }

    /// Cores that ended the replay in the flood state
    pub fn active_cores(&self) -> Vec<usize> {
        self.cores
            .iter()
            .filter(|core| core.active)
            .map(|core| core.core)
            .collect()
    }

    fn absorb(&mut self, core: CoreSummary, unclassified: u64) {
        self.total_frames += core.frames;
        self.syn_frames += core.syn_frames;
        self.unclassified_frames += unclassified;
        self.passed += core.passed;
        self.dropped += core.dropped;
        self.cores.push(core);
    }
}

/// How frames are assigned to cores
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sharding {
    /// Frame `i` goes to core `i % cores`
    RoundRobin,
    /// Every frame goes to one core
    Pinned(usize),
}

/// Replay `frames` across the cores of `table`.
pub fn replay<C>(
    guard: &SynGuard<C>,
    table: &mut CoreTable,
    frames: &[Frame],
    sharding: Sharding,
) -> Result<ReplayReport>
where
    C: Clock + Sync,
{
    let cores = table.len();
    if cores == 0 {
        bail!("Core table is empty");
    }
    if let Sharding::Pinned(core) = sharding {
        if core >= cores {
            bail!("Core {} out of range (table has {} cores)", core, cores);
        }
    }

    let mut shards: Vec<Vec<&Frame>> = vec![Vec::new(); cores];
    for (i, frame) in frames.iter().enumerate() {
        let core = match sharding {
            Sharding::RoundRobin => i % cores,
            Sharding::Pinned(core) => core,
        };
        shards[core].push(frame);
    }

    info!(frames = frames.len(), cores, ?sharding, "Replaying capture");

    let results: Vec<(CoreSummary, u64)> = thread::scope(|scope| {
        let handles: Vec<_> = table
            .slots_mut()
            .zip(shards.iter())
            .enumerate()
            .map(|(core, (state, shard))| scope.spawn(move || run_core(guard, core, state, shard)))
            .collect();

        handles
            .into_iter()
            .map(|handle| handle.join().map_err(|_| anyhow!("Replay worker panicked")))
            .collect::<Result<Vec<_>>>()
    })?;

    let mut report = ReplayReport::default();
    for (summary, unclassified) in results {
        report.absorb(summary, unclassified);
    }

    info!(
        total = report.total_frames,
        syn = report.syn_frames,
        dropped = report.dropped,
        "Replay finished"
    );
    Ok(report)
}

fn run_core<C: Clock>(
    guard: &SynGuard<C>,
    core: usize,
    state: &mut CounterState,
    shard: &[&Frame],
) -> (CoreSummary, u64) {
    let mut summary = CoreSummary {
        core,
        ..CoreSummary::default()
    };
    let mut unclassified = 0;

    for frame in shard {
        let decision = guard.decide_at(&frame.data, Some(&mut *state), frame.timestamp_secs);

        summary.frames += 1;
        if decision.outcome.is_syn() {
            summary.syn_frames += 1;
        }
        if matches!(decision.outcome, Outcome::Unclassified(_)) {
            unclassified += 1;
        }
        match decision.verdict {
            Verdict::Pass => summary.passed += 1,
            Verdict::Drop => summary.dropped += 1,
        }
    }

    summary.active = state.is_active();
    summary.window_total = state.window_total();
    debug!(core, frames = summary.frames, dropped = summary.dropped, "Core replay done");
    (summary, unclassified)
}
