//! Interval-counter source: cumulative per-interface byte counters sampled
//! twice per round, diffed into deltas and a bytes-per-second rate.
//!
//! Both snapshots of a round come from the same enumeration; an interface
//! present in only one snapshot (hot-plug during the sleep) is excluded from
//! that round rather than producing a garbage delta.

use super::CounterObservation;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use sysinfo::Networks;

/// Cumulative {bytes_sent, bytes_recv} per interface at one instant.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CounterSnapshot {
    totals: BTreeMap<String, (u64, u64)>,
}

impl CounterSnapshot {
    pub fn from_totals(totals: BTreeMap<String, (u64, u64)>) -> Self {
        Self { totals }
    }
}

pub struct CounterSampler {
    networks: Networks,
    /// Explicit interface filter; empty monitors everything enumerated
    interfaces: Vec<String>,
    interval_secs: u64,
}

impl CounterSampler {
    pub fn new(interval_secs: u64, interfaces: Vec<String>) -> Self {
        Self {
            networks: Networks::new_with_refreshed_list(),
            interfaces,
            // Config clamps this already; the rate division depends on it
            interval_secs: interval_secs.max(1),
        }
    }

    pub fn interval_secs(&self) -> u64 {
        self.interval_secs
    }

    /// Take a snapshot of cumulative counters for the monitored interfaces.
    pub fn snapshot(&mut self) -> CounterSnapshot {
        self.networks.refresh();
        let mut totals = BTreeMap::new();
        for (name, data) in self.networks.iter() {
            if !self.interfaces.is_empty() && !self.interfaces.iter().any(|i| i == name) {
                continue;
            }
            totals.insert(
                name.clone(),
                (data.total_transmitted(), data.total_received()),
            );
        }
        CounterSnapshot { totals }
    }

    /// Diff two snapshots taken `interval_secs` apart. Pure; counter resets
    /// saturate to zero instead of wrapping.
    pub fn diff(
        initial: &CounterSnapshot,
        last: &CounterSnapshot,
        interval_secs: u64,
    ) -> Vec<CounterObservation> {
        let interval_secs = interval_secs.max(1);
        let ts = Utc::now();
        let mut observations = Vec::new();
        for (interface, (sent0, recv0)) in &initial.totals {
            let Some((sent1, recv1)) = last.totals.get(interface) else {
                tracing::debug!(interface, "interface vanished mid-round, excluded");
                continue;
            };
            let bytes_sent_delta = sent1.saturating_sub(*sent0);
            let bytes_recv_delta = recv1.saturating_sub(*recv0);
            let total_delta = bytes_sent_delta + bytes_recv_delta;
            observations.push(CounterObservation {
                interface: interface.clone(),
                bytes_sent_delta,
                bytes_recv_delta,
                total_delta,
                rate_per_second: total_delta as f64 / interval_secs as f64,
                ts,
            });
        }
        observations
    }

    /// One sampling round: snapshot, stop-aware sleep, snapshot, diff.
    /// Returns an empty round when interrupted during the sleep.
    pub fn sample_round(&mut self, stop: &AtomicBool) -> Vec<CounterObservation> {
        let initial = self.snapshot();
        for _ in 0..self.interval_secs {
            if stop.load(Ordering::Relaxed) {
                return Vec::new();
            }
            std::thread::sleep(Duration::from_secs(1));
        }
        let last = self.snapshot();
        Self::diff(&initial, &last, self.interval_secs)
    }
}
