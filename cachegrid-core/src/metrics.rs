//! Runtime counters for the cache grid.
//!
//! Lightweight `AtomicU64` counters incremented on the hot path and read on
//! export. `to_prometheus` renders them in the text exposition format for a
//! server dashboard.

use std::sync::atomic::{AtomicU64, Ordering};

/// Atomic counters for session events.
#[derive(Debug)]
pub struct GridCounters {
    /// Caches generated from the oracle.
    pub caches_created: AtomicU64,
    /// Viewport regeneration passes.
    pub regenerations: AtomicU64,
    /// Successful collects.
    pub collects: AtomicU64,
    /// Successful deposits.
    pub deposits: AtomicU64,
    /// Snapshots written.
    pub saves_completed: AtomicU64,
    /// Snapshot writes that failed.
    pub save_failures: AtomicU64,
    /// Snapshots read and applied.
    pub loads_completed: AtomicU64,
    /// Stored snapshots discarded as malformed.
    pub malformed_snapshots: AtomicU64,
    /// Resets performed.
    pub resets: AtomicU64,
    /// Unusable durable stores replaced at startup.
    pub store_recoveries: AtomicU64,
}

impl GridCounters {
    /// Create a new set of zeroed counters.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            caches_created: AtomicU64::new(0),
            regenerations: AtomicU64::new(0),
            collects: AtomicU64::new(0),
            deposits: AtomicU64::new(0),
            saves_completed: AtomicU64::new(0),
            save_failures: AtomicU64::new(0),
            loads_completed: AtomicU64::new(0),
            malformed_snapshots: AtomicU64::new(0),
            resets: AtomicU64::new(0),
            store_recoveries: AtomicU64::new(0),
        }
    }

    /// Add `n` to `counter`.
    pub fn add(counter: &AtomicU64, n: u64) {
        counter.fetch_add(n, Ordering::Relaxed);
    }

    /// Increment `counter` by one.
    pub fn incr(counter: &AtomicU64) {
        Self::add(counter, 1);
    }

    /// Snapshot all counters for export.
    #[must_use]
    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            caches_created: self.caches_created.load(Ordering::Relaxed),
            regenerations: self.regenerations.load(Ordering::Relaxed),
            collects: self.collects.load(Ordering::Relaxed),
            deposits: self.deposits.load(Ordering::Relaxed),
            saves_completed: self.saves_completed.load(Ordering::Relaxed),
            save_failures: self.save_failures.load(Ordering::Relaxed),
            loads_completed: self.loads_completed.load(Ordering::Relaxed),
            malformed_snapshots: self.malformed_snapshots.load(Ordering::Relaxed),
            resets: self.resets.load(Ordering::Relaxed),
            store_recoveries: self.store_recoveries.load(Ordering::Relaxed),
        }
    }
}

impl Default for GridCounters {
    fn default() -> Self {
        Self::new()
    }
}

/// Counter values at a point in time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CounterSnapshot {
    /// Caches generated.
    pub caches_created: u64,
    /// Regeneration passes.
    pub regenerations: u64,
    /// Successful collects.
    pub collects: u64,
    /// Successful deposits.
    pub deposits: u64,
    /// Snapshots written.
    pub saves_completed: u64,
    /// Failed snapshot writes.
    pub save_failures: u64,
    /// Snapshots applied.
    pub loads_completed: u64,
    /// Malformed snapshots discarded.
    pub malformed_snapshots: u64,
    /// Resets performed.
    pub resets: u64,
    /// Durable stores replaced at startup.
    pub store_recoveries: u64,
}

impl CounterSnapshot {
    /// Format as Prometheus-compatible text.
    #[must_use]
    pub fn to_prometheus(&self) -> String {
        let rows: [(&str, &str, u64); 10] = [
            ("caches_created", "Caches generated from the oracle", self.caches_created),
            ("regenerations", "Viewport regeneration passes", self.regenerations),
            ("collects", "Tokens collected from caches", self.collects),
            ("deposits", "Tokens deposited into caches", self.deposits),
            ("saves_completed", "Snapshots written", self.saves_completed),
            ("save_failures", "Snapshot writes that failed", self.save_failures),
            ("loads_completed", "Snapshots loaded", self.loads_completed),
            ("malformed_snapshots", "Malformed snapshots discarded", self.malformed_snapshots),
            ("resets", "Session resets", self.resets),
            ("store_recoveries", "Unusable durable stores replaced", self.store_recoveries),
        ];
        rows.iter()
            .map(|(name, help, value)| {
                format!(
                    "# HELP cachegrid_{name}_total {help}\n\
                     # TYPE cachegrid_{name}_total counter\n\
                     cachegrid_{name}_total {value}\n"
                )
            })
            .collect()
    }
}
