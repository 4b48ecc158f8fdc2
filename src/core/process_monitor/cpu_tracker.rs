//! Incremental per-process CPU usage estimation.
//!
//! The OS only reports cumulative processor time, so a usage percentage needs
//! two observations of the same process. The tracker keeps the previous
//! observation per pid and turns the delta into a core-normalized percentage.

use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};

/// Last observation for one pid.
#[derive(Debug, Clone, Copy)]
struct CpuSample {
    observed_at: Instant,
    cpu_time: Duration,
    start_time: Option<DateTime<Utc>>,
}

#[derive(Debug)]
pub struct CpuUsageTracker {
    samples: HashMap<u32, CpuSample>,
    core_count: usize,
}

impl CpuUsageTracker {
    pub fn new(core_count: usize) -> Self {
        Self {
            samples: HashMap::new(),
            core_count: core_count.max(1),
        }
    }

    pub fn core_count(&self) -> usize {
        self.core_count
    }

    /// Record an observation and return the usage since the previous one.
    ///
    /// Returns 0 for the first observation of a pid, for a non-positive wall
    /// clock delta, and when the pid looks reused (cumulative time went down or
    /// the start time changed). The baseline is overwritten in every case.
    pub fn update(
        &mut self,
        pid: u32,
        now: Instant,
        cpu_time: Duration,
        start_time: Option<DateTime<Utc>>,
    ) -> f64 {
        let current = CpuSample {
            observed_at: now,
            cpu_time,
            start_time,
        };

        let Some(previous) = self.samples.insert(pid, current) else {
            return 0.0;
        };

        if cpu_time < previous.cpu_time {
            log::trace!("pid {} cumulative cpu time went backwards, reseeding", pid);
            return 0.0;
        }

        if let (Some(before), Some(after)) = (previous.start_time, start_time) {
            if before != after {
                log::trace!("pid {} was reused by a new process, reseeding", pid);
                return 0.0;
            }
        }

        let wall_delta = now.saturating_duration_since(previous.observed_at);
        if wall_delta.is_zero() {
            return 0.0;
        }

        let cpu_delta = cpu_time - previous.cpu_time;
        let usage = cpu_delta.as_secs_f64() / wall_delta.as_secs_f64() * 100.0
            / self.core_count as f64;

        usage.clamp(0.0, 100.0)
    }

    /// Drop baselines for pids that are no longer alive.
    pub fn prune(&mut self, live: &HashSet<u32>) {
        self.samples.retain(|pid, _| live.contains(pid));
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    pub fn tracked(&self) -> usize {
        self.samples.len()
    }

    pub fn is_tracking(&self, pid: u32) -> bool {
        self.samples.contains_key(&pid)
    }
}
