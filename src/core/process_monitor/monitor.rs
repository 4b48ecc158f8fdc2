//! The single entry point callers use.
//!
//! `ProcessMonitor` owns the CPU tracker, the owner cache and the platform
//! backends behind one lock, so the periodic poll and on-demand detail lookups
//! never touch the shared maps at the same time.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use super::aggregator;
use super::controller;
use super::cpu_tracker::CpuUsageTracker;
use super::history::MetricsHistory;
use super::metrics::{PriorityLevel, ProcessRecord, SystemStats};
use super::owner::OwnerResolver;
use super::probe::{OwnerQuery, ProcessControl, ProcessSource, SystemCounters};
use super::sampler;
use crate::core::config::MonitorConfig;

/// The OS collaborators the monitor drives.
pub struct MonitorBackends {
    pub source: Box<dyn ProcessSource>,
    /// `None` when the counter subsystem could not be initialised.
    pub counters: Option<Box<dyn SystemCounters>>,
    pub owner_query: Box<dyn OwnerQuery>,
    pub control: Box<dyn ProcessControl>,
}

/// Processes and stats taken in the same poll.
#[derive(Debug, Clone)]
pub struct MonitorSnapshot {
    pub processes: Arc<[ProcessRecord]>,
    pub stats: SystemStats,
    pub taken_at: DateTime<Utc>,
}

impl Default for MonitorSnapshot {
    fn default() -> Self {
        Self {
            processes: Arc::from(Vec::new()),
            stats: SystemStats::default(),
            taken_at: Utc::now(),
        }
    }
}

struct MonitorState {
    backends: MonitorBackends,
    tracker: CpuUsageTracker,
    owners: OwnerResolver,
    history: MetricsHistory,
    latest: Option<Arc<[ProcessRecord]>>,
    sampled_at: Option<Instant>,
}

impl MonitorState {
    fn sample(&mut self, now: Instant) -> Arc<[ProcessRecord]> {
        let records = sampler::sample(self.backends.source.as_mut(), &mut self.tracker, now);

        let live: HashSet<u32> = records.iter().map(|r| r.pid).collect();
        self.tracker.prune(&live);
        self.owners.prune(&live);

        let records: Arc<[ProcessRecord]> = Arc::from(records);
        self.latest = Some(Arc::clone(&records));
        self.sampled_at = Some(now);
        records
    }

    /// The latest sample if it is younger than `max_age`.
    fn fresh_sample(&self, now: Instant, max_age: Duration) -> Option<Arc<[ProcessRecord]>> {
        let sampled_at = self.sampled_at?;
        if now.saturating_duration_since(sampled_at) >= max_age {
            return None;
        }
        self.latest.clone()
    }

    fn aggregate(&mut self, records: &[ProcessRecord]) -> SystemStats {
        match self.backends.counters.as_deref_mut() {
            Some(counters) => aggregator::aggregate(records, Some(counters)),
            None => aggregator::aggregate(records, None),
        }
    }
}

/// Releases the in-flight flag when a poll finishes, even on panic.
struct PollGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> PollGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for PollGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

pub struct ProcessMonitor {
    state: Mutex<MonitorState>,
    polling: AtomicBool,
    config: MonitorConfig,
}

impl ProcessMonitor {
    /// Create a monitor backed by the host operating system.
    pub fn new(config: MonitorConfig) -> Self {
        Self::with_backends(crate::platform::system_backends(), config)
    }

    pub fn with_backends(backends: MonitorBackends, config: MonitorConfig) -> Self {
        let config = config.validated();
        let core_count = backends.source.core_count();

        if backends.counters.is_none() {
            log::warn!("System counters unavailable, global CPU and memory will read as zero");
        }
        log::debug!("Process monitor initialised with {} logical cores", core_count);

        Self {
            state: Mutex::new(MonitorState {
                backends,
                tracker: CpuUsageTracker::new(core_count),
                owners: OwnerResolver::new(config.owner_cache_ttl),
                history: MetricsHistory::with_capacity(config.history_capacity),
                latest: None,
                sampled_at: None,
            }),
            polling: AtomicBool::new(false),
            config,
        }
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Sample every live process, highest CPU first. Owners are not resolved.
    pub fn list_processes(&self) -> Vec<ProcessRecord> {
        let mut state = self.state.lock();
        state.sample(Instant::now()).to_vec()
    }

    /// Aggregate stats over a process sample at most one refresh interval old.
    ///
    /// Reuses the latest sample while it is fresh, so calling this right after
    /// `list_processes` does not advance the CPU tracker twice in one tick.
    pub fn system_stats(&self) -> SystemStats {
        let mut state = self.state.lock();
        let now = Instant::now();
        let records = match state.fresh_sample(now, self.config.refresh_interval) {
            Some(records) => records,
            None => state.sample(now),
        };
        state.aggregate(&records)
    }

    /// One process with its owner resolved. `None` if it no longer exists.
    pub fn process_detail(&self, pid: u32) -> Option<ProcessRecord> {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        controller::detail(
            state.backends.source.as_mut(),
            &mut state.tracker,
            &mut state.owners,
            state.backends.owner_query.as_mut(),
            pid,
            Instant::now(),
        )
    }

    pub fn kill(&self, pid: u32) -> bool {
        let mut state = self.state.lock();
        controller::terminate(state.backends.control.as_mut(), pid)
    }

    pub fn set_priority(&self, pid: u32, level: PriorityLevel) -> bool {
        let mut state = self.state.lock();
        controller::set_priority(state.backends.control.as_mut(), pid, level)
    }

    /// Sample and aggregate under one lock.
    pub fn poll(&self) -> MonitorSnapshot {
        let mut state = self.state.lock();
        let processes = state.sample(Instant::now());
        let stats = state.aggregate(&processes);
        state.history.record(&stats);

        MonitorSnapshot {
            processes,
            stats,
            taken_at: Utc::now(),
        }
    }

    /// Like `poll`, but returns `None` instead of waiting when another poll
    /// started through this method is still running.
    pub fn try_poll(&self) -> Option<MonitorSnapshot> {
        let Some(_guard) = PollGuard::acquire(&self.polling) else {
            log::debug!("Previous poll still running, skipping this tick");
            return None;
        };
        Some(self.poll())
    }

    pub fn is_polling(&self) -> bool {
        self.polling.load(Ordering::Acquire)
    }

    /// Copy of the CPU/memory history recorded by `poll`.
    pub fn history(&self) -> MetricsHistory {
        self.state.lock().history.clone()
    }

    pub fn counters_available(&self) -> bool {
        self.state.lock().backends.counters.is_some()
    }

    /// Release the counter subsystem and forget all per-process state.
    ///
    /// The monitor keeps working afterwards, with global stats at zero.
    pub fn dispose(&self) {
        let mut state = self.state.lock();
        if state.backends.counters.take().is_some() {
            log::debug!("System counters released");
        }
        state.tracker.clear();
        state.owners.clear();
        state.history.clear();
        state.latest = None;
        state.sampled_at = None;
    }
}
