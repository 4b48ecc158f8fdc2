use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tunables for the process monitor.
///
/// Built in memory (usually from CLI flags); never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Time between two polls of the periodic worker.
    pub refresh_interval: Duration,
    /// How long a resolved process owner stays valid.
    pub owner_cache_ttl: Duration,
    /// Number of points kept in the CPU/memory history.
    pub history_capacity: usize,
    /// Per-process CPU% above which a process counts as elevated.
    pub cpu_elevated_threshold: f64,
    /// Per-process CPU% above which a process counts as high.
    pub cpu_high_threshold: f64,
    /// Total CPU% alert levels.
    pub cpu_warning: f64,
    pub cpu_critical: f64,
    pub memory_warning: f64,
    pub memory_critical: f64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            refresh_interval: Duration::from_millis(2000),
            owner_cache_ttl: Duration::from_secs(30),
            history_capacity: 60,
            cpu_elevated_threshold: 25.0,
            cpu_high_threshold: 50.0,
            cpu_warning: 75.0,
            cpu_critical: 90.0,
            memory_warning: 80.0,
            memory_critical: 95.0,
        }
    }
}

impl MonitorConfig {
    pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = interval;
        self
    }

    pub fn with_owner_cache_ttl(mut self, ttl: Duration) -> Self {
        self.owner_cache_ttl = ttl;
        self
    }

    pub fn with_history_capacity(mut self, capacity: usize) -> Self {
        self.history_capacity = capacity;
        self
    }

    /// Clamp values into ranges the monitor can actually honour.
    ///
    /// CPU usage needs some wall-clock time between two samples, so the refresh
    /// interval never drops below sysinfo's minimum update interval.
    pub fn validated(mut self) -> Self {
        self.refresh_interval = self
            .refresh_interval
            .max(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL);
        self.history_capacity = self.history_capacity.max(1);
        if self.cpu_elevated_threshold > self.cpu_high_threshold {
            std::mem::swap(&mut self.cpu_elevated_threshold, &mut self.cpu_high_threshold);
        }
        if self.cpu_warning > self.cpu_critical {
            std::mem::swap(&mut self.cpu_warning, &mut self.cpu_critical);
        }
        if self.memory_warning > self.memory_critical {
            std::mem::swap(&mut self.memory_warning, &mut self.memory_critical);
        }
        self
    }
}
