use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::MonitorError;

/// Owner placeholder used until a detail lookup resolves it.
pub const OWNER_UNRESOLVED: &str = "-";
/// Owner reported for processes that have no owning account.
pub const OWNER_SYSTEM: &str = "SYSTEM";
/// Generic "could not be determined" sentinel.
pub const NOT_AVAILABLE: &str = "N/A";
/// File path sentinel when the image path is protected.
pub const PATH_ACCESS_DENIED: &str = "Access denied";
/// Status reported when the platform has nothing better.
pub const DEFAULT_STATUS: &str = "Running";

/// One process's observed state for a single sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessRecord {
    pub pid: u32,
    pub name: String,
    /// Core-normalized, always within `0.0..=100.0`.
    pub cpu_usage_percent: f64,
    pub working_set_bytes: u64,
    pub private_bytes: u64,
    pub thread_count: u32,
    pub handle_count: u32,
    /// `None` when the start time could not be read.
    pub start_time: Option<DateTime<Utc>>,
    pub file_path: String,
    pub owner: String,
    pub status: String,
}

impl ProcessRecord {
    /// A record with every optional field at its sentinel.
    pub fn new(pid: u32, name: impl Into<String>) -> Self {
        Self {
            pid,
            name: name.into(),
            cpu_usage_percent: 0.0,
            working_set_bytes: 0,
            private_bytes: 0,
            thread_count: 0,
            handle_count: 0,
            start_time: None,
            file_path: NOT_AVAILABLE.to_string(),
            owner: OWNER_UNRESOLVED.to_string(),
            status: DEFAULT_STATUS.to_string(),
        }
    }

    /// Time elapsed since the process started, if the start time is known.
    pub fn running_time(&self, now: DateTime<Utc>) -> Option<chrono::Duration> {
        let start = self.start_time?;
        let elapsed = now.signed_duration_since(start);
        (elapsed >= chrono::Duration::zero()).then_some(elapsed)
    }

    pub fn is_owner_resolved(&self) -> bool {
        self.owner != OWNER_UNRESOLVED
    }
}

/// How `SystemStats::memory_used_percent` was derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MemoryPercentSource {
    /// (physical - available) / physical
    Physical,
    /// Sum of working sets against available memory. Approximate.
    WorkingSetApproximation,
    /// Neither input was known.
    Unknown,
}

/// Aggregate snapshot of the whole system for one tick.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SystemStats {
    pub total_cpu_percent: f64,
    /// Sum of the sampled working sets.
    pub total_memory_used_bytes: u64,
    pub total_memory_available_bytes: u64,
    pub total_physical_memory_bytes: u64,
    pub process_count: usize,
    pub thread_count: u64,
    pub handle_count: u64,
}

impl SystemStats {
    /// Memory pressure in percent together with how it was computed.
    ///
    /// Prefers `(physical - available) / physical`. When physical memory is
    /// unknown it falls back to the working-set sum measured against available
    /// memory, which is only an approximation: shared pages are counted once per
    /// process and the denominator is not the machine's capacity.
    pub fn memory_used_percent_with_source(&self) -> (f64, MemoryPercentSource) {
        if self.total_physical_memory_bytes > 0 {
            let physical = self.total_physical_memory_bytes as f64;
            let used = self
                .total_physical_memory_bytes
                .saturating_sub(self.total_memory_available_bytes) as f64;
            return (used / physical * 100.0, MemoryPercentSource::Physical);
        }

        if self.total_memory_available_bytes > 0 {
            let approx = self.total_memory_used_bytes as f64
                / self.total_memory_available_bytes as f64
                * 100.0;
            return (
                approx.clamp(0.0, 100.0),
                MemoryPercentSource::WorkingSetApproximation,
            );
        }

        (0.0, MemoryPercentSource::Unknown)
    }

    pub fn memory_used_percent(&self) -> f64 {
        self.memory_used_percent_with_source().0
    }

    /// One-line status summary.
    pub fn summary(&self) -> String {
        format!(
            "Processes: {} | Threads: {} | Handles: {}",
            self.process_count, self.thread_count, self.handle_count
        )
    }
}

/// Scheduling priority that can be requested for a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PriorityLevel {
    Idle,
    BelowNormal,
    Normal,
    AboveNormal,
    High,
    Realtime,
}

impl PriorityLevel {
    pub const ALL: [PriorityLevel; 6] = [
        PriorityLevel::Idle,
        PriorityLevel::BelowNormal,
        PriorityLevel::Normal,
        PriorityLevel::AboveNormal,
        PriorityLevel::High,
        PriorityLevel::Realtime,
    ];

    /// Unix nice value for this level.
    pub fn nice_value(self) -> i32 {
        match self {
            PriorityLevel::Idle => 19,
            PriorityLevel::BelowNormal => 10,
            PriorityLevel::Normal => 0,
            PriorityLevel::AboveNormal => -5,
            PriorityLevel::High => -10,
            PriorityLevel::Realtime => -20,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PriorityLevel::Idle => "idle",
            PriorityLevel::BelowNormal => "below-normal",
            PriorityLevel::Normal => "normal",
            PriorityLevel::AboveNormal => "above-normal",
            PriorityLevel::High => "high",
            PriorityLevel::Realtime => "realtime",
        }
    }
}

impl fmt::Display for PriorityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for PriorityLevel {
    type Err = MonitorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .collect::<String>()
            .to_lowercase();

        match normalized.as_str() {
            "idle" | "low" => Ok(PriorityLevel::Idle),
            "belownormal" => Ok(PriorityLevel::BelowNormal),
            "normal" => Ok(PriorityLevel::Normal),
            "abovenormal" => Ok(PriorityLevel::AboveNormal),
            "high" => Ok(PriorityLevel::High),
            "realtime" => Ok(PriorityLevel::Realtime),
            _ => Err(MonitorError::other(format!(
                "unknown priority level '{}' (expected one of: idle, below-normal, normal, above-normal, high, realtime)",
                s
            ))),
        }
    }
}
