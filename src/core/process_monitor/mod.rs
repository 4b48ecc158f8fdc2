//! Process monitoring core.
//!
//! Samples running processes and system-wide counters on a fixed cadence and
//! turns failure-prone OS queries into stable snapshots.

pub mod aggregator;
pub mod alerts;
pub mod controller;
mod cpu_tracker;
mod history;
mod metrics;
mod monitor;
mod owner;
mod probe;
mod runtime;
pub mod sampler;

pub use alerts::{evaluate_alerts, Alert, AlertCategory, AlertConfig, AlertSeverity, CpuLoad};
pub use cpu_tracker::CpuUsageTracker;
pub use history::{MetricsHistory, DEFAULT_HISTORY_SIZE};
pub use metrics::{
    MemoryPercentSource, PriorityLevel, ProcessRecord, SystemStats, DEFAULT_STATUS,
    NOT_AVAILABLE, OWNER_SYSTEM, OWNER_UNRESOLVED, PATH_ACCESS_DENIED,
};
pub use monitor::{MonitorBackends, MonitorSnapshot, ProcessMonitor};
pub use owner::{OwnerResolver, DEFAULT_OWNER_TTL};
pub use probe::{
    FieldError, FieldResult, OwnerQuery, ProcessControl, ProcessProbe, ProcessSource,
    SystemCounters,
};
pub use runtime::{poll_task, MonitorRuntime};
