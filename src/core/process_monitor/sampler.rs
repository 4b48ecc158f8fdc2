//! Bulk process enumeration.
//!
//! Turns raw probes into `ProcessRecord`s. Each field is read independently and
//! a failed read only costs that field its value.

use std::collections::HashSet;
use std::time::Instant;

use super::cpu_tracker::CpuUsageTracker;
use super::metrics::{
    ProcessRecord, DEFAULT_STATUS, NOT_AVAILABLE, OWNER_UNRESOLVED, PATH_ACCESS_DENIED,
};
use super::probe::{FieldError, FieldResult, ProcessProbe, ProcessSource};

/// Enumerate every live process and build one record per pid.
///
/// Output is sorted by CPU usage, highest first. Owners are left unresolved.
pub fn sample(
    source: &mut dyn ProcessSource,
    tracker: &mut CpuUsageTracker,
    now: Instant,
) -> Vec<ProcessRecord> {
    let mut seen = HashSet::new();
    let mut records = Vec::new();

    for entry in source.enumerate() {
        let probe = match entry {
            Ok(probe) => probe,
            Err(e) => {
                // Protected processes land here; this is expected.
                log::debug!("Skipping inaccessible process: {}", e);
                continue;
            }
        };

        if probe.exited {
            continue;
        }

        if !seen.insert(probe.pid) {
            log::trace!("Duplicate pid {} in enumeration, keeping first", probe.pid);
            continue;
        }

        records.push(build_record(probe, tracker, now));
    }

    sort_by_cpu(&mut records);
    records
}

/// Assemble a record from a probe, substituting sentinels for unreadable fields.
pub fn build_record(probe: ProcessProbe, tracker: &mut CpuUsageTracker, now: Instant) -> ProcessRecord {
    let pid = probe.pid;
    let start_time = probe.start_time.ok();

    let cpu_usage_percent = match probe.cpu_time {
        Ok(cpu_time) => tracker.update(pid, now, cpu_time, start_time),
        Err(e) => {
            log::trace!("pid {}: cpu time unavailable ({})", pid, e);
            0.0
        }
    };

    ProcessRecord {
        pid,
        name: probe.name,
        cpu_usage_percent,
        working_set_bytes: or_default(pid, "working set", probe.working_set),
        private_bytes: or_default(pid, "private bytes", probe.private_bytes),
        thread_count: or_default(pid, "thread count", probe.thread_count),
        handle_count: or_default(pid, "handle count", probe.handle_count),
        start_time,
        file_path: file_path_or_sentinel(probe.exe_path),
        owner: OWNER_UNRESOLVED.to_string(),
        status: probe.status.unwrap_or_else(|_| DEFAULT_STATUS.to_string()),
    }
}

/// Descending by CPU. Stable, so ties keep enumeration order.
pub fn sort_by_cpu(records: &mut [ProcessRecord]) {
    records.sort_by(|a, b| b.cpu_usage_percent.total_cmp(&a.cpu_usage_percent));
}

fn or_default<T: Default>(pid: u32, field: &str, value: FieldResult<T>) -> T {
    value.unwrap_or_else(|e| {
        if e != FieldError::Unsupported {
            log::trace!("pid {}: {} unavailable ({})", pid, field, e);
        }
        T::default()
    })
}

fn file_path_or_sentinel(path: FieldResult<Option<std::path::PathBuf>>) -> String {
    match path {
        Ok(Some(path)) => path.display().to_string(),
        Ok(None) | Err(FieldError::Unsupported) => NOT_AVAILABLE.to_string(),
        Err(_) => PATH_ACCESS_DENIED.to_string(),
    }
}
