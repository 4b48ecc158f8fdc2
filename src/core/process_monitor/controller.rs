//! Single-process operations: terminate, change priority, detail lookup.
//!
//! Failures are reported as `false` / `None`. The reason is only logged, so a
//! caller cannot tell "already gone" from "not allowed".

use std::time::Instant;

use super::cpu_tracker::CpuUsageTracker;
use super::metrics::{PriorityLevel, ProcessRecord};
use super::owner::OwnerResolver;
use super::probe::{OwnerQuery, ProcessControl, ProcessSource};
use super::sampler;

pub fn terminate(control: &mut dyn ProcessControl, pid: u32) -> bool {
    match control.terminate(pid) {
        Ok(()) => {
            log::info!("Terminated process {}", pid);
            true
        }
        Err(e) => {
            log::warn!("Failed to terminate process {}: {}", pid, e);
            false
        }
    }
}

pub fn set_priority(control: &mut dyn ProcessControl, pid: u32, level: PriorityLevel) -> bool {
    match control.set_priority(pid, level) {
        Ok(()) => {
            log::info!("Set priority of process {} to {}", pid, level);
            true
        }
        Err(e) => {
            log::warn!("Failed to set priority of process {} to {}: {}", pid, level, e);
            false
        }
    }
}

/// Like a one-process sample, but with the owner resolved.
pub fn detail(
    source: &mut dyn ProcessSource,
    tracker: &mut CpuUsageTracker,
    owners: &mut OwnerResolver,
    owner_query: &mut dyn OwnerQuery,
    pid: u32,
    now: Instant,
) -> Option<ProcessRecord> {
    let probe = source.probe(pid)?;
    if probe.exited {
        return None;
    }

    let mut record = sampler::build_record(probe, tracker, now);
    record.owner = owners.resolve(pid, now, owner_query);
    Some(record)
}
