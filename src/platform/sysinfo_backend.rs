//! sysinfo-backed implementations of the monitor's OS seams.

use std::time::Duration;

use chrono::{DateTime, Utc};
use sysinfo::{
    CpuRefreshKind, MemoryRefreshKind, Pid, Process, ProcessRefreshKind, ProcessStatus,
    ProcessesToUpdate, RefreshKind, System, ThreadKind, UpdateKind, Users,
};

use super::process_extras::{read_extras, ThreadCounts};
use crate::core::process_monitor::{
    FieldError, OwnerQuery, PriorityLevel, ProcessControl, ProcessProbe, ProcessSource,
    SystemCounters,
};
use crate::error::{MonitorError, Result};

fn probe_refresh_kind() -> ProcessRefreshKind {
    ProcessRefreshKind::nothing()
        .with_cpu()
        .with_memory()
        .with_exe(UpdateKind::OnlyIfNotSet)
}

fn refresh_one(system: &mut System, pid: Pid, kind: ProcessRefreshKind) {
    system.refresh_processes_specifics(ProcessesToUpdate::Some(&[pid]), true, kind);
}

fn is_userland_thread(process: &Process) -> bool {
    matches!(process.thread_kind(), Some(ThreadKind::Userland))
}

fn has_exited(process: &Process) -> bool {
    matches!(process.status(), ProcessStatus::Dead | ProcessStatus::Zombie)
}

/// Refresh `pid` and return it, unless it is gone or only a zombie is left.
fn live_process(system: &mut System, pid: u32) -> Result<&Process> {
    let spid = Pid::from_u32(pid);
    refresh_one(system, spid, ProcessRefreshKind::nothing());

    match system.process(spid) {
        Some(process) if !has_exited(process) => Ok(process),
        _ => Err(MonitorError::ProcessNotFound(pid)),
    }
}

fn to_probe(process: &Process, threads: &ThreadCounts) -> ProcessProbe {
    let pid = process.pid().as_u32();
    let extras = read_extras(pid, threads);

    let start_time = match process.start_time() {
        0 => Err(FieldError::AccessDenied),
        secs => DateTime::<Utc>::from_timestamp(secs as i64, 0).ok_or(FieldError::Unsupported),
    };

    let exe_path = match process.exe() {
        Some(path) => Ok(Some(path.to_path_buf())),
        // Kernel threads have no image; anything else was hidden from us
        None if matches!(process.thread_kind(), Some(ThreadKind::Kernel)) => Ok(None),
        None => Err(FieldError::AccessDenied),
    };

    ProcessProbe {
        pid,
        name: process.name().to_string_lossy().into_owned(),
        exited: has_exited(process),
        cpu_time: Ok(Duration::from_millis(process.accumulated_cpu_time())),
        thread_count: extras.thread_count,
        handle_count: extras.handle_count,
        working_set: Ok(process.memory()),
        private_bytes: extras.private_bytes,
        start_time,
        exe_path,
        status: Ok(process.status().to_string()),
    }
}

/// Process enumeration through sysinfo.
pub struct SysinfoProcessSource {
    system: System,
    core_count: usize,
}

impl SysinfoProcessSource {
    pub fn new() -> Self {
        let system = System::new_with_specifics(
            RefreshKind::nothing().with_cpu(CpuRefreshKind::nothing()),
        );

        // Cache static values (don't change during runtime)
        let core_count = match system.cpus().len() {
            0 => std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            n => n,
        };

        Self { system, core_count }
    }
}

impl Default for SysinfoProcessSource {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessSource for SysinfoProcessSource {
    fn enumerate(&mut self) -> Vec<Result<ProcessProbe>> {
        self.system
            .refresh_processes_specifics(ProcessesToUpdate::All, true, probe_refresh_kind());
        let threads = ThreadCounts::capture();

        self.system
            .processes()
            .values()
            .filter(|p| !is_userland_thread(p))
            .map(|p| Ok(to_probe(p, &threads)))
            .collect()
    }

    fn probe(&mut self, pid: u32) -> Option<ProcessProbe> {
        let pid = Pid::from_u32(pid);
        refresh_one(&mut self.system, pid, probe_refresh_kind());
        let threads = ThreadCounts::capture();
        self.system.process(pid).map(|p| to_probe(p, &threads))
    }

    fn core_count(&self) -> usize {
        self.core_count
    }
}

/// Global CPU and memory counters.
pub struct SysinfoCounters {
    system: System,
    total_memory: u64,
}

impl SysinfoCounters {
    pub fn new() -> Result<Self> {
        if !sysinfo::IS_SUPPORTED_SYSTEM {
            return Err(MonitorError::counter_unavailable(
                "sysinfo does not support this operating system",
            ));
        }

        let system = System::new_with_specifics(
            RefreshKind::nothing()
                .with_cpu(CpuRefreshKind::nothing().with_cpu_usage())
                .with_memory(MemoryRefreshKind::nothing().with_ram()),
        );

        if system.cpus().is_empty() {
            return Err(MonitorError::counter_unavailable("no processors reported"));
        }

        // Physical memory is queried once
        let total_memory = system.total_memory();

        Ok(Self {
            system,
            total_memory,
        })
    }
}

impl SystemCounters for SysinfoCounters {
    fn total_cpu_percent(&mut self) -> Result<f64> {
        self.system.refresh_cpu_usage();
        Ok(f64::from(self.system.global_cpu_usage()))
    }

    fn available_memory(&mut self) -> Result<u64> {
        self.system
            .refresh_memory_specifics(MemoryRefreshKind::nothing().with_ram());
        Ok(self.system.available_memory())
    }

    fn total_physical_memory(&self) -> Option<u64> {
        (self.total_memory > 0).then_some(self.total_memory)
    }
}

/// Owner lookup through the process's user id and the account database.
pub struct SysinfoOwnerQuery {
    system: System,
}

impl SysinfoOwnerQuery {
    pub fn new() -> Self {
        Self {
            system: System::new(),
        }
    }
}

impl Default for SysinfoOwnerQuery {
    fn default() -> Self {
        Self::new()
    }
}

impl OwnerQuery for SysinfoOwnerQuery {
    fn query_owner(&mut self, pid: u32) -> Result<Option<String>> {
        let spid = Pid::from_u32(pid);
        refresh_one(
            &mut self.system,
            spid,
            ProcessRefreshKind::nothing().with_user(UpdateKind::Always),
        );

        let process = self
            .system
            .process(spid)
            .ok_or(MonitorError::ProcessNotFound(pid))?;

        let Some(uid) = process.user_id() else {
            return Ok(None);
        };

        // The account list can change between lookups, so it is read fresh
        let users = Users::new_with_refreshed_list();
        users
            .get_user_by_id(uid)
            .map(|user| Some(user.name().to_string()))
            .ok_or_else(|| MonitorError::other(format!("no account found for owner of process {}", pid)))
    }
}

/// Terminate through sysinfo, priorities through the native API.
pub struct SysinfoControl {
    system: System,
}

impl SysinfoControl {
    pub fn new() -> Self {
        Self {
            system: System::new(),
        }
    }
}

impl Default for SysinfoControl {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessControl for SysinfoControl {
    fn terminate(&mut self, pid: u32) -> Result<()> {
        let process = live_process(&mut self.system, pid)?;

        if process.kill() {
            Ok(())
        } else {
            Err(MonitorError::control(format!(
                "kill request for process {} was rejected",
                pid
            )))
        }
    }

    fn set_priority(&mut self, pid: u32, level: PriorityLevel) -> Result<()> {
        live_process(&mut self.system, pid)?;
        super::priority::set_priority(pid, level)
    }
}
