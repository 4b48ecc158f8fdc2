//! Seams between the monitoring core and the operating system.
//!
//! The core never talks to the OS directly. Everything it needs is expressed
//! through the traits below; the platform layer provides sysinfo-backed
//! implementations and the tests provide in-memory ones.

use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};
use thiserror::Error;

use super::metrics::PriorityLevel;
use crate::error::Result;

/// Why a single field of a process could not be read.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FieldError {
    #[error("access denied")]
    AccessDenied,

    #[error("not supported on this platform")]
    Unsupported,

    #[error("process exited")]
    Exited,

    #[error("{0}")]
    Os(String),
}

pub type FieldResult<T> = std::result::Result<T, FieldError>;

/// Raw, unvalidated observation of one process.
#[derive(Debug, Clone)]
pub struct ProcessProbe {
    pub pid: u32,
    pub name: String,
    /// The process died between enumeration and inspection.
    pub exited: bool,
    /// Total CPU time consumed since the process started.
    pub cpu_time: FieldResult<Duration>,
    pub thread_count: FieldResult<u32>,
    pub handle_count: FieldResult<u32>,
    pub working_set: FieldResult<u64>,
    pub private_bytes: FieldResult<u64>,
    pub start_time: FieldResult<DateTime<Utc>>,
    /// `Ok(None)` means the process has no executable image (kernel threads).
    pub exe_path: FieldResult<Option<PathBuf>>,
    pub status: FieldResult<String>,
}

impl ProcessProbe {
    /// A probe where every field is unreadable.
    pub fn unreadable(pid: u32, name: impl Into<String>) -> Self {
        Self {
            pid,
            name: name.into(),
            exited: false,
            cpu_time: Err(FieldError::AccessDenied),
            thread_count: Err(FieldError::AccessDenied),
            handle_count: Err(FieldError::AccessDenied),
            working_set: Err(FieldError::AccessDenied),
            private_bytes: Err(FieldError::AccessDenied),
            start_time: Err(FieldError::AccessDenied),
            exe_path: Err(FieldError::AccessDenied),
            status: Err(FieldError::AccessDenied),
        }
    }
}

/// Process enumeration primitive.
pub trait ProcessSource: Send {
    /// Enumerate every live process.
    ///
    /// An `Err` entry means the process as a whole could not be inspected; it
    /// is excluded from the sample.
    fn enumerate(&mut self) -> Vec<Result<ProcessProbe>>;

    /// Inspect a single process. `None` if it does not exist.
    fn probe(&mut self, pid: u32) -> Option<ProcessProbe>;

    /// Number of logical processors, queried once.
    fn core_count(&self) -> usize;
}

/// OS-wide counters.
pub trait SystemCounters: Send {
    /// Instantaneous total CPU utilization in percent.
    fn total_cpu_percent(&mut self) -> Result<f64>;

    /// Currently available memory in bytes.
    fn available_memory(&mut self) -> Result<u64>;

    /// Installed physical memory in bytes. Cached by implementations.
    fn total_physical_memory(&self) -> Option<u64>;
}

/// Process ownership lookup. Expected to be slow.
pub trait OwnerQuery: Send {
    /// `Ok(None)` when the process exists but has no owning account.
    fn query_owner(&mut self, pid: u32) -> Result<Option<String>>;
}

/// Side-effecting process operations.
pub trait ProcessControl: Send {
    fn terminate(&mut self, pid: u32) -> Result<()>;

    fn set_priority(&mut self, pid: u32, level: PriorityLevel) -> Result<()>;
}
