use std::io;
use thiserror::Error;

/// Custom error type for the procwatch library
#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Process {0} not found")]
    ProcessNotFound(u32),

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Unsupported on this platform: {0}")]
    Unsupported(String),

    #[error("System counters unavailable: {0}")]
    CounterUnavailable(String),

    #[error("Process control failed: {0}")]
    Control(String),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for procwatch
pub type Result<T> = std::result::Result<T, MonitorError>;

impl MonitorError {
    pub fn access_denied<S: Into<String>>(msg: S) -> Self {
        MonitorError::AccessDenied(msg.into())
    }

    pub fn unsupported<S: Into<String>>(msg: S) -> Self {
        MonitorError::Unsupported(msg.into())
    }

    pub fn counter_unavailable<S: Into<String>>(msg: S) -> Self {
        MonitorError::CounterUnavailable(msg.into())
    }

    pub fn control<S: Into<String>>(msg: S) -> Self {
        MonitorError::Control(msg.into())
    }

    /// Create a generic error
    pub fn other<S: Into<String>>(msg: S) -> Self {
        MonitorError::Other(msg.into())
    }

    /// Map an OS error to the closest variant for a given process.
    pub fn from_os(pid: u32, err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => MonitorError::ProcessNotFound(pid),
            io::ErrorKind::PermissionDenied => {
                MonitorError::access_denied(format!("process {}: {}", pid, err))
            }
            _ => MonitorError::Io(err),
        }
    }
}
