// Core business logic module

pub mod config;
pub mod process_monitor;

// Re-export commonly used items
pub use config::MonitorConfig;
pub use process_monitor::{MonitorRuntime, MonitorSnapshot, ProcessMonitor};
