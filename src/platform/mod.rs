// Platform-specific code module

pub mod elevation;
mod priority;
mod process_extras;
pub mod sysinfo_backend;

pub use elevation::{elevation_hint, is_elevated};
pub use sysinfo_backend::{SysinfoControl, SysinfoCounters, SysinfoOwnerQuery, SysinfoProcessSource};

use crate::core::process_monitor::{MonitorBackends, SystemCounters};

/// Backends for the host operating system.
///
/// A counter subsystem that fails to initialise is left out rather than
/// failing the whole monitor.
pub fn system_backends() -> MonitorBackends {
    let counters = match SysinfoCounters::new() {
        Ok(counters) => Some(Box::new(counters) as Box<dyn SystemCounters>),
        Err(e) => {
            log::warn!("Failed to initialise system counters: {}", e);
            None
        }
    };

    MonitorBackends {
        source: Box::new(SysinfoProcessSource::new()),
        counters,
        owner_query: Box::new(SysinfoOwnerQuery::new()),
        control: Box::new(SysinfoControl::new()),
    }
}
