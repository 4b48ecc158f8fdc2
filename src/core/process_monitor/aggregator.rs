use super::metrics::{ProcessRecord, SystemStats};
use super::probe::SystemCounters;

/// Combine per-process sums with OS-wide counters.
///
/// `counters` is `None` when the counter subsystem failed to initialise; the
/// global fields then stay at zero and the process-level sums are still
/// reported. Individual counter read failures degrade the same way.
pub fn aggregate(records: &[ProcessRecord], counters: Option<&mut dyn SystemCounters>) -> SystemStats {
    let mut stats = SystemStats {
        process_count: records.len(),
        ..Default::default()
    };

    for record in records {
        stats.thread_count += u64::from(record.thread_count);
        stats.handle_count += u64::from(record.handle_count);
        stats.total_memory_used_bytes = stats
            .total_memory_used_bytes
            .saturating_add(record.working_set_bytes);
    }

    let Some(counters) = counters else {
        return stats;
    };

    match counters.total_cpu_percent() {
        Ok(cpu) => stats.total_cpu_percent = cpu.clamp(0.0, 100.0),
        Err(e) => log::debug!("Total CPU counter unavailable: {}", e),
    }

    match counters.available_memory() {
        Ok(available) => stats.total_memory_available_bytes = available,
        Err(e) => log::debug!("Available memory counter unavailable: {}", e),
    }

    stats.total_physical_memory_bytes = counters.total_physical_memory().unwrap_or(0);

    stats
}
