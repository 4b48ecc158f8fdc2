use chrono::{DateTime, Utc};
use colored::*;

use super::formatters::{
    format_bytes, format_percent, format_running_time, format_start_time,
};
use crate::core::process_monitor::{
    Alert, AlertConfig, AlertSeverity, CpuLoad, MemoryPercentSource, MetricsHistory,
    ProcessRecord, SystemStats,
};

const NAME_WIDTH: usize = 28;

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut out: String = text.chars().take(width.saturating_sub(1)).collect();
    out.push('…');
    out
}

/// Color a row by how hard the process is loading the CPU.
fn paint(line: String, load: CpuLoad) -> ColoredString {
    match load {
        CpuLoad::High => line.red().bold(),
        CpuLoad::Elevated => line.yellow(),
        CpuLoad::Normal => line.normal(),
    }
}

pub fn print_process_table(
    processes: &[ProcessRecord],
    top: Option<usize>,
    config: &AlertConfig,
    now: DateTime<Utc>,
) {
    let header = format!(
        "{:>7}  {:<width$}  {:>6}  {:>10}  {:>10}  {:>7}  {:>7}  {:>8}  {}",
        "PID",
        "NAME",
        "CPU",
        "MEMORY",
        "PRIVATE",
        "THREADS",
        "HANDLES",
        "UPTIME",
        "STATUS",
        width = NAME_WIDTH
    );
    println!("{}", header.bold().bright_cyan());
    println!("{}", "-".repeat(header.len()));

    let limit = top.unwrap_or(processes.len());
    for process in processes.iter().take(limit) {
        let line = format!(
            "{:>7}  {:<width$}  {:>6}  {:>10}  {:>10}  {:>7}  {:>7}  {:>8}  {}",
            process.pid,
            truncate(&process.name, NAME_WIDTH),
            format_percent(process.cpu_usage_percent),
            format_bytes(process.working_set_bytes),
            format_bytes(process.private_bytes),
            process.thread_count,
            process.handle_count,
            format_running_time(process.running_time(now)),
            process.status,
            width = NAME_WIDTH
        );
        println!("{}", paint(line, CpuLoad::classify(process.cpu_usage_percent, config)));
    }

    if limit < processes.len() {
        println!(
            "{}",
            format!("... {} more processes", processes.len() - limit).dimmed()
        );
    }
}

pub fn print_system_stats(stats: &SystemStats, history: Option<&MetricsHistory>) {
    println!("\n{}", "SYSTEM".bold().bright_cyan());
    println!("{}", "=".repeat(60));

    println!(
        "  {:<18} {}",
        "CPU:".bold(),
        format_percent(stats.total_cpu_percent)
    );

    let (memory_percent, source) = stats.memory_used_percent_with_source();
    let note = match source {
        MemoryPercentSource::Physical => "",
        MemoryPercentSource::WorkingSetApproximation => " (approx. from working sets)",
        MemoryPercentSource::Unknown => " (unknown)",
    };
    println!(
        "  {:<18} {} used, {} available{}",
        "Memory:".bold(),
        format_bytes(stats.total_memory_used_bytes),
        format_bytes(stats.total_memory_available_bytes),
        format!(" ({}){}", format_percent(memory_percent), note).dimmed()
    );

    if stats.total_physical_memory_bytes > 0 {
        println!(
            "  {:<18} {}",
            "Physical memory:".bold(),
            format_bytes(stats.total_physical_memory_bytes)
        );
    }

    println!("  {}", stats.summary());

    if let Some(history) = history.filter(|h| !h.is_empty()) {
        let (average, peak) = history.cpu_average_and_peak();
        println!(
            "  {:<18} avg {} / peak {} over {} samples",
            "CPU history:".bold(),
            format_percent(average),
            format_percent(peak),
            history.len()
        );
    }
}

pub fn print_process_detail(process: &ProcessRecord, now: DateTime<Utc>) {
    println!(
        "\n{} {}",
        process.name.bold().bright_cyan(),
        format!("(PID {})", process.pid).dimmed()
    );
    println!("{}", "=".repeat(60));

    let rows = [
        ("Status", process.status.clone()),
        ("Owner", process.owner.clone()),
        ("CPU", format_percent(process.cpu_usage_percent)),
        ("Working set", format_bytes(process.working_set_bytes)),
        ("Private bytes", format_bytes(process.private_bytes)),
        ("Threads", process.thread_count.to_string()),
        ("Handles", process.handle_count.to_string()),
        ("Started", format_start_time(process.start_time)),
        ("Running for", format_running_time(process.running_time(now))),
        ("Path", process.file_path.clone()),
    ];

    for (label, value) in rows {
        println!("  {:<16} {}", format!("{}:", label).bold(), value);
    }
}

pub fn print_alerts(alerts: &[Alert]) {
    for alert in alerts {
        let line = format!("[{:?}] {}", alert.severity, alert.message);
        match alert.severity {
            AlertSeverity::Critical => println!("{}", line.red().bold()),
            AlertSeverity::Warning => println!("{}", line.yellow()),
            AlertSeverity::Info => println!("{}", line.dimmed()),
        }
    }
}
