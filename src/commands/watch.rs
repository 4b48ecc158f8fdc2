//! Live process view refreshed by the background monitor runtime.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::ArgMatches;
use colored::*;

use crate::core::process_monitor::{evaluate_alerts, AlertConfig, MetricsHistory, MonitorSnapshot};
use crate::core::{MonitorConfig, MonitorRuntime, ProcessMonitor};
use crate::ui;

const REDRAW_POLL: Duration = Duration::from_millis(100);

pub fn execute(matches: &ArgMatches) -> Result<()> {
    let interval = matches.get_one::<u64>("interval").copied().unwrap_or(2000);
    let top = matches.get_one::<usize>("top").copied().unwrap_or(20);

    let config = MonitorConfig::default().with_refresh_interval(Duration::from_millis(interval));
    let monitor = Arc::new(ProcessMonitor::new(config));
    let alert_config = AlertConfig::from(monitor.config());

    let running = Arc::new(AtomicBool::new(true));
    let running_clone = running.clone();

    // Setup Ctrl+C handler
    ctrlc::set_handler(move || {
        running_clone.store(false, Ordering::Relaxed);
    })
    .map_err(|e| anyhow::anyhow!("Failed to set Ctrl+C handler: {}", e))?;

    let runtime = MonitorRuntime::new(monitor).context("Failed to start process monitor")?;
    let mut snapshots = runtime.subscribe();

    println!("{}", "Collecting first sample...".dimmed());

    while running.load(Ordering::Relaxed) {
        if !snapshots.has_changed().unwrap_or(false) {
            std::thread::sleep(REDRAW_POLL);
            continue;
        }

        let snapshot = Arc::clone(&*snapshots.borrow_and_update());
        let history = runtime.monitor().history();
        draw(&snapshot, &history, top, &alert_config)?;
    }

    println!();
    println!("{}", "Stopping monitor...".yellow());
    if runtime.skipped_ticks() > 0 {
        log::info!("{} ticks skipped while a poll was running", runtime.skipped_ticks());
    }
    runtime.shutdown();

    Ok(())
}

fn draw(
    snapshot: &MonitorSnapshot,
    history: &MetricsHistory,
    top: usize,
    alert_config: &AlertConfig,
) -> Result<()> {
    ui::clear_screen()?;

    println!(
        "{} {}",
        "procwatch".bold().bright_cyan(),
        format!(
            "updated {} | Ctrl+C to quit",
            snapshot.taken_at.with_timezone(&chrono::Local).format("%H:%M:%S")
        )
        .dimmed()
    );

    ui::print_system_stats(&snapshot.stats, Some(history));
    println!();
    ui::print_process_table(&snapshot.processes, Some(top), alert_config, snapshot.taken_at);

    let alerts = evaluate_alerts(&snapshot.stats, &snapshot.processes, alert_config);
    if !alerts.is_empty() {
        println!();
        ui::print_alerts(&alerts);
    }

    Ok(())
}
