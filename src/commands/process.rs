//! One-shot process commands: list, stats, detail, kill and priority.

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::ArgMatches;
use colored::*;

use crate::core::process_monitor::{evaluate_alerts, AlertConfig, PriorityLevel};
use crate::core::{MonitorConfig, ProcessMonitor};
use crate::ui;

/// A monitor that has already taken one sample.
///
/// CPU usage is a delta between two samples, so the first listing would
/// otherwise report zero for every process.
fn warmed_monitor() -> ProcessMonitor {
    let monitor = ProcessMonitor::new(MonitorConfig::default());
    monitor.list_processes();
    std::thread::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL);
    monitor
}

fn pid_arg(matches: &ArgMatches) -> Result<u32> {
    matches
        .get_one::<u32>("pid")
        .copied()
        .context("A process id is required")
}

pub fn list(matches: &ArgMatches) -> Result<()> {
    let top = matches.get_one::<usize>("top").copied();
    let monitor = warmed_monitor();

    let processes = monitor.list_processes();
    let alert_config = AlertConfig::from(monitor.config());

    ui::print_process_table(&processes, top, &alert_config, Utc::now());
    Ok(())
}

pub fn stats(matches: &ArgMatches) -> Result<()> {
    let show_alerts = matches.get_flag("alerts");
    let monitor = warmed_monitor();

    let snapshot = monitor.poll();
    ui::print_system_stats(&snapshot.stats, None);

    if !monitor.counters_available() {
        ui::warn("System counters unavailable, CPU and memory totals are zero");
    }

    if show_alerts {
        let alerts = evaluate_alerts(
            &snapshot.stats,
            &snapshot.processes,
            &AlertConfig::from(monitor.config()),
        );
        println!();
        if alerts.is_empty() {
            ui::success("No alerts");
        } else {
            ui::print_alerts(&alerts);
        }
    }

    Ok(())
}

pub fn detail(matches: &ArgMatches) -> Result<()> {
    let pid = pid_arg(matches)?;
    let monitor = warmed_monitor();

    match monitor.process_detail(pid) {
        Some(process) => {
            ui::print_process_detail(&process, Utc::now());
            Ok(())
        }
        None => bail!("No process with PID {}", pid),
    }
}

pub fn kill(matches: &ArgMatches) -> Result<()> {
    let pid = pid_arg(matches)?;
    let skip_confirm = matches.get_flag("yes");
    let monitor = ProcessMonitor::new(MonitorConfig::default());

    let Some(process) = monitor.process_detail(pid) else {
        bail!("No process with PID {}", pid);
    };

    if !skip_confirm {
        let prompt = format!("Terminate {} (PID {})? [y/N]", process.name, pid);
        if !ui::confirm(&prompt)? {
            ui::dimmed("Cancelled");
            return Ok(());
        }
    }

    if monitor.kill(pid) {
        ui::success(&format!("Terminated {} (PID {})", process.name, pid));
        Ok(())
    } else {
        bail!("Could not terminate PID {} (see log for details)", pid)
    }
}

pub fn priority(matches: &ArgMatches) -> Result<()> {
    let pid = pid_arg(matches)?;
    let level: PriorityLevel = matches
        .get_one::<String>("level")
        .context("A priority level is required")?
        .parse()?;

    let monitor = ProcessMonitor::new(MonitorConfig::default());
    if monitor.set_priority(pid, level) {
        println!(
            "{} {}",
            format!("PID {} priority set to", pid).green(),
            level.to_string().bold()
        );
        Ok(())
    } else {
        bail!("Could not set priority of PID {} to {}", pid, level)
    }
}
