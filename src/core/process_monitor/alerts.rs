//! Threshold checks over a finished snapshot.
//!
//! Evaluates system stats and per-process CPU against configurable thresholds.

use serde::{Deserialize, Serialize};

use super::metrics::{ProcessRecord, SystemStats};
use crate::core::config::MonitorConfig;

/// Alert configuration with thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertConfig {
    pub cpu_warning: f64,             // Total CPU (%)
    pub cpu_critical: f64,            // Total CPU (%)
    pub memory_warning: f64,          // Memory used (%)
    pub memory_critical: f64,         // Memory used (%)
    pub process_cpu_elevated: f64,    // Single process (%)
    pub process_cpu_high: f64,        // Single process (%)
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self::from(&MonitorConfig::default())
    }
}

impl From<&MonitorConfig> for AlertConfig {
    fn from(config: &MonitorConfig) -> Self {
        Self {
            cpu_warning: config.cpu_warning,
            cpu_critical: config.cpu_critical,
            memory_warning: config.memory_warning,
            memory_critical: config.memory_critical,
            process_cpu_elevated: config.cpu_elevated_threshold,
            process_cpu_high: config.cpu_high_threshold,
        }
    }
}

/// Coarse CPU load bucket for one process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CpuLoad {
    Normal,
    Elevated,
    High,
}

impl CpuLoad {
    pub fn classify(cpu_percent: f64, config: &AlertConfig) -> Self {
        if cpu_percent > config.process_cpu_high {
            CpuLoad::High
        } else if cpu_percent > config.process_cpu_elevated {
            CpuLoad::Elevated
        } else {
            CpuLoad::Normal
        }
    }
}

/// An individual alert
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub severity: AlertSeverity,
    pub category: AlertCategory,
    pub message: String,
    pub value: f64,
    pub threshold: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertSeverity {
    Info,
    Warning,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertCategory {
    Cpu,
    Memory,
    Process { pid: u32, name: String },
}

/// Evaluate a snapshot and generate alerts
pub fn evaluate_alerts(
    stats: &SystemStats,
    processes: &[ProcessRecord],
    config: &AlertConfig,
) -> Vec<Alert> {
    let mut alerts = Vec::new();

    if let Some(alert) = threshold_alert(
        AlertCategory::Cpu,
        "CPU usage",
        stats.total_cpu_percent,
        config.cpu_warning,
        config.cpu_critical,
    ) {
        alerts.push(alert);
    }

    if let Some(alert) = threshold_alert(
        AlertCategory::Memory,
        "Memory usage",
        stats.memory_used_percent(),
        config.memory_warning,
        config.memory_critical,
    ) {
        alerts.push(alert);
    }

    // Records are sorted by CPU, so stop at the first one below the bar
    for process in processes {
        if CpuLoad::classify(process.cpu_usage_percent, config) != CpuLoad::High {
            break;
        }
        alerts.push(Alert {
            severity: AlertSeverity::Info,
            category: AlertCategory::Process {
                pid: process.pid,
                name: process.name.clone(),
            },
            message: format!(
                "{} ({}) using {:.1}% CPU",
                process.name, process.pid, process.cpu_usage_percent
            ),
            value: process.cpu_usage_percent,
            threshold: config.process_cpu_high,
        });
    }

    alerts
}

fn threshold_alert(
    category: AlertCategory,
    label: &str,
    value: f64,
    warning: f64,
    critical: f64,
) -> Option<Alert> {
    let (severity, threshold, kind) = if value >= critical {
        (AlertSeverity::Critical, critical, "critical")
    } else if value >= warning {
        (AlertSeverity::Warning, warning, "warning")
    } else {
        return None;
    };

    Some(Alert {
        severity,
        category,
        message: format!(
            "{} at {:.1}% ({} threshold: {:.1}%)",
            label, value, kind, threshold
        ),
        value,
        threshold,
    })
}
