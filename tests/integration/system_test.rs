// Smoke tests against the host operating system

use std::process::{Child, Command};
use std::thread;
use std::time::Duration;

use procwatch::{MonitorConfig, PriorityLevel, ProcessMonitor};

fn sleeper() -> Option<Child> {
    if cfg!(windows) {
        Command::new("ping").args(["-n", "30", "127.0.0.1"]).spawn().ok()
    } else {
        Command::new("sleep").arg("30").spawn().ok()
    }
}

#[test]
fn test_lists_current_process() {
    let monitor = ProcessMonitor::new(MonitorConfig::default());
    let own_pid = std::process::id();

    let processes = monitor.list_processes();
    assert!(!processes.is_empty());

    let own = processes.iter().find(|p| p.pid == own_pid).unwrap();
    assert!(own.working_set_bytes > 0);
    assert!((0.0..=100.0).contains(&own.cpu_usage_percent));

    // Sorted by CPU, highest first
    assert!(processes
        .windows(2)
        .all(|pair| pair[0].cpu_usage_percent >= pair[1].cpu_usage_percent));
}

#[test]
fn test_detail_of_current_process_has_owner() {
    let monitor = ProcessMonitor::new(MonitorConfig::default());

    let own = monitor.process_detail(std::process::id()).unwrap();
    assert!(own.is_owner_resolved());
    assert!(own.start_time.is_some());
}

#[test]
fn test_system_stats_are_in_range() {
    let monitor = ProcessMonitor::new(MonitorConfig::default());
    monitor.list_processes();
    thread::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL);

    let snapshot = monitor.poll();
    assert!(snapshot.stats.process_count > 0);
    assert!((0.0..=100.0).contains(&snapshot.stats.total_cpu_percent));
    assert!((0.0..=100.0).contains(&snapshot.stats.memory_used_percent()));
}

#[test]
fn test_kill_spawned_process() {
    let Some(mut child) = sleeper() else {
        return;
    };
    let pid = child.id();
    let monitor = ProcessMonitor::new(MonitorConfig::default());

    assert!(monitor.set_priority(pid, PriorityLevel::BelowNormal));
    assert!(monitor.kill(pid));

    let _ = child.wait();
    thread::sleep(Duration::from_millis(50));
    assert!(monitor.process_detail(pid).is_none());
}

#[test]
fn test_kill_unknown_process_fails() {
    let monitor = ProcessMonitor::new(MonitorConfig::default());
    assert!(!monitor.kill(u32::MAX - 1));
}

#[cfg(unix)]
#[test]
fn test_zombie_child_cannot_be_controlled() {
    let Ok(mut child) = Command::new("true").spawn() else {
        return;
    };
    let pid = child.id();
    // Exited but not yet reaped, so only the zombie entry is left
    thread::sleep(Duration::from_millis(300));

    let monitor = ProcessMonitor::new(MonitorConfig::default());
    assert!(!monitor.kill(pid));
    assert!(!monitor.set_priority(pid, PriorityLevel::Normal));

    let _ = child.wait();
}
