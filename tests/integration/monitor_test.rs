// ProcessMonitor behaviour against an in-memory process table

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use procwatch::core::process_monitor::{
    NOT_AVAILABLE, OWNER_SYSTEM, OWNER_UNRESOLVED, PATH_ACCESS_DENIED,
};
use procwatch::{MonitorConfig, PriorityLevel, ProcessMonitor};

use super::fakes::{backends, burn, spawn, world, FakeProcess, World};

fn monitor(world: &World) -> ProcessMonitor {
    ProcessMonitor::with_backends(backends(world, true), MonitorConfig::default())
}

fn populated() -> World {
    let world = world();
    spawn(&world, 100, FakeProcess::new("idle-daemon"));
    spawn(&world, 200, FakeProcess::new("compiler"));
    spawn(&world, 300, FakeProcess::new("editor"));
    world
}

#[test]
fn test_first_sample_reports_zero_cpu() {
    let world = populated();
    let monitor = monitor(&world);

    let processes = monitor.list_processes();
    assert_eq!(processes.len(), 3);
    assert!(processes.iter().all(|p| p.cpu_usage_percent == 0.0));
}

#[test]
fn test_list_is_sorted_by_cpu() {
    let world = populated();
    let monitor = monitor(&world);
    monitor.list_processes();

    thread::sleep(Duration::from_millis(50));
    burn(&world, 200, Duration::from_millis(120));
    burn(&world, 300, Duration::from_millis(20));

    let processes = monitor.list_processes();
    let pids: Vec<u32> = processes.iter().map(|p| p.pid).collect();
    assert_eq!(pids, vec![200, 300, 100]);

    for process in &processes {
        assert!((0.0..=100.0).contains(&process.cpu_usage_percent));
    }
    assert!(processes[0].cpu_usage_percent > processes[1].cpu_usage_percent);
    assert_eq!(processes[2].cpu_usage_percent, 0.0);
}

#[test]
fn test_list_does_not_resolve_owners() {
    let world = populated();
    world.lock().owners.insert(200, Some("alice".to_string()));
    let monitor = monitor(&world);

    let processes = monitor.list_processes();
    assert!(processes.iter().all(|p| p.owner == OWNER_UNRESOLVED));
    assert_eq!(world.lock().owner_queries, 0);
}

#[test]
fn test_unreadable_path_uses_sentinel() {
    let world = world();
    let mut hidden = FakeProcess::new("secret");
    hidden.exe = None;
    spawn(&world, 42, hidden);
    let monitor = monitor(&world);

    let processes = monitor.list_processes();
    assert_eq!(processes[0].file_path, PATH_ACCESS_DENIED);
    assert_eq!(processes[0].status, "Running");
}

#[test]
fn test_detail_resolves_and_caches_owner() {
    let world = populated();
    world.lock().owners.insert(200, Some("alice".to_string()));
    let monitor = monitor(&world);

    let first = monitor.process_detail(200).unwrap();
    let second = monitor.process_detail(200).unwrap();

    assert_eq!(first.owner, "alice");
    assert_eq!(second.owner, "alice");
    assert_eq!(world.lock().owner_queries, 1);
}

#[test]
fn test_detail_owner_fallbacks() {
    let world = populated();
    // 100 has no user account, 300 refuses the query
    world.lock().owners.insert(100, None);
    let monitor = monitor(&world);

    assert_eq!(monitor.process_detail(100).unwrap().owner, OWNER_SYSTEM);
    assert_eq!(monitor.process_detail(300).unwrap().owner, NOT_AVAILABLE);

    // Failures are cached too
    monitor.process_detail(300);
    assert_eq!(world.lock().owner_queries, 2);
}

#[test]
fn test_owner_cache_expires() {
    let world = populated();
    world.lock().owners.insert(200, Some("alice".to_string()));
    let config = MonitorConfig::default().with_owner_cache_ttl(Duration::from_millis(20));
    let monitor = ProcessMonitor::with_backends(backends(&world, true), config);

    monitor.process_detail(200);
    thread::sleep(Duration::from_millis(40));
    world.lock().owners.insert(200, Some("bob".to_string()));

    assert_eq!(monitor.process_detail(200).unwrap().owner, "bob");
    assert_eq!(world.lock().owner_queries, 2);
}

#[test]
fn test_detail_of_missing_process() {
    let world = populated();
    let monitor = monitor(&world);

    assert!(monitor.process_detail(9999).is_none());
}

#[test]
fn test_kill_removes_process() {
    let world = populated();
    let monitor = monitor(&world);
    monitor.list_processes();

    assert!(monitor.kill(200));
    assert_eq!(world.lock().killed, vec![200]);

    let pids: Vec<u32> = monitor.list_processes().iter().map(|p| p.pid).collect();
    assert!(!pids.contains(&200));
}

#[test]
fn test_kill_failures_return_false() {
    let world = populated();
    world.lock().protected.insert(100);
    let monitor = monitor(&world);

    assert!(!monitor.kill(9999));
    assert!(!monitor.kill(100));
    assert!(world.lock().killed.is_empty());
    assert_eq!(monitor.list_processes().len(), 3);
}

#[test]
fn test_set_priority() {
    let world = populated();
    world.lock().protected.insert(300);
    let monitor = monitor(&world);

    assert!(monitor.set_priority(200, PriorityLevel::BelowNormal));
    assert!(!monitor.set_priority(300, PriorityLevel::High));
    assert!(!monitor.set_priority(9999, PriorityLevel::Normal));

    assert_eq!(world.lock().priorities, vec![(200, PriorityLevel::BelowNormal)]);
}

#[test]
fn test_system_stats_from_counters() {
    let world = world();
    let mut a = FakeProcess::new("a");
    a.threads = 4;
    a.handles = 100;
    a.working_set = 1000;
    let mut b = FakeProcess::new("b");
    b.threads = 2;
    b.handles = 50;
    b.working_set = 500;
    spawn(&world, 1, a);
    spawn(&world, 2, b);
    let monitor = monitor(&world);

    let stats = monitor.system_stats();
    assert_eq!(stats.process_count, 2);
    assert_eq!(stats.thread_count, 6);
    assert_eq!(stats.handle_count, 150);
    assert_eq!(stats.total_memory_used_bytes, 1500);
    assert_eq!(stats.total_cpu_percent, 37.5);
    assert_eq!(stats.total_memory_available_bytes, 2 * 1024 * 1024 * 1024);
    assert_eq!(stats.memory_used_percent(), 75.0);
}

#[test]
fn test_system_stats_without_counters() {
    let world = populated();
    let monitor = ProcessMonitor::with_backends(backends(&world, false), MonitorConfig::default());

    let stats = monitor.system_stats();
    assert!(!monitor.counters_available());
    assert_eq!(stats.process_count, 3);
    assert_eq!(stats.thread_count, 3);
    assert_eq!(stats.total_cpu_percent, 0.0);
    assert_eq!(stats.total_memory_available_bytes, 0);
}

#[test]
fn test_system_stats_reuses_sample_within_interval() {
    let world = populated();
    let monitor = monitor(&world);

    monitor.list_processes();
    spawn(&world, 400, FakeProcess::new("late"));

    // Default interval is 2 s, so the listing above is still current
    assert_eq!(monitor.system_stats().process_count, 3);
    monitor.list_processes();
    assert_eq!(monitor.system_stats().process_count, 4);
}

#[test]
fn test_system_stats_resamples_after_interval() {
    let world = populated();
    let interval = sysinfo::MINIMUM_CPU_UPDATE_INTERVAL;
    let config = MonitorConfig::default().with_refresh_interval(interval);
    let monitor = ProcessMonitor::with_backends(backends(&world, true), config);

    assert_eq!(monitor.system_stats().process_count, 3);

    let mut late = FakeProcess::new("late");
    late.threads = 5;
    spawn(&world, 400, late);
    thread::sleep(interval + Duration::from_millis(50));

    // Only system_stats is called, yet process sums follow the live table
    let stats = monitor.system_stats();
    assert_eq!(stats.process_count, 4);
    assert_eq!(stats.thread_count, 8);
}

#[test]
fn test_cpu_stays_in_range_when_counter_misbehaves() {
    let world = populated();
    world.lock().cpu_percent = 180.0;
    let monitor = monitor(&world);

    assert_eq!(monitor.system_stats().total_cpu_percent, 100.0);
}

#[test]
fn test_poll_records_history() {
    let world = populated();
    let monitor = monitor(&world);

    for _ in 0..3 {
        let snapshot = monitor.poll();
        assert_eq!(snapshot.processes.len(), 3);
        assert_eq!(snapshot.stats.process_count, 3);
    }

    let history = monitor.history();
    assert_eq!(history.len(), 3);
    assert_eq!(history.cpu_usage.back(), Some(&37.5));
}

#[test]
fn test_try_poll_skips_while_polling() {
    let world = populated();
    world.lock().enumerate_delay = Duration::from_millis(300);
    let monitor = Arc::new(monitor(&world));

    let background = {
        let monitor = Arc::clone(&monitor);
        thread::spawn(move || monitor.try_poll())
    };

    thread::sleep(Duration::from_millis(100));
    assert!(monitor.is_polling());
    assert!(monitor.try_poll().is_none());

    assert!(background.join().unwrap().is_some());
    assert!(!monitor.is_polling());
}

#[test]
fn test_dispose_releases_counters() {
    let world = populated();
    let monitor = monitor(&world);
    monitor.poll();

    monitor.dispose();

    assert!(!monitor.counters_available());
    assert!(monitor.history().is_empty());

    // Still usable, with global counters at zero
    let snapshot = monitor.poll();
    assert_eq!(snapshot.processes.len(), 3);
    assert_eq!(snapshot.stats.total_cpu_percent, 0.0);
}

#[test]
fn test_reused_pid_does_not_inherit_cpu_history() {
    let world = world();
    let mut old = FakeProcess::new("old");
    old.cpu_time = Duration::from_secs(50);
    spawn(&world, 77, old);
    let monitor = monitor(&world);
    monitor.list_processes();

    // Same pid, new process with less accumulated time
    let mut new = FakeProcess::new("new");
    new.start_time = chrono::Utc::now();
    spawn(&world, 77, new);
    thread::sleep(Duration::from_millis(20));

    let processes = monitor.list_processes();
    assert_eq!(processes[0].name, "new");
    assert_eq!(processes[0].cpu_usage_percent, 0.0);
}
