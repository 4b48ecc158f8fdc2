// Background polling through MonitorRuntime and poll_task

use std::sync::atomic::AtomicU64;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use tokio::sync::{broadcast, watch};

use procwatch::core::process_monitor::{poll_task, MonitorSnapshot};
use procwatch::{MonitorConfig, MonitorRuntime, ProcessMonitor};

use super::fakes::{backends, spawn, world, FakeProcess, World};

fn shared_monitor(world: &World) -> Arc<ProcessMonitor> {
    let config = MonitorConfig::default().with_refresh_interval(Duration::from_millis(200));
    Arc::new(ProcessMonitor::with_backends(backends(world, true), config))
}

fn wait_for_snapshot(
    rx: &mut watch::Receiver<Arc<MonitorSnapshot>>,
    timeout: Duration,
) -> Option<Arc<MonitorSnapshot>> {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if rx.has_changed().unwrap_or(false) {
            return Some(Arc::clone(&*rx.borrow_and_update()));
        }
        thread::sleep(Duration::from_millis(20));
    }
    None
}

#[test]
fn test_runtime_publishes_snapshots() {
    let world = world();
    spawn(&world, 1, FakeProcess::new("init"));
    spawn(&world, 2, FakeProcess::new("shell"));
    let monitor = shared_monitor(&world);

    let runtime = MonitorRuntime::new(Arc::clone(&monitor)).unwrap();
    let mut rx = runtime.subscribe();

    let snapshot = wait_for_snapshot(&mut rx, Duration::from_secs(5)).unwrap();
    assert_eq!(snapshot.processes.len(), 2);
    assert_eq!(snapshot.stats.process_count, 2);

    runtime.shutdown();
    assert!(!monitor.counters_available());
}

#[test]
fn test_runtime_drops_ticks_during_slow_polls() {
    let world = world();
    spawn(&world, 1, FakeProcess::new("init"));
    world.lock().enumerate_delay = Duration::from_millis(700);
    let monitor = shared_monitor(&world);

    let runtime = MonitorRuntime::new(Arc::clone(&monitor)).unwrap();
    thread::sleep(Duration::from_millis(1600));

    assert!(runtime.skipped_ticks() > 0);
    // At most one poll ran at a time, so history never outruns wall time
    assert!(monitor.history().len() <= 3);

    runtime.shutdown();
}

#[test]
fn test_shutdown_waits_for_in_flight_poll() {
    let world = world();
    spawn(&world, 1, FakeProcess::new("init"));
    world.lock().enumerate_delay = Duration::from_millis(400);
    let monitor = shared_monitor(&world);

    let runtime = MonitorRuntime::new(Arc::clone(&monitor)).unwrap();
    let deadline = Instant::now() + Duration::from_secs(5);
    while !monitor.is_polling() && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(10));
    }
    assert!(monitor.is_polling());

    runtime.shutdown();
    assert!(!monitor.is_polling());

    // The poll that was running when shutdown began must not repopulate state
    thread::sleep(Duration::from_millis(600));
    assert!(monitor.history().is_empty());
    assert!(!monitor.counters_available());
}

#[test]
fn test_set_interval_keeps_polling() {
    let world = world();
    spawn(&world, 1, FakeProcess::new("init"));
    let monitor = shared_monitor(&world);

    let runtime = MonitorRuntime::new(monitor).unwrap();
    let mut rx = runtime.subscribe();
    assert!(wait_for_snapshot(&mut rx, Duration::from_secs(5)).is_some());

    runtime.set_interval(Duration::from_millis(300));
    spawn(&world, 2, FakeProcess::new("late"));

    let deadline = Instant::now() + Duration::from_secs(5);
    let mut seen = 0;
    while Instant::now() < deadline && seen != 2 {
        if let Some(snapshot) = wait_for_snapshot(&mut rx, Duration::from_millis(500)) {
            seen = snapshot.processes.len();
        }
    }
    assert_eq!(seen, 2);

    runtime.shutdown();
}

#[tokio::test]
async fn test_poll_task_stops_on_shutdown() {
    let world = world();
    spawn(&world, 1, FakeProcess::new("init"));
    let monitor = shared_monitor(&world);

    let (snapshot_tx, mut snapshot_rx) = watch::channel(Arc::new(MonitorSnapshot::default()));
    let (_interval_tx, interval_rx) = watch::channel(Duration::from_millis(200));
    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let skipped = Arc::new(AtomicU64::new(0));

    let task = tokio::spawn(poll_task(
        Arc::clone(&monitor),
        snapshot_tx,
        interval_rx,
        Arc::clone(&skipped),
        shutdown_rx,
    ));

    tokio::time::timeout(Duration::from_secs(5), snapshot_rx.changed())
        .await
        .expect("no snapshot published")
        .unwrap();
    assert_eq!(snapshot_rx.borrow().processes.len(), 1);

    shutdown_tx.send(()).unwrap();
    tokio::time::timeout(Duration::from_secs(5), task)
        .await
        .expect("poll task did not stop")
        .unwrap();
}
