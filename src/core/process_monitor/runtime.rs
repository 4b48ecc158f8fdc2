//! Tokio runtime that polls the monitor on a fixed cadence.
//!
//! Each tick runs `ProcessMonitor::try_poll` on the blocking pool. A tick that
//! fires while the previous poll is still running is dropped, never queued.
//! Finished snapshots are published whole through a watch channel.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::sync::{broadcast, watch};
use tokio::time::{interval, Interval, MissedTickBehavior};

use super::monitor::{MonitorSnapshot, ProcessMonitor};

/// Background polling for a shared `ProcessMonitor`.
pub struct MonitorRuntime {
    /// Receiver for complete snapshots
    pub snapshot_rx: watch::Receiver<Arc<MonitorSnapshot>>,

    monitor: Arc<ProcessMonitor>,

    interval_tx: watch::Sender<Duration>,

    skipped_ticks: Arc<AtomicU64>,

    /// Shutdown signal sender
    shutdown_tx: broadcast::Sender<()>,

    /// Owns the worker threads and the blocking pool
    runtime: tokio::runtime::Runtime,
}

impl MonitorRuntime {
    /// Start polling `monitor` at its configured refresh interval.
    pub fn new(monitor: Arc<ProcessMonitor>) -> anyhow::Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_time()
            .thread_name("procwatch-worker")
            .build()
            .context("Failed to build monitor runtime")?;

        let (snapshot_tx, snapshot_rx) = watch::channel(Arc::new(MonitorSnapshot::default()));
        let (interval_tx, interval_rx) = watch::channel(monitor.config().refresh_interval);
        let (shutdown_tx, _) = broadcast::channel::<()>(1);
        let skipped_ticks = Arc::new(AtomicU64::new(0));

        runtime.spawn(poll_task(
            Arc::clone(&monitor),
            snapshot_tx,
            interval_rx,
            Arc::clone(&skipped_ticks),
            shutdown_tx.subscribe(),
        ));

        log::info!(
            "Monitor runtime started ({} ms interval)",
            monitor.config().refresh_interval.as_millis()
        );

        Ok(Self {
            snapshot_rx,
            monitor,
            interval_tx,
            skipped_ticks,
            shutdown_tx,
            runtime,
        })
    }

    pub fn monitor(&self) -> &Arc<ProcessMonitor> {
        &self.monitor
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<MonitorSnapshot>> {
        self.snapshot_rx.clone()
    }

    /// Change the polling cadence. Takes effect from the next tick.
    pub fn set_interval(&self, interval: Duration) {
        let interval = interval.max(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL);
        // Only fails once the poll task is gone
        let _ = self.interval_tx.send(interval);
    }

    /// Ticks dropped because a poll was already in flight.
    pub fn skipped_ticks(&self) -> u64 {
        self.skipped_ticks.load(Ordering::Relaxed)
    }

    /// Stop polling and release the monitor's counters.
    ///
    /// Blocks until an in-flight poll has finished, so nothing samples the
    /// monitor after `dispose` has cleared it.
    pub fn shutdown(self) {
        log::info!("Shutting down monitor runtime");
        let MonitorRuntime {
            monitor,
            shutdown_tx,
            runtime,
            ..
        } = self;

        let _ = shutdown_tx.send(());
        // Dropping the runtime waits for spawn_blocking polls to return
        drop(runtime);
        monitor.dispose();
    }
}

fn ticker(period: Duration) -> Interval {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    ticker
}

/// Poll loop: one `try_poll` per tick, at most one in flight.
pub async fn poll_task(
    monitor: Arc<ProcessMonitor>,
    snapshot_tx: watch::Sender<Arc<MonitorSnapshot>>,
    mut interval_rx: watch::Receiver<Duration>,
    skipped_ticks: Arc<AtomicU64>,
    mut shutdown: broadcast::Receiver<()>,
) {
    let mut ticks = ticker(*interval_rx.borrow_and_update());

    loop {
        tokio::select! {
            _ = ticks.tick() => {
                if monitor.is_polling() {
                    skipped_ticks.fetch_add(1, Ordering::Relaxed);
                    log::debug!("Poll still in flight, dropping tick");
                    continue;
                }

                let monitor = Arc::clone(&monitor);
                let snapshot_tx = snapshot_tx.clone();
                let skipped_ticks = Arc::clone(&skipped_ticks);

                tokio::spawn(async move {
                    match tokio::task::spawn_blocking(move || monitor.try_poll()).await {
                        Ok(Some(snapshot)) => {
                            log::trace!("Snapshot with {} processes published", snapshot.processes.len());
                            // watch::send() only fails if there are no receivers (which is fine)
                            let _ = snapshot_tx.send(Arc::new(snapshot));
                        }
                        Ok(None) => {
                            skipped_ticks.fetch_add(1, Ordering::Relaxed);
                        }
                        Err(e) => log::error!("Poll worker failed: {}", e),
                    }
                });
            }
            Ok(()) = interval_rx.changed() => {
                let period = *interval_rx.borrow_and_update();
                log::debug!("Refresh interval changed to {} ms", period.as_millis());
                ticks = ticker(period);
            }
            _ = shutdown.recv() => {
                log::debug!("Poll task shutting down");
                break;
            }
        }
    }
}
