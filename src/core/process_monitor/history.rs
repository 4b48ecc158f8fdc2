use std::collections::VecDeque;

use super::metrics::SystemStats;

pub const DEFAULT_HISTORY_SIZE: usize = 60;

/// Bounded history of whole-system CPU and memory usage, one point per poll.
#[derive(Debug, Clone)]
pub struct MetricsHistory {
    capacity: usize,
    pub cpu_usage: VecDeque<f64>,
    pub memory_usage: VecDeque<f64>,
}

impl MetricsHistory {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_SIZE)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            cpu_usage: VecDeque::with_capacity(capacity),
            memory_usage: VecDeque::with_capacity(capacity),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn record(&mut self, stats: &SystemStats) {
        let capacity = self.capacity;
        Self::push_value(&mut self.cpu_usage, stats.total_cpu_percent, capacity);
        Self::push_value(&mut self.memory_usage, stats.memory_used_percent(), capacity);
    }

    fn push_value<T>(queue: &mut VecDeque<T>, value: T, capacity: usize) {
        if queue.len() >= capacity {
            queue.pop_front();
        }
        queue.push_back(value);
    }

    pub fn len(&self) -> usize {
        self.cpu_usage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cpu_usage.is_empty()
    }

    pub fn clear(&mut self) {
        self.cpu_usage.clear();
        self.memory_usage.clear();
    }

    /// (average, peak) of the recorded CPU values.
    pub fn cpu_average_and_peak(&self) -> (f64, f64) {
        if self.cpu_usage.is_empty() {
            return (0.0, 0.0);
        }
        let avg = self.cpu_usage.iter().sum::<f64>() / self.cpu_usage.len() as f64;
        let peak = self.cpu_usage.iter().copied().fold(0.0, f64::max);
        (avg, peak)
    }
}

impl Default for MetricsHistory {
    fn default() -> Self {
        Self::new()
    }
}
