use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

use super::metrics::{NOT_AVAILABLE, OWNER_SYSTEM};
use super::probe::OwnerQuery;

pub const DEFAULT_OWNER_TTL: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
struct OwnerCacheEntry {
    owner: String,
    cached_at: Instant,
}

/// Cache-aside owner lookup with a fixed time-to-live.
///
/// Failed lookups are cached too, so a process whose owner can never be read
/// costs one query per TTL window instead of one per call.
#[derive(Debug)]
pub struct OwnerResolver {
    entries: HashMap<u32, OwnerCacheEntry>,
    ttl: Duration,
}

impl OwnerResolver {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            ttl,
        }
    }

    pub fn resolve(&mut self, pid: u32, now: Instant, query: &mut dyn OwnerQuery) -> String {
        if let Some(entry) = self.entries.get(&pid) {
            if now.saturating_duration_since(entry.cached_at) < self.ttl {
                return entry.owner.clone();
            }
        }

        let owner = match query.query_owner(pid) {
            Ok(Some(name)) => name,
            Ok(None) => OWNER_SYSTEM.to_string(),
            Err(e) => {
                log::debug!("Owner lookup for pid {} failed: {}", pid, e);
                NOT_AVAILABLE.to_string()
            }
        };

        self.entries.insert(
            pid,
            OwnerCacheEntry {
                owner: owner.clone(),
                cached_at: now,
            },
        );

        owner
    }

    pub fn prune(&mut self, live: &HashSet<u32>) {
        self.entries.retain(|pid, _| live.contains(pid));
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn cached(&self) -> usize {
        self.entries.len()
    }
}

impl Default for OwnerResolver {
    fn default() -> Self {
        Self::new(DEFAULT_OWNER_TTL)
    }
}
