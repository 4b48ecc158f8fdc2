// In-memory process table driving the monitor through its OS traits.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use procwatch::core::process_monitor::{
    FieldError, MonitorBackends, OwnerQuery, PriorityLevel, ProcessControl, ProcessProbe,
    ProcessSource, SystemCounters,
};
use procwatch::{MonitorError, Result};

pub const CORES: usize = 4;

#[derive(Debug, Clone)]
pub struct FakeProcess {
    pub name: String,
    pub cpu_time: Duration,
    pub threads: u32,
    pub handles: u32,
    pub working_set: u64,
    pub private_bytes: u64,
    pub start_time: DateTime<Utc>,
    /// `None` simulates a path hidden by permissions.
    pub exe: Option<PathBuf>,
}

impl FakeProcess {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            cpu_time: Duration::ZERO,
            threads: 1,
            handles: 10,
            working_set: 1024 * 1024,
            private_bytes: 512 * 1024,
            start_time: Utc::now() - chrono::Duration::minutes(5),
            exe: Some(PathBuf::from(format!("/usr/bin/{}", name))),
        }
    }
}

#[derive(Default)]
pub struct FakeWorld {
    pub processes: BTreeMap<u32, FakeProcess>,
    pub owners: HashMap<u32, Option<String>>,
    pub owner_queries: usize,
    /// Processes that refuse termination and priority changes.
    pub protected: HashSet<u32>,
    pub killed: Vec<u32>,
    pub priorities: Vec<(u32, PriorityLevel)>,
    pub cpu_percent: f64,
    pub available_memory: u64,
    pub total_memory: Option<u64>,
    pub enumerate_delay: Duration,
}

pub type World = Arc<Mutex<FakeWorld>>;

pub fn world() -> World {
    Arc::new(Mutex::new(FakeWorld {
        cpu_percent: 37.5,
        available_memory: 2 * 1024 * 1024 * 1024,
        total_memory: Some(8 * 1024 * 1024 * 1024),
        ..Default::default()
    }))
}

pub fn spawn(world: &World, pid: u32, process: FakeProcess) {
    world.lock().processes.insert(pid, process);
}

pub fn burn(world: &World, pid: u32, cpu: Duration) {
    if let Some(process) = world.lock().processes.get_mut(&pid) {
        process.cpu_time += cpu;
    }
}

fn to_probe(pid: u32, process: &FakeProcess) -> ProcessProbe {
    ProcessProbe {
        pid,
        name: process.name.clone(),
        exited: false,
        cpu_time: Ok(process.cpu_time),
        thread_count: Ok(process.threads),
        handle_count: Ok(process.handles),
        working_set: Ok(process.working_set),
        private_bytes: Ok(process.private_bytes),
        start_time: Ok(process.start_time),
        exe_path: match &process.exe {
            Some(path) => Ok(Some(path.clone())),
            None => Err(FieldError::AccessDenied),
        },
        status: Ok("Running".to_string()),
    }
}

pub struct FakeSource(pub World);

impl ProcessSource for FakeSource {
    fn enumerate(&mut self) -> Vec<Result<ProcessProbe>> {
        let delay = self.0.lock().enumerate_delay;
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }

        let world = self.0.lock();
        world
            .processes
            .iter()
            .map(|(pid, process)| Ok(to_probe(*pid, process)))
            .collect()
    }

    fn probe(&mut self, pid: u32) -> Option<ProcessProbe> {
        let world = self.0.lock();
        world.processes.get(&pid).map(|process| to_probe(pid, process))
    }

    fn core_count(&self) -> usize {
        CORES
    }
}

pub struct FakeCounters(pub World);

impl SystemCounters for FakeCounters {
    fn total_cpu_percent(&mut self) -> Result<f64> {
        Ok(self.0.lock().cpu_percent)
    }

    fn available_memory(&mut self) -> Result<u64> {
        Ok(self.0.lock().available_memory)
    }

    fn total_physical_memory(&self) -> Option<u64> {
        self.0.lock().total_memory
    }
}

pub struct FakeOwners(pub World);

impl OwnerQuery for FakeOwners {
    fn query_owner(&mut self, pid: u32) -> Result<Option<String>> {
        let mut world = self.0.lock();
        world.owner_queries += 1;
        match world.owners.get(&pid) {
            Some(owner) => Ok(owner.clone()),
            None => Err(MonitorError::access_denied(format!("token of {}", pid))),
        }
    }
}

pub struct FakeControl(pub World);

impl ProcessControl for FakeControl {
    fn terminate(&mut self, pid: u32) -> Result<()> {
        let mut world = self.0.lock();
        if world.protected.contains(&pid) {
            return Err(MonitorError::access_denied(format!("process {}", pid)));
        }
        world
            .processes
            .remove(&pid)
            .ok_or(MonitorError::ProcessNotFound(pid))?;
        world.killed.push(pid);
        Ok(())
    }

    fn set_priority(&mut self, pid: u32, level: PriorityLevel) -> Result<()> {
        let mut world = self.0.lock();
        if !world.processes.contains_key(&pid) {
            return Err(MonitorError::ProcessNotFound(pid));
        }
        if world.protected.contains(&pid) {
            return Err(MonitorError::access_denied(format!("process {}", pid)));
        }
        world.priorities.push((pid, level));
        Ok(())
    }
}

pub fn backends(world: &World, with_counters: bool) -> MonitorBackends {
    MonitorBackends {
        source: Box::new(FakeSource(Arc::clone(world))),
        counters: with_counters
            .then(|| Box::new(FakeCounters(Arc::clone(world))) as Box<dyn SystemCounters>),
        owner_query: Box::new(FakeOwners(Arc::clone(world))),
        control: Box::new(FakeControl(Arc::clone(world))),
    }
}
