//! `Architecture`, `Cpu` and `Core`: the processor side of the domain model.
//!
//! A core does not hold a reference to the tasks mapped to it (that would
//! require threading the owning `Graph` through every ordering comparison);
//! instead it caches each mapped task's id and a copy of its `workload`
//! figure in a [`CoreTask`]. The workload copy is a derived quantity like any
//! other cached field in this codebase (e.g. `Task::workload`), kept in sync
//! by the mapper and optimiser whenever a task is pushed onto or removed
//! from a core.

use crate::domain::{TaskId, Workload};

/// A task mapped to a core, with a cached copy of its workload so the core's
/// aggregate workload can be tracked without consulting the `Graph`.
#[derive(Clone, Copy, Debug)]
pub struct CoreTask {
    pub id: TaskId,
    pub workload: Workload,
}

/// A single core within a [`Cpu`].
#[derive(Clone, Debug)]
pub struct Core {
    pub id: u32,
    pub cpu_id: u32,
    pub tasks: Vec<CoreTask>,
    workload: Workload,
}

impl Core {
    pub fn new(id: u32, cpu_id: u32) -> Self {
        Self { id, cpu_id, tasks: Vec::new(), workload: Workload::from(0.0) }
    }

    pub fn workload(&self) -> Workload {
        self.workload
    }

    pub fn push_task(&mut self, id: TaskId, workload: Workload) {
        self.tasks.push(CoreTask { id, workload });
        self.workload += workload;
    }

    /// Removes the first task matching `id`, returning its cached workload.
    ///
    /// Panics if `id` is not mapped to this core; callers only ever remove a
    /// task they have just confirmed is present (see the optimiser's swap
    /// step).
    pub fn remove_task(&mut self, id: TaskId) -> Workload {
        let index = self.tasks.iter().position(|t| t.id == id)
            .unwrap_or_else(|| panic!("{id} is not mapped to core {}/{}", self.cpu_id, self.id));

        let removed = self.tasks.remove(index);
        self.workload -= removed.workload;

        removed.workload
    }

    pub fn contains(&self, id: TaskId) -> bool {
        self.tasks.iter().any(|t| t.id == id)
    }
}

impl PartialEq for Core {
    fn eq(&self, other: &Self) -> bool {
        self.cpu_id == other.cpu_id && self.id == other.id
    }
}

impl Eq for Core {}

/// A CPU, owning an ordered collection of cores and the set of apps mapped
/// to it.
#[derive(Clone, Debug)]
pub struct Cpu {
    pub id: u32,
    pub cores: Vec<Core>,
    pub apps: Vec<usize>,
}

impl Cpu {
    pub fn new(id: u32, core_count: u32) -> Self {
        let cores = (0..core_count).map(|core_id| Core::new(core_id, id)).collect();

        Self { id, cores, apps: Vec::new() }
    }

    pub fn workload(&self) -> Workload {
        self.cores.iter().map(Core::workload).sum()
    }

    /// The core with the lowest workload, ties broken by lowest id.
    pub fn min_core(&self) -> &Core {
        self.cores.iter()
            .min_by(|a, b| a.workload().cmp(&b.workload()).then(a.id.cmp(&b.id)))
            .expect("cpu has no cores")
    }

    pub fn min_core_mut(&mut self) -> &mut Core {
        let min_id = self.min_core().id;
        self.cores.iter_mut().find(|c| c.id == min_id).expect("core vanished")
    }

    pub fn core_mut(&mut self, id: u32) -> &mut Core {
        self.cores.iter_mut().find(|c| c.id == id).unwrap_or_else(|| panic!("no core with id {id} on cpu {}", self.id))
    }
}

impl PartialEq for Cpu {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Cpu {}

/// The processor architecture: a set of CPUs, each owning an ordered
/// collection of cores.
#[derive(Clone, Debug)]
pub struct Architecture {
    pub cpus: Vec<Cpu>,
}

impl Architecture {
    pub fn new(cpus: Vec<Cpu>) -> Self {
        Self { cpus }
    }

    pub fn core_count(&self) -> usize {
        self.cpus.iter().map(|cpu| cpu.cores.len()).sum()
    }

    pub fn cpu_mut(&mut self, id: u32) -> &mut Cpu {
        self.cpus.iter_mut().find(|c| c.id == id).unwrap_or_else(|| panic!("no cpu with id {id}"))
    }

    /// All `(cpu_id, core_id)` pairs in the architecture, in declaration
    /// order.
    pub fn core_ids(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.cpus.iter().flat_map(|cpu| cpu.cores.iter().map(|core| (cpu.id, core.id)))
    }
}
