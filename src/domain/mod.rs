//! The static scheduling domain model: architecture, task graph, jobs and
//! execution slices.
//!
//! Back-references (task -> app, job -> task, slice -> job, core -> cpu) are
//! non-owning indices into the container that owns the pointed-to value, not
//! shared pointers: the ownership tree is `Graph -> App -> Task -> Job ->
//! Slice` and `Architecture -> Cpu -> Core`. An index back-reference always
//! needs the owning `Graph`/`Architecture` at hand to resolve; this is the
//! price of the arena layout and is paid throughout this crate rather than
//! hidden behind `Rc`/`Weak`.

pub mod arch;
pub mod graph;
pub mod job;

pub mod prelude {
    pub use super::arch::{Architecture, Core, CoreTask, Cpu};
    pub use super::graph::{App, Criticality, Graph, Task};
    pub use super::job::{Job, JobId, Slice, Window};
    pub use super::{TaskId, Workload};
}

/// Addresses a [`graph::Task`] by its position within the owning [`graph::Graph`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TaskId {
    pub app: usize,
    pub task: usize,
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "app#{}/task#{}", self.app, self.task)
    }
}

/// A utilization or density figure: always in `[0, 1]` for a single task, can
/// exceed 1 once summed over a taskset.
pub type Workload = ordered_float::OrderedFloat<f64>;
