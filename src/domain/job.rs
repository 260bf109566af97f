//! `Job` and `Slice`: a single hyperperiod instance of a task, and the
//! concrete execution chunks the scheduler places for it.

use crate::domain::graph::Task;
use crate::domain::TaskId;
use crate::time::Time;

/// A half-open time interval `[start, stop)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Window {
    pub start: Time,
    pub stop: Time,
}

impl Window {
    pub fn new(start: Time, stop: Time) -> Self {
        debug_assert!(start < stop, "window must be non-empty");
        Self { start, stop }
    }

    pub fn len(&self) -> Time {
        self.stop - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.stop <= self.start
    }

    pub fn intersects(&self, other: &Window) -> bool {
        self.start < other.stop && other.start < self.stop
    }

    pub fn contains_window(&self, other: &Window) -> bool {
        self.start <= other.start && other.stop <= self.stop
    }
}

/// Addresses a [`Job`] by its owning task and position within that task's
/// job list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct JobId {
    pub task: TaskId,
    pub job: usize,
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/job#{}", self.task, self.job)
    }
}

/// A single contiguous execution chunk on one core.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Slice {
    pub job: JobId,
    pub start: Time,
    pub stop: Time,
}

impl Slice {
    pub fn new(job: JobId, start: Time, stop: Time) -> Self {
        debug_assert!(start < stop, "slice must be non-empty");
        Self { job, start, stop }
    }

    pub fn len(&self) -> Time {
        self.stop - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.stop <= self.start
    }

    pub fn window(&self) -> Window {
        Window::new(self.start, self.stop)
    }

    pub fn intersects(&self, other: &Slice) -> bool {
        self.start < other.stop && other.start < self.stop
    }
}

/// One hyperperiod instance of a task.
#[derive(Clone, Debug)]
pub struct Job {
    /// The hard window `[k*period, k*period + deadline)`. Never mutated
    /// once built.
    pub sched_window: Window,
    /// The window the scheduler is currently allowed to place slices in.
    /// Equal to `sched_window` until the optimiser narrows it from the left.
    pub exec_window: Window,
    /// Slices placed by the most recent scheduling pass, sorted by start.
    pub execution: Vec<Slice>,
}

impl Job {
    fn new(sched_window: Window) -> Self {
        Self { sched_window, exec_window: sched_window, execution: Vec::new() }
    }

    /// How far the execution window has been narrowed from the left of the
    /// scheduling window.
    pub fn offset(&self) -> Time {
        self.exec_window.start - self.sched_window.start
    }

    /// `exec_window.stop - sched_window.stop`, always `<= 0` (i.e. `stop <=
    /// stop`, represented as a `Time` since `Time` has no signed variant: the
    /// two are in practice always equal, as only the left edge is narrowed).
    pub fn local_deadline_slack(&self) -> Time {
        self.sched_window.stop - self.exec_window.stop
    }

    pub fn duration(&self) -> Time {
        self.execution.iter().map(Slice::len).sum()
    }

    pub fn clear_execution(&mut self) {
        self.execution.clear();
    }
}

/// Materialises `hyperperiod / task.period` jobs for `task`, one per period
/// instance, each with `sched_window = [k*period, k*period + deadline)` and
/// an initial `exec_window` equal to it.
pub fn expand_jobs(task: &Task, hyperperiod: Time) -> Vec<Job> {
    let instance_count = hyperperiod / task.period;

    (0..instance_count)
        .map(|k| {
            let start = task.period * k;
            let stop = start + task.deadline;

            Job::new(Window::new(start, stop))
        })
        .collect()
}
