//! Scheduling algorithms as variant records: a small, closed set of
//! `{name, local_test, ordering}` triples, matched on and dispatched through
//! plain function pointers rather than a trait object hierarchy.

use crate::domain::job::JobId;
use crate::domain::Workload;
use crate::time::Time;

/// The outcome of `local_test` when the admission bound is exceeded.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Violation {
    pub workload: Workload,
    pub bound: Workload,
}

/// One job with just enough information for ordering: its id, absolute
/// deadline (`sched_window.stop`) and task period. Built by callers from the
/// `Graph` so this module stays free of arena lookups.
#[derive(Clone, Copy, Debug)]
pub struct JobRef {
    pub id: JobId,
    pub deadline: Time,
    pub period: Time,
}

/// A scheduling algorithm: an admission bound and a job ordering, bundled as
/// function pointers so EDF and RM are data, not types.
#[derive(Clone, Copy)]
pub struct Policy {
    pub name: &'static str,
    local_test: fn(workload: Workload, cores: usize, margin: f64, task_count: usize) -> Option<Violation>,
    ordering: fn(&mut [JobRef]),
}

impl std::fmt::Debug for Policy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Policy").field("name", &self.name).finish()
    }
}

impl Policy {
    /// `workload ≤ cores · margin`.
    pub const fn edf() -> Self {
        Self {
            name: "edf",
            local_test: |workload, cores, margin, _task_count| {
                let bound = Workload::from(cores as f64 * margin);
                if workload > bound {
                    Some(Violation { workload, bound })
                } else {
                    None
                }
            },
            ordering: |jobs| jobs.sort_by_key(|j| j.deadline),
        }
    }

    /// The Liu-Layland bound: `workload ≤ cores · margin · n · (2^(1/n) − 1)`.
    pub const fn rm() -> Self {
        Self {
            name: "rm",
            local_test: |workload, cores, margin, task_count| {
                if task_count == 0 {
                    return None;
                }

                let n = task_count as f64;
                let bound = Workload::from(cores as f64 * margin * n * (2f64.powf(1.0 / n) - 1.0));

                if workload > bound {
                    Some(Violation { workload, bound })
                } else {
                    None
                }
            },
            ordering: |jobs| jobs.sort_by_key(|j| j.period),
        }
    }

    pub fn by_name(name: &str) -> Option<Self> {
        match name {
            "edf" => Some(Self::edf()),
            "rm" => Some(Self::rm()),
            _ => None,
        }
    }

    /// Checks `workload` against the admission bound for `cores` cores and
    /// `task_count` tasks under `margin`, returning the violation pair if
    /// the bound is exceeded.
    pub fn local_test(&self, workload: Workload, cores: usize, margin: f64, task_count: usize) -> Option<Violation> {
        (self.local_test)(workload, cores, margin, task_count)
    }

    /// Sorts `jobs` in place into the order this policy schedules them in.
    pub fn order(&self, jobs: &mut [JobRef]) {
        (self.ordering)(jobs)
    }
}

/// Default admission safety margin applied to both EDF and RM bounds.
pub const DEFAULT_MARGIN: f64 = 0.9;
