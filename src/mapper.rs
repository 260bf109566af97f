//! Assigns applications to CPUs and tasks to cores under a policy's
//! admission test.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use tracing::{debug, instrument};

use crate::domain::prelude::*;
use crate::error::ProblemError;
use crate::policy::Policy;

/// Rejects the whole problem before any CPU-local decision is attempted:
/// `Σ task.workload ≤ (Σ cores) · margin` under the EDF bound, or the
/// Liu-Layland bound under RM.
pub fn check_global_admission(architecture: &Architecture, graph: &Graph, policy: &Policy, margin: f64) -> Result<(), ProblemError> {
    let workload = graph.total_workload();
    let cores = architecture.core_count();
    let task_count: usize = graph.apps.iter().map(|app| app.tasks.len()).sum();

    match policy.local_test(workload, cores, margin, task_count) {
        None => Ok(()),
        Some(violation) => Err(ProblemError::GlobalAdmissionFailure { workload: violation.workload, bound: violation.bound }),
    }
}

/// A min-heap key: CPU workload, ties broken by ascending id so the
/// ordering is total and deterministic.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct CpuWorkloadKey(Workload, u32);

/// Assigns every app in `graph`, in descending-criticality order, to the
/// least-loaded CPU that still passes `policy`'s local test; within that
/// CPU, each of the app's tasks goes to the currently least-loaded core.
///
/// Mutates `architecture` in place, populating each `Cpu::apps` and
/// `Core::tasks`. On failure, no further apps are processed; CPUs already
/// mutated by prior apps are left as they were (the whole problem is
/// rejected, so this is not observed).
#[instrument(skip(architecture, graph, policy), fields(apps = graph.apps.len()))]
pub fn map(architecture: &mut Architecture, graph: &Graph, policy: &Policy, margin: f64) -> Result<(), ProblemError> {
    let mut heap: BinaryHeap<Reverse<CpuWorkloadKey>> = architecture.cpus.iter()
        .map(|cpu| Reverse(CpuWorkloadKey(cpu.workload(), cpu.id)))
        .collect();

    for app_index in graph.apps_by_descending_criticality() {
        let app = &graph.apps[app_index];

        let Reverse(CpuWorkloadKey(_, cpu_id)) = heap.pop()
            .ok_or_else(|| ProblemError::invariant("mapper ran out of cpus"))?;

        let cpu = architecture.cpu_mut(cpu_id);

        let existing_task_count: usize = cpu.cores.iter().map(|c| c.tasks.len()).sum();
        let candidate_workload = cpu.workload() + app.workload();
        let candidate_task_count = existing_task_count + app.tasks.len();

        let is_empty = cpu.apps.is_empty();

        if !is_empty {
            if let Some(violation) = policy.local_test(candidate_workload, cpu.cores.len(), margin, candidate_task_count) {
                return Err(ProblemError::InitialMappingError {
                    app: app_index,
                    workload: violation.workload,
                    bound: violation.bound,
                });
            }
        }

        cpu.apps.push(app_index);

        for (task_index, task) in app.tasks.iter().enumerate() {
            let id = TaskId { app: app_index, task: task_index };
            let core = cpu.min_core_mut();
            core.push_task(id, task.workload());
        }

        debug!(app = app_index, cpu = cpu_id, workload = candidate_workload.into_inner(), "mapped app");

        heap.push(Reverse(CpuWorkloadKey(cpu.workload(), cpu_id)));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::Time;

    fn task(wcet: u64, period: u64, crit: u8) -> Task {
        Task::new(1, 0, Time::nanos(wcet), Time::nanos(period), Time::nanos(period), Criticality::new(crit).unwrap(), None)
    }

    #[test]
    fn maps_each_app_to_a_distinct_core_when_possible() {
        let apps = vec![
            App::new("A", false, vec![task(4, 10, 0)]),
            App::new("B", false, vec![task(4, 10, 0)]),
        ];
        let graph = Graph::new(apps);

        let mut arch = Architecture::new(vec![Cpu::new(0, 2)]);
        let policy = Policy::edf();

        map(&mut arch, &graph, &policy, 0.9).unwrap();

        assert_eq!(arch.cpus[0].cores[0].tasks.len(), 1);
        assert_eq!(arch.cpus[0].cores[1].tasks.len(), 1);
    }

    #[test]
    fn global_admission_rejects_overloaded_problem() {
        let apps = vec![App::new("A", false, vec![task(10, 10, 0)])];
        let graph = Graph::new(apps);
        let arch = Architecture::new(vec![Cpu::new(0, 1)]);

        let err = check_global_admission(&arch, &graph, &Policy::edf(), 0.9).unwrap_err();
        assert!(matches!(err, ProblemError::GlobalAdmissionFailure { .. }));
    }

    #[test]
    fn least_loaded_cpu_picked_first() {
        let apps = vec![
            App::new("A", false, vec![task(8, 10, 0)]),
            App::new("B", false, vec![task(1, 10, 0)]),
        ];
        let graph = Graph::new(apps);
        let mut arch = Architecture::new(vec![Cpu::new(0, 1), Cpu::new(1, 1)]);

        map(&mut arch, &graph, &Policy::edf(), 0.9).unwrap();

        assert_eq!(arch.cpus[0].apps, vec![0]);
        assert_eq!(arch.cpus[1].apps, vec![1]);
    }
}
