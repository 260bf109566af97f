//! Verifies that a scheduled `Graph` satisfies every quantified invariant a
//! candidate schedule must hold: no offset/deadline miss, exact WCET,
//! pairwise slice disjointness, switch-time gaps, and declared app
//! ordering.

use crate::domain::prelude::*;
use crate::error::{DiscardReason, FeasibilityMiss};
use crate::time::Time;

/// Runs every check in turn, short-circuiting on the first violation found
/// (callers only need to know a candidate is infeasible, not every way it
/// is).
pub fn check(architecture: &Architecture, graph: &Graph, switch_time: Time) -> Result<(), DiscardReason> {
    check_job_windows_and_wcet(graph)?;
    check_core_timelines(architecture, graph, switch_time)?;
    check_app_ordering(graph)?;
    Ok(())
}

fn check_job_windows_and_wcet(graph: &Graph) -> Result<(), DiscardReason> {
    for (app_index, app) in graph.apps.iter().enumerate() {
        for (task_index, task) in app.tasks.iter().enumerate() {
            let id = TaskId { app: app_index, task: task_index };

            for (job_index, job) in task.jobs.iter().enumerate() {
                let fail = || DiscardReason::SchedulingFailure { task: id, job: job_index };

                let (Some(first), Some(last)) = (job.execution.first(), job.execution.last()) else {
                    return Err(fail());
                };

                if first.start < job.exec_window.start || last.stop > job.exec_window.stop {
                    return Err(fail());
                }

                let total: Time = job.execution.iter().map(Slice::len).sum();
                if total != task.wcet {
                    return Err(fail());
                }
            }
        }
    }

    Ok(())
}

fn check_core_timelines(architecture: &Architecture, graph: &Graph, switch_time: Time) -> Result<(), DiscardReason> {
    for cpu in &architecture.cpus {
        for core in &cpu.cores {
            let mut slices: Vec<(Slice, Criticality)> = core.tasks.iter()
                .flat_map(|t| {
                    let task = graph.task(t.id);
                    task.jobs.iter().flat_map(move |job| job.execution.iter().map(move |s| (*s, task.criticality)))
                })
                .collect();

            slices.sort_by_key(|(s, _)| s.start);

            for window in slices.windows(2) {
                let (a, a_crit) = window[0];
                let (b, b_crit) = window[1];

                if a.stop > b.start {
                    return Err(DiscardReason::FeasibilityMiss(FeasibilityMiss::SliceOverlap { cpu: cpu.id, core: core.id }));
                }

                if a_crit != b_crit {
                    let gap = b.start.saturating_sub(a.stop);
                    if gap < switch_time {
                        return Err(DiscardReason::FeasibilityMiss(FeasibilityMiss::SwitchTimeTooShort {
                            cpu: cpu.id,
                            core: core.id,
                            gap,
                            required: switch_time,
                        }));
                    }
                }
            }
        }
    }

    Ok(())
}

/// Per-index rule (§4.7): for every `app.order = true` app and every job
/// index `k`, task `i+1`'s k-th job must start no earlier than task `i`'s
/// k-th job stops.
fn check_app_ordering(graph: &Graph) -> Result<(), DiscardReason> {
    for (app_index, app) in graph.apps.iter().enumerate() {
        if !app.order {
            continue;
        }

        for pair in app.tasks.windows(2) {
            let earlier = &pair[0];
            let later = &pair[1];

            let job_count = earlier.jobs.len().min(later.jobs.len());

            for k in 0..job_count {
                let earlier_stop = earlier.jobs[k].execution.last().map(|s| s.stop);
                let later_start = later.jobs[k].execution.first().map(|s| s.start);

                if let (Some(earlier_stop), Some(later_start)) = (earlier_stop, later_start) {
                    if later_start < earlier_stop {
                        return Err(DiscardReason::FeasibilityMiss(FeasibilityMiss::OrderViolation { app: app_index, job_index: k }));
                    }
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(wcet: u64, period: u64) -> Task {
        Task::new(1, 0, Time::nanos(wcet), Time::nanos(period), Time::nanos(period), Criticality::MIN, None)
    }

    fn scheduled_single_core(t: Task) -> (Architecture, Graph) {
        let apps = vec![App::new("A", false, vec![t])];
        let mut graph = Graph::new(apps);

        let mut arch = Architecture::new(vec![Cpu::new(0, 1)]);
        arch.cpus[0].cores[0].push_task(TaskId { app: 0, task: 0 }, graph.apps[0].tasks[0].workload());

        crate::scheduler::schedule(&arch, &mut graph, &crate::policy::Policy::edf(), Time::zero()).unwrap();
        (arch, graph)
    }

    #[test]
    fn accepts_a_fully_scheduled_problem() {
        let (arch, graph) = scheduled_single_core(task(3, 10));
        assert!(check(&arch, &graph, Time::zero()).is_ok());
    }

    #[test]
    fn rejects_unscheduled_jobs() {
        let apps = vec![App::new("A", false, vec![task(3, 10)])];
        let graph = Graph::new(apps);
        let arch = Architecture::new(vec![Cpu::new(0, 1)]);

        assert!(check(&arch, &graph, Time::zero()).is_err());
    }

    #[test]
    fn detects_switch_time_violation() {
        let apps = vec![App::new("A", false, vec![
            Task::new(1, 0, Time::nanos(2), Time::nanos(10), Time::nanos(10), Criticality::new(2).unwrap(), None),
            Task::new(2, 0, Time::nanos(3), Time::nanos(10), Time::nanos(10), Criticality::new(1).unwrap(), None),
        ])];
        let mut graph = Graph::new(apps);

        let mut arch = Architecture::new(vec![Cpu::new(0, 1)]);
        arch.cpus[0].cores[0].push_task(TaskId { app: 0, task: 0 }, graph.apps[0].tasks[0].workload());
        arch.cpus[0].cores[0].push_task(TaskId { app: 0, task: 1 }, graph.apps[0].tasks[1].workload());

        crate::scheduler::schedule(&arch, &mut graph, &crate::policy::Policy::edf(), Time::nanos(1)).unwrap();
        assert!(check(&arch, &graph, Time::nanos(1)).is_ok());
        assert!(check(&arch, &graph, Time::nanos(5)).is_err());
    }
}
