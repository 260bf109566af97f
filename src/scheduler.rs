//! The timeline scheduler: turns a `core → jobs` mapping into concrete,
//! non-overlapping execution slices per core.

use tracing::{debug_span, instrument};

use crate::domain::prelude::*;
use crate::error::ProblemError;
use crate::policy::{JobRef, Policy};
use crate::time::Time;

/// A slice already committed to a core's timeline during this scheduling
/// pass, carried alongside the criticality of the job it belongs to so the
/// switch-time shrink can tell whether a gap's neighbour differs in
/// criticality.
#[derive(Clone, Copy)]
struct Placed {
    start: Time,
    stop: Time,
    criticality: Criticality,
}

struct PendingJob {
    id: TaskId,
    job_index: usize,
    criticality: Criticality,
    exec_window: Window,
    wcet: Time,
    period: Time,
}

/// Clears every job's `execution` and recomputes it from scratch, core by
/// core, in the order this module's doc comment describes.
///
/// On the first job that cannot fit its full WCET within its (possibly
/// already-partially-occupied) execution window, returns
/// `ProblemError::SchedulingFailure` naming that job; callers running the
/// optimiser's neighbour search are expected to convert this into a
/// `DiscardReason` rather than propagate it.
#[instrument(skip(architecture, graph, policy), fields(switch_time = switch_time.as_nanos()))]
pub fn schedule(architecture: &Architecture, graph: &mut Graph, policy: &Policy, switch_time: Time) -> Result<(), ProblemError> {
    for app in &mut graph.apps {
        for task in &mut app.tasks {
            for job in &mut task.jobs {
                job.clear_execution();
            }
        }
    }

    for cpu in &architecture.cpus {
        for core in &cpu.cores {
            let _span = debug_span!("schedule_core", cpu = cpu.id, core = core.id).entered();

            let pending = collect_pending_jobs(core, graph);
            let placements = schedule_core(pending, policy, switch_time, cpu.id, core.id)?;

            for (id, job_index, slices) in placements {
                let job = &mut graph.task_mut(id).jobs[job_index];
                job.execution = slices;
            }
        }
    }

    Ok(())
}

fn collect_pending_jobs(core: &Core, graph: &Graph) -> Vec<PendingJob> {
    let mut pending = Vec::new();

    for core_task in &core.tasks {
        let task = graph.task(core_task.id);

        for (job_index, job) in task.jobs.iter().enumerate() {
            pending.push(PendingJob {
                id: core_task.id,
                job_index,
                criticality: task.criticality,
                exec_window: job.exec_window,
                wcet: task.wcet,
                period: task.period,
            });
        }
    }

    pending
}

type CoreSchedule = Vec<(TaskId, usize, Vec<Slice>)>;

/// Schedules every job in `pending` onto a single, initially-empty core
/// timeline: criticality groups in descending order, `policy`'s ordering
/// within a group, greedy earliest-fit placement around previously placed
/// slices.
fn schedule_core(pending: Vec<PendingJob>, policy: &Policy, switch_time: Time, cpu_id: u32, core_id: u32) -> Result<CoreSchedule, ProblemError> {
    let mut criticalities: Vec<Criticality> = pending.iter().map(|j| j.criticality).collect();
    criticalities.sort_unstable();
    criticalities.dedup();
    criticalities.reverse();

    let mut placed: Vec<Placed> = Vec::new();
    let mut result = Vec::with_capacity(pending.len());

    for crit in criticalities {
        let group = order_group(&pending, crit, policy);

        for index in group {
            let job = &pending[index];
            let (slices, remaining) = place_job(job, &placed, switch_time);

            if remaining > Time::zero() {
                return Err(ProblemError::SchedulingFailure {
                    cpu: cpu_id,
                    core: core_id,
                    task: job.id,
                    job: job.job_index,
                });
            }

            for slice in &slices {
                placed.push(Placed { start: slice.start, stop: slice.stop, criticality: crit });
            }
            placed.sort_by_key(|p| p.start);

            result.push((job.id, job.job_index, slices));
        }
    }

    Ok(result)
}

/// Returns the indices into `pending` of every job with criticality `crit`,
/// ordered by `policy`'s job ordering (EDF: absolute deadline, RM: task
/// period).
fn order_group(pending: &[PendingJob], crit: Criticality, policy: &Policy) -> Vec<usize> {
    let mut refs: Vec<(usize, JobRef)> = pending.iter().enumerate()
        .filter(|(_, j)| j.criticality == crit)
        .map(|(i, j)| (i, JobRef {
            id: JobId { task: j.id, job: j.job_index },
            deadline: j.exec_window.stop,
            period: j.period,
        }))
        .collect();

    let mut job_refs: Vec<JobRef> = refs.iter().map(|(_, r)| *r).collect();
    policy.order(&mut job_refs);

    // `policy.order` sorted `job_refs` in place; pull the matching
    // `pending` index for each by job id, since ties on the sort key are
    // otherwise unresolvable from the ordered slice alone.
    job_refs.into_iter()
        .map(|r| {
            let pos = refs.iter().position(|(_, orig)| orig.id == r.id).expect("job present");
            refs.remove(pos).0
        })
        .collect()
}

/// Places `job`'s full WCET into the gaps of `job.exec_window` left open by
/// `placed`, shrinking each gap edge by `switch_time` wherever the
/// neighbouring placed slice differs in criticality. Returns the produced
/// slices and any WCET that could not be placed (zero on success).
fn place_job(job: &PendingJob, placed: &[Placed], switch_time: Time) -> (Vec<Slice>, Time) {
    let window = job.exec_window;

    let forbidden: Vec<Placed> = placed.iter()
        .copied()
        .filter(|p| p.start < window.stop && window.start < p.stop)
        .collect();

    let mut gaps: Vec<(Time, Time)> = Vec::new();
    let mut cursor = window.start;

    for (i, slice) in forbidden.iter().enumerate() {
        let mut gap_start = cursor;
        let mut gap_stop = slice.start;

        if slice.criticality != job.criticality {
            gap_stop = gap_stop.saturating_sub(switch_time);
        }

        if i > 0 && forbidden[i - 1].criticality != job.criticality {
            gap_start = gap_start + switch_time;
        }

        if gap_stop > gap_start {
            gaps.push((gap_start, gap_stop));
        }

        cursor = slice.stop;
    }

    let mut trailing_start = cursor;
    if let Some(last) = forbidden.last() {
        if last.criticality != job.criticality {
            trailing_start = trailing_start + switch_time;
        }
    }

    if trailing_start < window.stop {
        gaps.push((trailing_start, window.stop));
    }

    let mut remaining = job.wcet;
    let mut slices = Vec::new();
    let job_id = JobId { task: job.id, job: job.job_index };

    for (start, stop) in gaps {
        if remaining <= Time::zero() {
            break;
        }

        let width = stop.saturating_sub(start);
        if width <= Time::zero() {
            continue;
        }

        let take = width.min(remaining);
        slices.push(Slice::new(job_id, start, start + take));
        remaining = remaining.saturating_sub(take);
    }

    (slices, remaining)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(wcet: u64, period: u64, crit: u8) -> Task {
        Task::new(1, 0, Time::nanos(wcet), Time::nanos(period), Time::nanos(period), Criticality::new(crit).unwrap(), None)
    }

    fn single_core_setup(t: Task) -> (Architecture, Graph) {
        let apps = vec![App::new("A", false, vec![t])];
        let graph = Graph::new(apps);

        let mut arch = Architecture::new(vec![Cpu::new(0, 1)]);
        arch.cpus[0].cores[0].push_task(TaskId { app: 0, task: 0 }, graph.apps[0].tasks[0].workload());

        (arch, graph)
    }

    #[test]
    fn single_job_with_no_conflicts_consumes_leading_interval() {
        let (arch, mut graph) = single_core_setup(task(3, 10, 0));
        schedule(&arch, &mut graph, &Policy::edf(), Time::zero()).unwrap();

        let job = &graph.apps[0].tasks[0].jobs[0];
        assert_eq!(job.execution.len(), 1);
        assert_eq!(job.execution[0].start, Time::zero());
        assert_eq!(job.execution[0].stop, Time::nanos(3));
    }

    #[test]
    fn wcet_exactly_fills_remaining_space() {
        let (arch, mut graph) = single_core_setup(task(10, 10, 0));
        schedule(&arch, &mut graph, &Policy::edf(), Time::zero()).unwrap();

        let job = &graph.apps[0].tasks[0].jobs[0];
        let total: Time = job.execution.iter().map(Slice::len).sum();
        assert_eq!(total, Time::nanos(10));
    }

    #[test]
    fn higher_criticality_task_is_placed_first_and_respects_switch_time() {
        let apps = vec![App::new("A", false, vec![
            task(2, 10, 2),
            task(3, 10, 1),
        ])];
        let mut graph = Graph::new(apps);

        let mut arch = Architecture::new(vec![Cpu::new(0, 1)]);
        arch.cpus[0].cores[0].push_task(TaskId { app: 0, task: 0 }, graph.apps[0].tasks[0].workload());
        arch.cpus[0].cores[0].push_task(TaskId { app: 0, task: 1 }, graph.apps[0].tasks[1].workload());

        schedule(&arch, &mut graph, &Policy::edf(), Time::nanos(1)).unwrap();

        let high = &graph.apps[0].tasks[0].jobs[0];
        let low = &graph.apps[0].tasks[1].jobs[0];

        assert_eq!(high.execution[0].start, Time::zero());
        assert_eq!(high.execution[0].stop, Time::nanos(2));
        assert!(low.execution[0].start >= Time::nanos(3));
    }
}
