//! Scalar objectives over a scheduled `Graph`, bundled as variant records
//! the same way [`crate::policy::Policy`] bundles algorithms.

use std::cmp::Ordering;

use crate::domain::prelude::*;
use crate::time::Time;

/// A schedule's scalar quality figure. Kept as `OrderedFloat` so it totals
/// across cores/apps without a `NaN`-handling dance and sorts directly in a
/// `BinaryHeap`/`sort_by_key`.
pub type Score = ordered_float::OrderedFloat<f64>;

/// An objective: a name, a scoring function, and the comparator that says
/// which of two scores is better (free-space objectives maximise, delay
/// objectives minimise).
#[derive(Clone, Copy)]
pub struct Objective {
    pub name: &'static str,
    score: fn(&Architecture, &Graph) -> Score,
    compare: fn(Score, Score) -> Ordering,
}

impl std::fmt::Debug for Objective {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Objective").field("name", &self.name).finish()
    }
}

impl Objective {
    pub fn score(&self, architecture: &Architecture, graph: &Graph) -> Score {
        (self.score)(architecture, graph)
    }

    /// `Ordering::Greater` when `a` is the better of the two scores under
    /// this objective.
    pub fn compare(&self, a: Score, b: Score) -> Ordering {
        (self.compare)(a, b)
    }

    pub fn cumulated_free_space() -> Self {
        Self {
            name: "cumulated_free_space",
            score: |architecture, graph| Score::from(cumulated_free_space(architecture, graph).as_nanos() as f64),
            compare: |a, b| a.cmp(&b),
        }
    }

    pub fn normal_free_space() -> Self {
        Self {
            name: "normal_free_space",
            score: |architecture, graph| Score::from(idle_interval_variance(architecture, graph)),
            compare: |a, b| b.cmp(&a),
        }
    }

    pub fn end_to_end_delay() -> Self {
        Self {
            name: "end_to_end_delay",
            score: |_architecture, graph| Score::from(end_to_end_delay(graph).as_nanos() as f64),
            compare: |a, b| b.cmp(&a),
        }
    }

    pub fn by_name(name: &str) -> Option<Self> {
        match name {
            "cumulated_free_space" => Some(Self::cumulated_free_space()),
            "normal_free_space" => Some(Self::normal_free_space()),
            "end_to_end_delay" => Some(Self::end_to_end_delay()),
            _ => None,
        }
    }
}

/// `H - (Σ slice.len + switch cost already paid as gaps)` summed over every
/// core (spec §4.6 f₁): idle time that is only reachable by crossing a
/// criticality boundary does not count as free space, since a real
/// partition switch already spent it.
fn cumulated_free_space(architecture: &Architecture, graph: &Graph) -> Time {
    architecture.cpus.iter()
        .flat_map(|cpu| cpu.cores.iter())
        .map(|core| {
            let idle = graph.hyperperiod.saturating_sub(busy_time(core, graph));
            idle.saturating_sub(switch_gap_time(core, graph))
        })
        .sum()
}

fn busy_time(core: &Core, graph: &Graph) -> Time {
    core.tasks.iter()
        .flat_map(|t| graph.task(t.id).jobs.iter())
        .flat_map(|job| job.execution.iter())
        .map(Slice::len)
        .sum()
}

/// Total gap time between chronologically adjacent slices on `core` whose
/// jobs differ in criticality: the partition-switch cost already spent,
/// not free space.
fn switch_gap_time(core: &Core, graph: &Graph) -> Time {
    let mut slices: Vec<(Slice, Criticality)> = core.tasks.iter()
        .flat_map(|t| {
            let task = graph.task(t.id);
            task.jobs.iter().flat_map(move |job| job.execution.iter().map(move |s| (*s, task.criticality)))
        })
        .collect();
    slices.sort_by_key(|(s, _)| s.start);

    slices.windows(2)
        .filter(|pair| pair[0].1 != pair[1].1)
        .map(|pair| pair[1].0.start.saturating_sub(pair[0].0.stop))
        .sum()
}

/// Population variance (`Σ(x − mean)² / n`) of every core's idle interval
/// lengths (leading gap, gaps between slices, trailing gap), pooled across
/// all cores.
fn idle_interval_variance(architecture: &Architecture, graph: &Graph) -> f64 {
    let idle: Vec<f64> = architecture.cpus.iter()
        .flat_map(|cpu| cpu.cores.iter())
        .flat_map(|core| idle_intervals(core, graph))
        .map(|t| t.as_nanos() as f64)
        .collect();

    if idle.is_empty() {
        return 0.0;
    }

    let mean = idle.iter().sum::<f64>() / idle.len() as f64;
    idle.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / idle.len() as f64
}

fn idle_intervals(core: &Core, graph: &Graph) -> Vec<Time> {
    let mut slices: Vec<Slice> = core.tasks.iter()
        .flat_map(|t| graph.task(t.id).jobs.iter())
        .flat_map(|job| job.execution.iter().copied())
        .collect();
    slices.sort_by_key(|s| s.start);

    let mut intervals = Vec::new();
    let mut cursor = Time::zero();

    for slice in &slices {
        if slice.start > cursor {
            intervals.push(slice.start - cursor);
        }
        cursor = cursor.max(slice.stop);
    }

    if graph.hyperperiod > cursor {
        intervals.push(graph.hyperperiod - cursor);
    }

    intervals
}

/// Sum, over every app, of its end-to-end delay: for ordered apps, the gap
/// from the first task's first slice start to the last task's last slice
/// stop; for unordered apps, the span between the earliest first-slice
/// start and the latest last-slice stop across its tasks.
fn end_to_end_delay(graph: &Graph) -> Time {
    graph.apps.iter().map(|app| app_delay(app)).sum()
}

fn app_delay(app: &App) -> Time {
    if app.tasks.is_empty() {
        return Time::zero();
    }

    if app.order {
        let first = app.tasks.first().expect("non-empty");
        let last = app.tasks.last().expect("non-empty");

        let start = first.jobs.first().and_then(|j| j.execution.first()).map(|s| s.start).unwrap_or(Time::zero());
        let stop = last.jobs.last().and_then(|j| j.execution.last()).map(|s| s.stop).unwrap_or(Time::zero());

        stop.saturating_sub(start)
    } else {
        let starts = app.tasks.iter()
            .filter_map(|t| t.jobs.first().and_then(|j| j.execution.first()).map(|s| s.start));
        let stops = app.tasks.iter()
            .filter_map(|t| t.jobs.last().and_then(|j| j.execution.last()).map(|s| s.stop));

        let min_start = starts.min().unwrap_or(Time::zero());
        let max_stop = stops.max().unwrap_or(Time::zero());

        max_stop.saturating_sub(min_start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(wcet: u64, period: u64) -> Task {
        Task::new(1, 0, Time::nanos(wcet), Time::nanos(period), Time::nanos(period), Criticality::MIN, None)
    }

    #[test]
    fn cumulated_free_space_matches_seed_scenario_one() {
        let apps = vec![App::new("A", false, vec![task(3, 10)])];
        let mut graph = Graph::new(apps);

        let mut arch = Architecture::new(vec![Cpu::new(0, 1)]);
        arch.cpus[0].cores[0].push_task(TaskId { app: 0, task: 0 }, graph.apps[0].tasks[0].workload());

        crate::scheduler::schedule(&arch, &mut graph, &crate::policy::Policy::edf(), Time::zero()).unwrap();

        let objective = Objective::cumulated_free_space();
        assert_eq!(objective.score(&arch, &graph), Score::from(7.0));
    }

    #[test]
    fn cumulated_free_space_excludes_switch_gap_matches_seed_scenario_three() {
        let apps = vec![App::new("A", false, vec![
            Task::new(1, 0, Time::nanos(2), Time::nanos(10), Time::nanos(10), Criticality::new(2).unwrap(), None),
            Task::new(2, 0, Time::nanos(3), Time::nanos(10), Time::nanos(10), Criticality::new(1).unwrap(), None),
        ])];
        let mut graph = Graph::new(apps);

        let mut arch = Architecture::new(vec![Cpu::new(0, 1)]);
        arch.cpus[0].cores[0].push_task(TaskId { app: 0, task: 0 }, graph.apps[0].tasks[0].workload());
        arch.cpus[0].cores[0].push_task(TaskId { app: 0, task: 1 }, graph.apps[0].tasks[1].workload());

        crate::scheduler::schedule(&arch, &mut graph, &crate::policy::Policy::edf(), Time::nanos(1)).unwrap();

        let objective = Objective::cumulated_free_space();
        assert_eq!(objective.score(&arch, &graph), Score::from(4.0));
    }

    #[test]
    fn higher_score_is_better_for_cumulated_free_space() {
        let objective = Objective::cumulated_free_space();
        assert_eq!(objective.compare(Score::from(10.0), Score::from(5.0)), Ordering::Greater);
    }

    #[test]
    fn lower_score_is_better_for_normal_free_space() {
        let objective = Objective::normal_free_space();
        assert_eq!(objective.compare(Score::from(1.0), Score::from(5.0)), Ordering::Greater);
    }
}
