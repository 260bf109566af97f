//! `Graph`, `App` and `Task`: the task-set half of the domain model.

use crate::domain::job::Job;
use crate::domain::{TaskId, Workload};
use crate::time::Time;

/// Criticality level, `0..=4`. Higher runs first on a shared core.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct Criticality(u8);

impl Criticality {
    pub const MIN: Criticality = Criticality(0);
    pub const MAX: Criticality = Criticality(4);

    pub fn new(level: u8) -> Result<Self, CriticalityError> {
        if level <= 4 {
            Ok(Criticality(level))
        } else {
            Err(CriticalityError { level })
        }
    }

    pub fn level(self) -> u8 {
        self.0
    }
}

#[derive(Debug)]
pub struct CriticalityError {
    pub level: u8,
}

impl std::fmt::Display for CriticalityError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "criticality {} out of range 0..=4", self.level)
    }
}

impl std::error::Error for CriticalityError {}

/// A periodic task. `wcet <= deadline <= period` is assumed to hold of the
/// input and is not re-derived here.
#[derive(Clone, Debug)]
pub struct Task {
    pub id: u32,
    pub app: usize,
    pub wcet: Time,
    pub period: Time,
    pub deadline: Time,
    pub criticality: Criticality,
    /// Index, within the same app's task list, of the task that must
    /// complete before this one when `App::order` is set.
    pub parent: Option<usize>,
    pub jobs: Vec<Job>,
    workload: Workload,
}

impl Task {
    pub fn new(
        id: u32,
        app: usize,
        wcet: Time,
        period: Time,
        deadline: Time,
        criticality: Criticality,
        parent: Option<usize>,
    ) -> Self {
        let workload = Workload::from(wcet.as_nanos() as f64 / period.as_nanos() as f64);

        Self { id, app, wcet, period, deadline, criticality, parent, jobs: Vec::new(), workload }
    }

    /// `wcet / period`, cached at construction since both are immutable.
    pub fn workload(&self) -> Workload {
        self.workload
    }

    pub fn short(&self) -> String {
        format!("task#{}", self.id)
    }
}

/// An application: a group of tasks scheduled together, optionally under a
/// declared linear precedence order.
#[derive(Clone, Debug)]
pub struct App {
    pub name: String,
    /// When set, tasks execute in `tasks` order across every hyperperiod
    /// instance (see the feasibility checker's per-index ordering rule).
    pub order: bool,
    pub tasks: Vec<Task>,
}

impl App {
    pub fn new(name: impl Into<String>, order: bool, tasks: Vec<Task>) -> Self {
        Self { name: name.into(), order, tasks }
    }

    /// The maximum criticality among this app's tasks.
    ///
    /// Panics if `tasks` is empty; an app with no tasks is not a meaningful
    /// input and callers are expected to reject it during problem build.
    pub fn criticality(&self) -> Criticality {
        self.tasks.iter().map(|task| task.criticality).max()
            .expect("app must have at least one task")
    }

    pub fn workload(&self) -> Workload {
        self.tasks.iter().map(Task::workload).sum()
    }
}

/// The full task graph: an ordered sequence of apps plus the hyperperiod
/// derived from their periods.
#[derive(Clone, Debug)]
pub struct Graph {
    pub apps: Vec<App>,
    pub hyperperiod: Time,
}

impl Graph {
    /// Builds a graph from apps, computing the hyperperiod as the LCM of
    /// every task's period, then expanding jobs for every task.
    pub fn new(mut apps: Vec<App>) -> Self {
        let hyperperiod = Self::compute_hyperperiod(&apps);

        for app in &mut apps {
            for task in &mut app.tasks {
                task.jobs = crate::domain::job::expand_jobs(task, hyperperiod);
            }
        }

        Self { apps, hyperperiod }
    }

    fn compute_hyperperiod(apps: &[App]) -> Time {
        let lcm_ns = apps.iter()
            .flat_map(|app| app.tasks.iter())
            .map(|task| task.period.as_nanos())
            .fold(1u64, num::integer::lcm);

        Time::nanos(lcm_ns)
    }

    /// Apps ordered by descending criticality, the priority order the
    /// mapper consumes them in.
    pub fn apps_by_descending_criticality(&self) -> Vec<usize> {
        let mut indices: Vec<usize> = (0..self.apps.len()).collect();
        indices.sort_by_key(|&i| std::cmp::Reverse(self.apps[i].criticality()));

        indices
    }

    pub fn task(&self, id: TaskId) -> &Task {
        &self.apps[id.app].tasks[id.task]
    }

    pub fn task_mut(&mut self, id: TaskId) -> &mut Task {
        &mut self.apps[id.app].tasks[id.task]
    }

    pub fn total_workload(&self) -> Workload {
        self.apps.iter().map(App::workload).sum()
    }

    /// All task ids in the graph, in declaration order.
    pub fn task_ids(&self) -> impl Iterator<Item = TaskId> + '_ {
        self.apps.iter().enumerate()
            .flat_map(|(app, a)| (0..a.tasks.len()).map(move |task| TaskId { app, task }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(wcet: u64, period: u64, deadline: u64, crit: u8) -> Task {
        Task::new(1, 0, Time::nanos(wcet), Time::nanos(period), Time::nanos(deadline), Criticality::new(crit).unwrap(), None)
    }

    #[test]
    fn hyperperiod_is_lcm_of_periods() {
        let apps = vec![
            App::new("A", false, vec![task(2, 4, 4, 0)]),
            App::new("B", false, vec![task(3, 6, 6, 0)]),
        ];

        let graph = Graph::new(apps);
        assert_eq!(graph.hyperperiod, Time::nanos(12));
    }

    #[test]
    fn job_count_matches_hyperperiod_over_period() {
        let apps = vec![App::new("A", false, vec![task(2, 4, 4, 0)])];
        let graph = Graph::new(apps);

        assert_eq!(graph.apps[0].tasks[0].jobs.len(), 3);
    }

    #[test]
    fn app_criticality_is_max_of_tasks() {
        let app = App::new("A", false, vec![task(1, 10, 10, 1), task(1, 10, 10, 3)]);
        assert_eq!(app.criticality(), Criticality::new(3).unwrap());
    }
}
