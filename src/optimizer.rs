//! The local-search hill-climber: starting from an initial feasible
//! schedule, repeatedly narrows job execution windows and swaps same-app
//! tasks across cores of the same CPU, keeping every generation of
//! candidates that is no worse than the last.

use std::cmp::Ordering;

use rand::rngs::StdRng;
use rand::Rng;
use tracing::{info, instrument};

use crate::domain::prelude::*;
use crate::error::DiscardReason;
use crate::objective::{Objective, Score};
use crate::policy::Policy;
use crate::time::Time;
use crate::{feasibility, scheduler};

/// A fully scheduled candidate: its own architecture and graph (the
/// optimiser's unit of deep-clone), cached score and offset sum, and the
/// generation it was produced in.
#[derive(Clone)]
pub struct Solution {
    pub architecture: Architecture,
    pub graph: Graph,
    pub score: Score,
    pub offset_sum: Time,
    pub generation: usize,
}

impl Solution {
    pub fn new(architecture: Architecture, graph: Graph, objective: &Objective, generation: usize) -> Self {
        let score = objective.score(&architecture, &graph);
        let offset_sum = graph.apps.iter()
            .flat_map(|app| app.tasks.iter())
            .flat_map(|task| task.jobs.iter())
            .map(|job| job.offset())
            .sum();

        Self { architecture, graph, score, offset_sum, generation }
    }
}

/// Ranks `a` against `b` under `objective`: `Greater` means `a` is
/// preferred. Primary key is the objective score, secondary is ascending
/// offset sum (less perturbation wins), tertiary is earliest generation.
fn rank(objective: &Objective, a: &Solution, b: &Solution) -> Ordering {
    objective.compare(a.score, b.score)
        .then_with(|| b.offset_sum.cmp(&a.offset_sum))
        .then_with(|| b.generation.cmp(&a.generation))
}

/// Runs the hill-climb to completion and returns the best solution found.
///
/// `trial_limit`, when set, caps the number of generations explored
/// (beyond the seed generation) regardless of whether the climb is still
/// improving; `None` runs until no improving neighbour exists.
#[allow(clippy::too_many_arguments)]
#[instrument(skip_all)]
pub fn optimize(
    initial: Solution,
    policy: &Policy,
    objective: &Objective,
    switch_time: Time,
    step: Time,
    margin: f64,
    trial_limit: Option<u32>,
    rng: &mut StdRng,
) -> Solution {
    let mut generations: Vec<Vec<Solution>> = vec![vec![initial]];

    loop {
        if trial_limit.is_some_and(|limit| generations.len() as u32 > limit) {
            break;
        }

        let current_best = best_of(generations.last().expect("at least one generation"), objective);
        let candidates = neighbours(current_best, policy, objective, switch_time, step, margin, generations.len(), rng);

        if candidates.is_empty() {
            break;
        }

        let candidate_best = best_of(&candidates, objective);

        if rank(objective, candidate_best, current_best) == Ordering::Less {
            break;
        }

        info!(generation = generations.len(), candidates = candidates.len(), score = candidate_best.score.into_inner(), "accepted generation");
        generations.push(candidates);
    }

    let final_generation = generations.last().expect("at least one generation");
    best_of(final_generation, objective).clone()
}

fn best_of<'a>(solutions: &'a [Solution], objective: &Objective) -> &'a Solution {
    solutions.iter()
        .max_by(|a, b| rank(objective, a, b))
        .expect("generation is never empty")
}

/// Generates every neighbour of `current` reachable by narrowing one job's
/// execution window by `step`, plus (when the alteration table is
/// non-empty) one random cross-core task swap, re-scheduling and
/// feasibility-checking each before it is kept.
#[allow(clippy::too_many_arguments)]
fn neighbours(
    current: &Solution,
    policy: &Policy,
    objective: &Objective,
    switch_time: Time,
    step: Time,
    margin: f64,
    generation: usize,
    rng: &mut StdRng,
) -> Vec<Solution> {
    let mut candidates = Vec::new();

    for id in current.graph.task_ids() {
        let task = current.graph.task(id);

        for job_index in 0..task.jobs.len() {
            if let Some(solution) = try_narrow(current, id, job_index, step, policy, objective, switch_time, generation) {
                candidates.push(solution);
            }
        }
    }

    if let Some(solution) = try_random_swap(current, policy, objective, switch_time, margin, generation, rng) {
        candidates.push(solution);
    }

    candidates
}

/// Attempts to narrow job `(id, job_index)`'s `exec_window` from the left
/// by `step`, re-schedule, and check feasibility. Returns `None` if there
/// is not enough slack, or if the narrowed schedule is infeasible.
fn try_narrow(
    current: &Solution,
    id: TaskId,
    job_index: usize,
    step: Time,
    policy: &Policy,
    objective: &Objective,
    switch_time: Time,
    generation: usize,
) -> Option<Solution> {
    let task = current.graph.task(id);
    let job = &task.jobs[job_index];
    let window_len = job.exec_window.stop.saturating_sub(job.exec_window.start);
    let slack = window_len.saturating_sub(task.wcet);

    if slack < step {
        return None;
    }

    let mut architecture = current.architecture.clone();
    let mut graph = current.graph.clone();

    let job = &mut graph.task_mut(id).jobs[job_index];
    job.exec_window.start = job.exec_window.start + step;

    evaluate(&mut architecture, &mut graph, policy, objective, switch_time, generation).ok()
}

/// Picks one app with tasks spread across ≥ 2 cores of the same CPU,
/// swaps one of its tasks between two such cores, and keeps the result if
/// both affected cores still pass the policy's local test and the
/// re-scheduled, re-checked candidate is feasible.
fn try_random_swap(
    current: &Solution,
    policy: &Policy,
    objective: &Objective,
    switch_time: Time,
    margin: f64,
    generation: usize,
    rng: &mut StdRng,
) -> Option<Solution> {
    let possibilities = alteration_possibilities(&current.architecture, &current.graph);
    if possibilities.is_empty() {
        return None;
    }

    let choice = &possibilities[rng.gen_range(0..possibilities.len())];
    let task_a = choice.tasks_on_a[rng.gen_range(0..choice.tasks_on_a.len())];
    let task_b = choice.tasks_on_b[rng.gen_range(0..choice.tasks_on_b.len())];

    let mut architecture = current.architecture.clone();
    let mut graph = current.graph.clone();

    {
        let cpu = architecture.cpu_mut(choice.cpu_id);
        let core_a = cpu.core_mut(choice.core_a);
        let workload_a = current.graph.task(task_a).workload();
        core_a.remove_task(task_a);
        core_a.push_task(task_b, current.graph.task(task_b).workload());

        let core_b = cpu.core_mut(choice.core_b);
        core_b.remove_task(task_b);
        core_b.push_task(task_a, workload_a);
    }

    let cpu = architecture.cpu_mut(choice.cpu_id);
    let core_a = cpu.cores.iter().find(|c| c.id == choice.core_a).expect("core present");
    let core_b = cpu.cores.iter().find(|c| c.id == choice.core_b).expect("core present");

    if policy.local_test(core_a.workload(), 1, margin, core_a.tasks.len()).is_some() {
        return None;
    }
    if policy.local_test(core_b.workload(), 1, margin, core_b.tasks.len()).is_some() {
        return None;
    }

    evaluate(&mut architecture, &mut graph, policy, objective, switch_time, generation).ok()
}

fn evaluate(
    architecture: &mut Architecture,
    graph: &mut Graph,
    policy: &Policy,
    objective: &Objective,
    switch_time: Time,
    generation: usize,
) -> Result<Solution, DiscardReason> {
    scheduler::schedule(architecture, graph, policy, switch_time)
        .map_err(|err| match err {
            crate::error::ProblemError::SchedulingFailure { task, job, .. } => DiscardReason::SchedulingFailure { task, job },
            // `schedule` only ever fails with `SchedulingFailure`; this arm exists for
            // exhaustiveness against the shared `ProblemError` enum.
            _ => DiscardReason::SchedulingFailure { task: TaskId { app: 0, task: 0 }, job: 0 },
        })?;

    feasibility::check(architecture, graph, switch_time)?;

    Ok(Solution::new(architecture.clone(), graph.clone(), objective, generation))
}

struct Alteration {
    cpu_id: u32,
    core_a: u32,
    core_b: u32,
    tasks_on_a: Vec<TaskId>,
    tasks_on_b: Vec<TaskId>,
}

/// For every app mapped across ≥ 2 distinct cores of the same CPU, records
/// every pair of those cores together with the app's tasks on each, so the
/// optimiser can propose a swap that keeps the app on one CPU.
fn alteration_possibilities(architecture: &Architecture, graph: &Graph) -> Vec<Alteration> {
    let mut result = Vec::new();

    for cpu in &architecture.cpus {
        for &app_index in &cpu.apps {
            let app = &graph.apps[app_index];
            if app.tasks.len() < 2 {
                continue;
            }

            let mut cores_with_app: Vec<(u32, Vec<TaskId>)> = Vec::new();

            for core in &cpu.cores {
                let tasks: Vec<TaskId> = core.tasks.iter()
                    .map(|t| t.id)
                    .filter(|id| id.app == app_index)
                    .collect();

                if !tasks.is_empty() {
                    cores_with_app.push((core.id, tasks));
                }
            }

            if cores_with_app.len() < 2 {
                continue;
            }

            for i in 0..cores_with_app.len() {
                for j in (i + 1)..cores_with_app.len() {
                    result.push(Alteration {
                        cpu_id: cpu.id,
                        core_a: cores_with_app[i].0,
                        core_b: cores_with_app[j].0,
                        tasks_on_a: cores_with_app[i].1.clone(),
                        tasks_on_b: cores_with_app[j].1.clone(),
                    });
                }
            }
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn task(wcet: u64, period: u64) -> Task {
        Task::new(1, 0, Time::nanos(wcet), Time::nanos(period), Time::nanos(period), Criticality::MIN, None)
    }

    #[test]
    fn optimizer_never_regresses_the_initial_solution() {
        let apps = vec![App::new("A", false, vec![task(2, 4)])];
        let mut graph = Graph::new(apps);
        let mut arch = Architecture::new(vec![Cpu::new(0, 1)]);
        arch.cpus[0].cores[0].push_task(TaskId { app: 0, task: 0 }, graph.apps[0].tasks[0].workload());

        let policy = Policy::edf();
        scheduler::schedule(&arch, &mut graph, &policy, Time::zero()).unwrap();

        let objective = Objective::cumulated_free_space();
        let initial = Solution::new(arch, graph, &objective, 0);
        let initial_score = initial.score;

        let mut rng = StdRng::seed_from_u64(42);
        let best = optimize(initial, &policy, &objective, Time::zero(), Time::nanos(1), 0.9, None, &mut rng);

        assert!(objective.compare(best.score, initial_score) != Ordering::Less);
    }

    #[test]
    fn trial_limit_stops_the_climb_after_the_given_generation_count() {
        let apps = vec![App::new("A", false, vec![task(2, 10)])];
        let mut graph = Graph::new(apps);
        let mut arch = Architecture::new(vec![Cpu::new(0, 1)]);
        arch.cpus[0].cores[0].push_task(TaskId { app: 0, task: 0 }, graph.apps[0].tasks[0].workload());

        let policy = Policy::edf();
        scheduler::schedule(&arch, &mut graph, &policy, Time::zero()).unwrap();

        let objective = Objective::cumulated_free_space();
        let initial = Solution::new(arch, graph, &objective, 0);

        let mut rng = StdRng::seed_from_u64(7);
        let best = optimize(initial, &policy, &objective, Time::zero(), Time::nanos(1), 0.9, Some(0), &mut rng);

        assert_eq!(best.generation, 0);
    }

    #[test]
    fn rank_prefers_smaller_offset_sum_on_tied_score() {
        let objective = Objective::cumulated_free_space();

        let apps = vec![App::new("A", false, vec![task(2, 4)])];
        let mut graph = Graph::new(apps);
        let mut arch = Architecture::new(vec![Cpu::new(0, 1)]);
        arch.cpus[0].cores[0].push_task(TaskId { app: 0, task: 0 }, graph.apps[0].tasks[0].workload());
        scheduler::schedule(&arch, &mut graph, &Policy::edf(), Time::zero()).unwrap();

        let mut a = Solution::new(arch.clone(), graph.clone(), &objective, 0);
        let mut b = Solution::new(arch, graph, &objective, 0);
        a.offset_sum = Time::nanos(5);
        b.offset_sum = Time::nanos(1);

        assert_eq!(rank(&objective, &a, &b), Ordering::Less);
    }
}
