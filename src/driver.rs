//! Ties the pipeline together: build problem → global admission test →
//! initial map + schedule → optimise → return the best solution found.

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::instrument;

use crate::domain::prelude::*;
use crate::error::ProblemError;
use crate::objective::Objective;
use crate::optimizer::{self, Solution};
use crate::policy::{self, Policy};
use crate::time::Time;
use crate::{mapper, scheduler};

/// Everything the driver needs beyond the architecture and graph
/// themselves: which algorithm and objective to use, the switch cost, the
/// optimiser's window-narrowing step, the admission margin, the RNG seed
/// for reproducible random swaps, and an optional cap on the number of
/// generations the optimiser is allowed to climb through.
#[derive(Clone, Debug)]
pub struct ProblemConfig {
    pub algorithm: String,
    pub objective: String,
    pub switch_time: Time,
    pub initial_step: Time,
    pub margin: f64,
    pub rng_seed: u64,
    pub trial_limit: Option<u32>,
}

impl Default for ProblemConfig {
    fn default() -> Self {
        Self {
            algorithm: "edf".to_string(),
            objective: "cumulated_free_space".to_string(),
            switch_time: Time::zero(),
            initial_step: Time::nanos(10),
            margin: policy::DEFAULT_MARGIN,
            rng_seed: 0,
            trial_limit: None,
        }
    }
}

/// Runs the full pipeline on one problem, returning the best solution the
/// optimiser could find. Fatal at any stage before the optimiser starts;
/// the optimiser itself never fails (it simply stops improving).
#[instrument(skip(architecture, graph, config), fields(algorithm = %config.algorithm, objective = %config.objective))]
pub fn solve(mut architecture: Architecture, mut graph: Graph, config: &ProblemConfig) -> Result<Solution, ProblemError> {
    let policy = Policy::by_name(&config.algorithm)
        .ok_or_else(|| ProblemError::UnknownAlgorithm(config.algorithm.clone()))?;
    let objective = Objective::by_name(&config.objective)
        .ok_or_else(|| ProblemError::UnknownObjective(config.objective.clone()))?;

    mapper::check_global_admission(&architecture, &graph, &policy, config.margin)?;
    mapper::map(&mut architecture, &graph, &policy, config.margin)?;
    scheduler::schedule(&architecture, &mut graph, &policy, config.switch_time)?;

    let initial = Solution::new(architecture, graph, &objective, 0);

    let mut rng = StdRng::seed_from_u64(config.rng_seed);
    let best = optimizer::optimize(
        initial,
        &policy,
        &objective,
        config.switch_time,
        config.initial_step,
        config.margin,
        config.trial_limit,
        &mut rng,
    );

    Ok(best)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(wcet: u64, period: u64) -> Task {
        Task::new(1, 0, Time::nanos(wcet), Time::nanos(period), Time::nanos(period), Criticality::MIN, None)
    }

    #[test]
    fn solves_seed_scenario_one() {
        let apps = vec![App::new("A", false, vec![task(3, 10)])];
        let graph = Graph::new(apps);
        let architecture = Architecture::new(vec![Cpu::new(0, 1)]);

        let config = ProblemConfig::default();
        let solution = solve(architecture, graph, &config).unwrap();

        let core = &solution.architecture.cpus[0].cores[0];
        assert_eq!(core.tasks.len(), 1);

        let job = &solution.graph.apps[0].tasks[0].jobs[0];
        assert_eq!(job.execution[0].start, Time::zero());
        assert_eq!(job.execution[0].stop, Time::nanos(3));
    }

    #[test]
    fn rejects_unknown_algorithm() {
        let apps = vec![App::new("A", false, vec![task(3, 10)])];
        let graph = Graph::new(apps);
        let architecture = Architecture::new(vec![Cpu::new(0, 1)]);

        let config = ProblemConfig { algorithm: "bogus".to_string(), ..ProblemConfig::default() };
        assert!(matches!(solve(architecture, graph, &config), Err(ProblemError::UnknownAlgorithm(_))));
    }

    #[test]
    fn raises_global_admission_failure_for_seed_scenario_six() {
        let apps = vec![App::new("A", false, vec![task(10, 10)])];
        let graph = Graph::new(apps);
        let architecture = Architecture::new(vec![Cpu::new(0, 1)]);

        let config = ProblemConfig::default();
        assert!(matches!(solve(architecture, graph, &config), Err(ProblemError::GlobalAdmissionFailure { .. })));
    }
}
