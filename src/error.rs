//! Fatal problem-level errors, and the discard reasons that abort a single
//! optimiser candidate without aborting the problem.
//!
//! The split mirrors this crate's two pre-existing error idioms: a typed,
//! `thiserror`-backed variant enum for the handful of fatal conditions that
//! should carry structured context up to the CLI boundary, and a plain
//! non-`anyhow` enum for outcomes that are routine during neighbour search
//! and must never unwind past the optimiser loop.

use crate::domain::{TaskId, Workload};
use crate::time::Time;

/// Fatal errors: abort the current problem. Reported to the CLI boundary
/// with `anyhow::Error`'s context chain via `#[from]`/`?`.
#[derive(Debug, thiserror::Error)]
pub enum ProblemError {
    #[error("malformed input: {0}")]
    InputError(String),

    #[error("unknown algorithm: {0}")]
    UnknownAlgorithm(String),

    #[error("unknown objective: {0}")]
    UnknownObjective(String),

    #[error("total workload {workload} exceeds global admission bound {bound}")]
    GlobalAdmissionFailure { workload: Workload, bound: Workload },

    #[error("no cpu can admit app #{app} (workload {workload}, bound {bound})")]
    InitialMappingError { app: usize, workload: Workload, bound: Workload },

    #[error("initial schedule infeasible: core ({cpu}, {core}) cannot place job {job} of task {task}")]
    SchedulingFailure { cpu: u32, core: u32, task: TaskId, job: usize },

    #[error("invariant violated: {0}")]
    InvariantViolation(String),
}

impl ProblemError {
    pub fn invariant(detail: impl std::fmt::Display) -> Self {
        Self::InvariantViolation(detail.to_string())
    }
}

/// Why a single optimiser candidate was discarded. Never escapes the
/// optimiser: every `neighbours()` call turns this into a filtered-out
/// candidate, not a propagated error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DiscardReason {
    /// The timeline scheduler could not place every slice of `job` within
    /// its narrowed execution window.
    SchedulingFailure { task: TaskId, job: usize },
    /// The candidate violates one of the feasibility checker's quantified
    /// invariants (pairwise overlap, switch-time gap, or app ordering).
    FeasibilityMiss(FeasibilityMiss),
}

impl std::fmt::Display for DiscardReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SchedulingFailure { task, job } => {
                write!(f, "could not schedule {task}/job#{job} within its execution window")
            }
            Self::FeasibilityMiss(miss) => write!(f, "{miss}"),
        }
    }
}

/// The specific quantified invariant a candidate failed, for diagnostics.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FeasibilityMiss {
    SliceOverlap { cpu: u32, core: u32 },
    SwitchTimeTooShort { cpu: u32, core: u32, gap: Time, required: Time },
    OrderViolation { app: usize, job_index: usize },
}

impl std::fmt::Display for FeasibilityMiss {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SliceOverlap { cpu, core } => {
                write!(f, "overlapping slices on core ({cpu}, {core})")
            }
            Self::SwitchTimeTooShort { cpu, core, gap, required } => {
                write!(f, "partition switch gap {gap} on core ({cpu}, {core}) is below the required {required}")
            }
            Self::OrderViolation { app, job_index } => {
                write!(f, "app #{app} violates declared precedence order at job index {job_index}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discard_reason_displays_readable_message() {
        let reason = DiscardReason::FeasibilityMiss(FeasibilityMiss::SwitchTimeTooShort {
            cpu: 0,
            core: 1,
            gap: Time::nanos(1),
            required: Time::nanos(5),
        });

        assert!(reason.to_string().contains("below the required"));
    }
}
