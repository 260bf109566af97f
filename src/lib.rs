//! Offline static scheduler for mixed-criticality periodic task sets on
//! partitioned multicore architectures.
//!
//! The pipeline: [`input`] parses a problem into an [`domain::arch::Architecture`]
//! and a [`domain::graph::Graph`], [`mapper`] assigns apps to cores under a
//! [`policy::Policy`]'s admission bound, [`scheduler`] builds an initial
//! per-core timeline, [`optimizer`] hill-climbs that timeline against an
//! [`objective::Objective`] while [`feasibility`] keeps every candidate
//! honest, and [`output`] serialises the winner. [`driver::solve`] ties the
//! whole pipeline together; the CLI binary in `src/cli-bin` is a thin shell
//! around it.

pub mod prelude {
    pub use super::domain::prelude::*;
    pub use super::driver::{solve, ProblemConfig};
    pub use super::error::{DiscardReason, FeasibilityMiss, ProblemError};
    pub use super::input::{Configuration, JsonProblemSource, PlainProblemSource, ProblemSource};
    pub use super::objective::{Objective, Score};
    pub use super::output::{JsonFormatter, ScheduleFormatter, ScheduleRecord};
    pub use super::policy::Policy;
    pub use super::time::Time;
}

pub mod time;
pub mod domain;
pub mod error;
pub mod policy;
pub mod mapper;
pub mod scheduler;
pub mod objective;
pub mod feasibility;
pub mod optimizer;
pub mod driver;
pub mod input;
pub mod output;
