//! Parses a problem (architecture + task graph) from some origin, and
//! layers a scheduler configuration file under CLI overrides.
//!
//! `ProblemSource` is the seam a future XML collaborator could implement
//! without touching any other module; this crate ships a JSON reader and a
//! line-oriented plain-text reader, generalizing the taskset-only
//! `taskset_serde` this crate started from to the full architecture/graph
//! pair the mapper and scheduler need.

pub mod config;
pub mod json;
pub mod plain;

use crate::domain::prelude::*;
use crate::error::ProblemError;

pub use config::{CliOverrides, Configuration};
pub use json::JsonProblemSource;
pub use plain::PlainProblemSource;

/// Something that can produce an `(Architecture, Graph)` pair. Implemented
/// by the bundled JSON and plain-text readers; a future XML reader would
/// implement this trait and slot in without changes elsewhere.
pub trait ProblemSource {
    fn load(&self) -> Result<(Architecture, Graph), ProblemError>;
}

#[cfg(test)]
pub(crate) fn app_from_tasks(name: &str, order: bool, tasks: Vec<Task>) -> App {
    App::new(name, order, tasks)
}
