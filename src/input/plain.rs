//! Plain-text problem format: one task per line, `wcet deadline period
//! criticality` in milliseconds, no architecture section. Intended for
//! quick single-core smoke tests, generalizing this crate's pre-existing
//! three-column `wcet deadline period` plain taskset format with a
//! criticality column and an implicit one-CPU, one-core architecture.

use crate::domain::prelude::*;
use crate::error::ProblemError;
use crate::time::Time;

use super::ProblemSource;

pub struct PlainProblemSource {
    pub path: std::path::PathBuf,
}

impl PlainProblemSource {
    pub fn new(path: impl Into<std::path::PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ProblemSource for PlainProblemSource {
    fn load(&self) -> Result<(Architecture, Graph), ProblemError> {
        let raw = std::fs::read_to_string(&self.path)
            .map_err(|err| ProblemError::InputError(format!("reading {}: {err}", self.path.display())))?;

        parse_problem(&raw)
    }
}

pub fn parse_problem(raw: &str) -> Result<(Architecture, Graph), ProblemError> {
    let tasks = raw.trim()
        .lines()
        .filter(|line| !line.trim().is_empty())
        .enumerate()
        .map(|(index, line)| parse_task(index as u32 + 1, line))
        .collect::<Result<Vec<_>, _>>()?;

    if tasks.is_empty() {
        return Err(ProblemError::InputError("plain problem file has no tasks".to_string()));
    }

    let architecture = Architecture::new(vec![Cpu::new(0, 1)]);
    let graph = Graph::new(vec![App::new("plain", false, tasks)]);

    Ok((architecture, graph))
}

fn parse_task(id: u32, line: &str) -> Result<Task, ProblemError> {
    let fields: Vec<&str> = line.split_ascii_whitespace().collect();

    let [wcet, deadline, period, criticality] = fields.as_slice() else {
        return Err(ProblemError::InputError(format!(
            "expected 'wcet deadline period criticality', got '{line}'"
        )));
    };

    let parse_ms = |field: &str, name: &str| -> Result<Time, ProblemError> {
        field.parse::<u64>()
            .map(Time::millis)
            .map_err(|err| ProblemError::InputError(format!("field '{name}': {err}")))
    };

    let wcet = parse_ms(wcet, "wcet")?;
    let deadline = parse_ms(deadline, "deadline")?;
    let period = parse_ms(period, "period")?;

    let criticality = criticality.parse::<u8>()
        .map_err(|err| ProblemError::InputError(format!("field 'criticality': {err}")))?;
    let criticality = Criticality::new(criticality).map_err(|err| ProblemError::InputError(err.to_string()))?;

    Ok(Task::new(id, 0, wcet, period, deadline, criticality, None))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_one_task_per_line() {
        let raw = "3 10 10 0\n4 20 20 1\n";
        let (architecture, graph) = parse_problem(raw).unwrap();

        assert_eq!(architecture.cpus[0].cores.len(), 1);
        assert_eq!(graph.apps[0].tasks.len(), 2);
        assert_eq!(graph.apps[0].tasks[0].wcet, Time::millis(3));
        assert_eq!(graph.apps[0].tasks[1].criticality, Criticality::new(1).unwrap());
    }

    #[test]
    fn rejects_malformed_line() {
        let raw = "3 10 10\n";
        assert!(parse_problem(raw).is_err());
    }
}
