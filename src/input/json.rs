//! JSON problem format: `{ "architecture": {...}, "apps": [...] }`. The
//! reference format for this crate; mirrors the shape spec.md's XML wire
//! format describes (§6) field-for-field, but as JSON rather than XML.

use serde::Deserialize;

use crate::domain::prelude::*;
use crate::error::ProblemError;
use crate::time::Time;

use super::ProblemSource;

#[derive(Deserialize)]
struct ProblemDoc {
    architecture: ArchitectureDoc,
    apps: Vec<AppDoc>,
}

#[derive(Deserialize)]
struct ArchitectureDoc {
    cpus: Vec<CpuDoc>,
}

#[derive(Deserialize)]
struct CpuDoc {
    id: u32,
    cores: u32,
}

#[derive(Deserialize)]
struct AppDoc {
    name: String,
    #[serde(default)]
    order: bool,
    tasks: Vec<TaskDoc>,
}

#[derive(Deserialize)]
struct TaskDoc {
    id: u32,
    wcet: Time,
    period: Time,
    deadline: Time,
    criticality: u8,
}

/// Reads a whole problem (architecture and task graph) from a single JSON
/// file.
pub struct JsonProblemSource {
    pub path: std::path::PathBuf,
}

impl JsonProblemSource {
    pub fn new(path: impl Into<std::path::PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ProblemSource for JsonProblemSource {
    fn load(&self) -> Result<(Architecture, Graph), ProblemError> {
        let raw = std::fs::read_to_string(&self.path)
            .map_err(|err| ProblemError::InputError(format!("reading {}: {err}", self.path.display())))?;

        parse_problem(&raw)
    }
}

/// Parses a problem document already read into memory; split out from
/// [`JsonProblemSource::load`] so it can be unit-tested without touching
/// the filesystem.
pub fn parse_problem(raw: &str) -> Result<(Architecture, Graph), ProblemError> {
    let doc: ProblemDoc = serde_json::from_str(raw)
        .map_err(|err| ProblemError::InputError(format!("parsing problem json: {err}")))?;

    let cpus: Vec<Cpu> = doc.architecture.cpus.into_iter()
        .map(|cpu| Cpu::new(cpu.id, cpu.cores))
        .collect();
    let architecture = Architecture::new(cpus);

    let apps = doc.apps.into_iter()
        .map(build_app)
        .collect::<Result<Vec<_>, _>>()?;

    Ok((architecture, Graph::new(apps)))
}

fn build_app(doc: AppDoc) -> Result<App, ProblemError> {
    let mut tasks = Vec::with_capacity(doc.tasks.len());

    for (index, task) in doc.tasks.into_iter().enumerate() {
        let criticality = Criticality::new(task.criticality)
            .map_err(|err| ProblemError::InputError(err.to_string()))?;

        let parent = if doc.order && index > 0 { Some(index - 1) } else { None };

        tasks.push(Task::new(task.id, 0, task.wcet, task.period, task.deadline, criticality, parent));
    }

    if tasks.is_empty() {
        return Err(ProblemError::InputError(format!("app '{}' has no tasks", doc.name)));
    }

    Ok(App::new(doc.name, doc.order, tasks))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_minimal_problem() {
        let raw = r#"{
            "architecture": { "cpus": [ { "id": 0, "cores": 1 } ] },
            "apps": [
                { "name": "A", "tasks": [
                    { "id": 1, "wcet": "3 ms", "period": "10 ms", "deadline": "10 ms", "criticality": 0 }
                ] }
            ]
        }"#;

        let (architecture, graph) = parse_problem(raw).unwrap();

        assert_eq!(architecture.cpus.len(), 1);
        assert_eq!(architecture.cpus[0].cores.len(), 1);
        assert_eq!(graph.apps[0].tasks[0].wcet, Time::millis(3));
    }

    #[test]
    fn in_order_apps_chain_parent_indices() {
        let raw = r#"{
            "architecture": { "cpus": [ { "id": 0, "cores": 1 } ] },
            "apps": [
                { "name": "A", "order": true, "tasks": [
                    { "id": 1, "wcet": "1 ms", "period": "10 ms", "deadline": "10 ms", "criticality": 0 },
                    { "id": 2, "wcet": "1 ms", "period": "10 ms", "deadline": "10 ms", "criticality": 0 }
                ] }
            ]
        }"#;

        let (_architecture, graph) = parse_problem(raw).unwrap();

        assert_eq!(graph.apps[0].tasks[0].parent, None);
        assert_eq!(graph.apps[0].tasks[1].parent, Some(0));
    }

    #[test]
    fn rejects_app_with_no_tasks() {
        let raw = r#"{
            "architecture": { "cpus": [ { "id": 0, "cores": 1 } ] },
            "apps": [ { "name": "A", "tasks": [] } ]
        }"#;

        assert!(parse_problem(raw).is_err());
    }
}
