//! Builds the persisted schedule record from a solved problem and
//! serialises it. `ScheduleFormatter` is the trait seam for formats other
//! than the bundled JSON one (XML and SVG are this crate's explicit
//! Non-goals and are not implemented here).

use serde::Serialize;

use crate::domain::prelude::*;
use crate::driver::ProblemConfig;
use crate::objective::Score;
use crate::time::Time;

#[derive(Serialize)]
pub struct SliceRecord {
    pub start: Time,
    pub stop: Time,
    pub duration: Time,
    pub app_name: String,
    pub task_id: u32,
}

#[derive(Serialize)]
pub struct CoreRecord {
    pub cpu_id: u32,
    pub core_id: u32,
    pub slices: Vec<SliceRecord>,
}

#[derive(Serialize)]
pub struct ConfigurationEcho {
    pub algorithm: String,
    pub objective: String,
    pub switch_time: Time,
    pub initial_step: Time,
}

#[derive(Serialize)]
pub struct ScheduleRecord {
    pub configuration: ConfigurationEcho,
    pub hyperperiod: Time,
    pub score: Score,
    pub cores: Vec<CoreRecord>,
}

impl ScheduleRecord {
    pub fn build(architecture: &Architecture, graph: &Graph, config: &ProblemConfig, score: Score) -> Self {
        let cores = architecture.cpus.iter()
            .flat_map(|cpu| cpu.cores.iter().map(move |core| (cpu, core)))
            .map(|(cpu, core)| build_core_record(cpu, core, graph))
            .collect();

        Self {
            configuration: ConfigurationEcho {
                algorithm: config.algorithm.clone(),
                objective: config.objective.clone(),
                switch_time: config.switch_time,
                initial_step: config.initial_step,
            },
            hyperperiod: graph.hyperperiod,
            score,
            cores,
        }
    }
}

fn build_core_record(cpu: &Cpu, core: &Core, graph: &Graph) -> CoreRecord {
    let mut slices: Vec<SliceRecord> = core.tasks.iter()
        .flat_map(|core_task| {
            let task = graph.task(core_task.id);
            let app_name = graph.apps[core_task.id.app].name.clone();

            task.jobs.iter().flat_map(move |job| {
                let app_name = app_name.clone();
                job.execution.iter().map(move |slice| SliceRecord {
                    start: slice.start,
                    stop: slice.stop,
                    duration: slice.len(),
                    app_name: app_name.clone(),
                    task_id: task.id,
                })
            })
        })
        .collect();

    slices.sort_by_key(|s| s.start);

    CoreRecord { cpu_id: cpu.id, core_id: core.id, slices }
}

/// Serialises a `ScheduleRecord` into some wire format. XML and SVG
/// formatters are this crate's Non-goal; only `JsonFormatter` is shipped.
pub trait ScheduleFormatter {
    fn format(&self, record: &ScheduleRecord) -> Result<String, serde_json::Error>;
}

pub struct JsonFormatter {
    pub pretty: bool,
}

impl ScheduleFormatter for JsonFormatter {
    fn format(&self, record: &ScheduleRecord) -> Result<String, serde_json::Error> {
        if self.pretty {
            serde_json::to_string_pretty(record)
        } else {
            serde_json::to_string(record)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_one_core_record_per_core() {
        let apps = vec![App::new("A", false, vec![
            Task::new(1, 0, Time::nanos(3), Time::nanos(10), Time::nanos(10), Criticality::MIN, None),
        ])];
        let mut graph = Graph::new(apps);

        let mut arch = Architecture::new(vec![Cpu::new(0, 1)]);
        arch.cpus[0].cores[0].push_task(TaskId { app: 0, task: 0 }, graph.apps[0].tasks[0].workload());

        crate::scheduler::schedule(&arch, &mut graph, &crate::policy::Policy::edf(), Time::zero()).unwrap();

        let record = ScheduleRecord::build(&arch, &graph, &ProblemConfig::default(), Score::from(7.0));
        assert_eq!(record.cores.len(), 1);
        assert_eq!(record.cores[0].slices.len(), 1);
        assert_eq!(record.cores[0].slices[0].app_name, "A");
    }

    #[test]
    fn json_formatter_round_trips_through_serde() {
        let record = ScheduleRecord {
            configuration: ConfigurationEcho {
                algorithm: "edf".to_string(),
                objective: "cumulated_free_space".to_string(),
                switch_time: Time::zero(),
                initial_step: Time::nanos(10),
            },
            hyperperiod: Time::nanos(10),
            score: Score::from(7.0),
            cores: vec![],
        };

        let formatter = JsonFormatter { pretty: false };
        let json = formatter.format(&record).unwrap();
        assert!(json.contains("\"algorithm\":\"edf\""));
    }
}
