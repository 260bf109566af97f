use partition_sched::driver::{self, ProblemConfig};
use partition_sched::input::{CliOverrides, Configuration, JsonProblemSource, PlainProblemSource, ProblemSource};
use partition_sched::output::{JsonFormatter, ScheduleFormatter, ScheduleRecord};

use crate::args::{Args, InputFormat, OutputFormat};

pub mod args;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = match <Args as clap::Parser>::try_parse() {
        Ok(args) => args,
        Err(err) => {
            use clap::error::ErrorKind::*;

            let exit_code = match err.kind() {
                DisplayHelp | DisplayHelpOnMissingArgumentOrSubcommand | DisplayVersion => 0,
                _ => 2,
            };

            err.print().unwrap();
            std::process::exit(exit_code);
        }
    };

    let quiet = args.quiet;
    match run(args) {
        Ok(all_succeeded) => {
            if quiet {
                std::process::exit(if all_succeeded { 0 } else { 1 });
            }
        }
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(2);
        }
    }
}

/// Collects every problem file to process, runs the pipeline on each (in
/// parallel across a `--collection`, one `std::thread::scope` worker per
/// problem), and returns whether every problem was schedulable.
fn run(args: Args) -> anyhow::Result<bool> {
    if args.output.format != OutputFormat::Json {
        anyhow::bail!("output format {:?} is not implemented; only json is supported", args.output.format);
    }

    let cases = discover_cases(&args)?;
    let config = resolve_config(&args)?;

    let results: Vec<anyhow::Result<()>> = std::thread::scope(|scope| {
        let handles: Vec<_> = cases.iter()
            .map(|case| scope.spawn(|| process_case(case, &args, &config)))
            .collect();

        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let mut all_succeeded = true;
    for (case, result) in cases.iter().zip(results) {
        if let Err(err) = result {
            all_succeeded = false;
            eprintln!("{}: {err}", case.display());
        }
    }

    Ok(all_succeeded)
}

fn discover_cases(args: &Args) -> anyhow::Result<Vec<std::path::PathBuf>> {
    if let Some(case) = &args.problem.case {
        return Ok(vec![case.clone()]);
    }

    let dir = args.problem.collection.as_ref().expect("clap group guarantees one of case/collection");
    let extension = match args.problem.input_format {
        InputFormat::Json => "json",
        InputFormat::Plain => "txt",
    };

    let mut cases = Vec::new();
    walk_collection(dir, extension, &mut cases)?;
    cases.sort();
    Ok(cases)
}

fn walk_collection(dir: &std::path::Path, extension: &str, cases: &mut Vec<std::path::PathBuf>) -> anyhow::Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();

        if path.is_dir() {
            walk_collection(&path, extension, cases)?;
        } else if path.extension().and_then(|e| e.to_str()) == Some(extension) {
            cases.push(path);
        }
    }

    Ok(())
}

fn resolve_config(args: &Args) -> anyhow::Result<ProblemConfig> {
    let file_config = match &args.scheduling.config_file {
        Some(path) => Configuration::from_file(path)?,
        None => Configuration::default(),
    };

    let overrides = CliOverrides {
        algorithm: Some(args.scheduling.algorithm.clone()),
        objective: Some(args.scheduling.objective.clone()),
        switch_time: args.scheduling.switch_time_ms.map(partition_sched::time::Time::millis),
        initial_step: args.scheduling.initial_step_ms.map(partition_sched::time::Time::millis),
        margin: args.scheduling.margin,
        rng_seed: Some(args.scheduling.rng_seed),
        trial_limit: args.scheduling.trial_limit,
    };

    Ok(file_config.resolve(&overrides))
}

fn process_case(case: &std::path::Path, args: &Args, config: &ProblemConfig) -> anyhow::Result<()> {
    let (architecture, graph) = match args.problem.input_format {
        InputFormat::Json => JsonProblemSource::new(case).load()?,
        InputFormat::Plain => PlainProblemSource::new(case).load()?,
    };

    let solution = driver::solve(architecture, graph, config)?;

    let record = ScheduleRecord::build(&solution.architecture, &solution.graph, config, solution.score);
    let formatter = JsonFormatter { pretty: args.output.pretty };
    let rendered = formatter.format(&record)?;

    println!("{rendered}");
    Ok(())
}
