const DEFAULT_AFTER_HELP: &str = "Refer to the crate's documentation for further help";

#[derive(clap::Parser, Debug)]
#[command(after_help=DEFAULT_AFTER_HELP)]
pub struct Args {
    /// Quiet mode / Exit code as scheduling result
    ///
    /// When enabled, a zero exit code means every problem was scheduled
    /// successfully, a one means at least one problem failed, any other
    /// code means an unexpected error occurred.
    #[arg(short='q', default_value="false", action=clap::ArgAction::SetTrue)]
    pub quiet: bool,

    #[command(flatten, next_help_heading="Problem Specification")]
    pub problem: ProblemArgs,

    #[command(flatten, next_help_heading="Scheduling Specification")]
    pub scheduling: SchedulingArgs,

    #[command(flatten, next_help_heading="Output Specification")]
    pub output: OutputArgs,
}

#[derive(clap::Args, Debug)]
#[group(required = true, multiple = false)]
pub struct ProblemArgs {
    /// A single problem file (JSON or plain)
    #[arg(long="case", value_name="FILE")]
    pub case: Option<std::path::PathBuf>,

    /// A directory recursively searched for problem files
    #[arg(long="collection", value_name="DIR")]
    pub collection: Option<std::path::PathBuf>,

    /// Input file format
    #[arg(value_enum, short='f', long="input-format", value_name="FORMAT", default_value="json")]
    pub input_format: InputFormat,
}

#[derive(clap::Args, Debug)]
pub struct SchedulingArgs {
    /// Scheduling algorithm
    #[arg(short='a', value_name="ALGORITHM", default_value="edf")]
    pub algorithm: String,

    /// Objective to optimise
    #[arg(short='o', value_name="OBJECTIVE", default_value="cumulated_free_space")]
    pub objective: String,

    /// Partition-switch time, in milliseconds
    #[arg(short='s', value_name="SWITCH_TIME_MS")]
    pub switch_time_ms: Option<u64>,

    /// Optimiser window-narrowing step, in milliseconds
    #[arg(short='i', value_name="INITIAL_STEP_MS")]
    pub initial_step_ms: Option<u64>,

    /// Global/local admission safety margin
    #[arg(long="margin", value_name="MARGIN")]
    pub margin: Option<f64>,

    /// Cap on the number of optimiser generations beyond the initial one
    #[arg(long="trial-limit", value_name="COUNT")]
    pub trial_limit: Option<u32>,

    /// Configuration file providing defaults for the flags above
    #[arg(long="config", value_name="FILE")]
    pub config_file: Option<std::path::PathBuf>,

    /// Seed for the optimiser's random task-swap generator
    #[arg(long="seed", value_name="SEED", default_value="0")]
    pub rng_seed: u64,
}

#[derive(clap::Args, Debug)]
pub struct OutputArgs {
    /// Output format
    #[arg(value_enum, short='e', long="output-format", value_name="FORMAT", default_value="json")]
    pub format: OutputFormat,

    /// Pretty-print JSON output
    #[arg(long="pretty", action=clap::ArgAction::SetTrue)]
    pub pretty: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[derive(clap::ValueEnum)]
pub enum InputFormat {
    Json,
    Plain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[derive(clap::ValueEnum)]
pub enum OutputFormat {
    Json,
    /// Rejected at runtime with a clear `InputError`: XML rendering is this
    /// crate's explicit Non-goal.
    Xml,
    /// Rejected at runtime with a clear `InputError`: SVG rendering is this
    /// crate's explicit Non-goal.
    Svg,
}
