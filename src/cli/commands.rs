//! CLI command definitions for ntuple-launcher.
//!
//! Three commands share the same catalog and configuration flags:
//! `samples` inspects the catalog, `plan` prints the task descriptors and
//! `submit` hands them to a submission backend.

use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use serde::Serialize;
use tracing::{info, warn};

use crate::catalog::SampleSelection;
use crate::dispatch::{
    CommandSubmitter, DispatchReport, DryRunSubmitter, SpoolSubmitter, SubmissionStatus, Submitter,
};
use crate::params::PsetOptions;
use crate::pipeline::{LaunchConfig, Pipeline};
use crate::task::TaskDescriptor;

/// Default spool directory for the spool backend.
const DEFAULT_SPOOL_DIR: &str = "./spool";

/// Launch ntuple production tasks from sample catalogs.
#[derive(Parser)]
#[command(name = "ntuple-launcher")]
#[command(about = "Turn dataset catalogs into ntuple production tasks and submit them")]
#[command(version)]
#[command(
    long_about = "ntuple-launcher reads samples_*.csv catalogs, derives per-sample job parameters \
(events per output, global tag) and submits one processing task per sample.\n\n\
Example usage:\n  ntuple-launcher plan --tag OFFSHELL_v1 --format yaml\n  \
ntuple-launcher submit --backend spool --spool-dir ./spool --select 0,74"
)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "info", global = true)]
    pub log_level: String,
}

/// Available CLI subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// List catalog samples with their derived parameters.
    #[command(alias = "ls")]
    Samples(SamplesArgs),

    /// Build task descriptors and print them without submitting.
    Plan(PlanArgs),

    /// Build task descriptors and submit them.
    Submit(SubmitArgs),
}

/// Catalog, configuration and selection flags shared by all commands.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct LaunchArgs {
    /// YAML configuration file.
    #[arg(short = 'c', long, env = "NTUPLE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory containing the catalogs.
    #[arg(short = 'd', long)]
    pub catalog_dir: Option<PathBuf>,

    /// File name glob selecting catalogs (default: samples_*.csv).
    #[arg(short = 'p', long)]
    pub pattern: Option<String>,

    /// Production tag.
    #[arg(short = 't', long)]
    pub tag: Option<String>,

    /// Comma-separated sample positions to keep, e.g. "0,74".
    #[arg(long, value_delimiter = ',')]
    pub select: Vec<usize>,

    /// Comma-separated dataset substrings; keep samples matching any.
    #[arg(long = "match", value_delimiter = ',')]
    pub matching: Vec<String>,

    /// Keep at most this many samples.
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,
}

/// Arguments for `ntuple-launcher samples`.
#[derive(Parser, Debug)]
pub struct SamplesArgs {
    #[command(flatten)]
    pub launch: LaunchArgs,

    /// Output as JSON.
    #[arg(short = 'j', long)]
    pub json: bool,
}

/// Output format for `plan`.
#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Yaml,
}

/// Arguments for `ntuple-launcher plan`.
#[derive(Parser, Debug)]
pub struct PlanArgs {
    #[command(flatten)]
    pub launch: LaunchArgs,

    /// Output format.
    #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,

    /// Write the plan to this file instead of stdout.
    #[arg(short = 'o', long)]
    pub output: Option<PathBuf>,
}

/// Submission backend.
#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Backend {
    /// Log tasks without submitting.
    DryRun,
    /// Write one JSON file per task into a spool directory.
    Spool,
    /// Pipe each task into an external submit command.
    Command,
}

/// Arguments for `ntuple-launcher submit`.
#[derive(Parser, Debug)]
pub struct SubmitArgs {
    #[command(flatten)]
    pub launch: LaunchArgs,

    /// Submission backend.
    #[arg(short = 'b', long, value_enum, default_value_t = Backend::DryRun)]
    pub backend: Backend,

    /// Spool directory for the spool backend.
    #[arg(long, default_value = DEFAULT_SPOOL_DIR)]
    pub spool_dir: PathBuf,

    /// Submit command line for the command backend.
    #[arg(long, env = "NTUPLE_SUBMIT_COMMAND")]
    pub command: Option<String>,

    /// Print the submission report as JSON.
    #[arg(short = 'j', long)]
    pub json: bool,
}

/// Parse CLI arguments.
pub fn parse_cli() -> Cli {
    Cli::parse()
}

/// Run the CLI by parsing arguments and executing the command.
///
/// For control over logging initialization, use `parse_cli()` and
/// `run_with_cli()`.
pub fn run() -> anyhow::Result<()> {
    run_with_cli(parse_cli())
}

/// Run the CLI with the parsed arguments.
pub fn run_with_cli(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Samples(args) => run_samples_command(args),
        Commands::Plan(args) => run_plan_command(args),
        Commands::Submit(args) => run_submit_command(args),
    }
}

/// Resolves configuration: defaults, file, environment, then flags.
pub fn load_config(args: &LaunchArgs) -> anyhow::Result<LaunchConfig> {
    let mut config = match &args.config {
        Some(path) => LaunchConfig::from_file(path)?,
        None => LaunchConfig::default(),
    };

    config
        .apply_env()
        .context("Invalid NTUPLE_* environment override")?;

    if let Some(dir) = &args.catalog_dir {
        config.catalog.dir = dir.clone();
    }
    if let Some(pattern) = &args.pattern {
        config.catalog.pattern = pattern.clone();
    }
    if let Some(tag) = &args.tag {
        config.task.tag = tag.clone();
    }

    Ok(config)
}

/// Sample selection requested on the command line.
pub fn selection(args: &LaunchArgs) -> SampleSelection {
    let mut selection = SampleSelection::new()
        .with_indices(args.select.iter().copied())
        .with_matching(args.matching.iter().cloned());
    if let Some(limit) = args.limit {
        selection = selection.with_limit(limit);
    }
    selection
}

fn build_pipeline(args: &LaunchArgs) -> anyhow::Result<Pipeline> {
    let config = load_config(args)?;
    info!(
        catalog_dir = %config.catalog.dir.display(),
        pattern = %config.catalog.pattern,
        tag = %config.task.tag,
        "Configuration loaded"
    );
    Ok(Pipeline::new(config)?.with_selection(selection(args)))
}

// ============================================================================
// samples
// ============================================================================

#[derive(Debug, Clone, Serialize)]
struct SampleSummary {
    dataset: String,
    source: String,
    xsec: f64,
    efficiency: f64,
    is_simulation: bool,
    events_per_output: u64,
    global_tag: Option<String>,
    options: Vec<(String, String)>,
    origin: String,
}

fn run_samples_command(args: SamplesArgs) -> anyhow::Result<()> {
    let pipeline = build_pipeline(&args.launch)?;
    let samples = pipeline.load_samples()?;
    let deriver = pipeline.deriver();

    let summaries: Vec<SampleSummary> = samples
        .iter()
        .map(|sample| {
            let options = PsetOptions::parse(&sample.options);
            let is_simulation = deriver.is_simulation(&sample.dataset);
            SampleSummary {
                dataset: sample.dataset.clone(),
                source: sample.source.to_string(),
                xsec: sample.xsec,
                efficiency: sample.efficiency,
                is_simulation,
                events_per_output: deriver.events_per_output(is_simulation),
                global_tag: options.global_tag().map(str::to_string),
                options: options
                    .pairs()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
                origin: sample.origin.to_string(),
            }
        })
        .collect();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summaries)?);
    } else {
        for (index, s) in summaries.iter().enumerate() {
            println!(
                "{:>4}  {:<4} {:>7} {:<40} xsec={} BR={} {}",
                index,
                if s.is_simulation { "mc" } else { "data" },
                s.events_per_output,
                s.global_tag.as_deref().unwrap_or("<missing globaltag>"),
                s.xsec,
                s.efficiency,
                s.dataset
            );
        }
    }

    let missing = summaries.iter().filter(|s| s.global_tag.is_none()).count();
    if missing > 0 {
        for s in summaries.iter().filter(|s| s.global_tag.is_none()) {
            warn!(dataset = %s.dataset, origin = %s.origin, "Sample has no globaltag");
        }
        anyhow::bail!("{} of {} samples have no globaltag", missing, summaries.len());
    }

    Ok(())
}

// ============================================================================
// plan
// ============================================================================

fn render_plan(tasks: &[TaskDescriptor], format: OutputFormat) -> anyhow::Result<String> {
    Ok(match format {
        OutputFormat::Json => serde_json::to_string_pretty(tasks)?,
        OutputFormat::Yaml => serde_yaml::to_string(tasks)?,
    })
}

fn run_plan_command(args: PlanArgs) -> anyhow::Result<()> {
    let pipeline = build_pipeline(&args.launch)?;
    let tasks = pipeline.plan()?;
    let rendered = render_plan(&tasks, args.format)?;

    match &args.output {
        Some(path) => {
            fs::write(path, rendered)
                .with_context(|| format!("Failed to write plan to {}", path.display()))?;
            info!(tasks = tasks.len(), path = %path.display(), "Plan written");
        }
        None => println!("{}", rendered),
    }

    Ok(())
}

// ============================================================================
// submit
// ============================================================================

fn make_submitter(args: &SubmitArgs) -> anyhow::Result<Box<dyn Submitter>> {
    Ok(match args.backend {
        Backend::DryRun => Box::new(DryRunSubmitter::new()),
        Backend::Spool => Box::new(SpoolSubmitter::new(&args.spool_dir)),
        Backend::Command => {
            let command_line = args
                .command
                .as_deref()
                .context("--command is required with --backend command")?;
            let submitter = CommandSubmitter::from_command_line(command_line)
                .context("--command must not be empty")?;
            Box::new(submitter)
        }
    })
}

fn print_report(report: &DispatchReport) {
    for receipt in &report.receipts {
        match &receipt.detail {
            Some(detail) => println!("{:<10} {}  {}", receipt.status, receipt.request_name, detail),
            None => println!("{:<10} {}", receipt.status, receipt.request_name),
        }
    }
    println!(
        "{} tasks: {} accepted, {} created, {} updated, {} unchanged",
        report.len(),
        report.count(SubmissionStatus::Accepted),
        report.count(SubmissionStatus::Created),
        report.count(SubmissionStatus::Updated),
        report.count(SubmissionStatus::Unchanged)
    );
}

fn run_submit_command(args: SubmitArgs) -> anyhow::Result<()> {
    let pipeline = build_pipeline(&args.launch)?;
    let submitter = make_submitter(&args)?;
    let report = pipeline.run(submitter)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    Ok(())
}
