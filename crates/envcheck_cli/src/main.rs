use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use envcheck_core::{
    run_validations, SystemEnvironment, ValidationOptions, ValidationReport, Validator,
    ValidatorConfig,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(version, about = "Validate a geospatial container image")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run every enabled check and print the transcript (default).
    Run(RunArgs),
    /// List the checks that would run.
    Checks(ChecksArgs),
    /// Pretty-print a saved JSON report.
    Report(ReportArgs),
}

#[derive(Args, Default)]
struct RunArgs {
    #[arg(long)]
    config: Option<PathBuf>,
    /// Print the report as JSON instead of the transcript.
    #[arg(long)]
    json: bool,
    /// Object-store URL of the Zarr product to probe.
    #[arg(long)]
    remote_url: Option<String>,
    #[arg(long)]
    skip_remote: bool,
    #[arg(long)]
    id: Option<String>,
}

#[derive(Args)]
struct ChecksArgs {
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Args)]
struct ReportArgs {
    #[arg(long)]
    input: PathBuf,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command.unwrap_or(Commands::Run(RunArgs::default())) {
        Commands::Run(args) => handle_run(args),
        Commands::Checks(args) => handle_checks(args),
        Commands::Report(args) => handle_report(args),
    }
}

fn init_tracing(config: &ValidatorConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.trace_filter().unwrap_or("warn")))
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .ok();
}

fn handle_run(args: RunArgs) -> Result<()> {
    let mut config = ValidatorConfig::discover(args.config.as_deref())?;
    if let Some(url) = args.remote_url {
        config.apply_remote_url(url);
    }
    if args.skip_remote {
        config.checks.remote = false;
    }
    init_tracing(&config);

    let run_id = args
        .id
        .unwrap_or_else(|| format!("run-{}", Utc::now().format("%Y%m%dT%H%M%S")));
    let env = SystemEnvironment::from_config(&config);
    let report = run_validations(&config, &env, &ValidationOptions::new(run_id));

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", report.render());
    }

    if let Some(report_cfg) = config.report.as_ref() {
        if let Some(parent) = report_cfg.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&report_cfg.path, serde_json::to_string_pretty(&report)?)
            .with_context(|| format!("failed to write {}", report_cfg.path.display()))?;
        tracing::info!(path = %report_cfg.path.display(), "report written");
    }

    // Partial failure is reported, never turned into an exit code.
    Ok(())
}

fn handle_checks(args: ChecksArgs) -> Result<()> {
    let config = ValidatorConfig::discover(args.config.as_deref())?;
    let validator = Validator::new(config);
    for check in validator.checks() {
        println!("{:<10} {}", check.id, check.name);
    }
    Ok(())
}

fn handle_report(args: ReportArgs) -> Result<()> {
    let data = fs::read_to_string(&args.input)
        .with_context(|| format!("failed to read {}", args.input.display()))?;
    let report: ValidationReport = serde_json::from_str(&data)?;
    println!(
        "Report {} at {} -> {:?} ({})",
        report.id,
        report.timestamp,
        report.summary.status,
        report.summary_line()
    );
    print!("{}", report.render());
    Ok(())
}
