//! Accessibility Report CLI

use a11y_core::report::{self, ReportFormat};
use a11y_core::{CoreResult, GateVerdict, IngestOutcome, ReportConfig, ReportRunner};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "a11y-report")]
#[command(about = "Deduplicate axe-core scan results and gate CI on accessibility thresholds")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Report output directory (records are read from <dir>/pages)
    #[arg(short, long, global = true)]
    dir: Option<PathBuf>,

    /// Configuration file (defaults to ./a11y-report.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Args, Clone, Default)]
struct StrategyArgs {
    /// Merge strategy (none, exact, best)
    #[arg(short, long)]
    strategy: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Remove duplicate scan records
    Merge {
        #[command(flatten)]
        strategy: StrategyArgs,
    },

    /// Merge, summarize and evaluate the quality gate
    #[command(alias = "test")]
    Gate {
        #[command(flatten)]
        strategy: StrategyArgs,

        /// Violation ceilings for critical,serious,moderate,minor
        #[arg(long)]
        violation_thresholds: Option<String>,

        /// Incomplete ceilings for critical,serious,moderate,minor
        #[arg(long)]
        incomplete_thresholds: Option<String>,

        /// Report a breached gate as a warning instead of failing
        #[arg(long)]
        allow_failure: bool,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        output: String,
    },

    /// Merge and write summary.json / pages.json
    Summary {
        #[command(flatten)]
        strategy: StrategyArgs,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        output: String,
    },

    /// Store a raw axe-core result as a scan record
    Ingest {
        /// Path to the axe-core JSON result
        #[arg(short, long)]
        file: PathBuf,

        /// Site root stripped from the display path
        #[arg(long)]
        base_url: Option<String>,
    },

    /// Print the fingerprint of a URL
    Fingerprint {
        url: String,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .finish();
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("Warning: a tracing subscriber is already installed");
    }

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> CoreResult<ExitCode> {
    let mut config = ReportConfig::load(cli.config.as_deref())?;
    if let Some(dir) = cli.dir {
        config.output_dir = dir;
    }

    match cli.command {
        Commands::Merge { strategy } => cmd_merge(config, strategy),
        Commands::Gate {
            strategy,
            violation_thresholds,
            incomplete_thresholds,
            allow_failure,
            output,
        } => {
            if violation_thresholds.is_some() {
                config.violation_thresholds = violation_thresholds;
            }
            if incomplete_thresholds.is_some() {
                config.incomplete_thresholds = incomplete_thresholds;
            }
            config.allow_failure |= allow_failure;
            cmd_gate(config, strategy, &output)
        }
        Commands::Summary { strategy, output } => cmd_summary(config, strategy, &output),
        Commands::Ingest { file, base_url } => {
            if base_url.is_some() {
                config.base_url = base_url;
            }
            cmd_ingest(config, file)
        }
        Commands::Fingerprint { url } => {
            let runner = ReportRunner::new(config)?;
            println!("{}", runner.fingerprint(&url)?);
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn runner_with(mut config: ReportConfig, strategy: StrategyArgs) -> CoreResult<ReportRunner> {
    if let Some(s) = strategy.strategy {
        config.merge_strategy = s;
    }
    ReportRunner::new(config)
}

fn cmd_merge(config: ReportConfig, strategy: StrategyArgs) -> CoreResult<ExitCode> {
    let runner = runner_with(config, strategy)?;
    if let Some(outcome) = runner.merge()? {
        info!(
            "Done: {} records examined, {} removed",
            outcome.examined,
            outcome.deleted.len()
        );
    }
    Ok(ExitCode::SUCCESS)
}

fn cmd_summary(config: ReportConfig, strategy: StrategyArgs, output: &str) -> CoreResult<ExitCode> {
    let format: ReportFormat = output.parse()?;
    let runner = runner_with(config, strategy)?;

    if let Some(run) = runner.summarize()? {
        println!("{}", report::generate_report(&run, None, format)?);
        info!("Summary written to {}", runner.config().summary_path().display());
    }
    Ok(ExitCode::SUCCESS)
}

fn cmd_gate(config: ReportConfig, strategy: StrategyArgs, output: &str) -> CoreResult<ExitCode> {
    let format: ReportFormat = output.parse()?;
    let runner = runner_with(config, strategy)?;

    let Some((run, verdict)) = runner.gate()? else {
        return Ok(ExitCode::SUCCESS);
    };

    println!("{}", report::generate_report(&run, Some(&verdict), format)?);
    Ok(exit_code_for(&verdict))
}

fn exit_code_for(verdict: &GateVerdict) -> ExitCode {
    if verdict.failed {
        error!("{}", verdict.explanation);
        ExitCode::FAILURE
    } else {
        if verdict.is_warning() {
            warn!("{}", verdict.explanation);
        } else {
            info!("{}", verdict.explanation);
        }
        ExitCode::SUCCESS
    }
}

fn cmd_ingest(config: ReportConfig, file: PathBuf) -> CoreResult<ExitCode> {
    let runner = ReportRunner::new(config)?;
    match runner.ingest(&file)? {
        IngestOutcome::Stored(stored) => println!("{}", stored.path.display()),
        IngestOutcome::Skipped { url } => warn!("No results recorded for {}", url),
    }
    Ok(ExitCode::SUCCESS)
}
