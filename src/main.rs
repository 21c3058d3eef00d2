use anyhow::Context;
use clap::{Parser, Subcommand};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

use artifact_pipeline::components::DataTable;
use artifact_pipeline::config::{ConfigRegistry, DocumentPaths};
use artifact_pipeline::constants;
use artifact_pipeline::logging;
use artifact_pipeline::observability::{metrics, TracingSink};
use artifact_pipeline::pipeline::{PipelineRunner, Stage, StageOutput, StageReport};

#[derive(Parser)]
#[command(name = "artifact_pipeline")]
#[command(about = "Configuration-driven stages for a job-posting ML pipeline")]
#[command(version = "0.1.0")]
struct Cli {
    /// Base configuration document
    #[arg(long, global = true, env = constants::CONFIG_PATH_ENV, default_value = constants::CONFIG_FILE_PATH)]
    config: PathBuf,

    /// Tunable parameters document
    #[arg(long, global = true, env = constants::PARAMS_PATH_ENV, default_value = constants::PARAMS_FILE_PATH)]
    params: PathBuf,

    /// Dataset schema document
    #[arg(long, global = true, env = constants::SCHEMA_PATH_ENV, default_value = constants::SCHEMA_FILE_PATH)]
    schema: PathBuf,

    /// Project root that relative paths resolve against (defaults to the working directory)
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Write Prometheus-format metrics to this file when the command finishes
    #[arg(long, global = true)]
    metrics_out: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one stage: resolve its config, then invoke its component
    Run {
        /// Stage key, e.g. data_ingestion or data-validation
        stage: String,
        /// Print the first N rows of the ingested table
        #[arg(long)]
        show: Option<usize>,
    },
    /// Print a stage's fully resolved configuration as JSON
    ShowConfig {
        stage: String,
    },
    /// List the stages the configuration can describe
    Stages,
}

fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    logging::init_logging();

    let cli = Cli::parse();

    let metrics_handle = match cli.metrics_out {
        Some(_) => match metrics::init() {
            Ok(handle) => Some(handle),
            Err(e) => {
                warn!("Failed to install metrics recorder: {}", e);
                None
            }
        },
        None => None,
    };

    let result = dispatch(&cli);

    if let (Some(path), Some(handle)) = (&cli.metrics_out, &metrics_handle) {
        fs::write(path, handle.render())
            .with_context(|| format!("writing metrics to {}", path.display()))?;
        println!("📈 Metrics written to {}", path.display());
    }

    result
}

fn dispatch(cli: &Cli) -> anyhow::Result<()> {
    match &cli.command {
        Commands::Stages => {
            println!("📋 Stages:");
            for stage in Stage::ALL {
                println!("   {:<22} {}", stage.key(), stage.display_name());
            }
            Ok(())
        }
        Commands::ShowConfig { stage } => {
            let stage: Stage = stage.parse()?;
            let registry = load_registry(cli)?;
            let config = registry.stage_config(stage)?;
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(())
        }
        Commands::Run { stage, show } => {
            let runner = PipelineRunner::new(load_registry(cli)?);

            println!("🔄 Running stage '{}'...", stage);
            info!("Starting stage '{}'", stage);
            match runner.run_stage_by_name(stage) {
                Ok(report) => {
                    print_report(&report);
                    if let Some(n) = show {
                        print_head(&report, *n)?;
                    }
                    Ok(())
                }
                Err(e) => {
                    error!("Stage '{}' failed: {}", stage, e);
                    println!("❌ Stage '{}' failed: {}", stage, e);
                    Err(e.into())
                }
            }
        }
    }
}

fn load_registry(cli: &Cli) -> anyhow::Result<ConfigRegistry> {
    let root = match &cli.root {
        Some(root) => root.clone(),
        None => std::env::current_dir().context("reading working directory")?,
    };
    let paths = DocumentPaths::new(&cli.config, &cli.params, &cli.schema);
    let registry = ConfigRegistry::load_with(root, &paths, Arc::new(TracingSink))?;
    Ok(registry)
}

fn print_report(report: &StageReport) {
    println!("\n📊 {} finished:", report.stage.display_name());
    println!("   Run id: {}", report.run_id);
    println!("   Steps: {}", report.steps.join(" → "));
    let elapsed = report.finished_at - report.started_at;
    println!("   Duration: {} ms", elapsed.num_milliseconds());

    match &report.output {
        StageOutput::Ingestion {
            transfer,
            rows,
            columns,
        } => {
            println!("   Copied: {} → {}", transfer.source.display(), transfer.destination.display());
            if transfer.unchanged {
                println!("   Content unchanged since last transfer");
            }
            println!("   Shape: {} rows x {} columns", rows, columns);
        }
        StageOutput::Validation(outcome) => {
            let mark = if outcome.status { "✅" } else { "⚠️ " };
            println!("   {} Validation status: {}", mark, outcome.status);
            for column in &outcome.undeclared_columns {
                println!("   - undeclared column: {}", column);
            }
            println!("   Status file: {}", outcome.status_file.display());
        }
        StageOutput::Completed => {}
    }
}

fn print_head(report: &StageReport, n: usize) -> anyhow::Result<()> {
    match &report.output {
        StageOutput::Ingestion { transfer, .. } => {
            let table = DataTable::from_csv_path(&transfer.destination)?;
            println!("\n{}", table.head(n));
        }
        _ => println!("⚠️  --show only applies to data_ingestion"),
    }
    Ok(())
}
