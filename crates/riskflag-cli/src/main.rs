//! riskflag - audit risk flagging CLI
//!
//! The `riskflag` command cleans an audit dataset, flags high-risk records
//! and drafts a compliance warning for each one.
//!
//! ## Commands
//!
//! - `run`: Full pipeline (clean, flag, draft)
//! - `clean`: Normalize, flag and persist only; needs no generation settings
//! - `draft`: Draft for the flagged rows of an already-cleaned dataset
//! - `check-connection`: Probe the generation service

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use riskflag_core::config::{ENV_INPUT, ENV_OUTPUT};
use riskflag_core::{
    AuditPipeline, CleanedArtifact, ConsoleSink, DatasetSource, NormalizeReport, PipelineSummary,
    RiskflagConfig, RunOutcome,
};
use riskflag_gcp::config::ENV_MODEL;
use riskflag_gcp::{GenerationRequest, GeneratorFactory, TextGenerator};
use serde::Serialize;
use std::path::PathBuf;
use tracing::{info, Level};

/// Prompt sent by `check-connection`.
const CONNECTION_PROBE: &str = "Are we connected?";

#[derive(Parser)]
#[command(name = "riskflag")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Audit risk flagging and compliance warning drafts", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline: load, normalize, flag, persist, draft
    Run {
        #[command(flatten)]
        io: IoArgs,

        #[command(flatten)]
        model: ModelArgs,

        /// Print the run summary as JSON
        #[arg(long)]
        summary_json: bool,
    },

    /// Load, normalize, flag and persist the cleaned dataset without drafting
    Clean {
        #[command(flatten)]
        io: IoArgs,

        /// Print the cleaning report as JSON
        #[arg(long)]
        summary_json: bool,
    },

    /// Draft warnings for the flagged rows of a cleaned dataset
    Draft {
        /// Cleaned dataset (default: the configured output path)
        #[arg(short, long)]
        input: Option<String>,

        #[command(flatten)]
        model: ModelArgs,
    },

    /// Send a probe prompt to the generation service and print the reply
    CheckConnection {
        #[command(flatten)]
        model: ModelArgs,
    },
}

#[derive(Args, Debug, Default)]
struct IoArgs {
    /// Raw dataset: local path or gs://bucket/object
    #[arg(short, long, env = ENV_INPUT)]
    input: Option<String>,

    /// Where to write the cleaned dataset
    #[arg(short, long, env = ENV_OUTPUT)]
    output: Option<PathBuf>,
}

#[derive(Args, Debug, Default)]
struct ModelArgs {
    /// Generation model identifier
    #[arg(long, env = ENV_MODEL)]
    model: Option<String>,

    /// Per-record generation timeout in seconds
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    timeout: Option<u64>,
}

impl IoArgs {
    fn apply(&self, mut config: RiskflagConfig) -> RiskflagConfig {
        if let Some(input) = &self.input {
            config = config.with_input(DatasetSource::parse(input));
        }
        if let Some(output) = &self.output {
            config = config.with_output_path(output);
        }
        config
    }
}

impl ModelArgs {
    fn apply(&self, mut config: RiskflagConfig) -> RiskflagConfig {
        if let Some(model) = &self.model {
            config = config.with_model(model);
        }
        if let Some(timeout) = self.timeout {
            config = config.with_draft_timeout_secs(timeout);
        }
        config
    }
}

/// Output of `clean`.
#[derive(Debug, Serialize)]
struct CleanReport {
    records: usize,
    normalize: NormalizeReport,
    flagged: usize,
    artifact: Option<CleanedArtifact>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    riskflag_core::telemetry::init_tracing(cli.json, level);

    let base = RiskflagConfig::from_env();

    match cli.command {
        Commands::Run {
            io,
            model,
            summary_json,
        } => cmd_run(&model.apply(io.apply(base)), summary_json).await,
        Commands::Clean { io, summary_json } => cmd_clean(&io.apply(base), summary_json).await,
        Commands::Draft { input, model } => {
            cmd_draft(&draft_config(model.apply(base), input.as_deref())).await
        }
        Commands::CheckConnection { model } => cmd_check_connection(&model.apply(base)).await,
    }
}

/// `draft` reads the cleaned artifact, which defaults to the configured
/// output path.
fn draft_config(config: RiskflagConfig, input: Option<&str>) -> RiskflagConfig {
    let source = match input {
        Some(input) => DatasetSource::parse(input),
        None => DatasetSource::Local(config.output_path.clone()),
    };
    config.with_input(source)
}

/// Run the full pipeline, printing drafts as they arrive
async fn cmd_run(config: &RiskflagConfig, summary_json: bool) -> Result<()> {
    let mut sink = ConsoleSink::stdout();
    let summary = AuditPipeline::run(config, &config.vertex, &mut sink)
        .await
        .context(format!("Audit run failed for {}", config.input))?;

    if summary_json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print!("{}", render_summary(&summary));
    }
    Ok(())
}

/// Clean and flag without drafting
async fn cmd_clean(config: &RiskflagConfig, summary_json: bool) -> Result<()> {
    let cleaned = AuditPipeline::clean(config)
        .await
        .context(format!("Failed to clean {}", config.input))?;

    let report = CleanReport {
        records: cleaned.dataset.len(),
        normalize: cleaned.normalize,
        flagged: cleaned.flagged,
        artifact: cleaned.artifact,
    };

    if summary_json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("Records:  {}", report.records);
    println!(
        "Scores:   {} coerced, {} defaulted to 0",
        report.normalize.coerced, report.normalize.defaulted
    );
    println!("Flagged:  {}", report.flagged);
    match &report.artifact {
        Some(artifact) => println!("Cleaned:  {}", artifact.path.display()),
        None => println!("Cleaned:  not written (see log)"),
    }
    Ok(())
}

/// Draft for an already-cleaned dataset
async fn cmd_draft(config: &RiskflagConfig) -> Result<()> {
    let mut sink = ConsoleSink::stdout();
    let outcome = AuditPipeline::draft_cleaned(config, &config.vertex, &mut sink)
        .await
        .context(format!("Drafting failed for {}", config.input))?;

    match outcome {
        RunOutcome::NoHighRisk => println!("No high-risk audits found. No emails to draft."),
        RunOutcome::Drafted(tally) => println!(
            "Drafts:   {} succeeded, {} failed",
            tally.succeeded, tally.failed
        ),
    }
    Ok(())
}

/// Probe the generation service
async fn cmd_check_connection(config: &RiskflagConfig) -> Result<()> {
    let generator = config
        .vertex
        .connect()
        .context("Generation service is not configured")?;

    info!(model = %config.draft.model, "Sending connection probe");
    let reply = generator
        .generate(&GenerationRequest::new(&config.draft.model, CONNECTION_PROBE))
        .await
        .context("Connection check failed")?;

    println!("Connected ({}): {}", config.draft.model, reply.trim());
    Ok(())
}

fn render_summary(summary: &PipelineSummary) -> String {
    let mut out = String::new();
    out.push_str(&format!("Run:      {}\n", summary.run_id));
    out.push_str(&format!("Records:  {}\n", summary.records));
    out.push_str(&format!("Flagged:  {}\n", summary.flagged));
    match &summary.artifact {
        Some(artifact) => out.push_str(&format!(
            "Cleaned:  {} (sha256 {})\n",
            artifact.path.display(),
            &artifact.sha256[..12.min(artifact.sha256.len())]
        )),
        None => out.push_str("Cleaned:  not written (see log)\n"),
    }
    match summary.outcome {
        RunOutcome::NoHighRisk => out.push_str("Drafts:   none (no high-risk records)\n"),
        RunOutcome::Drafted(tally) => out.push_str(&format!(
            "Drafts:   {} succeeded, {} failed\n",
            tally.succeeded, tally.failed
        )),
    }
    out.push_str(&format!("Duration: {}ms\n", summary.duration_ms));
    out
}
