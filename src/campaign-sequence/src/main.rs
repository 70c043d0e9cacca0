//! campaign-sequence: inspect and activate persisted sequence drafts.
//!
//! Reads a draft document (as written by the draft store), prints its
//! readiness report or activated snapshot as JSON on stdout, and exits
//! non-zero when the draft is not ready.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use campaign_core::config::AppConfig;
use campaign_core::{CampaignError, CampaignResult};
use campaign_sequence::{CampaignDraft, SequenceError, SequenceValidator};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(name = "campaign-sequence")]
#[command(about = "Validate and activate outreach campaign sequences")]
#[command(version)]
struct Cli {
    /// Maximum number of steps (overrides config)
    #[arg(long, env = "CAMPAIGN_SEQUENCE__SEQUENCE__MAX_STEPS")]
    max_steps: Option<usize>,

    /// Maximum number of variants per email step (overrides config)
    #[arg(long, env = "CAMPAIGN_SEQUENCE__SEQUENCE__MAX_VARIANTS_PER_STEP")]
    max_variants: Option<usize>,

    /// Longest allowed wait in days (overrides config)
    #[arg(long, env = "CAMPAIGN_SEQUENCE__SEQUENCE__MAX_WAIT_DAYS")]
    max_wait_days: Option<u32>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print an empty draft document for a campaign
    New {
        /// Campaign id (random when omitted)
        #[arg(long)]
        campaign_id: Option<Uuid>,
    },
    /// Print the readiness report of a draft file
    Validate { file: PathBuf },
    /// Print the activated snapshot of a ready draft file
    Activate { file: PathBuf },
}

fn load_draft(path: &Path) -> CampaignResult<CampaignDraft> {
    let raw = std::fs::read_to_string(path)?;
    if raw.trim().is_empty() {
        return Err(CampaignError::DraftFile(format!(
            "{} is empty",
            path.display()
        )));
    }
    Ok(serde_json::from_str(&raw)?)
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let (mut config, config_error) = match AppConfig::load().map_err(CampaignError::from) {
        Ok(config) => (config, None),
        Err(e) => (AppConfig::default(), Some(e)),
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| config.log.filter.clone().into());
    if config.log.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }

    if let Some(e) = config_error {
        warn!(error = %e, "Failed to load config, using defaults");
    }

    // Apply CLI overrides
    if let Some(max_steps) = cli.max_steps {
        config.sequence.max_steps = max_steps;
    }
    if let Some(max_variants) = cli.max_variants {
        config.sequence.max_variants_per_step = max_variants;
    }
    if let Some(max_wait_days) = cli.max_wait_days {
        config.sequence.max_wait_days = max_wait_days;
    }

    info!(
        max_steps = config.sequence.max_steps,
        max_variants = config.sequence.max_variants_per_step,
        max_wait_days = config.sequence.max_wait_days,
        "Configuration loaded"
    );

    let validator = SequenceValidator::with_config(config.sequence.clone());

    match cli.command {
        Command::New { campaign_id } => {
            let draft = CampaignDraft::new(campaign_id.unwrap_or_else(Uuid::new_v4));
            println!("{}", serde_json::to_string_pretty(&draft)?);
            Ok(ExitCode::SUCCESS)
        }
        Command::Validate { file } => {
            let draft = load_draft(&file)?;
            let report = draft.report(&validator);
            info!(
                campaign_id = %draft.campaign_id,
                state = ?draft.state(&validator),
                errors = report.errors.len(),
                "Validated draft"
            );
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(if report.is_ready {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Command::Activate { file } => {
            let draft = load_draft(&file)?;
            match draft.activate(&validator) {
                Ok(snapshot) => {
                    println!("{}", serde_json::to_string_pretty(&snapshot)?);
                    Ok(ExitCode::SUCCESS)
                }
                Err(SequenceError::NotReady { .. }) => {
                    let report = draft.report(&validator);
                    println!("{}", serde_json::to_string_pretty(&report)?);
                    Ok(ExitCode::FAILURE)
                }
                Err(e) => Err(e.into()),
            }
        }
    }
}
