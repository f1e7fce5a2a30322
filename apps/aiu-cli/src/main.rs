//! # aiu
//!
//! Operator CLI for the AI-usage policy compliance engine.
//!
//! Reads the project's `.aiu/` directory and prints JSON on stdout:
//! - `aiu tree --course <id>` — annotated usage tree for a course
//! - `aiu check --course <id> <node-id>...` — disallowed and warning selections
//! - `aiu intent --policy <version> <text>` — pre-submission intent check
//! - `aiu session --policy <version> --log <id> <text>` — post-session classification
//! - `aiu fingerprint --policy <version>` — rule-set fingerprint of a version
//! - `aiu severity` — severity ranks

mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use aiu_policy::{ComplianceEngine, StoreLayout};

/// AI-usage policy compliance engine.
#[derive(Parser)]
#[command(name = "aiu", version, about)]
struct Cli {
    /// Project root directory (defaults to current directory).
    #[arg(long, default_value = ".")]
    project_root: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the usage tree annotated with a course's rules.
    Tree {
        /// Course whose overrides apply.
        #[arg(long)]
        course: String,
    },
    /// Check selected usage nodes against a course's rules.
    Check {
        #[arg(long)]
        course: String,
        /// Selected node ids.
        #[arg(required = true)]
        node_ids: Vec<String>,
    },
    /// Evaluate a stated reason for using AI before the session.
    Intent {
        /// Policy version in force.
        #[arg(long)]
        policy: String,
        /// The student's stated reason.
        text: String,
    },
    /// Classify a logged session and compare it with the declared intent.
    Session {
        #[arg(long)]
        policy: String,
        /// Usage log entry id.
        #[arg(long)]
        log: String,
        /// Category detected at intent time.
        #[arg(long)]
        intent: Option<String>,
        /// Session content.
        text: String,
    },
    /// Print the computed fingerprint of a policy version's rules.
    Fingerprint {
        #[arg(long)]
        policy: String,
    },
    /// Print the severity ranking.
    Severity,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so stdout stays machine-readable.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("aiu_policy=info".parse()?)
                .add_directive("aiu_cli=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let cli = Cli::parse();
    let project_root = cli.project_root.canonicalize().unwrap_or(cli.project_root);
    let layout = StoreLayout::for_project(&project_root);
    tracing::debug!("Project root: {}", project_root.display());

    match &cli.command {
        Commands::Tree { course } => {
            commands::tree::tree(&ComplianceEngine::for_layout(&layout)?, course).await
        }
        Commands::Check { course, node_ids } => {
            commands::tree::check(&ComplianceEngine::for_layout(&layout)?, course, node_ids).await
        }
        Commands::Intent { policy, text } => {
            commands::evaluate::intent(&ComplianceEngine::for_layout(&layout)?, policy, text).await
        }
        Commands::Session {
            policy,
            log,
            intent,
            text,
        } => {
            commands::evaluate::session(
                &ComplianceEngine::for_layout(&layout)?,
                policy,
                log,
                intent.as_deref(),
                text,
            )
            .await
        }
        Commands::Fingerprint { policy } => commands::policy::fingerprint(&layout, policy).await,
        Commands::Severity => commands::policy::severity(),
    }
}
