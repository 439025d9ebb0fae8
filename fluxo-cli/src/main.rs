mod cli;

use anyhow::Result;
use clap::{Parser, Subcommand};
use cli::handlers;
use fluxo_core::models::Configuration;
use fluxo_core::services::logging::init_logging;

#[derive(Parser)]
#[command(name = "fluxo")]
#[command(version = "0.1.0")]
#[command(about = "Solicitation workflow engine for the school meal program")]
#[command(
    help_template = "{name} - {version}\n{about}\n\n{usage-heading}\n  {usage}\n\n{all-args}{options}\n"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a workflow definition file
    ///
    /// Reads a YAML definition and runs the structural checks every
    /// definition must pass before it can be registered.
    ///
    /// Examples:
    ///   fluxo validate pedido.yaml
    ///   fluxo validate pedido.yaml --json
    Validate {
        /// Path to workflow YAML file
        workflow_file: String,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// List built-in workflow kinds
    Kinds {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Show the states and transitions of one workflow kind
    Show {
        /// Workflow kind name
        kind: String,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Open a new solicitation in its kind's initial state
    Start {
        /// Workflow kind name
        kind: String,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Fire a transition on a solicitation
    ///
    /// The actor needs the capability the transition requires, and some
    /// transitions expect payload fields on top:
    ///
    ///   --justification TEXT   denials and cancellations
    ///   --acknowledge BOOL     questionnaire replies (true or false)
    ///   --attach NAME=REF      supporting documents, repeatable
    ///
    /// Examples:
    ///   fluxo fire <ID> inicia_fluxo --actor diretora --capability DIRETOR_UE
    ///   fluxo fire <ID> dre_nao_valida --actor cogestora \
    ///       --capability COGESTOR_DRE --justification "fora do prazo"
    Fire {
        /// Record ID (UUID)
        record_id: String,

        /// Transition name
        transition: String,

        /// Acting user identity
        #[arg(short, long, default_value = "cli-user")]
        actor: String,

        /// Capability granted to the actor (repeatable)
        #[arg(long = "capability")]
        capabilities: Vec<String>,

        /// Justification text for transitions that require one
        #[arg(long)]
        justification: Option<String>,

        /// Yes/no answer for transitions that require one
        #[arg(long)]
        acknowledge: Option<bool>,

        /// Attachment as NAME=REFERENCE (repeatable)
        #[arg(long = "attach")]
        attachments: Vec<String>,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Get solicitation status and available transitions
    Status {
        /// Record ID (UUID)
        record_id: String,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Show the audit trail of a solicitation
    History {
        /// Record ID (UUID)
        record_id: String,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// List solicitations
    Records {
        /// Workflow kind (optional, shows all if not specified)
        #[arg(short, long)]
        kind: Option<String>,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Display solicitation metrics
    Metrics {
        /// Workflow kind (optional, shows all kinds if not specified)
        #[arg(short, long)]
        kind: Option<String>,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Inspect or create the configuration file
    Config {
        /// Write a default configuration file
        #[arg(long)]
        init: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Configuration::load()?;
    init_logging(config.log_level.clone())
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    match cli.command {
        Commands::Validate {
            workflow_file,
            json,
        } => {
            handlers::handle_validate(workflow_file, json).await?;
        }
        Commands::Kinds { json } => {
            handlers::handle_kinds(json).await?;
        }
        Commands::Show { kind, json } => {
            handlers::handle_show(kind, json).await?;
        }
        Commands::Start { kind, json } => {
            handlers::handle_start(kind, json).await?;
        }
        Commands::Fire {
            record_id,
            transition,
            actor,
            capabilities,
            justification,
            acknowledge,
            attachments,
            json,
        } => {
            handlers::handle_fire(
                record_id,
                transition,
                actor,
                capabilities,
                justification,
                acknowledge,
                attachments,
                json,
            )
            .await?;
        }
        Commands::Status { record_id, json } => {
            handlers::handle_status(record_id, json).await?;
        }
        Commands::History { record_id, json } => {
            handlers::handle_history(record_id, json).await?;
        }
        Commands::Records { kind, json } => {
            handlers::handle_records(kind, json).await?;
        }
        Commands::Metrics { kind, json } => {
            handlers::handle_metrics(kind, json).await?;
        }
        Commands::Config { init } => {
            handlers::handle_config(init).await?;
        }
    }

    Ok(())
}
