//! NeonFlake CLI - operational tools for the admin backend.
//!
//! # Usage
//!
//! ```bash
//! # Register a dashboard login
//! nf-cli user create -e admin@neonflake.in --password 'correct horse'
//!
//! # Store default text for content pages that have never been saved
//! nf-cli content seed
//!
//! # Overwrite every content page with its default text
//! nf-cli content seed --force
//! ```
//!
//! # Environment Variables
//!
//! - `BACKEND_URL`, `BACKEND_ANON_KEY` - backend project
//! - `BACKEND_SERVICE_KEY` - required by `content seed`

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "nf-cli")]
#[command(author, version, about = "NeonFlake admin CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage dashboard logins
    User {
        #[command(subcommand)]
        action: UserAction,
    },
    /// Manage content blocks
    Content {
        #[command(subcommand)]
        action: ContentAction,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Register a new email/password login
    Create {
        /// Login email address
        #[arg(short, long)]
        email: String,

        /// Password; read from `NF_USER_PASSWORD` when omitted
        #[arg(long, env = "NF_USER_PASSWORD", hide_env_values = true)]
        password: String,
    },
}

#[derive(Subcommand)]
enum ContentAction {
    /// Store default text for content pages
    Seed {
        /// Overwrite pages that already have content
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    // Load .env file if present (ignore errors if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::User { action } => match action {
            UserAction::Create { email, password } => {
                commands::user::create(&email, password.into()).await?;
            }
        },
        Commands::Content { action } => match action {
            ContentAction::Seed { force } => {
                let report = commands::content::seed(force).await?;
                tracing::info!(
                    written = report.written.len(),
                    skipped = report.skipped.len(),
                    "Content seeding finished"
                );
            }
        },
    }
    Ok(())
}
