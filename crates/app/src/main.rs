//! Artdesk command-line client.
//!
//! Every invocation loads settings, restores the stored session, runs one
//! command against the engine, and exits.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::warn;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use artdesk_infrastructure::ClientSettings;

mod commands;
mod wiring;

#[derive(Parser)]
#[command(name = "artdesk")]
#[command(about = "Artdesk client - session and catalogue management", long_about = None)]
struct Cli {
    /// Settings file (defaults to ./artdesk.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in with email and password
    Login {
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Create an account
    Register {
        email: String,
        #[arg(long)]
        password: String,
        /// Password confirmation; must match when given
        #[arg(long)]
        confirm: Option<String>,
        /// Display name
        #[arg(long)]
        name: Option<String>,
    },
    /// Sign out and forget the stored session
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Request a password-reset code
    ResetPassword { email: String },
    /// Set a new password with a reset code
    ConfirmReset {
        email: String,
        code: String,
        #[arg(long)]
        new_password: String,
    },
    /// Confirm an email address with a verification code
    VerifyEmail { email: String, code: String },
    /// Submit a one-time passcode
    VerifyOtp { email: String, code: String },
    /// Manage artworks
    Artworks {
        #[command(subcommand)]
        action: RecordAction,
    },
    /// Manage contacts
    Contacts {
        #[command(subcommand)]
        action: RecordAction,
    },
    /// Show the analytics dashboard
    Dashboard,
}

#[derive(Subcommand)]
enum RecordAction {
    /// List all records
    List,
    /// Show one record
    Show { id: String },
    /// Create a record from a JSON object
    Create {
        #[arg(long)]
        data: String,
        /// Image to upload with the record
        #[arg(long)]
        attachment: Option<PathBuf>,
    },
    /// Change a record's status
    SetStatus { id: String, status: String },
    /// Update a record from a JSON object
    Update {
        id: String,
        #[arg(long)]
        data: String,
        /// Replacement image
        #[arg(long)]
        attachment: Option<PathBuf>,
    },
    /// Delete a record
    Delete { id: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let settings = ClientSettings::load(cli.config.as_deref())?;
    let engine = wiring::connect(&settings).await?;

    // A session that cannot be checked right now is not fatal; the command
    // reports its own authentication state.
    if let Err(e) = engine.start().await {
        warn!(error = %e, "could not restore the previous session");
    }

    commands::run(&engine, cli.command).await
}
