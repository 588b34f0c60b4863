//! Barberbook CLI - Database migrations and seeding.
//!
//! # Usage
//!
//! ```bash
//! # Run server database migrations
//! bb-cli migrate
//!
//! # Insert sample barbers (optionally clearing existing rows)
//! bb-cli seed barbers --clear
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `seed barbers` - Seed the barber listing with sample data

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "bb-cli")]
#[command(author, version, about = "Barberbook CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Seed the database with sample data
    Seed {
        #[command(subcommand)]
        target: SeedTarget,
    },
}

#[derive(Subcommand)]
enum SeedTarget {
    /// Insert sample barbers
    Barbers {
        /// Delete existing barbers first
        #[arg(long)]
        clear: bool,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CommandError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Seed { target } => match target {
            SeedTarget::Barbers { clear } => commands::seed::barbers(clear).await?,
        },
    }
    Ok(())
}
