//! Idea-HUB CLI - Database migrations and development tooling.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! hub-cli migrate
//!
//! # Seed the database with demo accounts and ideas
//! hub-cli seed
//!
//! # Seed from a custom file
//! hub-cli seed --file my-seed.yml
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `seed` - Load demo users, ideas, upvotes, and comments from a YAML file

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "hub-cli")]
#[command(author, version, about = "Idea-HUB CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Seed the database with demo data
    Seed {
        /// Path to the YAML seed file
        #[arg(short, long, default_value = "seeds/demo.yml")]
        file: String,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Seed { file } => commands::seed::demo_data(&file).await?,
    }
    Ok(())
}
