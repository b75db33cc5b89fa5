//! Tronics CLI - Database migrations and account management.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations and create the users unique index
//! tronics migrate
//!
//! # Create an admin account
//! tronics admin create -e admin@tronics.io -p 'correct horse battery'
//!
//! # Grant the admin flag to an existing account
//! tronics admin promote -e buyer@tronics.io
//! ```
//!
//! Both commands read the same environment as the server (`DATABASE_URL`,
//! `JWT_TOKEN_SECRET`, collection names), including a `.env` file.

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "tronics")]
#[command(author, version, about = "Tronics CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage admin accounts
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Register a new admin account
    Create {
        /// Admin email address
        #[arg(short, long)]
        email: String,

        /// Admin password (8 to 300 characters)
        #[arg(short, long)]
        password: String,
    },
    /// Grant the admin flag to an existing account
    Promote {
        /// Email address of the account
        #[arg(short, long)]
        email: String,
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
        Commands::Admin { action } => match action {
            AdminAction::Create { email, password } => {
                commands::admin::create_user(email, password).await?;
            }
            AdminAction::Promote { email } => commands::admin::promote_user(&email).await?,
        },
    }
    Ok(())
}
