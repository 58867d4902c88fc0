//! Bazaar CLI - Database migrations, seed data and user management.
//!
//! # Usage
//!
//! ```bash
//! # Apply pending migrations
//! bazaar migrate
//!
//! # Insert demo users, categories, products and stock (idempotent)
//! bazaar seed
//!
//! # Grant the admin role
//! bazaar user promote jane@example.com
//!
//! # Block an account from logging in
//! bazaar user deactivate john@example.com
//! ```
//!
//! All commands read `DATABASE_URL` (or the `DB_*` parts) from the
//! environment or `.env`.

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "bazaar")]
#[command(author, version, about = "Bazaar CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Seed the database with demo data
    Seed,
    /// Manage user accounts
    User {
        #[command(subcommand)]
        action: UserAction,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Give a user the admin role
    Promote {
        /// Account email address
        email: String,
    },
    /// Deactivate a user so they can no longer log in
    Deactivate {
        /// Account email address
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
        Commands::Seed => commands::seed::run().await?,
        Commands::User { action } => match action {
            UserAction::Promote { email } => commands::user::promote(&email).await?,
            UserAction::Deactivate { email } => commands::user::deactivate(&email).await?,
        },
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_user_promote() {
        let cli = Cli::try_parse_from(["bazaar", "user", "promote", "jane@example.com"]);
        assert!(matches!(
            cli.map(|c| c.command),
            Ok(Commands::User {
                action: UserAction::Promote { ref email }
            }) if email == "jane@example.com"
        ));
    }

    #[test]
    fn test_user_requires_email() {
        assert!(Cli::try_parse_from(["bazaar", "user", "deactivate"]).is_err());
    }
}
