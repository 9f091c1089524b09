//! PerkShop CLI - migrations and operator tools.
//!
//! # Usage
//!
//! ```bash
//! # Apply database migrations
//! perkshop migrate
//!
//! # Create (or promote) an admin with a password
//! perkshop admin create -e admin@example.com -n "Admin Name" -p 'long password'
//!
//! # Grant points to an employee
//! perkshop points grant -e jo@example.com -a 500 -r "Quarterly award"
//!
//! # Run the monthly export for the previous month, or a given one
//! perkshop export run
//! perkshop export run --period 2026-09
//! ```
//!
//! All commands read `DATABASE_URL` (a `.env` file is honoured).

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

use perkshop_core::export::ExportPeriod;

mod commands;

#[derive(Parser)]
#[command(name = "perkshop")]
#[command(author, version, about = "PerkShop CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply database migrations
    Migrate,
    /// Manage admin users
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
    /// Manage employee points
    Points {
        #[command(subcommand)]
        action: PointsAction,
    },
    /// Monthly CSV exports
    Export {
        #[command(subcommand)]
        action: ExportAction,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Create an admin, or promote an existing profile to admin
    Create {
        /// Admin email address
        #[arg(short, long)]
        email: String,

        /// Admin display name
        #[arg(short, long)]
        name: String,

        /// Login password (at least 8 characters)
        #[arg(short, long)]
        password: String,
    },
}

#[derive(Subcommand)]
enum PointsAction {
    /// Append a ledger entry for an employee
    Grant {
        /// Employee email address
        #[arg(short, long)]
        email: String,

        /// Points to add (negative to debit)
        #[arg(short, long, allow_hyphen_values = true)]
        amount: i64,

        /// Reason shown in the employee's history
        #[arg(short, long)]
        reason: String,
    },
}

#[derive(Subcommand)]
enum ExportAction {
    /// Run the monthly export job
    Run {
        /// Month to export as YYYY-MM (default: previous month)
        #[arg(long)]
        period: Option<ExportPeriod>,
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
            AdminAction::Create {
                email,
                name,
                password,
            } => {
                commands::admin::create(&email, &name, &password).await?;
            }
        },
        Commands::Points { action } => match action {
            PointsAction::Grant {
                email,
                amount,
                reason,
            } => {
                commands::points::grant(&email, amount, &reason).await?;
            }
        },
        Commands::Export { action } => match action {
            ExportAction::Run { period } => commands::export::run(period).await?,
        },
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parses_negative_grant_and_period() {
        let cli = Cli::try_parse_from([
            "perkshop", "points", "grant", "-e", "jo@example.com", "-a", "-250", "-r", "Fix",
        ]);
        assert!(matches!(
            cli.map(|c| c.command),
            Ok(Commands::Points {
                action: PointsAction::Grant { amount: -250, .. }
            })
        ));

        let cli = Cli::try_parse_from(["perkshop", "export", "run", "--period", "2026-09"]);
        assert!(matches!(
            cli.map(|c| c.command),
            Ok(Commands::Export {
                action: ExportAction::Run { period: Some(_) }
            })
        ));

        assert!(Cli::try_parse_from(["perkshop", "export", "run", "--period", "2026-13"]).is_err());
    }
}
