//! Store Ratings CLI - database migrations and admin bootstrap.
//!
//! # Usage
//!
//! ```bash
//! # Apply database migrations
//! sr-cli migrate
//!
//! # Create the first administrator
//! sr-cli admin create -n "Platform Administrator Account" -e admin@example.com -p 'Adm1n!pass'
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `admin create` - Create an administrator account

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "sr-cli")]
#[command(author, version, about = "Store Ratings CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage administrator accounts
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Create a new administrator
    Create {
        /// Display name (20-60 characters)
        #[arg(short, long)]
        name: String,

        /// Email address
        #[arg(short, long)]
        email: String,

        /// Initial password
        #[arg(short, long)]
        password: String,

        /// Postal address
        #[arg(short, long)]
        address: Option<String>,
    },
}

#[tokio::main]
async fn main() {
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
                name,
                email,
                password,
                address,
            } => {
                commands::admin::create(&name, &email, &password, address.as_deref()).await?;
            }
        },
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_admin_create() {
        let cli = Cli::try_parse_from([
            "sr-cli", "admin", "create", "-n", "Platform Administrator Account", "-e",
            "root@example.com", "-p", "Adm1n!pass",
        ])
        .unwrap();
        match cli.command {
            Commands::Admin {
                action:
                    AdminAction::Create {
                        email, address, ..
                    },
            } => {
                assert_eq!(email, "root@example.com");
                assert!(address.is_none());
            }
            Commands::Migrate => panic!("expected admin create"),
        }
    }

    #[test]
    fn test_admin_create_requires_password() {
        assert!(
            Cli::try_parse_from(["sr-cli", "admin", "create", "-n", "x", "-e", "a@b.io"]).is_err()
        );
    }
}
