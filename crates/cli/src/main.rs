//! Voltcart CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run API database migrations
//! vc-cli migrate
//!
//! # Create a staff user (password from VOLTCART_NEW_USER_PASSWORD)
//! vc-cli user create -e staff@example.com -u staff --staff
//!
//! # Load or refresh the catalog
//! vc-cli seed products crates/cli/seeds/products.yaml
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `user create` - Create accounts, optionally with staff rights
//! - `seed products` - Upsert catalog products from YAML

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "vc-cli")]
#[command(author, version, about = "Voltcart CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage user accounts
    User {
        #[command(subcommand)]
        action: UserAction,
    },
    /// Seed the database from files
    Seed {
        #[command(subcommand)]
        target: SeedTarget,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Create a new user. The password is read from `VOLTCART_NEW_USER_PASSWORD`.
    Create {
        /// Email address (login)
        #[arg(short, long)]
        email: String,

        /// Username
        #[arg(short, long)]
        username: String,

        /// First name
        #[arg(long, default_value = "")]
        first_name: String,

        /// Last name
        #[arg(long, default_value = "")]
        last_name: String,

        /// Grant staff rights (catalog and order management)
        #[arg(long)]
        staff: bool,
    },
}

#[derive(Subcommand)]
enum SeedTarget {
    /// Upsert products from a YAML file, matched by name and brand
    Products {
        /// Path to the YAML file
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
        Commands::User { action } => match action {
            UserAction::Create {
                email,
                username,
                first_name,
                last_name,
                staff,
            } => {
                commands::user::create(&commands::user::NewAccount {
                    email: &email,
                    username: &username,
                    first_name: &first_name,
                    last_name: &last_name,
                    is_staff: staff,
                })
                .await?;
            }
        },
        Commands::Seed { target } => match target {
            SeedTarget::Products { file } => commands::seed::products(&file).await?,
        },
    }
    Ok(())
}
