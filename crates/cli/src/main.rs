//! DAC Retail CLI - Database migrations and store management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run storefront database migrations
//! dac-cli migrate
//!
//! # Load categories and products from YAML
//! dac-cli seed catalog catalog.yaml
//!
//! # Record a shipment and move it forward
//! dac-cli shipment create AB12CD34 --courier bluedart --tracking-id BD123 --expected 2026-11-02
//! dac-cli shipment advance AB12CD34 out_for_delivery
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `seed catalog` - Upsert the product catalog
//! - `shipment` - Create and advance shipments

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use dac_retail_core::{Courier, DeliveryStatus};

mod commands;

#[derive(Parser)]
#[command(name = "dac-cli")]
#[command(author, version, about = "DAC Retail CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run storefront database migrations
    Migrate,
    /// Seed the database
    Seed {
        #[command(subcommand)]
        target: SeedTarget,
    },
    /// Manage shipments
    Shipment {
        #[command(subcommand)]
        action: ShipmentAction,
    },
}

#[derive(Subcommand)]
enum SeedTarget {
    /// Upsert categories and products from a YAML file
    Catalog {
        /// Path to the catalog YAML file
        file: PathBuf,
    },
}

#[derive(Subcommand)]
enum ShipmentAction {
    /// Ship an order
    Create {
        /// Order number (8 characters)
        order_number: String,

        /// Carrier (`bluedart`, `delhivery`, `india_post`, `other`)
        #[arg(short, long, default_value = "other")]
        courier: Courier,

        /// Carrier tracking id
        #[arg(short, long)]
        tracking_id: String,

        /// Expected delivery date (YYYY-MM-DD)
        #[arg(short, long)]
        expected: NaiveDate,
    },
    /// Move a shipment forward
    Advance {
        /// Order number (8 characters)
        order_number: String,

        /// New status (`in_transit`, `out_for_delivery`, `delivered`)
        status: DeliveryStatus,
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
        Commands::Migrate => commands::migrate::storefront().await?,
        Commands::Seed { target } => match target {
            SeedTarget::Catalog { file } => commands::seed::catalog(&file).await?,
        },
        Commands::Shipment { action } => match action {
            ShipmentAction::Create {
                order_number,
                courier,
                tracking_id,
                expected,
            } => {
                commands::shipment::create(&order_number, courier, &tracking_id, expected).await?;
            }
            ShipmentAction::Advance {
                order_number,
                status,
            } => commands::shipment::advance(&order_number, status).await?,
        },
    }
    Ok(())
}
