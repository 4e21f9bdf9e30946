//! CRM job runner.
//!
//! ```bash
//! crm-jobs heartbeat
//! crm-jobs restock
//! crm-jobs reminders
//! crm-jobs report
//! crm-jobs seed
//! ```
//!
//! Jobs are single invocations meant to be scheduled by cron. They always exit
//! successfully; failures are written to the job's log file.

use std::process::ExitCode;

use chrono::Local;
use clap::{Parser, Subcommand};
use crm_jobs::{HttpApiClient, Job};
use crm_store::{seed_fixtures, Config, Repositories};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "crm-jobs")]
#[command(author, version, about = "Scheduled CRM jobs and database seeding")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log that the CRM is alive and check the API greeting
    Heartbeat,
    /// Restock low-stock products
    Restock,
    /// Log orders placed in the last 7 days
    Reminders,
    /// Log customer, order and revenue totals
    Report,
    /// Load the fixture customers, products and orders
    Seed,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "crm_jobs=info,crm_store=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load config: {e}");
            return ExitCode::FAILURE;
        }
    };

    let job = match cli.command {
        Commands::Heartbeat => Job::Heartbeat,
        Commands::Restock => Job::Restock,
        Commands::Reminders => Job::Reminders,
        Commands::Report => Job::Report,
        Commands::Seed => return seed(&config).await,
    };

    let api = match HttpApiClient::new(&config.jobs) {
        Ok(api) => api,
        Err(e) => {
            tracing::error!("Failed to build API client: {e}");
            return ExitCode::SUCCESS;
        }
    };

    let sink = job.sink(&config.jobs);
    if let Err(e) = job.run(&api, &sink, Local::now()).await {
        tracing::error!(job = job.name(), path = %sink.path().display(), "Job failed: {e}");
    }
    ExitCode::SUCCESS
}

async fn seed(config: &Config) -> ExitCode {
    let result = async {
        let repos = Repositories::connect(config).await.map_err(|e| e.to_string())?;
        seed_fixtures(&repos).await.map_err(|e| e.to_string())
    }
    .await;

    match result {
        Ok(summary) => {
            tracing::info!(
                customers = summary.customers_created,
                products = summary.products_created,
                orders = summary.orders_created,
                "Seeding complete"
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("Seeding failed: {e}");
            ExitCode::FAILURE
        }
    }
}
