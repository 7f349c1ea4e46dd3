//! Host binary for operating the entitlement store from a shell.
//!
//! Runs on the filesystem storage handler and the system clock, so the state
//! it reads and writes is the same a device build would persist under the
//! configured storage directory. Guarded by the `host` feature.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rigmarket_app::{
    AppConfig, AppResult, EntitlementError, EntitlementStore, MeteredAction, PlanTier,
};
use rigmarket_effects::{FilesystemStorageHandler, SystemClockHandler};

#[derive(Parser)]
#[command(name = "app-host")]
#[command(about = "rigmarket app core host - inspect and drive entitlements", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file path
    #[arg(short, long, global = true, default_value = ".rigmarket/config.toml")]
    config: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Show plan, features and usage
    Status,

    /// Consume one metered action (`new` or `upgrade`)
    Consume {
        /// Action to consume
        action: MeteredAction,
    },

    /// Switch plan for one month
    Upgrade {
        /// Target plan: free, basic, pro or premium
        plan: PlanTier,
    },

    /// Zero the usage counters
    Reset,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = load_config(&cli.config).map_err(|err| {
        let hint = err.category().resolution_hint();
        anyhow::Error::new(err).context(format!("{} ({hint})", cli.config.display()))
    })?;

    let filter = if cli.verbose {
        "debug"
    } else {
        config.logging.filter.as_str()
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let storage = Arc::new(FilesystemStorageHandler::new(config.storage.dir.clone()));
    let clock = Arc::new(SystemClockHandler::new());

    let store = match EntitlementStore::load(storage.clone(), clock.clone()).await {
        Ok(store) => store,
        Err(err @ EntitlementError::Clock(_)) => return Err(err).context("reading the clock"),
        Err(err) => {
            tracing::warn!(error = %err, "discarding stored entitlements");
            EntitlementStore::fresh(storage, clock).await?
        }
    };

    match cli.command {
        Commands::Status => print_status(&store),
        Commands::Consume { action } => {
            if store.consume(action).await {
                println!("consumed {action}");
            } else {
                println!("quota for {action} exhausted on the {} plan", store.plan());
            }
            print_status(&store);
        }
        Commands::Upgrade { plan } => {
            store.upgrade(plan).await?;
            print_status(&store);
        }
        Commands::Reset => {
            store.reset_usage().await?;
            print_status(&store);
        }
    }

    Ok(())
}

fn load_config(path: &Path) -> AppResult<AppConfig> {
    let mut config = AppConfig::load_from_file(path)?;
    config.merge_with_env()?;
    config.validate()?;
    Ok(config)
}

fn print_status(store: &EntitlementStore) {
    let data = store.snapshot();
    let features = data.features();

    println!("plan:             {}", data.plan());
    println!("active:           {}", data.is_active());
    match data.subscription_end_date() {
        Some(end) => println!("renews:           {}", end.to_rfc3339()),
        None => println!("renews:           -"),
    }
    println!("price alerts:     {}", features.price_alerts);
    println!("priority support: {}", features.priority_support);
    println!("ad free:          {}", features.ad_free);
    println!("seller analytics: {}", features.seller_analytics);

    for action in [MeteredAction::AiBuild, MeteredAction::AiUpgrade] {
        let used = data.usage().used(action);
        let limit = match store.remaining(action) {
            Some(left) => format!("{left} left"),
            None => "unlimited".to_string(),
        };
        println!(
            "{:<17} {used} used, {limit} ({:.0}%)",
            format!("{action}:"),
            store.usage_percentage(action)
        );
    }
    println!("window started:   {}", data.usage().last_reset_date.to_rfc3339());
}
