use anyhow::Context;
use clap::{Parser, Subcommand};
use gold_rates::app::ports::{PageSource, RateStore};
use gold_rates::config::{Config, VendorProfile};
use gold_rates::db::SqliteRateStore;
use gold_rates::infra::{FilePageSource, HttpPageSource};
use gold_rates::pipeline::{Pipeline, RunOptions};
use gold_rates::tasks::{run_schedule, run_vendor, VendorRunGuard};
use gold_rates::{logging, metrics};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[derive(Parser)]
#[command(name = "gold_rates")]
#[command(about = "Scrapes precious-metal buy/sell rates from bullion vendor sites")]
#[command(version)]
struct Cli {
    /// Path to the configuration file; without it `./config.toml` is used
    /// when present, built-in defaults otherwise
    #[arg(long)]
    config: Option<PathBuf>,

    /// Serve Prometheus metrics while running
    #[arg(long)]
    metrics: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch, extract and store rates for one vendor (or all of them)
    Run {
        /// Vendor id; defaults to `default_vendor` from the config
        #[arg(long)]
        vendor: Option<String>,
        /// Run every configured vendor
        #[arg(long, conflicts_with = "vendor")]
        all: bool,
    },
    /// Extract rates from a saved page and print them without storing
    Extract {
        #[arg(long)]
        vendor: String,
        /// Saved HTML page
        #[arg(long)]
        file: PathBuf,
    },
    /// Print the stored snapshot for a vendor
    Show {
        #[arg(long)]
        vendor: String,
    },
    /// List known vendor profiles
    Vendors,
    /// Run every vendor on the configured interval until interrupted
    Schedule,
}

fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let config = match path {
        // an explicit path must exist
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    Ok(config)
}

fn run_options(config: &Config) -> RunOptions {
    RunOptions { ready_timeout: config.fetch.ready_timeout() }
}

async fn run_once(
    profiles: &[VendorProfile],
    config: &Config,
    store: &dyn RateStore,
) -> anyhow::Result<bool> {
    let source = HttpPageSource::new(&config.fetch)?;
    let guard = VendorRunGuard::new();
    let mut all_ok = true;
    for profile in profiles {
        let outcome = run_vendor(&guard, profile, &source, store, run_options(config)).await;
        println!("\n📊 {} ({})", profile.display_name, profile.vendor_id);
        println!("   Success: {}", outcome.success);
        println!("   Records: {}", outcome.record_count);
        if let Some(reason) = &outcome.reason {
            println!("   Reason:  {}", reason);
        }
        all_ok &= outcome.success;
    }
    Ok(all_ok)
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    // dropped on return, which flushes the log files
    let _log_guards = logging::init_logging(&config.logging.dir);
    if cli.metrics {
        metrics::init_metrics();
    }
    info!("Gold rates extractor starting");

    match cli.command {
        Commands::Run { vendor, all } => {
            let profiles = if all {
                config.vendor_profiles()
            } else {
                let id = vendor.unwrap_or_else(|| config.default_vendor.clone());
                vec![config.vendor(&id)?]
            };
            let store = SqliteRateStore::open(&config.database.path)
                .with_context(|| format!("opening {}", config.database.path.display()))?;
            let ok = run_once(&profiles, &config, &store).await?;
            info!("Gold rates extractor completed");
            if !ok {
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::Extract { vendor, file } => {
            let profile = config.vendor(&vendor)?;
            let tables = FilePageSource::new(file)
                .fetch(&profile.url, config.fetch.ready_timeout())
                .await?;
            let batch = Pipeline::extract_batch(&profile, &tables);
            println!("{}", serde_json::to_string_pretty(&batch)?);
        }
        Commands::Show { vendor } => {
            let store = SqliteRateStore::open(&config.database.path)?;
            let records = store.list(&vendor).await?;
            println!("{}", serde_json::to_string_pretty(&records)?);
        }
        Commands::Vendors => {
            for profile in config.vendor_profiles() {
                let categories: Vec<&str> =
                    profile.categories.iter().map(|c| c.category.as_str()).collect();
                println!(
                    "{:<14} {:<12} {:<40} {}",
                    profile.vendor_id,
                    profile.display_name,
                    profile.url,
                    categories.join(", ")
                );
            }
        }
        Commands::Schedule => {
            let store: Arc<dyn RateStore> = Arc::new(SqliteRateStore::open(&config.database.path)?);
            let source: Arc<dyn PageSource> = Arc::new(HttpPageSource::new(&config.fetch)?);
            let interval = Duration::from_secs(config.schedule.interval_secs.max(1));
            info!("Scheduling {} vendors every {:?}", config.vendor_profiles().len(), interval);
            tokio::select! {
                _ = run_schedule(config.vendor_profiles(), source, store, run_options(&config), interval) => {}
                _ = tokio::signal::ctrl_c() => {
                    info!("Interrupted; stopping scheduler");
                }
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}
