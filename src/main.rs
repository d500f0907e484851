use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use chrono::{Duration as ChronoDuration, Utc};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

use rohlik_agent::api::{build_router, AppState};
use rohlik_agent::config::AppConfig;
use rohlik_agent::fetch::source_for;
use rohlik_agent::hub::{AccountHub, SharedHub};
use rohlik_agent::normalize::{parse_iso_datetime, EtaExtractor};
use rohlik_agent::parse_duration;
use rohlik_agent::storage::{StateStore, StorageConfig};
use rohlik_agent::sync::Poller;

#[derive(Parser)]
#[command(name = "rohlik-agent")]
#[command(about = "Delivery calendar and monthly spend tracker for a Rohlik account")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(long, default_value = "./config.toml")]
    config: String,

    /// Data directory path (overrides config)
    #[arg(long)]
    data_dir: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Output logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll the account data once and print the summary
    Refresh {
        /// File path or http(s) URL of the account data document
        #[arg(long)]
        input: Option<String>,
    },

    /// Poll continuously at an interval
    Watch {
        #[arg(long)]
        input: Option<String>,

        /// Poll interval (e.g. "10m", "30s")
        #[arg(long)]
        interval: Option<String>,
    },

    /// Start the API server with a background poller
    Serve {
        #[arg(long)]
        input: Option<String>,

        #[arg(long)]
        host: Option<String>,

        #[arg(long)]
        port: Option<u16>,
    },

    /// Debug utilities
    Debug {
        #[command(subcommand)]
        action: DebugAction,
    },
}

#[derive(Subcommand)]
enum DebugAction {
    /// Run the delivery-time extractor over an announcement text
    Eta {
        /// Announcement text (HTML allowed)
        #[arg(long)]
        text: String,

        /// Reference instant (RFC 3339), defaults to now
        #[arg(long)]
        now: Option<String>,
    },

    /// Reconcile a document without persisting and list calendar events
    Events {
        #[arg(long)]
        input: Option<String>,

        /// Range start (RFC 3339), defaults to 30 days ago
        #[arg(long)]
        from: Option<String>,

        /// Range end (RFC 3339), defaults to 30 days ahead
        #[arg(long)]
        to: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load_or_default(&PathBuf::from(&cli.config))
        .with_context(|| format!("Failed to load config from {}", cli.config))?;
    if let Some(data_dir) = &cli.data_dir {
        config.data_dir = PathBuf::from(data_dir);
    }
    if let Some(log_level) = &cli.log_level {
        config.log_level = log_level.clone();
    }

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level));

    let fmt_layer = if cli.json_logs {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer().boxed()
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();

    tracing::info!("Starting rohlik-agent v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Refresh { input } => {
            let location = resolve_input(input, &config)?;
            let (hub, store) = restored_hub(&config)?;
            let poller = Poller::new(source_for(&location)?, hub.clone(), config.poll_every()?)
                .with_store(store);

            let report = poller.poll_once().await?;
            tracing::info!(
                "Refresh complete: {} created, {} updated, {} removed, spend {:.2}",
                report.calendar.created,
                report.calendar.updated,
                report.calendar.removed,
                report.spend.total
            );

            let summary = hub.write().await.summary(Utc::now());
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }

        Commands::Watch { input, interval } => {
            let location = resolve_input(input, &config)?;
            let every = match interval {
                Some(s) => parse_duration(&s).ok_or_else(|| anyhow!("Invalid --interval: {}", s))?,
                None => config.poll_every()?,
            };

            let (hub, store) = restored_hub(&config)?;
            let poller =
                Arc::new(Poller::new(source_for(&location)?, hub, every).with_store(store));

            tracing::info!("Watching {} every {:?} (Ctrl+C to stop)", location, every);
            tokio::select! {
                _ = poller.clone().run_periodic() => {}
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Shutting down");
                    poller.cancel().await;
                }
            }
        }

        Commands::Serve { input, host, port } => {
            let location = resolve_input(input, &config)?;
            let host = host.unwrap_or_else(|| config.server.host.clone());
            let port = port.unwrap_or(config.server.port);

            let (hub, store) = restored_hub(&config)?;
            let poller = Arc::new(
                Poller::new(source_for(&location)?, hub.clone(), config.poll_every()?)
                    .with_store(store),
            );
            tokio::spawn(poller.clone().run_periodic());

            let app = build_router(AppState::new(hub));
            let addr = format!("{}:{}", host, port);
            let listener = tokio::net::TcpListener::bind(&addr)
                .await
                .with_context(|| format!("Failed to bind {}", addr))?;

            tracing::info!("API server listening on http://{}", addr);
            axum::serve(listener, app).await?;
            poller.cancel().await;
        }

        Commands::Debug { action } => match action {
            DebugAction::Eta { text, now } => {
                let tz = config.tz()?;
                let extractor = EtaExtractor::new(tz);
                let now = match now {
                    Some(s) => parse_iso_datetime(Some(&s))
                        .ok_or_else(|| anyhow!("Invalid --now (expected RFC 3339): {}", s))?
                        .with_timezone(&tz),
                    None => Utc::now().with_timezone(&tz),
                };

                match extractor.extract_at(&text, now) {
                    Some(eta) => {
                        println!("ETA:    {}", eta.at.to_rfc3339());
                        println!("Source: {:?}", eta.source);
                    }
                    None => println!("No delivery time found"),
                }
            }

            DebugAction::Events { input, from, to } => {
                let location = resolve_input(input, &config)?;
                let now = Utc::now();
                let from = match from {
                    Some(s) => parse_iso_datetime(Some(&s))
                        .ok_or_else(|| anyhow!("Invalid --from: {}", s))?
                        .with_timezone(&Utc),
                    None => now - ChronoDuration::days(30),
                };
                let to = match to {
                    Some(s) => parse_iso_datetime(Some(&s))
                        .ok_or_else(|| anyhow!("Invalid --to: {}", s))?
                        .with_timezone(&Utc),
                    None => now + ChronoDuration::days(30),
                };

                let data = source_for(&location)?.fetch().await?;
                let mut hub = AccountHub::from_config(&config)?;
                let report = hub.apply_update(data, now);
                println!(
                    "Reconciled {} events ({} reconstructed from memory)\n",
                    report.calendar.total, report.calendar.reconstructed
                );

                for event in hub.calendar().events_in_range(from, to) {
                    println!(
                        "{}  {} -> {}  {}",
                        event.order_id,
                        event.start.to_rfc3339(),
                        event.end.to_rfc3339(),
                        event.summary
                    );
                }
            }
        },
    }

    Ok(())
}

fn resolve_input(input: Option<String>, config: &AppConfig) -> Result<String> {
    input
        .or_else(|| config.source.clone())
        .ok_or_else(|| anyhow!("No account data source: pass --input or set `source` in config"))
}

/// A shared hub seeded with whatever the previous run persisted.
fn restored_hub(config: &AppConfig) -> Result<(SharedHub, StateStore)> {
    let store = StateStore::for_config(&StorageConfig::new(config.data_dir.clone()));
    let mut hub = AccountHub::from_config(config)?;

    let persisted = store
        .load()
        .with_context(|| format!("Failed to load state from {}", store.path().display()))?;
    tracing::debug!(
        "Restored {} remembered slots from {}",
        persisted.stored_delivery_slots.len(),
        store.path().display()
    );
    hub.restore(persisted);

    Ok((hub.into_shared(), store))
}
