use anyhow::Result;
use clap::{Parser, Subcommand};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use comicsub::config::Config;
use comicsub::registry::FetcherRegistry;
use comicsub::settings::JsonSettings;
use comicsub::ui::{ReaderSession, UiHub};
use comicsub::{notifier, SubscriptionManager, UiAction};

#[derive(Parser)]
#[command(name = "comicsub")]
#[command(about = "Comic subscription manager with chapter update checks")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the default configuration and an empty catalog
    Init,
    /// Save a comic without subscribing to it
    Register {
        host: String,
        titlekey: String,
        #[arg(long)]
        title: String,
        #[arg(long)]
        link: String,
        #[arg(long, default_value = "")]
        thumbnail: String,
    },
    /// Toggle the subscription of a comic (registers it when unknown)
    Subscribe {
        host: String,
        titlekey: String,
        #[arg(long, default_value = "")]
        title: String,
        #[arg(long, default_value = "")]
        link: String,
        #[arg(long, default_value = "")]
        thumbnail: String,
    },
    /// Stop tracking a comic
    Unsubscribe { host: String, titlekey: String },
    /// Check subscribed comics for new chapters, or a single comic
    Check {
        host: Option<String>,
        #[arg(requires = "host")]
        titlekey: Option<String>,
    },
    /// Check for updates periodically until interrupted
    Monitor,
    /// Show subscriptions and the pending-update count
    Status,
    /// Remember the page being read for a comic (pages start at 1)
    Bookmark {
        host: String,
        titlekey: String,
        #[arg(value_parser = clap::value_parser!(u32).range(1..))]
        page: u32,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose)?;

    let config = Config::load(&cli.config)?;

    if let Commands::Init = cli.command {
        info!("Initializing comic subscriptions...");
        if std::path::Path::new(&cli.config).exists() {
            info!("Configuration {} already exists, leaving it untouched", cli.config);
        } else {
            config.save(&cli.config)?;
            info!("Wrote default configuration to {}", cli.config);
        }
    }

    let settings = Arc::new(JsonSettings::open(&config.settings.path)?);
    let session = Arc::new(ReaderSession::new());
    let manager = SubscriptionManager::new(
        settings,
        FetcherRegistry::from_config(&config)?,
        notifier::from_config(&config.notifications),
        UiHub::console(&config.ui, session.clone()),
    )
    .with_app_name(config.notifications.app_name.clone());

    match cli.command {
        Commands::Init => {
            manager.catalog().load_or_init()?;
            info!("Catalog ready at {}", config.settings.path);
        }
        Commands::Register { host, titlekey, title, link, thumbnail } => {
            manager
                .dispatch(UiAction::Register { host, titlekey, title, link, thumbnail })
                .await?;
            manager.update_ui()?;
        }
        Commands::Subscribe { host, titlekey, title, link, thumbnail } => {
            manager
                .dispatch(UiAction::Subscribe { host, titlekey, title, link, thumbnail })
                .await?;
        }
        Commands::Unsubscribe { host, titlekey } => {
            manager.dispatch(UiAction::Unsubscribe { host, titlekey }).await?;
        }
        Commands::Check { host, titlekey } => match (host, titlekey) {
            (Some(host), Some(titlekey)) => {
                manager.check_update_single(&host, &titlekey).await?;
            }
            _ => {
                manager.check_update().await?;
            }
        },
        Commands::Monitor => {
            run_monitor(&manager, config.checker.interval_minutes).await?;
        }
        Commands::Status => {
            manager.dispatch(UiAction::UpdateAllUi).await?;
        }
        Commands::Bookmark { host, titlekey, page } => {
            session.open(&host, &titlekey, page);
            manager.unload()?;
            info!("Bookmarked page {} of {}.{}", page, host, titlekey);
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) -> Result<()> {
    let level = if verbose { "debug" } else { "info" };

    tracing_subscriber::fmt()
        .with_env_filter(format!("comicsub={}", level))
        .with_target(false)
        .init();

    Ok(())
}

async fn run_monitor(manager: &SubscriptionManager, interval_minutes: u64) -> Result<()> {
    info!("🔍 Starting update monitor, checking every {} minutes", interval_minutes);

    manager.ready()?;

    let mut interval = tokio::time::interval(Duration::from_secs(interval_minutes.max(1) * 60));
    loop {
        tokio::select! {
            _ = interval.tick() => {
                if let Err(e) = manager.check_update().await {
                    warn!("❌ Update check failed: {}", e);
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Stopping update monitor");
                manager.unload()?;
                break;
            }
        }
    }

    Ok(())
}
