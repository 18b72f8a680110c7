//! Newsfeed CLI
//!
//! Command-line front end for a self-hosted news reader:
//! - Follow live updates
//! - Fetch, filter, search and sort the listing
//! - Print static views
//! - Generate a config file

use anyhow::Context;
use clap::{Parser, Subcommand};
use newsfeed_live::{
    generate_default_config, Config, ConnectionState, FeedReloader, FeedSnapshot, FeedView,
    LiveClient, LoggingConfig, NewsClient, SortOrder, View,
};
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "newsfeed")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Follow a self-hosted news reader from the terminal")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (default: ~/.config/newsfeed/config.toml or ./newsfeed.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// News server URL, overrides the config file
    #[arg(long, global = true)]
    pub server: Option<String>,

    /// Output format (text, json)
    #[arg(short, long, default_value = "text", global = true)]
    pub format: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Follow live updates until interrupted
    Watch,

    /// Show all news
    News,

    /// Search titles and descriptions
    Search {
        /// Search terms
        query: Vec<String>,
    },

    /// Show news from one channel
    Channel {
        /// Channel link
        link: String,
    },

    /// Show news from the last N hours
    Hours {
        /// Time window in hours
        hours: u32,
    },

    /// Change the listing order
    Sort {
        /// asc or desc
        order: SortOrder,
    },

    /// Print a static view (home, settings, add-feed, help)
    View {
        /// View name
        view: View,
    },

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let Cli {
        command,
        config: config_path,
        server,
        format,
    } = Cli::parse();

    if let Commands::Config { output } = &command {
        let content = generate_default_config();
        match output {
            Some(path) => {
                std::fs::write(path, content)
                    .with_context(|| format!("Failed to write {:?}", path))?;
                println!("Config written to {:?}", path);
            }
            None => print!("{}", content),
        }
        return Ok(());
    }

    let mut config = match &config_path {
        Some(path) => Config::load_with_env(path)?,
        None => Config::load_default(),
    };
    if let Some(server) = server {
        config.server.base_url = server;
    }

    init_logging(&config.logging)?;
    tracing::debug!(server = %config.server.base_url, "Newsfeed v{}", env!("CARGO_PKG_VERSION"));

    let news = Arc::new(NewsClient::from_config(&config.server)?);

    match command {
        Commands::Watch => watch(&config, news, &format).await?,
        Commands::News => print_view(&news.load_news().await?, &format)?,
        Commands::Search { query } => print_view(&news.search(&query.join(" ")).await?, &format)?,
        Commands::Channel { link } => print_view(&news.filter_by_link(&link).await?, &format)?,
        Commands::Hours { hours } => print_view(&news.filter_by_time(hours).await?, &format)?,
        Commands::Sort { order } => print_view(&news.sort(order).await?, &format)?,
        Commands::View { view } => println!("{}", news.view(view).await?.trim()),
        Commands::Config { .. } => {}
    }

    Ok(())
}

/// Follow the event stream, printing every fresh listing
async fn watch(config: &Config, news: Arc<NewsClient>, format: &str) -> anyhow::Result<()> {
    let reloader = Arc::new(FeedReloader::new(news));
    let client = LiveClient::from_config(config, reloader.clone())?;

    let mut snapshots = reloader.watch();
    let mut state = client.watch_state();

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    client.start().await;

    loop {
        tokio::select! {
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = snapshots.borrow_and_update().clone();
                if let Some(snapshot) = snapshot {
                    print_snapshot(&snapshot, format)?;
                }
            }
            changed = state.changed() => {
                if changed.is_err() {
                    break;
                }
                let current = *state.borrow_and_update();
                tracing::debug!(state = %current, "Live state changed");
                if current == ConnectionState::PermanentlyFailed {
                    client.stop().await;
                    anyhow::bail!(
                        "Live updates stopped after {} reconnect attempts. Manual refresh required.",
                        client.policy().max_attempts
                    );
                }
            }
            _ = &mut shutdown => {
                tracing::info!("Interrupted");
                break;
            }
        }
    }

    client.stop().await;
    Ok(())
}

fn print_snapshot(snapshot: &FeedSnapshot, format: &str) -> anyhow::Result<()> {
    if format != "json" {
        println!("[{}]", snapshot.fetched_at.format("%H:%M:%S"));
    }
    print_view(&snapshot.view, format)
}

fn print_view(view: &FeedView, format: &str) -> anyhow::Result<()> {
    if format == "json" {
        println!("{}", serde_json::to_string_pretty(view)?);
        return Ok(());
    }

    println!("{} ({} items)", view.headline(), view.total_count);
    if let Some(order) = view.sort_filter {
        println!("Order: {}", order);
    }

    let channels: Vec<_> = view.channels().collect();
    if !channels.is_empty() {
        let width = channels.iter().map(|c| c.title.len()).max().unwrap_or(0);
        println!();
        for channel in channels {
            println!(
                "  {:<width$}  {:>4}  {}",
                channel.title,
                channel.count,
                channel.category,
                width = width
            );
        }
    }

    Ok(())
}

fn init_logging(config: &LoggingConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "newsfeed_live={level},newsfeed={level}",
            level = config.level
        ))
    });

    // Logs never go to stdout, which carries command output
    let writer = match &config.file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path))?;
            BoxMakeWriter::new(Mutex::new(file))
        }
        None => BoxMakeWriter::new(std::io::stderr),
    };

    let registry = tracing_subscriber::registry().with(filter);
    match config.format.as_str() {
        "json" => registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(writer))
            .init(),
        _ => registry
            .with(tracing_subscriber::fmt::layer().with_writer(writer))
            .init(),
    }

    Ok(())
}
