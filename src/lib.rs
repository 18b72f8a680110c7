//! # Newsfeed Live
//!
//! Live-update client for a self-hosted news-feed reader.
//!
//! ## Features
//!
//! - **Single subscription**: at most one event-stream connection per client
//! - **Bounded recovery**: exponential backoff (1s doubling, 30s cap), five
//!   reconnects, reset whenever the server sends `init`
//! - **Pluggable reload**: any [`live::Reload`] runs on `init` and `update`
//! - **Typed data endpoints**: listing, channel filter, search, time window,
//!   sort order and static views
//!
//! ## Modules
//!
//! - [`live`]: event stream transport, decoder and the live client
//! - [`news`]: data endpoint client and the default reload action
//! - [`config`]: TOML configuration with environment overrides
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use newsfeed_live::{Config, FeedReloader, LiveClient, NewsClient};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load_default();
//!
//!     let news = Arc::new(NewsClient::from_config(&config.server)?);
//!     let reloader = Arc::new(FeedReloader::new(news));
//!     let client = LiveClient::from_config(&config, reloader.clone())?;
//!
//!     // Page load
//!     client.start().await;
//!
//!     let mut snapshots = reloader.watch();
//!     snapshots.changed().await?;
//!     if let Some(snapshot) = reloader.latest() {
//!         println!("{}: {} items", snapshot.view.headline(), snapshot.view.total_count);
//!     }
//!
//!     // Page unload
//!     client.stop().await;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod live;
pub mod news;

pub use config::{generate_default_config, Config, ConfigError, LiveConfig, LoggingConfig, ServerConfig};

pub use live::{
    reload_fn, BackoffPolicy, ConnectionState, HttpTransport, LiveClient, LiveError, LiveEvent,
    LiveNotice, Reload, SseDecoder, SseFrame, Transport,
};

pub use news::{ApiError, FeedReloader, FeedSnapshot, FeedView, NewsClient, SortOrder, View};
