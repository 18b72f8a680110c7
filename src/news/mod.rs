//! News Reader API
//!
//! Typed access to the reader's data endpoints and the reload action that
//! keeps a local copy of the current listing fresh.
//!
//! ## Endpoints
//!
//! - `/load-news`: current listing (JSON)
//! - `/filter-by-link`: one channel, selected by the `Link` header
//! - `/filter-by-search`: search, query in the `Search-Query` header
//! - `/sort-news`: time window (`timeFilter`) and order (`sortFilter`)
//! - `/home-view`, `/setting-view`, `/add-feed`, `/help-view`: markup

mod client;
mod dto;
mod reloader;

pub use client::{ApiError, NewsClient};
pub use dto::{ChannelSummary, FeedView, NewsItem, SortOrder, View};
pub use reloader::{FeedReloader, FeedSnapshot};
