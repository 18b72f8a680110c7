//! Feed Reloader
//!
//! The default reload action for the live client: fetch the current listing
//! and publish it to whoever is displaying it.

use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;

use super::client::NewsClient;
use super::dto::FeedView;
use crate::live::Reload;

/// A fetched listing and when it was fetched
#[derive(Debug, Clone)]
pub struct FeedSnapshot {
    pub view: FeedView,
    pub fetched_at: DateTime<Utc>,
}

/// Reloads `/load-news` and keeps the latest result
pub struct FeedReloader {
    client: Arc<NewsClient>,
    latest: watch::Sender<Option<Arc<FeedSnapshot>>>,
}

impl FeedReloader {
    pub fn new(client: Arc<NewsClient>) -> Self {
        let (latest, _) = watch::channel(None);
        Self { client, latest }
    }

    /// Most recent snapshot, if any reload has succeeded
    pub fn latest(&self) -> Option<Arc<FeedSnapshot>> {
        self.latest.borrow().clone()
    }

    /// Watch for new snapshots
    pub fn watch(&self) -> watch::Receiver<Option<Arc<FeedSnapshot>>> {
        self.latest.subscribe()
    }
}

#[async_trait]
impl Reload for FeedReloader {
    async fn reload(&self) -> anyhow::Result<()> {
        let view = self
            .client
            .load_news()
            .await
            .context("Error loading news")?;

        info!(
            total = view.total_count,
            channels = view.unique_items.len(),
            "Feed reloaded"
        );

        self.latest.send_replace(Some(Arc::new(FeedSnapshot {
            view,
            fetched_at: Utc::now(),
        })));
        Ok(())
    }
}
