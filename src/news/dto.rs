//! News API Data Transfer Objects
//!
//! Payloads returned by the reader's data endpoints.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Feed listing returned by the load, filter, search and sort endpoints
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedView {
    /// Pre-rendered markup for the item list
    #[serde(rename = "feedViewHTML", default)]
    pub feed_view_html: String,

    #[serde(default)]
    pub total_count: usize,

    /// Time window in hours, when the endpoint reports one
    #[serde(default)]
    pub time_filter_value: Option<u32>,

    #[serde(default, deserialize_with = "lenient_sort_order")]
    pub sort_filter: Option<SortOrder>,

    /// One representative item per channel
    #[serde(default, deserialize_with = "null_as_default")]
    pub unique_items: Vec<NewsItem>,

    /// Items per channel link
    #[serde(default, deserialize_with = "null_as_default")]
    pub unique_counts: HashMap<String, usize>,

    /// Favicon URL per channel link
    #[serde(
        rename = "uniqueFaviconURLs",
        default,
        deserialize_with = "null_as_default"
    )]
    pub unique_favicon_urls: HashMap<String, String>,

    /// Set by the filter-by-link endpoint
    #[serde(default)]
    pub channel_title: Option<String>,
}

/// A news item as serialized by the server
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewsItem {
    pub title: String,
    pub description: String,
    pub link: String,
    pub pub_date: String,
    pub creator: String,
    pub channel_link: String,
    pub channel_title: String,
    pub category: String,
    pub favicon: String,
}

/// A channel in the sidebar listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelSummary<'a> {
    pub title: &'a str,
    pub link: &'a str,
    pub category: &'a str,
    pub count: usize,
    pub favicon_url: Option<&'a str>,
}

impl FeedView {
    /// Channels in server order, joined with their counts and favicons
    pub fn channels(&self) -> impl Iterator<Item = ChannelSummary<'_>> {
        self.unique_items.iter().map(move |item| ChannelSummary {
            title: &item.channel_title,
            link: &item.channel_link,
            category: &item.category,
            count: self
                .unique_counts
                .get(&item.channel_link)
                .copied()
                .unwrap_or(0),
            favicon_url: self
                .unique_favicon_urls
                .get(&item.channel_link)
                .map(String::as_str)
                .filter(|url| !url.is_empty()),
        })
    }

    /// Panel title for this listing
    pub fn headline(&self) -> String {
        match (&self.channel_title, self.time_filter_value) {
            (Some(title), _) if !title.is_empty() => title.clone(),
            (_, Some(hours)) => format!("All news for the last {} hours", hours),
            _ => "All news".to_string(),
        }
    }
}

/// Listing order by publication date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }

    /// The opposite order
    pub fn toggled(self) -> Self {
        match self {
            SortOrder::Asc => SortOrder::Desc,
            SortOrder::Desc => SortOrder::Asc,
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            other => Err(format!("unknown sort order '{}', expected asc or desc", other)),
        }
    }
}

/// Markup-only views served by the reader
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Home,
    Settings,
    AddFeed,
    Help,
}

impl View {
    /// Endpoint path for this view
    pub fn path(&self) -> &'static str {
        match self {
            View::Home => "/home-view",
            View::Settings => "/setting-view",
            View::AddFeed => "/add-feed",
            View::Help => "/help-view",
        }
    }
}

impl FromStr for View {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "home" => Ok(View::Home),
            "settings" | "setting" => Ok(View::Settings),
            "add-feed" => Ok(View::AddFeed),
            "help" => Ok(View::Help),
            other => Err(format!(
                "unknown view '{}', expected home, settings, add-feed or help",
                other
            )),
        }
    }
}

/// Treat an explicit `null` like a missing field
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Unknown or empty sort values become `None`
fn lenient_sort_order<'de, D>(deserializer: D) -> Result<Option<SortOrder>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|s| s.parse().ok()))
}
