//! News API Client
//!
//! HTTP client for the reader's data endpoints. Filters are passed as
//! request headers, which is how the server expects them.

use reqwest::header::{HeaderValue, CONTENT_TYPE};
use reqwest::{Client, RequestBuilder, Response};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use super::dto::{FeedView, SortOrder, View};
use crate::config::ServerConfig;

/// Client for the news reader's REST-like endpoints
pub struct NewsClient {
    client: Client,
    base_url: String,
}

impl NewsClient {
    /// Create a client for the given server
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::InvalidRequest(e.to_string()))?;

        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { client, base_url })
    }

    /// Create a client from the server section of the config
    pub fn from_config(config: &ServerConfig) -> Result<Self, ApiError> {
        Self::new(
            config.base_url.clone(),
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    /// Server base URL without a trailing slash
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// All news within the server's current time filter and order
    pub async fn load_news(&self) -> Result<FeedView, ApiError> {
        let request = self.client.get(self.url("/load-news"));
        self.fetch_json(request).await
    }

    /// News from a single channel
    pub async fn filter_by_link(&self, channel_link: &str) -> Result<FeedView, ApiError> {
        if channel_link.is_empty() {
            return Err(ApiError::InvalidRequest("channel link is required".to_string()));
        }

        let request = self
            .client
            .get(self.url("/filter-by-link"))
            .header("Link", header_value(channel_link)?);
        self.fetch_json(request).await
    }

    /// Full-text search over titles and descriptions.
    ///
    /// A blank query returns the unfiltered listing.
    pub async fn search(&self, query: &str) -> Result<FeedView, ApiError> {
        let query = query.trim();
        if query.is_empty() {
            return self.load_news().await;
        }

        let encoded = urlencoding::encode(query);
        let request = self
            .client
            .post(self.url("/filter-by-search"))
            .header(CONTENT_TYPE, "application/json")
            .header("Search-Query", header_value(&encoded)?);
        self.fetch_json(request).await
    }

    /// Restrict the listing to the last `hours` hours
    pub async fn filter_by_time(&self, hours: u32) -> Result<FeedView, ApiError> {
        let request = self
            .client
            .get(self.url("/sort-news"))
            .header("timeFilter", hours.to_string());
        self.fetch_json(request).await
    }

    /// Change the listing order
    pub async fn sort(&self, order: SortOrder) -> Result<FeedView, ApiError> {
        let request = self
            .client
            .get(self.url("/sort-news"))
            .header("sortFilter", order.as_str());
        self.fetch_json(request).await
    }

    /// Flip the listing order
    pub async fn toggle_sort(&self, current: SortOrder) -> Result<FeedView, ApiError> {
        self.sort(current.toggled()).await
    }

    /// Markup fragment for a static view
    pub async fn view(&self, view: View) -> Result<String, ApiError> {
        let response = self.send(self.client.get(self.url(view.path()))).await?;
        response.text().await.map_err(map_request_error)
    }

    async fn fetch_json(&self, request: RequestBuilder) -> Result<FeedView, ApiError> {
        let response = self.send(request).await?;
        let view: FeedView = response.json().await.map_err(map_request_error)?;
        debug!(total = view.total_count, "Feed view received");
        Ok(view)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, ApiError> {
        let response = request.send().await.map_err(map_request_error)?;

        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            Err(ApiError::Status {
                status: status.as_u16(),
                message: text.trim().to_string(),
            })
        }
    }
}

fn header_value(value: &str) -> Result<HeaderValue, ApiError> {
    HeaderValue::from_str(value)
        .map_err(|_| ApiError::InvalidRequest(format!("not a valid header value: {:?}", value)))
}

fn map_request_error(e: reqwest::Error) -> ApiError {
    if e.is_timeout() {
        ApiError::Timeout
    } else if e.is_connect() {
        ApiError::Unavailable
    } else {
        ApiError::Request(e)
    }
}

/// Errors that can occur when talking to the news server
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("News server unavailable")]
    Unavailable,

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API error {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Request timeout")]
    Timeout,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use serde_json::{json, Value};
    use std::net::SocketAddr;

    fn header(headers: &HeaderMap, name: &str) -> Option<String> {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    }

    async fn load_news() -> Json<Value> {
        Json(json!({
            "feedViewHTML": "<div class=\"feed-item\"></div>",
            "totalCount": 2,
            "timeFilterValue": 24,
            "sortFilter": "desc",
            "uniqueItems": [{"channelLink": "https://a.example", "channelTitle": "A News", "category": "tech"}],
            "uniqueCounts": {"https://a.example": 2},
            "uniqueFaviconURLs": {"https://a.example": "https://a.example/favicon.ico"}
        }))
    }

    async fn filter_by_link(headers: HeaderMap) -> Result<Json<Value>, StatusCode> {
        let link = header(&headers, "Link").ok_or(StatusCode::BAD_REQUEST)?;
        Ok(Json(json!({
            "feedViewHTML": "",
            "totalCount": 1,
            "channelTitle": format!("channel {}", link),
        })))
    }

    async fn filter_by_search(headers: HeaderMap) -> Result<Json<Value>, StatusCode> {
        if header(&headers, "content-type").as_deref() != Some("application/json") {
            return Err(StatusCode::UNSUPPORTED_MEDIA_TYPE);
        }
        let raw = header(&headers, "Search-Query").ok_or(StatusCode::BAD_REQUEST)?;
        let query = urlencoding::decode(&raw).map_err(|_| StatusCode::BAD_REQUEST)?;
        Ok(Json(json!({
            "feedViewHTML": format!("results for {}", query),
            "totalCount": 7,
        })))
    }

    async fn sort_news(headers: HeaderMap) -> Json<Value> {
        let hours: u32 = header(&headers, "timeFilter")
            .and_then(|h| h.parse().ok())
            .unwrap_or(24);
        let order = header(&headers, "sortFilter").unwrap_or_else(|| "desc".to_string());
        Json(json!({
            "feedViewHTML": "",
            "totalCount": 0,
            "timeFilterValue": hours,
            "sortFilter": order,
        }))
    }

    async fn spawn_server() -> SocketAddr {
        let app = Router::new()
            .route("/load-news", get(load_news))
            .route("/filter-by-link", get(filter_by_link))
            .route("/filter-by-search", post(filter_by_search))
            .route("/sort-news", get(sort_news))
            .route("/home-view", get(|| async { "<h2 class=\"main-title\">Home</h2>" }))
            .route("/help-view", get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error\n") }));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        addr
    }

    async fn client() -> NewsClient {
        let addr = spawn_server().await;
        NewsClient::new(format!("http://{}/", addr), Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_load_news() {
        let client = client().await;
        let view = client.load_news().await.unwrap();

        assert_eq!(view.total_count, 2);
        assert_eq!(view.sort_filter, Some(SortOrder::Desc));
        assert_eq!(view.channels().next().unwrap().count, 2);
    }

    #[tokio::test]
    async fn test_filter_by_link_sends_header() {
        let client = client().await;
        let view = client.filter_by_link("https://a.example").await.unwrap();
        assert_eq!(view.headline(), "channel https://a.example");

        let result = client.filter_by_link("").await;
        assert!(matches!(result, Err(ApiError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_search_encodes_query() {
        let client = client().await;
        let view = client.search("  café & rust  ").await.unwrap();

        assert_eq!(view.feed_view_html, "results for café & rust");
        assert_eq!(view.total_count, 7);
    }

    #[tokio::test]
    async fn test_blank_search_loads_all_news() {
        let client = client().await;
        let view = client.search("   ").await.unwrap();
        assert_eq!(view.time_filter_value, Some(24));
        assert_eq!(view.total_count, 2);
    }

    #[tokio::test]
    async fn test_time_filter_and_sort() {
        let client = client().await;

        let view = client.filter_by_time(6).await.unwrap();
        assert_eq!(view.time_filter_value, Some(6));

        let view = client.toggle_sort(SortOrder::Desc).await.unwrap();
        assert_eq!(view.sort_filter, Some(SortOrder::Asc));
    }

    #[tokio::test]
    async fn test_views() {
        let client = client().await;

        let html = client.view(View::Home).await.unwrap();
        assert!(html.contains("Home"));

        match client.view(View::Help).await {
            Err(ApiError::Status { status, message }) => {
                assert_eq!(status, 500);
                assert_eq!(message, "Internal Server Error");
            }
            other => panic!("expected status error, got {:?}", other),
        }

        // Not routed on the test server
        let result = client.view(View::Settings).await;
        assert!(matches!(result, Err(ApiError::Status { status: 404, .. })));
    }

    #[tokio::test]
    async fn test_unavailable_server() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = NewsClient::new(format!("http://{}", addr), Duration::from_secs(5)).unwrap();
        let result = client.load_news().await;
        assert!(matches!(result, Err(ApiError::Unavailable)));
    }

    #[test]
    fn test_base_url_trimmed() {
        let config = ServerConfig {
            base_url: "http://reader.local:8080/".to_string(),
            request_timeout_secs: 10,
        };
        let client = NewsClient::from_config(&config).unwrap();
        assert_eq!(client.base_url(), "http://reader.local:8080");
        assert_eq!(client.url("/load-news"), "http://reader.local:8080/load-news");
    }
}
