//! Event Stream Transport
//!
//! The seam between the live client and the network. A transport opens one
//! push-stream connection per call; the returned stream is the connection
//! handle and dropping it closes the connection.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;
use parking_lot::Mutex;
use reqwest::header::{ACCEPT, CACHE_CONTROL, CONTENT_TYPE};
use reqwest::Client;

use super::error::{LiveError, LiveResult};
use super::event::{SseDecoder, SseFrame};
use crate::config::Config;

/// An open event stream. Ends with `None` when the server closes it.
pub type EventStream = BoxStream<'static, LiveResult<SseFrame>>;

/// Opens push-stream connections
#[async_trait]
pub trait Transport: Send + Sync {
    /// Open a new connection
    async fn open(&self) -> LiveResult<EventStream>;
}

/// Event stream over HTTP
pub struct HttpTransport {
    client: Client,
    url: String,
    last_event_id: Arc<Mutex<Option<String>>>,
}

impl HttpTransport {
    /// Create a transport for the given stream URL
    pub fn new(url: impl Into<String>, connect_timeout: Duration) -> LiveResult<Self> {
        // No overall timeout: the body is expected to stay open indefinitely
        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|e| LiveError::InvalidRequest(e.to_string()))?;

        Ok(Self {
            client,
            url: url.into(),
            last_event_id: Arc::new(Mutex::new(None)),
        })
    }

    /// Create a transport from the server and live sections of the config
    pub fn from_config(config: &Config) -> LiveResult<Self> {
        let url = format!(
            "{}{}",
            config.server.base_url.trim_end_matches('/'),
            config.live.stream_path
        );
        Self::new(url, Duration::from_secs(config.server.request_timeout_secs))
    }

    /// Stream URL
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Last event id received on any connection of this transport
    pub fn last_event_id(&self) -> Option<String> {
        self.last_event_id.lock().clone()
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn open(&self) -> LiveResult<EventStream> {
        let mut request = self
            .client
            .get(&self.url)
            .header(ACCEPT, "text/event-stream")
            .header(CACHE_CONTROL, "no-cache");

        if let Some(id) = self.last_event_id() {
            request = request.header("Last-Event-ID", id);
        }

        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(LiveError::Status(status.as_u16()));
        }

        if let Some(content_type) = response.headers().get(CONTENT_TYPE) {
            let content_type = content_type.to_str().unwrap_or_default();
            if !content_type.starts_with("text/event-stream") {
                return Err(LiveError::ContentType(content_type.to_string()));
            }
        }

        let last_event_id = Arc::clone(&self.last_event_id);
        let mut body = response.bytes_stream();

        let stream = async_stream::stream! {
            let mut decoder = SseDecoder::resume(last_event_id.lock().clone());
            while let Some(chunk) = body.next().await {
                match chunk {
                    Ok(chunk) => {
                        let frames = decoder.feed(&chunk);
                        // Includes empty-id resets and ids on frames without data
                        *last_event_id.lock() = decoder.last_event_id().map(str::to_string);
                        for frame in frames {
                            yield Ok(frame);
                        }
                    }
                    Err(e) => {
                        yield Err(LiveError::Read(e.to_string()));
                        break;
                    }
                }
            }
        };

        Ok(stream.boxed())
    }
}
