//! Live Updates
//!
//! Subscription to the news server's event stream with automatic recovery.
//!
//! ## Architecture
//!
//! - **Transport**: opens one stream connection (`HttpTransport` over reqwest)
//! - **SseDecoder**: turns body chunks into named frames
//! - **LiveClient**: owns the single subscription, reloads on `init`/`update`,
//!   reconnects with exponential backoff and gives up after a bounded budget
//!
//! ## Lifecycle
//!
//! 1. `start()` closes any previous subscription and connects
//! 2. `init` resets the retry budget and triggers a reload
//! 3. `update` triggers a reload; `ping` only proves liveness
//! 4. Errors back off `1s, 2s, 4s, 8s, 16s` (capped at 30s), then fail
//! 5. `stop()` closes the stream and cancels any pending reconnect

mod backoff;
mod client;
mod error;
mod event;
mod state;
mod transport;

pub use backoff::BackoffPolicy;
pub use client::{reload_fn, LiveClient, Reload, ReloadFn, DEFAULT_NOTICE_CAPACITY};
pub use error::{LiveError, LiveResult};
pub use event::{LiveEvent, SseDecoder, SseFrame};
pub use state::{ConnectionState, LiveNotice};
pub use transport::{EventStream, HttpTransport, Transport};
