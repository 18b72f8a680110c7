//! Connection state and lifecycle notices

use serde::Serialize;
use std::time::Duration;

/// Where a subscription currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ConnectionState {
    /// No subscription, or stopped explicitly
    Disconnected,
    /// Opening a connection, or open but waiting for `init`
    Connecting,
    /// `init` received; updates trigger reloads
    Connected,
    /// Waiting to reconnect
    Backoff {
        /// One-based reconnect number
        attempt: u32,
        #[serde(with = "millis")]
        delay: Duration,
    },
    /// Retry budget spent; needs a manual restart
    PermanentlyFailed,
}

impl ConnectionState {
    /// States with no subscription at work: never started, stopped, or out
    /// of retries. Only a call to `start()` leaves them.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ConnectionState::Disconnected | ConnectionState::PermanentlyFailed)
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionState::Disconnected => write!(f, "disconnected"),
            ConnectionState::Connecting => write!(f, "connecting"),
            ConnectionState::Connected => write!(f, "connected"),
            ConnectionState::Backoff { attempt, delay } => {
                write!(f, "reconnect #{} in {}ms", attempt, delay.as_millis())
            }
            ConnectionState::PermanentlyFailed => write!(f, "failed"),
        }
    }
}

/// Lifecycle notices broadcast to observers of a live client
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LiveNotice {
    /// A connection attempt began
    Connecting,
    /// `init` received and the retry budget reset
    Connected,
    /// `update` received
    Update,
    /// `ping`/`keepalive` received
    Keepalive,
    /// The connection failed or was closed
    TransportError { message: String },
    /// A reconnect was scheduled
    ReconnectScheduled { attempt: u32, delay: Duration },
    /// The reload action failed
    ReloadFailed { message: String },
    /// Retry budget spent; no further attempts
    GaveUp { attempts: u32 },
    /// Subscription stopped by the caller
    Stopped,
}

mod millis {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(delay: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(delay.as_millis() as u64)
    }
}
