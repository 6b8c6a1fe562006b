//! Feed types

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;

use super::binance::BINANCE_WS_URL;
use crate::registry::DEFAULT_QUOTE_ASSET;

/// Connection lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    ReconnectScheduled,
}

/// Connection state plus the consecutive reconnect attempt counter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ConnectionStatus {
    pub state: ConnectionState,
    pub attempts: u32,
}

impl Default for ConnectionStatus {
    fn default() -> Self {
        Self {
            state: ConnectionState::Disconnected,
            attempts: 0,
        }
    }
}

impl ConnectionStatus {
    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }
}

/// Feed connection settings
#[derive(Debug, Clone)]
pub struct FeedSettings {
    /// Base WebSocket endpoint; stream identifiers are appended as path segments
    pub endpoint: String,
    /// Quote asset every tracked symbol is paired against
    pub quote_asset: String,
    /// Consecutive automatic reconnects before giving up
    pub max_reconnect_attempts: u32,
    /// Fixed delay before each reconnect
    pub reconnect_delay: Duration,
    /// Treat this much silence on an open session as a fault
    pub idle_timeout: Option<Duration>,
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self {
            endpoint: BINANCE_WS_URL.to_string(),
            quote_asset: DEFAULT_QUOTE_ASSET.to_string(),
            max_reconnect_attempts: 5,
            reconnect_delay: Duration::from_millis(3000),
            idle_timeout: None,
        }
    }
}

/// Generic inbound message, stamped with local receive time
#[derive(Debug, Clone)]
pub struct FeedEnvelope {
    pub received_at: DateTime<Utc>,
    pub payload: serde_json::Value,
}
