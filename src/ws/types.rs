//! WebSocket types and configuration

use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;

/// Inbound text frames of one session, closed when the session ends
pub type FrameReceiver = mpsc::Receiver<Result<String, WsError>>;

/// Transport-level configuration
#[derive(Debug, Clone)]
pub struct WsConfig {
    /// Interval for sending ping frames
    pub ping_interval: Duration,
    /// Capacity of the inbound frame channel
    pub frame_buffer: usize,
}

impl Default for WsConfig {
    fn default() -> Self {
        Self {
            ping_interval: Duration::from_secs(30),
            frame_buffer: 1024,
        }
    }
}

impl WsConfig {
    /// Set ping interval
    pub fn ping_interval(mut self, d: Duration) -> Self {
        self.ping_interval = d;
        self
    }

    /// Set inbound frame channel capacity
    pub fn frame_buffer(mut self, n: usize) -> Self {
        self.frame_buffer = n.max(1);
        self
    }
}

/// WebSocket errors
#[derive(Debug, Clone, Error)]
pub enum WsError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Connection closed: code={code}, reason={reason}")]
    ConnectionClosed { code: u16, reason: String },

    #[error("Send failed: {0}")]
    SendFailed(String),

    #[error("Pong timeout")]
    PongTimeout,

    #[error("No frames received for {0:?}")]
    IdleTimeout(Duration),
}
