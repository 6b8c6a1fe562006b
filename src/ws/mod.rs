//! WebSocket transport
//!
//! Opens a single streaming connection and pumps its text frames into a
//! channel. Reconnection policy lives with the caller (see `feed`), the
//! transport only reports how a session ended.

mod client;
mod types;

pub use client::TungsteniteTransport;
pub use types::{FrameReceiver, WsConfig, WsError};

use async_trait::async_trait;

/// Opens upstream streaming sessions
#[async_trait]
pub trait Transport: Send + Sync {
    /// Open the transport and complete the handshake
    ///
    /// The returned receiver yields text frames in arrival order. `None`
    /// means the peer closed the session; an `Err` item is a transport
    /// fault. Dropping the receiver closes the session.
    async fn open(&self, url: &str) -> Result<FrameReceiver, WsError>;
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::VecDeque;
    use tokio::sync::mpsc;
    use tokio::time::Instant;

    /// Transport that replays scripted outcomes, failing once the script runs out
    #[derive(Default)]
    pub struct ScriptedTransport {
        script: Mutex<VecDeque<Result<FrameReceiver, WsError>>>,
        opens: Mutex<Vec<Instant>>,
    }

    impl ScriptedTransport {
        pub fn failing() -> Self {
            Self::default()
        }

        /// Queue a successful session, returning the sender that feeds it
        pub fn push_session(&self) -> mpsc::Sender<Result<String, WsError>> {
            let (tx, rx) = mpsc::channel(64);
            self.script.lock().push_back(Ok(rx));
            tx
        }

        pub fn open_times(&self) -> Vec<Instant> {
            self.opens.lock().clone()
        }

        pub fn open_count(&self) -> usize {
            self.opens.lock().len()
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn open(&self, _url: &str) -> Result<FrameReceiver, WsError> {
            self.opens.lock().push(Instant::now());
            self.script
                .lock()
                .pop_front()
                .unwrap_or_else(|| Err(WsError::ConnectionFailed("connection refused".into())))
        }
    }
}
