//! Feed connection with fixed-delay reconnection
//!
//! State machine:
//!
//! ```text
//! Disconnected --connect()--> Connecting --handshake--> Connected
//!      ^                          ^                         |
//!      |                          |                  fault / close
//!      |                    delay elapsed                   v
//!      +---- attempts exhausted --+---- ReconnectScheduled <+
//! ```
//!
//! `disconnect()` moves to Disconnected from any state and cancels both the
//! live session and any pending retry.

use super::binance::{build_stream_url, parse_frame};
use super::types::{ConnectionState, ConnectionStatus, FeedEnvelope, FeedSettings};
use crate::registry::SymbolRegistry;
use crate::telemetry;
use crate::ws::{FrameReceiver, Transport, WsError};
use chrono::Utc;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;

/// Handle to the single upstream ticker connection
///
/// Cloning yields another handle to the same connection. All methods must be
/// called from within a tokio runtime.
#[derive(Clone)]
pub struct FeedConnection {
    shared: Arc<Shared>,
}

struct Shared {
    url: String,
    settings: FeedSettings,
    transport: Arc<dyn Transport>,
    control: Mutex<Control>,
    status_tx: watch::Sender<ConnectionStatus>,
    envelope_tx: mpsc::Sender<FeedEnvelope>,
}

#[derive(Default)]
struct Control {
    status: ConnectionStatus,
    intentional_close: bool,
    /// Bumped on every explicit connect/disconnect so stale drivers stand down
    generation: u64,
    cancel: Option<CancellationToken>,
}

/// How a live session ended
enum SessionEnd {
    Cancelled,
    /// Envelope receiver is gone; nothing left to feed
    Detached,
    Fault(String),
}

enum Retry {
    Scheduled(Duration),
    Exhausted,
    Stale,
}

impl FeedConnection {
    /// Create a disconnected feed subscribing to every symbol in `registry`
    pub fn new(
        settings: FeedSettings,
        registry: &SymbolRegistry,
        transport: Arc<dyn Transport>,
        envelope_tx: mpsc::Sender<FeedEnvelope>,
    ) -> Self {
        let url = build_stream_url(&settings.endpoint, registry, &settings.quote_asset);
        let (status_tx, _) = watch::channel(ConnectionStatus::default());

        Self {
            shared: Arc::new(Shared {
                url,
                settings,
                transport,
                control: Mutex::new(Control::default()),
                status_tx,
                envelope_tx,
            }),
        }
    }

    /// Combined stream URL
    pub fn url(&self) -> &str {
        &self.shared.url
    }

    pub fn status(&self) -> ConnectionStatus {
        *self.shared.status_tx.borrow()
    }

    /// Subscribe to connection status changes
    pub fn subscribe_status(&self) -> watch::Receiver<ConnectionStatus> {
        self.shared.status_tx.subscribe()
    }

    /// Open the connection
    ///
    /// No-op while Connecting or Connected. From Disconnected or
    /// ReconnectScheduled this resets the attempt counter and connects now,
    /// cancelling any pending retry.
    pub fn connect(&self) {
        let mut control = self.shared.control.lock();

        match control.status.state {
            ConnectionState::Connecting | ConnectionState::Connected => {
                tracing::debug!(state = ?control.status.state, "Connect ignored, already active");
                return;
            }
            ConnectionState::ReconnectScheduled | ConnectionState::Disconnected => {}
        }

        if let Some(pending) = control.cancel.take() {
            pending.cancel();
        }

        let token = CancellationToken::new();
        control.intentional_close = false;
        control.generation += 1;
        control.cancel = Some(token.clone());
        let generation = control.generation;
        self.shared
            .transition(&mut control, ConnectionState::Connecting, 0);
        drop(control);

        tracing::info!(url = %self.shared.url, "Connecting to ticker feed");
        tokio::spawn(Shared::drive(self.shared.clone(), generation, token));
    }

    /// Close the connection without scheduling a reconnect
    ///
    /// Takes effect on the state machine immediately; the transport close
    /// completes in the background.
    pub fn disconnect(&self) {
        let mut control = self.shared.control.lock();
        control.intentional_close = true;
        control.generation += 1;
        if let Some(token) = control.cancel.take() {
            token.cancel();
        }
        let attempts = control.status.attempts;
        self.shared
            .transition(&mut control, ConnectionState::Disconnected, attempts);
        tracing::info!("Ticker feed disconnected");
    }
}

impl Shared {
    /// Publish a new status; caller holds the control lock so observers see
    /// transitions in order
    fn transition(&self, control: &mut Control, state: ConnectionState, attempts: u32) {
        let status = ConnectionStatus { state, attempts };
        if control.status == status {
            return;
        }
        control.status = status;
        self.status_tx.send_replace(status);
    }

    fn is_current(&self, control: &Control, generation: u64) -> bool {
        control.generation == generation && !control.intentional_close
    }

    /// Connect/retry loop for one explicit `connect()` call
    async fn drive(self: Arc<Self>, generation: u64, token: CancellationToken) {
        loop {
            let opened = tokio::select! {
                biased;
                _ = token.cancelled() => return,
                result = self.transport.open(&self.url) => result,
            };

            let end = match opened {
                Ok(frames) => {
                    if !self.mark_connected(generation) {
                        return;
                    }
                    self.run_session(frames, &token).await
                }
                Err(e) => SessionEnd::Fault(e.to_string()),
            };

            let reason = match end {
                SessionEnd::Cancelled => return,
                SessionEnd::Detached => {
                    self.detach(generation);
                    return;
                }
                SessionEnd::Fault(reason) => reason,
            };

            match self.schedule_retry(generation, &reason) {
                Retry::Scheduled(delay) => {
                    tokio::select! {
                        biased;
                        _ = token.cancelled() => return,
                        _ = tokio::time::sleep(delay) => {}
                    }
                    if !self.begin_retry(generation) {
                        return;
                    }
                }
                Retry::Exhausted | Retry::Stale => return,
            }
        }
    }

    fn mark_connected(&self, generation: u64) -> bool {
        let mut control = self.control.lock();
        if !self.is_current(&control, generation) {
            return false;
        }
        self.transition(&mut control, ConnectionState::Connected, 0);
        tracing::info!("Ticker feed connected");
        true
    }

    fn schedule_retry(&self, generation: u64, reason: &str) -> Retry {
        let mut control = self.control.lock();
        if !self.is_current(&control, generation) {
            return Retry::Stale;
        }

        let attempts = control.status.attempts;
        let max = self.settings.max_reconnect_attempts;
        if attempts < max {
            let attempt = attempts + 1;
            self.transition(&mut control, ConnectionState::ReconnectScheduled, attempt);
            telemetry::record_reconnect();
            tracing::warn!(
                error = %reason,
                attempt,
                max,
                delay_ms = self.settings.reconnect_delay.as_millis() as u64,
                "Ticker feed lost, reconnecting"
            );
            Retry::Scheduled(self.settings.reconnect_delay)
        } else {
            control.cancel = None;
            self.transition(&mut control, ConnectionState::Disconnected, attempts);
            tracing::error!(
                error = %reason,
                attempts,
                "Max reconnection attempts reached, staying offline until reconnect is requested"
            );
            Retry::Exhausted
        }
    }

    fn detach(&self, generation: u64) {
        let mut control = self.control.lock();
        if !self.is_current(&control, generation) {
            return;
        }
        control.cancel = None;
        let attempts = control.status.attempts;
        self.transition(&mut control, ConnectionState::Disconnected, attempts);
        tracing::error!("Envelope receiver dropped, ticker feed stopped");
    }

    fn begin_retry(&self, generation: u64) -> bool {
        let mut control = self.control.lock();
        if !self.is_current(&control, generation) {
            return false;
        }
        let attempts = control.status.attempts;
        self.transition(&mut control, ConnectionState::Connecting, attempts);
        true
    }

    /// Forward frames until the session faults or is cancelled
    async fn run_session(&self, mut frames: FrameReceiver, token: &CancellationToken) -> SessionEnd {
        loop {
            let next = tokio::select! {
                biased;
                _ = token.cancelled() => return SessionEnd::Cancelled,
                next = Self::next_frame(&mut frames, self.settings.idle_timeout) => next,
            };

            let text = match next {
                Ok(Some(text)) => text,
                Ok(None) => return SessionEnd::Fault("Connection closed by peer".into()),
                Err(e) => return SessionEnd::Fault(e.to_string()),
            };

            telemetry::record_frame();
            match parse_frame(&text, Utc::now()) {
                Ok(envelope) => {
                    let sent = tokio::select! {
                        biased;
                        _ = token.cancelled() => return SessionEnd::Cancelled,
                        sent = self.envelope_tx.send(envelope) => sent,
                    };
                    if sent.is_err() {
                        return SessionEnd::Detached;
                    }
                }
                Err(e) => {
                    telemetry::record_dropped(telemetry::DropReason::Malformed);
                    tracing::warn!(error = %e, "Dropping unparseable frame");
                }
            }
        }
    }

    async fn next_frame(
        frames: &mut FrameReceiver,
        idle_timeout: Option<Duration>,
    ) -> Result<Option<String>, WsError> {
        let next = match idle_timeout {
            Some(limit) => tokio::time::timeout(limit, frames.recv())
                .await
                .map_err(|_| WsError::IdleTimeout(limit))?,
            None => frames.recv().await,
        };
        next.transpose()
    }
}
