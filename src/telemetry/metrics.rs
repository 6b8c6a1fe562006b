//! Prometheus metrics

use crate::aggregator::DecodeError;
use metrics::counter;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Why an inbound frame or message was discarded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// Frame was not valid JSON
    Malformed,
    /// Valid JSON but not a ticker event
    NotTicker,
    /// Ticker for a pair outside the tracked set
    Untracked,
    /// Ticker with missing or non-numeric fields
    InvalidTicker,
    /// Ticker whose price overflows in the display currency
    OutOfRange,
}

impl DropReason {
    fn label(self) -> &'static str {
        match self {
            DropReason::Malformed => "malformed",
            DropReason::NotTicker => "not_ticker",
            DropReason::Untracked => "untracked",
            DropReason::InvalidTicker => "invalid_ticker",
            DropReason::OutOfRange => "out_of_range",
        }
    }
}

impl From<&DecodeError> for DropReason {
    fn from(err: &DecodeError) -> Self {
        match err {
            DecodeError::NotTicker(_) => DropReason::NotTicker,
            DecodeError::QuoteMismatch(_) | DecodeError::UnknownSymbol(_) => DropReason::Untracked,
            DecodeError::Malformed(_) | DecodeError::InvalidNumber { .. } => {
                DropReason::InvalidTicker
            }
        }
    }
}

/// Count a raw frame received from the transport
pub fn record_frame() {
    counter!("tickerdash_frames_total").increment(1);
}

/// Count a discarded frame or message
pub fn record_dropped(reason: DropReason) {
    counter!("tickerdash_frames_dropped_total", "reason" => reason.label()).increment(1);
}

/// Count a ticker applied to the aggregate state
pub fn record_accepted(symbol: &str) {
    counter!("tickerdash_tickers_accepted_total", "symbol" => symbol.to_string()).increment(1);
}

/// Count a scheduled reconnect
pub fn record_reconnect() {
    counter!("tickerdash_reconnects_total").increment(1);
}

/// Serve metrics on `0.0.0.0:port`; must be called inside a tokio runtime
pub fn install_exporter(port: u16) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| anyhow::anyhow!("Failed to start metrics exporter: {}", e))?;
    tracing::info!(%addr, "Prometheus exporter listening");
    Ok(())
}
