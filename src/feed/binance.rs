//! Binance combined ticker stream

use super::FeedEnvelope;
use crate::registry::SymbolRegistry;
use chrono::{DateTime, Utc};

/// Binance WebSocket base URL
pub const BINANCE_WS_URL: &str = "wss://stream.binance.com:9443/ws";

/// Event type marker of 24h rolling window ticker messages
pub const TICKER_EVENT: &str = "24hrTicker";

/// Build the single stream URL subscribing to every tracked symbol
///
/// e.g. `wss://stream.binance.com:9443/ws/btcusdt@ticker/ethusdt@ticker`
pub fn build_stream_url(endpoint: &str, registry: &SymbolRegistry, quote: &str) -> String {
    let streams = registry.stream_ids(quote).join("/");
    format!("{}/{}", endpoint.trim_end_matches('/'), streams)
}

/// Parse a raw text frame into a generic envelope
pub fn parse_frame(text: &str, received_at: DateTime<Utc>) -> serde_json::Result<FeedEnvelope> {
    let payload = serde_json::from_str(text)?;
    Ok(FeedEnvelope {
        received_at,
        payload,
    })
}
