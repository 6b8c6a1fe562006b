//! Market data feed module
//!
//! Maintains the single multiplexed Binance ticker stream for every tracked
//! symbol and forwards decoded envelopes to the aggregator.

mod binance;
mod connection;
mod types;

pub use binance::{build_stream_url, parse_frame, BINANCE_WS_URL, TICKER_EVENT};
pub use connection::FeedConnection;
pub use types::{ConnectionState, ConnectionStatus, FeedEnvelope, FeedSettings};
