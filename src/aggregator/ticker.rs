//! 24h ticker decoding

use crate::feed::TICKER_EVENT;
use crate::registry::{Symbol, SymbolRegistry};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::str::FromStr;
use thiserror::Error;

/// Binance 24hr rolling window ticker payload
#[derive(Debug, Deserialize)]
struct TickerMessage {
    /// Symbol pair, e.g. "BTCUSDT"
    #[serde(rename = "s")]
    symbol: String,
    /// Last price
    #[serde(rename = "c")]
    last_price: String,
    /// Absolute price change
    #[serde(rename = "p")]
    price_change: String,
    /// Price change percent
    #[serde(rename = "P")]
    price_change_percent: String,
    /// High price
    #[serde(rename = "h")]
    high: String,
    /// Low price
    #[serde(rename = "l")]
    low: String,
    /// Total traded base asset volume
    #[serde(rename = "v")]
    volume: String,
}

/// Why an inbound message was not applied
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("not a ticker event: {0:?}")]
    NotTicker(Option<String>),

    #[error("malformed ticker: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("pair {0} is not quoted in the tracked quote asset")]
    QuoteMismatch(String),

    #[error("untracked symbol {0}")]
    UnknownSymbol(String),

    #[error("invalid decimal in field {field}: {value:?}")]
    InvalidNumber { field: &'static str, value: String },
}

/// Ticker values as priced by the feed (base currency)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickerValues {
    pub price: Decimal,
    pub change: Decimal,
    pub change_percent: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub volume: Decimal,
}

/// Decode and validate a ticker payload against the registry
pub fn decode_ticker<'r>(
    payload: &serde_json::Value,
    registry: &'r SymbolRegistry,
    quote: &str,
) -> Result<(&'r Symbol, TickerValues), DecodeError> {
    let event = payload.get("e").and_then(|e| e.as_str());
    if event != Some(TICKER_EVENT) {
        return Err(DecodeError::NotTicker(event.map(str::to_string)));
    }

    let msg = TickerMessage::deserialize(payload)?;

    if !msg.symbol.ends_with(quote) {
        return Err(DecodeError::QuoteMismatch(msg.symbol));
    }
    let symbol = registry
        .strip_quote(&msg.symbol, quote)
        .ok_or_else(|| DecodeError::UnknownSymbol(msg.symbol.clone()))?;

    let values = TickerValues {
        price: parse_decimal("c", &msg.last_price)?,
        change: parse_decimal("p", &msg.price_change)?,
        change_percent: parse_decimal("P", &msg.price_change_percent)?,
        high: parse_decimal("h", &msg.high)?,
        low: parse_decimal("l", &msg.low)?,
        volume: parse_decimal("v", &msg.volume)?,
    };

    Ok((symbol, values))
}

fn parse_decimal(field: &'static str, value: &str) -> Result<Decimal, DecodeError> {
    Decimal::from_str(value).map_err(|_| DecodeError::InvalidNumber {
        field,
        value: value.to_string(),
    })
}
