//! Integration tests for the feed module

use ticker_dash::feed::{build_stream_url, parse_frame, BINANCE_WS_URL};
use ticker_dash::registry::SymbolRegistry;

#[test]
fn test_default_stream_url() {
    let url = build_stream_url(BINANCE_WS_URL, &SymbolRegistry::default(), "USDT");
    assert_eq!(
        url,
        "wss://stream.binance.com:9443/ws/btcusdt@ticker/ethusdt@ticker/bnbusdt@ticker/solusdt@ticker/adausdt@ticker/xrpusdt@ticker"
    );
}

#[test]
fn test_parse_frame_keeps_payload() {
    let envelope = parse_frame(r#"{"e":"24hrTicker","s":"ETHUSDT","c":"3000.10"}"#, chrono::Utc::now())
        .unwrap();
    assert_eq!(envelope.payload["c"], "3000.10");
}
