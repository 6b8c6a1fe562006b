//! Ticker aggregation module
//!
//! Turns feed envelopes into per-symbol snapshots with bounded history,
//! converts prices into the display currency, and republishes an immutable
//! [`AggregateState`] after every change.

mod ticker;
mod types;

pub use ticker::{decode_ticker, DecodeError, TickerValues};
pub use types::{AggregateState, CurrencySnapshot};

use crate::currency::{normalize_code, ConversionTable, BASE_CURRENCY};
use crate::feed::FeedEnvelope;
use crate::history::{PriceHistory, PricePoint, DEFAULT_HISTORY_CAPACITY};
use crate::registry::{Symbol, SymbolRegistry, DEFAULT_QUOTE_ASSET};
use crate::telemetry::{self, DropReason};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::watch;

/// Aggregator settings
#[derive(Debug, Clone)]
pub struct AggregatorSettings {
    /// Quote asset tracked pairs must end with
    pub quote_asset: String,
    /// Samples retained per symbol
    pub history_capacity: usize,
    /// Display currency at startup
    pub display_currency: String,
}

impl Default for AggregatorSettings {
    fn default() -> Self {
        Self {
            quote_asset: DEFAULT_QUOTE_ASSET.to_string(),
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            display_currency: BASE_CURRENCY.to_string(),
        }
    }
}

/// Per-symbol working state; `base` keeps the last values as priced by the feed
struct SymbolEntry {
    base: TickerValues,
    history: PriceHistory,
}

/// Single-writer owner of the aggregate state
pub struct Aggregator {
    registry: Arc<SymbolRegistry>,
    rates: ConversionTable,
    settings: AggregatorSettings,
    currency: String,
    order: Vec<String>,
    entries: HashMap<String, SymbolEntry>,
    state_tx: watch::Sender<Arc<AggregateState>>,
}

impl Aggregator {
    pub fn new(
        registry: Arc<SymbolRegistry>,
        rates: ConversionTable,
        settings: AggregatorSettings,
    ) -> Self {
        let currency = normalize_code(&settings.display_currency);
        let order = resolve_order(&registry, &[]);
        let initial = AggregateState {
            currency: currency.clone(),
            order: order.clone(),
            snapshots: BTreeMap::new(),
        };
        let (state_tx, _) = watch::channel(Arc::new(initial));

        Self {
            registry,
            rates,
            settings,
            currency,
            order,
            entries: HashMap::new(),
            state_tx,
        }
    }

    /// Latest published state
    pub fn state(&self) -> Arc<AggregateState> {
        self.state_tx.borrow().clone()
    }

    /// Subscribe to published states
    pub fn subscribe(&self) -> watch::Receiver<Arc<AggregateState>> {
        self.state_tx.subscribe()
    }

    pub fn display_currency(&self) -> &str {
        &self.currency
    }

    /// Apply one feed envelope
    ///
    /// Returns whether the envelope was accepted. Anything that is not a
    /// tracked ticker is dropped without touching state or publishing.
    pub fn handle_message(&mut self, envelope: &FeedEnvelope) -> bool {
        let (code, values) =
            match decode_ticker(&envelope.payload, &self.registry, &self.settings.quote_asset) {
                Ok((symbol, values)) => (symbol.code.clone(), values),
                Err(e) => {
                    telemetry::record_dropped(DropReason::from(&e));
                    tracing::debug!(error = %e, "Ignoring feed message");
                    return false;
                }
            };

        let Some(price) = self.rates.convert(values.price, &self.currency) else {
            telemetry::record_dropped(DropReason::OutOfRange);
            tracing::warn!(
                symbol = %code,
                price = %values.price,
                currency = %self.currency,
                "Converted price out of range, dropping ticker"
            );
            return false;
        };
        let capacity = self.settings.history_capacity;
        let entry = self
            .entries
            .entry(code.clone())
            .or_insert_with(|| SymbolEntry {
                base: values,
                history: PriceHistory::with_capacity(capacity),
            });
        entry.base = values;
        entry
            .history
            .append(PricePoint::new(envelope.received_at.timestamp_millis(), price));

        telemetry::record_accepted(&code);
        tracing::trace!(symbol = %code, %price, currency = %self.currency, "Ticker applied");
        self.publish();
        true
    }

    /// Switch the display currency and re-derive every snapshot
    ///
    /// Unknown codes convert at rate 1. Recorded history keeps the prices
    /// it was captured with.
    pub fn set_display_currency(&mut self, code: &str) {
        let code = normalize_code(code);
        if !self.rates.contains(&code) {
            tracing::warn!(currency = %code, "No rate known for currency, using identity");
        }
        if code != self.currency {
            tracing::info!(from = %self.currency, to = %code, "Display currency changed");
        }
        self.currency = code;
        self.publish();
    }

    /// Replace the display order, returning the resolved full order
    pub fn set_display_order(&mut self, codes: &[String]) -> Vec<String> {
        self.order = resolve_order(&self.registry, codes);
        self.publish();
        self.order.clone()
    }

    fn publish(&self) {
        let snapshots = self
            .entries
            .iter()
            .filter_map(|(code, entry)| {
                let symbol = self.registry.get(code)?;
                Some((code.clone(), self.derive(symbol, entry)))
            })
            .collect();

        let state = AggregateState {
            currency: self.currency.clone(),
            order: self.order.clone(),
            snapshots,
        };
        self.state_tx.send_replace(Arc::new(state));
    }

    fn derive(&self, symbol: &Symbol, entry: &SymbolEntry) -> CurrencySnapshot {
        // Fields that overflow in the display currency keep their feed value
        let convert = |value: Decimal| self.rates.convert(value, &self.currency).unwrap_or(value);
        CurrencySnapshot {
            symbol: symbol.clone(),
            current_price: convert(entry.base.price),
            price_history: entry.history.to_vec(),
            change_24h: convert(entry.base.change),
            change_percent_24h: entry.base.change_percent,
            high_24h: convert(entry.base.high),
            low_24h: convert(entry.base.low),
            volume_24h: entry.base.volume,
        }
    }
}

/// Listed tracked codes first (deduplicated, unknown dropped), then the rest
/// in catalog order
pub fn resolve_order(registry: &SymbolRegistry, codes: &[String]) -> Vec<String> {
    let mut order: Vec<String> = Vec::with_capacity(registry.len());
    for code in codes {
        let code = code.to_uppercase();
        if registry.contains(&code) && !order.contains(&code) {
            order.push(code);
        }
    }
    for code in registry.codes() {
        if !order.iter().any(|c| c == code) {
            order.push(code.to_string());
        }
    }
    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn aggregator() -> Aggregator {
        Aggregator::new(
            Arc::new(SymbolRegistry::default()),
            ConversionTable::empty().with_rate("BRL", dec!(5.0)),
            AggregatorSettings::default(),
        )
    }

    fn envelope(pair: &str, price: &str, at_ms: i64) -> FeedEnvelope {
        FeedEnvelope {
            received_at: Utc.timestamp_millis_opt(at_ms).unwrap(),
            payload: json!({
                "e": "24hrTicker",
                "E": at_ms,
                "s": pair,
                "c": price,
                "p": "1219.51",
                "P": "2.5",
                "h": "51000",
                "l": "49000",
                "v": "1000"
            }),
        }
    }

    #[test]
    fn test_accepts_ticker_in_base_currency() {
        let mut agg = aggregator();
        assert!(agg.handle_message(&envelope("BTCUSDT", "50000.00", 1_000)));

        let state = agg.state();
        let btc = state.get("BTC").unwrap();
        assert_eq!(btc.current_price, dec!(50000.00));
        assert_eq!(btc.change_percent_24h, dec!(2.5));
        assert_eq!(btc.high_24h, dec!(51000));
        assert_eq!(btc.low_24h, dec!(49000));
        assert_eq!(btc.volume_24h, dec!(1000));
        assert_eq!(btc.price_history, vec![PricePoint::new(1_000, dec!(50000.00))]);
        assert_eq!(state.currency, "USD");
    }

    #[test]
    fn test_currency_switch_rederives_without_new_message() {
        let mut agg = aggregator();
        agg.handle_message(&envelope("BTCUSDT", "50000.00", 1_000));

        agg.set_display_currency("BRL");
        let state = agg.state();
        let btc = state.get("BTC").unwrap();
        assert_eq!(state.currency, "BRL");
        assert_eq!(btc.current_price, dec!(250000.00));
        assert_eq!(btc.change_24h, dec!(6097.55));
        assert_eq!(btc.high_24h, dec!(255000));
        assert_eq!(btc.low_24h, dec!(245000));
        // Volume and percent are not prices
        assert_eq!(btc.volume_24h, dec!(1000));
        assert_eq!(btc.change_percent_24h, dec!(2.5));
        // History keeps the price it was recorded with
        assert_eq!(btc.price_history[0].price, dec!(50000.00));
    }

    #[test]
    fn test_new_points_use_active_currency() {
        let mut agg = aggregator();
        agg.handle_message(&envelope("BTCUSDT", "50000.00", 1_000));
        agg.set_display_currency("brl");
        agg.handle_message(&envelope("BTCUSDT", "50100.00", 2_000));

        let state = agg.state();
        let prices: Vec<_> = state
            .get("BTC")
            .unwrap()
            .price_history
            .iter()
            .map(|p| p.price)
            .collect();
        assert_eq!(prices, vec![dec!(50000.00), dec!(250500.00)]);
    }

    #[test]
    fn test_currency_change_is_idempotent() {
        let mut agg = aggregator();
        agg.handle_message(&envelope("BTCUSDT", "50000.00", 1_000));
        agg.handle_message(&envelope("ETHUSDT", "3000.50", 1_001));

        agg.set_display_currency("BRL");
        let first = agg.state();
        agg.set_display_currency("BRL");
        let second = agg.state();
        assert_eq!(*first, *second);
    }

    #[test]
    fn test_unknown_currency_uses_identity() {
        let mut agg = aggregator();
        agg.handle_message(&envelope("BTCUSDT", "50000.00", 1_000));
        agg.set_display_currency("XYZ");

        let state = agg.state();
        assert_eq!(state.currency, "XYZ");
        assert_eq!(state.get("BTC").unwrap().current_price, dec!(50000.00));
    }

    #[test]
    fn test_unknown_symbol_leaves_state_identical() {
        let mut agg = aggregator();
        agg.handle_message(&envelope("BTCUSDT", "50000.00", 1_000));
        let before = serde_json::to_vec(&*agg.state()).unwrap();
        let rx = agg.subscribe();

        assert!(!agg.handle_message(&envelope("DOGEUSDT", "0.08", 2_000)));
        assert!(!agg.handle_message(&envelope("BTCBUSD", "50000.00", 2_001)));

        let after = serde_json::to_vec(&*agg.state()).unwrap();
        assert_eq!(before, after);
        assert!(!rx.has_changed().unwrap());
        assert!(agg.state().get("DOGE").is_none());
    }

    #[test]
    fn test_price_overflowing_on_conversion_is_dropped() {
        let mut agg = aggregator();
        agg.set_display_currency("BRL");
        let rx = agg.subscribe();

        let max = Decimal::MAX.to_string();
        assert!(!agg.handle_message(&envelope("BTCUSDT", &max, 1_000)));
        assert!(!rx.has_changed().unwrap());
        assert!(agg.state().get("BTC").is_none());

        assert!(agg.handle_message(&envelope("ETHUSDT", "3000.00", 1_001)));
        assert_eq!(agg.state().get("ETH").unwrap().current_price, dec!(15000.00));
    }

    #[test]
    fn test_currency_switch_keeps_feed_value_on_overflow() {
        let mut agg = aggregator();
        let max = Decimal::MAX.to_string();
        assert!(agg.handle_message(&envelope("BTCUSDT", &max, 1_000)));

        agg.set_display_currency("BRL");
        let state = agg.state();
        let btc = state.get("BTC").unwrap();
        assert_eq!(state.currency, "BRL");
        assert_eq!(btc.current_price, Decimal::MAX);
        assert_eq!(btc.high_24h, dec!(255000));
    }

    #[test]
    fn test_non_ticker_payloads_ignored() {
        let mut agg = aggregator();
        let envelope = FeedEnvelope {
            received_at: Utc::now(),
            payload: json!({"result": null, "id": 1}),
        };
        assert!(!agg.handle_message(&envelope));
        assert!(agg.state().snapshots.is_empty());
    }

    #[test]
    fn test_history_bounded_to_most_recent() {
        let mut agg = aggregator();
        for i in 0..120i64 {
            let price = Decimal::from(40_000 + i).to_string();
            agg.handle_message(&envelope("BTCUSDT", &price, i));
        }

        let state = agg.state();
        let history = &state.get("BTC").unwrap().price_history;
        assert_eq!(history.len(), DEFAULT_HISTORY_CAPACITY);
        let timestamps: Vec<i64> = history.iter().map(|p| p.timestamp_millis).collect();
        assert_eq!(timestamps, (70..120).collect::<Vec<i64>>());
        assert_eq!(state.get("BTC").unwrap().current_price, dec!(40119));
    }

    #[test]
    fn test_out_of_order_timestamps_accepted() {
        let mut agg = aggregator();
        agg.handle_message(&envelope("BTCUSDT", "1", 2_000));
        agg.handle_message(&envelope("BTCUSDT", "2", 1_000));

        let state = agg.state();
        let timestamps: Vec<i64> = state
            .get("BTC")
            .unwrap()
            .price_history
            .iter()
            .map(|p| p.timestamp_millis)
            .collect();
        assert_eq!(timestamps, vec![2_000, 1_000]);
    }

    #[test]
    fn test_published_state_is_not_mutated() {
        let mut agg = aggregator();
        agg.handle_message(&envelope("BTCUSDT", "50000.00", 1_000));
        let held = agg.state();
        agg.handle_message(&envelope("BTCUSDT", "51000.00", 2_000));

        assert_eq!(held.get("BTC").unwrap().current_price, dec!(50000.00));
        assert_eq!(held.get("BTC").unwrap().price_history.len(), 1);
        assert_eq!(agg.state().get("BTC").unwrap().price_history.len(), 2);
    }

    #[test]
    fn test_resolve_order_partial_list() {
        let registry = SymbolRegistry::default();
        let order = resolve_order(&registry, &["SOL".to_string(), "btc".to_string()]);
        assert_eq!(order, vec!["SOL", "BTC", "ETH", "BNB", "ADA", "XRP"]);
    }

    #[test]
    fn test_resolve_order_drops_unknown_and_duplicates() {
        let registry = SymbolRegistry::default();
        let codes: Vec<String> = ["XRP", "DOGE", "XRP", "ETH"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let order = resolve_order(&registry, &codes);
        assert_eq!(order, vec!["XRP", "ETH", "BTC", "BNB", "SOL", "ADA"]);
    }

    #[test]
    fn test_ordered_follows_display_order() {
        let mut agg = aggregator();
        agg.handle_message(&envelope("BTCUSDT", "50000.00", 1_000));
        agg.handle_message(&envelope("ETHUSDT", "3000.00", 1_001));
        agg.handle_message(&envelope("XRPUSDT", "0.60", 1_002));

        let state = agg.state();
        let codes: Vec<_> = state.ordered().map(|s| s.symbol.code.as_str()).collect();
        assert_eq!(codes, vec!["BTC", "ETH", "XRP"]);

        agg.set_display_order(&["XRP".to_string()]);
        let state = agg.state();
        let codes: Vec<_> = state.ordered().map(|s| s.symbol.code.as_str()).collect();
        assert_eq!(codes, vec!["XRP", "BTC", "ETH"]);
        assert_eq!(state.snapshots.len(), 3);
    }
}
