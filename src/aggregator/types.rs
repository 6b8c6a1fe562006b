//! Aggregate state types

use crate::history::PricePoint;
use crate::registry::Symbol;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

/// Current state of one symbol in the active display currency
///
/// `volume_24h` stays in base-asset units; `change_percent_24h` is unitless.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurrencySnapshot {
    pub symbol: Symbol,
    pub current_price: Decimal,
    pub price_history: Vec<PricePoint>,
    pub change_24h: Decimal,
    pub change_percent_24h: Decimal,
    pub high_24h: Decimal,
    pub low_24h: Decimal,
    pub volume_24h: Decimal,
}

/// Immutable published view of everything the aggregator knows
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateState {
    /// Active display currency code
    pub currency: String,
    /// Full display order over the catalog
    pub order: Vec<String>,
    /// One entry per symbol observed at least once
    pub snapshots: BTreeMap<String, CurrencySnapshot>,
}

impl AggregateState {
    pub fn get(&self, code: &str) -> Option<&CurrencySnapshot> {
        self.snapshots.get(code)
    }

    /// Snapshots in display order, skipping symbols with no data yet
    pub fn ordered(&self) -> impl Iterator<Item = &CurrencySnapshot> {
        self.order.iter().filter_map(|code| self.snapshots.get(code))
    }
}
