//! Conversion rate table

use super::{default_currencies, normalize_code};
use rust_decimal::Decimal;
use std::collections::HashMap;

/// Currency the upstream feed quotes everything in
pub const BASE_CURRENCY: &str = "USD";

/// Mapping from currency code to a multiplicative rate against [`BASE_CURRENCY`]
///
/// Lookups never fail: a code without a known rate converts at 1.
#[derive(Debug, Clone)]
pub struct ConversionTable {
    rates: HashMap<String, Decimal>,
}

impl Default for ConversionTable {
    fn default() -> Self {
        let rates = default_currencies()
            .into_iter()
            .map(|c| (c.code.to_string(), c.rate))
            .collect();
        Self { rates }
    }
}

impl ConversionTable {
    /// Create a table containing only the base currency
    pub fn empty() -> Self {
        let mut rates = HashMap::new();
        rates.insert(BASE_CURRENCY.to_string(), Decimal::ONE);
        Self { rates }
    }

    /// Add or replace a rate, returning the table for chaining
    pub fn with_rate(mut self, code: &str, rate: Decimal) -> Self {
        self.set_rate(code, rate);
        self
    }

    /// Add or replace a rate
    pub fn set_rate(&mut self, code: &str, rate: Decimal) {
        let code = normalize_code(code);
        if code == BASE_CURRENCY && rate != Decimal::ONE {
            tracing::warn!(%rate, "Ignoring non-unit rate for base currency");
            return;
        }
        self.rates.insert(code, rate);
    }

    /// Apply a batch of overrides (e.g., from configuration)
    pub fn extend<'a>(&mut self, overrides: impl IntoIterator<Item = (&'a String, &'a Decimal)>) {
        for (code, rate) in overrides {
            self.set_rate(code, *rate);
        }
    }

    /// Rate for the given code, identity when unknown
    pub fn rate(&self, code: &str) -> Decimal {
        self.rates
            .get(&normalize_code(code))
            .copied()
            .unwrap_or(Decimal::ONE)
    }

    /// Whether the table has an explicit rate for the code
    pub fn contains(&self, code: &str) -> bool {
        self.rates.contains_key(&normalize_code(code))
    }

    /// Convert a base-currency amount into `code`
    ///
    /// `None` when the converted amount does not fit in a `Decimal`.
    pub fn convert(&self, value: Decimal, code: &str) -> Option<Decimal> {
        value.checked_mul(self.rate(code))
    }
}
