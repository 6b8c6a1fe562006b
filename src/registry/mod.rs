//! Tracked symbol catalog
//!
//! Fixed list of base assets streamed from the feed, with the display
//! metadata the presentation layer renders next to each card.

use serde::{Deserialize, Serialize};

/// Quote asset every tracked symbol is paired against on the feed
pub const DEFAULT_QUOTE_ASSET: &str = "USDT";

/// Immutable catalog entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Symbol {
    /// Base asset code (e.g., "BTC")
    pub code: String,
    /// Display name (e.g., "Bitcoin")
    pub display_name: String,
    /// Brand color as a hex string
    pub color: String,
    /// Single-character glyph
    pub glyph: String,
}

impl Symbol {
    pub fn new(
        code: impl Into<String>,
        display_name: impl Into<String>,
        color: impl Into<String>,
        glyph: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into().to_uppercase(),
            display_name: display_name.into(),
            color: color.into(),
            glyph: glyph.into(),
        }
    }

    /// Stream identifier for this symbol's 24h ticker, e.g. `btcusdt@ticker`
    pub fn stream_id(&self, quote: &str) -> String {
        format!(
            "{}{}@ticker",
            self.code.to_lowercase(),
            quote.to_lowercase()
        )
    }
}

/// Catalog of tracked symbols in catalog order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolRegistry {
    symbols: Vec<Symbol>,
}

impl Default for SymbolRegistry {
    fn default() -> Self {
        Self::new(vec![
            Symbol::new("BTC", "Bitcoin", "#F7931A", "₿"),
            Symbol::new("ETH", "Ethereum", "#627EEA", "Ξ"),
            Symbol::new("BNB", "Binance Coin", "#F3BA2F", "B"),
            Symbol::new("SOL", "Solana", "#14F195", "◎"),
            Symbol::new("ADA", "Cardano", "#0033AD", "₳"),
            Symbol::new("XRP", "Ripple", "#23292F", "✕"),
        ])
    }
}

impl SymbolRegistry {
    /// Build a registry, keeping the first entry for any duplicated code
    pub fn new(symbols: Vec<Symbol>) -> Self {
        let mut unique: Vec<Symbol> = Vec::with_capacity(symbols.len());
        for mut symbol in symbols {
            symbol.code = symbol.code.to_uppercase();
            if unique.iter().any(|s| s.code == symbol.code) {
                tracing::warn!(code = %symbol.code, "Duplicate symbol in catalog, ignoring");
                continue;
            }
            unique.push(symbol);
        }
        Self { symbols: unique }
    }

    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Look up a symbol by code
    pub fn get(&self, code: &str) -> Option<&Symbol> {
        self.symbols.iter().find(|s| s.code == code)
    }

    pub fn contains(&self, code: &str) -> bool {
        self.get(code).is_some()
    }

    /// Codes in catalog order
    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.symbols.iter().map(|s| s.code.as_str())
    }

    /// Stream identifiers for every tracked symbol, in catalog order
    pub fn stream_ids(&self, quote: &str) -> Vec<String> {
        self.symbols.iter().map(|s| s.stream_id(quote)).collect()
    }

    /// Recover the tracked symbol from a trading pair like `BTCUSDT`
    ///
    /// Returns `None` when the pair is not quoted in `quote` or its base
    /// asset is not in the catalog.
    pub fn strip_quote(&self, pair: &str, quote: &str) -> Option<&Symbol> {
        let base = pair.strip_suffix(quote)?;
        if base.is_empty() {
            return None;
        }
        self.get(base)
    }
}
