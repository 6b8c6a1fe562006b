//! Fiat conversion module
//!
//! Display currencies and the multiplicative rate table against the feed's
//! base currency

mod table;

pub use table::{ConversionTable, BASE_CURRENCY};

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;

/// A display currency the presentation layer can offer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FiatCurrency {
    /// ISO 4217 code (e.g., "BRL")
    pub code: &'static str,
    /// Human readable name
    pub name: &'static str,
    /// Flag emoji shown next to the selector
    pub flag: &'static str,
    /// Currency sign used when formatting prices
    pub sign: &'static str,
    /// Units of this currency per one unit of the base currency
    pub rate: Decimal,
}

/// Built-in point-in-time rates against USD
pub fn default_currencies() -> Vec<FiatCurrency> {
    vec![
        fiat("USD", "US Dollar", "🇺🇸", "$", dec!(1)),
        fiat("BRL", "Brazilian Real", "🇧🇷", "R$", dec!(5.0)),
        fiat("EUR", "Euro", "🇪🇺", "€", dec!(0.92)),
        fiat("GBP", "British Pound", "🇬🇧", "£", dec!(0.79)),
        fiat("JPY", "Japanese Yen", "🇯🇵", "¥", dec!(150)),
        fiat("CAD", "Canadian Dollar", "🇨🇦", "C$", dec!(1.36)),
        fiat("AUD", "Australian Dollar", "🇦🇺", "A$", dec!(1.52)),
        fiat("CHF", "Swiss Franc", "🇨🇭", "CHF", dec!(0.88)),
        fiat("CNY", "Chinese Yuan", "🇨🇳", "¥", dec!(7.24)),
        fiat("INR", "Indian Rupee", "🇮🇳", "₹", dec!(83)),
    ]
}

fn fiat(
    code: &'static str,
    name: &'static str,
    flag: &'static str,
    sign: &'static str,
    rate: Decimal,
) -> FiatCurrency {
    FiatCurrency {
        code,
        name,
        flag,
        sign,
        rate,
    }
}

/// Normalize a user-supplied currency code
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}
