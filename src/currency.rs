//! Currency formatting for goal and current amounts.
//!
//! Amounts are always shown as whole numbers with en-US digit grouping.
//! Standard currencies get their symbol from [`CURRENCIES`]; the
//! [`CUSTOM_CURRENCY`] sentinel uses a user supplied symbol instead.
//!
//! # Example
//!
//! ```
//! use hellscore_renderer::{format_currency, SymbolPosition};
//!
//! assert_eq!(format_currency(1000.0, "USD", None, None), "$1,000");
//! assert_eq!(
//!     format_currency(1000.0, "CUSTOM", Some("🔥"), Some(SymbolPosition::After)),
//!     "1,000🔥"
//! );
//! assert_eq!(format_currency(1000.0, "ZZZ", None, None), "ZZZ 1,000");
//! ```

use crate::design::SymbolPosition;

/// Currency code selecting a user supplied symbol.
pub const CUSTOM_CURRENCY: &str = "CUSTOM";

/// Symbol used when a custom currency has an empty symbol.
pub const DEFAULT_CUSTOM_SYMBOL: &str = "$";

// ============================================================================
// Currency table
// ============================================================================

/// One entry of the currency picker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrencyInfo {
    /// ISO 4217 code, or [`CUSTOM_CURRENCY`].
    pub code: &'static str,
    /// Human readable name.
    pub name: &'static str,
    /// Symbol as rendered in en-US (empty for the custom entry).
    pub symbol: &'static str,
}

const fn entry(code: &'static str, name: &'static str, symbol: &'static str) -> CurrencyInfo {
    CurrencyInfo { code, name, symbol }
}

/// Currencies offered by the currency control, in display order.
pub const CURRENCIES: &[CurrencyInfo] = &[
    entry("ILS", "Israeli New Shekel", "₪"),
    entry("USD", "United States Dollar", "$"),
    entry("EUR", "Euro", "€"),
    entry("JPY", "Japanese Yen", "¥"),
    entry("GBP", "British Pound Sterling", "£"),
    entry("AUD", "Australian Dollar", "A$"),
    entry("CAD", "Canadian Dollar", "CA$"),
    entry("CHF", "Swiss Franc", "CHF"),
    entry("CNY", "Chinese Yuan", "CN¥"),
    entry("SEK", "Swedish Krona", "SEK"),
    entry("NZD", "New Zealand Dollar", "NZ$"),
    entry("MXN", "Mexican Peso", "MX$"),
    entry("SGD", "Singapore Dollar", "SGD"),
    entry("HKD", "Hong Kong Dollar", "HK$"),
    entry("NOK", "Norwegian Krone", "NOK"),
    entry("KRW", "South Korean Won", "₩"),
    entry("TRY", "Turkish Lira", "TRY"),
    entry("RUB", "Russian Ruble", "RUB"),
    entry("INR", "Indian Rupee", "₹"),
    entry("BRL", "Brazilian Real", "R$"),
    entry("ZAR", "South African Rand", "ZAR"),
    entry(CUSTOM_CURRENCY, "Custom Currency", ""),
];

/// Looks up the display symbol for a standard currency code.
///
/// Matching is case-insensitive. Returns `None` for unknown codes and for
/// the custom sentinel.
pub fn currency_symbol(code: &str) -> Option<&'static str> {
    CURRENCIES
        .iter()
        .filter(|c| c.code != CUSTOM_CURRENCY)
        .find(|c| c.code.eq_ignore_ascii_case(code))
        .map(|c| c.symbol)
}

/// Returns true if `code` selects the custom symbol mode.
pub fn is_custom(code: &str) -> bool {
    code == CUSTOM_CURRENCY
}

// ============================================================================
// Formatting
// ============================================================================

/// Formats an amount for display.
///
/// See the module docs for the rules. This function never panics and has no
/// side effects, so it is safe to call on every render.
pub fn format_currency(
    amount: f64,
    currency: &str,
    custom_symbol: Option<&str>,
    position: Option<SymbolPosition>,
) -> String {
    if is_custom(currency) {
        let symbol = custom_symbol
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_CUSTOM_SYMBOL);
        let value = group_integer(amount);
        return match position {
            Some(SymbolPosition::Before) => format!("{symbol}{value}"),
            _ => format!("{value}{symbol}"),
        };
    }

    match currency_symbol(currency) {
        Some(symbol) => format_with_symbol(amount, symbol),
        None => format!("{} {}", currency, group_integer(amount)),
    }
}

/// Places a standard currency symbol the way en-US does: sign first,
/// alphabetic symbols separated from the digits by a space.
fn format_with_symbol(amount: f64, symbol: &str) -> String {
    let grouped = group_integer(amount.abs());
    let sign = if amount.is_sign_negative() && !amount.is_nan() {
        "-"
    } else {
        ""
    };
    let separator = if symbol.chars().all(|c| c.is_ascii_alphabetic()) {
        " "
    } else {
        ""
    };
    format!("{sign}{symbol}{separator}{grouped}")
}

/// Rounds to a whole number (half away from zero) and inserts `,` every
/// three digits.
///
/// The sign follows the input, so `-0.2` groups as `-0`.
pub fn group_integer(amount: f64) -> String {
    if amount.is_nan() {
        return "NaN".to_string();
    }
    if amount.is_infinite() {
        return if amount > 0.0 { "∞" } else { "-∞" }.to_string();
    }

    let rounded = amount.round();
    let negative = rounded.is_sign_negative();
    let digits = format!("{:.0}", rounded.abs());

    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if negative {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

// ============================================================================
// Tests
// ============================================================================
