//! Rupee amounts stored as integer paise.

/// Symbol prefixed to every displayed amount.
pub const CURRENCY_SYMBOL: &str = "₹";

/// Format an amount in paise for display, e.g. `18000` -> `₹180.00`.
pub fn format_price(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let absolute = cents.unsigned_abs();
    format!(
        "{sign}{CURRENCY_SYMBOL}{}.{:02}",
        absolute / 100,
        absolute % 100
    )
}

/// Plain decimal used to pre-fill price inputs, e.g. `18050` -> `180.50`.
pub fn format_price_input(cents: i64) -> String {
    format_price(cents).replacen(CURRENCY_SYMBOL, "", 1)
}

/// Parse a decimal string such as `180`, `180.5` or `180.50` into paise.
///
/// Returns `None` for anything that is not a plain non-negative decimal with at
/// most two fractional digits.
pub fn parse_price(input: &str) -> Option<i64> {
    let trimmed = input.trim().trim_start_matches(CURRENCY_SYMBOL).trim();
    if trimmed.is_empty() {
        return None;
    }

    let (whole, fraction) = match trimmed.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (trimmed, ""),
    };

    if whole.is_empty() && fraction.is_empty() {
        return None;
    }
    if !whole.chars().all(|ch| ch.is_ascii_digit())
        || !fraction.chars().all(|ch| ch.is_ascii_digit())
        || fraction.len() > 2
    {
        return None;
    }

    let whole_value: i64 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
    let fraction_value: i64 = match fraction.len() {
        0 => 0,
        1 => fraction.parse::<i64>().ok()? * 10,
        _ => fraction.parse().ok()?,
    };

    whole_value.checked_mul(100)?.checked_add(fraction_value)
}
