use rust_decimal::{Decimal, RoundingStrategy};

/// Fraction digits used for every rendered amount.
pub const DISPLAY_DECIMALS: u32 = 2;

pub fn currency_symbol(currency: &str) -> Option<&'static str> {
    match currency.to_ascii_uppercase().as_str() {
        "USD" | "CAD" | "AUD" => Some("$"),
        "EUR" => Some("€"),
        "GBP" => Some("£"),
        "JPY" => Some("¥"),
        _ => None,
    }
}

fn round(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(DISPLAY_DECIMALS, RoundingStrategy::MidpointAwayFromZero)
}

fn group_int_digits(int_part: &str) -> String {
    let mut out = String::with_capacity(int_part.len() + int_part.len() / 3);
    let len = int_part.len();
    for (i, ch) in int_part.chars().enumerate() {
        out.push(ch);
        let remaining = len.saturating_sub(i + 1);
        if remaining > 0 && remaining % 3 == 0 {
            out.push(',');
        }
    }
    out
}

/// Non-negative `value` as `1234.50`, or `1,234.50` when grouped.
fn digits(value: Decimal, grouping: bool) -> String {
    let fixed = format!("{:.*}", DISPLAY_DECIMALS as usize, value);
    if !grouping {
        return fixed;
    }
    match fixed.split_once('.') {
        Some((int_part, frac)) => format!("{}.{frac}", group_int_digits(int_part)),
        None => group_int_digits(&fixed),
    }
}

fn render(value: Decimal, currency: &str, sign: Option<char>) -> String {
    let body = digits(value, true);
    let mut out = String::new();
    if let Some(sign) = sign {
        out.push(sign);
    }
    match currency_symbol(currency) {
        Some(symbol) => {
            out.push_str(symbol);
            out.push_str(&body);
        }
        None => {
            out.push_str(&body);
            out.push(' ');
            out.push_str(currency);
        }
    }
    out
}

/// Plain two-decimal rendering, e.g. `1234.56` or `-50.00`.
pub fn format_plain(value: Decimal) -> String {
    let rounded = round(value);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let body = digits(rounded.abs(), false);
    if negative {
        format!("-{body}")
    } else {
        body
    }
}

/// `$1,234.56`, or `1,234.56 CHF` when the currency has no known symbol.
pub fn format_amount(value: Decimal, currency: &str) -> String {
    let rounded = round(value);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    render(rounded.abs(), currency, negative.then_some('-'))
}

/// Like [`format_amount`] but always signed: `+$200.00`, `-$50.00`.
pub fn format_change(value: Decimal, currency: &str) -> String {
    let rounded = round(value);
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        '-'
    } else {
        '+'
    };
    render(rounded.abs(), currency, Some(sign))
}
