//! Currency formatting for estimates.

/// Format a price as dollars with thousands separators and two decimals.
///
/// `450000.5` becomes `$450,000.50`. Negative amounts keep their sign after
/// the currency symbol (`$-12.00`).
pub fn format_price(price: f64) -> String {
    let fixed = format!("{:.2}", price.abs());
    let (whole, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if price.is_sign_negative() { "-" } else { "" };

    format!("${sign}{grouped}.{cents}")
}
