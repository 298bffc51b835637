use db::types::Money;

const CURRENCY_SUFFIX: &str = "сум";

/// Groups thousands with spaces: 1 250 000 units render as `1 250 000 сум`.
/// Hundredths are shown only when present.
pub fn format_money(amount: Option<Money>) -> String {
    let amount = amount.unwrap_or_default();
    let digits = amount.whole_units().to_string();

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 4);
    if amount.minor() < 0 {
        grouped.push('-');
    }
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            grouped.push(' ');
        }
        grouped.push(ch);
    }
    if amount.hundredths() > 0 {
        grouped.push_str(&format!(".{:02}", amount.hundredths()));
    }

    format!("{grouped} {CURRENCY_SUFFIX}")
}

/// Drops locale thousand separators (any whitespace, commas) from a money string.
pub fn strip_separators(input: &str) -> String {
    input
        .chars()
        .filter(|ch| !ch.is_whitespace() && *ch != ',')
        .collect()
}
