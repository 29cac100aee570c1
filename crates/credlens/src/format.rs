use rust_decimal::Decimal;

/// Renders whole rupees with Indian digit grouping, e.g. `₹ 1,50,000`.
///
/// Fractions are truncated. Negative amounts keep their sign after the symbol.
pub fn format_inr(amount: Decimal) -> String {
    let whole = amount.trunc();
    let sign = if whole < Decimal::ZERO { "-" } else { "" };
    let digits = whole.abs().to_string();

    format!("₹ {sign}{}", group_indian(&digits))
}

/// Renders a percentage rate such as `2.5%`.
pub fn format_rate(rate: Decimal) -> String {
    format!("{}%", rate.normalize())
}

fn group_indian(digits: &str) -> String {
    if digits.len() <= 3 {
        return digits.to_string();
    }

    let (head, tail) = digits.split_at(digits.len() - 3);
    let mut groups: Vec<&str> = Vec::new();
    let mut end = head.len();
    while end > 0 {
        let start = end.saturating_sub(2);
        groups.push(&head[start..end]);
        end = start;
    }
    groups.reverse();

    format!("{},{}", groups.join(","), tail)
}
