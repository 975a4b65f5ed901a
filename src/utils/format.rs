/// Display string for a balance, e.g. `1.2500 ETH`.
pub fn format_balance(amount: f64, symbol: &str) -> String {
    if amount == 0.0 {
        format!("0 {}", symbol)
    } else if amount < 0.0001 {
        format!("<0.0001 {}", symbol)
    } else if amount >= 1000.0 {
        format!("{:.2} {}", amount, symbol)
    } else {
        format!("{:.4} {}", amount, symbol)
    }
}
