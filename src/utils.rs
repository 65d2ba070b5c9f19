//! Small helpers.

use chrono::NaiveDate;

pub fn sanitize_symbol(sym: &str) -> String {
    sym.trim().to_uppercase()
}

/// Calendar days from `as_of` to `date`; negative once `date` has passed.
pub fn days_between(as_of: NaiveDate, date: NaiveDate) -> i64 {
    (date - as_of).num_days()
}

pub fn round_to(x: f64, decimals: i32) -> f64 {
    let f = 10f64.powi(decimals);
    (x * f).round() / f
}

/// Strictly positive and finite: the only prices the engine computes with.
pub fn is_usable_price(p: f64) -> bool {
    p.is_finite() && p > 0.0
}
