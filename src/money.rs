// 💵 Money helpers - exact aggregation and month arithmetic
//
// Amounts are summed as integer cents so a total never depends on the order
// records were fetched in.

use chrono::{Datelike, NaiveDate};

pub fn to_cents(amount: f64) -> i64 {
    (amount * 100.0).round() as i64
}

pub fn from_cents(cents: i64) -> f64 {
    cents as f64 / 100.0
}

/// Order-independent sum of dollar amounts.
///
/// Non-finite amounts are skipped and the cent total saturates instead of
/// overflowing; validation rejects such inputs before a report is built.
pub fn sum<I>(amounts: I) -> f64
where
    I: IntoIterator<Item = f64>,
{
    let cents = amounts
        .into_iter()
        .filter(|amount| amount.is_finite())
        .map(to_cents)
        .fold(0i64, |total, cents| total.saturating_add(cents));
    from_cents(cents)
}

/// Whole months from `from` to `to`; days are ignored.
pub fn months_between(from: NaiveDate, to: NaiveDate) -> i32 {
    (to.year() - from.year()) * 12 + (to.month() as i32 - from.month() as i32)
}

/// (year, month) key used for monthly buckets.
pub fn month_key(date: NaiveDate) -> (i32, u32) {
    (date.year(), date.month())
}

/// Whole years between two dates (birthday-aware).
pub fn years_between(from: NaiveDate, to: NaiveDate) -> i32 {
    let mut years = to.year() - from.year();
    if (to.month(), to.day()) < (from.month(), from.day()) {
        years -= 1;
    }
    years
}

/// Same day-of-month `years` later, clamped to Feb 28 for leap birthdays.
pub fn add_years(date: NaiveDate, years: i32) -> NaiveDate {
    NaiveDate::from_ymd_opt(date.year() + years, date.month(), date.day())
        .or_else(|| NaiveDate::from_ymd_opt(date.year() + years, date.month(), 28))
        .unwrap_or(date)
}
