//! Input rules shared by every money path (course payments, placement-test
//! fees, refunds, manual ledger entries).

use chrono::NaiveDate;

use crate::error::Rejection;
use crate::models::{MoneyInput, PaymentMethod};

pub fn parse_amount(raw: &str) -> Result<i64, Rejection> {
    raw.trim()
        .parse::<i64>()
        .ok()
        .filter(|a| *a > 0)
        .ok_or(Rejection::InvalidAmount)
}

pub fn parse_method(raw: Option<&str>) -> Result<PaymentMethod, Rejection> {
    raw.map(|m| m.trim().to_lowercase())
        .and_then(|m| m.parse().ok())
        .ok_or(Rejection::InvalidMethod)
}

pub fn parse_date(raw: &str) -> Result<NaiveDate, Rejection> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| Rejection::InvalidDate)
}

/// Parse raw form fields into a [`MoneyInput`]. A blank date means `today`.
pub fn parse_money(
    amount: Option<&str>,
    method: Option<&str>,
    date: Option<&str>,
    notes: Option<&str>,
    today: NaiveDate,
) -> Result<MoneyInput, Rejection> {
    let amount = parse_amount(amount.unwrap_or_default())?;
    let payment_method = parse_method(method)?;
    let date = match date {
        Some(d) => parse_date(d)?,
        None => today,
    };
    Ok(MoneyInput {
        amount,
        payment_method,
        date,
        notes: notes.map(str::to_string),
    })
}

/// The checks every money write repeats regardless of how the input was built.
pub fn check_money(input: &MoneyInput, today: NaiveDate) -> Result<(), Rejection> {
    if input.amount <= 0 {
        return Err(Rejection::InvalidAmount);
    }
    if input.date > today {
        return Err(Rejection::FutureDate);
    }
    Ok(())
}
