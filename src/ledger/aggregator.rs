//! What a lead has paid toward the course.
//!
//! Always computed from `lead_payments` and refund rows in the ledger. There
//! is no stored running total; every money-sensitive decision reads through
//! these functions.

use rusqlite::Connection;

use crate::db::queries;
use crate::error::Result;
use crate::models::PaymentSummary;

/// Σ course payments − Σ refunds for the lead.
pub fn total_course_paid(conn: &Connection, lead_id: &str) -> Result<i64> {
    let paid = queries::sum_course_payments(conn, lead_id)?;
    let refunded = queries::sum_refunds(conn, lead_id)?;
    let total = paid - refunded;
    if total < 0 {
        // Unreachable while refunds go through the refund engine
        tracing::error!(
            "Negative course total for lead {}: paid={}, refunded={}",
            lead_id,
            paid,
            refunded
        );
    }
    Ok(total)
}

/// Final price of the lead's offer, 0 when no offer exists.
pub fn final_price(conn: &Connection, lead_id: &str) -> Result<i64> {
    Ok(queries::get_offer(conn, lead_id)?
        .map(|o| o.final_price)
        .unwrap_or(0))
}

pub fn payment_summary(conn: &Connection, lead_id: &str) -> Result<PaymentSummary> {
    let price = final_price(conn, lead_id)?;
    let total = total_course_paid(conn, lead_id)?;
    Ok(PaymentSummary::new(price, total))
}

pub fn is_fully_paid(conn: &Connection, lead_id: &str) -> Result<bool> {
    Ok(payment_summary(conn, lead_id)?.is_fully_paid)
}
