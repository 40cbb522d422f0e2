//! Refund engine.
//!
//! Two entry points share one validation contract:
//! - [`record_direct_refund`]: finance-initiated, every call is a new event.
//! - [`record_idempotent_refund`]: cancel-initiated, keyed on
//!   `(lead, date, amount)` so a replayed cancellation writes nothing.
//!
//! Both expect to run inside the caller's write transaction so that the
//! ceiling check and the insert see the same ledger.

use chrono::NaiveDate;
use rusqlite::Connection;

use crate::db::queries;
use crate::error::{AppError, Rejection, Result};
use crate::models::{CreateTransaction, MoneyInput, Transaction, TransactionCategory, TransactionType};

use super::aggregator::total_course_paid;
use super::validate::check_money;

/// Result of an idempotent refund request.
#[derive(Debug, Clone)]
pub enum RefundOutcome {
    /// A new ledger row was written.
    Recorded(Transaction),
    /// A refund with the same key already existed; nothing was written.
    AlreadyRecorded(Transaction),
}

impl RefundOutcome {
    pub fn transaction(&self) -> &Transaction {
        match self {
            Self::Recorded(t) | Self::AlreadyRecorded(t) => t,
        }
    }

    pub fn is_new(&self) -> bool {
        matches!(self, Self::Recorded(_))
    }
}

/// Ledger key of the refund issued while cancelling a lead.
pub fn cancel_refund_key(lead_id: &str, date: NaiveDate, amount: i64) -> String {
    format!("lead:{}:cancel_refund:{}:{}", lead_id, date.format("%Y-%m-%d"), amount)
}

/// The cancellation refund already recorded for these inputs, if any.
pub fn find_cancel_refund(conn: &Connection, lead_id: &str, input: &MoneyInput) -> Result<Option<Transaction>> {
    queries::get_transaction_by_ref_key(conn, &cancel_refund_key(lead_id, input.date, input.amount))
}

/// Reject a refund that is malformed or larger than what the lead has paid.
/// Returns the lead's course total at the time of the check.
pub fn check_refund(conn: &Connection, lead_id: &str, input: &MoneyInput, today: NaiveDate) -> Result<i64> {
    check_money(input, today)?;
    let total = total_course_paid(conn, lead_id)?;
    if input.amount > total {
        return Err(Rejection::AmountExceeds { max: total.max(0) }.into());
    }
    Ok(total)
}

fn refund_row(lead_id: &str, input: &MoneyInput, ref_key: String) -> CreateTransaction {
    CreateTransaction {
        transaction_type: TransactionType::Out,
        category: TransactionCategory::Refund,
        amount: input.amount,
        payment_method: input.payment_method,
        lead_id: Some(lead_id.to_string()),
        ref_key,
        transaction_date: input.date,
        notes: input.notes.clone(),
    }
}

/// Record a refund under a fresh key. Two identical calls are two refunds.
pub fn record_direct_refund(
    conn: &Connection,
    lead_id: &str,
    input: &MoneyInput,
    today: NaiveDate,
) -> Result<Transaction> {
    let total = check_refund(conn, lead_id, input, today)?;
    let txn = queries::create_transaction(
        conn,
        &refund_row(lead_id, input, queries::generate_manual_ref_key()),
    )?;

    tracing::info!(
        "Recorded refund {} of {} for lead {} (course total was {})",
        txn.id,
        txn.amount,
        lead_id,
        total
    );
    Ok(txn)
}

/// Record a refund at most once per `(lead, date, amount)`.
///
/// A replay is detected before the ceiling check: once the first refund is
/// in, the lead's total has already dropped and the retry would otherwise be
/// rejected as exceeding it.
pub fn record_idempotent_refund(
    conn: &Connection,
    lead_id: &str,
    input: &MoneyInput,
    today: NaiveDate,
) -> Result<RefundOutcome> {
    check_money(input, today)?;

    let ref_key = cancel_refund_key(lead_id, input.date, input.amount);
    if let Some(existing) = find_cancel_refund(conn, lead_id, input)? {
        tracing::debug!("Refund {} already recorded for lead {}", ref_key, lead_id);
        return Ok(RefundOutcome::AlreadyRecorded(existing));
    }

    check_refund(conn, lead_id, input, today)?;

    let inserted = queries::try_create_transaction(conn, &refund_row(lead_id, input, ref_key.clone()))?;
    let txn = queries::get_transaction_by_ref_key(conn, &ref_key)?
        .ok_or_else(|| AppError::Internal(format!("refund {} missing after insert", ref_key)))?;

    if inserted {
        tracing::info!(
            "Recorded cancellation refund {} of {} for lead {}",
            txn.id,
            txn.amount,
            lead_id
        );
        Ok(RefundOutcome::Recorded(txn))
    } else {
        Ok(RefundOutcome::AlreadyRecorded(txn))
    }
}
