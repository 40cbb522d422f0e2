//! Mirrors lead-side money events into the ledger under deterministic keys.

use rusqlite::Connection;

use crate::db::queries;
use crate::error::Result;
use crate::models::{
    CreateTransaction, LeadPayment, MoneyInput, Transaction, TransactionCategory, TransactionType,
};

pub fn placement_test_key(lead_id: &str) -> String {
    format!("lead:{}:placement_test", lead_id)
}

pub fn course_payment_key(lead_id: &str, payment_id: &str) -> String {
    format!("lead:{}:course_payment:{}", lead_id, payment_id)
}

/// A lead has at most one placement-test fee; re-saving overwrites it.
pub fn sync_placement_test_fee(conn: &Connection, lead_id: &str, input: &MoneyInput) -> Result<Transaction> {
    queries::upsert_transaction(
        conn,
        &CreateTransaction {
            transaction_type: TransactionType::In,
            category: TransactionCategory::PlacementTest,
            amount: input.amount,
            payment_method: input.payment_method,
            lead_id: Some(lead_id.to_string()),
            ref_key: placement_test_key(lead_id),
            transaction_date: input.date,
            notes: input.notes.clone(),
        },
    )
}

/// Record the ledger side of a course payment. Returns `false` if the
/// payment was already mirrored.
pub fn sync_course_payment(conn: &Connection, payment: &LeadPayment) -> Result<bool> {
    queries::try_create_transaction(
        conn,
        &CreateTransaction {
            transaction_type: TransactionType::In,
            category: TransactionCategory::CoursePayment,
            amount: payment.amount,
            payment_method: payment.payment_method,
            lead_id: Some(payment.lead_id.clone()),
            ref_key: course_payment_key(&payment.lead_id, &payment.id),
            transaction_date: payment.payment_date,
            notes: payment.notes.clone(),
        },
    )
}
