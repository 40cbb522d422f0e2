use chrono::NaiveDate;
use rusqlite::Connection;

use crate::db::queries;
use crate::error::{Rejection, Result};
use crate::models::{CreateTransaction, MoneyInput, Transaction, TransactionCategory};

use super::validate::check_money;

/// Record an operating entry (rent, salaries, ...) that is not tied to a lead.
///
/// Lead-bound categories are refused here; they are only written by the lead
/// workflows so that lead totals stay derivable from the ledger.
pub fn record_manual_entry(
    conn: &Connection,
    category: TransactionCategory,
    input: &MoneyInput,
    today: NaiveDate,
) -> Result<Transaction> {
    if category.is_lead_bound() {
        return Err(Rejection::InvalidCategory.into());
    }
    check_money(input, today)?;

    let txn = queries::create_transaction(
        conn,
        &CreateTransaction {
            transaction_type: category.direction(),
            category,
            amount: input.amount,
            payment_method: input.payment_method,
            lead_id: None,
            ref_key: queries::generate_manual_ref_key(),
            transaction_date: input.date,
            notes: input.notes.clone(),
        },
    )?;

    tracing::info!(
        "Recorded {} {} entry {} of {}",
        txn.transaction_type.as_ref(),
        txn.category.as_ref(),
        txn.id,
        txn.amount
    );
    Ok(txn)
}
