//! Money workflows on a lead: course payments, the placement-test fee and
//! direct refunds. Each one writes the money, its ledger row and any status
//! change in one transaction.

use rusqlite::Connection;

use crate::db::queries;
use crate::error::{Rejection, Result};
use crate::ledger;
use crate::models::{LeadPayment, MoneyInput, Transaction};

use super::classifier::reconcile_payments;
use super::{WorkflowContext, begin_write, load_lead};

pub fn record_course_payment(
    conn: &mut Connection,
    ctx: &WorkflowContext,
    lead_id: &str,
    input: &MoneyInput,
) -> Result<LeadPayment> {
    let tx = begin_write(conn)?;
    let lead = load_lead(&tx, lead_id)?;
    if lead.is_cancelled() {
        return Err(Rejection::LeadCancelled.into());
    }

    ledger::check_money(input, ctx.today)?;
    let summary = ledger::payment_summary(&tx, lead_id)?;
    if summary.final_price <= 0 {
        return Err(Rejection::NoOffer.into());
    }
    if input.amount > summary.remaining_balance {
        return Err(Rejection::AmountExceedsBalance {
            max: summary.remaining_balance,
        }
        .into());
    }

    let payment = queries::create_lead_payment(&tx, lead_id, input)?;
    ledger::sync_course_payment(&tx, &payment)?;
    reconcile_payments(&tx, lead_id, "course_payment")?;
    tx.commit()?;

    tracing::info!(
        "Recorded course payment {} of {} for lead {}",
        payment.id,
        payment.amount,
        lead_id
    );
    Ok(payment)
}

/// Save the lead's placement-test fee. Saving again replaces the amount.
pub fn record_placement_test_fee(
    conn: &mut Connection,
    ctx: &WorkflowContext,
    lead_id: &str,
    input: &MoneyInput,
) -> Result<Transaction> {
    let tx = begin_write(conn)?;
    let lead = load_lead(&tx, lead_id)?;
    if lead.is_cancelled() {
        return Err(Rejection::LeadCancelled.into());
    }
    ledger::check_money(input, ctx.today)?;

    let txn = ledger::sync_placement_test_fee(&tx, lead_id, input)?;
    queries::set_placement_test_fee(&tx, lead_id, input.amount)?;
    tx.commit()?;

    tracing::info!("Placement test fee for lead {} set to {}", lead_id, txn.amount);
    Ok(txn)
}

/// Finance-initiated refund. Not deduplicated: every call is a new refund.
/// Holding the write lock from the ceiling check to the insert keeps two
/// concurrent refunds from jointly exceeding what was paid.
pub fn refund_directly(
    conn: &mut Connection,
    ctx: &WorkflowContext,
    lead_id: &str,
    input: &MoneyInput,
) -> Result<Transaction> {
    let tx = begin_write(conn)?;
    load_lead(&tx, lead_id)?;

    let txn = ledger::record_direct_refund(&tx, lead_id, input, ctx.today)?;
    reconcile_payments(&tx, lead_id, "refund")?;
    tx.commit()?;
    Ok(txn)
}
