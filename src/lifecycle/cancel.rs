//! Cancellation, with the refund of whatever the lead has paid.
//!
//! The refund (when one is due) and the status change share a transaction:
//! if the refund is rejected the lead is left exactly as it was.

use chrono::NaiveDate;
use rusqlite::Connection;
use serde::Serialize;

use crate::error::{Rejection, Result};
use crate::ledger::{self, RefundOutcome};
use crate::models::{Lead, LeadStatus, MoneyInput};

use super::status::write_status;
use super::{WorkflowContext, begin_write, load_lead};

/// Refund fields as submitted with the cancel form.
///
/// They are only parsed once the workflow knows a refund is due, so stray
/// values on an unpaid lead never block its cancellation.
#[derive(Debug, Clone, Default)]
pub struct RefundFields {
    pub amount: Option<String>,
    pub method: Option<String>,
    pub date: Option<String>,
    pub notes: Option<String>,
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl RefundFields {
    pub fn is_blank(&self) -> bool {
        non_blank(&self.amount).is_none()
    }

    /// `None` when no amount was entered.
    pub fn parse(&self, today: NaiveDate) -> std::result::Result<Option<MoneyInput>, Rejection> {
        if self.is_blank() {
            return Ok(None);
        }
        ledger::parse_money(
            non_blank(&self.amount),
            non_blank(&self.method),
            non_blank(&self.date),
            non_blank(&self.notes),
            today,
        )
        .map(Some)
    }
}

impl From<&MoneyInput> for RefundFields {
    fn from(input: &MoneyInput) -> Self {
        Self {
            amount: Some(input.amount.to_string()),
            method: Some(input.payment_method.as_ref().to_string()),
            date: Some(input.date.format("%Y-%m-%d").to_string()),
            notes: input.notes.clone(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CancelRequest {
    /// Refund to issue. Required when the lead has course money on file,
    /// ignored otherwise.
    pub refund: RefundFields,
}

impl CancelRequest {
    pub fn refunding(input: &MoneyInput) -> Self {
        Self {
            refund: RefundFields::from(input),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CancelOutcome {
    pub lead: Lead,
    /// Set when the refund this request describes is on the ledger, whether
    /// this call wrote it or an earlier identical cancel did. A retry of a
    /// full refund therefore still reports it, even though the lead's total
    /// is already zero. Use [`RefundOutcome::is_new`] to tell whether money
    /// moved on this call.
    pub refund: Option<RefundOutcome>,
}

impl CancelOutcome {
    pub fn refund_recorded(&self) -> bool {
        self.refund.is_some()
    }

    pub fn notice(&self) -> &'static str {
        if self.refund_recorded() {
            "cancelled_refunded"
        } else {
            "cancelled"
        }
    }
}

/// What the cancel form needs to know before it is submitted.
#[derive(Debug, Clone, Serialize)]
pub struct CancelPreview {
    pub lead_id: String,
    pub status: LeadStatus,
    pub already_cancelled: bool,
    pub total_course_paid: i64,
    pub refund_required: bool,
    pub max_refund: i64,
}

pub fn cancel_preview(conn: &Connection, lead_id: &str) -> Result<CancelPreview> {
    let lead = load_lead(conn, lead_id)?;
    let total = ledger::total_course_paid(conn, lead_id)?;
    Ok(CancelPreview {
        lead_id: lead.id,
        status: lead.status,
        already_cancelled: lead.status == LeadStatus::Cancelled,
        total_course_paid: total,
        refund_required: total > 0,
        max_refund: total.max(0),
    })
}

pub fn cancel_lead(
    conn: &mut Connection,
    ctx: &WorkflowContext,
    lead_id: &str,
    request: CancelRequest,
) -> Result<CancelOutcome> {
    let tx = begin_write(conn)?;
    let lead = load_lead(&tx, lead_id)?;
    let outcome = cancel_in(&tx, ctx, &lead, request)?;
    tx.commit()?;
    Ok(outcome)
}

pub(super) fn cancel_in(
    conn: &Connection,
    ctx: &WorkflowContext,
    lead: &Lead,
    request: CancelRequest,
) -> Result<CancelOutcome> {
    let total = ledger::total_course_paid(conn, &lead.id)?;

    let refund = if total > 0 {
        let input = request
            .refund
            .parse(ctx.today)?
            .ok_or(Rejection::RefundRequired)?;
        Some(ledger::record_idempotent_refund(conn, &lead.id, &input, ctx.today)?)
    } else {
        // Nothing to refund. Fields that match an earlier cancel refund
        // still report it; anything else is ignored.
        match request.refund.parse(ctx.today) {
            Ok(Some(input)) => {
                ledger::find_cancel_refund(conn, &lead.id, &input)?.map(RefundOutcome::AlreadyRecorded)
            }
            _ => {
                if !request.refund.is_blank() {
                    tracing::debug!("Ignoring refund fields for lead {} with nothing paid", lead.id);
                }
                None
            }
        }
    };

    write_status(conn, lead, LeadStatus::Cancelled, "cancel")?;
    let lead = load_lead(conn, &lead.id)?;

    Ok(CancelOutcome { lead, refund })
}
