use rusqlite::Connection;

use crate::db::queries;
use crate::error::Result;
use crate::ledger;
use crate::models::{Lead, LeadStatus, PaymentSummary};

use super::status::{is_allowed_schedule, write_status};

/// Furthest pipeline stage the saved data supports.
pub fn classify(lead: &Lead, has_offer: bool, summary: &PaymentSummary) -> LeadStatus {
    if summary.is_fully_paid {
        match (lead.assigned_level, lead.class_days.as_deref(), lead.class_time.as_deref()) {
            (Some(_), Some(days), Some(time)) if lead.has_schedule() => {
                if is_allowed_schedule(days, time) {
                    LeadStatus::ReadyToStart
                } else {
                    LeadStatus::ScheduleAssigned
                }
            }
            _ => LeadStatus::PaidFull,
        }
    } else if summary.final_price > 0 && summary.total_course_paid > 0 {
        LeadStatus::DepositPaid
    } else if has_offer {
        LeadStatus::OfferSent
    } else if lead.is_tested() {
        LeadStatus::Tested
    } else if lead.has_test_booking() {
        LeadStatus::TestBooked
    } else {
        LeadStatus::LeadCreated
    }
}

fn higher(a: LeadStatus, b: LeadStatus) -> LeadStatus {
    if b.rank() > a.rank() { b } else { a }
}

/// Move `lead` to the furthest stage its data supports, never backwards.
///
/// `floor` is the stage an explicit command asks for. Side states are only
/// left when a command asks; a plain save keeps them. Cancelled leads are
/// never touched.
pub(super) fn advance(
    conn: &Connection,
    lead: &Lead,
    floor: Option<LeadStatus>,
    reason: &str,
) -> Result<Lead> {
    if lead.is_cancelled() {
        return Ok(lead.clone());
    }

    let has_offer = queries::get_offer(conn, &lead.id)?.is_some();
    let summary = ledger::payment_summary(conn, &lead.id)?;
    let computed = classify(lead, has_offer, &summary);
    let target = floor.map_or(computed, |f| higher(f, computed));

    let moves = match lead.status.rank() {
        Some(current) => target.rank().is_some_and(|t| t > current),
        None => floor.is_some(),
    };
    if !moves {
        return Ok(lead.clone());
    }

    write_status(conn, lead, target, reason)?;
    super::load_lead(conn, &lead.id)
}

/// Re-evaluate status after money moved on the lead.
///
/// A refund that breaks full payment sends `paid_full` back to `offer_sent`;
/// anything else is a forward-only [`advance`].
pub(super) fn reconcile_payments(conn: &Connection, lead_id: &str, reason: &str) -> Result<Lead> {
    let lead = super::load_lead(conn, lead_id)?;
    if lead.is_cancelled() {
        return Ok(lead);
    }

    if lead.status == LeadStatus::PaidFull && !ledger::is_fully_paid(conn, lead_id)? {
        write_status(conn, &lead, LeadStatus::OfferSent, reason)?;
        return super::load_lead(conn, lead_id);
    }

    advance(conn, &lead, None, reason)
}
