use rusqlite::Connection;

use crate::db::queries;
use crate::error::{AppError, Result};
use crate::models::{Lead, LeadStatus};

/// Class day pairs the school runs.
pub const CLASS_DAYS: [&str; 3] = ["Sat/Tue", "Sun/Wed", "Mon/Thu"];

/// Class start times the school runs.
pub const CLASS_TIMES: [&str; 6] = ["07:30", "09:00", "10:30", "17:00", "19:00", "20:30"];

pub fn is_allowed_schedule(days: &str, time: &str) -> bool {
    CLASS_DAYS.contains(&days.trim()) && CLASS_TIMES.contains(&time.trim())
}

/// Whether a stored status may be replaced by `to`.
///
/// Pipeline moves go forward only. The single backward edge is
/// `paid_full -> offer_sent`, taken when a refund breaks full payment.
/// `cancelled` only leaves through reopen, and `paused` is never entered.
pub fn can_transition(from: LeadStatus, to: LeadStatus) -> bool {
    use LeadStatus::*;

    match (from, to) {
        _ if from == to => true,
        (Cancelled, LeadCreated) => true,
        (Cancelled, _) => false,
        (_, Cancelled | WaitingForRound) => true,
        (_, Paused) => false,
        (PaidFull, OfferSent) => true,
        (WaitingForRound | Paused, _) => true,
        _ => matches!((from.rank(), to.rank()), (Some(a), Some(b)) if b > a),
    }
}

/// Persist a status change for `lead`, guarded by [`can_transition`] and by
/// a compare-and-swap on the status the caller read.
pub(super) fn write_status(conn: &Connection, lead: &Lead, to: LeadStatus, reason: &str) -> Result<()> {
    if !can_transition(lead.status, to) {
        return Err(AppError::Conflict(format!(
            "Lead cannot move from {} to {}",
            lead.status, to
        )));
    }
    if !queries::set_lead_status(conn, &lead.id, lead.status, to, reason)? {
        return Err(AppError::Conflict(
            "Lead status changed while the request was processed".into(),
        ));
    }
    if lead.status != to {
        tracing::info!("Lead {} status {} -> {} ({})", lead.id, lead.status, to, reason);
    }
    Ok(())
}
