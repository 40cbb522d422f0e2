use chrono::NaiveDate;
use rusqlite::Connection;
use strum::{AsRefStr, EnumString};

use crate::db::queries;
use crate::error::{Rejection, Result};
use crate::ledger;
use crate::models::{Lead, LeadStatus, SetOffer, UpdateLead};

use super::cancel::{CancelRequest, cancel_in};
use super::classifier::{advance, reconcile_payments};
use super::status::{is_allowed_schedule, write_status};
use super::{WorkflowContext, begin_write, load_lead};

/// Operator actions on a single lead, as named in the `?action=` tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum LeadAction {
    BookTest,
    MarkTested,
    SendOffer,
    MarkReady,
    WaitForRound,
    Cancel,
    Reopen,
    Save,
}

impl LeadAction {
    pub fn parse(tag: Option<&str>) -> std::result::Result<Self, Rejection> {
        tag.and_then(|t| t.trim().parse().ok())
            .ok_or(Rejection::UnknownAction)
    }
}

#[derive(Debug, Clone, Default)]
pub struct BookTest {
    pub test_date: Option<NaiveDate>,
    pub test_time: Option<String>,
    pub test_type: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct MarkTested {
    pub assigned_level: Option<i64>,
    pub test_notes: Option<String>,
}

/// Both fields fall back to the stored schedule when omitted.
#[derive(Debug, Clone, Default)]
pub struct MarkReady {
    pub class_days: Option<String>,
    pub class_time: Option<String>,
}

#[derive(Debug, Clone)]
pub enum LeadCommand {
    BookTest(BookTest),
    MarkTested(MarkTested),
    SendOffer(SetOffer),
    MarkReady(MarkReady),
    WaitForRound,
    Cancel(CancelRequest),
    Reopen,
    Save(UpdateLead),
}

impl LeadCommand {
    pub fn action(&self) -> LeadAction {
        match self {
            Self::BookTest(_) => LeadAction::BookTest,
            Self::MarkTested(_) => LeadAction::MarkTested,
            Self::SendOffer(_) => LeadAction::SendOffer,
            Self::MarkReady(_) => LeadAction::MarkReady,
            Self::WaitForRound => LeadAction::WaitForRound,
            Self::Cancel(_) => LeadAction::Cancel,
            Self::Reopen => LeadAction::Reopen,
            Self::Save(_) => LeadAction::Save,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CommandOutcome {
    pub lead: Lead,
    /// Success code reported back to the operator.
    pub notice: &'static str,
}

/// Run one command against a lead in a single write transaction.
pub fn execute(
    conn: &mut Connection,
    ctx: &WorkflowContext,
    lead_id: &str,
    command: LeadCommand,
) -> Result<CommandOutcome> {
    let action = command.action();
    let tx = begin_write(conn)?;
    let lead = load_lead(&tx, lead_id)?;

    if lead.is_cancelled() && !matches!(action, LeadAction::Cancel | LeadAction::Reopen) {
        return Err(Rejection::LeadCancelled.into());
    }

    let reason = action.as_ref();
    let (lead, notice) = match command {
        LeadCommand::BookTest(input) => (book_test(&tx, &lead, input, reason)?, "test_booked"),
        LeadCommand::MarkTested(input) => (mark_tested(&tx, &lead, input, reason)?, "tested"),
        LeadCommand::SendOffer(input) => (send_offer(&tx, &lead, &input, reason)?, "offer_sent"),
        LeadCommand::MarkReady(input) => (mark_ready(&tx, &lead, input, reason)?, "ready_to_start"),
        LeadCommand::WaitForRound => (wait_for_round(&tx, ctx, &lead, reason)?, "waiting_for_round"),
        LeadCommand::Cancel(request) => {
            let outcome = cancel_in(&tx, ctx, &lead, request)?;
            let notice = outcome.notice();
            (outcome.lead, notice)
        }
        LeadCommand::Reopen => (reopen(&tx, &lead, reason)?, "reopened"),
        LeadCommand::Save(input) => (save(&tx, &lead, &input, reason)?, "saved"),
    };

    tx.commit()?;
    tracing::debug!("Lead {} {}: now {}", lead.id, reason, lead.status);
    Ok(CommandOutcome { lead, notice })
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn check_level(level: Option<i64>) -> std::result::Result<(), Rejection> {
    match level {
        Some(l) if !(1..=8).contains(&l) => Err(Rejection::InvalidLevel),
        _ => Ok(()),
    }
}

fn book_test(conn: &Connection, lead: &Lead, input: BookTest, reason: &str) -> Result<Lead> {
    let (Some(date), Some(time), Some(kind)) =
        (input.test_date, non_blank(input.test_time), non_blank(input.test_type))
    else {
        return Err(Rejection::TestDetailsRequired.into());
    };

    queries::set_test_booking(conn, &lead.id, date, &time, &kind)?;
    let lead = load_lead(conn, &lead.id)?;
    advance(conn, &lead, Some(LeadStatus::TestBooked), reason)
}

fn mark_tested(conn: &Connection, lead: &Lead, input: MarkTested, reason: &str) -> Result<Lead> {
    check_level(input.assigned_level)?;

    queries::mark_lead_tested(
        conn,
        &lead.id,
        input.assigned_level,
        non_blank(input.test_notes).as_deref(),
    )?;
    let lead = load_lead(conn, &lead.id)?;
    advance(conn, &lead, Some(LeadStatus::Tested), reason)
}

/// Re-pricing runs the same reconcile as a payment: a higher price on a
/// `paid_full` lead sends it back to `offer_sent`. Stages past `paid_full`
/// have no way back, so their price may not rise above what was paid.
fn send_offer(conn: &Connection, lead: &Lead, input: &SetOffer, reason: &str) -> Result<Lead> {
    let priced = input.price()?;
    if lead.status.rank() > LeadStatus::PaidFull.rank() {
        let total = ledger::total_course_paid(conn, &lead.id)?;
        if priced.final_price > total {
            return Err(Rejection::PriceAbovePaid { max: total }.into());
        }
    }

    let offer = queries::upsert_offer(conn, &lead.id, &priced)?;
    tracing::info!("Offer for lead {} priced at {}", lead.id, offer.final_price);

    let reconciled = reconcile_payments(conn, &lead.id, reason)?;
    if reconciled.status != lead.status {
        return Ok(reconciled);
    }
    advance(conn, &reconciled, Some(LeadStatus::OfferSent), reason)
}

fn mark_ready(conn: &Connection, lead: &Lead, input: MarkReady, reason: &str) -> Result<Lead> {
    let days = non_blank(input.class_days).or_else(|| non_blank(lead.class_days.clone()));
    let time = non_blank(input.class_time).or_else(|| non_blank(lead.class_time.clone()));
    let (Some(days), Some(time)) = (days, time) else {
        return Err(Rejection::ScheduleRequired.into());
    };
    if !is_allowed_schedule(&days, &time) {
        return Err(Rejection::InvalidSchedule.into());
    }

    let summary = ledger::payment_summary(conn, &lead.id)?;
    if !summary.is_fully_paid {
        return Err(Rejection::NotFullyPaid {
            remaining: summary.remaining_balance,
        }
        .into());
    }

    queries::set_schedule(conn, &lead.id, &days, &time)?;
    let lead = load_lead(conn, &lead.id)?;
    advance(conn, &lead, Some(LeadStatus::ReadyToStart), reason)
}

fn wait_for_round(conn: &Connection, ctx: &WorkflowContext, lead: &Lead, reason: &str) -> Result<Lead> {
    queries::set_waiting_round(conn, &lead.id, ctx.current_round + 1)?;
    write_status(conn, lead, LeadStatus::WaitingForRound, reason)?;
    load_lead(conn, &lead.id)
}

fn reopen(conn: &Connection, lead: &Lead, reason: &str) -> Result<Lead> {
    if !lead.is_cancelled() {
        return Err(Rejection::NotCancelled.into());
    }
    write_status(conn, lead, LeadStatus::LeadCreated, reason)?;
    load_lead(conn, &lead.id)
}

/// Persist edited fields, then let the classifier upgrade the stage.
fn save(conn: &Connection, lead: &Lead, input: &UpdateLead, reason: &str) -> Result<Lead> {
    if input
        .full_name
        .as_deref()
        .is_some_and(|n| n.trim().is_empty())
    {
        return Err(Rejection::NameRequired.into());
    }
    check_level(input.assigned_level)?;

    if input.touches_schedule() {
        let summary = ledger::payment_summary(conn, &lead.id)?;
        if !summary.is_fully_paid {
            return Err(Rejection::NotFullyPaid {
                remaining: summary.remaining_balance,
            }
            .into());
        }
    }

    queries::update_lead(conn, &lead.id, input)?;
    let lead = load_lead(conn, &lead.id)?;
    advance(conn, &lead, None, reason)
}
