//! Lead lifecycle: the status state machine and the workflows that drive it.
//!
//! Every public workflow here opens its own `IMMEDIATE` transaction, so the
//! reads that validate a request and the writes that apply it happen under
//! the same SQLite write lock. A rejection or failure rolls everything back.

mod cancel;
mod classifier;
mod commands;
mod intake;
mod payments;
mod status;

pub use cancel::{
    CancelOutcome, CancelPreview, CancelRequest, RefundFields, cancel_lead, cancel_preview,
};
pub use classifier::classify;
pub use commands::{
    BookTest, CommandOutcome, LeadAction, LeadCommand, MarkReady, MarkTested, execute,
};
pub use intake::{create_lead, normalize_phone};
pub use payments::{record_course_payment, record_placement_test_fee, refund_directly};
pub use status::{CLASS_DAYS, CLASS_TIMES, can_transition, is_allowed_schedule};

use chrono::{Local, NaiveDate};
use rusqlite::{Connection, TransactionBehavior};

use crate::db::{AppState, queries};
use crate::error::{OptionExt, Result, msg};
use crate::models::Lead;

/// Per-request inputs that would otherwise be global state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkflowContext {
    pub today: NaiveDate,
    /// Intake round currently running.
    pub current_round: i64,
}

impl WorkflowContext {
    pub fn new(today: NaiveDate, current_round: i64) -> Self {
        Self { today, current_round }
    }

    pub fn for_state(state: &AppState) -> Self {
        Self::new(Local::now().date_naive(), state.current_round)
    }
}

fn begin_write(conn: &mut Connection) -> Result<rusqlite::Transaction<'_>> {
    Ok(conn.transaction_with_behavior(TransactionBehavior::Immediate)?)
}

fn load_lead(conn: &Connection, lead_id: &str) -> Result<Lead> {
    queries::get_lead_by_id(conn, lead_id)?.or_not_found(msg::LEAD_NOT_FOUND)
}
