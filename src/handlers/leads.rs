use axum::{
    extract::{FromRequest, Request, State},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::db::{AppState, queries};
use crate::error::{AppError, OptionExt, Result, msg};
use crate::extractors::{Form, Json, Path, Query};
use crate::id::is_valid_prefixed_id;
use crate::ledger;
use crate::lifecycle::{self, LeadAction, LeadCommand, WorkflowContext};
use crate::models::{Lead, LeadPayment, Offer, PaymentSummary, StatusChange};

use super::forms::{
    BookTestForm, CancelForm, IntakeForm, MarkReadyForm, MarkTestedForm, OfferForm, SaveForm,
};
use super::redirect_outcome;

#[derive(Debug, Deserialize)]
pub struct ActionQuery {
    pub action: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LeadDetail {
    pub lead: Lead,
    pub offer: Option<Offer>,
    pub payments: Vec<LeadPayment>,
    pub payment_summary: PaymentSummary,
    pub history: Vec<StatusChange>,
}

/// POST /leads
pub async fn create_lead(
    State(state): State<AppState>,
    Form(form): Form<IntakeForm>,
) -> Result<Response> {
    let mut conn = state.db.get()?;
    match lifecycle::create_lead(&mut conn, &form.into_input()) {
        Ok(lead) => redirect_outcome(&format!("/leads/{}", lead.id), Ok("lead_created")),
        Err(e) => redirect_outcome("/leads", Err(e)),
    }
}

/// GET /leads/{id}
/// Lead detail, or the cancel preview with `?action=cancel`.
pub async fn get_lead(
    State(state): State<AppState>,
    Path(lead_id): Path<String>,
    Query(query): Query<ActionQuery>,
) -> Result<Response> {
    if !is_valid_prefixed_id(&lead_id) {
        return Err(AppError::NotFound(msg::LEAD_NOT_FOUND.into()));
    }
    let conn = state.db.get()?;

    if query.action.as_deref() == Some(LeadAction::Cancel.as_ref()) {
        let preview = lifecycle::cancel_preview(&conn, &lead_id)?;
        return Ok(Json(preview).into_response());
    }

    let lead = queries::get_lead_by_id(&conn, &lead_id)?.or_not_found(msg::LEAD_NOT_FOUND)?;
    let detail = LeadDetail {
        offer: queries::get_offer(&conn, &lead.id)?,
        payments: queries::list_lead_payments(&conn, &lead.id)?,
        payment_summary: ledger::payment_summary(&conn, &lead.id)?,
        history: queries::list_status_changes(&conn, &lead.id)?,
        lead,
    };
    Ok(Json(detail).into_response())
}

/// POST /leads/{id}?action=<tag>
/// The body shape depends on the action, so it is read after dispatch.
pub async fn lead_action(
    State(state): State<AppState>,
    Path(lead_id): Path<String>,
    Query(query): Query<ActionQuery>,
    request: Request,
) -> Result<Response> {
    let ctx = WorkflowContext::for_state(&state);
    let base = format!("/leads/{}", lead_id);

    let command = match read_command(&state, query.action.as_deref(), request).await {
        Ok(command) => command,
        Err(e) => return redirect_outcome(&base, Err(e)),
    };

    let mut conn = state.db.get()?;
    let result = lifecycle::execute(&mut conn, &ctx, &lead_id, command).map(|outcome| outcome.notice);
    redirect_outcome(&base, result)
}

async fn body<T: DeserializeOwned>(request: Request, state: &AppState) -> Result<T> {
    let Form(form) = Form::<T>::from_request(request, state).await?;
    Ok(form)
}

async fn read_command(
    state: &AppState,
    tag: Option<&str>,
    request: Request,
) -> Result<LeadCommand> {
    let command = match LeadAction::parse(tag)? {
        LeadAction::BookTest => {
            LeadCommand::BookTest(body::<BookTestForm>(request, state).await?.into_command()?)
        }
        LeadAction::MarkTested => {
            LeadCommand::MarkTested(body::<MarkTestedForm>(request, state).await?.into_command()?)
        }
        LeadAction::SendOffer => {
            LeadCommand::SendOffer(body::<OfferForm>(request, state).await?.into_command()?)
        }
        LeadAction::MarkReady => {
            LeadCommand::MarkReady(body::<MarkReadyForm>(request, state).await?.into_command())
        }
        LeadAction::WaitForRound => LeadCommand::WaitForRound,
        LeadAction::Cancel => {
            LeadCommand::Cancel(body::<CancelForm>(request, state).await?.into_command())
        }
        LeadAction::Reopen => LeadCommand::Reopen,
        LeadAction::Save => LeadCommand::Save(body::<SaveForm>(request, state).await?.into_command()?),
    };
    Ok(command)
}
