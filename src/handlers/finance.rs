use axum::{extract::State, response::Response};
use serde::Serialize;

use crate::db::{AppState, queries};
use crate::error::{AppError, OptionExt, Result, msg};
use crate::extractors::{Form, Json, Path, Query};
use crate::id::is_valid_prefixed_id;
use crate::ledger;
use crate::lifecycle::{self, WorkflowContext};
use crate::models::{LedgerTotals, PaymentSummary, Transaction, TransactionFilters};

use super::forms::{RefundForm, TransactionForm};
use super::redirect_outcome;

#[derive(Debug, Serialize)]
pub struct LeadLedger {
    pub lead_id: String,
    pub summary: PaymentSummary,
    pub transactions: Vec<Transaction>,
}

#[derive(Debug, Serialize)]
pub struct TransactionList {
    pub transactions: Vec<Transaction>,
    pub totals: LedgerTotals,
}

/// GET /finance/leads/{id}
pub async fn get_lead_ledger(
    State(state): State<AppState>,
    Path(lead_id): Path<String>,
) -> Result<Json<LeadLedger>> {
    let conn = state.db.get()?;
    queries::get_lead_by_id(&conn, &lead_id)?.or_not_found(msg::LEAD_NOT_FOUND)?;

    Ok(Json(LeadLedger {
        summary: ledger::payment_summary(&conn, &lead_id)?,
        transactions: queries::list_transactions_for_lead(&conn, &lead_id)?,
        lead_id,
    }))
}

/// POST /finance/leads/{id}/refunds
/// Direct refund: every submission records a new refund.
pub async fn create_refund(
    State(state): State<AppState>,
    Path(lead_id): Path<String>,
    Form(form): Form<RefundForm>,
) -> Result<Response> {
    let ctx = WorkflowContext::for_state(&state);
    let base = format!("/finance/leads/{}", lead_id);

    let result = match form.parse(ctx.today) {
        Ok(input) => {
            let mut conn = state.db.get()?;
            lifecycle::refund_directly(&mut conn, &ctx, &lead_id, &input).map(|_| "refund_recorded")
        }
        Err(rejection) => Err(rejection.into()),
    };
    redirect_outcome(&base, result)
}

/// GET /finance/transactions
/// Filtered ledger listing with in/out totals over the same filter.
pub async fn list_transactions(
    State(state): State<AppState>,
    Query(filters): Query<TransactionFilters>,
) -> Result<Json<TransactionList>> {
    let conn = state.db.get()?;
    Ok(Json(TransactionList {
        transactions: queries::list_transactions(&conn, &filters)?,
        totals: queries::ledger_totals(&conn, &filters)?,
    }))
}

/// POST /finance/transactions
pub async fn create_transaction(
    State(state): State<AppState>,
    Form(form): Form<TransactionForm>,
) -> Result<Response> {
    let ctx = WorkflowContext::for_state(&state);

    let result = match form.parse(ctx.today) {
        Ok((category, input)) => {
            let conn = state.db.get()?;
            ledger::record_manual_entry(&conn, category, &input, ctx.today)
                .map(|_| "transaction_recorded")
        }
        Err(rejection) => Err(rejection.into()),
    };
    redirect_outcome("/finance/transactions", result)
}

/// GET /finance/transactions/{id}
pub async fn get_transaction(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Transaction>> {
    if !is_valid_prefixed_id(&id) {
        return Err(AppError::NotFound(msg::TRANSACTION_NOT_FOUND.into()));
    }
    let conn = state.db.get()?;
    let txn = queries::get_transaction(&conn, &id)?.or_not_found(msg::TRANSACTION_NOT_FOUND)?;
    Ok(Json(txn))
}
