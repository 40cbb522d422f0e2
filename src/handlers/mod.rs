mod finance;
mod forms;
mod leads;
mod payments;

pub use finance::*;
pub use forms::*;
pub use leads::*;
pub use payments::*;

use axum::{
    Router,
    extract::State,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use serde::Serialize;

use crate::db::AppState;
use crate::error::{AppError, Result};
use crate::extractors::Json;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health(State(state): State<AppState>) -> Result<Json<HealthResponse>> {
    let conn = state.db.get()?;
    conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
    Ok(Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        // Leads
        .route("/leads", post(create_lead))
        .route("/leads/{id}", get(get_lead).post(lead_action))
        .route("/leads/{id}/payments", post(record_course_payment))
        .route("/leads/{id}/placement-test-payment", post(record_placement_test_fee))
        // Finance
        .route("/finance/leads/{id}", get(get_lead_ledger))
        .route("/finance/leads/{id}/refunds", post(create_refund))
        .route("/finance/transactions", get(list_transactions).post(create_transaction))
        .route("/finance/transactions/{id}", get(get_transaction))
}

/// Turn the result of a form post into the redirect the browser follows.
///
/// Success lands on `base?success=<notice>`; a business rejection on
/// `base?error=<code>[&param=value]`. Anything else stays an error response.
fn redirect_outcome(base: &str, result: Result<&'static str>) -> Result<Response> {
    match result {
        Ok(notice) => Ok(Redirect::to(&format!("{}?success={}", base, notice)).into_response()),
        Err(AppError::Rejected(rejection)) => {
            tracing::warn!("Rejected request on {}: {}", base, rejection.code());
            Ok(Redirect::to(&format!("{}?{}", base, rejection.to_query())).into_response())
        }
        Err(e) => Err(e),
    }
}
