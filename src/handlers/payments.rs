use axum::{extract::State, response::Response};

use crate::db::AppState;
use crate::error::Result;
use crate::extractors::{Form, Path};
use crate::lifecycle::{self, WorkflowContext};

use super::forms::PaymentForm;
use super::redirect_outcome;

/// POST /leads/{id}/payments
pub async fn record_course_payment(
    State(state): State<AppState>,
    Path(lead_id): Path<String>,
    Form(form): Form<PaymentForm>,
) -> Result<Response> {
    let ctx = WorkflowContext::for_state(&state);
    let base = format!("/leads/{}", lead_id);

    let result = match form.parse(ctx.today) {
        Ok(input) => {
            let mut conn = state.db.get()?;
            lifecycle::record_course_payment(&mut conn, &ctx, &lead_id, &input)
                .map(|_| "payment_recorded")
        }
        Err(rejection) => Err(rejection.into()),
    };
    redirect_outcome(&base, result)
}

/// POST /leads/{id}/placement-test-payment
pub async fn record_placement_test_fee(
    State(state): State<AppState>,
    Path(lead_id): Path<String>,
    Form(form): Form<PaymentForm>,
) -> Result<Response> {
    let ctx = WorkflowContext::for_state(&state);
    let base = format!("/leads/{}", lead_id);

    let result = match form.parse(ctx.today) {
        Ok(input) => {
            let mut conn = state.db.get()?;
            lifecycle::record_placement_test_fee(&mut conn, &ctx, &lead_id, &input)
                .map(|_| "placement_test_recorded")
        }
        Err(rejection) => Err(rejection.into()),
    };
    redirect_outcome(&base, result)
}
