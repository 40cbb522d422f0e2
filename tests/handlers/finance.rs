//! Finance endpoints: ledger listing, manual entries, direct refunds

#[path = "../common/mod.rs"]
mod common;

use axum::http::StatusCode;
use common::*;

#[tokio::test]
async fn test_manual_entry_and_filtered_listing() {
    let db = TestDb::new();
    let app = test_app(&db);

    let response = post_form(
        &app,
        "/finance/transactions",
        "category=rent&amount=4000&payment_method=bank_transfer&notes=March",
    )
    .await;
    assert_eq!(location(&response), "/finance/transactions?success=transaction_recorded");

    post_form(
        &app,
        "/finance/transactions",
        "category=other_income&amount=250&payment_method=cash",
    )
    .await;

    let (status, body) = get_json(&app, "/finance/transactions").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["transactions"].as_array().unwrap().len(), 2);
    assert_eq!(body["totals"]["total_in"], 250);
    assert_eq!(body["totals"]["total_out"], 4000);
    assert_eq!(body["totals"]["net"], -3750);

    let (_, body) = get_json(&app, "/finance/transactions?transaction_type=OUT").await;
    let rows = body["transactions"].as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["category"], "rent");

    let id = rows[0]["id"].as_str().unwrap();
    let (status, body) = get_json(&app, &format!("/finance/transactions/{}", id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["amount"], 4000);
}

#[tokio::test]
async fn test_manual_refund_category_is_rejected() {
    let db = TestDb::new();
    let app = test_app(&db);

    let response = post_form(
        &app,
        "/finance/transactions",
        "category=refund&amount=100&payment_method=cash",
    )
    .await;

    assert_eq!(location(&response), "/finance/transactions?error=invalid_category");
}

#[tokio::test]
async fn test_direct_refund_validation_errors() {
    let db = TestDb::new();
    let app = test_app(&db);
    let lead = {
        let mut conn = db.pool.get().unwrap();
        paid_lead(&mut conn, "01000000950", 1200)
    };
    let uri = format!("/finance/leads/{}/refunds", lead.id);
    let base = format!("/finance/leads/{}", lead.id);

    let response = post_form(&app, &uri, "amount=abc&payment_method=cash").await;
    assert_eq!(location(&response), format!("{}?error=invalid_amount", base));

    let response = post_form(&app, &uri, "amount=100&payment_method=cheque").await;
    assert_eq!(location(&response), format!("{}?error=invalid_method", base));

    let response = post_form(&app, &uri, "amount=100&payment_method=cash&transaction_date=2026-13-01").await;
    assert_eq!(location(&response), format!("{}?error=invalid_date", base));

    let response = post_form(&app, &uri, "amount=1201&payment_method=cash").await;
    assert_eq!(location(&response), format!("{}?error=amount_exceeds&max=1200", base));

    let conn = db.pool.get().unwrap();
    assert!(refunds_for(&conn, &lead.id).is_empty());
}

#[tokio::test]
async fn test_repeated_direct_refunds_are_separate_events() {
    let db = TestDb::new();
    let app = test_app(&db);
    let lead = {
        let mut conn = db.pool.get().unwrap();
        paid_lead(&mut conn, "01000000951", 1200)
    };
    let uri = format!("/finance/leads/{}/refunds", lead.id);

    post_form(&app, &uri, "amount=100&payment_method=cash").await;
    post_form(&app, &uri, "amount=100&payment_method=cash").await;

    let (_, body) = get_json(&app, &format!("/finance/transactions?category=refund&lead_id={}", lead.id)).await;
    assert_eq!(body["transactions"].as_array().unwrap().len(), 2);
    assert_eq!(body["totals"]["total_out"], 200);
}

#[tokio::test]
async fn test_lead_ledger_for_missing_lead() {
    let db = TestDb::new();
    let app = test_app(&db);

    let (status, _) = get_json(&app, "/finance/leads/en_lead_00000000000000000000000000000000").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
