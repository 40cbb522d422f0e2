//! Lead endpoints: intake, detail, action dispatch and error redirects

#[path = "../common/mod.rs"]
mod common;

use axum::http::StatusCode;
use common::*;

#[tokio::test]
async fn test_intake_duplicate_phone_redirects_with_error() {
    let db = TestDb::new();
    let app = test_app(&db);

    let response = post_form(&app, "/leads", "full_name=Hana&phone=0100+000+0900").await;
    assert!(location(&response).ends_with("?success=lead_created"));

    let response = post_form(&app, "/leads", "full_name=Other&phone=01000000900").await;
    assert_eq!(location(&response), "/leads?error=phone_exists");
}

#[tokio::test]
async fn test_intake_requires_name() {
    let db = TestDb::new();
    let app = test_app(&db);

    let response = post_form(&app, "/leads", "full_name=+&phone=01000000901").await;
    assert_eq!(location(&response), "/leads?error=name_required");
}

#[tokio::test]
async fn test_unknown_action_is_not_a_save() {
    let db = TestDb::new();
    let app = test_app(&db);
    let lead = {
        let mut conn = db.pool.get().unwrap();
        create_test_lead(&mut conn, "01000000902")
    };

    let response = post_form(
        &app,
        &format!("/leads/{}?action=mark_paid", lead.id),
        "notes=should+not+be+saved",
    )
    .await;
    assert_eq!(location(&response), format!("/leads/{}?error=unknown_action", lead.id));

    let response = post_form(&app, &format!("/leads/{}", lead.id), "notes=x").await;
    assert_eq!(location(&response), format!("/leads/{}?error=unknown_action", lead.id));

    let conn = db.pool.get().unwrap();
    assert!(reload(&conn, &lead.id).notes.is_none());
}

#[tokio::test]
async fn test_mark_ready_unpaid_reports_remaining() {
    let db = TestDb::new();
    let app = test_app(&db);
    let lead = {
        let mut conn = db.pool.get().unwrap();
        let lead = offered_lead(&mut conn, "01000000903", 3300);
        pay(&mut conn, &lead.id, 1300);
        lead
    };

    let response = post_form(
        &app,
        &format!("/leads/{}?action=mark_ready", lead.id),
        "class_days=Sun%2FWed&class_time=07%3A30",
    )
    .await;

    assert_eq!(
        location(&response),
        format!("/leads/{}?error=not_fully_paid&remaining=2000", lead.id)
    );
}

#[tokio::test]
async fn test_cancel_paid_lead_without_refund_fields() {
    let db = TestDb::new();
    let app = test_app(&db);
    let lead = {
        let mut conn = db.pool.get().unwrap();
        paid_lead(&mut conn, "01000000904", 1200)
    };

    let response = post_form(&app, &format!("/leads/{}?action=cancel", lead.id), "refund_amount=").await;

    assert_eq!(location(&response), format!("/leads/{}?error=refund_required", lead.id));
}

#[tokio::test]
async fn test_unpaid_cancel_ignores_refund_fields() {
    let db = TestDb::new();
    let app = test_app(&db);
    let (zero, junk) = {
        let mut conn = db.pool.get().unwrap();
        (
            create_test_lead(&mut conn, "01000000910"),
            create_test_lead(&mut conn, "01000000911"),
        )
    };

    // the cancel preview offers max_refund=0 for an unpaid lead
    let response = post_form(
        &app,
        &format!("/leads/{}?action=cancel", zero.id),
        "refund_amount=0&refund_method=&refund_date=&refund_notes=",
    )
    .await;
    assert_eq!(location(&response), format!("/leads/{}?success=cancelled", zero.id));

    let response = post_form(
        &app,
        &format!("/leads/{}?action=cancel", junk.id),
        "refund_amount=abc&refund_method=cheque&refund_date=soon",
    )
    .await;
    assert_eq!(location(&response), format!("/leads/{}?success=cancelled", junk.id));

    let conn = db.pool.get().unwrap();
    for lead in [&zero, &junk] {
        assert_eq!(reload(&conn, &lead.id).status, LeadStatus::Cancelled);
        assert!(queries::list_transactions_for_lead(&conn, &lead.id).unwrap().is_empty());
    }
}

#[tokio::test]
async fn test_paid_cancel_still_validates_refund_fields() {
    let db = TestDb::new();
    let app = test_app(&db);
    let lead = {
        let mut conn = db.pool.get().unwrap();
        paid_lead(&mut conn, "01000000912", 1200)
    };

    let response = post_form(
        &app,
        &format!("/leads/{}?action=cancel", lead.id),
        "refund_amount=0&refund_method=cash",
    )
    .await;

    assert_eq!(location(&response), format!("/leads/{}?error=invalid_amount", lead.id));
    let conn = db.pool.get().unwrap();
    assert_eq!(reload(&conn, &lead.id).status, LeadStatus::PaidFull);
}

#[tokio::test]
async fn test_future_refund_date_redirects_with_error() {
    let db = TestDb::new();
    let app = test_app(&db);
    let lead = {
        let mut conn = db.pool.get().unwrap();
        paid_lead(&mut conn, "01000000905", 1200)
    };
    let tomorrow = today() + chrono::Duration::days(1);

    let response = post_form(
        &app,
        &format!("/leads/{}?action=cancel", lead.id),
        &format!("refund_amount=1200&refund_method=cash&refund_date={}", tomorrow),
    )
    .await;

    assert_eq!(location(&response), format!("/leads/{}?error=future_date", lead.id));
}

#[tokio::test]
async fn test_lead_detail_and_cancel_preview() {
    let db = TestDb::new();
    let app = test_app(&db);
    let lead = {
        let mut conn = db.pool.get().unwrap();
        let lead = offered_lead(&mut conn, "01000000906", 2300);
        pay(&mut conn, &lead.id, 800);
        lead
    };

    let (status, body) = get_json(&app, &format!("/leads/{}", lead.id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["lead"]["status"], "deposit_paid");
    assert_eq!(body["offer"]["final_price"], 2300);
    assert_eq!(body["payments"].as_array().unwrap().len(), 1);
    assert_eq!(body["payment_summary"]["remaining_balance"], 1500);
    assert!(!body["history"].as_array().unwrap().is_empty());

    let (status, body) = get_json(&app, &format!("/leads/{}?action=cancel", lead.id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["refund_required"], true);
    assert_eq!(body["max_refund"], 800);
}

#[tokio::test]
async fn test_missing_lead_is_json_404() {
    let db = TestDb::new();
    let app = test_app(&db);

    let (status, body) = get_json(&app, "/leads/en_lead_00000000000000000000000000000000").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Not found");

    let (status, _) = get_json(&app, "/leads/not-an-id").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_wait_for_round_uses_next_round() {
    let db = TestDb::new();
    let app = test_app(&db);
    let lead = {
        let mut conn = db.pool.get().unwrap();
        create_test_lead(&mut conn, "01000000907")
    };

    let response = post_form(&app, &format!("/leads/{}?action=wait_for_round", lead.id), "").await;
    assert_eq!(location(&response), format!("/leads/{}?success=waiting_for_round", lead.id));

    let conn = db.pool.get().unwrap();
    let lead = reload(&conn, &lead.id);
    assert_eq!(lead.status, LeadStatus::WaitingForRound);
    assert_eq!(lead.waiting_round, Some(CURRENT_ROUND + 1));
}

#[tokio::test]
async fn test_payment_over_balance_redirects_with_max() {
    let db = TestDb::new();
    let app = test_app(&db);
    let lead = {
        let mut conn = db.pool.get().unwrap();
        offered_lead(&mut conn, "01000000908", 1200)
    };

    let response = post_form(
        &app,
        &format!("/leads/{}/payments", lead.id),
        "amount=1500&payment_method=card",
    )
    .await;

    assert_eq!(
        location(&response),
        format!("/leads/{}?error=amount_exceeds_balance&max=1200", lead.id)
    );
}

#[tokio::test]
async fn test_health() {
    let db = TestDb::new();
    let app = test_app(&db);

    let (status, body) = get_json(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}
