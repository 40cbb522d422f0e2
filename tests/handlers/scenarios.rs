//! End-to-end enrollment scenarios over HTTP.
//!
//! Lead with finalPrice 3300 paid in one course payment, scheduled Sun/Wed
//! 07:30, then cancelled with and without refunds.

#[path = "../common/mod.rs"]
mod common;

use axum::http::StatusCode;
use common::*;

async fn paid_lead_over_http(db: &TestDb, app: &axum::Router, phone: &str) -> String {
    let response = post_form(
        app,
        "/leads",
        &format!("full_name=Scenario+Lead&phone={}&source=referral", phone),
    )
    .await;
    let target = location(&response);
    let lead_id = target
        .strip_prefix("/leads/")
        .and_then(|rest| rest.split('?').next())
        .unwrap()
        .to_string();

    let response = post_form(
        app,
        &format!("/leads/{}?action=send_offer", lead_id),
        "bundle_levels=3&discount_value=&final_price=",
    )
    .await;
    assert_eq!(location(&response), format!("/leads/{}?success=offer_sent", lead_id));

    let response = post_form(
        app,
        &format!("/leads/{}/payments", lead_id),
        "amount=3300&payment_method=cash",
    )
    .await;
    assert_eq!(location(&response), format!("/leads/{}?success=payment_recorded", lead_id));

    let conn = db.pool.get().unwrap();
    assert_eq!(reload(&conn, &lead_id).status, LeadStatus::PaidFull);
    lead_id
}

#[tokio::test]
async fn test_scenario_mark_ready_then_cancel_with_refund() {
    let db = TestDb::new();
    let app = test_app(&db);
    let lead_id = paid_lead_over_http(&db, &app, "01000000800").await;

    // 1. fully paid, mark ready on the timetable
    {
        let conn = db.pool.get().unwrap();
        let summary = ledger::payment_summary(&conn, &lead_id).unwrap();
        assert_eq!(summary.total_course_paid, 3300);
        assert!(summary.is_fully_paid);
    }
    let response = post_form(
        &app,
        &format!("/leads/{}?action=mark_ready", lead_id),
        "class_days=Sun%2FWed&class_time=07%3A30",
    )
    .await;
    assert_eq!(location(&response), format!("/leads/{}?success=ready_to_start", lead_id));
    {
        let conn = db.pool.get().unwrap();
        assert_eq!(reload(&conn, &lead_id).status, LeadStatus::ReadyToStart);
    }

    // 2. cancel with a full cash refund dated today
    let cancel_body = format!(
        "refund_amount=3300&refund_method=cash&refund_date={}",
        today().format("%Y-%m-%d")
    );
    let response = post_form(&app, &format!("/leads/{}?action=cancel", lead_id), &cancel_body).await;
    assert_eq!(location(&response), format!("/leads/{}?success=cancelled_refunded", lead_id));
    {
        let conn = db.pool.get().unwrap();
        let refunds = refunds_for(&conn, &lead_id);
        assert_eq!(refunds.len(), 1);
        assert_eq!(refunds[0].amount, 3300);
        assert_eq!(refunds[0].transaction_type, TransactionType::Out);
        assert_eq!(reload(&conn, &lead_id).status, LeadStatus::Cancelled);
    }

    // 3. identical retry: no second refund, no error
    let response = post_form(&app, &format!("/leads/{}?action=cancel", lead_id), &cancel_body).await;
    assert_eq!(location(&response), format!("/leads/{}?success=cancelled_refunded", lead_id));
    {
        let conn = db.pool.get().unwrap();
        assert_eq!(refunds_for(&conn, &lead_id).len(), 1);
        assert_eq!(reload(&conn, &lead_id).status, LeadStatus::Cancelled);
    }
}

#[tokio::test]
async fn test_scenario_refund_above_paid_is_rejected() {
    let db = TestDb::new();
    let app = test_app(&db);
    let lead_id = paid_lead_over_http(&db, &app, "01000000801").await;

    // 4. refund larger than what was paid
    let response = post_form(
        &app,
        &format!("/leads/{}?action=cancel", lead_id),
        "refund_amount=4000&refund_method=cash",
    )
    .await;

    assert_eq!(
        location(&response),
        format!("/leads/{}?error=amount_exceeds&max=3300", lead_id)
    );
    let conn = db.pool.get().unwrap();
    assert!(refunds_for(&conn, &lead_id).is_empty());
    assert_eq!(reload(&conn, &lead_id).status, LeadStatus::PaidFull);
}

#[tokio::test]
async fn test_scenario_cancel_unpaid_lead() {
    let db = TestDb::new();
    let app = test_app(&db);
    let lead_id = {
        let mut conn = db.pool.get().unwrap();
        create_test_lead(&mut conn, "01000000802").id
    };

    // 5. nothing paid, no refund fields
    let response = post_form(&app, &format!("/leads/{}?action=cancel", lead_id), "").await;

    assert_eq!(location(&response), format!("/leads/{}?success=cancelled", lead_id));
    let conn = db.pool.get().unwrap();
    assert_eq!(reload(&conn, &lead_id).status, LeadStatus::Cancelled);
    assert!(queries::list_transactions_for_lead(&conn, &lead_id).unwrap().is_empty());
}

#[tokio::test]
async fn test_scenario_direct_refund_reverts_paid_full() {
    let db = TestDb::new();
    let app = test_app(&db);
    let lead_id = paid_lead_over_http(&db, &app, "01000000803").await;

    // 6. direct refund of 1000 on 3300
    let response = post_form(
        &app,
        &format!("/finance/leads/{}/refunds", lead_id),
        "amount=1000&payment_method=instapay",
    )
    .await;

    assert_eq!(
        location(&response),
        format!("/finance/leads/{}?success=refund_recorded", lead_id)
    );
    let (status, body) = get_json(&app, &format!("/finance/leads/{}", lead_id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["summary"]["total_course_paid"], 2300);
    assert_eq!(body["summary"]["is_fully_paid"], false);

    let conn = db.pool.get().unwrap();
    assert_eq!(reload(&conn, &lead_id).status, LeadStatus::OfferSent);
}
