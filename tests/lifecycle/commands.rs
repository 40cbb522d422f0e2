//! Explicit lead commands and the stage classifier on save

#[path = "../common/mod.rs"]
mod common;

use common::*;
use lifecycle::{BookTest, MarkReady, MarkTested};

fn book_test() -> LeadCommand {
    LeadCommand::BookTest(BookTest {
        test_date: Some(today()),
        test_time: Some("11:00".into()),
        test_type: Some("in_person".into()),
    })
}

#[test]
fn test_intake_normalizes_phone_and_rejects_duplicates() {
    let mut conn = setup_test_db();
    let lead = lifecycle::create_lead(
        &mut conn,
        &CreateLead {
            full_name: "  Mona Adel ".into(),
            phone: "010 0000-0400".into(),
            source: Some("billboard".into()),
            notes: None,
        },
    )
    .unwrap();

    assert_eq!(lead.full_name, "Mona Adel");
    assert_eq!(lead.phone, "01000000400");
    assert_eq!(lead.source, LeadSource::Other);
    assert_eq!(lead.status, LeadStatus::LeadCreated);

    let err = lifecycle::create_lead(
        &mut conn,
        &CreateLead {
            full_name: "Someone Else".into(),
            phone: "0100-000-0400".into(),
            source: None,
            notes: None,
        },
    )
    .unwrap_err();
    assert!(matches!(err, AppError::Rejected(Rejection::PhoneExists)));
}

#[test]
fn test_book_test_requires_all_details() {
    let mut conn = setup_test_db();
    let lead = create_test_lead(&mut conn, "01000000401");

    let err = run_err(
        &mut conn,
        &lead.id,
        LeadCommand::BookTest(BookTest {
            test_date: Some(today()),
            test_time: Some("11:00".into()),
            test_type: Some("  ".into()),
        }),
    );
    assert_eq!(err, Rejection::TestDetailsRequired);
    assert_eq!(reload(&conn, &lead.id).status, LeadStatus::LeadCreated);

    let lead = run(&mut conn, &lead.id, book_test());
    assert_eq!(lead.status, LeadStatus::TestBooked);
    assert_eq!(lead.test_type.as_deref(), Some("in_person"));
}

#[test]
fn test_mark_tested_validates_level() {
    let mut conn = setup_test_db();
    let lead = create_test_lead(&mut conn, "01000000402");
    run(&mut conn, &lead.id, book_test());

    let err = run_err(
        &mut conn,
        &lead.id,
        LeadCommand::MarkTested(MarkTested {
            assigned_level: Some(9),
            test_notes: None,
        }),
    );
    assert_eq!(err, Rejection::InvalidLevel);

    let lead = run(
        &mut conn,
        &lead.id,
        LeadCommand::MarkTested(MarkTested {
            assigned_level: Some(3),
            test_notes: Some("strong reader".into()),
        }),
    );
    assert_eq!(lead.status, LeadStatus::Tested);
    assert_eq!(lead.assigned_level, Some(3));
    assert!(lead.tested_at.is_some());
}

#[test]
fn test_send_offer_prices_bundle() {
    let mut conn = setup_test_db();
    let lead = create_test_lead(&mut conn, "01000000403");

    let err = run_err(
        &mut conn,
        &lead.id,
        LeadCommand::SendOffer(SetOffer::default()),
    );
    assert_eq!(err, Rejection::OfferRequired);

    let lead = run(
        &mut conn,
        &lead.id,
        LeadCommand::SendOffer(SetOffer {
            bundle_levels: Some(3),
            discount_value: 300,
            discount_type: DiscountType::Amount,
            final_price: None,
        }),
    );
    assert_eq!(lead.status, LeadStatus::OfferSent);
    let offer = queries::get_offer(&conn, &lead.id).unwrap().unwrap();
    assert_eq!(offer.base_price, 3300);
    assert_eq!(offer.final_price, 3000);
}

#[test]
fn test_raising_price_on_paid_full_reverts_to_offer_sent() {
    let mut conn = setup_test_db();
    let lead = paid_lead(&mut conn, "01000000420", 3300);

    let lead = run(&mut conn, &lead.id, fixed_price_offer(4200));

    assert_eq!(lead.status, LeadStatus::OfferSent);
    let summary = ledger::payment_summary(&conn, &lead.id).unwrap();
    assert!(!summary.is_fully_paid);
    assert_eq!(summary.remaining_balance, 900);

    let last = queries::list_status_changes(&conn, &lead.id).unwrap().pop().unwrap();
    assert_eq!(last.from_status, Some(LeadStatus::PaidFull));
    assert_eq!(last.to_status, LeadStatus::OfferSent);
    assert_eq!(last.reason, "send_offer");

    // paying the difference brings it back
    pay(&mut conn, &lead.id, 900);
    assert_eq!(reload(&conn, &lead.id).status, LeadStatus::PaidFull);
}

#[test]
fn test_lowering_price_to_amount_paid_completes_payment() {
    let mut conn = setup_test_db();
    let lead = offered_lead(&mut conn, "01000000421", 3300);
    pay(&mut conn, &lead.id, 2300);

    let lead = run(&mut conn, &lead.id, fixed_price_offer(2300));

    assert_eq!(lead.status, LeadStatus::PaidFull);
}

#[test]
fn test_scheduled_lead_cannot_be_priced_above_paid() {
    let mut conn = setup_test_db();
    let lead = paid_lead(&mut conn, "01000000422", 3300);
    let lead = run(
        &mut conn,
        &lead.id,
        LeadCommand::MarkReady(MarkReady {
            class_days: Some("Sun/Wed".into()),
            class_time: Some("07:30".into()),
        }),
    );
    assert_eq!(lead.status, LeadStatus::ReadyToStart);

    let err = run_err(&mut conn, &lead.id, fixed_price_offer(4200));
    assert_eq!(err, Rejection::PriceAbovePaid { max: 3300 });
    assert_eq!(queries::get_offer(&conn, &lead.id).unwrap().unwrap().final_price, 3300);

    let lead = run(&mut conn, &lead.id, fixed_price_offer(3000));
    assert_eq!(lead.status, LeadStatus::ReadyToStart);
    assert!(ledger::is_fully_paid(&conn, &lead.id).unwrap());
}

#[test]
fn test_commands_never_move_backwards() {
    let mut conn = setup_test_db();
    let lead = paid_lead(&mut conn, "01000000404", 3300);
    assert_eq!(lead.status, LeadStatus::PaidFull);

    let lead = run(&mut conn, &lead.id, book_test());
    assert_eq!(lead.status, LeadStatus::PaidFull);
}

#[test]
fn test_mark_ready_requires_full_payment() {
    let mut conn = setup_test_db();
    let lead = offered_lead(&mut conn, "01000000405", 3300);
    pay(&mut conn, &lead.id, 2300);

    let err = run_err(
        &mut conn,
        &lead.id,
        LeadCommand::MarkReady(MarkReady {
            class_days: Some("Sun/Wed".into()),
            class_time: Some("07:30".into()),
        }),
    );
    assert_eq!(err, Rejection::NotFullyPaid { remaining: 1000 });

    let lead = reload(&conn, &lead.id);
    assert_eq!(lead.status, LeadStatus::DepositPaid);
    assert!(lead.class_days.is_none(), "rejected command must not write");
}

#[test]
fn test_mark_ready_schedule_checks() {
    let mut conn = setup_test_db();
    let lead = paid_lead(&mut conn, "01000000406", 3300);

    let err = run_err(&mut conn, &lead.id, LeadCommand::MarkReady(MarkReady::default()));
    assert_eq!(err, Rejection::ScheduleRequired);

    let err = run_err(
        &mut conn,
        &lead.id,
        LeadCommand::MarkReady(MarkReady {
            class_days: Some("Fri/Sat".into()),
            class_time: Some("07:30".into()),
        }),
    );
    assert_eq!(err, Rejection::InvalidSchedule);
}

#[test]
fn test_mark_ready_uses_stored_schedule() {
    let mut conn = setup_test_db();
    let lead = paid_lead(&mut conn, "01000000407", 3300);
    run(
        &mut conn,
        &lead.id,
        LeadCommand::Save(UpdateLead {
            class_days: Some("Mon/Thu".into()),
            class_time: Some("19:00".into()),
            ..Default::default()
        }),
    );

    let lead = run(&mut conn, &lead.id, LeadCommand::MarkReady(MarkReady::default()));
    assert_eq!(lead.status, LeadStatus::ReadyToStart);
}

#[test]
fn test_save_upgrades_to_furthest_supported_stage() {
    let mut conn = setup_test_db();
    let lead = paid_lead(&mut conn, "01000000408", 3300);

    let lead = run(
        &mut conn,
        &lead.id,
        LeadCommand::Save(UpdateLead {
            assigned_level: Some(2),
            class_days: Some("Sat/Tue".into()),
            class_time: Some("10:30".into()),
            ..Default::default()
        }),
    );
    assert_eq!(lead.status, LeadStatus::ReadyToStart);
}

#[test]
fn test_save_off_timetable_stops_at_schedule_assigned() {
    let mut conn = setup_test_db();
    let lead = paid_lead(&mut conn, "01000000409", 3300);

    let lead = run(
        &mut conn,
        &lead.id,
        LeadCommand::Save(UpdateLead {
            assigned_level: Some(2),
            class_days: Some("Sat/Tue".into()),
            class_time: Some("12:00".into()),
            ..Default::default()
        }),
    );
    assert_eq!(lead.status, LeadStatus::ScheduleAssigned);
}

#[test]
fn test_save_with_schedule_requires_full_payment() {
    let mut conn = setup_test_db();
    let lead = offered_lead(&mut conn, "01000000410", 3300);

    let err = run_err(
        &mut conn,
        &lead.id,
        LeadCommand::Save(UpdateLead {
            class_days: Some("Sun/Wed".into()),
            ..Default::default()
        }),
    );
    assert_eq!(err, Rejection::NotFullyPaid { remaining: 3300 });
}

#[test]
fn test_save_keeps_waiting_for_round() {
    let mut conn = setup_test_db();
    let lead = create_test_lead(&mut conn, "01000000411");
    let lead = run(&mut conn, &lead.id, LeadCommand::WaitForRound);
    assert_eq!(lead.status, LeadStatus::WaitingForRound);
    assert_eq!(lead.waiting_round, Some(CURRENT_ROUND + 1));

    let lead = run(
        &mut conn,
        &lead.id,
        LeadCommand::Save(UpdateLead {
            notes: Some("call back next month".into()),
            ..Default::default()
        }),
    );
    assert_eq!(lead.status, LeadStatus::WaitingForRound);
    assert_eq!(lead.notes.as_deref(), Some("call back next month"));
}

#[test]
fn test_cancelled_lead_only_accepts_reopen() {
    let mut conn = setup_test_db();
    let lead = create_test_lead(&mut conn, "01000000412");
    run(&mut conn, &lead.id, LeadCommand::Cancel(Default::default()));

    assert_eq!(run_err(&mut conn, &lead.id, book_test()), Rejection::LeadCancelled);
    assert_eq!(run_err(&mut conn, &lead.id, LeadCommand::WaitForRound), Rejection::LeadCancelled);

    let lead = run(&mut conn, &lead.id, LeadCommand::Reopen);
    assert_eq!(lead.status, LeadStatus::LeadCreated);
    assert!(lead.cancelled_at.is_none());
    assert_eq!(run_err(&mut conn, &lead.id, LeadCommand::Reopen), Rejection::NotCancelled);
}

#[test]
fn test_status_history_is_recorded() {
    let mut conn = setup_test_db();
    let lead = create_test_lead(&mut conn, "01000000413");
    run(&mut conn, &lead.id, book_test());
    run(&mut conn, &lead.id, fixed_price_offer(1200));

    let history = queries::list_status_changes(&conn, &lead.id).unwrap();
    let moves: Vec<_> = history.iter().map(|c| (c.from_status, c.to_status)).collect();
    assert_eq!(
        moves,
        vec![
            (None, LeadStatus::LeadCreated),
            (Some(LeadStatus::LeadCreated), LeadStatus::TestBooked),
            (Some(LeadStatus::TestBooked), LeadStatus::OfferSent),
        ]
    );
    assert_eq!(history[1].reason, "book_test");
}

#[test]
fn test_unknown_lead_is_not_found() {
    let mut conn = setup_test_db();
    let result = lifecycle::execute(&mut conn, &ctx(), "en_lead_missing", LeadCommand::Reopen);
    assert!(matches!(result, Err(AppError::NotFound(_))));
}
