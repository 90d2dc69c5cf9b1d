mod common;

use chrono::{Duration, NaiveDate, Utc};
use common::TestApp;
use slot_booking::domain::models::slot::{NewSlotParams, Slot};
use slot_booking::domain::services::booking_ledger::{BookingOutcome, CreateBooking};
use slot_booking::error::AppError;
use std::collections::HashSet;
use tokio::task::JoinSet;

fn request(student: &str, slot_id: &str) -> CreateBooking {
    CreateBooking {
        student_id: student.to_string(),
        slot_id: slot_id.to_string(),
        payment_ref: format!("pay_{}", student),
        amount: 50_000,
    }
}

fn future_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2030, 6, 3).unwrap()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_parallel_bookings_never_exceed_capacity() {
    let app = TestApp::new().await;
    let capacity = 5;
    let students = 12;
    let slot = app.create_slot(future_date(), 3, capacity, None).await;

    let mut set = JoinSet::new();
    for i in 1..=students {
        let ledger = app.state.ledger.clone();
        let req = request(&format!("student-{}", i), &slot.id);
        set.spawn(async move { ledger.create_booking(req, Utc::now()).await });
    }

    let mut created = 0;
    let mut full = 0;
    while let Some(res) = set.join_next().await {
        match res.unwrap() {
            Ok(BookingOutcome::Created(_)) => created += 1,
            Err(AppError::SlotFull(_)) => full += 1,
            other => panic!("Unexpected outcome: {:?}", other),
        }
    }

    assert_eq!(created, capacity);
    assert_eq!(full, students - capacity);
    assert_eq!(app.slot_counter(&slot.id).await, capacity);
    assert_eq!(app.booking_rows(&slot.id).await, capacity as i64);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_parallel_duplicate_requests_create_one_booking() {
    let app = TestApp::new().await;
    let slot = app.create_slot(future_date(), 3, 10, None).await;

    let mut set = JoinSet::new();
    for _ in 0..8 {
        let ledger = app.state.ledger.clone();
        let req = request("student-1", &slot.id);
        set.spawn(async move { ledger.create_booking(req, Utc::now()).await });
    }

    let mut ids = HashSet::new();
    let mut created = 0;
    while let Some(res) = set.join_next().await {
        let outcome = res.unwrap().expect("duplicate request must not fail");
        if !outcome.is_reused() {
            created += 1;
        }
        ids.insert(outcome.booking().id.clone());
    }

    assert_eq!(created, 1, "exactly one request should create the booking");
    assert_eq!(ids.len(), 1, "every request should see the same booking");
    assert_eq!(app.slot_counter(&slot.id).await, 1);
    assert_eq!(app.booking_rows(&slot.id).await, 1);
}

#[tokio::test]
async fn test_repeated_booking_returns_existing_row() {
    let app = TestApp::new().await;
    let slot = app.create_slot(future_date(), 3, 2, None).await;

    let first = app.state.ledger.create_booking(request("student-1", &slot.id), Utc::now()).await.unwrap();
    let second = app.state.ledger.create_booking(request("student-1", &slot.id), Utc::now()).await.unwrap();

    assert!(!first.is_reused());
    assert!(second.is_reused());
    assert_eq!(first.booking().id, second.booking().id);
    assert_eq!(app.slot_counter(&slot.id).await, 1);
}

#[tokio::test]
async fn test_unlimited_slot_accepts_everyone() {
    let app = TestApp::new().await;
    let slot = Slot::new(NewSlotParams {
        teacher_id: common::TEACHER_ID.into(),
        date: future_date(),
        time_slot_id: 4,
        max_capacity: 0,
        is_unlimited: true,
        booking_deadline: None,
        topic: None,
        description: None,
    });
    let slot = app.state.slot_repo.create(&slot).await.unwrap();

    for i in 1..=15 {
        app.state.ledger.create_booking(request(&format!("student-{}", i), &slot.id), Utc::now()).await.unwrap();
    }
    assert_eq!(app.slot_counter(&slot.id).await, 15);
}

#[tokio::test]
async fn test_closed_and_expired_slots_reject_bookings() {
    let app = TestApp::new().await;
    let now = Utc::now();

    let expired = app.create_slot(future_date(), 3, 5, Some(now - Duration::minutes(1))).await;
    let err = app.state.ledger.create_booking(request("student-1", &expired.id), now).await.unwrap_err();
    assert!(matches!(err, AppError::SlotClosed(_)), "got {:?}", err);

    let closed = app.create_slot(future_date(), 5, 5, None).await;
    app.state.approvals.close_box(&closed.id).await.unwrap();
    let err = app.state.ledger.create_booking(request("student-1", &closed.id), now).await.unwrap_err();
    assert!(matches!(err, AppError::SlotClosed(_)), "got {:?}", err);

    assert_eq!(app.slot_counter(&expired.id).await, 0);
    assert_eq!(app.slot_counter(&closed.id).await, 0);
}

#[tokio::test]
async fn test_booking_after_deadline_is_refused() {
    let app = TestApp::new().await;
    let deadline = Utc::now() + Duration::hours(1);
    let slot = app.create_slot(future_date(), 3, 5, Some(deadline)).await;

    let late = deadline + Duration::seconds(1);
    let err = app.state.ledger.create_booking(request("student-2", &slot.id), late).await.unwrap_err();
    assert!(matches!(err, AppError::SlotClosed(_)), "got {:?}", err);
    assert_eq!(app.slot_counter(&slot.id).await, 0);
}

#[tokio::test]
async fn test_unknown_slot_is_not_found() {
    let app = TestApp::new().await;
    let err = app.state.ledger.create_booking(request("student-1", "missing-slot"), Utc::now()).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)), "got {:?}", err);
}

#[tokio::test]
async fn test_free_booking_is_recorded_as_free() {
    let app = TestApp::new().await;
    let slot = app.create_slot(future_date(), 3, 5, None).await;

    let outcome = app.state.ledger.create_booking(CreateBooking {
        student_id: "student-3".into(),
        slot_id: slot.id.clone(),
        payment_ref: "free".into(),
        amount: 999,
    }, Utc::now()).await.unwrap();

    let booking = outcome.into_booking();
    assert_eq!(booking.payment_status, "free");
    assert_eq!(booking.amount, 0);
    assert_eq!(booking.approval_status, "pending");
    assert!(booking.is_pending_approval());
}
