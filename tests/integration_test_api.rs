mod common;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use chrono::{Duration, NaiveDate, Utc};
use common::{TestApp, TestOptions, TEACHER_ID};
use serde_json::json;

fn session_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2030, 6, 3).unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let app = TestApp::new().await;
    let (status, body) = app.get("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_time_slots_are_listed() {
    let app = TestApp::new().await;
    let (status, body) = app.get("/api/v1/time-slots").await;
    assert_eq!(status, StatusCode::OK);
    let slots = body.as_array().unwrap();
    assert_eq!(slots.len(), 13);
    assert_eq!(slots[0]["label"], "08:00 - 09:00");
}

#[tokio::test]
async fn test_capacity_two_scenario_end_to_end() {
    let app = TestApp::new().await;

    let (status, slot) = app.admin_post("/api/v1/slots", Some(json!({
        "teacher_id": TEACHER_ID,
        "date": "2030-06-03",
        "time_slot_id": 3,
        "max_capacity": 2,
        "topic": "Geometry"
    }))).await;
    assert_eq!(status, StatusCode::CREATED, "{}", slot);
    let slot_id = slot["id"].as_str().unwrap().to_string();

    let book = |student: &str| json!({
        "student_id": student,
        "slot_id": slot_id,
        "payment_ref": format!("pay_{}", student),
        "amount": 50000
    });

    let (status, first) = app.post_json("/api/v1/bookings", book("student-1")).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(first["reused"], false);

    let (status, _) = app.post_json("/api/v1/bookings", book("student-2")).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app.post_json("/api/v1/bookings", book("student-3")).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "SLOT_FULL");

    let (status, repeat) = app.post_json("/api/v1/bookings", book("student-1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(repeat["reused"], true);
    assert_eq!(repeat["booking"]["id"], first["booking"]["id"]);

    let (status, boxed) = app.admin_get(&format!("/api/v1/admin/boxes/{}", slot_id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(boxed["status"], "CLOSED");
    assert_eq!(boxed["seats_taken"], 2);
    assert_eq!(boxed["current_bookings"], 2);

    let (status, outcome) = app.admin_post(
        &format!("/api/v1/admin/boxes/{}/approve", slot_id),
        Some(json!({ "meeting_link": "https://meet.google.com/xyz-abcd-efg" })),
    ).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(outcome, json!({ "approved": 2, "failed": 0, "notified": 2 }));

    let (_, outcome) = app.admin_post(&format!("/api/v1/admin/boxes/{}/approve", slot_id), None).await;
    assert_eq!(outcome["approved"], 0);
    assert_eq!(outcome["failed"], 0);

    let (_, boxed) = app.admin_get(&format!("/api/v1/admin/boxes/{}", slot_id)).await;
    assert_eq!(boxed["status"], "APPROVED");
    assert_eq!(boxed["approved_bookings"], 2);
    assert_eq!(boxed["meeting_link"], "https://meet.google.com/xyz-abcd-efg");

    let booking_id = first["booking"]["id"].as_str().unwrap();
    let (status, booking) = app.get(&format!("/api/v1/bookings/{}", booking_id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(booking["approved_by"], "admin-7");
    assert_eq!(booking["status"], "approved");
}

#[tokio::test]
async fn test_box_status_follows_deadline_distance() {
    let app = TestApp::new().await;
    let now = Utc::now();

    let relaxed = app.create_slot(session_date(), 2, 5, Some(now + Duration::minutes(210))).await;
    let urgent = app.create_slot(session_date(), 3, 5, Some(now + Duration::minutes(174))).await;
    let passed = app.create_slot(session_date(), 4, 5, Some(now - Duration::minutes(5))).await;

    let (_, body) = app.admin_get(&format!("/api/v1/admin/boxes/{}", relaxed.id)).await;
    assert_eq!(body["status"], "OPEN");
    let (_, body) = app.admin_get(&format!("/api/v1/admin/boxes/{}", urgent.id)).await;
    assert_eq!(body["status"], "PARTIAL");
    let (_, body) = app.admin_get(&format!("/api/v1/admin/boxes/{}", passed.id)).await;
    assert_eq!(body["status"], "CLOSED");
}

#[tokio::test]
async fn test_pending_boxes_lists_only_undecided_boxes() {
    let app = TestApp::new().await;
    let later = app.create_slot(session_date(), 5, 5, None).await;
    let earlier = app.create_slot(session_date(), 2, 5, None).await;
    let empty = app.create_slot(session_date(), 7, 5, None).await;

    for slot_id in [&later.id, &earlier.id] {
        let (status, _) = app.post_json("/api/v1/bookings", json!({
            "student_id": "student-1", "slot_id": slot_id, "payment_ref": "free"
        })).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = app.admin_get("/api/v1/admin/boxes/pending").await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<&str> = body.as_array().unwrap().iter().map(|b| b["slot_id"].as_str().unwrap()).collect();
    assert_eq!(ids, vec![earlier.id.as_str(), later.id.as_str()]);
    assert!(!ids.contains(&empty.id.as_str()));
    assert_eq!(body[0]["bookings"][0]["payment_status"], "free");

    app.admin_post(&format!("/api/v1/admin/boxes/{}/approve", earlier.id), Some(json!({
        "meeting_link": "https://meet.google.com/aaa-bbbb-ccc"
    }))).await;

    let (_, body) = app.admin_get("/api/v1/admin/boxes/pending").await;
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (_, body) = app.admin_get("/api/v1/admin/boxes/pending?include_approved=true").await;
    let statuses: Vec<&str> = body.as_array().unwrap().iter().map(|b| b["status"].as_str().unwrap()).collect();
    assert_eq!(statuses, vec!["APPROVED", "PARTIAL"]);
}

#[tokio::test]
async fn test_retired_time_slot_keeps_existing_boxes() {
    let app = TestApp::new().await;
    let slot = app.create_slot(session_date(), 3, 5, None).await;
    let (status, _) = app.post_json("/api/v1/bookings", json!({
        "student_id": "student-1", "slot_id": slot.id, "payment_ref": "free"
    })).await;
    assert_eq!(status, StatusCode::CREATED);

    sqlx::query("UPDATE time_slots SET is_active = 0 WHERE id = 3").execute(&app.pool).await.unwrap();
    app.state.time_slots.invalidate().await;

    let (status, body) = app.admin_get("/api/v1/admin/boxes/pending").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["slot_id"], slot.id.as_str());

    let (status, body) = app.admin_get(&format!("/api/v1/admin/boxes/{}", slot.id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["time_label"], "10:00 - 11:00");

    let (_, body) = app.get("/api/v1/time-slots").await;
    let ids: Vec<i64> = body.as_array().unwrap().iter().map(|ts| ts["id"].as_i64().unwrap()).collect();
    assert_eq!(ids.len(), 12);
    assert!(!ids.contains(&3));

    let (status, _) = app.admin_post("/api/v1/slots", Some(json!({
        "teacher_id": TEACHER_ID, "date": "2030-06-05", "time_slot_id": 3, "max_capacity": 3
    }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_admin_routes_require_key() {
    let app = TestApp::new().await;

    let (status, _) = app.get("/api/v1/admin/boxes/pending").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app.send(
        Request::builder().method("GET").uri("/api/v1/admin/boxes/pending")
            .header(header::AUTHORIZATION, "Bearer wrong-key")
            .body(Body::empty()).unwrap()
    ).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "FORBIDDEN");
}

#[tokio::test]
async fn test_auto_close_endpoint() {
    let app = TestApp::new().await;
    let expired = app.create_slot(session_date(), 3, 5, Some(Utc::now() - Duration::minutes(1))).await;
    let open = app.create_slot(session_date(), 4, 5, Some(Utc::now() + Duration::hours(5))).await;

    let (status, body) = app.admin_post("/api/v1/admin/boxes/auto-close", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["closedCount"], 1);

    let (_, body) = app.admin_post("/api/v1/admin/boxes/auto-close", None).await;
    assert_eq!(body["closedCount"], 0);

    let (_, slot) = app.get(&format!("/api/v1/slots/{}", expired.id)).await;
    assert_eq!(slot["is_available"], false);
    let (_, slot) = app.get(&format!("/api/v1/slots/{}", open.id)).await;
    assert_eq!(slot["is_available"], true);
}

#[tokio::test]
async fn test_manual_close_endpoint() {
    let app = TestApp::new().await;
    let slot = app.create_slot(session_date(), 3, 5, None).await;

    let (status, body) = app.admin_post(&format!("/api/v1/admin/boxes/{}/close", slot.id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "slot_id": slot.id, "closed": true }));

    let (status, body) = app.post_json("/api/v1/bookings", json!({
        "student_id": "student-1", "slot_id": slot.id, "payment_ref": "pay_1"
    })).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "SLOT_CLOSED");

    let (status, _) = app.admin_post("/api/v1/admin/boxes/missing/close", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_slot_creation_validation() {
    let app = TestApp::new().await;
    let slot = json!({
        "teacher_id": TEACHER_ID,
        "date": "2030-06-03",
        "time_slot_id": 3,
        "max_capacity": 4
    });

    let (status, _) = app.admin_post("/api/v1/slots", Some(slot.clone())).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app.admin_post("/api/v1/slots", Some(slot)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");

    let (status, _) = app.admin_post("/api/v1/slots", Some(json!({
        "teacher_id": TEACHER_ID, "date": "2030-06-04", "time_slot_id": 3, "max_capacity": 0
    }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.admin_post("/api/v1/slots", Some(json!({
        "teacher_id": TEACHER_ID, "date": "2030-06-04", "time_slot_id": 99, "max_capacity": 3
    }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app.get(&format!("/api/v1/teachers/{}/slots?from=2030-06-01&to=2030-06-30", TEACHER_ID)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_booking_validation_errors() {
    let app = TestApp::new().await;
    let slot = app.create_slot(session_date(), 3, 5, None).await;

    let (status, body) = app.post_json("/api/v1/bookings", json!({
        "student_id": "", "slot_id": slot.id, "payment_ref": "pay_1"
    })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let (status, body) = app.post_json("/api/v1/bookings", json!({
        "student_id": "student-1", "slot_id": "nope", "payment_ref": "pay_1"
    })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_meeting_start_respects_daylight_saving() {
    let app = TestApp::with_options(TestOptions {
        timezone: chrono_tz::Europe::Berlin,
        ..TestOptions::default()
    }).await;

    // 09:00 Berlin is UTC+1 the day before the switch and UTC+2 on the switch day.
    let winter = app.create_slot(NaiveDate::from_ymd_opt(2030, 3, 30).unwrap(), 2, 5, None).await;
    let summer = app.create_slot(NaiveDate::from_ymd_opt(2030, 3, 31).unwrap(), 2, 5, None).await;

    let (_, body) = app.admin_get(&format!("/api/v1/admin/boxes/{}", winter.id)).await;
    assert_eq!(body["meeting_start"], "2030-03-30T08:00:00Z");
    let (_, body) = app.admin_get(&format!("/api/v1/admin/boxes/{}", summer.id)).await;
    assert_eq!(body["meeting_start"], "2030-03-31T07:00:00Z");
}
