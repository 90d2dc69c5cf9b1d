use slot_booking::{
    api::router::create_router,
    config::{Config, SchedulerSettings},
    domain::models::slot::{NewSlotParams, Slot},
    domain::ports::{MeetingInfo, MeetingProvider, MeetingRequest, Notification, Notifier, RecipientRole},
    error::AppError,
    infra::factory::{connect_sqlite, run_sqlite_migrations},
    infra::repositories::{
        sqlite_booking_repo::SqliteBookingRepo,
        sqlite_reference_repo::SqliteReferenceRepo,
        sqlite_slot_repo::SqliteSlotRepo,
    },
    state::{Adapters, AppState},
};
use sqlx::{Pool, Sqlite};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use tower::ServiceExt;
use serde_json::Value;

pub const ADMIN_KEY: &str = "test-admin-key";
pub const TEACHER_ID: &str = "teacher-1";
pub const PROVIDER_LINK: &str = "https://meet.example.com/room-1";

#[derive(Default)]
pub struct MockNotifier {
    pub sent: Mutex<Vec<Notification>>,
    pub fail: AtomicBool,
}

#[allow(dead_code)]
impl MockNotifier {
    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn student_notifications(&self) -> Vec<Notification> {
        self.sent.lock().unwrap().iter().filter(|n| n.role == RecipientRole::Student).cloned().collect()
    }

    pub fn count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl Notifier for MockNotifier {
    async fn notify(&self, notification: &Notification) -> Result<(), AppError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::Notification("mail service unavailable".into()));
        }
        self.sent.lock().unwrap().push(notification.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct MockMeetingProvider {
    pub calls: AtomicUsize,
    pub fail: AtomicBool,
}

#[async_trait]
impl MeetingProvider for MockMeetingProvider {
    async fn create_meeting(&self, _request: &MeetingRequest) -> Result<MeetingInfo, AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::Meeting("calendar quota exceeded".into()));
        }
        Ok(MeetingInfo { event_id: "evt-1".into(), joinable_link: PROVIDER_LINK.into() })
    }
}

pub struct TestOptions {
    pub timezone: Tz,
    pub meeting_provider: Option<Arc<MockMeetingProvider>>,
}

impl Default for TestOptions {
    fn default() -> Self {
        Self { timezone: chrono_tz::Asia::Kolkata, meeting_provider: None }
    }
}

#[allow(dead_code)]
pub struct TestApp {
    pub router: Router,
    pub pool: Pool<Sqlite>,
    pub db_filename: String,
    pub state: Arc<AppState>,
    pub notifier: Arc<MockNotifier>,
}

#[allow(dead_code)]
impl TestApp {
    pub async fn new() -> Self {
        Self::with_options(TestOptions::default()).await
    }

    pub async fn with_options(options: TestOptions) -> Self {
        let db_filename = format!("test_{}.db", Uuid::new_v4());
        let db_url = format!("sqlite://{}?mode=rwc", db_filename);

        let pool = connect_sqlite(&db_url).await.expect("Failed to connect to test db");
        run_sqlite_migrations(&pool).await.expect("Failed to migrate test db");

        sqlx::query("INSERT INTO users (id, name, email, role) VALUES (?, ?, ?, 'teacher')")
            .bind(TEACHER_ID).bind("Tara Teacher").bind("teacher-1@example.com")
            .execute(&pool).await.unwrap();
        for i in 1..=30 {
            sqlx::query("INSERT INTO users (id, name, email, role) VALUES (?, ?, ?, 'student')")
                .bind(format!("student-{}", i)).bind(format!("Student {}", i)).bind(format!("student-{}@example.com", i))
                .execute(&pool).await.unwrap();
        }

        let config = Config {
            database_url: db_url.clone(),
            port: 0,
            mail_service_url: "http://localhost".to_string(),
            mail_service_token: "token".to_string(),
            meeting_service_url: None,
            meeting_service_token: String::new(),
            admin_api_key: ADMIN_KEY.to_string(),
            timezone: options.timezone,
            time_slot_cache_ttl_secs: 300,
            scheduler: SchedulerSettings { enabled: false, ..SchedulerSettings::default() },
        };

        let notifier = Arc::new(MockNotifier::default());
        let reference = Arc::new(SqliteReferenceRepo::new(pool.clone()));
        let adapters = Adapters {
            slot_repo: Arc::new(SqliteSlotRepo::new(pool.clone())),
            booking_repo: Arc::new(SqliteBookingRepo::new(pool.clone())),
            time_slot_repo: reference.clone(),
            contacts: reference,
            notifier: notifier.clone(),
            meeting_provider: options.meeting_provider.map(|p| p as Arc<dyn MeetingProvider>),
        };

        let state = Arc::new(AppState::new(config, adapters));
        let router = create_router(state.clone());

        Self {
            router,
            pool,
            db_filename,
            state,
            notifier,
        }
    }

    /// Inserts a slot straight through the repository, bypassing HTTP validation.
    pub async fn create_slot(
        &self,
        date: NaiveDate,
        time_slot_id: i32,
        max_capacity: i32,
        booking_deadline: Option<DateTime<Utc>>,
    ) -> Slot {
        let slot = Slot::new(NewSlotParams {
            teacher_id: TEACHER_ID.to_string(),
            date,
            time_slot_id,
            max_capacity,
            is_unlimited: false,
            booking_deadline,
            topic: Some("Algebra".to_string()),
            description: None,
        });
        self.state.slot_repo.create(&slot).await.expect("Failed to create slot")
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
        (status, body)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Request::builder().method("GET").uri(uri).body(Body::empty()).unwrap()).await
    }

    pub async fn post_json(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(
            Request::builder().method("POST").uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())).unwrap()
        ).await
    }

    pub async fn admin_get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(
            Request::builder().method("GET").uri(uri)
                .header(header::AUTHORIZATION, format!("Bearer {}", ADMIN_KEY))
                .body(Body::empty()).unwrap()
        ).await
    }

    pub async fn admin_post(&self, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method("POST").uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {}", ADMIN_KEY))
            .header("X-Admin-Id", "admin-7");
        let request = match body {
            Some(body) => builder.header(header::CONTENT_TYPE, "application/json").body(Body::from(body.to_string())).unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.send(request).await
    }

    pub async fn slot_counter(&self, slot_id: &str) -> i32 {
        sqlx::query_scalar::<_, i32>("SELECT current_bookings FROM slots WHERE id = ?")
            .bind(slot_id).fetch_one(&self.pool).await.unwrap()
    }

    pub async fn booking_rows(&self, slot_id: &str) -> i64 {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM bookings WHERE slot_id = ?")
            .bind(slot_id).fetch_one(&self.pool).await.unwrap()
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.db_filename);
        let _ = std::fs::remove_file(format!("{}-wal", self.db_filename));
        let _ = std::fs::remove_file(format!("{}-shm", self.db_filename));
    }
}
