use std::env;
use std::str::FromStr;
use chrono::Duration;
use chrono_tz::Tz;

/// Tunables shared by box derivation and the reconciliation passes.
#[derive(Clone, Debug)]
pub struct SchedulerSettings {
    pub enabled: bool,
    pub interval_secs: u64,
    pub lookahead_min: i64,
    pub grace_min: i64,
    pub deadline_warning_hours: i64,
    pub notification_batch: i32,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: 60,
            lookahead_min: 10,
            grace_min: 60,
            deadline_warning_hours: 3,
            notification_batch: 50,
        }
    }
}

impl SchedulerSettings {
    pub fn lookahead(&self) -> Duration {
        Duration::minutes(self.lookahead_min)
    }

    pub fn grace(&self) -> Duration {
        Duration::minutes(self.grace_min)
    }

    pub fn deadline_warning(&self) -> Duration {
        Duration::hours(self.deadline_warning_hours)
    }
}

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub mail_service_url: String,
    pub mail_service_token: String,
    pub meeting_service_url: Option<String>,
    pub meeting_service_token: String,
    pub admin_api_key: String,
    pub timezone: Tz,
    pub time_slot_cache_ttl_secs: u64,
    pub scheduler: SchedulerSettings,
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = SchedulerSettings::default();
        let tz_name = env::var("OPERATING_TIMEZONE").unwrap_or_else(|_| "Asia/Kolkata".to_string());

        Self {
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            port: env::var("PORT").unwrap_or_else(|_| "3000".to_string()).parse().expect("PORT must be a number"),
            mail_service_url: env::var("MAIL_SERVICE_URL").unwrap_or_else(|_| "http://localhost:8000/api/v1/send".to_string()),
            mail_service_token: env::var("MAIL_SERVICE_TOKEN").unwrap_or_else(|_| "test-token-1".to_string()),
            meeting_service_url: env::var("MEETING_SERVICE_URL").ok().filter(|url| !url.is_empty()),
            meeting_service_token: env::var("MEETING_SERVICE_TOKEN").unwrap_or_default(),
            admin_api_key: env::var("ADMIN_API_KEY").expect("ADMIN_API_KEY must be set"),
            timezone: tz_name.parse().expect("OPERATING_TIMEZONE must be an IANA zone name"),
            time_slot_cache_ttl_secs: env_or("TIME_SLOT_CACHE_TTL_SECS", 300),
            scheduler: SchedulerSettings {
                enabled: env_or("SCHEDULER_ENABLED", defaults.enabled),
                interval_secs: env_or("SCHEDULER_INTERVAL_SECS", defaults.interval_secs),
                lookahead_min: env_or("AUTO_APPROVE_LOOKAHEAD_MIN", defaults.lookahead_min),
                grace_min: env_or("AUTO_APPROVE_GRACE_MIN", defaults.grace_min),
                deadline_warning_hours: env_or("DEADLINE_WARNING_HOURS", defaults.deadline_warning_hours),
                notification_batch: env_or("NOTIFICATION_BATCH_SIZE", defaults.notification_batch),
            },
        }
    }
}
