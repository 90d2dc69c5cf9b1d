use crate::domain::ports::{Notification, Notifier};
use crate::error::AppError;
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, error};

/// Posts approval notifications to the mail service, which owns rendering.
pub struct HttpNotifier {
    client: Client,
    api_url: String,
    api_key: String,
}

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

impl HttpNotifier {
    pub fn new(api_url: String, api_key: String) -> Result<Self, AppError> {
        Self::with_timeout(api_url, api_key, REQUEST_TIMEOUT)
    }

    pub fn with_timeout(api_url: String, api_key: String, timeout: Duration) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::InternalWithMsg(format!("Failed to build mail client: {}", e)))?;
        Ok(Self { client, api_url, api_key })
    }
}

#[derive(Serialize)]
struct NotificationPayload<'a> {
    from_alias: &'a str,
    template: &'a str,
    #[serde(flatten)]
    notification: &'a Notification,
}

#[async_trait]
impl Notifier for HttpNotifier {
    async fn notify(&self, notification: &Notification) -> Result<(), AppError> {
        let payload = NotificationPayload {
            from_alias: "default",
            template: "box_approved",
            notification,
        };

        let res = self.client.post(&self.api_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                let msg = format!("Mail service connection error: {}", e);
                error!("{}", msg);
                AppError::Notification(msg)
            })?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            let msg = format!("Mail service failed. Status: {}, Body: {}", status, text);
            error!("{}", msg);
            return Err(AppError::Notification(msg));
        }

        debug!(booking_id = %notification.booking_id, role = ?notification.role, "Notification accepted by mail service");
        Ok(())
    }
}
