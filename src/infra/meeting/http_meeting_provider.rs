use crate::domain::ports::{MeetingInfo, MeetingProvider, MeetingRequest};
use crate::error::AppError;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::error;

/// Client for the calendar service that creates conference events.
pub struct HttpMeetingProvider {
    client: Client,
    api_url: String,
    api_key: String,
}

impl HttpMeetingProvider {
    pub fn new(api_url: String, api_key: String) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| AppError::InternalWithMsg(format!("Failed to build meeting client: {}", e)))?;
        Ok(Self { client, api_url, api_key })
    }
}

#[async_trait]
impl MeetingProvider for HttpMeetingProvider {
    async fn create_meeting(&self, request: &MeetingRequest) -> Result<MeetingInfo, AppError> {
        let res = self.client.post(&self.api_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(request)
            .send()
            .await
            .map_err(|e| {
                let msg = format!("Meeting service connection error: {}", e);
                error!("{}", msg);
                AppError::Meeting(msg)
            })?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(AppError::Meeting(format!("Meeting service failed. Status: {}, Body: {}", status, text)));
        }

        res.json::<MeetingInfo>().await
            .map_err(|e| AppError::Meeting(format!("Invalid meeting service response: {}", e)))
    }
}
