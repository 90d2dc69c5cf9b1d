use std::sync::Arc;
use rand::Rng;
use tracing::{info, warn};
use crate::domain::ports::{MeetingProvider, MeetingRef, MeetingRequest};
use crate::error::AppError;

const FALLBACK_HOST: &str = "https://meet.google.com";

/// Pseudo conference link in the `abc-defg-hij` shape.
pub fn fallback_link() -> String {
    let mut rng = rand::thread_rng();
    let mut segment = |len: usize| -> String {
        (0..len).map(|_| rng.gen_range(b'a'..=b'z') as char).collect()
    };
    let (a, b, c) = (segment(3), segment(4), segment(3));
    format!("{}/{}-{}-{}", FALLBACK_HOST, a, b, c)
}

pub fn validate_link(link: &str) -> Result<(), AppError> {
    let trimmed = link.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation("Meeting link must not be empty".into()));
    }
    if !(trimmed.starts_with("https://") || trimmed.starts_with("http://")) {
        return Err(AppError::Validation("Meeting link must be an http(s) URL".into()));
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct ResolvedMeeting {
    pub meeting: MeetingRef,
    pub fallback: bool,
}

/// Asks the meeting collaborator for a room and falls back to a generated
/// link when it is not configured or fails. Never returns an error.
#[derive(Clone)]
pub struct MeetingLinkResolver {
    provider: Option<Arc<dyn MeetingProvider>>,
}

impl MeetingLinkResolver {
    pub fn new(provider: Option<Arc<dyn MeetingProvider>>) -> Self {
        Self { provider }
    }

    pub async fn resolve(&self, request: &MeetingRequest) -> ResolvedMeeting {
        if let Some(provider) = &self.provider {
            match provider.create_meeting(request).await {
                Ok(info) if !info.joinable_link.is_empty() => {
                    info!(event_id = %info.event_id, "Meeting created by provider");
                    return ResolvedMeeting {
                        meeting: MeetingRef { link: info.joinable_link, event_id: Some(info.event_id) },
                        fallback: false,
                    };
                }
                Ok(info) => warn!(event_id = %info.event_id, "Meeting provider returned no joinable link"),
                Err(e) => warn!(error = %e, "Meeting provider failed, using fallback link"),
            }
        }

        ResolvedMeeting {
            meeting: MeetingRef { link: fallback_link(), event_id: None },
            fallback: true,
        }
    }
}
