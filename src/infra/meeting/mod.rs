pub mod http_meeting_provider;
