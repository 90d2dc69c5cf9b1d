pub mod approval;
pub mod booking_ledger;
pub mod box_aggregator;
pub mod box_status;
pub mod local_time;
pub mod meeting_link;
pub mod reconciler;
pub mod time_slot_cache;
