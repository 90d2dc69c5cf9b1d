use std::sync::Arc;
use std::time::Duration;
use crate::config::Config;
use crate::domain::ports::{
    BookingRepository, ContactDirectory, MeetingProvider, Notifier, SlotRepository, TimeSlotRepository,
};
use crate::domain::services::approval::ApprovalService;
use crate::domain::services::booking_ledger::BookingLedger;
use crate::domain::services::box_aggregator::BoxAggregator;
use crate::domain::services::meeting_link::MeetingLinkResolver;
use crate::domain::services::reconciler::Reconciler;
use crate::domain::services::time_slot_cache::TimeSlotCache;

/// Storage and collaborator implementations the services are built from.
pub struct Adapters {
    pub slot_repo: Arc<dyn SlotRepository>,
    pub booking_repo: Arc<dyn BookingRepository>,
    pub time_slot_repo: Arc<dyn TimeSlotRepository>,
    pub contacts: Arc<dyn ContactDirectory>,
    pub notifier: Arc<dyn Notifier>,
    pub meeting_provider: Option<Arc<dyn MeetingProvider>>,
}

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub slot_repo: Arc<dyn SlotRepository>,
    pub booking_repo: Arc<dyn BookingRepository>,
    pub time_slots: Arc<TimeSlotCache>,
    pub ledger: Arc<BookingLedger>,
    pub boxes: Arc<BoxAggregator>,
    pub approvals: Arc<ApprovalService>,
    pub reconciler: Arc<Reconciler>,
}

impl AppState {
    pub fn new(config: Config, adapters: Adapters) -> Self {
        let time_slots = Arc::new(TimeSlotCache::new(
            adapters.time_slot_repo.clone(),
            Duration::from_secs(config.time_slot_cache_ttl_secs),
        ));

        let ledger = Arc::new(BookingLedger::new(adapters.slot_repo.clone(), adapters.booking_repo.clone()));

        let boxes = Arc::new(BoxAggregator::new(
            adapters.slot_repo.clone(),
            adapters.booking_repo.clone(),
            time_slots.clone(),
            config.timezone,
            config.scheduler.clone(),
        ));

        let approvals = Arc::new(ApprovalService::new(
            adapters.slot_repo.clone(),
            adapters.booking_repo.clone(),
            adapters.contacts.clone(),
            adapters.notifier.clone(),
            time_slots.clone(),
        ));

        let reconciler = Arc::new(Reconciler::new(
            adapters.slot_repo.clone(),
            adapters.booking_repo.clone(),
            adapters.contacts.clone(),
            approvals.clone(),
            time_slots.clone(),
            MeetingLinkResolver::new(adapters.meeting_provider.clone()),
            config.timezone,
            config.scheduler.clone(),
        ));

        Self {
            config,
            slot_repo: adapters.slot_repo,
            booking_repo: adapters.booking_repo,
            time_slots,
            ledger,
            boxes,
            approvals,
            reconciler,
        }
    }
}
