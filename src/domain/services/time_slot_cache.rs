use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::debug;
use crate::domain::models::time_slot::TimeSlot;
use crate::domain::ports::TimeSlotRepository;
use crate::error::AppError;

struct Snapshot {
    loaded_at: Instant,
    ordered: Vec<TimeSlot>,
    by_id: HashMap<i32, TimeSlot>,
}

/// Expiring read-through cache over the time-slot reference table.
///
/// Holds retired buckets too, since existing slots keep pointing at them.
/// Owned by whoever builds the application state; there is no global
/// instance. An unknown id forces one reload so freshly seeded buckets are
/// visible before the TTL runs out.
pub struct TimeSlotCache {
    repo: Arc<dyn TimeSlotRepository>,
    ttl: Duration,
    snapshot: RwLock<Option<Arc<Snapshot>>>,
}

impl TimeSlotCache {
    pub fn new(repo: Arc<dyn TimeSlotRepository>, ttl: Duration) -> Self {
        Self { repo, ttl, snapshot: RwLock::new(None) }
    }

    /// Buckets open for new slots.
    pub async fn active(&self) -> Result<Vec<TimeSlot>, AppError> {
        Ok(self.current().await?.ordered.iter().filter(|ts| ts.is_active).cloned().collect())
    }

    pub async fn get(&self, id: i32) -> Result<Option<TimeSlot>, AppError> {
        let snapshot = self.current().await?;
        if let Some(found) = snapshot.by_id.get(&id) {
            return Ok(Some(found.clone()));
        }
        let refreshed = self.reload().await?;
        Ok(refreshed.by_id.get(&id).cloned())
    }

    pub async fn invalidate(&self) {
        *self.snapshot.write().await = None;
    }

    async fn current(&self) -> Result<Arc<Snapshot>, AppError> {
        if let Some(snapshot) = self.snapshot.read().await.as_ref()
            && snapshot.loaded_at.elapsed() < self.ttl {
            return Ok(snapshot.clone());
        }
        self.reload().await
    }

    async fn reload(&self) -> Result<Arc<Snapshot>, AppError> {
        let mut guard = self.snapshot.write().await;
        let ordered = self.repo.list_all().await?;
        let by_id = ordered.iter().map(|ts| (ts.id, ts.clone())).collect();
        let snapshot = Arc::new(Snapshot { loaded_at: Instant::now(), ordered, by_id });
        debug!(count = snapshot.ordered.len(), "Time slot cache refreshed");
        *guard = Some(snapshot.clone());
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::NaiveTime;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingRepo {
        loads: AtomicUsize,
    }

    #[async_trait]
    impl TimeSlotRepository for CountingRepo {
        async fn list_all(&self) -> Result<Vec<TimeSlot>, AppError> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            Ok(vec![
                TimeSlot {
                    id: 1,
                    label: "09:00 - 10:00".into(),
                    start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
                    end_time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
                    sort_order: 1,
                    is_active: true,
                },
                TimeSlot {
                    id: 2,
                    label: "10:00 - 11:00".into(),
                    start_time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
                    end_time: NaiveTime::from_hms_opt(11, 0, 0).unwrap(),
                    sort_order: 2,
                    is_active: false,
                },
            ])
        }
    }

    #[tokio::test]
    async fn test_hits_within_ttl_do_not_reload() {
        let repo = Arc::new(CountingRepo { loads: AtomicUsize::new(0) });
        let cache = TimeSlotCache::new(repo.clone(), Duration::from_secs(300));

        assert_eq!(cache.active().await.unwrap().len(), 1);
        assert!(cache.get(1).await.unwrap().is_some());
        assert!(cache.get(1).await.unwrap().is_some());
        assert_eq!(repo.loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retired_bucket_resolves_by_id_but_is_not_listed() {
        let repo = Arc::new(CountingRepo { loads: AtomicUsize::new(0) });
        let cache = TimeSlotCache::new(repo.clone(), Duration::from_secs(300));

        let listed: Vec<i32> = cache.active().await.unwrap().iter().map(|ts| ts.id).collect();
        assert_eq!(listed, vec![1]);
        let retired = cache.get(2).await.unwrap().expect("retired bucket should resolve");
        assert!(!retired.is_active);
        assert_eq!(repo.loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_expired_entries_reload() {
        let repo = Arc::new(CountingRepo { loads: AtomicUsize::new(0) });
        let cache = TimeSlotCache::new(repo.clone(), Duration::ZERO);

        cache.active().await.unwrap();
        cache.active().await.unwrap();
        assert_eq!(repo.loads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_unknown_id_forces_single_reload() {
        let repo = Arc::new(CountingRepo { loads: AtomicUsize::new(0) });
        let cache = TimeSlotCache::new(repo.clone(), Duration::from_secs(300));

        cache.active().await.unwrap();
        assert!(cache.get(42).await.unwrap().is_none());
        assert_eq!(repo.loads.load(Ordering::SeqCst), 2);

        cache.invalidate().await;
        cache.get(1).await.unwrap();
        assert_eq!(repo.loads.load(Ordering::SeqCst), 3);
    }
}
