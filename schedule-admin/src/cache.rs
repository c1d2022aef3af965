use std::collections::HashMap;
use std::sync::Arc;

use schedule_core::AvailabilityMap;
use tokio::sync::RwLock;
use tokio::task;
use tokio::time::{sleep, Duration};

pub struct Config {
    pub enabled: bool,
    pub ttl: Duration,
}

/// Per-month key: the grid for `(year, month)` covers a fixed 42-day span,
/// so one fetched map serves both the month and week views.
pub type MonthKey = (i32, u32);

pub struct ScheduleCache {
    enabled: bool,
    inner: RwLock<HashMap<MonthKey, Arc<AvailabilityMap>>>,
    ttl: Duration,
}

impl ScheduleCache {
    pub fn new(config: Config) -> Arc<Self> {
        Arc::new(Self {
            enabled: config.enabled,
            ttl: config.ttl,
            inner: Default::default(),
        })
    }

    pub async fn insert(self: Arc<Self>, key: MonthKey, map: AvailabilityMap) -> Arc<AvailabilityMap> {
        let arcd = Arc::new(map);
        if !self.enabled {
            return arcd;
        }

        self.inner.write().await.insert(key, Arc::clone(&arcd));

        let self_clone = Arc::clone(&self);
        task::spawn(async move {
            sleep(self_clone.ttl).await;
            self_clone.inner.write().await.remove(&key);
        });

        arcd
    }

    pub async fn get(&self, key: &MonthKey) -> Option<Arc<AvailabilityMap>> {
        if !self.enabled {
            return None;
        }

        self.inner.read().await.get(key).map(Arc::clone)
    }

    /// Drops the cached month after a write went through upstream, so the
    /// next read reflects the edit instead of waiting out the TTL.
    pub async fn invalidate(&self, key: &MonthKey) {
        if !self.enabled {
            return;
        }

        self.inner.write().await.remove(key);
    }
}
