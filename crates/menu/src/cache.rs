use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
    time::Duration,
};

use dashmap::DashMap;
use time::Date;
use tokio::{task::JoinHandle, time::Instant};

use crate::{
    FetchError, MenuDay, MenuSource, UnavailableReason, WeekKey, normalize_week, week_start,
};

pub const DEFAULT_TTL: Duration = Duration::from_secs(30 * 60);
pub const DEFAULT_UPSTREAM_TIMEOUT: Duration = Duration::from_secs(20);

type WeekDays = Arc<HashMap<Date, MenuDay>>;

/// One successfully fetched week. Failures are never stored.
#[derive(Debug, Clone)]
struct CacheEntry {
    fetched_at: Instant,
    days: WeekDays,
}

impl CacheEntry {
    fn is_fresh(&self, ttl: Duration) -> bool {
        self.fetched_at.elapsed() < ttl
    }
}

/// Resolves dates to menus, fetching upstream once per ISO week and keeping
/// the normalized week for a fixed time-to-live.
///
/// Concurrent misses on the same week may each reach upstream; the last one
/// to finish wins the slot.
pub struct MenuCache {
    source: Arc<dyn MenuSource>,
    ttl: Duration,
    upstream_timeout: Duration,
    weeks: DashMap<WeekKey, CacheEntry>,
}

impl MenuCache {
    pub fn new(source: Arc<dyn MenuSource>) -> Self {
        Self {
            source,
            ttl: DEFAULT_TTL,
            upstream_timeout: DEFAULT_UPSTREAM_TIMEOUT,
            weeks: DashMap::new(),
        }
    }

    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn upstream_timeout(mut self, timeout: Duration) -> Self {
        self.upstream_timeout = timeout;
        self
    }

    /// Number of weeks currently held, fresh or not.
    pub fn len(&self) -> usize {
        self.weeks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weeks.is_empty()
    }

    /// Drop entries whose time-to-live has passed.
    pub fn evict_expired(&self) {
        let ttl = self.ttl;
        self.weeks.retain(|_, entry| entry.is_fresh(ttl));
    }

    pub fn clear(&self) {
        self.weeks.clear();
    }

    /// Sweeps expired weeks once per time-to-live until the handle is aborted.
    pub fn spawn_eviction(self: &Arc<Self>) -> JoinHandle<()> {
        let cache = Arc::clone(self);
        let period = cache.ttl.max(Duration::from_secs(1));

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                interval.tick().await;

                let before = cache.len();
                cache.evict_expired();
                let evicted = before.saturating_sub(cache.len());
                if evicted > 0 {
                    tracing::debug!(evicted, "Evicted expired menu weeks");
                }
            }
        })
    }

    /// One [`MenuDay`] per input date, in input order.
    ///
    /// Never fails as a whole: an upstream failure marks every requested date
    /// of that week as [`UnavailableReason::UpstreamError`] and leaves other
    /// weeks untouched.
    pub async fn get_menus(&self, dates: &[Date]) -> Vec<MenuDay> {
        let mut seen = HashSet::new();
        let mondays = dates
            .iter()
            .map(|date| week_start(*date))
            .filter(|monday| seen.insert(*monday))
            .collect::<Vec<_>>();

        let fetched = futures::future::join_all(mondays.iter().map(|m| self.week(*m))).await;
        let weeks = mondays
            .into_iter()
            .zip(fetched)
            .collect::<HashMap<Date, Option<WeekDays>>>();

        dates
            .iter()
            .map(|date| match weeks.get(&week_start(*date)) {
                Some(Some(days)) => days.get(date).cloned().unwrap_or_else(|| {
                    MenuDay::unavailable(*date, UnavailableReason::NoMenuPublished)
                }),
                _ => MenuDay::unavailable(*date, UnavailableReason::UpstreamError),
            })
            .collect()
    }

    async fn week(&self, monday: Date) -> Option<WeekDays> {
        let key = WeekKey::from(monday);

        if let Some(entry) = self.weeks.get(&key) {
            if entry.is_fresh(self.ttl) {
                tracing::debug!(monday = %monday, "Menu cache hit");
                return Some(entry.days.clone());
            }
        }

        tracing::debug!(monday = %monday, "Menu cache miss");
        self.weeks.remove_if(&key, |_, entry| !entry.is_fresh(self.ttl));

        match self.fetch(monday).await {
            Ok(days) => {
                self.weeks.insert(
                    key,
                    CacheEntry {
                        fetched_at: Instant::now(),
                        days: days.clone(),
                    },
                );
                Some(days)
            }
            Err(err) => {
                tracing::warn!(monday = %monday, err = %err, "Failed to fetch menu week");
                None
            }
        }
    }

    async fn fetch(&self, monday: Date) -> Result<WeekDays, FetchError> {
        let days = tokio::time::timeout(self.upstream_timeout, self.source.fetch_week(monday))
            .await
            .map_err(|_| FetchError::Timeout(self.upstream_timeout))??;

        Ok(Arc::new(normalize_week(&days)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MenuStatus, UpstreamDay, resolve, ViewKind};
    use serde_json::json;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use time::macros::date;

    /// Scripted upstream: weeks listed in `failing` error out, others return a
    /// menu for every weekday except the ones in `missing`.
    #[derive(Default)]
    struct FakeSource {
        calls: AtomicUsize,
        failing: Mutex<Vec<Date>>,
        missing: Vec<Date>,
        delay: Option<Duration>,
    }

    impl FakeSource {
        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn fail(&self, monday: Date) {
            self.failing.lock().unwrap().push(monday);
        }

        fn recover(&self) {
            self.failing.lock().unwrap().clear();
        }
    }

    #[async_trait::async_trait]
    impl MenuSource for FakeSource {
        async fn fetch_week(&self, monday: Date) -> Result<Vec<UpstreamDay>, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);

            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }

            if self.failing.lock().unwrap().contains(&monday) {
                return Err(FetchError::Status(503));
            }

            Ok(resolve(ViewKind::Week, monday)
                .dates
                .into_iter()
                .filter(|d| !self.missing.contains(d))
                .map(|d| UpstreamDay {
                    date: Some(d.to_string()),
                    menu_items: Some(vec![
                        json!({"food": {"name": "Breakfast"}}),
                        json!({"food": {"name": format!("Waffles {d}")}}),
                        json!({"food": {"name": "Lunch"}}),
                        json!({"food": {"name": "Tacos"}}),
                    ]),
                })
                .collect())
        }
    }

    fn cache(source: &Arc<FakeSource>) -> MenuCache {
        MenuCache::new(source.clone()).ttl(Duration::from_secs(600))
    }

    #[tokio::test]
    async fn test_preserves_order_and_cardinality() {
        let source = Arc::new(FakeSource::default());
        let menus = cache(&source);
        let dates = vec![
            date!(2025 - 01 - 28),
            date!(2025 - 01 - 22),
            date!(2025 - 01 - 22),
            date!(2025 - 01 - 20),
        ];

        let days = menus.get_menus(&dates).await;

        assert_eq!(days.len(), dates.len());
        for (day, date) in days.iter().zip(&dates) {
            assert_eq!(day.date, *date);
            assert_eq!(day.status, MenuStatus::Ok);
        }
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn test_empty_input() {
        let source = Arc::new(FakeSource::default());
        let menus = cache(&source);

        assert!(menus.get_menus(&[]).await.is_empty());
        assert_eq!(source.calls(), 0);
    }

    #[tokio::test]
    async fn test_single_day_views_share_week_entry() {
        let source = Arc::new(FakeSource::default());
        let menus = cache(&source);

        menus.get_menus(&resolve(ViewKind::Today, date!(2025 - 01 - 22)).dates).await;
        menus.get_menus(&resolve(ViewKind::Tomorrow, date!(2025 - 01 - 22)).dates).await;
        menus.get_menus(&resolve(ViewKind::Week, date!(2025 - 01 - 24)).dates).await;

        assert_eq!(source.calls(), 1);
        assert_eq!(menus.len(), 1);
    }

    #[tokio::test]
    async fn test_missing_upstream_day_is_no_menu_published() {
        let source = Arc::new(FakeSource {
            missing: vec![date!(2025 - 01 - 20)],
            ..Default::default()
        });
        let menus = cache(&source);

        let days = menus
            .get_menus(&[date!(2025 - 01 - 20), date!(2025 - 01 - 21), date!(2025 - 01 - 25)])
            .await;

        assert_eq!(days[0].reason(), Some(&UnavailableReason::NoMenuPublished));
        assert!(days[1].is_available());
        assert_eq!(days[2].reason(), Some(&UnavailableReason::NoMenuPublished));
    }

    #[tokio::test]
    async fn test_failed_week_does_not_affect_other_weeks() {
        let source = Arc::new(FakeSource::default());
        source.fail(date!(2025 - 01 - 27));
        let menus = cache(&source);

        let days = menus
            .get_menus(&[date!(2025 - 01 - 24), date!(2025 - 01 - 27), date!(2025 - 01 - 28)])
            .await;

        assert!(days[0].is_available());
        assert_eq!(days[1].reason(), Some(&UnavailableReason::UpstreamError));
        assert_eq!(days[2].reason(), Some(&UnavailableReason::UpstreamError));
        assert_eq!(menus.len(), 1);
    }

    #[tokio::test]
    async fn test_failures_are_not_cached() {
        let source = Arc::new(FakeSource::default());
        source.fail(date!(2025 - 01 - 20));
        let menus = cache(&source);
        let week = resolve(ViewKind::Week, date!(2025 - 01 - 22)).dates;

        let days = menus.get_menus(&week).await;
        assert!(
            days.iter()
                .all(|d| d.reason() == Some(&UnavailableReason::UpstreamError))
        );
        assert!(menus.is_empty());

        source.recover();
        let days = menus.get_menus(&week).await;
        assert!(days.iter().all(MenuDay::is_available));
        assert_eq!(source.calls(), 2);

        menus.get_menus(&week).await;
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn test_expired_entries_are_refetched() {
        let source = Arc::new(FakeSource::default());
        let menus = MenuCache::new(source.clone()).ttl(Duration::ZERO);
        let dates = [date!(2025 - 01 - 22)];

        menus.get_menus(&dates).await;
        menus.get_menus(&dates).await;
        assert_eq!(source.calls(), 2);

        menus.evict_expired();
        assert!(menus.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_only_the_expired_week_is_refetched() {
        let source = Arc::new(FakeSource::default());
        let menus = MenuCache::new(source.clone()).ttl(Duration::from_secs(60));
        let old_week = date!(2025 - 01 - 22);
        let new_week = date!(2025 - 01 - 29);

        menus.get_menus(&[old_week]).await;
        tokio::time::advance(Duration::from_secs(40)).await;
        menus.get_menus(&[new_week]).await;
        assert_eq!(source.calls(), 2);

        // 70s for the first week, 30s for the second
        tokio::time::advance(Duration::from_secs(30)).await;
        let days = menus.get_menus(&[old_week, new_week]).await;

        assert!(days.iter().all(MenuDay::is_available));
        assert_eq!(source.calls(), 3);
        assert_eq!(menus.len(), 2);

        menus.get_menus(&[old_week, new_week]).await;
        assert_eq!(source.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_eviction_task_drops_untouched_weeks() {
        let source = Arc::new(FakeSource::default());
        let menus = Arc::new(MenuCache::new(source.clone()).ttl(Duration::from_secs(60)));

        menus.get_menus(&[date!(2025 - 01 - 22)]).await;
        let sweeper = menus.spawn_eviction();

        tokio::time::sleep(Duration::from_secs(30)).await;
        menus.get_menus(&[date!(2025 - 01 - 29)]).await;
        assert_eq!(menus.len(), 2);

        // Tick at 60s drops the first week only
        tokio::time::sleep(Duration::from_secs(35)).await;
        assert_eq!(menus.len(), 1);
        let days = menus.get_menus(&[date!(2025 - 01 - 29)]).await;
        assert!(days[0].is_available());
        assert_eq!(source.calls(), 2);

        // Tick at 120s drops the second
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert!(menus.is_empty());

        sweeper.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_counts_as_upstream_error() {
        let source = Arc::new(FakeSource {
            delay: Some(Duration::from_secs(60)),
            ..Default::default()
        });
        let menus = cache(&source).upstream_timeout(Duration::from_secs(5));
        let week = resolve(ViewKind::Week, date!(2025 - 01 - 22)).dates;

        let days = menus.get_menus(&week).await;

        assert_eq!(days.len(), 5);
        assert!(
            days.iter()
                .all(|d| d.reason() == Some(&UnavailableReason::UpstreamError))
        );
        assert!(menus.is_empty());

        menus.get_menus(&week).await;
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn test_clear_drops_everything() {
        let source = Arc::new(FakeSource::default());
        let menus = cache(&source);

        menus.get_menus(&[date!(2025 - 01 - 22), date!(2025 - 01 - 29)]).await;
        assert_eq!(menus.len(), 2);

        menus.clear();
        assert!(menus.is_empty());
    }
}
