use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;

use super::clock::Clock;

/// A token is not handed out once it is this close to expiry (5 minutes).
pub const REFRESH_MARGIN_SECS: i64 = 300;

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: DateTime<Utc>,
}

/// Holds the single upstream bearer token and its expiry.
///
/// Concurrent refreshes may race; whichever `store` lands last wins, and
/// either token is equally valid.
#[derive(Debug, Clone)]
pub struct TokenCache {
    clock: Arc<dyn Clock>,
    slot: Arc<Mutex<Option<CachedToken>>>,
}

impl TokenCache {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            slot: Arc::new(Mutex::new(None)),
        }
    }

    /// Cached token, if one exists and `now < expires_at - 5 min`.
    pub async fn get(&self) -> Option<String> {
        let now = self.clock.now();
        self.slot
            .lock()
            .await
            .as_ref()
            .filter(|cached| {
                cached
                    .expires_at
                    .checked_sub_signed(Duration::seconds(REFRESH_MARGIN_SECS))
                    .is_some_and(|stale_at| now < stale_at)
            })
            .map(|cached| cached.access_token.clone())
    }

    /// Record a freshly issued token valid for `lifetime` from now.
    ///
    /// Returns the expiry, or `None` (leaving the cache untouched) when it
    /// falls outside the representable date range.
    pub async fn store(&self, access_token: String, lifetime: Duration) -> Option<DateTime<Utc>> {
        let expires_at = self.clock.now().checked_add_signed(lifetime)?;
        *self.slot.lock().await = Some(CachedToken {
            access_token,
            expires_at,
        });
        Some(expires_at)
    }

    pub async fn clear(&self) {
        *self.slot.lock().await = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rapt::clock::testing::ManualClock;

    fn cache() -> (Arc<ManualClock>, TokenCache) {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let cache = TokenCache::new(clock.clone());
        (clock, cache)
    }

    #[tokio::test]
    async fn empty_cache_misses() {
        let (_, cache) = cache();
        assert!(cache.get().await.is_none());
    }

    #[tokio::test]
    async fn fresh_token_is_returned() {
        let (_, cache) = cache();
        cache.store("tok".to_owned(), Duration::hours(1)).await;
        assert_eq!(cache.get().await.as_deref(), Some("tok"));
    }

    #[tokio::test]
    async fn token_inside_refresh_margin_is_not_reused() {
        let (clock, cache) = cache();
        cache.store("tok".to_owned(), Duration::hours(1)).await;

        clock.advance(Duration::minutes(54));
        assert_eq!(cache.get().await.as_deref(), Some("tok"));

        // Exactly at expires_at - 5 min the token is already stale.
        clock.advance(Duration::minutes(1));
        assert!(cache.get().await.is_none());
    }

    #[tokio::test]
    async fn lifetime_shorter_than_margin_is_never_served() {
        let (_, cache) = cache();
        cache.store("short".to_owned(), Duration::minutes(4)).await;
        assert!(cache.get().await.is_none());
    }

    #[tokio::test]
    async fn store_overwrites_previous_token() {
        let (_, cache) = cache();
        cache.store("first".to_owned(), Duration::hours(1)).await;
        cache.store("second".to_owned(), Duration::hours(1)).await;
        assert_eq!(cache.get().await.as_deref(), Some("second"));

        cache.clear().await;
        assert!(cache.get().await.is_none());
    }

    #[tokio::test]
    async fn unrepresentable_expiry_is_not_stored() {
        let (_, cache) = cache();
        cache.store("old".to_owned(), Duration::hours(1)).await;

        assert!(cache.store("huge".to_owned(), Duration::days(1_000_000_000)).await.is_none());
        assert_eq!(cache.get().await.as_deref(), Some("old"));
    }

    #[tokio::test]
    async fn clone_shares_slot() {
        let (_, cache) = cache();
        let clone = cache.clone();
        cache.store("shared".to_owned(), Duration::hours(1)).await;
        assert_eq!(clone.get().await.as_deref(), Some("shared"));
    }
}
