//! Tiered result cache.
//!
//! * per-game memo: bounded LRU in process memory;
//! * session tier: pages of the active params, session-scoped lists and
//!   memos ([`MemoryStore`]);
//! * durable tier: reference lists and long-lived memos ([`SqliteStore`]).

pub mod known_list;
pub mod memory;
pub mod sqlite;

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lru::LruCache;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::core::{Game, Page};
use crate::error::Result;

pub use known_list::{KnownList, ListChunk};
pub use memory::MemoryStore;
pub use sqlite::{SqliteStore, StoreStats};

/// Session key recording which params key the stored pages belong to
const ACTIVE_PAGE_KEY: &str = "page_key";
const PAGE_PREFIX: &str = "page:";

/// JSON key/value storage tier
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Overwrite `key` (last writer wins)
    async fn set(&self, key: &str, value: &Value) -> Result<()>;

    /// Returns whether the key existed
    async fn remove(&self, key: &str) -> Result<bool>;

    /// Remove every key starting with `prefix`, returning how many went
    async fn remove_prefix(&self, prefix: &str) -> Result<u64>;

    /// All keys, sorted
    async fn keys(&self) -> Result<Vec<String>>;

    async fn clear(&self) -> Result<()>;

    /// Store name (for logging)
    fn name(&self) -> &str;
}

/// Which store a value lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreTier {
    /// Discarded with the session
    Session,
    /// Survives restarts
    Durable,
}

impl fmt::Display for StoreTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreTier::Session => write!(f, "session"),
            StoreTier::Durable => write!(f, "durable"),
        }
    }
}

/// Memoized game with its freshness marker
#[derive(Debug, Clone)]
pub struct CachedGame {
    pub game: Game,
    pub fetched_at: DateTime<Utc>,
}

/// Tiered cache in front of the catalog API.
///
/// Store failures never fail a lookup: they are logged and read as misses.
pub struct ResultCache {
    games: Mutex<LruCache<i64, CachedGame>>,
    session: Arc<dyn KeyValueStore>,
    durable: Arc<dyn KeyValueStore>,
    growth_locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl ResultCache {
    pub fn new(
        game_capacity: usize,
        session: Arc<dyn KeyValueStore>,
        durable: Arc<dyn KeyValueStore>,
    ) -> Self {
        let capacity = NonZeroUsize::new(game_capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            games: Mutex::new(LruCache::new(capacity)),
            session,
            durable,
            growth_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Both tiers in memory; nothing outlives the process
    pub fn in_memory(game_capacity: usize) -> Self {
        Self::new(
            game_capacity,
            Arc::new(MemoryStore::new()),
            Arc::new(MemoryStore::new()),
        )
    }

    /// Session tier in memory, durable tier in the SQLite file at `db_path`
    pub async fn with_sqlite(game_capacity: usize, db_path: &str) -> Result<Self> {
        let durable = SqliteStore::new(db_path).await?;
        Ok(Self::new(
            game_capacity,
            Arc::new(MemoryStore::new()),
            Arc::new(durable),
        ))
    }

    pub fn store(&self, tier: StoreTier) -> &Arc<dyn KeyValueStore> {
        match tier {
            StoreTier::Session => &self.session,
            StoreTier::Durable => &self.durable,
        }
    }

    fn games(&self) -> MutexGuard<'_, LruCache<i64, CachedGame>> {
        self.games.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // Per-game memo

    pub fn get_game(&self, id: i64) -> Option<Game> {
        self.get_cached_game(id).map(|cached| cached.game)
    }

    pub fn get_cached_game(&self, id: i64) -> Option<CachedGame> {
        let cached = self.games().get(&id).cloned();
        debug!("Game memo {} for {}", if cached.is_some() { "hit" } else { "miss" }, id);
        cached
    }

    /// Memoize `game` under its catalog id; records without a positive id
    /// are skipped. Returns whether the game was stored.
    pub fn put_game(&self, game: &Game) -> bool {
        let Some(id) = game.id() else {
            warn!("Not caching game without a valid id: {:?}", game.name);
            return false;
        };

        self.games().put(
            id,
            CachedGame {
                game: game.clone(),
                fetched_at: Utc::now(),
            },
        );
        true
    }

    pub fn put_games(&self, games: &[Game]) -> usize {
        games.iter().filter(|game| self.put_game(game)).count()
    }

    /// Every memoized game, most recently used first
    pub fn all_games(&self) -> Vec<Game> {
        self.games().iter().map(|(_, cached)| cached.game.clone()).collect()
    }

    pub fn game_count(&self) -> usize {
        self.games().len()
    }

    pub fn clear_games(&self) {
        self.games().clear();
    }

    // Typed access to the stores

    /// Decoded value at `key`; store or decode failures read as a miss
    pub async fn get_value<T: DeserializeOwned>(&self, tier: StoreTier, key: &str) -> Option<T> {
        let store = self.store(tier);
        match store.get(key).await {
            Ok(Some(value)) => match serde_json::from_value(value) {
                Ok(decoded) => Some(decoded),
                Err(e) => {
                    warn!("Discarding undecodable {} entry {}: {}", tier, key, e);
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!("{} store read failed for {}: {}", store.name(), key, e);
                None
            }
        }
    }

    /// Write `value` at `key`; returns whether it was stored
    pub async fn set_value<T: Serialize + ?Sized>(&self, tier: StoreTier, key: &str, value: &T) -> bool {
        let store = self.store(tier);
        let result = match serde_json::to_value(value) {
            Ok(json) => store.set(key, &json).await,
            Err(e) => Err(e.into()),
        };

        match result {
            Ok(()) => true,
            Err(e) => {
                warn!("{} store write failed for {}: {}", store.name(), key, e);
                false
            }
        }
    }

    pub async fn remove_value(&self, tier: StoreTier, key: &str) -> bool {
        let store = self.store(tier);
        store.remove(key).await.unwrap_or_else(|e| {
            warn!("{} store remove failed for {}: {}", store.name(), key, e);
            false
        })
    }

    // Page memo

    fn page_entry(key: &str, page: u32) -> String {
        format!("{PAGE_PREFIX}{page}:{key}")
    }

    /// Cached page `page` of the listing identified by `key`
    pub async fn get_page(&self, key: &str, page: u32) -> Option<Page> {
        let active: Option<String> = self.get_value(StoreTier::Session, ACTIVE_PAGE_KEY).await;
        if active.as_deref() != Some(key) {
            debug!("Page memo miss for page {} of {:?} (inactive key)", page, key);
            return None;
        }

        let cached = self.get_value(StoreTier::Session, &Self::page_entry(key, page)).await;
        debug!(
            "Page memo {} for page {} of {:?}",
            if cached.is_some() { "hit" } else { "miss" },
            page,
            key
        );
        cached
    }

    /// Store a page. Storing under a new key drops every page of the
    /// previous one, so only the active params are ever cached.
    pub async fn put_page(&self, key: &str, page: u32, value: &Page) {
        let active: Option<String> = self.get_value(StoreTier::Session, ACTIVE_PAGE_KEY).await;
        if active.as_deref() != Some(key) {
            self.invalidate_pages().await;
            self.set_value(StoreTier::Session, ACTIVE_PAGE_KEY, key).await;
        }
        self.set_value(StoreTier::Session, &Self::page_entry(key, page), value)
            .await;
    }

    pub async fn invalidate_pages(&self) {
        match self.session.remove_prefix(PAGE_PREFIX).await {
            Ok(0) => {}
            Ok(removed) => debug!("Dropped {} cached pages", removed),
            Err(e) => warn!("Failed to drop cached pages: {}", e),
        }
        self.remove_value(StoreTier::Session, ACTIVE_PAGE_KEY).await;
    }

    // Known lists

    fn list_entry(name: &str) -> String {
        format!("list:{name}")
    }

    /// Currently known prefix of list `name`
    pub async fn known_list<T: DeserializeOwned>(&self, tier: StoreTier, name: &str) -> KnownList<T> {
        self.get_value(tier, &Self::list_entry(name))
            .await
            .unwrap_or_default()
    }

    pub async fn reset_known_list(&self, tier: StoreTier, name: &str) {
        self.remove_value(tier, &Self::list_entry(name)).await;
    }

    fn growth_lock(&self, tier: StoreTier, name: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.growth_locks.lock().unwrap_or_else(PoisonError::into_inner);
        locks.entry(format!("{tier}:{name}")).or_default().clone()
    }

    /// Serve `[start, end)` of list `name`, fetching pages with `fetch`
    /// until the slice is covered or the backend runs out.
    ///
    /// Growth of one list is serialized: a caller that had to wait re-reads
    /// the list and only fetches what is still missing. The list is
    /// persisted after every page, so a failure keeps earlier progress.
    pub async fn grow_known_list<T, F, Fut>(
        &self,
        tier: StoreTier,
        name: &str,
        start: usize,
        end: usize,
        mut fetch: F,
    ) -> Result<Vec<T>>
    where
        T: Serialize + DeserializeOwned + Clone + Send,
        F: FnMut(u32) -> Fut + Send,
        Fut: Future<Output = Result<ListChunk<T>>> + Send,
    {
        let list: KnownList<T> = self.known_list(tier, name).await;
        if list.covers(end) {
            return Ok(list.slice(start, end));
        }

        let lock = self.growth_lock(tier, name);
        let _guard = lock.lock().await;

        let mut list: KnownList<T> = self.known_list(tier, name).await;
        while !list.covers(end) {
            let page = list.next_page;
            let chunk = fetch(page).await?;
            let received = chunk.items.len();
            list.absorb(page, chunk);

            info!(
                "Known list {:?} page {}: +{} items, {} known{}",
                name,
                page,
                received,
                list.len(),
                if list.exhausted { " (exhausted)" } else { "" }
            );

            self.set_value(tier, &Self::list_entry(name), &list).await;
        }

        Ok(list.slice(start, end))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn page_of(ids: &[i64]) -> Page {
        Page {
            games: ids.iter().map(|id| Game::new(*id, format!("Game {id}"))).collect(),
            total: ids.len() as u64,
            has_next: false,
            has_prev: false,
            page_number: 1,
            user_not_found: false,
        }
    }

    #[test]
    fn test_game_memo() {
        let cache = ResultCache::in_memory(2);
        assert!(cache.put_game(&Game::new(1, "One")));
        assert!(cache.put_game(&Game::new(2, "Two")));
        assert!(!cache.put_game(&Game::new(0, "Zero")));
        assert!(!cache.put_game(&Game::default()));

        assert_eq!(cache.get_game(1).map(|g| g.name), Some("One".to_string()));

        // 2 is now least recently used
        cache.put_game(&Game::new(3, "Three"));
        assert!(cache.get_game(2).is_none());
        assert_eq!(cache.game_count(), 2);

        let ids: Vec<_> = cache.all_games().iter().filter_map(Game::id).collect();
        assert_eq!(ids, vec![3, 1]);
        assert!(cache.get_cached_game(3).unwrap().fetched_at <= Utc::now());
    }

    #[tokio::test]
    async fn test_page_memo_follows_active_key() {
        let cache = ResultCache::in_memory(16);
        cache.put_page("playerCount=4", 1, &page_of(&[1, 2])).await;
        cache.put_page("playerCount=4", 2, &page_of(&[3])).await;

        assert_eq!(cache.get_page("playerCount=4", 2).await, Some(page_of(&[3])));
        assert_eq!(cache.get_page("playerCount=4", 3).await, None);
        assert_eq!(cache.get_page("playerCount=5", 1).await, None);

        // New params drop the old pages
        cache.put_page("playerCount=5", 1, &page_of(&[9])).await;
        assert_eq!(cache.get_page("playerCount=4", 1).await, None);
        assert!(cache.get_page("playerCount=5", 1).await.is_some());

        let keys = cache.store(StoreTier::Session).keys().await.unwrap();
        assert_eq!(keys, vec!["page:1:playerCount=5", "page_key"]);
    }

    #[tokio::test]
    async fn test_undecodable_entry_is_a_miss() {
        let cache = ResultCache::in_memory(16);
        cache
            .store(StoreTier::Durable)
            .set("list:designer", &serde_json::json!("garbage"))
            .await
            .unwrap();

        let list: KnownList<i64> = cache.known_list(StoreTier::Durable, "designer").await;
        assert!(list.is_empty());
        assert_eq!(list.next_page, 1);
    }

    #[tokio::test]
    async fn test_grow_known_list() {
        let cache = ResultCache::in_memory(16);
        let calls = AtomicU32::new(0);

        let fetch = |page: u32| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move {
                let base = (page as i64 - 1) * 3;
                Ok::<_, crate::error::ClientError>(ListChunk::new(
                    vec![base + 1, base + 2, base + 3],
                    page < 3,
                ))
            }
        };

        let slice = cache
            .grow_known_list(StoreTier::Durable, "numbers", 0, 5, fetch)
            .await
            .unwrap();
        assert_eq!(slice, vec![1, 2, 3, 4, 5]);
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        // Covered: no fetch
        let slice = cache
            .grow_known_list(StoreTier::Durable, "numbers", 4, 6, fetch)
            .await
            .unwrap();
        assert_eq!(slice, vec![5, 6]);
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        // Past the end: one more page, then exhausted
        let slice = cache
            .grow_known_list(StoreTier::Durable, "numbers", 7, 20, fetch)
            .await
            .unwrap();
        assert_eq!(slice, vec![8, 9]);
        assert_eq!(calls.load(Ordering::SeqCst), 3);

        let list: KnownList<i64> = cache.known_list(StoreTier::Durable, "numbers").await;
        assert!(list.exhausted);
        let slice = cache
            .grow_known_list(StoreTier::Durable, "numbers", 0, 50, fetch)
            .await
            .unwrap();
        assert_eq!(slice.len(), 9);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_grow_failure_keeps_progress() {
        let cache = ResultCache::in_memory(16);

        let result = cache
            .grow_known_list(StoreTier::Session, "flaky", 0, 10, |page: u32| async move {
                if page == 1 {
                    Ok(ListChunk::new(vec![1, 2], true))
                } else {
                    Err(crate::error::ClientError::Other("boom".to_string()))
                }
            })
            .await;
        assert!(result.is_err());

        let list: KnownList<i64> = cache.known_list(StoreTier::Session, "flaky").await;
        assert_eq!(list.items, vec![1, 2]);
        assert_eq!(list.next_page, 2);
    }
}
