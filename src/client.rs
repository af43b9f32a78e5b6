use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{debug, error, warn};

use crate::cache::{ListChunk, ResultCache, StoreTier};
use crate::config::ClientConfig;
use crate::core::{Entity, Game, ListResponse, Page};
use crate::debounce::Debouncer;
use crate::error::{ApiError, ClientError, Result};
use crate::filters::compile;
use crate::params::{CanonicalParams, ParamCodec, RawParams};
use crate::transport::{HttpTransport, ReqwestTransport};

const GAMES_ERROR: &str = "Unable to load games.";
const GAME_ERROR: &str = "Unable to load game.";
const PERSON_ERROR: &str = "Unable to load person.";
const UPDATED_AT_ERROR: &str = "Unable to retrieve last update.";

/// Session-scoped known list behind [`RecommendationClient::get_popular_games`]
pub const POPULAR_GAMES: &str = "popularGames";

const PARAMS_KEY: &str = "params";
const MODEL_UPDATED_AT_KEY: &str = "model_updated_at";
const NEWS_LAST_VISIT_KEY: &str = "news:last_visit";

/// Identifies one navigation; responses for older navigations are dropped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NavigationToken(u64);

impl NavigationToken {
    pub fn generation(&self) -> u64 {
        self.0
    }
}

/// Catalog client: compiles filters, consults the cache and calls the API.
pub struct RecommendationClient {
    transport: Arc<dyn HttpTransport>,
    cache: Arc<ResultCache>,
    config: ClientConfig,
    codec: ParamCodec,
    generation: AtomicU64,
}

impl RecommendationClient {
    pub fn new(transport: Arc<dyn HttpTransport>, cache: Arc<ResultCache>, config: ClientConfig) -> Self {
        Self {
            transport,
            cache,
            config,
            codec: ParamCodec::default(),
            generation: AtomicU64::new(0),
        }
    }

    /// reqwest transport, in-memory session tier, SQLite durable tier
    pub async fn from_config(config: ClientConfig) -> Result<Self> {
        let transport = ReqwestTransport::new(config.request_timeout)?;
        let cache = ResultCache::with_sqlite(config.game_cache_capacity, &config.durable_store_path).await?;
        tracing::info!(
            "Catalog client for {} (durable store {})",
            config.api_url,
            config.durable_store_path
        );
        Ok(Self::new(Arc::new(transport), Arc::new(cache), config))
    }

    /// Replace the codec (e.g. to pin the year bounds)
    pub fn with_codec(mut self, codec: ParamCodec) -> Self {
        self.codec = codec;
        self
    }

    pub fn cache(&self) -> &Arc<ResultCache> {
        &self.cache
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn codec(&self) -> &ParamCodec {
        &self.codec
    }

    /// Debouncer for search-as-you-type, with the configured quiet period
    pub fn search_debouncer(&self) -> Debouncer {
        Debouncer::new(self.config.search_debounce)
    }

    pub fn parse_params(&self, raw: &RawParams) -> CanonicalParams {
        self.codec.parse(raw)
    }

    pub fn serialize_params(&self, params: &CanonicalParams) -> RawParams {
        self.codec.serialize(params)
    }

    // Navigation generations

    /// Start a new navigation; every older token becomes stale
    pub fn navigate(&self) -> NavigationToken {
        NavigationToken(self.generation.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn current_generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    fn ensure_current(&self, token: Option<NavigationToken>) -> Result<()> {
        match token {
            Some(token) if token.0 != self.current_generation() => {
                debug!(
                    "Dropping response of navigation {} (current {})",
                    token.0,
                    self.current_generation()
                );
                Err(ClientError::Superseded(token.0))
            }
            _ => Ok(()),
        }
    }

    // Game listings

    /// Page `page` (1-based) of games matching `params`
    pub async fn get_games(&self, page: u32, params: &CanonicalParams) -> Result<Page> {
        self.fetch_page(page, params, None).await
    }

    /// Like [`RecommendationClient::get_games`], but the result is discarded
    /// (and not cached) if another navigation started in the meantime
    pub async fn get_games_for(
        &self,
        token: NavigationToken,
        page: u32,
        params: &CanonicalParams,
    ) -> Result<Page> {
        self.fetch_page(page, params, Some(token)).await
    }

    async fn fetch_page(
        &self,
        page: u32,
        params: &CanonicalParams,
        token: Option<NavigationToken>,
    ) -> Result<Page> {
        let page = page.max(1);
        let key = self.codec.cache_key(params);

        if let Some(cached) = self.cache.get_page(&key, page).await {
            return Ok(cached);
        }

        let result = match self.fetch_games_once(page, params, token).await {
            Err(ClientError::Api(err)) if err.is_not_found() && params.is_personalized() => {
                warn!(
                    "User(s) {:?} not found, falling back to anonymous results",
                    params.for_users
                );
                let mut fallback = self.fetch_games_once(page, &params.anonymous(), token).await?;
                fallback.user_not_found = true;
                fallback
            }
            other => other?,
        };

        self.cache.put_page(&key, page, &result).await;
        Ok(result)
    }

    async fn fetch_games_once(
        &self,
        page: u32,
        params: &CanonicalParams,
        token: Option<NavigationToken>,
    ) -> Result<Page> {
        let filters = compile(params, self.codec.bounds());
        let personalized = filters.is_personalized();
        let url = if personalized {
            self.config.endpoint("games/recommend/")
        } else {
            self.config.endpoint("games/")
        };

        let mut query = filters.to_query_pairs();
        query.push(("page".to_string(), page.to_string()));
        debug!("query parameters {:?}", query);

        let body = self.get_json(&url, &query, GAMES_ERROR).await?;
        self.ensure_current(token)?;

        let (response, games) = decode_games(body, GAMES_ERROR)?;

        // Per-user scores are not properties of the game
        if !personalized {
            self.cache.put_games(&games);
        }

        Ok(Page::from_response(&response, games, page))
    }

    /// A single game, from the memo unless `force_refresh`
    pub async fn get_game(&self, id: i64, force_refresh: bool) -> Result<Game> {
        if id <= 0 {
            return Err(ApiError::new(GAME_ERROR, None).into());
        }

        if !force_refresh {
            if let Some(game) = self.cache.get_game(id) {
                return Ok(game);
            }
        }

        let url = self.config.endpoint(&format!("games/{id}/"));
        let body = self.get_json(&url, &[], GAME_ERROR).await?;

        let game = Game::from_value(body).map_err(|e| {
            error!("Undecodable game {}: {}", id, e);
            ApiError::new(GAME_ERROR, None)
        })?;
        if game.id() != Some(id) {
            error!("Requested game {} but received {:?}", id, game.bgg_id);
            return Err(ApiError::new(GAME_ERROR, None).into());
        }

        self.cache.put_game(&game);
        Ok(game)
    }

    /// Page `page` of games similar to `id`
    pub async fn get_similar_games(&self, id: i64, page: u32) -> Result<Page> {
        let page = page.max(1);
        let url = self.config.endpoint(&format!("games/{id}/similar/"));
        let query = vec![("page".to_string(), page.to_string())];

        let body = self.get_json(&url, &query, GAMES_ERROR).await?;
        let (response, games) = decode_games(body, GAMES_ERROR)?;
        self.cache.put_games(&games);

        Ok(Page::from_response(&response, games, page))
    }

    /// Games `[start, end)` by number of ratings, compilations excluded
    pub async fn get_popular_games(&self, start: usize, end: usize) -> Result<Vec<Game>> {
        self.cache
            .grow_known_list(StoreTier::Session, POPULAR_GAMES, start, end, |page| {
                self.fetch_popular_page(page)
            })
            .await
    }

    async fn fetch_popular_page(&self, page: u32) -> Result<ListChunk<Game>> {
        let url = self.config.endpoint("games/");
        let query = vec![
            ("ordering".to_string(), "-num_votes".to_string()),
            ("compilation".to_string(), "False".to_string()),
            ("page".to_string(), page.to_string()),
        ];

        let body = self.get_json(&url, &query, GAMES_ERROR).await?;
        let (response, games) = decode_games(body, GAMES_ERROR)?;
        self.cache.put_games(&games);

        Ok(ListChunk::new(games, response.has_next()))
    }

    /// Items `[start, end)` of reference list `name` (`categories`,
    /// `mechanics`, `designers`, ...), kept in the durable tier
    pub async fn get_list(&self, name: &str, start: usize, end: usize) -> Result<Vec<Entity>> {
        self.cache
            .grow_known_list(StoreTier::Durable, name, start, end, |page| {
                self.fetch_list_page(name, page)
            })
            .await
    }

    async fn fetch_list_page(&self, name: &str, page: u32) -> Result<ListChunk<Entity>> {
        let reason = format!("Unable to load list \"{name}\".");
        let url = self.config.endpoint(&format!("{name}/"));
        let query = vec![("page".to_string(), page.to_string())];

        let body = self.get_json(&url, &query, &reason).await?;
        let response: ListResponse = serde_json::from_value(body).map_err(|e| {
            error!("Undecodable list {:?} page {}: {}", name, page, e);
            ApiError::new(reason.clone(), None)
        })?;

        // A listing without results ends the list
        let has_next = response.has_next();
        let items: Vec<Entity> = response
            .results
            .unwrap_or_default()
            .into_iter()
            .filter_map(|item| match serde_json::from_value(item) {
                Ok(entity) => Some(entity),
                Err(e) => {
                    warn!("Skipping invalid {:?} entry: {}", name, e);
                    None
                }
            })
            .collect();

        Ok(ListChunk::new(items, has_next))
    }

    // Supplementary lookups

    /// A person (designer, artist, ...), memoized in the durable tier
    pub async fn get_person(&self, id: i64, force_refresh: bool) -> Result<Entity> {
        let key = format!("persons:{id}");

        if !force_refresh {
            if let Some(person) = self.cache.get_value::<Entity>(StoreTier::Durable, &key).await {
                return Ok(person);
            }
        }

        let url = self.config.endpoint(&format!("persons/{id}/"));
        let body = self.get_json(&url, &[], PERSON_ERROR).await?;
        let person: Entity = serde_json::from_value(body).map_err(|_| ApiError::new(PERSON_ERROR, None))?;
        if person.bgg_id != Some(id) {
            error!("Requested person {} but received {:?}", id, person.bgg_id);
            return Err(ApiError::new(PERSON_ERROR, None).into());
        }

        self.cache.set_value(StoreTier::Durable, &key, &person).await;
        Ok(person)
    }

    /// Collection statistics of `user`, with `owned_pct`, `played_pct` and
    /// `rated_pct` added to the `rg_top` and `bgg_top` sections
    pub async fn get_user_stats(&self, user: &str) -> Result<Value> {
        let user = user.trim().to_lowercase();
        if user.is_empty() {
            return Err(ApiError::new("User name is required.", None).into());
        }

        let key = format!("user_stats:{user}");
        if let Some(stats) = self.cache.get_value::<Value>(StoreTier::Session, &key).await {
            return Ok(stats);
        }

        let reason = format!("Unable to load stats for \"{user}\".");
        let url = self
            .config
            .endpoint(&format!("users/{}/stats/", urlencoding::encode(&user)));
        let stats = self.get_json(&url, &[], &reason).await?;

        if is_empty_json(&stats) {
            return Err(ApiError::new(reason, None).into());
        }

        let stats = process_user_stats(stats);
        self.cache.set_value(StoreTier::Session, &key, &stats).await;
        Ok(stats)
    }

    /// When the recommendation model was last trained
    pub async fn get_model_updated_at(&self) -> Result<DateTime<Utc>> {
        if let Some(updated_at) = self
            .cache
            .get_value::<DateTime<Utc>>(StoreTier::Session, MODEL_UPDATED_AT_KEY)
            .await
        {
            return Ok(updated_at);
        }

        let url = self.config.endpoint("games/updated_at/");
        let body = self.get_json(&url, &[], UPDATED_AT_ERROR).await?;

        let updated_at = body
            .get("updated_at")
            .and_then(Value::as_str)
            .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
            .map(|dt| dt.with_timezone(&Utc))
            .ok_or_else(|| ApiError::new(UPDATED_AT_ERROR, None))?;

        self.cache
            .set_value(StoreTier::Session, MODEL_UPDATED_AT_KEY, &updated_at)
            .await;
        Ok(updated_at)
    }

    // Persisted UI state

    /// Remember the active params for the rest of the session
    pub async fn save_params(&self, params: &CanonicalParams) {
        let query = self.codec.cache_key(params);
        self.cache.set_value(StoreTier::Session, PARAMS_KEY, &query).await;
    }

    pub async fn load_params(&self) -> Option<CanonicalParams> {
        let query: String = self.cache.get_value(StoreTier::Session, PARAMS_KEY).await?;
        Some(self.codec.parse_query(&query))
    }

    /// Record a visit to the news page; `None` means now
    pub async fn set_last_news_visit(&self, at: Option<DateTime<Utc>>) -> DateTime<Utc> {
        let at = at.unwrap_or_else(Utc::now);
        self.cache
            .set_value(StoreTier::Durable, NEWS_LAST_VISIT_KEY, &at)
            .await;
        at
    }

    pub async fn last_news_visit(&self) -> Option<DateTime<Utc>> {
        self.cache
            .get_value(StoreTier::Durable, NEWS_LAST_VISIT_KEY)
            .await
    }

    /// Every game currently in the per-game memo
    pub fn all_cached_games(&self) -> Vec<Game> {
        self.cache.all_games()
    }

    async fn get_json(&self, url: &str, query: &[(String, String)], default_reason: &str) -> Result<Value> {
        self.transport.get(url, query).await.map_err(|e| {
            error!("There has been an error calling {} via {}: {}", url, self.transport.name(), e);
            ClientError::Api(ApiError::from_transport(e, default_reason))
        })
    }
}

/// Envelope plus enriched games; a body without `results` is a failure
fn decode_games(body: Value, default_reason: &str) -> Result<(ListResponse, Vec<Game>)> {
    let mut response: ListResponse = serde_json::from_value(body).map_err(|e| {
        error!("Undecodable listing: {}", e);
        ApiError::new(default_reason, None)
    })?;

    let Some(results) = response.results.take() else {
        error!("Listing without results");
        return Err(ApiError::new(default_reason, None).into());
    };

    let games = results
        .into_iter()
        .filter_map(|value| match Game::from_value(value) {
            Ok(game) => Some(game),
            Err(e) => {
                warn!("Skipping invalid game record: {}", e);
                None
            }
        })
        .collect();

    Ok((response, games))
}

fn is_empty_json(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

fn process_user_stats(mut stats: Value) -> Value {
    let updated_at_valid = stats
        .get("updated_at")
        .and_then(Value::as_str)
        .is_some_and(|raw| DateTime::parse_from_rfc3339(raw).is_ok());
    if !updated_at_valid {
        if let Some(map) = stats.as_object_mut() {
            map.insert("updated_at".to_string(), Value::Null);
        }
    }

    for site in ["rg_top", "bgg_top"] {
        let Some(section) = stats.get_mut(site).and_then(Value::as_object_mut) else {
            continue;
        };
        let total = section.get("total").and_then(Value::as_f64).unwrap_or(0.0);
        for item in ["owned", "played", "rated"] {
            let value = section.get(item).and_then(Value::as_f64).unwrap_or(0.0);
            let pct = if total > 0.0 { 100.0 * value / total } else { 0.0 };
            section.insert(format!("{item}_pct"), Value::from(pct));
        }
    }

    stats
}
