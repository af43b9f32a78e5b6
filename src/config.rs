use std::env;
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

use tracing::{debug, warn};

pub const DEFAULT_API_URL: &str = "https://recommend.games/api/";
pub const DEFAULT_CACHE_DB: &str = "rg-client.db";

/// Client settings
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// API root, always ending in `/`
    pub api_url: String,
    /// SQLite file of the durable tier
    pub durable_store_path: String,
    /// Games kept in the per-game memo
    pub game_cache_capacity: usize,
    pub request_timeout: Duration,
    /// Quiet period before search-as-you-type fires
    pub search_debounce: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            durable_store_path: DEFAULT_CACHE_DB.to_string(),
            game_cache_capacity: 1024,
            request_timeout: Duration::from_secs(10),
            search_debounce: Duration::from_millis(500),
        }
    }
}

impl ClientConfig {
    /// Read `RG_*` environment variables; never fails
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`ClientConfig::from_env`] over an arbitrary variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let api_url = lookup("RG_API_URL")
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| {
                debug!("RG_API_URL not set, using default: {}", defaults.api_url);
                defaults.api_url.clone()
            });

        let durable_store_path = lookup("RG_CACHE_DB").unwrap_or_else(|| {
            debug!("RG_CACHE_DB not set, using default: {}", defaults.durable_store_path);
            defaults.durable_store_path.clone()
        });

        Self {
            api_url: normalize_api_url(&api_url),
            durable_store_path,
            game_cache_capacity: try_load(
                &lookup,
                "RG_GAME_CACHE_CAPACITY",
                defaults.game_cache_capacity,
            ),
            request_timeout: Duration::from_secs(try_load(
                &lookup,
                "RG_REQUEST_TIMEOUT_SECS",
                defaults.request_timeout.as_secs(),
            )),
            search_debounce: Duration::from_millis(try_load(
                &lookup,
                "RG_SEARCH_DEBOUNCE_MS",
                defaults.search_debounce.as_millis() as u64,
            )),
        }
    }

    pub fn with_api_url(mut self, api_url: &str) -> Self {
        self.api_url = normalize_api_url(api_url);
        self
    }

    pub fn with_durable_store_path(mut self, path: impl Into<String>) -> Self {
        self.durable_store_path = path.into();
        self
    }

    /// `{api_url}{path}`
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path.trim_start_matches('/'))
    }
}

fn normalize_api_url(url: &str) -> String {
    let url = url.trim();
    if url.ends_with('/') {
        url.to_string()
    } else {
        format!("{url}/")
    }
}

fn try_load<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: FromStr + Display,
    T::Err: Display,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|e| {
            warn!("Invalid {key} value {raw:?}: {e}, using default: {default}");
            default
        }),
        None => {
            debug!("{key} not set, using default: {default}");
            default
        }
    }
}
