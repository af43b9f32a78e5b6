//! # Recommend.Games Client
//!
//! Board game catalog client with:
//! - Canonical filter parameters and a lossless URL codec
//! - Filter compiler producing the catalog API wire query
//! - Tiered result cache (per-game LRU memo, session and SQLite durable tiers)
//! - Paginated and incrementally grown list fetching over a pluggable transport
//! - Async/await architecture
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use rg_client::{ClientConfig, RawParams, RecommendationClient};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = RecommendationClient::from_config(ClientConfig::from_env()).await?;
//!
//!     let params = client.parse_params(&RawParams::from_query("for=markus&playerCount=4"));
//!     let page = client.get_games(1, &params).await?;
//!
//!     for game in &page.games {
//!         println!("{} ({})", game.name, game.year.unwrap_or_default());
//!     }
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod client;
pub mod config;
pub mod core;
pub mod debounce;
pub mod error;
pub mod filters;
pub mod params;
pub mod transport;

// Re-export primary types
pub use cache::{KeyValueStore, MemoryStore, ResultCache, SqliteStore, StoreTier};
pub use client::{NavigationToken, RecommendationClient};
pub use config::ClientConfig;
pub use core::{Entity, Game, Page};
pub use debounce::Debouncer;
pub use error::{ApiError, ClientError, Result};
pub use filters::{compile, CompiledFilters, Ordering};
pub use params::{CanonicalParams, FilterUiState, ParamCodec, RawParams, YearBounds};
pub use transport::{HttpTransport, MockTransport, ReqwestTransport};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
