use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::Game;

/// Envelope of every paginated API listing
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListResponse {
    #[serde(default)]
    pub count: Option<u64>,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
    /// Missing results means the response is unusable, not empty
    #[serde(default)]
    pub results: Option<Vec<Value>>,
}

impl ListResponse {
    pub fn has_next(&self) -> bool {
        self.next.as_deref().is_some_and(|next| !next.is_empty())
    }

    pub fn has_prev(&self) -> bool {
        self.previous.as_deref().is_some_and(|prev| !prev.is_empty())
    }
}

/// One page of games as returned to callers and kept in the page cache
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub games: Vec<Game>,
    /// Total number of matches across all pages
    pub total: u64,
    pub has_next: bool,
    pub has_prev: bool,
    /// 1-based
    pub page_number: u32,
    /// The requested user was unknown and anonymous results were served
    #[serde(default)]
    pub user_not_found: bool,
}

impl Page {
    /// Assemble a page from a decoded envelope; `total` falls back to the
    /// number of games when the API omits the count
    pub fn from_response(response: &ListResponse, games: Vec<Game>, page_number: u32) -> Self {
        Self {
            total: response.count.unwrap_or(games.len() as u64),
            has_next: response.has_next(),
            has_prev: response.has_prev(),
            page_number,
            user_not_found: false,
            games,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.games.is_empty()
    }

    /// Catalog ids in page order
    pub fn game_ids(&self) -> Vec<i64> {
        self.games.iter().filter_map(Game::id).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_response() {
        let response: ListResponse = serde_json::from_value(json!({
            "count": 42,
            "next": "https://example.org/api/games/?page=3",
            "previous": "https://example.org/api/games/?page=1",
            "results": [{"bgg_id": 13}, {"bgg_id": 822}]
        }))
        .unwrap();

        let games = vec![Game::new(13, "CATAN"), Game::new(822, "Carcassonne")];
        let page = Page::from_response(&response, games, 2);
        assert_eq!(page.total, 42);
        assert!(page.has_next && page.has_prev);
        assert_eq!(page.page_number, 2);
        assert_eq!(page.game_ids(), vec![13, 822]);
        assert!(!page.user_not_found);
    }

    #[test]
    fn test_missing_fields() {
        let response: ListResponse = serde_json::from_value(json!({"next": null})).unwrap();
        assert!(response.results.is_none());
        assert!(!response.has_next());

        let page = Page::from_response(&response, vec![Game::new(1, "One")], 1);
        assert_eq!(page.total, 1);
        assert!(!page.has_prev);
    }
}
