//! Translation of [`CanonicalParams`] into the catalog API's query vocabulary.
//!
//! The API speaks Django-style lookups (`__lte`, `__gte`, `__gt`,
//! `__isnull`) and takes `ordering` as a comma-joined list of fields where a
//! leading `-` means descending.

pub mod ordering;

use std::collections::BTreeMap;
use std::fmt;

use crate::params::codec::bool_string;
use crate::params::{CanonicalParams, YearBounds};
use crate::transport::QueryPairs;

pub use ordering::Ordering;

/// Wishlist priority threshold sent when excluding wishlisted games
pub const EXCLUDE_WISHLIST_PRIORITY: i64 = 5;

/// Play count threshold sent when excluding played games
pub const EXCLUDE_PLAY_COUNT: i64 = 1;

/// One wire field value
#[derive(Debug, Clone, PartialEq)]
pub enum WireValue {
    Text(String),
    Integer(i64),
    Number(f64),
    TextList(Vec<String>),
    IntegerList(Vec<i64>),
}

impl WireValue {
    /// Query-string values; lists expand to one value per element
    pub fn to_query_values(&self) -> Vec<String> {
        match self {
            WireValue::Text(s) => vec![s.clone()],
            WireValue::Integer(i) => vec![i.to_string()],
            WireValue::Number(n) => vec![n.to_string()],
            WireValue::TextList(items) => items.clone(),
            WireValue::IntegerList(items) => items.iter().map(i64::to_string).collect(),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            WireValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for WireValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_query_values().join(","))
    }
}

impl From<&str> for WireValue {
    fn from(s: &str) -> Self {
        WireValue::Text(s.to_string())
    }
}

impl From<i64> for WireValue {
    fn from(i: i64) -> Self {
        WireValue::Integer(i)
    }
}

/// Flat wire-field → value mapping, ordered by field name
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CompiledFilters {
    fields: BTreeMap<String, WireValue>,
}

impl CompiledFilters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<WireValue>) {
        self.fields.insert(field.into(), value.into());
    }

    pub fn get(&self, field: &str) -> Option<&WireValue> {
        self.fields.get(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &WireValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Routed to the recommendation endpoint (`user` or `like` present)
    pub fn is_personalized(&self) -> bool {
        self.contains("user") || self.contains("like")
    }

    /// Query pairs, list values as repeated keys
    pub fn to_query_pairs(&self) -> QueryPairs {
        self.fields
            .iter()
            .flat_map(|(field, value)| {
                value
                    .to_query_values()
                    .into_iter()
                    .map(move |v| (field.clone(), v))
            })
            .collect()
    }
}

/// Compile canonical params into wire filters.
///
/// Precedence: user targeting, else liked games, else generic ordering.
/// Recommendation modes never carry `ordering`; the recommender ranks.
/// Numeric filters and categorical pass-throughs apply in every mode.
pub fn compile(params: &CanonicalParams, bounds: &YearBounds) -> CompiledFilters {
    let mut result = CompiledFilters::new();

    if !params.for_users.is_empty() {
        result.insert("user", WireValue::TextList(params.for_users.clone()));
        if params.similarity {
            result.insert("model", "similarity");
        }
        if params.for_users.len() == 1 {
            let exclude = &params.exclude;
            result.insert("exclude_known", bool_string(exclude.rated()));
            result.insert("exclude_owned", bool_string(exclude.owned()));
            if exclude.wishlist() {
                result.insert("exclude_wishlist", EXCLUDE_WISHLIST_PRIORITY);
            }
            if exclude.played() {
                result.insert("exclude_play_count", EXCLUDE_PLAY_COUNT);
            }
            result.insert("exclude_clusters", bool_string(exclude.clusters()));
        }
    } else if !params.liked_game_ids.is_empty() {
        result.insert("like", WireValue::IntegerList(params.liked_game_ids.clone()));
    } else {
        let ordering = params.effective_ordering();
        result.insert("ordering", WireValue::Text(ordering.expression()));
        if ordering.primary_is_ascending() {
            result.insert(format!("{}__isnull", ordering.primary_key()), "False");
        }
    }

    if let Some(search) = &params.search {
        result.insert("search", WireValue::Text(search.clone()));
    }

    if let Some(count) = params.player_count {
        let suffix = count.mode.wire_suffix();
        result.insert(format!("min_players{suffix}__lte"), count.value);
        result.insert(format!("max_players{suffix}__gte"), count.value);
    }

    if let Some(time) = params.play_time {
        let field = time.mode.wire_field();
        result.insert(format!("{field}__gt"), 0_i64);
        result.insert(format!("{field}__lte"), time.value);
    }

    if let Some(age) = params.player_age {
        let suffix = age.mode.wire_suffix();
        result.insert(format!("min_age{suffix}__gt"), 0_i64);
        result.insert(format!("min_age{suffix}__lte"), age.value);
    }

    if let Some((min, max)) = params.complexity.bounds() {
        result.insert("complexity__gte", WireValue::Number(min));
        result.insert("complexity__lte", WireValue::Number(max));
    }

    if let Some((min, max)) = params.year.bounds() {
        if bounds.accepts_min(min) && bounds.accepts_max(max) {
            result.insert("year__gte", i64::from(min));
            result.insert("year__lte", i64::from(max));
        }
    }

    if let Some(cooperative) = params.cooperative {
        result.insert("cooperative", bool_string(cooperative));
    }

    let categorical = [
        ("game_type", params.game_type),
        ("category", params.category),
        ("mechanic", params.mechanic),
        ("designer", params.designer),
        ("artist", params.artist),
    ];
    for (field, id) in categorical {
        if let Some(id) = id {
            result.insert(field, id);
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{
        ExcludeFlags, ModalFilter, ParamCodec, PlayTimeMode, PlayerAgeMode, PlayerCountMode,
        RangeFilter,
    };

    fn bounds() -> YearBounds {
        YearBounds::for_year(2024)
    }

    fn compile_query(query: &str) -> CompiledFilters {
        let codec = ParamCodec::new(bounds());
        compile(&codec.parse_query(query), &bounds())
    }

    fn int(filters: &CompiledFilters, field: &str) -> Option<i64> {
        match filters.get(field) {
            Some(WireValue::Integer(i)) => Some(*i),
            _ => None,
        }
    }

    fn text<'a>(filters: &'a CompiledFilters, field: &str) -> Option<&'a str> {
        filters.get(field).and_then(WireValue::as_text)
    }

    #[test]
    fn test_single_user_exclusions() {
        let params = CanonicalParams {
            for_users: vec!["alice".to_string()],
            exclude: ExcludeFlags {
                owned: Some(false),
                ..Default::default()
            },
            ..Default::default()
        };
        let filters = compile(&params, &bounds());

        assert_eq!(filters.get("user"), Some(&WireValue::TextList(vec!["alice".to_string()])));
        assert_eq!(text(&filters, "exclude_owned"), Some("False"));
        assert_eq!(text(&filters, "exclude_known"), Some("True"));
        assert_eq!(text(&filters, "exclude_clusters"), Some("True"));
        assert!(!filters.contains("exclude_wishlist"));
        assert!(!filters.contains("exclude_play_count"));
        assert!(!filters.contains("model"));
        assert!(!filters.contains("ordering"));
        assert!(filters.is_personalized());
    }

    #[test]
    fn test_wishlist_and_played_thresholds() {
        let filters = compile_query("for=alice&excludeWishlist=True&excludePlayed=1&similarity=yes");
        assert_eq!(int(&filters, "exclude_wishlist"), Some(EXCLUDE_WISHLIST_PRIORITY));
        assert_eq!(int(&filters, "exclude_play_count"), Some(EXCLUDE_PLAY_COUNT));
        assert_eq!(text(&filters, "model"), Some("similarity"));
    }

    #[test]
    fn test_group_has_no_exclusions() {
        let filters = compile_query("for=alice,bob&excludeOwned=False");
        assert_eq!(
            filters.get("user"),
            Some(&WireValue::TextList(vec!["alice".to_string(), "bob".to_string()]))
        );
        assert!(!filters.contains("exclude_owned"));
        assert!(!filters.contains("exclude_known"));

        let pairs = filters.to_query_pairs();
        let users: Vec<&str> = pairs
            .iter()
            .filter(|(k, _)| k == "user")
            .map(|(_, v)| v.as_str())
            .collect();
        assert_eq!(users, ["alice", "bob"]);
    }

    #[test]
    fn test_liked_games_suppress_ordering() {
        let filters = compile_query("like=13,822&ordering=year");
        assert_eq!(filters.get("like"), Some(&WireValue::IntegerList(vec![13, 822])));
        assert!(!filters.contains("ordering"));
        assert!(!filters.contains("year__isnull"));
        assert!(filters.is_personalized());
    }

    #[test]
    fn test_generic_ordering_and_null_guard() {
        let filters = compile_query("");
        assert_eq!(text(&filters, "ordering"), Some("-rec_rating,-bayes_rating,-avg_rating"));
        assert!(!filters.iter().any(|(k, _)| k.ends_with("__isnull")));
        assert!(!filters.is_personalized());

        let filters = compile_query("ordering=age");
        assert_eq!(text(&filters, "ordering"), Some("min_age,-rec_rating,-bayes_rating,-avg_rating"));
        assert_eq!(text(&filters, "min_age__isnull"), Some("False"));

        let filters = compile_query("ordering=-time");
        assert!(!filters.contains("max_time__isnull"));
    }

    #[test]
    fn test_numeric_filters() {
        let params = CanonicalParams {
            player_count: Some(ModalFilter::new(4, PlayerCountMode::Best)),
            play_time: Some(ModalFilter::new(90, PlayTimeMode::Min)),
            player_age: Some(ModalFilter::new(12, PlayerAgeMode::Box)),
            complexity: RangeFilter::between(1.5, 3.0),
            year: RangeFilter::between(1990, 2020),
            ..Default::default()
        };
        let filters = compile(&params, &bounds());

        assert_eq!(int(&filters, "min_players_best__lte"), Some(4));
        assert_eq!(int(&filters, "max_players_best__gte"), Some(4));
        assert_eq!(int(&filters, "min_time__gt"), Some(0));
        assert_eq!(int(&filters, "min_time__lte"), Some(90));
        assert_eq!(int(&filters, "min_age__gt"), Some(0));
        assert_eq!(int(&filters, "min_age__lte"), Some(12));
        assert_eq!(filters.get("complexity__gte"), Some(&WireValue::Number(1.5)));
        assert_eq!(filters.get("complexity__lte"), Some(&WireValue::Number(3.0)));
        assert_eq!(int(&filters, "year__gte"), Some(1990));
        assert_eq!(int(&filters, "year__lte"), Some(2020));

        let filters = compile_query("playerCount=3&playerAge=8&playTime=45");
        assert_eq!(int(&filters, "min_players_rec__lte"), Some(3));
        assert_eq!(int(&filters, "min_age_rec__lte"), Some(8));
        assert_eq!(int(&filters, "max_time__lte"), Some(45));
    }

    #[test]
    fn test_half_ranges_are_omitted() {
        // 1950 is at or below the floor, so only the max bound survives parsing
        let filters = compile_query("yearMin=1950&yearMax=2020&complexityMin=2");
        assert!(!filters.iter().any(|(k, _)| k.starts_with("year__")));
        assert!(!filters.iter().any(|(k, _)| k.starts_with("complexity__")));

        let filters = compile_query("yearMin=2010&yearMax=2000&complexityMin=4&complexityMax=2");
        assert!(!filters.contains("year__gte") && !filters.contains("year__lte"));
        assert!(!filters.contains("complexity__gte"));

        let out_of_bounds = CanonicalParams {
            year: RangeFilter::between(1950, 2050),
            ..Default::default()
        };
        assert!(!compile(&out_of_bounds, &bounds()).contains("year__gte"));
    }

    #[test]
    fn test_categorical_pass_through() {
        let filters = compile_query(
            "cooperative=False&gameType=1&category=2&mechanic=3&designer=4&artist=5&search=%20go%20",
        );
        assert_eq!(text(&filters, "cooperative"), Some("False"));
        assert_eq!(int(&filters, "game_type"), Some(1));
        assert_eq!(int(&filters, "category"), Some(2));
        assert_eq!(int(&filters, "mechanic"), Some(3));
        assert_eq!(int(&filters, "designer"), Some(4));
        assert_eq!(int(&filters, "artist"), Some(5));
        assert_eq!(text(&filters, "search"), Some("go"));
    }

    #[test]
    fn test_personalization_never_orders() {
        for query in ["for=a&ordering=year", "for=a,b&ordering=-age", "like=1&ordering=bgg"] {
            let filters = compile_query(query);
            assert!(!filters.contains("ordering"), "{query}");
        }
    }
}
