//! Canonical filter parameters and their codecs.
//!
//! [`CanonicalParams`] is the single validated record of what is being asked
//! for. It is produced from untrusted input by [`ParamCodec::parse`] (route
//! or query parameters) or [`ParamCodec::from_ui_state`] (live form state)
//! and turned back into a shareable parameter bag by
//! [`ParamCodec::serialize`].

pub mod codec;
pub mod raw;
pub mod ui;

use chrono::Datelike;

use crate::filters::Ordering;

pub use codec::ParamCodec;
pub use raw::RawParams;
pub use ui::{FilterUiState, RangeSliderState, SliderState};

/// Earliest release year a year filter can start after
pub const YEAR_FLOOR: i32 = 1970;

/// Valid window for the year filter: `floor < min` and `max <= ceiling`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearBounds {
    pub floor: i32,
    pub ceiling: i32,
}

impl YearBounds {
    /// Floor 1970, ceiling next calendar year
    pub fn current() -> Self {
        Self::for_year(chrono::Utc::now().year())
    }

    /// Bounds as they would be in `year`
    pub fn for_year(year: i32) -> Self {
        Self {
            floor: YEAR_FLOOR,
            ceiling: year + 1,
        }
    }

    pub fn accepts_min(&self, year: i32) -> bool {
        year > self.floor
    }

    pub fn accepts_max(&self, year: i32) -> bool {
        year <= self.ceiling
    }
}

impl Default for YearBounds {
    fn default() -> Self {
        Self::current()
    }
}

/// A named filter mode with a documented fallback
pub trait FilterMode: Copy + Default + PartialEq + std::fmt::Debug {
    /// Raw/URL spelling
    fn as_str(&self) -> &'static str;

    /// Exact (case-sensitive) match of a raw spelling
    fn from_raw(raw: &str) -> Option<Self>;

    /// Unrecognized spellings fall back to the default mode
    fn parse_or_default(raw: Option<&str>) -> Self {
        raw.and_then(Self::from_raw).unwrap_or_default()
    }
}

/// Which player-count range a count must fall into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PlayerCountMode {
    /// Range printed on the box
    Box,
    /// Community-recommended range
    #[default]
    Recommended,
    /// Community "best with" range
    Best,
}

impl PlayerCountMode {
    /// Suffix of the `min_players*` / `max_players*` wire fields
    pub fn wire_suffix(&self) -> &'static str {
        match self {
            PlayerCountMode::Box => "",
            PlayerCountMode::Recommended => "_rec",
            PlayerCountMode::Best => "_best",
        }
    }
}

impl FilterMode for PlayerCountMode {
    fn as_str(&self) -> &'static str {
        match self {
            PlayerCountMode::Box => "box",
            PlayerCountMode::Recommended => "recommended",
            PlayerCountMode::Best => "best",
        }
    }

    fn from_raw(raw: &str) -> Option<Self> {
        match raw {
            "box" => Some(PlayerCountMode::Box),
            "recommended" => Some(PlayerCountMode::Recommended),
            "best" => Some(PlayerCountMode::Best),
            _ => None,
        }
    }
}

/// Which play-time bound the limit applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PlayTimeMode {
    Min,
    #[default]
    Max,
}

impl PlayTimeMode {
    /// Wire field the limit is applied to
    pub fn wire_field(&self) -> &'static str {
        match self {
            PlayTimeMode::Min => "min_time",
            PlayTimeMode::Max => "max_time",
        }
    }
}

impl FilterMode for PlayTimeMode {
    fn as_str(&self) -> &'static str {
        match self {
            PlayTimeMode::Min => "min",
            PlayTimeMode::Max => "max",
        }
    }

    fn from_raw(raw: &str) -> Option<Self> {
        match raw {
            "min" => Some(PlayTimeMode::Min),
            "max" => Some(PlayTimeMode::Max),
            _ => None,
        }
    }
}

/// Box age or community-recommended age
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PlayerAgeMode {
    Box,
    #[default]
    Recommended,
}

impl PlayerAgeMode {
    pub fn wire_suffix(&self) -> &'static str {
        match self {
            PlayerAgeMode::Box => "",
            PlayerAgeMode::Recommended => "_rec",
        }
    }
}

impl FilterMode for PlayerAgeMode {
    fn as_str(&self) -> &'static str {
        match self {
            PlayerAgeMode::Box => "box",
            PlayerAgeMode::Recommended => "recommended",
        }
    }

    fn from_raw(raw: &str) -> Option<Self> {
        match raw {
            "box" => Some(PlayerAgeMode::Box),
            "recommended" => Some(PlayerAgeMode::Recommended),
            _ => None,
        }
    }
}

/// A numeric filter that is enabled by being present; the mode only exists
/// alongside a valid value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModalFilter<M> {
    pub value: i64,
    pub mode: M,
}

impl<M: FilterMode> ModalFilter<M> {
    pub fn new(value: i64, mode: M) -> Self {
        Self { value, mode }
    }
}

/// Optional `[min, max]` pair. Either bound may be missing after validation;
/// the range only applies when [`RangeFilter::bounds`] yields a pair.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RangeFilter<T> {
    pub min: Option<T>,
    pub max: Option<T>,
}

impl<T: Copy + PartialOrd> RangeFilter<T> {
    pub fn new(min: Option<T>, max: Option<T>) -> Self {
        Self { min, max }
    }

    pub fn between(min: T, max: T) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
        }
    }

    /// Both bounds, only when present and ordered
    pub fn bounds(&self) -> Option<(T, T)> {
        match (self.min, self.max) {
            (Some(min), Some(max)) if min <= max => Some((min, max)),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }
}

/// Exclusion switches of a single-user recommendation.
///
/// Each flag is stored only when it deviates from its default, so two
/// inputs that mean the same thing yield the same record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ExcludeFlags {
    pub rated: Option<bool>,
    pub owned: Option<bool>,
    pub wishlist: Option<bool>,
    pub played: Option<bool>,
    pub clusters: Option<bool>,
}

impl ExcludeFlags {
    pub const RATED_DEFAULT: bool = true;
    pub const OWNED_DEFAULT: bool = true;
    pub const WISHLIST_DEFAULT: bool = false;
    pub const PLAYED_DEFAULT: bool = false;
    pub const CLUSTERS_DEFAULT: bool = true;

    /// Raw keys paired with their defaults
    pub(crate) const RAW_KEYS: [(&'static str, bool); 5] = [
        ("excludeRated", Self::RATED_DEFAULT),
        ("excludeOwned", Self::OWNED_DEFAULT),
        ("excludeWishlist", Self::WISHLIST_DEFAULT),
        ("excludePlayed", Self::PLAYED_DEFAULT),
        ("excludeClusters", Self::CLUSTERS_DEFAULT),
    ];

    pub fn rated(&self) -> bool {
        self.rated.unwrap_or(Self::RATED_DEFAULT)
    }

    pub fn owned(&self) -> bool {
        self.owned.unwrap_or(Self::OWNED_DEFAULT)
    }

    pub fn wishlist(&self) -> bool {
        self.wishlist.unwrap_or(Self::WISHLIST_DEFAULT)
    }

    pub fn played(&self) -> bool {
        self.played.unwrap_or(Self::PLAYED_DEFAULT)
    }

    pub fn clusters(&self) -> bool {
        self.clusters.unwrap_or(Self::CLUSTERS_DEFAULT)
    }

    pub(crate) fn slots(&self) -> [Option<bool>; 5] {
        [self.rated, self.owned, self.wishlist, self.played, self.clusters]
    }

    pub(crate) fn from_slots(slots: [Option<bool>; 5]) -> Self {
        let [rated, owned, wishlist, played, clusters] = slots;
        Self {
            rated,
            owned,
            wishlist,
            played,
            clusters,
        }
    }

    pub fn is_default(&self) -> bool {
        self.slots().iter().all(Option::is_none)
    }
}

/// Validated, defaulted description of the active filters, sort and user
/// targeting.
///
/// Invariants upheld by the codec:
/// * `for_users` and `liked_game_ids` are never both non-empty;
/// * `exclude` is default unless there is exactly one user;
/// * `similarity` is false unless there is at least one user;
/// * `ordering` is `None` for personalized queries and for the default preset.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CanonicalParams {
    /// Lower-cased, sorted, de-duplicated user names
    pub for_users: Vec<String>,
    /// Sorted, de-duplicated game ids for anonymous "liked games" queries
    pub liked_game_ids: Vec<i64>,
    pub search: Option<String>,
    pub player_count: Option<ModalFilter<PlayerCountMode>>,
    pub play_time: Option<ModalFilter<PlayTimeMode>>,
    pub player_age: Option<ModalFilter<PlayerAgeMode>>,
    pub complexity: RangeFilter<f64>,
    pub year: RangeFilter<i32>,
    pub cooperative: Option<bool>,
    pub game_type: Option<i64>,
    pub category: Option<i64>,
    pub mechanic: Option<i64>,
    pub designer: Option<i64>,
    pub artist: Option<i64>,
    pub exclude: ExcludeFlags,
    pub similarity: bool,
    pub ordering: Option<Ordering>,
}

impl CanonicalParams {
    /// Scoped to named users
    pub fn is_personalized(&self) -> bool {
        !self.for_users.is_empty()
    }

    /// Any recommendation mode (users or liked games)
    pub fn is_recommendation(&self) -> bool {
        !self.for_users.is_empty() || !self.liked_game_ids.is_empty()
    }

    /// Ordering preset in effect (explicit or default)
    pub fn effective_ordering(&self) -> Ordering {
        self.ordering.unwrap_or_default()
    }

    /// Same filters without user targeting.
    ///
    /// Used when the requested user does not exist: exclusions, similarity
    /// and ordering only have meaning relative to a user and are reset.
    pub fn anonymous(&self) -> Self {
        Self {
            for_users: Vec::new(),
            exclude: ExcludeFlags::default(),
            similarity: false,
            ordering: None,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_year_bounds() {
        let bounds = YearBounds::for_year(2024);
        assert_eq!(bounds.ceiling, 2025);
        assert!(!bounds.accepts_min(1970));
        assert!(bounds.accepts_min(1971));
        assert!(bounds.accepts_max(2025));
        assert!(!bounds.accepts_max(2026));
    }

    #[test]
    fn test_mode_fallbacks() {
        assert_eq!(PlayerCountMode::parse_or_default(Some("bogus")), PlayerCountMode::Recommended);
        assert_eq!(PlayerCountMode::parse_or_default(Some("Best")), PlayerCountMode::Recommended);
        assert_eq!(PlayTimeMode::parse_or_default(None), PlayTimeMode::Max);
        assert_eq!(PlayerAgeMode::parse_or_default(Some("box")), PlayerAgeMode::Box);
    }

    #[test]
    fn test_range_bounds_require_order() {
        assert_eq!(RangeFilter::between(1.5, 3.0).bounds(), Some((1.5, 3.0)));
        assert_eq!(RangeFilter::between(3.0, 1.5).bounds(), None);
        assert_eq!(RangeFilter::new(Some(2000), None).bounds(), None);
    }

    #[test]
    fn test_exclude_defaults() {
        let flags = ExcludeFlags::default();
        assert!(flags.rated() && flags.owned() && flags.clusters());
        assert!(!flags.wishlist() && !flags.played());
        assert!(flags.is_default());
    }

    #[test]
    fn test_anonymous_drops_targeting() {
        let params = CanonicalParams {
            for_users: vec!["alice".to_string()],
            exclude: ExcludeFlags {
                owned: Some(false),
                ..Default::default()
            },
            similarity: true,
            search: Some("catan".to_string()),
            ..Default::default()
        };

        let anonymous = params.anonymous();
        assert!(anonymous.for_users.is_empty());
        assert!(anonymous.exclude.is_default());
        assert!(!anonymous.similarity);
        assert_eq!(anonymous.search.as_deref(), Some("catan"));
    }
}
