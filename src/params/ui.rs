use crate::params::codec::bool_string;
use crate::params::{CanonicalParams, FilterMode, RawParams, YearBounds};

/// Single-value slider with an enable toggle and a mode selector
#[derive(Debug, Clone, PartialEq)]
pub struct SliderState {
    pub enabled: bool,
    pub value: Option<i64>,
    pub mode: String,
}

impl SliderState {
    pub fn new(enabled: bool, value: i64, mode: impl Into<String>) -> Self {
        Self {
            enabled,
            value: Some(value),
            mode: mode.into(),
        }
    }

    fn active_value(&self) -> Option<i64> {
        self.value.filter(|value| self.enabled && *value > 0)
    }
}

/// Two-handle range slider with an enable toggle
#[derive(Debug, Clone, PartialEq)]
pub struct RangeSliderState<T> {
    pub enabled: bool,
    pub min: Option<T>,
    pub max: Option<T>,
}

impl<T: Copy> RangeSliderState<T> {
    pub fn new(enabled: bool, min: T, max: T) -> Self {
        Self {
            enabled,
            min: Some(min),
            max: Some(max),
        }
    }

    /// Handle positions, only when enabled
    fn active_bounds(&self) -> (Option<T>, Option<T>) {
        if self.enabled {
            (self.min, self.max)
        } else {
            (None, None)
        }
    }
}

/// Exclusion toggles as shown next to a single user name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExcludeToggles {
    pub rated: Option<bool>,
    pub owned: Option<bool>,
    pub wishlist: Option<bool>,
    pub played: Option<bool>,
    pub clusters: Option<bool>,
}

/// Live values of the filter form.
///
/// Disabled controls keep their last value so re-enabling restores it, but
/// contribute nothing to the canonical params.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterUiState {
    /// Free text, comma-separated user names
    pub user: Option<String>,
    pub search: Option<String>,
    pub count: SliderState,
    pub time: SliderState,
    pub age: SliderState,
    pub complexity: RangeSliderState<f64>,
    pub year: RangeSliderState<i32>,
    /// `"True"`, `"False"` or unset
    pub cooperative: Option<String>,
    pub game_type: Option<i64>,
    pub category: Option<i64>,
    pub mechanic: Option<i64>,
    pub designer: Option<i64>,
    pub artist: Option<i64>,
    pub ordering: Option<String>,
    pub exclude: ExcludeToggles,
    pub similarity: Option<bool>,
    /// Ids of games the visitor marked as liked
    pub liked_games: Vec<i64>,
}

impl FilterUiState {
    /// Form with every control disabled at its resting position
    pub fn new(bounds: &YearBounds) -> Self {
        Self {
            user: None,
            search: None,
            count: SliderState::new(false, 4, "recommended"),
            time: SliderState::new(false, 60, "max"),
            age: SliderState::new(false, 10, "recommended"),
            complexity: RangeSliderState::new(false, 1.0, 5.0),
            year: RangeSliderState::new(false, bounds.floor, bounds.ceiling),
            cooperative: None,
            game_type: None,
            category: None,
            mechanic: None,
            designer: None,
            artist: None,
            ordering: None,
            exclude: ExcludeToggles::default(),
            similarity: None,
            liked_games: Vec::new(),
        }
    }

    /// Populate the controls from canonical params (route → form)
    pub fn from_params(params: &CanonicalParams, bounds: &YearBounds) -> Self {
        let mut state = Self::new(bounds);

        if !params.for_users.is_empty() {
            state.user = Some(params.for_users.join(", "));
        }
        state.search = params.search.clone();

        if let Some(count) = params.player_count {
            state.count = SliderState::new(true, count.value, count.mode.as_str());
        }
        if let Some(time) = params.play_time {
            state.time = SliderState::new(true, time.value, time.mode.as_str());
        }
        if let Some(age) = params.player_age {
            state.age = SliderState::new(true, age.value, age.mode.as_str());
        }

        // A missing handle stays unset rather than snapping to the slider
        // end, which would read back as an extra bound
        let complexity = params.complexity;
        if !complexity.is_empty() {
            state.complexity = RangeSliderState {
                enabled: true,
                min: complexity.min,
                max: complexity.max,
            };
        }
        let year = params.year;
        if !year.is_empty() {
            state.year = RangeSliderState {
                enabled: true,
                min: year.min,
                max: year.max,
            };
        }

        state.cooperative = params.cooperative.map(|c| bool_string(c).to_string());
        state.game_type = params.game_type;
        state.category = params.category;
        state.mechanic = params.mechanic;
        state.designer = params.designer;
        state.artist = params.artist;
        state.ordering = params.ordering.map(|o| o.name().to_string());

        let exclude = params.exclude;
        state.exclude = ExcludeToggles {
            rated: Some(exclude.rated()),
            owned: Some(exclude.owned()),
            wishlist: Some(exclude.wishlist()),
            played: Some(exclude.played()),
            clusters: Some(exclude.clusters()),
        };
        state.similarity = Some(params.similarity);
        state.liked_games = params.liked_game_ids.clone();

        state
    }

    /// Raw parameter bag of the enabled controls
    pub(crate) fn to_raw(&self) -> RawParams {
        let mut raw = RawParams::new();

        let user = self.user.as_deref().map(str::trim).unwrap_or_default();
        if !user.is_empty() {
            raw.insert("for", user);
            let toggles = [
                ("excludeRated", self.exclude.rated),
                ("excludeOwned", self.exclude.owned),
                ("excludeWishlist", self.exclude.wishlist),
                ("excludePlayed", self.exclude.played),
                ("excludeClusters", self.exclude.clusters),
                ("similarity", self.similarity),
            ];
            for (key, value) in toggles {
                if let Some(value) = value {
                    raw.insert(key, bool_string(value));
                }
            }
        } else if !self.liked_games.is_empty() {
            let ids: Vec<String> = self.liked_games.iter().map(i64::to_string).collect();
            raw.insert("like", ids.join(","));
        }

        if let Some(search) = &self.search {
            raw.insert("search", search.clone());
        }

        let sliders = [
            ("playerCount", "playerCountType", &self.count),
            ("playTime", "playTimeType", &self.time),
            ("playerAge", "playerAgeType", &self.age),
        ];
        for (value_key, mode_key, slider) in sliders {
            if let Some(value) = slider.active_value() {
                raw.insert(value_key, value.to_string());
                raw.insert(mode_key, slider.mode.clone());
            }
        }

        let (min, max) = self.complexity.active_bounds();
        if let Some(min) = min {
            raw.insert("complexityMin", min.to_string());
        }
        if let Some(max) = max {
            raw.insert("complexityMax", max.to_string());
        }
        let (min, max) = self.year.active_bounds();
        if let Some(min) = min {
            raw.insert("yearMin", min.to_string());
        }
        if let Some(max) = max {
            raw.insert("yearMax", max.to_string());
        }

        if let Some(cooperative) = &self.cooperative {
            raw.insert("cooperative", cooperative.clone());
        }

        let ids = [
            ("gameType", self.game_type),
            ("category", self.category),
            ("mechanic", self.mechanic),
            ("designer", self.designer),
            ("artist", self.artist),
        ];
        for (key, id) in ids {
            if let Some(id) = id {
                raw.insert(key, id.to_string());
            }
        }

        if let Some(ordering) = &self.ordering {
            raw.insert("ordering", ordering.clone());
        }

        raw
    }
}
