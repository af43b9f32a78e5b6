use crate::filters::Ordering;
use crate::params::{
    CanonicalParams, ExcludeFlags, FilterMode, FilterUiState, ModalFilter, PlayTimeMode,
    PlayerAgeMode, PlayerCountMode, RangeFilter, RawParams, YearBounds,
};

/// Converts between untrusted parameter bags and [`CanonicalParams`].
///
/// Parsing never fails: malformed values are dropped and unrecognized
/// modes fall back to their defaults, so a bad URL only resets filters.
///
/// Defaults applied here:
/// * player count mode `recommended`, play time mode `max`, player age mode
///   `recommended`;
/// * exclude rated/owned/clusters on, exclude wishlist/played off (single
///   user only);
/// * similarity off;
/// * ordering preset `rg`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParamCodec {
    bounds: YearBounds,
}

impl ParamCodec {
    pub fn new(bounds: YearBounds) -> Self {
        Self { bounds }
    }

    pub fn bounds(&self) -> &YearBounds {
        &self.bounds
    }

    /// Normalize raw route/query parameters
    pub fn parse(&self, raw: &RawParams) -> CanonicalParams {
        let mut users = parse_users(raw.get_all("for"));
        if users.is_empty() {
            users = parse_users(raw.get_all("user"));
        }

        // Exclusions only make sense against exactly one user's collection
        let exclude = if users.len() == 1 {
            let mut slots = [None; 5];
            for (slot, (key, default)) in slots.iter_mut().zip(ExcludeFlags::RAW_KEYS) {
                *slot = raw
                    .get(key)
                    .and_then(parse_boolean)
                    .filter(|value| *value != default);
            }
            ExcludeFlags::from_slots(slots)
        } else {
            ExcludeFlags::default()
        };

        let similarity = !users.is_empty()
            && raw.get("similarity").and_then(parse_boolean).unwrap_or(false);

        let liked_game_ids = if users.is_empty() {
            parse_ids(raw.get_all("like"))
        } else {
            Vec::new()
        };

        let ordering = if users.is_empty() && liked_game_ids.is_empty() {
            raw.get("ordering")
                .and_then(Ordering::from_name)
                .filter(|ordering| *ordering != Ordering::default())
        } else {
            None
        };

        let year = RangeFilter::new(
            positive_year(raw.get("yearMin")).filter(|y| self.bounds.accepts_min(*y)),
            positive_year(raw.get("yearMax")).filter(|y| self.bounds.accepts_max(*y)),
        );

        CanonicalParams {
            for_users: users,
            liked_game_ids,
            search: raw
                .get("search")
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
            player_count: modal::<PlayerCountMode>(raw, "playerCount", "playerCountType"),
            play_time: modal::<PlayTimeMode>(raw, "playTime", "playTimeType"),
            player_age: modal::<PlayerAgeMode>(raw, "playerAge", "playerAgeType"),
            complexity: RangeFilter::new(
                raw.get("complexityMin").and_then(positive_float),
                raw.get("complexityMax").and_then(positive_float),
            ),
            year,
            cooperative: raw.get("cooperative").and_then(strict_boolean),
            game_type: raw.get("gameType").and_then(positive_int),
            category: raw.get("category").and_then(positive_int),
            mechanic: raw.get("mechanic").and_then(positive_int),
            designer: raw.get("designer").and_then(positive_int),
            artist: raw.get("artist").and_then(positive_int),
            exclude,
            similarity,
            ordering,
        }
    }

    /// Parse a query string (`?a=1&b=2`, `#/path?a=1`, or `a=1`)
    pub fn parse_query(&self, query: &str) -> CanonicalParams {
        self.parse(&RawParams::from_query(query))
    }

    /// Inverse of [`ParamCodec::parse`]: only present fields are emitted
    pub fn serialize(&self, params: &CanonicalParams) -> RawParams {
        let mut raw = RawParams::new();

        if !params.for_users.is_empty() {
            raw.insert("for", params.for_users.join(","));
        }

        if !params.liked_game_ids.is_empty() {
            let ids: Vec<String> = params.liked_game_ids.iter().map(i64::to_string).collect();
            raw.insert("like", ids.join(","));
        }

        if let Some(search) = &params.search {
            raw.insert("search", search.clone());
        }

        if let Some(count) = params.player_count {
            raw.insert("playerCount", count.value.to_string());
            raw.insert("playerCountType", count.mode.as_str());
        }

        if let Some(time) = params.play_time {
            raw.insert("playTime", time.value.to_string());
            raw.insert("playTimeType", time.mode.as_str());
        }

        if let Some(age) = params.player_age {
            raw.insert("playerAge", age.value.to_string());
            raw.insert("playerAgeType", age.mode.as_str());
        }

        if let Some(min) = params.complexity.min {
            raw.insert("complexityMin", min.to_string());
        }
        if let Some(max) = params.complexity.max {
            raw.insert("complexityMax", max.to_string());
        }

        if let Some(min) = params.year.min {
            raw.insert("yearMin", min.to_string());
        }
        if let Some(max) = params.year.max {
            raw.insert("yearMax", max.to_string());
        }

        if let Some(cooperative) = params.cooperative {
            raw.insert("cooperative", bool_string(cooperative));
        }

        let ids = [
            ("gameType", params.game_type),
            ("category", params.category),
            ("mechanic", params.mechanic),
            ("designer", params.designer),
            ("artist", params.artist),
        ];
        for (key, id) in ids {
            if let Some(id) = id {
                raw.insert(key, id.to_string());
            }
        }

        for ((key, _), value) in ExcludeFlags::RAW_KEYS.iter().zip(params.exclude.slots()) {
            if let Some(value) = value {
                raw.insert(*key, bool_string(value));
            }
        }

        if params.similarity {
            raw.insert("similarity", bool_string(true));
        }

        if let Some(ordering) = params.ordering {
            raw.insert("ordering", ordering.name());
        }

        raw
    }

    /// Stable page-cache key: the serialized form as a sorted query string
    pub fn cache_key(&self, params: &CanonicalParams) -> String {
        self.serialize(params).to_query()
    }

    /// Shareable `#/path?...` URL fragment for `params`
    pub fn canonical_path(&self, path: &str, params: &CanonicalParams) -> String {
        self.serialize(params).canonical_path(path)
    }

    /// Read live form-control state, then normalize it like any other input
    pub fn from_ui_state(&self, state: &FilterUiState) -> CanonicalParams {
        self.parse(&state.to_raw())
    }
}

fn modal<M: FilterMode>(raw: &RawParams, value_key: &str, mode_key: &str) -> Option<ModalFilter<M>> {
    raw.get(value_key)
        .and_then(positive_int)
        .map(|value| ModalFilter::new(value, M::parse_or_default(raw.get(mode_key))))
}

/// Split, trim, lower-case, sort and de-duplicate user names
fn parse_users(values: &[String]) -> Vec<String> {
    let mut users: Vec<String> = values
        .iter()
        .flat_map(|value| value.split(','))
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_lowercase)
        .collect();
    users.sort();
    users.dedup();
    users
}

fn parse_ids(values: &[String]) -> Vec<i64> {
    let mut ids: Vec<i64> = values
        .iter()
        .flat_map(|value| value.split(','))
        .filter_map(positive_int)
        .collect();
    ids.sort_unstable();
    ids.dedup();
    ids
}

fn positive_year(raw: Option<&str>) -> Option<i32> {
    raw.and_then(positive_int).and_then(|y| i32::try_from(y).ok())
}

/// Leading-integer reader: optional whitespace and sign, then digits.
/// `"12abc"` reads as 12, `"abc"` as nothing.
pub(crate) fn parse_int_prefix(raw: &str) -> Option<i64> {
    let trimmed = raw.trim_start();
    let unsigned = trimmed.strip_prefix(['+', '-']).unwrap_or(trimmed);
    let digits = unsigned.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }
    let sign_len = trimmed.len() - unsigned.len();
    trimmed[..sign_len + digits].parse().ok()
}

/// Leading-decimal reader, `"2.5 stars"` reads as 2.5
pub(crate) fn parse_float_prefix(raw: &str) -> Option<f64> {
    let trimmed = raw.trim_start();
    let unsigned = trimmed.strip_prefix(['+', '-']).unwrap_or(trimmed);
    let sign_len = trimmed.len() - unsigned.len();

    let mut end = 0;
    let mut seen_digit = false;
    let mut seen_dot = false;
    for byte in unsigned.bytes() {
        match byte {
            b'0'..=b'9' => seen_digit = true,
            b'.' if !seen_dot => seen_dot = true,
            _ => break,
        }
        end += 1;
    }

    if !seen_digit {
        return None;
    }
    trimmed[..sign_len + end]
        .parse()
        .ok()
        .filter(|value: &f64| value.is_finite())
}

pub(crate) fn positive_int(raw: &str) -> Option<i64> {
    parse_int_prefix(raw).filter(|value| *value > 0)
}

pub(crate) fn positive_float(raw: &str) -> Option<f64> {
    parse_float_prefix(raw).filter(|value| *value > 0.0)
}

/// Broad boolean reader: integers (non-zero is true), and
/// `true/True/yes/Yes`, `false/False/no/No`; anything else is unset.
pub(crate) fn parse_boolean(raw: &str) -> Option<bool> {
    if let Some(number) = parse_int_prefix(raw) {
        return Some(number != 0);
    }
    match raw {
        "true" | "True" | "yes" | "Yes" => Some(true),
        "false" | "False" | "no" | "No" => Some(false),
        _ => None,
    }
}

/// Only the literal wire spellings `True` / `False`
pub(crate) fn strict_boolean(raw: &str) -> Option<bool> {
    match raw {
        "True" => Some(true),
        "False" => Some(false),
        _ => None,
    }
}

pub(crate) fn bool_string(value: bool) -> &'static str {
    if value {
        "True"
    } else {
        "False"
    }
}
