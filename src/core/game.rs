use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::core::display;

/// Contributor id the catalog uses for "(Uncredited)"
pub const UNCREDITED_ID: i64 = 3;
pub const UNCREDITED_NAME: &str = "(Uncredited)";

/// Sites whose `{site}_id` fields become external links
pub const LINKED_SITES: [&str; 6] = ["bgg", "bga", "wikidata", "wikipedia", "luding", "spielen"];

/// Deserialize a number from int, float or numeric string (the catalog is
/// not consistent across endpoints)
fn deserialize_lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberValue {
        Number(f64),
        String(String),
        Null,
    }

    Ok(match NumberValue::deserialize(deserializer)? {
        NumberValue::Number(n) => Some(n),
        NumberValue::String(s) => s.trim().parse().ok(),
        NumberValue::Null => None,
    })
}

fn deserialize_lenient_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(deserialize_lenient_f64(deserializer)?.map(|n| n.round() as i64))
}

/// Recommendation level of one player count
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerCountRec {
    pub count: u8,
    /// 0 not playable, 1 box, 2 recommended, 3 best
    pub rec: u8,
    pub style: String,
    pub image: String,
    pub alt: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalLink {
    pub site: String,
    pub url: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_class: Option<String>,
}

/// A catalog game record.
///
/// Fields the client relies on are typed; everything else the API sends
/// (ratings breakdowns, external ids, ...) is kept in `extra` and written
/// back unchanged. Display fields are filled by [`Game::enrich`].
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Game {
    /// BoardGameGeek id, primary key of the catalog
    #[serde(default, deserialize_with = "deserialize_lenient_i64")]
    pub bgg_id: Option<i64>,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub alt_name: Vec<String>,

    #[serde(default, deserialize_with = "deserialize_lenient_i64")]
    pub year: Option<i64>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub designer: Vec<i64>,
    #[serde(default)]
    pub designer_name: Vec<String>,
    #[serde(default)]
    pub artist: Vec<i64>,
    #[serde(default)]
    pub artist_name: Vec<String>,
    #[serde(default)]
    pub game_type: Vec<i64>,
    #[serde(default)]
    pub game_type_name: Vec<String>,
    #[serde(default)]
    pub category: Vec<i64>,
    #[serde(default)]
    pub category_name: Vec<String>,
    #[serde(default)]
    pub mechanic: Vec<i64>,
    #[serde(default)]
    pub mechanic_name: Vec<String>,

    /// Box player count
    #[serde(default, deserialize_with = "deserialize_lenient_i64")]
    pub min_players: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_lenient_i64")]
    pub max_players: Option<i64>,
    /// Community-recommended player count
    #[serde(default, deserialize_with = "deserialize_lenient_i64")]
    pub min_players_rec: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_lenient_i64")]
    pub max_players_rec: Option<i64>,
    /// Community "best with" player count
    #[serde(default, deserialize_with = "deserialize_lenient_i64")]
    pub min_players_best: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_lenient_i64")]
    pub max_players_best: Option<i64>,

    #[serde(default, deserialize_with = "deserialize_lenient_f64")]
    pub min_age: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_lenient_f64")]
    pub min_age_rec: Option<f64>,

    /// Play time in minutes
    #[serde(default, deserialize_with = "deserialize_lenient_i64")]
    pub min_time: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_lenient_i64")]
    pub max_time: Option<i64>,

    /// Weight on a 1-5 scale
    #[serde(default, deserialize_with = "deserialize_lenient_f64")]
    pub complexity: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_lenient_f64")]
    pub language_dependency: Option<f64>,

    #[serde(default)]
    pub cooperative: Option<bool>,
    #[serde(default)]
    pub compilation: Option<bool>,

    #[serde(default, deserialize_with = "deserialize_lenient_f64")]
    pub rec_rating: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_lenient_f64")]
    pub bayes_rating: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_lenient_f64")]
    pub avg_rating: Option<f64>,
    /// Recommendation score on a 1-5 star scale
    #[serde(default, deserialize_with = "deserialize_lenient_f64")]
    pub rec_stars: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_lenient_i64")]
    pub num_votes: Option<i64>,

    #[serde(default)]
    pub image_url: Vec<String>,

    // Display fields
    #[serde(default)]
    pub name_short: Option<String>,
    #[serde(default)]
    pub name_url: Option<String>,
    #[serde(default)]
    pub designer_display: String,
    #[serde(default)]
    pub artist_display: String,
    #[serde(default)]
    pub description_array: Vec<String>,
    #[serde(default)]
    pub description_short: Option<String>,
    #[serde(default)]
    pub counts: Vec<PlayerCountRec>,
    #[serde(default)]
    pub time_string: Option<String>,
    #[serde(default)]
    pub complexity_string: Option<String>,
    #[serde(default)]
    pub language_dependency_string: Option<String>,
    #[serde(default)]
    pub cooperative_string: Option<String>,
    #[serde(default)]
    pub star_classes: Vec<String>,
    #[serde(default)]
    pub external_links: Option<Vec<ExternalLink>>,

    /// Fields without a typed counterpart
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Game {
    pub fn new(bgg_id: i64, name: impl Into<String>) -> Self {
        Self {
            bgg_id: Some(bgg_id),
            name: name.into(),
            ..Default::default()
        }
    }

    /// Decode one API result and derive its display fields
    pub fn from_value(value: Value) -> serde_json::Result<Self> {
        let mut game: Game = serde_json::from_value(value)?;
        game.enrich();
        Ok(game)
    }

    /// Positive catalog id, if any
    pub fn id(&self) -> Option<i64> {
        self.bgg_id.filter(|id| *id > 0)
    }

    /// Derive the display fields from the raw record. Idempotent.
    pub fn enrich(&mut self) {
        self.name_short = if self.name.chars().count() > 50 {
            Some(display::truncate(&self.name, 50))
        } else {
            None
        };
        self.name_url = Some(urlencoding::encode(&self.name.to_lowercase()).into_owned());

        if self.name_short.is_some() {
            let mut names = vec![self.name.clone()];
            for alt in self.alt_name.drain(..) {
                if !names.contains(&alt) {
                    names.push(alt);
                }
            }
            self.alt_name = names;
        } else {
            let name = &self.name;
            self.alt_name.retain(|alt| alt != name);
        }

        self.designer.retain(|id| *id != UNCREDITED_ID);
        self.designer_name.retain(|name| name != UNCREDITED_NAME);
        self.artist.retain(|id| *id != UNCREDITED_ID);
        self.artist_name.retain(|name| name != UNCREDITED_NAME);
        self.designer_display = display::join(&self.designer_name, ", ", " & ");
        self.artist_display = display::join(&self.artist_name, ", ", " & ");

        let description = self.description.as_deref().unwrap_or_default();
        self.description_array = display::paragraphs(description);
        self.description_short = if description.chars().count() > 250 {
            Some(display::truncate(description, 250))
        } else {
            None
        };

        self.counts = (1..=10).map(|count| self.player_count_rec(count)).collect();

        let mut times: Vec<i64> = [self.min_time, self.max_time]
            .into_iter()
            .flatten()
            .filter(|t| *t != 0)
            .collect();
        times.sort_unstable();
        times.dedup();
        self.time_string = if times.is_empty() {
            None
        } else {
            let joined: Vec<String> = times.iter().map(i64::to_string).collect();
            Some(format!("{} minutes", joined.join("–")))
        };

        self.complexity_string = self
            .complexity
            .and_then(display::complexity_label)
            .map(|label| format!("{label} complexity"));
        self.language_dependency_string = self
            .language_dependency
            .and_then(display::language_dependency_label)
            .map(str::to_string);
        self.cooperative_string = self.cooperative.map(|cooperative| {
            let label = if cooperative { "cooperative" } else { "competitive" };
            label.to_string()
        });
        self.star_classes = display::star_classes(self.rec_stars);

        let mut links = Vec::new();
        for site in LINKED_SITES {
            let ids = if site == "bgg" {
                self.id().map(|id| vec![id.to_string()]).unwrap_or_default()
            } else {
                self.extra
                    .get(&format!("{site}_id"))
                    .map(display::link_ids)
                    .unwrap_or_default()
            };
            links.extend(ids.iter().filter_map(|id| display::external_link(site, id)));
        }
        self.external_links = if links.is_empty() { None } else { Some(links) };
    }

    fn player_count_rec(&self, count: u8) -> PlayerCountRec {
        let value = i64::from(count);
        let within = |min: Option<i64>, max: Option<i64>| match (min, max) {
            (Some(min), Some(max)) => min <= value && value <= max,
            _ => false,
        };

        let rec: u8 = if within(self.min_players_best, self.max_players_best) {
            3
        } else if within(self.min_players_rec, self.max_players_rec) {
            2
        } else if within(self.min_players, self.max_players) {
            1
        } else {
            0
        };

        const STYLES: [&str; 4] = ["not", "box", "recommended", "best"];
        const ALTS: [&str; 4] = ["not playable with", "playable with", "recommended for", "best with"];

        let image = if rec == 0 {
            format!("meeple_{count:02}_empty.svg")
        } else {
            format!("meeple_{count:02}.svg")
        };
        let plural = if count > 1 { "s" } else { "" };

        PlayerCountRec {
            count,
            rec,
            style: format!("player-count-{}", STYLES[usize::from(rec)]),
            image: format!("/assets/meeples/{image}"),
            alt: format!("{} {count} player{plural}", ALTS[usize::from(rec)]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn catan() -> Value {
        json!({
            "bgg_id": 13,
            "name": "CATAN",
            "alt_name": ["CATAN", "Die Siedler von Catan"],
            "year": 1995,
            "description": "Trade and build.\n\n  \nSettle the island.\nRoll dice.",
            "designer": [11, 3],
            "designer_name": ["Klaus Teuber", "(Uncredited)"],
            "artist": [12, 13, 14],
            "artist_name": ["Volkan Baga", "Tanja Donner", "Pete Fenlon"],
            "min_players": 3,
            "max_players": 4,
            "min_players_rec": 3,
            "max_players_rec": 4,
            "min_players_best": 4,
            "max_players_best": 4,
            "min_time": 60,
            "max_time": "120",
            "complexity": 2.3,
            "language_dependency": 2.0,
            "cooperative": false,
            "rec_stars": 3.6,
            "bgg_rank": 470,
            "wikidata_id": ["Q17271"],
            "luding_id": 7
        })
    }

    #[test]
    fn test_enrich_catan() {
        let game = Game::from_value(catan()).unwrap();

        assert_eq!(game.id(), Some(13));
        assert_eq!(game.name_short, None);
        assert_eq!(game.name_url.as_deref(), Some("catan"));
        assert_eq!(game.alt_name, vec!["Die Siedler von Catan"]);
        assert_eq!(game.designer, vec![11]);
        assert_eq!(game.designer_display, "Klaus Teuber");
        assert_eq!(game.artist_display, "Volkan Baga, Tanja Donner & Pete Fenlon");
        assert_eq!(
            game.description_array,
            vec!["Trade and build.", "Settle the island.\nRoll dice."]
        );
        assert_eq!(game.time_string.as_deref(), Some("60–120 minutes"));
        assert_eq!(game.complexity_string.as_deref(), Some("medium light complexity"));
        assert_eq!(game.language_dependency_string.as_deref(), Some("some necessary text"));
        assert_eq!(game.cooperative_string.as_deref(), Some("competitive"));
        assert_eq!(
            game.star_classes,
            vec!["fas fa-star", "fas fa-star", "fas fa-star", "fas fa-star-half-alt", "far fa-star"]
        );
        assert_eq!(game.extra.get("bgg_rank"), Some(&json!(470)));

        let links = game.external_links.unwrap();
        let sites: Vec<&str> = links.iter().map(|l| l.site.as_str()).collect();
        assert_eq!(sites, vec!["bgg", "wikidata", "luding"]);
        assert_eq!(links[0].url, "https://boardgamegeek.com/boardgame/13/");
        assert_eq!(links[1].url, "https://www.wikidata.org/wiki/Q17271");
        assert_eq!(links[2].icon_url, None);
    }

    #[test]
    fn test_player_counts() {
        let game = Game::from_value(catan()).unwrap();
        assert_eq!(game.counts.len(), 10);

        let recs: Vec<u8> = game.counts.iter().map(|c| c.rec).collect();
        assert_eq!(recs, vec![0, 0, 2, 3, 0, 0, 0, 0, 0, 0]);
        assert_eq!(game.counts[3].style, "player-count-best");
        assert_eq!(game.counts[3].image, "/assets/meeples/meeple_04.svg");
        assert_eq!(game.counts[0].alt, "not playable with 1 player");
        assert_eq!(game.counts[0].image, "/assets/meeples/meeple_01_empty.svg");
    }

    #[test]
    fn test_long_name_is_shortened() {
        let name = "Warhammer Quest, Blackstone Fortress: Escalation Expansion Deluxe";
        let mut game = Game::new(1, name);
        game.alt_name = vec!["WQ".to_string()];
        game.enrich();

        let short = game.name_short.clone().unwrap();
        assert!(short.ends_with("..."));
        assert!(short.chars().count() <= 50);
        assert_eq!(game.alt_name, vec![name.to_string(), "WQ".to_string()]);

        // Enriching again changes nothing
        let again = {
            let mut copy = game.clone();
            copy.enrich();
            copy
        };
        assert_eq!(again, game);
    }

    #[test]
    fn test_sparse_record() {
        let game = Game::from_value(json!({"bgg_id": "822", "name": "Carcassonne", "min_time": 0})).unwrap();
        assert_eq!(game.id(), Some(822));
        assert_eq!(game.time_string, None);
        assert_eq!(game.complexity_string, None);
        assert!(game.star_classes.is_empty());
        assert_eq!(game.external_links.map(|links| links.len()), Some(1));
        assert_eq!(game.designer_display, "");

        let game = Game::from_value(json!({"name": "No id"})).unwrap();
        assert_eq!(game.id(), None);
        assert_eq!(game.external_links, None);
    }

    #[test]
    fn test_serialized_record_reads_back() {
        let game = Game::from_value(catan()).unwrap();
        let json = serde_json::to_value(&game).unwrap();
        let back: Game = serde_json::from_value(json).unwrap();
        assert_eq!(back, game);
    }
}
