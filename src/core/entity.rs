use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Reference-data record (category, mechanic, designer, person, ...).
///
/// Only the id and name are interpreted; the rest is carried as-is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    #[serde(default)]
    pub bgg_id: Option<i64>,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Entity {
    pub fn id(&self) -> Option<i64> {
        self.bgg_id.filter(|id| *id > 0)
    }

    pub fn display_name(&self) -> String {
        match (&self.name, self.id()) {
            (Some(name), _) => name.clone(),
            (None, Some(id)) => format!("#{id}"),
            (None, None) => "unknown".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_entity_keeps_unknown_fields() {
        let entity: Entity = serde_json::from_value(json!({
            "bgg_id": 1021,
            "name": "Economic",
            "rec_rank": 3
        }))
        .unwrap();

        assert_eq!(entity.id(), Some(1021));
        assert_eq!(entity.display_name(), "Economic");
        assert_eq!(entity.extra.get("rec_rank"), Some(&json!(3)));
        assert_eq!(serde_json::to_value(&entity).unwrap()["rec_rank"], json!(3));
    }

    #[test]
    fn test_display_name_fallbacks() {
        let entity = Entity {
            bgg_id: Some(7),
            ..Default::default()
        };
        assert_eq!(entity.display_name(), "#7");
        assert_eq!(Entity::default().display_name(), "unknown");
    }
}
