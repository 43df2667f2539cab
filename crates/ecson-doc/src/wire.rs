use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A declarative event binding between two entities.
///
/// Wires are data only; nothing in the core executes them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventWire {
    pub id: String,
    pub source_entity_id: String,
    pub source_event: String,
    pub target_entity_id: String,
    pub target_action: String,
    #[serde(default)]
    pub parameters: Map<String, Value>,
}

impl EventWire {
    pub fn new(
        id: impl Into<String>,
        source_entity_id: impl Into<String>,
        source_event: impl Into<String>,
        target_entity_id: impl Into<String>,
        target_action: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            source_entity_id: source_entity_id.into(),
            source_event: source_event.into(),
            target_entity_id: target_entity_id.into(),
            target_action: target_action.into(),
            parameters: Map::new(),
        }
    }

    pub fn with_parameter(mut self, key: impl Into<String>, value: Value) -> Self {
        self.parameters.insert(key.into(), value);
        self
    }
}
