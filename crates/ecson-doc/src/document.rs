use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::asset::Asset;
use crate::entity::Entity;
use crate::environment::EnvironmentSettings;
use crate::wire::EventWire;

/// Schema version stamped on every document this engine produces.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

/// Entity id that addresses document-level fields (`environment.*`, `name`, …)
/// from property ops.
pub const DOCUMENT_TARGET: &str = "__document__";

fn current_schema_version() -> u32 {
    CURRENT_SCHEMA_VERSION
}

/// Optional gameplay settings.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub camera_mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spawn_point_id: Option<String>,
    /// Any further settings, kept verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The root aggregate: one scene, its entity tree, assets and wiring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneDocument {
    pub id: String,
    pub name: String,
    #[serde(default = "current_schema_version")]
    pub schema_version: u32,
    pub root_entity_id: String,
    pub entities: BTreeMap<String, Entity>,
    #[serde(default)]
    pub assets: BTreeMap<String, Asset>,
    #[serde(default)]
    pub wiring: Vec<EventWire>,
    #[serde(default)]
    pub environment: EnvironmentSettings,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game_settings: Option<GameSettings>,
    /// Editor/project metadata. Not portable.
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl SceneDocument {
    /// Create an empty document holding only a root entity, with generated ids.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_ids(
            ecson_core::id::generate_id(),
            ecson_core::id::generate_id(),
            name,
        )
    }

    /// Create an empty document with caller-chosen document and root ids.
    pub fn with_ids(
        id: impl Into<String>,
        root_entity_id: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        let root_entity_id = root_entity_id.into();
        let mut entities = BTreeMap::new();
        entities.insert(
            root_entity_id.clone(),
            Entity::new(root_entity_id.clone(), "Root"),
        );
        Self {
            id: id.into(),
            name: name.into(),
            schema_version: CURRENT_SCHEMA_VERSION,
            root_entity_id,
            entities,
            assets: BTreeMap::new(),
            wiring: Vec::new(),
            environment: EnvironmentSettings::default(),
            game_settings: None,
            metadata: Map::new(),
        }
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn root(&self) -> Option<&Entity> {
        self.entities.get(&self.root_entity_id)
    }

    pub fn entity(&self, id: &str) -> Option<&Entity> {
        self.entities.get(id)
    }

    pub fn entity_mut(&mut self, id: &str) -> Option<&mut Entity> {
        self.entities.get_mut(id)
    }

    pub fn contains_entity(&self, id: &str) -> bool {
        self.entities.contains_key(id)
    }

    pub fn is_root(&self, id: &str) -> bool {
        self.root_entity_id == id
    }

    /// Whether `ancestor_id` appears on the parent chain of `entity_id`
    /// (an entity counts as its own ancestor).
    ///
    /// O(depth). The walk is bounded by the entity count so a corrupted,
    /// cyclic parent chain still terminates.
    pub fn is_ancestor(&self, ancestor_id: &str, entity_id: &str) -> bool {
        let mut current = Some(entity_id);
        let mut steps = 0;
        while let Some(id) = current {
            if id == ancestor_id {
                return true;
            }
            steps += 1;
            if steps > self.entities.len() {
                return false;
            }
            current = self
                .entities
                .get(id)
                .and_then(|e| e.parent_id.as_deref());
        }
        false
    }

    /// Ids on the path from `entity_id` up to the root, starting with the entity itself.
    pub fn ancestry(&self, entity_id: &str) -> Vec<String> {
        let mut chain = Vec::new();
        let mut current = self.entities.get(entity_id);
        while let Some(entity) = current {
            if chain.len() > self.entities.len() {
                break;
            }
            chain.push(entity.id.clone());
            current = entity
                .parent_id
                .as_deref()
                .and_then(|p| self.entities.get(p));
        }
        chain
    }

    pub fn asset(&self, id: &str) -> Option<&Asset> {
        self.assets.get(id)
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }
}
