//! Canonical IR: the fully explicit, topologically sorted form of a scene.
//!
//! Unlike the document shapes, nothing here has a serde default. Every field
//! must be present when an IR is decoded; nullable fields are written as
//! explicit `null`.

use std::collections::BTreeMap;

use ecson_core::hash::hash_json;
use ecson_core::serde_helpers::required_nullable;
use ecson_core::{ContentHash, EcsonResult, Transform, Vec3};
use ecson_doc::{
    AmbientLight, Asset, AssetType, Component, EnvironmentSettings, EventWire, Fog, FogType,
    Skybox, SkyboxType, Tuning,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A compiled scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CanonicalScene {
    pub id: String,
    pub name: String,
    pub source_schema_version: u32,
    /// Parents strictly precede their children.
    pub nodes: Vec<CanonicalNode>,
    /// Node id → position in `nodes`.
    pub node_index: BTreeMap<String, usize>,
    pub root_node_id: String,
    pub assets: Vec<CanonicalAsset>,
    pub wires: Vec<CanonicalWire>,
    pub environment: CanonicalEnvironment,
    #[serde(deserialize_with = "required_nullable")]
    pub game_settings: Option<Map<String, Value>>,
}

impl CanonicalScene {
    /// O(1) lookup through `node_index`.
    pub fn node(&self, id: &str) -> Option<&CanonicalNode> {
        self.node_index.get(id).and_then(|&i| self.nodes.get(i))
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.node_index.get(id).copied()
    }

    pub fn root(&self) -> Option<&CanonicalNode> {
        self.node(&self.root_node_id)
    }

    /// SHA-256 over the compact JSON form.
    pub fn content_hash(&self) -> EcsonResult<ContentHash> {
        hash_json(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CanonicalNode {
    pub id: String,
    pub name: String,
    #[serde(deserialize_with = "required_nullable")]
    pub parent_id: Option<String>,
    pub child_ids: Vec<String>,
    pub transform: Transform,
    pub components: Vec<CanonicalComponent>,
    pub visible: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tuning: Option<Tuning>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CanonicalComponent {
    #[serde(rename = "type")]
    pub component_type: String,
    pub properties: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tuning: Option<Tuning>,
}

impl From<&Component> for CanonicalComponent {
    fn from(component: &Component) -> Self {
        Self {
            component_type: component.component_type.clone(),
            properties: component.properties.clone(),
            tuning: component.tuning.clone(),
        }
    }
}

impl From<&CanonicalComponent> for Component {
    fn from(component: &CanonicalComponent) -> Self {
        Self {
            component_type: component.component_type.clone(),
            properties: component.properties.clone(),
            tuning: component.tuning.clone(),
            editor_meta: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CanonicalAsset {
    pub id: String,
    #[serde(rename = "type")]
    pub asset_type: AssetType,
    pub name: String,
    #[serde(deserialize_with = "required_nullable")]
    pub uri: Option<String>,
    #[serde(deserialize_with = "required_nullable")]
    pub data: Option<Value>,
    pub metadata: Map<String, Value>,
}

impl From<&Asset> for CanonicalAsset {
    fn from(asset: &Asset) -> Self {
        Self {
            id: asset.id.clone(),
            asset_type: asset.asset_type,
            name: asset.name.clone(),
            uri: asset.uri.clone(),
            data: asset.data.clone(),
            metadata: asset.metadata.clone(),
        }
    }
}

impl From<&CanonicalAsset> for Asset {
    fn from(asset: &CanonicalAsset) -> Self {
        Self {
            id: asset.id.clone(),
            asset_type: asset.asset_type,
            name: asset.name.clone(),
            uri: asset.uri.clone(),
            data: asset.data.clone(),
            metadata: asset.metadata.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CanonicalWire {
    pub id: String,
    pub source_entity_id: String,
    pub source_event: String,
    pub target_entity_id: String,
    pub target_action: String,
    /// Always present, possibly empty.
    pub parameters: Map<String, Value>,
}

impl From<&EventWire> for CanonicalWire {
    fn from(wire: &EventWire) -> Self {
        Self {
            id: wire.id.clone(),
            source_entity_id: wire.source_entity_id.clone(),
            source_event: wire.source_event.clone(),
            target_entity_id: wire.target_entity_id.clone(),
            target_action: wire.target_action.clone(),
            parameters: wire.parameters.clone(),
        }
    }
}

impl From<&CanonicalWire> for EventWire {
    fn from(wire: &CanonicalWire) -> Self {
        Self {
            id: wire.id.clone(),
            source_entity_id: wire.source_entity_id.clone(),
            source_event: wire.source_event.clone(),
            target_entity_id: wire.target_entity_id.clone(),
            target_action: wire.target_action.clone(),
            parameters: wire.parameters.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CanonicalEnvironment {
    pub skybox: CanonicalSkybox,
    pub fog: CanonicalFog,
    pub ambient_light: CanonicalAmbientLight,
    pub gravity: Vec3,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CanonicalSkybox {
    #[serde(rename = "type")]
    pub skybox_type: SkyboxType,
    #[serde(deserialize_with = "required_nullable")]
    pub color: Option<String>,
    #[serde(deserialize_with = "required_nullable")]
    pub uri: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CanonicalFog {
    pub enabled: bool,
    #[serde(rename = "type")]
    pub fog_type: FogType,
    pub color: String,
    pub near: f64,
    pub far: f64,
    pub density: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CanonicalAmbientLight {
    pub color: String,
    pub intensity: f64,
}

impl From<&EnvironmentSettings> for CanonicalEnvironment {
    fn from(env: &EnvironmentSettings) -> Self {
        Self {
            skybox: CanonicalSkybox {
                skybox_type: env.skybox.skybox_type,
                color: env.skybox.color.clone(),
                uri: env.skybox.uri.clone(),
            },
            fog: CanonicalFog {
                enabled: env.fog.enabled,
                fog_type: env.fog.fog_type,
                color: env.fog.color.clone(),
                near: env.fog.near,
                far: env.fog.far,
                density: env.fog.density,
            },
            ambient_light: CanonicalAmbientLight {
                color: env.ambient_light.color.clone(),
                intensity: env.ambient_light.intensity,
            },
            gravity: env.gravity,
        }
    }
}

impl From<&CanonicalEnvironment> for EnvironmentSettings {
    fn from(env: &CanonicalEnvironment) -> Self {
        Self {
            skybox: Skybox {
                skybox_type: env.skybox.skybox_type,
                color: env.skybox.color.clone(),
                uri: env.skybox.uri.clone(),
            },
            fog: Fog {
                enabled: env.fog.enabled,
                fog_type: env.fog.fog_type,
                color: env.fog.color.clone(),
                near: env.fog.near,
                far: env.fog.far,
                density: env.fog.density,
            },
            ambient_light: AmbientLight {
                color: env.ambient_light.color.clone(),
                intensity: env.ambient_light.intensity,
            },
            gravity: env.gravity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_environment_is_fully_explicit() {
        let env = CanonicalEnvironment::from(&EnvironmentSettings::default());
        let value = serde_json::to_value(&env).unwrap();
        assert_eq!(value["skybox"]["uri"], Value::Null);
        assert!(value["skybox"].as_object().unwrap().contains_key("uri"));
        assert_eq!(value["fog"]["density"], json!(0.01));
        assert_eq!(value["gravity"]["y"], json!(-9.81));
    }

    #[test]
    fn test_asset_nullable_fields_must_be_present() {
        let missing = json!({ "id": "a", "type": "mesh", "name": "A", "metadata": {} });
        assert!(serde_json::from_value::<CanonicalAsset>(missing).is_err());
        let explicit = json!({
            "id": "a", "type": "mesh", "name": "A", "uri": null, "data": null, "metadata": {}
        });
        let asset: CanonicalAsset = serde_json::from_value(explicit).unwrap();
        assert!(asset.uri.is_none() && asset.data.is_none());
    }

    #[test]
    fn test_wire_parameters_required() {
        let missing = json!({
            "id": "w", "sourceEntityId": "a", "sourceEvent": "click",
            "targetEntityId": "b", "targetAction": "open"
        });
        assert!(serde_json::from_value::<CanonicalWire>(missing).is_err());
    }

    #[test]
    fn test_component_strips_editor_meta() {
        let mut component = Component::new("Light").with_property("intensity", json!(1));
        component.editor_meta = Some(Map::from_iter([("collapsed".to_string(), json!(true))]));
        let canonical = CanonicalComponent::from(&component);
        let back = Component::from(&canonical);
        assert!(back.editor_meta.is_none());
        assert_eq!(back.properties, component.properties);
    }
}
