//! Map a single op to the cheapest renderer update that reflects it.
//!
//! Only a few property writes are incremental. Everything structural, and
//! anything not recognized, is a [`Delta::FullRebuild`].

use ecson_core::{Quat, Vec3};
use ecson_doc::DOCUMENT_TARGET;
use ecson_ops::{OpKind, PatchOp};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

const ENVIRONMENT_PREFIX: &str = "environment.";

/// Transform parts touched by a write; absent parts are unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PartialTransform {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Vec3>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<Quat>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<Vec3>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all_fields = "camelCase")]
pub enum Delta {
    NodeTransform {
        node_id: String,
        transform: PartialTransform,
    },
    NodeVisibility {
        node_id: String,
        visible: bool,
    },
    ComponentProperty {
        node_id: String,
        /// Component type; the adapter resolves the instance from it.
        component_key: String,
        property: String,
        value: Value,
    },
    Environment {
        /// Path below `environment.`.
        path: String,
        value: Value,
    },
    FullRebuild {},
}

impl Delta {
    pub fn is_full_rebuild(&self) -> bool {
        matches!(self, Delta::FullRebuild {})
    }
}

/// Classify one op. Total and deterministic: never fails, same op → same delta.
pub fn classify_delta(op: &PatchOp) -> Delta {
    match &op.kind {
        OpKind::SetProperty {
            entity_id,
            path,
            value: Some(value),
            ..
        } => classify_property(entity_id, path, value),
        OpKind::SetComponentProperty {
            entity_id,
            component_type,
            property_path,
            value: Some(value),
            ..
        } => Delta::ComponentProperty {
            node_id: entity_id.clone(),
            component_key: component_type.clone(),
            property: property_path.clone(),
            value: value.clone(),
        },
        _ => Delta::FullRebuild {},
    }
}

fn decode<T: DeserializeOwned>(value: &Value) -> Option<T> {
    T::deserialize(value).ok()
}

fn classify_property(entity_id: &str, path: &str, value: &Value) -> Delta {
    if entity_id == DOCUMENT_TARGET {
        return match path.strip_prefix(ENVIRONMENT_PREFIX) {
            Some(rest) if !rest.is_empty() => Delta::Environment {
                path: rest.to_string(),
                value: value.clone(),
            },
            _ => Delta::FullRebuild {},
        };
    }

    let transform = match path {
        "transform" => decode::<ecson_core::Transform>(value).map(|t| PartialTransform {
            position: Some(t.position),
            rotation: Some(t.rotation),
            scale: Some(t.scale),
        }),
        "transform.position" => decode(value).map(|v| PartialTransform {
            position: Some(v),
            ..PartialTransform::default()
        }),
        "transform.rotation" => decode(value).map(|q| PartialTransform {
            rotation: Some(q),
            ..PartialTransform::default()
        }),
        "transform.scale" => decode(value).map(|v| PartialTransform {
            scale: Some(v),
            ..PartialTransform::default()
        }),
        "visible" => {
            return match value.as_bool() {
                Some(visible) => Delta::NodeVisibility {
                    node_id: entity_id.to_string(),
                    visible,
                },
                None => Delta::FullRebuild {},
            }
        }
        _ => None,
    };

    match transform {
        Some(transform) => Delta::NodeTransform {
            node_id: entity_id.to_string(),
            transform,
        },
        None => Delta::FullRebuild {},
    }
}
