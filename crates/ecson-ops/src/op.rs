use std::collections::BTreeSet;

use ecson_core::serde_helpers::present_value;
use ecson_core::Transform;
use ecson_doc::{Asset, Component, Entity, Tuning};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::wire::OpWire;

/// Payload shape version produced by this engine.
pub const CURRENT_OP_VERSION: u32 = 1;

/// Who produced an op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OpOrigin {
    #[default]
    User,
    Ai,
    System,
    Replay,
}

/// One atomic, invertible document edit: common envelope plus typed payload.
///
/// Serializes as `{ id, timestamp, origin, version, type, payload }`.
/// Decoding goes through [`OpWire`] so older payload versions are migrated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "OpWire")]
pub struct PatchOp {
    pub id: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: u64,
    pub origin: OpOrigin,
    pub version: u32,
    #[serde(flatten)]
    pub kind: OpKind,
}

/// The op vocabulary. The variant name is the wire `type` tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all_fields = "camelCase")]
pub enum OpKind {
    CreateEntity {
        entity_id: String,
        name: String,
        /// `None` creates a detached entity.
        #[serde(default)]
        parent_id: Option<String>,
        /// Sibling position; appended when absent.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        index: Option<usize>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        transform: Option<Transform>,
        #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
        tags: BTreeSet<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        visible: Option<bool>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        locked: Option<bool>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tuning: Option<Tuning>,
    },
    DeleteEntity {
        entity_id: String,
        /// Informational snapshot of the entity as created.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        previous_state: Option<Entity>,
    },
    SetProperty {
        entity_id: String,
        path: String,
        /// Absent removes the key.
        #[serde(
            default,
            deserialize_with = "present_value",
            skip_serializing_if = "Option::is_none"
        )]
        value: Option<Value>,
        /// Informational; the engine reads the real prior value itself.
        #[serde(
            default,
            deserialize_with = "present_value",
            skip_serializing_if = "Option::is_none"
        )]
        previous_value: Option<Value>,
    },
    AddChild {
        parent_id: String,
        child_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        index: Option<usize>,
    },
    RemoveChild {
        parent_id: String,
        child_id: String,
    },
    Reparent {
        entity_id: String,
        new_parent_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        new_index: Option<usize>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        old_parent_id: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        old_index: Option<usize>,
    },
    AddComponent {
        entity_id: String,
        component: Component,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        index: Option<usize>,
    },
    RemoveComponent {
        entity_id: String,
        component_type: String,
        /// Exact position; the first component of the type when absent.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        index: Option<usize>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        previous_component: Option<Component>,
    },
    SetComponentProperty {
        entity_id: String,
        component_type: String,
        property_path: String,
        #[serde(
            default,
            deserialize_with = "present_value",
            skip_serializing_if = "Option::is_none"
        )]
        value: Option<Value>,
        #[serde(
            default,
            deserialize_with = "present_value",
            skip_serializing_if = "Option::is_none"
        )]
        previous_value: Option<Value>,
    },
    AddAsset {
        asset: Asset,
    },
    RemoveAsset {
        asset_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        previous_asset: Option<Asset>,
    },
    ReplaceAssetRef {
        entity_id: String,
        component_type: String,
        property_path: String,
        old_asset_id: String,
        new_asset_id: String,
    },
    AddKeyframe {
        entity_id: String,
        track_name: String,
        /// Object with a numeric `time` and a `value`.
        keyframe: Value,
        /// Exact list position; sorted by time when absent.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        index: Option<usize>,
    },
    RemoveKeyframe {
        entity_id: String,
        track_name: String,
        time: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        previous_keyframe: Option<Value>,
    },
    SetKeyframeValue {
        entity_id: String,
        track_name: String,
        time: f64,
        value: Value,
        #[serde(
            default,
            deserialize_with = "present_value",
            skip_serializing_if = "Option::is_none"
        )]
        previous_value: Option<Value>,
    },
    BatchOp {
        ops: Vec<PatchOp>,
    },
}

impl OpKind {
    /// Wire `type` tag.
    pub fn type_name(&self) -> &'static str {
        match self {
            OpKind::CreateEntity { .. } => "CreateEntity",
            OpKind::DeleteEntity { .. } => "DeleteEntity",
            OpKind::SetProperty { .. } => "SetProperty",
            OpKind::AddChild { .. } => "AddChild",
            OpKind::RemoveChild { .. } => "RemoveChild",
            OpKind::Reparent { .. } => "Reparent",
            OpKind::AddComponent { .. } => "AddComponent",
            OpKind::RemoveComponent { .. } => "RemoveComponent",
            OpKind::SetComponentProperty { .. } => "SetComponentProperty",
            OpKind::AddAsset { .. } => "AddAsset",
            OpKind::RemoveAsset { .. } => "RemoveAsset",
            OpKind::ReplaceAssetRef { .. } => "ReplaceAssetRef",
            OpKind::AddKeyframe { .. } => "AddKeyframe",
            OpKind::RemoveKeyframe { .. } => "RemoveKeyframe",
            OpKind::SetKeyframeValue { .. } => "SetKeyframeValue",
            OpKind::BatchOp { .. } => "BatchOp",
        }
    }

    /// Every wire `type` tag, in declaration order.
    pub const TYPE_NAMES: [&'static str; 16] = [
        "CreateEntity",
        "DeleteEntity",
        "SetProperty",
        "AddChild",
        "RemoveChild",
        "Reparent",
        "AddComponent",
        "RemoveComponent",
        "SetComponentProperty",
        "AddAsset",
        "RemoveAsset",
        "ReplaceAssetRef",
        "AddKeyframe",
        "RemoveKeyframe",
        "SetKeyframeValue",
        "BatchOp",
    ];

    pub fn create_entity(
        entity_id: impl Into<String>,
        name: impl Into<String>,
        parent_id: impl Into<String>,
    ) -> Self {
        OpKind::CreateEntity {
            entity_id: entity_id.into(),
            name: name.into(),
            parent_id: Some(parent_id.into()),
            index: None,
            transform: None,
            tags: BTreeSet::new(),
            visible: None,
            locked: None,
            tuning: None,
        }
    }

    pub fn delete_entity(entity_id: impl Into<String>) -> Self {
        OpKind::DeleteEntity {
            entity_id: entity_id.into(),
            previous_state: None,
        }
    }

    pub fn set_property(entity_id: impl Into<String>, path: impl Into<String>, value: Value) -> Self {
        OpKind::SetProperty {
            entity_id: entity_id.into(),
            path: path.into(),
            value: Some(value),
            previous_value: None,
        }
    }

    pub fn reparent(entity_id: impl Into<String>, new_parent_id: impl Into<String>) -> Self {
        OpKind::Reparent {
            entity_id: entity_id.into(),
            new_parent_id: new_parent_id.into(),
            new_index: None,
            old_parent_id: None,
            old_index: None,
        }
    }

    pub fn add_component(entity_id: impl Into<String>, component: Component) -> Self {
        OpKind::AddComponent {
            entity_id: entity_id.into(),
            component,
            index: None,
        }
    }

    pub fn remove_component(
        entity_id: impl Into<String>,
        component_type: impl Into<String>,
    ) -> Self {
        OpKind::RemoveComponent {
            entity_id: entity_id.into(),
            component_type: component_type.into(),
            index: None,
            previous_component: None,
        }
    }

    pub fn set_component_property(
        entity_id: impl Into<String>,
        component_type: impl Into<String>,
        property_path: impl Into<String>,
        value: Value,
    ) -> Self {
        OpKind::SetComponentProperty {
            entity_id: entity_id.into(),
            component_type: component_type.into(),
            property_path: property_path.into(),
            value: Some(value),
            previous_value: None,
        }
    }
}

impl PatchOp {
    /// Wrap a payload in a fresh envelope (generated id, current time, user origin).
    pub fn new(kind: OpKind) -> Self {
        Self {
            id: ecson_core::id::generate_id(),
            timestamp: ecson_core::id::now_millis(),
            origin: OpOrigin::User,
            version: CURRENT_OP_VERSION,
            kind,
        }
    }

    /// Group ops into one undo unit.
    pub fn batch(ops: Vec<PatchOp>) -> Self {
        Self::new(OpKind::BatchOp { ops })
    }

    pub fn with_origin(mut self, origin: OpOrigin) -> Self {
        self.origin = origin;
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_timestamp(mut self, timestamp: u64) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn op_type(&self) -> &'static str {
        self.kind.type_name()
    }

    pub fn is_batch(&self) -> bool {
        matches!(self.kind, OpKind::BatchOp { .. })
    }

    /// Envelope for an inverse of this op: fresh id and time, same origin.
    pub(crate) fn derive(&self, kind: OpKind) -> PatchOp {
        PatchOp {
            origin: self.origin,
            ..PatchOp::new(kind)
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl From<OpKind> for PatchOp {
    fn from(kind: OpKind) -> Self {
        PatchOp::new(kind)
    }
}
