use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The type of an asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetType {
    Mesh,
    Texture,
    Material,
    Audio,
    Animation,
    Script,
    Prefab,
    Other,
}

impl std::fmt::Display for AssetType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssetType::Mesh => write!(f, "mesh"),
            AssetType::Texture => write!(f, "texture"),
            AssetType::Material => write!(f, "material"),
            AssetType::Audio => write!(f, "audio"),
            AssetType::Animation => write!(f, "animation"),
            AssetType::Script => write!(f, "script"),
            AssetType::Prefab => write!(f, "prefab"),
            AssetType::Other => write!(f, "other"),
        }
    }
}

/// A registered asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    /// Unique asset identifier.
    pub id: String,
    /// Type of the asset.
    #[serde(rename = "type")]
    pub asset_type: AssetType,
    /// Human-readable name.
    pub name: String,
    /// Where the asset bytes live, if external.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    /// Inline payload, if embedded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl Asset {
    pub fn new(id: impl Into<String>, asset_type: AssetType, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            asset_type,
            name: name.into(),
            uri: None,
            data: None,
            metadata: Map::new(),
        }
    }

    pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}
