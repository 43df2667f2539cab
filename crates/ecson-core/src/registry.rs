use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::error::{EcsonError, EcsonResult};

// ──────────────────────────────────────────────────────────────────────────────
// Field descriptors
// ──────────────────────────────────────────────────────────────────────────────

/// Declarative editor-facing kind of a component field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum FieldKind {
    Number {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<f64>,
    },
    Boolean,
    String,
    Color,
    Vec3,
    Enum {
        options: Vec<String>,
    },
    AssetRef {
        #[serde(rename = "assetType")]
        asset_type: String,
    },
    EntityRef,
    Json,
}

impl FieldKind {
    fn number() -> Self {
        FieldKind::Number {
            min: None,
            max: None,
        }
    }

    fn range(min: f64, max: f64) -> Self {
        FieldKind::Number {
            min: Some(min),
            max: Some(max),
        }
    }

    fn one_of(options: &[&str]) -> Self {
        FieldKind::Enum {
            options: options.iter().map(|o| o.to_string()).collect(),
        }
    }

    fn asset(asset_type: &str) -> Self {
        FieldKind::AssetRef {
            asset_type: asset_type.to_string(),
        }
    }
}

/// One property of a component type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDescriptor {
    pub name: String,
    #[serde(flatten)]
    pub kind: FieldKind,
    pub default: Value,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, kind: FieldKind, default: Value) -> Self {
        Self {
            name: name.into(),
            kind,
            default,
        }
    }
}

/// Self-description of a component type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentDescriptor {
    /// Type tag stored in `Component::component_type`.
    pub type_name: String,
    /// At most one instance per entity.
    pub singleton: bool,
    pub category: String,
    pub fields: Vec<FieldDescriptor>,
}

impl fmt::Display for ComponentDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.type_name, self.category)?;
        if self.singleton {
            write!(f, " [singleton]")?;
        }
        Ok(())
    }
}

impl ComponentDescriptor {
    pub fn new(type_name: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            singleton: false,
            category: category.into(),
            fields: Vec::new(),
        }
    }

    pub fn singleton(mut self) -> Self {
        self.singleton = true;
        self
    }

    pub fn field(mut self, name: &str, kind: FieldKind, default: Value) -> Self {
        self.fields.push(FieldDescriptor::new(name, kind, default));
        self
    }

    pub fn get_field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }
}

// ──────────────────────────────────────────────────────────────────────────────
// Component Registry
// ──────────────────────────────────────────────────────────────────────────────

/// Registry of component types, built once and passed by reference.
#[derive(Debug, Clone, Default)]
pub struct ComponentRegistry {
    descriptors: BTreeMap<String, ComponentDescriptor>,
}

impl ComponentRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            descriptors: BTreeMap::new(),
        }
    }

    /// Registry preloaded with the built-in component types.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        for descriptor in builtin_descriptors() {
            // Built-in type names are unique.
            let _ = registry.register(descriptor);
        }
        registry
    }

    /// Register a component type. Registering the same type twice is an error.
    pub fn register(&mut self, descriptor: ComponentDescriptor) -> EcsonResult<()> {
        if descriptor.type_name.is_empty() {
            return Err(EcsonError::Registry(
                "component type name must not be empty".into(),
            ));
        }
        if self.descriptors.contains_key(&descriptor.type_name) {
            return Err(EcsonError::Registry(format!(
                "component type '{}' is already registered",
                descriptor.type_name
            )));
        }
        self.descriptors
            .insert(descriptor.type_name.clone(), descriptor);
        Ok(())
    }

    /// Look up a component type.
    pub fn get(&self, type_name: &str) -> Option<&ComponentDescriptor> {
        self.descriptors.get(type_name)
    }

    /// Whether the type allows at most one instance per entity. Unknown types never do.
    pub fn is_singleton(&self, type_name: &str) -> bool {
        self.get(type_name).map(|d| d.singleton).unwrap_or(false)
    }

    /// Property bag holding every field's default value.
    pub fn default_properties(&self, type_name: &str) -> Option<Map<String, Value>> {
        self.get(type_name).map(|d| {
            d.fields
                .iter()
                .map(|f| (f.name.clone(), f.default.clone()))
                .collect()
        })
    }

    /// Declared options of an enum-typed field.
    pub fn enum_options(&self, type_name: &str, field: &str) -> Option<&[String]> {
        match &self.get(type_name)?.get_field(field)?.kind {
            FieldKind::Enum { options } => Some(options.as_slice()),
            _ => None,
        }
    }

    /// All registered type names, sorted.
    pub fn types(&self) -> impl Iterator<Item = &str> {
        self.descriptors.keys().map(|k| k.as_str())
    }

    /// Number of registered types.
    pub fn count(&self) -> usize {
        self.descriptors.len()
    }
}

fn builtin_descriptors() -> Vec<ComponentDescriptor> {
    vec![
        ComponentDescriptor::new("MeshRenderer", "rendering")
            .field(
                "primitive",
                FieldKind::one_of(&["box", "sphere", "cylinder", "capsule", "plane", "cone", "torus"]),
                json!("box"),
            )
            .field("meshAssetId", FieldKind::asset("mesh"), Value::Null)
            .field("castShadows", FieldKind::Boolean, json!(true))
            .field("receiveShadows", FieldKind::Boolean, json!(true)),
        ComponentDescriptor::new("Material", "rendering")
            .field("baseColor", FieldKind::Color, json!("#ffffff"))
            .field("metallic", FieldKind::range(0.0, 1.0), json!(0.0))
            .field("roughness", FieldKind::range(0.0, 1.0), json!(0.5))
            .field("emissive", FieldKind::Color, json!("#000000"))
            .field("opacity", FieldKind::range(0.0, 1.0), json!(1.0))
            .field("textureAssetId", FieldKind::asset("texture"), Value::Null),
        ComponentDescriptor::new("Light", "rendering")
            .singleton()
            .field(
                "lightType",
                FieldKind::one_of(&["directional", "point", "spot"]),
                json!("point"),
            )
            .field("color", FieldKind::Color, json!("#ffffff"))
            .field("intensity", FieldKind::range(0.0, 100.0), json!(1.0))
            .field("range", FieldKind::number(), json!(10.0))
            .field("angle", FieldKind::range(0.0, 180.0), json!(45.0))
            .field("castShadows", FieldKind::Boolean, json!(false)),
        ComponentDescriptor::new("Camera", "rendering")
            .singleton()
            .field(
                "projection",
                FieldKind::one_of(&["perspective", "orthographic"]),
                json!("perspective"),
            )
            .field("fov", FieldKind::range(1.0, 179.0), json!(60.0))
            .field("near", FieldKind::number(), json!(0.1))
            .field("far", FieldKind::number(), json!(1000.0)),
        ComponentDescriptor::new("RigidBody", "physics")
            .singleton()
            .field(
                "bodyType",
                FieldKind::one_of(&["dynamic", "static", "kinematic"]),
                json!("dynamic"),
            )
            .field("mass", FieldKind::range(0.0, 10000.0), json!(1.0))
            .field("gravityScale", FieldKind::number(), json!(1.0)),
        ComponentDescriptor::new("Collider", "physics")
            .field(
                "shape",
                FieldKind::one_of(&["box", "sphere", "capsule", "mesh"]),
                json!("box"),
            )
            .field("size", FieldKind::Vec3, json!({ "x": 1.0, "y": 1.0, "z": 1.0 }))
            .field("isTrigger", FieldKind::Boolean, json!(false)),
        ComponentDescriptor::new("AudioSource", "audio")
            .field("audioAssetId", FieldKind::asset("audio"), Value::Null)
            .field("volume", FieldKind::range(0.0, 1.0), json!(1.0))
            .field("loop", FieldKind::Boolean, json!(false))
            .field("autoplay", FieldKind::Boolean, json!(false)),
        ComponentDescriptor::new("Animation", "animation")
            .singleton()
            .field("tracks", FieldKind::Json, json!({}))
            .field("autoplay", FieldKind::Boolean, json!(true))
            .field("loop", FieldKind::Boolean, json!(true)),
        ComponentDescriptor::new("Script", "logic")
            .field("scriptAssetId", FieldKind::asset("script"), Value::Null)
            .field("params", FieldKind::Json, json!({})),
        ComponentDescriptor::new("SpawnPoint", "gameplay")
            .field("team", FieldKind::String, json!(""))
            .field("target", FieldKind::EntityRef, Value::Null),
    ]
}
