use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Per-engine escape-hatch data: engine name → engine-specific key/value pairs.
pub type Tuning = BTreeMap<String, Map<String, Value>>;

/// Component type that owns keyframe tracks.
pub const ANIMATION_COMPONENT: &str = "Animation";

/// Property of the animation component holding `trackName → { keyframes: [...] }`.
pub const ANIMATION_TRACKS_KEY: &str = "tracks";

/// A typed component attached to an entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Component {
    /// Key into the component registry.
    #[serde(rename = "type")]
    pub component_type: String,
    /// Open property bag; the core never interprets it.
    #[serde(default)]
    pub properties: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tuning: Option<Tuning>,
    /// Editor-only decoration (inspector state, collapsed sections). Not portable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub editor_meta: Option<Map<String, Value>>,
}

impl Component {
    pub fn new(component_type: impl Into<String>) -> Self {
        Self {
            component_type: component_type.into(),
            properties: Map::new(),
            tuning: None,
            editor_meta: None,
        }
    }

    /// Builder: set a top-level property.
    pub fn with_property(mut self, key: impl Into<String>, value: Value) -> Self {
        self.properties.insert(key.into(), value);
        self
    }

    /// Builder: set properties from an existing bag (e.g. registry defaults).
    pub fn with_properties(mut self, properties: Map<String, Value>) -> Self {
        self.properties = properties;
        self
    }

    /// Builder: set one engine-specific tuning value.
    pub fn with_tuning(mut self, engine: &str, key: &str, value: Value) -> Self {
        self.tuning
            .get_or_insert_with(Tuning::new)
            .entry(engine.to_string())
            .or_default()
            .insert(key.to_string(), value);
        self
    }

    pub fn is_animation(&self) -> bool {
        self.component_type == ANIMATION_COMPONENT
    }
}

/// How a keyframe interpolates towards the next one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Interpolation {
    #[default]
    Linear,
    Step,
    CubicSpline,
}

/// One keyframe in an animation track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    /// Time in seconds from the start of the clip.
    pub time: f64,
    pub value: Value,
    #[serde(default)]
    pub interpolation: Interpolation,
}

impl Keyframe {
    pub fn new(time: f64, value: Value) -> Self {
        Self {
            time,
            value,
            interpolation: Interpolation::Linear,
        }
    }

    pub fn with_interpolation(mut self, interpolation: Interpolation) -> Self {
        self.interpolation = interpolation;
        self
    }

    /// JSON form as stored inside a track's `keyframes` list.
    pub fn to_value(&self) -> Value {
        let mut object = Map::new();
        object.insert("time".into(), Value::from(self.time));
        object.insert("value".into(), self.value.clone());
        let interpolation = match self.interpolation {
            Interpolation::Linear => "linear",
            Interpolation::Step => "step",
            Interpolation::CubicSpline => "cubicSpline",
        };
        object.insert("interpolation".into(), Value::from(interpolation));
        Value::Object(object)
    }
}

/// Read a stored keyframe's time, if it has a numeric one.
pub fn keyframe_time(keyframe: &Value) -> Option<f64> {
    keyframe.get("time").and_then(Value::as_f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_component_builders() {
        let c = Component::new("Light")
            .with_property("intensity", json!(2.0))
            .with_tuning("babylon", "shadowBias", json!(0.001));
        assert_eq!(c.properties["intensity"], json!(2.0));
        assert_eq!(
            c.tuning.as_ref().unwrap()["babylon"]["shadowBias"],
            json!(0.001)
        );
        assert!(!c.is_animation());
    }

    #[test]
    fn test_component_wire_shape() {
        let c: Component = serde_json::from_value(json!({ "type": "Camera" })).unwrap();
        assert_eq!(c.component_type, "Camera");
        assert!(c.properties.is_empty());
        let back = serde_json::to_value(&c).unwrap();
        assert_eq!(back, json!({ "type": "Camera", "properties": {} }));
    }

    #[test]
    fn test_keyframe_value_matches_serde_shape() {
        let kf = Keyframe::new(0.5, json!(3)).with_interpolation(Interpolation::Step);
        assert_eq!(kf.to_value(), serde_json::to_value(&kf).unwrap());
        assert_eq!(keyframe_time(&kf.to_value()), Some(0.5));
    }
}
