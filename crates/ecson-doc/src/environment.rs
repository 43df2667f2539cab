use ecson_core::Vec3;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkyboxType {
    #[default]
    Color,
    Gradient,
    Image,
    Hdri,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Skybox {
    #[serde(rename = "type")]
    pub skybox_type: SkyboxType,
    pub color: Option<String>,
    pub uri: Option<String>,
}

impl Default for Skybox {
    fn default() -> Self {
        Self {
            skybox_type: SkyboxType::Color,
            color: Some("#87ceeb".to_string()),
            uri: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FogType {
    #[default]
    Linear,
    Exponential,
    Exponential2,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Fog {
    pub enabled: bool,
    #[serde(rename = "type")]
    pub fog_type: FogType,
    pub color: String,
    pub near: f64,
    pub far: f64,
    pub density: f64,
}

impl Default for Fog {
    fn default() -> Self {
        Self {
            enabled: false,
            fog_type: FogType::Linear,
            color: "#cccccc".to_string(),
            near: 10.0,
            far: 100.0,
            density: 0.01,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AmbientLight {
    pub color: String,
    pub intensity: f64,
}

impl Default for AmbientLight {
    fn default() -> Self {
        Self {
            color: "#ffffff".to_string(),
            intensity: 0.5,
        }
    }
}

/// Scene-wide environment. Any field missing from a stored document is
/// filled with its default on load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct EnvironmentSettings {
    pub skybox: Skybox,
    pub fog: Fog,
    pub ambient_light: AmbientLight,
    pub gravity: Vec3,
}

impl Default for EnvironmentSettings {
    fn default() -> Self {
        Self {
            skybox: Skybox::default(),
            fog: Fog::default(),
            ambient_light: AmbientLight::default(),
            gravity: Vec3::new(0.0, -9.81, 0.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_environment_fills_defaults() {
        let env: EnvironmentSettings = serde_json::from_value(serde_json::json!({
            "fog": { "enabled": true, "type": "exponential" }
        }))
        .unwrap();
        assert!(env.fog.enabled);
        assert_eq!(env.fog.fog_type, FogType::Exponential);
        assert!((env.fog.density - 0.01).abs() < 1e-12);
        assert_eq!(env.gravity, Vec3::new(0.0, -9.81, 0.0));
        assert_eq!(env.skybox.color.as_deref(), Some("#87ceeb"));
    }

    #[test]
    fn test_nullable_fields_serialize_as_null() {
        let value = serde_json::to_value(EnvironmentSettings::default()).unwrap();
        assert!(value["skybox"]["uri"].is_null());
        assert!(value["skybox"].as_object().unwrap().contains_key("uri"));
    }

    #[test]
    fn test_unknown_environment_field_rejected() {
        let err = serde_json::from_value::<EnvironmentSettings>(serde_json::json!({
            "fog": { "thickness": 3 }
        }));
        assert!(err.is_err());
    }
}
