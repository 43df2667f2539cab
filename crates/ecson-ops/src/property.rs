//! Dot-path property vocabulary for `SetProperty`.
//!
//! Entity paths are restricted to a fixed set of roots. Each write goes
//! through the field's serde shape, so a value that does not fit the field
//! is rejected before the entity or document changes.

use ecson_doc::path::{capture_prior, get_path, split_path, write_path, Prior};
use ecson_doc::{Entity, PathError, SceneDocument};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{OpError, OpResult};

/// Outcome of one property write, enough to build the exact inverse.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyWrite {
    /// What the write replaced (or the shallowest key it created).
    pub prior: Prior,
    /// The value now stored at `prior.path`, `None` when that key is gone.
    pub current: Option<Value>,
}

impl PropertyWrite {
    pub fn inverse_path(&self) -> String {
        self.prior.dotted()
    }
}

const VECTOR_PARTS: [&str; 3] = ["position", "rotation", "scale"];

/// Check an entity path against the vocabulary.
///
/// Returns whether the addressed key may be removed (absent value).
fn check_entity_path(path: &str, segments: &[&str]) -> OpResult<bool> {
    let unknown = || OpError::Path(PathError::Unknown(path.to_string()));
    match segments {
        ["name"] | ["visible"] | ["locked"] | ["tags"] | ["transform"] => Ok(false),
        ["transform", part] if VECTOR_PARTS.contains(part) => Ok(false),
        ["transform", part, axis] if VECTOR_PARTS.contains(part) => {
            let axes: &[&str] = if *part == "rotation" {
                &["x", "y", "z", "w"]
            } else {
                &["x", "y", "z"]
            };
            if axes.contains(axis) {
                Ok(false)
            } else {
                Err(unknown())
            }
        }
        ["tuning", ..] => Ok(true),
        _ => Err(unknown()),
    }
}

/// Check a document-level path. Environment paths must already exist.
fn check_document_path(
    doc: &SceneDocument,
    path: &str,
    segments: &[&str],
) -> OpResult<bool> {
    match segments {
        ["name"] => Ok(false),
        ["environment", rest @ ..] => {
            if !rest.is_empty() {
                let environment = to_object(&doc.environment)?;
                if get_path(&environment, rest).is_none() {
                    return Err(OpError::Path(PathError::Unknown(path.to_string())));
                }
            }
            Ok(false)
        }
        ["gameSettings", ..] => Ok(true),
        ["metadata", rest @ ..] => Ok(!rest.is_empty()),
        _ => Err(OpError::Path(PathError::Unknown(path.to_string()))),
    }
}

fn to_object<T: Serialize>(value: &T) -> OpResult<Map<String, Value>> {
    match serde_json::to_value(value)? {
        Value::Object(object) => Ok(object),
        _ => Ok(Map::new()),
    }
}

/// Write through one typed field. `segments[0]` names the field; the rest
/// address inside its serialized form. Nothing changes unless the result
/// deserializes back into `T`.
fn write_field<T>(
    field: &mut T,
    path: &str,
    segments: &[&str],
    value: Option<Value>,
) -> OpResult<PropertyWrite>
where
    T: Serialize + DeserializeOwned,
{
    let root = segments[0];
    let mut bag = Map::new();
    let serialized = serde_json::to_value(&*field)?;
    if !serialized.is_null() {
        bag.insert(root.to_string(), serialized);
    }

    let prior = capture_prior(&bag, segments)?;
    write_path(&mut bag, segments, value)?;

    let prior_segments: Vec<&str> = prior.path.iter().map(String::as_str).collect();
    let current = get_path(&bag, &prior_segments).cloned();

    let next = bag.remove(root).unwrap_or(Value::Null);
    let parsed: T = serde_json::from_value(next).map_err(|e| OpError::InvalidValue {
        path: path.to_string(),
        message: e.to_string(),
    })?;
    *field = parsed;
    Ok(PropertyWrite { prior, current })
}

fn reject_removal(path: &str) -> OpError {
    OpError::InvalidValue {
        path: path.to_string(),
        message: "this field cannot be removed".into(),
    }
}

/// Set (or, with `None`, remove) a property of an entity.
pub fn set_entity_property(
    entity: &mut Entity,
    path: &str,
    value: Option<Value>,
) -> OpResult<PropertyWrite> {
    let segments = split_path(path)?;
    let removable = check_entity_path(path, &segments)?;
    if value.is_none() && !removable {
        return Err(reject_removal(path));
    }
    match segments[0] {
        "name" => write_field(&mut entity.name, path, &segments, value),
        "visible" => write_field(&mut entity.visible, path, &segments, value),
        "locked" => write_field(&mut entity.locked, path, &segments, value),
        "tags" => write_field(&mut entity.tags, path, &segments, value),
        "transform" => write_field(&mut entity.transform, path, &segments, value),
        "tuning" => write_field(&mut entity.tuning, path, &segments, value),
        _ => Err(OpError::Path(PathError::Unknown(path.to_string()))),
    }
}

/// Set (or remove) a document-level property.
pub fn set_document_property(
    doc: &mut SceneDocument,
    path: &str,
    value: Option<Value>,
) -> OpResult<PropertyWrite> {
    let segments = split_path(path)?;
    let removable = check_document_path(doc, path, &segments)?;
    if value.is_none() && !removable {
        return Err(reject_removal(path));
    }
    match segments[0] {
        "name" => write_field(&mut doc.name, path, &segments, value),
        "environment" => write_field(&mut doc.environment, path, &segments, value),
        "gameSettings" => write_field(&mut doc.game_settings, path, &segments, value),
        "metadata" => write_field(&mut doc.metadata, path, &segments, value),
        _ => Err(OpError::Path(PathError::Unknown(path.to_string()))),
    }
}

/// Set (or remove) a key inside an open component property bag.
pub fn set_bag_property(
    properties: &mut Map<String, Value>,
    path: &str,
    value: Option<Value>,
) -> OpResult<PropertyWrite> {
    let segments = split_path(path)?;
    let prior = capture_prior(properties, &segments)?;
    write_path(properties, &segments, value)?;
    let prior_segments: Vec<&str> = prior.path.iter().map(String::as_str).collect();
    let current = get_path(properties, &prior_segments).cloned();
    Ok(PropertyWrite { prior, current })
}
