//! Dot-path access into JSON property bags.
//!
//! Paths address nested objects only (`"shadow.bias"`, `"tracks.walk"`).
//! Writes create missing intermediate objects; [`capture_prior`] reports the
//! shallowest key a write would create so the write can be undone exactly.

use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("property path is empty")]
    Empty,

    #[error("property path '{0}' has an empty segment")]
    EmptySegment(String),

    #[error("cannot descend into '{segment}' of '{path}': not an object")]
    NotAnObject { path: String, segment: String },

    #[error("unknown property path '{0}'")]
    Unknown(String),
}

/// Split `a.b.c` into segments, rejecting empty paths and empty segments.
pub fn split_path(path: &str) -> Result<Vec<&str>, PathError> {
    if path.is_empty() {
        return Err(PathError::Empty);
    }
    let segments: Vec<&str> = path.split('.').collect();
    if segments.iter().any(|s| s.is_empty()) {
        return Err(PathError::EmptySegment(path.to_string()));
    }
    Ok(segments)
}

/// Read the value at `segments`, if every step exists.
pub fn get_path<'a>(root: &'a Map<String, Value>, segments: &[&str]) -> Option<&'a Value> {
    let (last, parents) = segments.split_last()?;
    let mut current = root;
    for segment in parents {
        current = current.get(*segment)?.as_object()?;
    }
    current.get(*last)
}

/// The state a write is about to overwrite.
#[derive(Debug, Clone, PartialEq)]
pub struct Prior {
    /// Path of the value that existed, or of the shallowest key the write will create.
    pub path: Vec<String>,
    /// `None` when `path` did not exist.
    pub value: Option<Value>,
}

impl Prior {
    pub fn dotted(&self) -> String {
        self.path.join(".")
    }
}

/// Capture what a write at `segments` would replace.
pub fn capture_prior(root: &Map<String, Value>, segments: &[&str]) -> Result<Prior, PathError> {
    let mut current = root;
    for (i, segment) in segments.iter().enumerate() {
        let is_last = i + 1 == segments.len();
        match current.get(*segment) {
            None => {
                return Ok(Prior {
                    path: segments[..=i].iter().map(|s| s.to_string()).collect(),
                    value: None,
                })
            }
            Some(value) if is_last => {
                return Ok(Prior {
                    path: segments.iter().map(|s| s.to_string()).collect(),
                    value: Some(value.clone()),
                })
            }
            Some(Value::Object(object)) => current = object,
            Some(_) => {
                return Err(PathError::NotAnObject {
                    path: segments.join("."),
                    segment: segment.to_string(),
                })
            }
        }
    }
    Err(PathError::Empty)
}

/// Write `value` at `segments`, or remove the key when `value` is `None`.
///
/// Missing intermediate objects are created for writes. Removing a key whose
/// parents do not exist is a no-op.
pub fn write_path(
    root: &mut Map<String, Value>,
    segments: &[&str],
    value: Option<Value>,
) -> Result<(), PathError> {
    let (last, parents) = segments.split_last().ok_or(PathError::Empty)?;
    let mut current = root;
    for segment in parents {
        if value.is_none() && !current.contains_key(*segment) {
            return Ok(());
        }
        let entry = current
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        current = match entry {
            Value::Object(object) => object,
            _ => {
                return Err(PathError::NotAnObject {
                    path: segments.join("."),
                    segment: segment.to_string(),
                })
            }
        };
    }
    match value {
        Some(v) => {
            current.insert(last.to_string(), v);
        }
        None => {
            current.remove(*last);
        }
    }
    Ok(())
}
