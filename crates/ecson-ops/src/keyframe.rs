//! Keyframe list edits on an entity's `Animation` component.
//!
//! Tracks live at `properties.tracks.<name>.keyframes` and are kept sorted
//! by `time` unless a caller inserts at an explicit position (undo does).

use ecson_doc::component::{keyframe_time, ANIMATION_COMPONENT, ANIMATION_TRACKS_KEY};
use ecson_doc::Entity;
use serde_json::Value;

use crate::error::{OpError, OpResult};

const KEYFRAMES_KEY: &str = "keyframes";

fn track_mut<'a>(entity: &'a mut Entity, track: &str) -> OpResult<&'a mut Vec<Value>> {
    let entity_id = entity.id.clone();
    let animation =
        entity
            .component_mut(ANIMATION_COMPONENT)
            .ok_or_else(|| OpError::ComponentNotFound {
                entity: entity_id.clone(),
                component_type: ANIMATION_COMPONENT.to_string(),
            })?;
    animation
        .properties
        .get_mut(ANIMATION_TRACKS_KEY)
        .and_then(|tracks| tracks.get_mut(track))
        .and_then(|t| t.get_mut(KEYFRAMES_KEY))
        .and_then(Value::as_array_mut)
        .ok_or_else(|| OpError::TrackNotFound {
            entity: entity_id,
            track: track.to_string(),
        })
}

fn position_of(keyframes: &[Value], time: f64) -> Option<usize> {
    keyframes.iter().position(|k| keyframe_time(k) == Some(time))
}

/// Insert a keyframe. Returns the index it landed at.
pub fn add_keyframe(
    entity: &mut Entity,
    track: &str,
    keyframe: &Value,
    index: Option<usize>,
) -> OpResult<usize> {
    let invalid = |message: &str| OpError::InvalidValue {
        path: format!("{ANIMATION_TRACKS_KEY}.{track}.{KEYFRAMES_KEY}"),
        message: message.to_string(),
    };
    let time = keyframe_time(keyframe).ok_or_else(|| invalid("keyframe needs a numeric 'time'"))?;
    if !time.is_finite() || time < 0.0 {
        return Err(invalid("keyframe time must be a finite, non-negative number"));
    }
    if keyframe.get("value").is_none() {
        return Err(invalid("keyframe needs a 'value'"));
    }

    let keyframes = track_mut(entity, track)?;
    if position_of(keyframes, time).is_some() {
        return Err(OpError::KeyframeExists {
            track: track.to_string(),
            time,
        });
    }
    let at = match index {
        Some(i) => i.min(keyframes.len()),
        None => keyframes
            .iter()
            .position(|k| keyframe_time(k).is_some_and(|t| t > time))
            .unwrap_or(keyframes.len()),
    };
    keyframes.insert(at, keyframe.clone());
    Ok(at)
}

/// Remove the keyframe at `time`. Returns its index and the removed value.
pub fn remove_keyframe(entity: &mut Entity, track: &str, time: f64) -> OpResult<(usize, Value)> {
    let keyframes = track_mut(entity, track)?;
    let at = position_of(keyframes, time).ok_or_else(|| OpError::KeyframeNotFound {
        track: track.to_string(),
        time,
    })?;
    Ok((at, keyframes.remove(at)))
}

/// Replace the `value` of the keyframe at `time`. Returns the previous value.
/// A keyframe without a `value` is rejected untouched.
pub fn set_keyframe_value(
    entity: &mut Entity,
    track: &str,
    time: f64,
    value: Value,
) -> OpResult<Value> {
    let keyframes = track_mut(entity, track)?;
    let keyframe = keyframes
        .iter_mut()
        .find(|k| keyframe_time(k) == Some(time))
        .and_then(Value::as_object_mut)
        .ok_or_else(|| OpError::KeyframeNotFound {
            track: track.to_string(),
            time,
        })?;
    match keyframe.get_mut("value") {
        Some(slot) => Ok(std::mem::replace(slot, value)),
        None => Err(OpError::InvalidValue {
            path: format!("{ANIMATION_TRACKS_KEY}.{track}.{KEYFRAMES_KEY}"),
            message: format!("keyframe at time {time} has no 'value'"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ecson_doc::Component;
    use serde_json::json;

    fn animated() -> Entity {
        let mut e = Entity::new("e1", "Dancer");
        e.components.push(Component::new("Animation").with_property(
            "tracks",
            json!({ "walk": { "keyframes": [
                { "time": 0.0, "value": 0 },
                { "time": 1.0, "value": 10 }
            ] } }),
        ));
        e
    }

    fn times(e: &mut Entity) -> Vec<f64> {
        track_mut(e, "walk")
            .unwrap()
            .iter()
            .filter_map(keyframe_time)
            .collect()
    }

    #[test]
    fn test_add_keeps_sorted() {
        let mut e = animated();
        let at = add_keyframe(&mut e, "walk", &json!({ "time": 0.5, "value": 5 }), None).unwrap();
        assert_eq!(at, 1);
        assert_eq!(times(&mut e), vec![0.0, 0.5, 1.0]);
    }

    #[test]
    fn test_duplicate_time_rejected() {
        let mut e = animated();
        let err = add_keyframe(&mut e, "walk", &json!({ "time": 1.0, "value": 1 }), None)
            .unwrap_err();
        assert!(matches!(err, OpError::KeyframeExists { .. }));
    }

    #[test]
    fn test_remove_and_reinsert_at_index() {
        let mut e = animated();
        let (at, kf) = remove_keyframe(&mut e, "walk", 0.0).unwrap();
        assert_eq!(at, 0);
        add_keyframe(&mut e, "walk", &kf, Some(at)).unwrap();
        assert_eq!(e, animated());
    }

    #[test]
    fn test_set_value_returns_previous() {
        let mut e = animated();
        let prev = set_keyframe_value(&mut e, "walk", 1.0, json!(99)).unwrap();
        assert_eq!(prev, json!(10));
        assert!(set_keyframe_value(&mut e, "walk", 3.0, json!(1)).is_err());
    }

    #[test]
    fn test_set_value_on_valueless_keyframe_rejected() {
        let mut e = Entity::new("e1", "Dancer");
        e.components.push(Component::new("Animation").with_property(
            "tracks",
            json!({ "walk": { "keyframes": [{ "time": 0.0 }] } }),
        ));
        let before = e.clone();
        let err = set_keyframe_value(&mut e, "walk", 0.0, json!(5)).unwrap_err();
        assert!(matches!(err, OpError::InvalidValue { .. }));
        assert_eq!(e, before);
    }

    #[test]
    fn test_missing_track_and_component() {
        let mut e = animated();
        assert!(matches!(
            remove_keyframe(&mut e, "run", 0.0),
            Err(OpError::TrackNotFound { .. })
        ));
        let mut plain = Entity::new("e2", "Plain");
        assert!(matches!(
            remove_keyframe(&mut plain, "walk", 0.0),
            Err(OpError::ComponentNotFound { .. })
        ));
    }

    #[test]
    fn test_malformed_keyframe_rejected() {
        let mut e = animated();
        assert!(add_keyframe(&mut e, "walk", &json!({ "value": 1 }), None).is_err());
        assert!(add_keyframe(&mut e, "walk", &json!({ "time": 2.0 }), None).is_err());
    }
}
