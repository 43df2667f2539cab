//! Persisted op form and payload-version migration.
//!
//! Ops are stored as `{ id, timestamp, origin, version, type, payload }`.
//! The payload shape of an op type may change between releases; a
//! [`Migrations`] table upgrades old payloads one version at a time before
//! they are decoded into [`OpKind`].

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{OpError, OpResult};
use crate::op::{OpKind, OpOrigin, PatchOp, CURRENT_OP_VERSION};

/// Untyped op envelope as read from storage or the network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpWire {
    pub id: String,
    pub timestamp: u64,
    #[serde(default)]
    pub origin: OpOrigin,
    /// Absent means the current version.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u32>,
    #[serde(rename = "type")]
    pub op_type: String,
    #[serde(default)]
    pub payload: Value,
}

impl OpWire {
    pub fn from_op(op: &PatchOp) -> OpResult<Self> {
        Ok(serde_json::from_value(serde_json::to_value(op)?)?)
    }
}

/// Transforms a payload from version `n` to version `n + 1`.
pub type MigrationFn = Box<dyn Fn(Value) -> Result<Value, String> + Send + Sync>;

/// Registered payload upgrades keyed by `(type, from_version)`.
#[derive(Default)]
pub struct Migrations {
    steps: HashMap<(String, u32), MigrationFn>,
}

impl fmt::Debug for Migrations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<_> = self.steps.keys().collect();
        keys.sort();
        f.debug_struct("Migrations").field("steps", &keys).finish()
    }
}

impl Migrations {
    pub fn new() -> Self {
        Self::default()
    }

    /// The upgrades shipped with this release. Version 1 is the first
    /// payload shape, so there is nothing to upgrade yet.
    pub fn builtin() -> Self {
        Self::new()
    }

    /// Register the step that upgrades `op_type` payloads from `from_version`.
    /// A later registration for the same key replaces the earlier one.
    pub fn register<F>(&mut self, op_type: impl Into<String>, from_version: u32, step: F)
    where
        F: Fn(Value) -> Result<Value, String> + Send + Sync + 'static,
    {
        self.steps
            .insert((op_type.into(), from_version), Box::new(step));
    }

    /// Builder form of [`Migrations::register`].
    pub fn with<F>(mut self, op_type: impl Into<String>, from_version: u32, step: F) -> Self
    where
        F: Fn(Value) -> Result<Value, String> + Send + Sync + 'static,
    {
        self.register(op_type, from_version, step);
        self
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Bring `payload` from `version` up to [`CURRENT_OP_VERSION`].
    pub fn upgrade(&self, op_type: &str, version: u32, mut payload: Value) -> OpResult<Value> {
        if version > CURRENT_OP_VERSION {
            return Err(OpError::UnsupportedVersion {
                version,
                supported: CURRENT_OP_VERSION,
            });
        }
        for from in version..CURRENT_OP_VERSION {
            let step = self
                .steps
                .get(&(op_type.to_string(), from))
                .ok_or_else(|| OpError::MissingMigration {
                    op_type: op_type.to_string(),
                    version: from,
                })?;
            payload = step(payload).map_err(|message| OpError::MigrationFailed {
                op_type: op_type.to_string(),
                version: from,
                message,
            })?;
        }
        Ok(payload)
    }
}

/// Decode a wire op into a typed [`PatchOp`], migrating old payloads.
///
/// Batch sub-ops are decoded recursively with the same table, so each carries
/// its own version.
pub fn decode_op(wire: OpWire, migrations: &Migrations) -> OpResult<PatchOp> {
    let version = wire.version.unwrap_or(CURRENT_OP_VERSION);
    if !OpKind::TYPE_NAMES.contains(&wire.op_type.as_str()) {
        return Err(OpError::UnknownOpType(wire.op_type));
    }
    let payload = migrations.upgrade(&wire.op_type, version, wire.payload)?;

    let kind = if wire.op_type == "BatchOp" {
        let subs = payload
            .get("ops")
            .and_then(Value::as_array)
            .ok_or_else(|| OpError::MalformedPayload {
                op_type: wire.op_type.clone(),
                message: "missing 'ops' array".into(),
            })?;
        let mut ops = Vec::with_capacity(subs.len());
        for sub in subs {
            let sub_wire: OpWire =
                serde_json::from_value(sub.clone()).map_err(|e| OpError::MalformedPayload {
                    op_type: wire.op_type.clone(),
                    message: e.to_string(),
                })?;
            ops.push(decode_op(sub_wire, migrations)?);
        }
        OpKind::BatchOp { ops }
    } else {
        serde_json::from_value(json!({ "type": wire.op_type, "payload": payload })).map_err(
            |e| OpError::MalformedPayload {
                op_type: wire.op_type.clone(),
                message: e.to_string(),
            },
        )?
    };

    Ok(PatchOp {
        id: wire.id,
        timestamp: wire.timestamp,
        origin: wire.origin,
        version: CURRENT_OP_VERSION,
        kind,
    })
}

/// Parse one op from JSON text using the given migrations.
pub fn op_from_json(json: &str, migrations: &Migrations) -> OpResult<PatchOp> {
    let wire: OpWire = serde_json::from_str(json)?;
    decode_op(wire, migrations)
}

impl TryFrom<OpWire> for PatchOp {
    type Error = OpError;

    fn try_from(wire: OpWire) -> Result<Self, Self::Error> {
        decode_op(wire, &Migrations::builtin())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wire(op_type: &str, version: Option<u32>, payload: Value) -> OpWire {
        OpWire {
            id: "op1".into(),
            timestamp: 7,
            origin: OpOrigin::Replay,
            version,
            op_type: op_type.into(),
            payload,
        }
    }

    #[test]
    fn test_absent_version_is_current() {
        let op = decode_op(
            wire("DeleteEntity", None, json!({ "entityId": "e1" })),
            &Migrations::builtin(),
        )
        .unwrap();
        assert_eq!(op.version, CURRENT_OP_VERSION);
        assert_eq!(op.origin, OpOrigin::Replay);
        assert_eq!(op.kind, OpKind::delete_entity("e1"));
    }

    #[test]
    fn test_newer_version_rejected() {
        let err = decode_op(
            wire("DeleteEntity", Some(CURRENT_OP_VERSION + 1), json!({ "entityId": "e1" })),
            &Migrations::builtin(),
        )
        .unwrap_err();
        assert!(matches!(err, OpError::UnsupportedVersion { .. }));
    }

    #[test]
    fn test_missing_step_is_an_error() {
        let err = Migrations::new()
            .upgrade("SetProperty", 0, json!({}))
            .unwrap_err();
        assert!(matches!(
            err,
            OpError::MissingMigration { version: 0, .. }
        ));
    }

    #[test]
    fn test_registered_step_runs() {
        // v0 DeleteEntity called the field "id".
        let migrations = Migrations::new().with("DeleteEntity", 0, |mut payload| {
            let object = payload.as_object_mut().ok_or("payload is not an object")?;
            let id = object.remove("id").ok_or("missing id")?;
            object.insert("entityId".into(), id);
            Ok(payload)
        });
        let op = decode_op(wire("DeleteEntity", Some(0), json!({ "id": "e9" })), &migrations)
            .unwrap();
        assert_eq!(op.kind, OpKind::delete_entity("e9"));
    }

    #[test]
    fn test_failed_step_reports_message() {
        let migrations = Migrations::new().with("AddAsset", 0, |_| Err("nope".to_string()));
        let err = migrations.upgrade("AddAsset", 0, json!({})).unwrap_err();
        assert!(err.to_string().contains("nope"));
    }

    #[test]
    fn test_unknown_type_rejected() {
        let err = decode_op(wire("Explode", None, json!({})), &Migrations::builtin()).unwrap_err();
        assert!(matches!(err, OpError::UnknownOpType(t) if t == "Explode"));
    }

    #[test]
    fn test_malformed_payload() {
        let err = decode_op(wire("AddChild", None, json!({ "parentId": 3 })), &Migrations::builtin())
            .unwrap_err();
        assert!(matches!(err, OpError::MalformedPayload { .. }));
    }

    #[test]
    fn test_batch_sub_ops_are_migrated() {
        let migrations = Migrations::new().with("DeleteEntity", 0, |mut payload| {
            if let Some(object) = payload.as_object_mut() {
                if let Some(id) = object.remove("id") {
                    object.insert("entityId".into(), id);
                }
            }
            Ok(payload)
        });
        let batch = wire(
            "BatchOp",
            None,
            json!({ "ops": [
                { "id": "s1", "timestamp": 1, "origin": "user", "version": 0,
                  "type": "DeleteEntity", "payload": { "id": "a" } }
            ] }),
        );
        let op = decode_op(batch, &migrations).unwrap();
        match op.kind {
            OpKind::BatchOp { ops } => assert_eq!(ops[0].kind, OpKind::delete_entity("a")),
            other => panic!("expected batch, got {other:?}"),
        }
    }
}
