//! The operation engine: validate an op, apply it to a document in place and
//! return its exact inverse.
//!
//! Every op is fully validated before the document is touched, so a rejected
//! op leaves the document unchanged. `BatchOp` and [`apply_many`] are
//! transactional: when a sub-op is rejected, the sub-ops already applied are
//! undone in reverse before the error is returned.

use ecson_core::ComponentRegistry;
use ecson_doc::component::keyframe_time;
use ecson_doc::path::{get_path, split_path, write_path};
use ecson_doc::{Component, Entity, SceneDocument, DOCUMENT_TARGET};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{OpError, OpResult};
use crate::keyframe;
use crate::op::{OpKind, PatchOp, CURRENT_OP_VERSION};
use crate::property;

/// Apply one op, returning the op that undoes it.
pub fn apply(doc: &mut SceneDocument, op: &PatchOp) -> OpResult<PatchOp> {
    Applier::unchecked().apply(doc, op)
}

/// Apply ops in order. Returns one inverse per op, in the same order; undo
/// by applying them back to front. All-or-nothing.
pub fn apply_many(doc: &mut SceneDocument, ops: &[PatchOp]) -> OpResult<Vec<PatchOp>> {
    Applier::unchecked().apply_all(doc, ops)
}

/// Like [`apply`], additionally enforcing singleton components from `registry`.
pub fn apply_checked(
    doc: &mut SceneDocument,
    op: &PatchOp,
    registry: &ComponentRegistry,
) -> OpResult<PatchOp> {
    Applier::checked(registry).apply(doc, op)
}

/// Like [`apply_many`], additionally enforcing singleton components from `registry`.
pub fn apply_many_checked(
    doc: &mut SceneDocument,
    ops: &[PatchOp],
    registry: &ComponentRegistry,
) -> OpResult<Vec<PatchOp>> {
    Applier::checked(registry).apply_all(doc, ops)
}

/// Insert at `index` clamped to the list length, or append. Returns the
/// position used.
fn insert_clamped<T>(list: &mut Vec<T>, index: Option<usize>, item: T) -> usize {
    let at = index.map_or(list.len(), |i| i.min(list.len()));
    list.insert(at, item);
    at
}

fn entity<'a>(doc: &'a SceneDocument, id: &str) -> OpResult<&'a Entity> {
    doc.entity(id)
        .ok_or_else(|| OpError::EntityNotFound(id.to_string()))
}

fn entity_mut<'a>(doc: &'a mut SceneDocument, id: &str) -> OpResult<&'a mut Entity> {
    doc.entity_mut(id)
        .ok_or_else(|| OpError::EntityNotFound(id.to_string()))
}

fn component_mut<'a>(
    doc: &'a mut SceneDocument,
    entity_id: &str,
    component_type: &str,
) -> OpResult<&'a mut Component> {
    entity_mut(doc, entity_id)?
        .component_mut(component_type)
        .ok_or_else(|| OpError::ComponentNotFound {
            entity: entity_id.to_string(),
            component_type: component_type.to_string(),
        })
}

#[derive(Clone, Copy)]
struct Applier<'r> {
    registry: Option<&'r ComponentRegistry>,
}

impl<'r> Applier<'r> {
    fn unchecked() -> Self {
        Self { registry: None }
    }

    fn checked(registry: &'r ComponentRegistry) -> Self {
        Self {
            registry: Some(registry),
        }
    }

    fn apply(&self, doc: &mut SceneDocument, op: &PatchOp) -> OpResult<PatchOp> {
        if op.version > CURRENT_OP_VERSION {
            return Err(OpError::UnsupportedVersion {
                version: op.version,
                supported: CURRENT_OP_VERSION,
            });
        }
        let inverse = self.apply_kind(doc, op)?;
        debug!(
            op_type = op.op_type(),
            origin = ?op.origin,
            id = %op.id,
            "applied op"
        );
        Ok(op.derive(inverse))
    }

    /// Apply `ops` in order, undoing the applied prefix if one fails.
    fn apply_all(&self, doc: &mut SceneDocument, ops: &[PatchOp]) -> OpResult<Vec<PatchOp>> {
        let mut inverses = Vec::with_capacity(ops.len());
        for (index, op) in ops.iter().enumerate() {
            match self.apply(doc, op) {
                Ok(inverse) => inverses.push(inverse),
                Err(source) => {
                    let err = OpError::BatchFailed {
                        index,
                        op_type: op.op_type(),
                        source: Box::new(source),
                    };
                    rollback(doc, inverses, &err)?;
                    return Err(err);
                }
            }
        }
        Ok(inverses)
    }

    fn apply_kind(&self, doc: &mut SceneDocument, op: &PatchOp) -> OpResult<OpKind> {
        match &op.kind {
            OpKind::CreateEntity {
                entity_id,
                name,
                parent_id,
                index,
                transform,
                tags,
                visible,
                locked,
                tuning,
            } => {
                if entity_id.is_empty() {
                    return Err(OpError::InvalidValue {
                        path: "entityId".into(),
                        message: "entity id must not be empty".into(),
                    });
                }
                if entity_id == DOCUMENT_TARGET {
                    return Err(OpError::ReservedId(entity_id.clone()));
                }
                if doc.contains_entity(entity_id) {
                    return Err(OpError::EntityExists(entity_id.clone()));
                }
                if let Some(parent) = parent_id {
                    if !doc.contains_entity(parent) {
                        return Err(OpError::ParentNotFound(parent.clone()));
                    }
                }

                let mut created = Entity::new(entity_id.clone(), name.clone());
                created.parent_id = parent_id.clone();
                created.transform = transform.unwrap_or_default();
                created.tags = tags.clone();
                created.visible = visible.unwrap_or(true);
                created.locked = locked.unwrap_or(false);
                created.tuning = tuning.clone();

                if let Some(parent) = parent_id {
                    let parent = entity_mut(doc, parent)?;
                    insert_clamped(&mut parent.children, *index, entity_id.clone());
                }
                doc.entities.insert(entity_id.clone(), created.clone());

                Ok(OpKind::DeleteEntity {
                    entity_id: entity_id.clone(),
                    previous_state: Some(created),
                })
            }

            OpKind::DeleteEntity { entity_id, .. } => {
                let target = entity(doc, entity_id)?;
                if doc.is_root(entity_id) {
                    return Err(OpError::RootImmutable {
                        id: entity_id.clone(),
                        action: "delete",
                    });
                }
                if !target.children.is_empty() {
                    return Err(OpError::HasChildren {
                        id: entity_id.clone(),
                        count: target.children.len(),
                    });
                }

                let mut sibling_index = None;
                if let Some(parent_id) = target.parent_id.clone() {
                    if let Some(parent) = doc.entity_mut(&parent_id) {
                        sibling_index = parent.child_index(entity_id);
                        parent.children.retain(|c| c != entity_id);
                    }
                }
                let removed = doc
                    .entities
                    .remove(entity_id)
                    .ok_or_else(|| OpError::EntityNotFound(entity_id.clone()))?;

                let recreate = OpKind::CreateEntity {
                    entity_id: removed.id.clone(),
                    name: removed.name.clone(),
                    parent_id: removed.parent_id.clone(),
                    index: sibling_index,
                    transform: Some(removed.transform),
                    tags: removed.tags.clone(),
                    visible: Some(removed.visible),
                    locked: Some(removed.locked),
                    tuning: removed.tuning.clone(),
                };
                if removed.components.is_empty() {
                    return Ok(recreate);
                }
                let mut ops = vec![op.derive(recreate)];
                for (i, component) in removed.components.into_iter().enumerate() {
                    ops.push(op.derive(OpKind::AddComponent {
                        entity_id: entity_id.clone(),
                        component,
                        index: Some(i),
                    }));
                }
                Ok(OpKind::BatchOp { ops })
            }

            OpKind::SetProperty {
                entity_id,
                path,
                value,
                ..
            } => {
                let write = if entity_id == DOCUMENT_TARGET {
                    property::set_document_property(doc, path, value.clone())?
                } else {
                    property::set_entity_property(entity_mut(doc, entity_id)?, path, value.clone())?
                };
                Ok(OpKind::SetProperty {
                    entity_id: entity_id.clone(),
                    path: write.inverse_path(),
                    value: write.prior.value,
                    previous_value: write.current,
                })
            }

            OpKind::AddChild {
                parent_id,
                child_id,
                index,
            } => {
                if !doc.contains_entity(parent_id) {
                    return Err(OpError::ParentNotFound(parent_id.clone()));
                }
                let child = entity(doc, child_id)?;
                if doc.is_root(child_id) {
                    return Err(OpError::RootImmutable {
                        id: child_id.clone(),
                        action: "attach",
                    });
                }
                if let Some(existing) = &child.parent_id {
                    return Err(OpError::AlreadyAttached {
                        child: child_id.clone(),
                        parent: existing.clone(),
                    });
                }
                if doc.is_ancestor(child_id, parent_id) {
                    return Err(OpError::CircularReparent {
                        entity: child_id.clone(),
                        new_parent: parent_id.clone(),
                    });
                }

                let parent = entity_mut(doc, parent_id)?;
                insert_clamped(&mut parent.children, *index, child_id.clone());
                entity_mut(doc, child_id)?.parent_id = Some(parent_id.clone());

                Ok(OpKind::RemoveChild {
                    parent_id: parent_id.clone(),
                    child_id: child_id.clone(),
                })
            }

            OpKind::RemoveChild {
                parent_id,
                child_id,
            } => {
                let child = entity(doc, child_id)?;
                let parent = doc
                    .entity(parent_id)
                    .ok_or_else(|| OpError::ParentNotFound(parent_id.clone()))?;
                let not_a_child = || OpError::NotAChild {
                    parent: parent_id.clone(),
                    child: child_id.clone(),
                };
                if child.parent_id.as_deref() != Some(parent_id.as_str()) {
                    return Err(not_a_child());
                }
                let at = parent.child_index(child_id).ok_or_else(not_a_child)?;

                entity_mut(doc, parent_id)?.children.remove(at);
                entity_mut(doc, child_id)?.parent_id = None;

                Ok(OpKind::AddChild {
                    parent_id: parent_id.clone(),
                    child_id: child_id.clone(),
                    index: Some(at),
                })
            }

            OpKind::Reparent {
                entity_id,
                new_parent_id,
                new_index,
                ..
            } => {
                let moving = entity(doc, entity_id)?;
                if doc.is_root(entity_id) {
                    return Err(OpError::RootImmutable {
                        id: entity_id.clone(),
                        action: "reparent",
                    });
                }
                let old_parent_id = moving
                    .parent_id
                    .clone()
                    .ok_or_else(|| OpError::Detached(entity_id.clone()))?;
                if !doc.contains_entity(new_parent_id) {
                    return Err(OpError::ParentNotFound(new_parent_id.clone()));
                }
                if doc.is_ancestor(entity_id, new_parent_id) {
                    return Err(OpError::CircularReparent {
                        entity: entity_id.clone(),
                        new_parent: new_parent_id.clone(),
                    });
                }
                let old_index = entity(doc, &old_parent_id)?
                    .child_index(entity_id)
                    .ok_or_else(|| OpError::NotAChild {
                        parent: old_parent_id.clone(),
                        child: entity_id.clone(),
                    })?;

                entity_mut(doc, &old_parent_id)?.children.remove(old_index);
                let new_parent = entity_mut(doc, new_parent_id)?;
                let at = insert_clamped(&mut new_parent.children, *new_index, entity_id.clone());
                entity_mut(doc, entity_id)?.parent_id = Some(new_parent_id.clone());

                Ok(OpKind::Reparent {
                    entity_id: entity_id.clone(),
                    new_parent_id: old_parent_id,
                    new_index: Some(old_index),
                    old_parent_id: Some(new_parent_id.clone()),
                    old_index: Some(at),
                })
            }

            OpKind::AddComponent {
                entity_id,
                component,
                index,
            } => {
                let target = entity(doc, entity_id)?;
                if component.component_type.is_empty() {
                    return Err(OpError::EmptyComponentType);
                }
                if let Some(registry) = self.registry {
                    if registry.is_singleton(&component.component_type)
                        && target.count_components(&component.component_type) > 0
                    {
                        return Err(OpError::SingletonViolation {
                            entity: entity_id.clone(),
                            component_type: component.component_type.clone(),
                        });
                    }
                }

                let target = entity_mut(doc, entity_id)?;
                let at = insert_clamped(&mut target.components, *index, component.clone());

                Ok(OpKind::RemoveComponent {
                    entity_id: entity_id.clone(),
                    component_type: component.component_type.clone(),
                    index: Some(at),
                    previous_component: Some(component.clone()),
                })
            }

            OpKind::RemoveComponent {
                entity_id,
                component_type,
                index,
                ..
            } => {
                let target = entity(doc, entity_id)?;
                let not_found = || OpError::ComponentNotFound {
                    entity: entity_id.clone(),
                    component_type: component_type.clone(),
                };
                let at = match index {
                    Some(i) => target
                        .components
                        .get(*i)
                        .filter(|c| &c.component_type == component_type)
                        .map(|_| *i)
                        .ok_or_else(not_found)?,
                    None => target.component_index(component_type).ok_or_else(not_found)?,
                };

                let removed = entity_mut(doc, entity_id)?.components.remove(at);

                Ok(OpKind::AddComponent {
                    entity_id: entity_id.clone(),
                    component: removed,
                    index: Some(at),
                })
            }

            OpKind::SetComponentProperty {
                entity_id,
                component_type,
                property_path,
                value,
                ..
            } => {
                let component = component_mut(doc, entity_id, component_type)?;
                let write =
                    property::set_bag_property(&mut component.properties, property_path, value.clone())?;
                Ok(OpKind::SetComponentProperty {
                    entity_id: entity_id.clone(),
                    component_type: component_type.clone(),
                    property_path: write.inverse_path(),
                    value: write.prior.value,
                    previous_value: write.current,
                })
            }

            OpKind::AddAsset { asset } => {
                if asset.id.is_empty() {
                    return Err(OpError::InvalidValue {
                        path: "asset.id".into(),
                        message: "asset id must not be empty".into(),
                    });
                }
                if doc.assets.contains_key(&asset.id) {
                    return Err(OpError::AssetExists(asset.id.clone()));
                }
                doc.assets.insert(asset.id.clone(), asset.clone());
                Ok(OpKind::RemoveAsset {
                    asset_id: asset.id.clone(),
                    previous_asset: Some(asset.clone()),
                })
            }

            OpKind::RemoveAsset { asset_id, .. } => {
                let removed = doc
                    .assets
                    .remove(asset_id)
                    .ok_or_else(|| OpError::AssetNotFound(asset_id.clone()))?;
                Ok(OpKind::AddAsset { asset: removed })
            }

            OpKind::ReplaceAssetRef {
                entity_id,
                component_type,
                property_path,
                old_asset_id,
                new_asset_id,
            } => {
                if !doc.assets.contains_key(new_asset_id) {
                    return Err(OpError::AssetNotFound(new_asset_id.clone()));
                }
                let segments = split_path(property_path)?;
                let current = {
                    let component = component_mut(doc, entity_id, component_type)?;
                    get_path(&component.properties, &segments)
                        .and_then(Value::as_str)
                        .map(str::to_string)
                        .ok_or_else(|| OpError::InvalidValue {
                            path: property_path.clone(),
                            message: "expected an asset id string".into(),
                        })?
                };
                // The inverse points back at `current`, so it must resolve too.
                if !doc.assets.contains_key(&current) {
                    return Err(OpError::AssetNotFound(current));
                }
                let component = component_mut(doc, entity_id, component_type)?;
                if &current != old_asset_id {
                    debug!(
                        expected = %old_asset_id,
                        found = %current,
                        "asset reference differs from the op's old id"
                    );
                }
                write_path(
                    &mut component.properties,
                    &segments,
                    Some(Value::String(new_asset_id.clone())),
                )?;
                Ok(OpKind::ReplaceAssetRef {
                    entity_id: entity_id.clone(),
                    component_type: component_type.clone(),
                    property_path: property_path.clone(),
                    old_asset_id: new_asset_id.clone(),
                    new_asset_id: current,
                })
            }

            OpKind::AddKeyframe {
                entity_id,
                track_name,
                keyframe: frame,
                index,
            } => {
                let target = entity_mut(doc, entity_id)?;
                keyframe::add_keyframe(target, track_name, frame, *index)?;
                let time = keyframe_time(frame).unwrap_or_default();
                Ok(OpKind::RemoveKeyframe {
                    entity_id: entity_id.clone(),
                    track_name: track_name.clone(),
                    time,
                    previous_keyframe: Some(frame.clone()),
                })
            }

            OpKind::RemoveKeyframe {
                entity_id,
                track_name,
                time,
                ..
            } => {
                let target = entity_mut(doc, entity_id)?;
                let (at, removed) = keyframe::remove_keyframe(target, track_name, *time)?;
                Ok(OpKind::AddKeyframe {
                    entity_id: entity_id.clone(),
                    track_name: track_name.clone(),
                    keyframe: removed,
                    index: Some(at),
                })
            }

            OpKind::SetKeyframeValue {
                entity_id,
                track_name,
                time,
                value,
                ..
            } => {
                let target = entity_mut(doc, entity_id)?;
                let previous =
                    keyframe::set_keyframe_value(target, track_name, *time, value.clone())?;
                Ok(OpKind::SetKeyframeValue {
                    entity_id: entity_id.clone(),
                    track_name: track_name.clone(),
                    time: *time,
                    value: previous,
                    previous_value: Some(value.clone()),
                })
            }

            OpKind::BatchOp { ops } => {
                let mut inverses = self.apply_all(doc, ops)?;
                inverses.reverse();
                Ok(OpKind::BatchOp { ops: inverses })
            }
        }
    }
}

/// Undo `applied` (inverses in forward order) back to front.
fn rollback(doc: &mut SceneDocument, applied: Vec<PatchOp>, cause: &OpError) -> OpResult<()> {
    if applied.is_empty() {
        return Ok(());
    }
    warn!(undone = applied.len(), %cause, "rolling back partially applied ops");
    let applier = Applier::unchecked();
    for inverse in applied.iter().rev() {
        applier
            .apply(doc, inverse)
            .map_err(|source| OpError::RollbackFailed {
                cause: cause.to_string(),
                source: Box::new(source),
            })?;
    }
    Ok(())
}
