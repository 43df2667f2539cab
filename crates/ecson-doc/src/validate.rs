use std::collections::{HashMap, HashSet, VecDeque};

use ecson_core::{ComponentRegistry, EcsonError};

use crate::document::{SceneDocument, CURRENT_SCHEMA_VERSION};

/// Validate a document's schema-level and tree invariants.
///
/// Collects every problem found rather than stopping at the first.
pub fn validate_document(doc: &SceneDocument) -> Result<(), Vec<EcsonError>> {
    let mut errors = Vec::new();

    if doc.schema_version > CURRENT_SCHEMA_VERSION {
        errors.push(EcsonError::schema(
            format!(
                "schema version {} is newer than supported version {}",
                doc.schema_version, CURRENT_SCHEMA_VERSION
            ),
            "schemaVersion",
        ));
    }

    for (key, entity) in &doc.entities {
        if key != &entity.id {
            errors.push(EcsonError::schema(
                format!("entity keyed '{}' has id '{}'", key, entity.id),
                format!("entities.{}", key),
            ));
        }
    }

    match doc.entities.get(&doc.root_entity_id) {
        None => errors.push(EcsonError::schema(
            format!("root entity '{}' does not exist", doc.root_entity_id),
            "rootEntityId",
        )),
        Some(root) if root.parent_id.is_some() => errors.push(EcsonError::schema(
            "root entity must not have a parent",
            format!("entities.{}.parentId", root.id),
        )),
        Some(_) => {}
    }

    for entity in doc.entities.values() {
        let here = format!("entities.{}", entity.id);

        if let Some(parent_id) = &entity.parent_id {
            match doc.entities.get(parent_id) {
                None => errors.push(EcsonError::schema(
                    format!("parent '{}' does not exist", parent_id),
                    format!("{}.parentId", here),
                )),
                Some(parent) => {
                    let listed = parent.children.iter().filter(|c| *c == &entity.id).count();
                    if listed != 1 {
                        errors.push(EcsonError::schema(
                            format!(
                                "parent '{}' lists '{}' {} times (expected once)",
                                parent_id, entity.id, listed
                            ),
                            format!("entities.{}.children", parent_id),
                        ));
                    }
                }
            }
        } else if entity.id != doc.root_entity_id {
            errors.push(EcsonError::schema(
                "non-root entity has no parent",
                format!("{}.parentId", here),
            ));
        }

        let mut seen = HashSet::new();
        for child_id in &entity.children {
            if !seen.insert(child_id) {
                errors.push(EcsonError::schema(
                    format!("duplicate child '{}'", child_id),
                    format!("{}.children", here),
                ));
                continue;
            }
            match doc.entities.get(child_id) {
                None => errors.push(EcsonError::schema(
                    format!("child '{}' does not exist", child_id),
                    format!("{}.children", here),
                )),
                Some(child) if child.parent_id.as_deref() != Some(entity.id.as_str()) => {
                    errors.push(EcsonError::schema(
                        format!(
                            "child '{}' points at parent {:?}",
                            child_id, child.parent_id
                        ),
                        format!("{}.children", here),
                    ))
                }
                Some(_) => {}
            }
        }

        for (i, component) in entity.components.iter().enumerate() {
            if component.component_type.is_empty() {
                errors.push(EcsonError::schema(
                    "component type must not be empty",
                    format!("{}.components[{}]", here, i),
                ));
            }
        }
    }

    // Reachability from the root: catches orphans and cycles detached from the root.
    if doc.entities.contains_key(&doc.root_entity_id) {
        let mut visited: HashSet<&str> = HashSet::new();
        let mut queue = VecDeque::from([doc.root_entity_id.as_str()]);
        while let Some(id) = queue.pop_front() {
            if !visited.insert(id) {
                continue;
            }
            if let Some(entity) = doc.entities.get(id) {
                queue.extend(entity.children.iter().map(String::as_str));
            }
        }
        for id in doc.entities.keys() {
            if !visited.contains(id.as_str()) {
                errors.push(EcsonError::schema(
                    format!("entity '{}' is not reachable from the root", id),
                    format!("entities.{}", id),
                ));
            }
        }
    }

    for (key, asset) in &doc.assets {
        if key != &asset.id {
            errors.push(EcsonError::schema(
                format!("asset keyed '{}' has id '{}'", key, asset.id),
                format!("assets.{}", key),
            ));
        }
    }

    let mut wire_ids = HashSet::new();
    for (i, wire) in doc.wiring.iter().enumerate() {
        if !wire_ids.insert(&wire.id) {
            errors.push(EcsonError::schema(
                format!("duplicate wire id '{}'", wire.id),
                format!("wiring[{}]", i),
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Check registry-level component rules (singleton types) for every entity.
pub fn validate_components(
    doc: &SceneDocument,
    registry: &ComponentRegistry,
) -> Result<(), Vec<EcsonError>> {
    let mut errors = Vec::new();
    for entity in doc.entities.values() {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for component in &entity.components {
            *counts.entry(component.component_type.as_str()).or_default() += 1;
        }
        let mut violations: Vec<(&str, usize)> = counts
            .into_iter()
            .filter(|(ty, n)| *n > 1 && registry.is_singleton(ty))
            .collect();
        violations.sort();
        for (ty, n) in violations {
            errors.push(EcsonError::schema(
                format!("singleton component '{}' attached {} times", ty, n),
                format!("entities.{}.components", entity.id),
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
