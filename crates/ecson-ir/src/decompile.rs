//! Canonical IR → document.
//!
//! Restores the portable subset exactly. Tags, lock flags, document metadata
//! and component editor decoration are not carried by the IR and come back
//! empty.

use std::collections::{BTreeMap, BTreeSet};

use ecson_doc::{
    validate_document, Asset, Component, EnvironmentSettings, Entity, EventWire, GameSettings,
    SceneDocument, CURRENT_SCHEMA_VERSION,
};
use serde_json::{Map, Value};
use tracing::debug;

use crate::canonical::{CanonicalNode, CanonicalScene};
use crate::error::{IrError, IrResult};
use crate::validate::validate_ir;

pub fn decompile(ir: &CanonicalScene) -> IrResult<SceneDocument> {
    validate_ir(ir).map_err(IrError::InvalidIr)?;

    let entities: BTreeMap<String, Entity> = ir
        .nodes
        .iter()
        .map(|node| (node.id.clone(), restore(node)))
        .collect();

    let assets: BTreeMap<String, Asset> = ir
        .assets
        .iter()
        .map(|asset| (asset.id.clone(), Asset::from(asset)))
        .collect();

    let game_settings = match &ir.game_settings {
        None => None,
        Some(map) => Some(serde_json::from_value::<GameSettings>(Value::Object(map.clone()))?),
    };

    let doc = SceneDocument {
        id: ir.id.clone(),
        name: ir.name.clone(),
        schema_version: CURRENT_SCHEMA_VERSION,
        root_entity_id: ir.root_node_id.clone(),
        entities,
        assets,
        wiring: ir.wires.iter().map(EventWire::from).collect(),
        environment: EnvironmentSettings::from(&ir.environment),
        game_settings,
        metadata: Map::new(),
    };

    validate_document(&doc).map_err(IrError::InvalidDocument)?;
    debug!(
        scene = %doc.id,
        entities = doc.entities.len(),
        assets = doc.assets.len(),
        "decompiled scene"
    );
    Ok(doc)
}

/// What `decompile(compile(doc))` is expected to return for `doc`: the same
/// document with the non-portable fields reset.
pub fn portable_subset(doc: &SceneDocument) -> SceneDocument {
    let mut portable = doc.clone();
    portable.schema_version = CURRENT_SCHEMA_VERSION;
    portable.metadata.clear();
    for entity in portable.entities.values_mut() {
        entity.tags.clear();
        entity.locked = false;
        for component in &mut entity.components {
            component.editor_meta = None;
        }
    }
    portable
}

fn restore(node: &CanonicalNode) -> Entity {
    Entity {
        id: node.id.clone(),
        name: node.name.clone(),
        parent_id: node.parent_id.clone(),
        children: node.child_ids.clone(),
        components: node.components.iter().map(Component::from).collect(),
        tags: BTreeSet::new(),
        transform: node.transform,
        visible: node.visible,
        locked: false,
        tuning: node.tuning.clone(),
    }
}
