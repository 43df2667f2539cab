//! Document → Canonical IR.

use std::collections::{BTreeMap, HashSet, VecDeque};

use ecson_core::config::CompileConfig;
use ecson_core::EcsonError;
use ecson_doc::{validate_document, Entity, SceneDocument};
use serde_json::Value;
use tracing::{debug, warn};

use crate::canonical::{
    CanonicalAsset, CanonicalComponent, CanonicalEnvironment, CanonicalNode, CanonicalScene,
    CanonicalWire,
};
use crate::error::{IrError, IrResult};
use crate::validate::validate_ir;

/// Knobs for [`compile_with`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompileOptions {
    /// Run [`validate_ir`] on the output before returning it.
    pub validate_output: bool,
    /// Fail on wires whose endpoints do not resolve instead of warning.
    pub strict_wires: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            validate_output: true,
            strict_wires: false,
        }
    }
}

impl From<&CompileConfig> for CompileOptions {
    fn from(config: &CompileConfig) -> Self {
        Self {
            validate_output: config.validate_output,
            strict_wires: config.strict_wires,
        }
    }
}

/// Compile with default options.
pub fn compile(doc: &SceneDocument) -> IrResult<CanonicalScene> {
    compile_with(doc, &CompileOptions::default())
}

/// Lower a valid document into a [`CanonicalScene`]. Never mutates `doc`.
pub fn compile_with(doc: &SceneDocument, options: &CompileOptions) -> IrResult<CanonicalScene> {
    validate_document(doc).map_err(IrError::InvalidDocument)?;

    let (nodes, node_index) = walk(doc)?;

    let assets: Vec<CanonicalAsset> = doc.assets.values().map(CanonicalAsset::from).collect();

    let mut wires = Vec::with_capacity(doc.wiring.len());
    for wire in &doc.wiring {
        for endpoint in [&wire.source_entity_id, &wire.target_entity_id] {
            if !node_index.contains_key(endpoint) {
                if options.strict_wires {
                    return Err(IrError::UnresolvedWire {
                        wire_id: wire.id.clone(),
                        entity_id: endpoint.clone(),
                    });
                }
                warn!(wire = %wire.id, entity = %endpoint, "wire endpoint does not resolve");
            }
        }
        wires.push(CanonicalWire::from(wire));
    }

    let game_settings = match &doc.game_settings {
        None => None,
        Some(settings) => match serde_json::to_value(settings)? {
            Value::Object(map) => Some(map),
            _ => None,
        },
    };

    let scene = CanonicalScene {
        id: doc.id.clone(),
        name: doc.name.clone(),
        source_schema_version: doc.schema_version,
        nodes,
        node_index,
        root_node_id: doc.root_entity_id.clone(),
        assets,
        wires,
        environment: CanonicalEnvironment::from(&doc.environment),
        game_settings,
    };

    if options.validate_output {
        validate_ir(&scene).map_err(IrError::InvalidIr)?;
    }

    debug!(
        scene = %scene.id,
        nodes = scene.nodes.len(),
        assets = scene.assets.len(),
        wires = scene.wires.len(),
        "compiled scene"
    );
    Ok(scene)
}

/// Breadth-first from the root, children in stored order, so every parent is
/// placed before its children.
fn walk(doc: &SceneDocument) -> IrResult<(Vec<CanonicalNode>, BTreeMap<String, usize>)> {
    let mut nodes = Vec::with_capacity(doc.entities.len());
    let mut node_index = BTreeMap::new();
    let mut visited = HashSet::new();
    let mut queue = VecDeque::from([doc.root_entity_id.as_str()]);

    while let Some(id) = queue.pop_front() {
        if !visited.insert(id) {
            continue;
        }
        let entity = doc.entity(id).ok_or_else(|| {
            IrError::InvalidDocument(vec![EcsonError::schema(
                format!("entity '{}' is listed but does not exist", id),
                format!("entities.{}", id),
            )])
        })?;
        node_index.insert(entity.id.clone(), nodes.len());
        nodes.push(bake(entity));
        queue.extend(entity.children.iter().map(String::as_str));
    }

    if nodes.len() != doc.entities.len() {
        return Err(IrError::InvalidDocument(vec![EcsonError::schema(
            format!(
                "{} of {} entities are unreachable from the root",
                doc.entities.len() - nodes.len(),
                doc.entities.len()
            ),
            "entities",
        )]));
    }
    Ok((nodes, node_index))
}

fn bake(entity: &Entity) -> CanonicalNode {
    CanonicalNode {
        id: entity.id.clone(),
        name: entity.name.clone(),
        parent_id: entity.parent_id.clone(),
        child_ids: entity.children.clone(),
        transform: entity.transform,
        components: entity
            .components
            .iter()
            .map(CanonicalComponent::from)
            .collect(),
        visible: entity.visible,
        tuning: entity.tuning.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ecson_doc::{Component, DocumentBuilder, EntityBuilder, EventWire, GameSettings};
    use serde_json::json;

    fn doc() -> SceneDocument {
        DocumentBuilder::new("Compile")
            .ids("doc", "root")
            .entity(
                EntityBuilder::new("a", "A")
                    .parent("root")
                    .tag("hero")
                    .locked()
                    .component(Component::new("Light").with_property("intensity", json!(2))),
            )
            .entity(EntityBuilder::new("b", "B").parent("root").hidden())
            .entity(EntityBuilder::new("a1", "A1").parent("a"))
            .build()
    }

    #[test]
    fn test_breadth_first_order() {
        let ir = compile(&doc()).unwrap();
        let order: Vec<&str> = ir.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(order, vec!["root", "a", "b", "a1"]);
        assert_eq!(ir.index_of("a1"), Some(3));
        assert_eq!(ir.node("b").map(|n| n.visible), Some(false));
    }

    #[test]
    fn test_compile_does_not_mutate() {
        let original = doc();
        let copy = original.clone();
        compile(&copy).unwrap();
        assert_eq!(copy, original);
    }

    #[test]
    fn test_invalid_document_rejected() {
        let mut broken = doc();
        broken.entities.get_mut("a1").unwrap().parent_id = Some("b".into());
        assert!(matches!(compile(&broken), Err(IrError::InvalidDocument(_))));
    }

    #[test]
    fn test_detached_entity_rejected() {
        let mut broken = doc();
        broken.entities.get_mut("a").unwrap().children.clear();
        broken.entities.get_mut("a1").unwrap().parent_id = None;
        assert!(compile(&broken).is_err());
    }

    #[test]
    fn test_wires_and_game_settings() {
        let mut d = doc();
        d.wiring.push(EventWire::new("w1", "a", "click", "ghost", "open"));
        d.game_settings = Some(GameSettings {
            camera_mode: Some("orbit".into()),
            ..GameSettings::default()
        });

        let ir = compile(&d).unwrap();
        assert!(ir.wires[0].parameters.is_empty());
        assert_eq!(
            ir.game_settings.as_ref().and_then(|g| g.get("cameraMode")),
            Some(&json!("orbit"))
        );

        let strict = CompileOptions {
            strict_wires: true,
            ..CompileOptions::default()
        };
        assert!(matches!(
            compile_with(&d, &strict),
            Err(IrError::UnresolvedWire { .. })
        ));
    }

    #[test]
    fn test_game_settings_null_when_absent() {
        let ir = compile(&doc()).unwrap();
        let value = serde_json::to_value(&ir).unwrap();
        assert_eq!(value["gameSettings"], Value::Null);
    }
}
