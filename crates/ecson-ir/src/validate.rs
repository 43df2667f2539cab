use std::collections::HashSet;

use ecson_core::EcsonError;

use crate::canonical::CanonicalScene;

fn issue(message: String) -> EcsonError {
    EcsonError::IrValidation(message)
}

/// Validate the structural contract of a compiled scene.
///
/// Collects every problem found rather than stopping at the first.
pub fn validate_ir(ir: &CanonicalScene) -> Result<(), Vec<EcsonError>> {
    let mut errors = Vec::new();

    match ir.nodes.first() {
        None => errors.push(issue("scene has no nodes".into())),
        Some(first) => {
            if first.id != ir.root_node_id {
                errors.push(issue(format!(
                    "first node is '{}', expected root '{}'",
                    first.id, ir.root_node_id
                )));
            }
            if first.parent_id.is_some() {
                errors.push(issue(format!("root node '{}' has a parent", first.id)));
            }
        }
    }

    let mut seen = HashSet::new();
    for (i, node) in ir.nodes.iter().enumerate() {
        if !seen.insert(node.id.as_str()) {
            errors.push(issue(format!("duplicate node id '{}'", node.id)));
        }
        match ir.node_index.get(&node.id) {
            Some(&at) if at == i => {}
            Some(&at) => errors.push(issue(format!(
                "nodeIndex maps '{}' to {}, but it is at {}",
                node.id, at, i
            ))),
            None => errors.push(issue(format!("node '{}' missing from nodeIndex", node.id))),
        }
    }
    if ir.node_index.len() != ir.nodes.len() {
        errors.push(issue(format!(
            "nodeIndex has {} entries for {} nodes",
            ir.node_index.len(),
            ir.nodes.len()
        )));
    }

    for (i, node) in ir.nodes.iter().enumerate() {
        match &node.parent_id {
            None if i > 0 => errors.push(issue(format!("non-root node '{}' has no parent", node.id))),
            None => {}
            Some(parent_id) => match ir.index_of(parent_id) {
                None => errors.push(issue(format!(
                    "node '{}' references missing parent '{}'",
                    node.id, parent_id
                ))),
                Some(p) => {
                    if p >= i {
                        errors.push(issue(format!(
                            "parent '{}' (at {}) does not precede child '{}' (at {})",
                            parent_id, p, node.id, i
                        )));
                    }
                    let listed = ir.nodes.get(p).map_or(0, |parent| {
                        parent.child_ids.iter().filter(|c| *c == &node.id).count()
                    });
                    if listed != 1 {
                        errors.push(issue(format!(
                            "parent '{}' lists '{}' {} times (expected once)",
                            parent_id, node.id, listed
                        )));
                    }
                }
            },
        }

        for child_id in &node.child_ids {
            let back = ir.node(child_id).and_then(|c| c.parent_id.as_deref());
            if back != Some(node.id.as_str()) {
                errors.push(issue(format!(
                    "node '{}' lists child '{}' whose parent is {:?}",
                    node.id, child_id, back
                )));
            }
        }

        if node.components.iter().any(|c| c.component_type.is_empty()) {
            errors.push(issue(format!("node '{}' has a component with an empty type", node.id)));
        }
    }

    let mut asset_ids = HashSet::new();
    for asset in &ir.assets {
        if !asset_ids.insert(asset.id.as_str()) {
            errors.push(issue(format!("duplicate asset id '{}'", asset.id)));
        }
    }
    let mut wire_ids = HashSet::new();
    for wire in &ir.wires {
        if !wire_ids.insert(wire.id.as_str()) {
            errors.push(issue(format!("duplicate wire id '{}'", wire.id)));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
