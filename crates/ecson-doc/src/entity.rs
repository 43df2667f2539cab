use std::collections::BTreeSet;

use ecson_core::Transform;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::component::{Component, Tuning};

fn default_true() -> bool {
    true
}

/// A node in the scene hierarchy: transform, components and children.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    /// Stable, unique identifier.
    pub id: String,
    pub name: String,
    /// `None` only for the document root (or a transiently detached entity).
    #[serde(default)]
    pub parent_id: Option<String>,
    /// Child ids in sibling order.
    #[serde(default)]
    pub children: Vec<String>,
    /// Attached components in order.
    #[serde(default)]
    pub components: Vec<Component>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub transform: Transform,
    #[serde(default = "default_true")]
    pub visible: bool,
    /// Editor lock; not portable.
    #[serde(default)]
    pub locked: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tuning: Option<Tuning>,
}

impl Entity {
    /// Create a new entity with identity transform and no parent.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            parent_id: None,
            children: Vec::new(),
            components: Vec::new(),
            tags: BTreeSet::new(),
            transform: Transform::identity(),
            visible: true,
            locked: false,
            tuning: None,
        }
    }

    /// First component of the given type.
    pub fn component(&self, component_type: &str) -> Option<&Component> {
        self.components
            .iter()
            .find(|c| c.component_type == component_type)
    }

    /// Mutable access to the first component of the given type.
    pub fn component_mut(&mut self, component_type: &str) -> Option<&mut Component> {
        self.components
            .iter_mut()
            .find(|c| c.component_type == component_type)
    }

    /// Position of the first component of the given type.
    pub fn component_index(&self, component_type: &str) -> Option<usize> {
        self.components
            .iter()
            .position(|c| c.component_type == component_type)
    }

    pub fn count_components(&self, component_type: &str) -> usize {
        self.components
            .iter()
            .filter(|c| c.component_type == component_type)
            .count()
    }

    /// Position of `child_id` in this entity's children.
    pub fn child_index(&self, child_id: &str) -> Option<usize> {
        self.children.iter().position(|c| c == child_id)
    }

    /// Builder: set one engine-specific tuning value.
    pub fn with_tuning(mut self, engine: &str, key: &str, value: Value) -> Self {
        self.tuning
            .get_or_insert_with(Tuning::new)
            .entry(engine.to_string())
            .or_default()
            .insert(key.to_string(), value);
        self
    }
}
