use ecson_core::{Transform, Vec3};
use serde_json::Value;

use crate::asset::Asset;
use crate::component::Component;
use crate::document::{GameSettings, SceneDocument};
use crate::entity::Entity;
use crate::environment::EnvironmentSettings;
use crate::wire::EventWire;

/// A builder for constructing a scene document programmatically.
/// Useful for tooling, fixtures and unit testing.
///
/// Entities must be added parent-first; each is appended to its parent's
/// children in the order added.
pub struct DocumentBuilder {
    doc: SceneDocument,
}

impl DocumentBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            doc: SceneDocument::new(name),
        }
    }

    /// Fix the document and root ids (the root entity is recreated under the new id).
    pub fn ids(mut self, doc_id: impl Into<String>, root_id: impl Into<String>) -> Self {
        let name = std::mem::take(&mut self.doc.name);
        self.doc = SceneDocument::with_ids(doc_id, root_id, name);
        self
    }

    /// Add an entity. Its parent, when set, must already be present.
    pub fn entity(mut self, builder: EntityBuilder) -> Self {
        let entity = builder.build();
        if let Some(parent) = entity
            .parent_id
            .as_deref()
            .and_then(|p| self.doc.entities.get_mut(p))
        {
            parent.children.push(entity.id.clone());
        }
        self.doc.entities.insert(entity.id.clone(), entity);
        self
    }

    pub fn asset(mut self, asset: Asset) -> Self {
        self.doc.assets.insert(asset.id.clone(), asset);
        self
    }

    pub fn wire(mut self, wire: EventWire) -> Self {
        self.doc.wiring.push(wire);
        self
    }

    pub fn environment(mut self, environment: EnvironmentSettings) -> Self {
        self.doc.environment = environment;
        self
    }

    pub fn game_settings(mut self, settings: GameSettings) -> Self {
        self.doc.game_settings = Some(settings);
        self
    }

    pub fn metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.doc.metadata.insert(key.into(), value);
        self
    }

    /// Build and return the document.
    pub fn build(self) -> SceneDocument {
        self.doc
    }
}

/// A builder for constructing an entity.
pub struct EntityBuilder {
    entity: Entity,
}

impl EntityBuilder {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            entity: Entity::new(id, name),
        }
    }

    pub fn parent(mut self, parent_id: impl Into<String>) -> Self {
        self.entity.parent_id = Some(parent_id.into());
        self
    }

    pub fn position(mut self, x: f64, y: f64, z: f64) -> Self {
        self.entity.transform.position = Vec3::new(x, y, z);
        self
    }

    pub fn scale(mut self, x: f64, y: f64, z: f64) -> Self {
        self.entity.transform.scale = Vec3::new(x, y, z);
        self
    }

    pub fn transform(mut self, transform: Transform) -> Self {
        self.entity.transform = transform;
        self
    }

    pub fn component(mut self, component: Component) -> Self {
        self.entity.components.push(component);
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.entity.tags.insert(tag.into());
        self
    }

    pub fn hidden(mut self) -> Self {
        self.entity.visible = false;
        self
    }

    pub fn locked(mut self) -> Self {
        self.entity.locked = true;
        self
    }

    pub fn tuning(mut self, engine: &str, key: &str, value: Value) -> Self {
        self.entity = self.entity.with_tuning(engine, key, value);
        self
    }

    /// Build and return the entity.
    pub fn build(self) -> Entity {
        self.entity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_links_children_in_order() {
        let doc = DocumentBuilder::new("Test")
            .ids("doc", "root")
            .entity(EntityBuilder::new("a", "A").parent("root"))
            .entity(EntityBuilder::new("b", "B").parent("root"))
            .entity(EntityBuilder::new("c", "C").parent("a").position(1.0, 2.0, 3.0))
            .build();
        assert_eq!(doc.root().unwrap().children, vec!["a", "b"]);
        assert_eq!(doc.entity("a").unwrap().children, vec!["c"]);
        assert_eq!(doc.entity("c").unwrap().transform.position.z, 3.0);
        assert_eq!(doc.root_entity_id, "root");
    }
}
