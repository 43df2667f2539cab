//! # ecson-doc
//!
//! The ECSON scene document: a hierarchical scene graph of entities with
//! components, plus assets, event wiring and environment settings.
//!
//! This crate is a data contract: it defines the shapes, their invariants
//! and validation. Mutation goes through `ecson-ops`.

pub mod asset;
pub mod builder;
pub mod component;
pub mod document;
pub mod entity;
pub mod environment;
pub mod path;
pub mod validate;
pub mod wire;

pub use asset::{Asset, AssetType};
pub use builder::{DocumentBuilder, EntityBuilder};
pub use component::{Component, Interpolation, Keyframe, Tuning};
pub use document::{GameSettings, SceneDocument, CURRENT_SCHEMA_VERSION, DOCUMENT_TARGET};
pub use entity::Entity;
pub use environment::{AmbientLight, EnvironmentSettings, Fog, FogType, Skybox, SkyboxType};
pub use path::PathError;
pub use validate::{validate_components, validate_document};
pub use wire::EventWire;
