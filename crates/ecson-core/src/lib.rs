//! # ecson-core
//!
//! Core types and primitives for the ECSON scene pipeline.
//! This crate contains foundational pieces shared across all ECSON crates:
//! transform math, id generation, the component registry, configuration,
//! content hashing, and error types.

pub mod config;
pub mod error;
pub mod hash;
pub mod id;
pub mod math;
pub mod registry;
pub mod serde_helpers;

pub use config::EcsonConfig;
pub use error::{EcsonError, EcsonResult};
pub use hash::ContentHash;
pub use math::{Quat, Transform, Vec3};
pub use registry::{ComponentDescriptor, ComponentRegistry, FieldDescriptor, FieldKind};
