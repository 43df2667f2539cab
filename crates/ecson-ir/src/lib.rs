//! # ecson-ir
//!
//! The Canonical IR: a fully explicit, topologically sorted, renderer-agnostic
//! form of a scene document. This crate compiles documents into it,
//! decompiles it back, validates it, and classifies single ops into
//! incremental renderer updates.

pub mod canonical;
pub mod compile;
pub mod decompile;
pub mod delta;
pub mod error;
pub mod validate;

pub use canonical::{
    CanonicalAmbientLight, CanonicalAsset, CanonicalComponent, CanonicalEnvironment,
    CanonicalFog, CanonicalNode, CanonicalScene, CanonicalSkybox, CanonicalWire,
};
pub use compile::{compile, compile_with, CompileOptions};
pub use decompile::{decompile, portable_subset};
pub use delta::{classify_delta, Delta, PartialTransform};
pub use error::{IrError, IrResult};
pub use validate::validate_ir;
