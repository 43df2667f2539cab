//! # ecson-ops
//!
//! The ECSON operation engine. Every document edit is a [`PatchOp`]: a typed,
//! versioned payload in a common envelope. [`apply`] validates an op, mutates
//! the document in place and returns the op that undoes it exactly.
//!
//! ```text
//! PatchOp ──apply──▶ &mut SceneDocument
//!    ▲                    │
//!    └──── inverse ◀──────┘
//! ```

pub mod engine;
pub mod error;
pub mod keyframe;
pub mod op;
pub mod property;
pub mod wire;

pub use engine::{apply, apply_checked, apply_many, apply_many_checked};
pub use error::{OpError, OpResult};
pub use op::{OpKind, OpOrigin, PatchOp, CURRENT_OP_VERSION};
pub use wire::{decode_op, op_from_json, Migrations, OpWire};
