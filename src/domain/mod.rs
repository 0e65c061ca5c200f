//! Domain layer types and invariants.

pub mod entity;
pub mod error;
pub mod schema;
pub mod tag_set;
