//! Tag sets for arbitrary entities over a relational store.
//!
//! Entities hold a [`TaggingEngine`] per instance; the engine loads tags
//! through a read-through cache and rewrites the entity's bindings on save.
//! [`TagQueryBuilder`] filters entities by tag and [`AggregateTagReader`]
//! serves cross-entity tag listings.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;

mod util;

pub use application::aggregate::{AggregateTagReader, TagCount};
pub use application::context::{SqlTagFactory, TagFactory, TaggingContext};
pub use application::engine::{SaveOutcome, TaggingEngine};
pub use application::error::TaggingError;
pub use application::executor::{QueryExecutor, Row, StorageError};
pub use application::filter::{TagCriteria, TagQueryBuilder};
pub use application::statement::{SqlFragment, SqlValue, Statement};
pub use domain::entity::{EntityRef, Taggable};
pub use domain::schema::{Placeholder, TagSchema, TaggingOptions};
pub use domain::tag_set::TagSet;
