//! Tagging services over the storage and cache collaborators.

pub mod aggregate;
pub mod context;
pub mod engine;
pub mod error;
pub mod executor;
pub mod filter;
pub mod statement;
pub mod statements;
