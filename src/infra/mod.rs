//! Infrastructure adapters and runtime bootstrap.

pub mod error;
pub mod sqlite;
pub mod telemetry;
