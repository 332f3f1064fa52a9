//! services/api/src/adapters/mod.rs
//!
//! Concrete implementations of the core's ports: the Postgres-backed
//! store and the two text-generation providers.

pub mod analysis_llm;
pub mod db;
pub mod mock_llm;
