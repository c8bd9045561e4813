//! Application layer - Commands, Queries, and Handlers.
//!
//! This layer orchestrates domain operations and coordinates between ports.
//! Writes go through the dual-write protocol; reads come from the local store.

pub mod handlers;

pub use handlers::*;
