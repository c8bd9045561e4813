//! Domain layer - billing entities, identifiers and webhook vocabulary.

pub mod billing;
pub mod foundation;
pub mod webhook;
