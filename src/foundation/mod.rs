//! Shared types: frame geometry, the error taxonomy, and engine configuration.

/// Engine configuration loaded from JSON.
pub mod config;
/// Frame geometry and timing helpers.
pub mod core;
/// Error taxonomy.
pub mod error;
