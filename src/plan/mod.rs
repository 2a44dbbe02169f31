//! Timeline planning: duration allocation, motion assignment and per-clip subgraphs.
//!
//! Everything here is pure data. Nothing runs until the plan is handed to
//! [`compose`](crate::encode::compose).

/// Duration allocation across stills.
pub mod allocator;
/// Clip specs and their filter subgraphs.
pub mod clip;
/// Pan/zoom motion palette.
pub mod motion;
