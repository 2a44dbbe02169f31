//! External encoder integration.
//!
//! All ffmpeg invocations are built as typed [`runner::Invocation`]s and executed through a
//! [`runner::CommandRunner`], so every subprocess is bounded by a deadline and can be cancelled.

/// Single-invocation composition executor.
pub mod compose;
/// Typed filtergraph model.
pub mod filtergraph;
/// Encoder profile selection.
pub mod profile;
/// Subprocess execution.
pub mod runner;
