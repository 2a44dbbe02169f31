//! Job orchestration.
//!
//! A job walks `Planning → Allocating → Composing → (Captioning | SkipCaptions) → Done | Failed`,
//! reporting each transition on an optional channel. All scratch files live in a per-job
//! temporary directory that is removed on both success and failure.

/// Engine, job request/result types and the phase state machine.
pub mod job;
