//! Caption synchronizer.
//!
//! Cue generation spreads narration phrases evenly across the audio; the burn-in pass overlays
//! them in a second encode. A burn-in failure never fails a job: the uncaptioned render is kept.

/// Subtitle burn-in encode.
pub mod burn;
/// Narration scripts, cue timing and SRT text.
pub mod cues;
