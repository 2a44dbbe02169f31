//! Caller-owned inputs: still images and the narration audio track.

/// Narration audio track and duration probing.
pub mod audio;
/// Content-based image validation.
pub mod sniff;
/// Cover thumbnail derived from the first usable still.
pub mod thumbnail;
