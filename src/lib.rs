//! Reelforge turns a set of still images, one narration track and optional captions into a
//! vertical short-form MP4.
//!
//! The audio duration is authoritative: stills are allocated display time to exactly cover it,
//! each gets a pan/zoom motion profile, and the whole timeline is composed by a single ffmpeg
//! invocation. Captions are burned in by a second, best-effort pass.
//!
//! - Build an [`Engine`] from an [`EngineConfig`] (the encoder is probed once)
//! - Describe a job with a [`JobRequest`]
//! - Call [`Engine::render`] and inspect the [`RenderResult`]
#![forbid(unsafe_code)]
#![deny(missing_docs)]

/// Input validation, audio probing and thumbnails.
pub mod assets;
/// Caption cue generation and burn-in.
pub mod captions;
/// ffmpeg invocation building and execution.
pub mod encode;
/// Core types, errors and configuration.
pub mod foundation;
/// Timeline planning.
pub mod plan;
/// Job orchestration.
pub mod session;

pub use crate::assets::audio::AudioTrack;
pub use crate::assets::sniff::{AssetRejection, MediaAsset};
pub use crate::captions::cues::{CaptionCue, NarrationScript, Scene};
pub use crate::encode::profile::{EncoderProfile, VideoEncoder};
pub use crate::encode::runner::{CancelToken, CommandRunner, ProcessRunner, RecordingRunner};
pub use crate::foundation::config::EngineConfig;
pub use crate::foundation::core::FrameGeometry;
pub use crate::foundation::error::{ReelError, ReelResult};
pub use crate::plan::clip::{ClipSpec, CompositionPlan};
pub use crate::session::job::{
    CaptionOutcome, CaptionSource, Engine, JobEvent, JobOptions, JobPhase, JobRequest, PlanReport,
    RenderResult,
};
