use std::path::PathBuf;

/// Convenience result type used across reelforge.
pub type ReelResult<T> = Result<T, ReelError>;

/// Top-level error taxonomy used by engine APIs.
///
/// Only [`ReelError::NoUsableAssets`] and [`ReelError::CompositionFailed`] end a job. The
/// caption and asset variants are recorded on a successful
/// [`RenderResult`](crate::RenderResult) instead of being returned.
#[derive(thiserror::Error, Debug)]
pub enum ReelError {
    /// No image survived signature validation; nothing was encoded.
    #[error("no usable assets: every input image was missing or failed validation")]
    NoUsableAssets,

    /// The primary encode exited non-zero, timed out, was cancelled, or produced no file.
    #[error("composition failed: {0}")]
    CompositionFailed(String),

    /// The caption burn-in pass failed. Non-fatal inside a job.
    #[error("caption burn-in failed: {0}")]
    CaptionBurnFailed(String),

    /// A single image was dropped from the plan. Non-fatal inside a job.
    #[error("asset rejected '{}': {reason}", path.display())]
    AssetRejected {
        /// Offending input path.
        path: PathBuf,
        /// Human-readable reason.
        reason: String,
    },

    /// Invalid caller-provided data or configuration.
    #[error("validation error: {0}")]
    Validation(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ReelError {
    /// Build a [`ReelError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`ReelError::CompositionFailed`] value.
    pub fn composition(msg: impl Into<String>) -> Self {
        Self::CompositionFailed(msg.into())
    }

    /// Build a [`ReelError::CaptionBurnFailed`] value.
    pub fn caption_burn(msg: impl Into<String>) -> Self {
        Self::CaptionBurnFailed(msg.into())
    }

    /// Build a [`ReelError::AssetRejected`] value.
    pub fn asset_rejected(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::AssetRejected {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Build a [`ReelError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// Return `true` for errors that abort a job.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            Self::CaptionBurnFailed(_) | Self::AssetRejected { .. }
        )
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
