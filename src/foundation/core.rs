use crate::foundation::error::{ReelError, ReelResult};

/// Output frame geometry: pixel dimensions and integer frame rate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FrameGeometry {
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Output frames-per-second.
    pub fps: u32,
}

impl Default for FrameGeometry {
    /// 1080x1920 at 30 fps, the 9:16 short-form frame.
    fn default() -> Self {
        Self {
            width: 1080,
            height: 1920,
            fps: 30,
        }
    }
}

impl FrameGeometry {
    /// Create a validated geometry.
    pub fn new(width: u32, height: u32, fps: u32) -> ReelResult<Self> {
        let g = Self { width, height, fps };
        g.validate()?;
        Ok(g)
    }

    /// Validate dimensions and frame rate for yuv420p MP4 output.
    pub fn validate(&self) -> ReelResult<()> {
        if self.fps == 0 {
            return Err(ReelError::validation("fps must be non-zero"));
        }
        if self.width == 0 || self.height == 0 {
            return Err(ReelError::validation("frame width/height must be non-zero"));
        }
        if !self.width.is_multiple_of(2) || !self.height.is_multiple_of(2) {
            return Err(ReelError::validation(
                "frame width/height must be even (required for yuv420p mp4 output)",
            ));
        }
        Ok(())
    }

    /// Duration of a single frame in seconds.
    pub fn frame_duration_sec(&self) -> f64 {
        1.0 / f64::from(self.fps)
    }

    /// Nearest frame boundary for a timeline position in seconds.
    pub fn frame_at(&self, sec: f64) -> u64 {
        (sec.max(0.0) * f64::from(self.fps)).round() as u64
    }

    /// Timeline position of a frame boundary in seconds.
    pub fn sec_at(&self, frame: u64) -> f64 {
        frame as f64 / f64::from(self.fps)
    }

    /// `WxH` size string as used by ffmpeg filters.
    pub fn size_arg(&self) -> String {
        format!("{}x{}", self.width, self.height)
    }
}

/// Require `v` to be a finite, strictly positive number of seconds.
pub(crate) fn positive_seconds(name: &str, v: f64) -> ReelResult<f64> {
    if !v.is_finite() || v <= 0.0 {
        return Err(ReelError::validation(format!(
            "{name} must be a finite positive number of seconds, got {v}"
        )));
    }
    Ok(v)
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
