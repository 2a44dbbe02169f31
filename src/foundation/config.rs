use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context as _;

use crate::foundation::core::FrameGeometry;
use crate::foundation::error::{ReelError, ReelResult};

/// Engine-wide configuration.
///
/// Every field has a default, so a JSON config file only needs the keys it overrides.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Output frame geometry.
    pub geometry: FrameGeometry,
    /// Maximum on-screen time for a single still, in seconds.
    pub max_clip_sec: f64,
    /// `ffmpeg` executable.
    pub ffmpeg_path: PathBuf,
    /// `ffprobe` executable.
    pub ffprobe_path: PathBuf,
    /// Directory in which per-job scratch directories are created.
    pub temp_dir: PathBuf,
    /// Subprocess deadlines.
    pub timeouts: Timeouts,
    /// Encoder selection and rate control.
    pub encoder: EncoderSettings,
    /// Blur applied to the fill layer behind each still.
    pub background_blur: BlurSettings,
    /// Caption generation and burn-in.
    pub captions: CaptionSettings,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            geometry: FrameGeometry::default(),
            max_clip_sec: 4.0,
            ffmpeg_path: PathBuf::from("ffmpeg"),
            ffprobe_path: PathBuf::from("ffprobe"),
            temp_dir: std::env::temp_dir(),
            timeouts: Timeouts::default(),
            encoder: EncoderSettings::default(),
            background_blur: BlurSettings::default(),
            captions: CaptionSettings::default(),
        }
    }
}

impl EngineConfig {
    /// Load a JSON config file and validate it.
    pub fn from_path(path: &Path) -> ReelResult<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("read config '{}'", path.display()))?;
        Self::from_json_str(&raw)
    }

    /// Parse a JSON config and validate it.
    pub fn from_json_str(raw: &str) -> ReelResult<Self> {
        let cfg: Self = serde_json::from_str(raw)
            .map_err(|e| ReelError::serde(format!("invalid engine config: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Check cross-field constraints.
    pub fn validate(&self) -> ReelResult<()> {
        self.geometry.validate()?;
        if !self.max_clip_sec.is_finite() || self.max_clip_sec <= 0.0 {
            return Err(ReelError::validation("max_clip_sec must be positive"));
        }
        // A clip shorter than one frame cannot carry any motion.
        if self.max_clip_sec < self.geometry.frame_duration_sec() {
            return Err(ReelError::validation(
                "max_clip_sec must be at least one frame long",
            ));
        }
        self.timeouts.validate()?;
        if self.encoder.software_crf > 51 {
            return Err(ReelError::validation("software_crf must be within 0..=51"));
        }
        if self.encoder.hardware_bitrate_kbps == 0 || self.encoder.audio_bitrate_kbps == 0 {
            return Err(ReelError::validation("bitrates must be non-zero"));
        }
        if self.captions.words_per_cue == 0 {
            return Err(ReelError::validation("captions.words_per_cue must be >= 1"));
        }
        if !self.captions.lead_in_sec.is_finite() || self.captions.lead_in_sec < 0.0 {
            return Err(ReelError::validation(
                "captions.lead_in_sec must be a non-negative number",
            ));
        }
        Ok(())
    }
}

/// Subprocess deadlines, in whole seconds.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Timeouts {
    /// Primary composition encode.
    pub compose_sec: u64,
    /// Caption burn-in encode.
    pub captions_sec: u64,
    /// Encoder listing, trial encodes and ffprobe.
    pub probe_sec: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            compose_sec: 300,
            captions_sec: 120,
            probe_sec: 10,
        }
    }
}

impl Timeouts {
    fn validate(&self) -> ReelResult<()> {
        if self.compose_sec == 0 || self.captions_sec == 0 || self.probe_sec == 0 {
            return Err(ReelError::validation("timeouts must be non-zero"));
        }
        Ok(())
    }

    /// Composition deadline.
    pub fn compose(&self) -> Duration {
        Duration::from_secs(self.compose_sec)
    }

    /// Caption burn-in deadline.
    pub fn captions(&self) -> Duration {
        Duration::from_secs(self.captions_sec)
    }

    /// Probe deadline.
    pub fn probe(&self) -> Duration {
        Duration::from_secs(self.probe_sec)
    }
}

/// Encoder selection policy and rate-control parameters.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct EncoderSettings {
    /// Consider hardware encoders at all.
    pub allow_hardware: bool,
    /// Trial-encode a tiny source before trusting a listed hardware encoder.
    pub verify_hardware: bool,
    /// Target bitrate for hardware encoders.
    pub hardware_bitrate_kbps: u32,
    /// Constant rate factor for the software encoder.
    pub software_crf: u8,
    /// x264 preset for the software encoder.
    pub software_preset: String,
    /// NVENC preset.
    pub nvenc_preset: String,
    /// DRM render node used by VAAPI.
    pub vaapi_device: PathBuf,
    /// Audio codec for the composition pass.
    pub audio_codec: String,
    /// Audio bitrate for the composition pass.
    pub audio_bitrate_kbps: u32,
}

impl Default for EncoderSettings {
    fn default() -> Self {
        Self {
            allow_hardware: true,
            verify_hardware: true,
            hardware_bitrate_kbps: 3000,
            software_crf: 26,
            software_preset: "veryfast".to_owned(),
            nvenc_preset: "p4".to_owned(),
            vaapi_device: PathBuf::from("/dev/dri/renderD128"),
            audio_codec: "aac".to_owned(),
            audio_bitrate_kbps: 128,
        }
    }
}

/// `boxblur` parameters for the background fill layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct BlurSettings {
    /// Luma radius.
    pub radius: u32,
    /// Luma power (number of passes).
    pub power: u32,
}

impl Default for BlurSettings {
    fn default() -> Self {
        Self {
            radius: 20,
            power: 10,
        }
    }
}

/// Caption cue generation and styling.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct CaptionSettings {
    /// Generate and burn captions when narration is available.
    pub enabled: bool,
    /// Words per cue.
    pub words_per_cue: usize,
    /// Fixed delay added to every cue to follow narration lag.
    pub lead_in_sec: f64,
    /// Uppercase words matching `emphasis_keywords`.
    pub emphasis: bool,
    /// Keywords matched case-insensitively inside each word.
    pub emphasis_keywords: Vec<String>,
    /// Burned-in caption style.
    pub style: CaptionStyle,
}

impl Default for CaptionSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            words_per_cue: 3,
            lead_in_sec: 0.2,
            emphasis: true,
            emphasis_keywords: [
                "INSANE",
                "SHOCKING",
                "CRAZY",
                "MILLION",
                "BILLION",
                "WAIT",
                "BREAKING",
                "EXCLUSIVE",
                "REVEALED",
                "SECRET",
                "DRAMA",
                "SCANDAL",
                "LAWSUIT",
                "BEEF",
                "EXPOSED",
            ]
            .into_iter()
            .map(str::to_owned)
            .collect(),
            style: CaptionStyle::default(),
        }
    }
}

/// libass `force_style` subset used for burned-in captions.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct CaptionStyle {
    /// Font family.
    pub font_name: String,
    /// Font size in script pixels.
    pub font_size: u32,
    /// Bold weight.
    pub bold: bool,
    /// Fill color as `0xRRGGBB`.
    pub primary_rgb: u32,
    /// Outline color as `0xRRGGBB`.
    pub outline_rgb: u32,
    /// Outline width.
    pub outline: u32,
    /// Shadow depth.
    pub shadow: u32,
    /// Numpad-style alignment (2 = bottom center).
    pub alignment: u8,
    /// Vertical margin from the aligned edge.
    pub margin_v: u32,
}

impl Default for CaptionStyle {
    fn default() -> Self {
        Self {
            font_name: "Arial Black".to_owned(),
            font_size: 24,
            bold: true,
            primary_rgb: 0xFF_FF_FF,
            outline_rgb: 0x00_00_00,
            outline: 2,
            shadow: 1,
            alignment: 2,
            margin_v: 60,
        }
    }
}
