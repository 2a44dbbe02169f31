use std::ffi::OsString;
use std::path::PathBuf;

use crate::encode::filtergraph::Filter;
use crate::encode::runner::{CancelToken, CommandRunner, Invocation, Stage};
use crate::foundation::config::{EncoderSettings, EngineConfig};

/// H.264 encoders the engine knows how to drive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VideoEncoder {
    /// x264 software encoder.
    Libx264,
    /// Apple VideoToolbox.
    H264Videotoolbox,
    /// NVIDIA NVENC.
    H264Nvenc,
    /// VA-API (Intel/AMD on Linux).
    H264Vaapi,
    /// Intel Quick Sync.
    H264Qsv,
}

impl VideoEncoder {
    /// Name as listed by `ffmpeg -encoders`.
    pub fn ffmpeg_name(self) -> &'static str {
        match self {
            Self::Libx264 => "libx264",
            Self::H264Videotoolbox => "h264_videotoolbox",
            Self::H264Nvenc => "h264_nvenc",
            Self::H264Vaapi => "h264_vaapi",
            Self::H264Qsv => "h264_qsv",
        }
    }

    /// `false` only for the software encoder.
    pub fn is_hardware(self) -> bool {
        self != Self::Libx264
    }
}

/// Host OS family, which decides the hardware candidates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Platform {
    /// macOS.
    MacOs,
    /// Linux.
    Linux,
    /// Windows.
    Windows,
    /// Anything else; software only.
    Other,
}

impl Platform {
    /// Platform this binary was built for.
    pub fn current() -> Self {
        if cfg!(target_os = "macos") {
            Self::MacOs
        } else if cfg!(target_os = "linux") {
            Self::Linux
        } else if cfg!(target_os = "windows") {
            Self::Windows
        } else {
            Self::Other
        }
    }

    /// Hardware encoders in priority order: platform-native first, generic after.
    pub fn hardware_candidates(self) -> &'static [VideoEncoder] {
        match self {
            Self::MacOs => &[VideoEncoder::H264Videotoolbox],
            Self::Linux => &[VideoEncoder::H264Nvenc, VideoEncoder::H264Vaapi],
            Self::Windows => &[VideoEncoder::H264Nvenc, VideoEncoder::H264Qsv],
            Self::Other => &[],
        }
    }
}

/// Rate-control policy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum RateControl {
    /// Fixed target bitrate (hardware encoders).
    Bitrate {
        /// Target in kbit/s.
        kbps: u32,
    },
    /// Constant rate factor (software encoder).
    Crf {
        /// x264 CRF value.
        crf: u8,
    },
}

/// Resolved encoder and its parameters. Computed once per engine.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct EncoderProfile {
    /// Selected encoder.
    pub encoder: VideoEncoder,
    /// Whether the encoder is hardware accelerated.
    pub hardware: bool,
    /// Rate-control policy.
    pub rate: RateControl,
    /// Encoder preset, when the encoder takes one.
    pub preset: Option<String>,
    /// Device node for encoders that need one (VA-API).
    pub device: Option<PathBuf>,
}

impl EncoderProfile {
    /// Universal software fallback.
    pub fn software(settings: &EncoderSettings) -> Self {
        Self {
            encoder: VideoEncoder::Libx264,
            hardware: false,
            rate: RateControl::Crf {
                crf: settings.software_crf,
            },
            preset: Some(settings.software_preset.clone()),
            device: None,
        }
    }

    /// Hardware profile for `encoder` with a fixed target bitrate.
    pub fn hardware(encoder: VideoEncoder, settings: &EncoderSettings) -> Self {
        if !encoder.is_hardware() {
            return Self::software(settings);
        }
        Self {
            encoder,
            hardware: true,
            rate: RateControl::Bitrate {
                kbps: settings.hardware_bitrate_kbps,
            },
            preset: (encoder == VideoEncoder::H264Nvenc).then(|| settings.nvenc_preset.clone()),
            device: (encoder == VideoEncoder::H264Vaapi).then(|| settings.vaapi_device.clone()),
        }
    }

    /// Arguments that must precede the inputs.
    pub fn input_args(&self) -> Vec<OsString> {
        match &self.device {
            Some(dev) => vec!["-vaapi_device".into(), dev.clone().into_os_string()],
            None => Vec::new(),
        }
    }

    /// Final filters turning a software frame stream into what the encoder accepts.
    pub fn output_filters(&self) -> Vec<Filter> {
        if self.encoder == VideoEncoder::H264Vaapi {
            vec![Filter::new("format").pos("nv12"), Filter::new("hwupload")]
        } else {
            vec![Filter::new("format").pos("yuv420p")]
        }
    }

    /// Codec, preset and rate-control output arguments.
    pub fn video_args(&self) -> Vec<String> {
        let mut args = vec!["-c:v".to_owned(), self.encoder.ffmpeg_name().to_owned()];
        if let Some(p) = &self.preset {
            args.extend(["-preset".to_owned(), p.clone()]);
        }
        match self.rate {
            RateControl::Bitrate { kbps } => args.extend(["-b:v".to_owned(), format!("{kbps}k")]),
            RateControl::Crf { crf } => args.extend(["-crf".to_owned(), crf.to_string()]),
        }
        args
    }
}

/// Probes the host once and resolves an [`EncoderProfile`].
pub struct EncoderSelector<'a> {
    runner: &'a dyn CommandRunner,
    config: &'a EngineConfig,
    platform: Platform,
}

impl<'a> EncoderSelector<'a> {
    /// Selector for the current platform.
    pub fn new(runner: &'a dyn CommandRunner, config: &'a EngineConfig) -> Self {
        Self {
            runner,
            config,
            platform: Platform::current(),
        }
    }

    /// Override the platform family.
    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    /// Candidate profiles in the order they are tried; always ends with software.
    pub fn candidates(&self) -> Vec<EncoderProfile> {
        let settings = &self.config.encoder;
        let mut out = Vec::new();
        if settings.allow_hardware {
            out.extend(
                self.platform
                    .hardware_candidates()
                    .iter()
                    .map(|&e| EncoderProfile::hardware(e, settings)),
            );
        }
        out.push(EncoderProfile::software(settings));
        out
    }

    /// Resolve the profile. Never fails: every probing problem falls through to software.
    #[tracing::instrument(skip(self), fields(platform = ?self.platform))]
    pub fn select(&self) -> EncoderProfile {
        let candidates = self.candidates();
        let listed = if candidates.iter().any(|c| c.hardware) {
            self.list_encoders()
        } else {
            Vec::new()
        };

        for profile in candidates {
            if !profile.hardware {
                tracing::info!(encoder = profile.encoder.ffmpeg_name(), "using software encoding");
                return profile;
            }
            let name = profile.encoder.ffmpeg_name();
            if !listed.iter().any(|l| l == name) {
                continue;
            }
            if self.config.encoder.verify_hardware && !self.trial_encode(&profile) {
                tracing::warn!(encoder = name, "hardware encoder listed but unusable, skipping");
                continue;
            }
            tracing::info!(encoder = name, "hardware acceleration enabled");
            return profile;
        }
        EncoderProfile::software(&self.config.encoder)
    }

    fn list_encoders(&self) -> Vec<String> {
        let mut inv = Invocation::new(
            Stage::ListEncoders,
            &self.config.ffmpeg_path,
            self.config.timeouts.probe(),
        );
        inv.args(["-hide_banner", "-encoders"]);
        match self.runner.run(&inv, &CancelToken::new()) {
            Ok(out) => parse_encoder_list(&String::from_utf8_lossy(&out.stdout)),
            Err(e) => {
                tracing::warn!(error = %e, "encoder listing failed");
                Vec::new()
            }
        }
    }

    fn trial_encode(&self, profile: &EncoderProfile) -> bool {
        let mut inv = Invocation::new(
            Stage::TrialEncode,
            &self.config.ffmpeg_path,
            self.config.timeouts.probe(),
        );
        let vf = profile
            .output_filters()
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",");
        inv.args(["-hide_banner", "-loglevel", "error"])
            .args(profile.input_args())
            .args(["-f", "lavfi", "-i", "color=c=black:s=256x256:r=30:d=0.2"])
            .args(["-vf", &vf])
            .args(profile.video_args())
            .args(["-f", "null", "-"]);
        match self.runner.run(&inv, &CancelToken::new()) {
            Ok(_) => true,
            Err(e) => {
                tracing::debug!(encoder = profile.encoder.ffmpeg_name(), error = %e, "trial encode failed");
                false
            }
        }
    }
}

/// Encoder names from `ffmpeg -encoders` output. Unexpected output yields an empty list.
pub fn parse_encoder_list(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .skip_while(|l| !l.trim_start().starts_with("------"))
        .skip(1)
        .filter_map(|l| {
            let mut parts = l.split_whitespace();
            let flags = parts.next()?;
            let name = parts.next()?;
            (flags.len() == 6).then(|| name.to_owned())
        })
        .collect()
}

#[cfg(test)]
#[path = "../../tests/unit/encode/profile.rs"]
mod tests;
