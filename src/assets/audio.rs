use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::encode::runner::{CancelToken, CommandRunner, Invocation, Stage};
use crate::foundation::core::positive_seconds;
use crate::foundation::error::{ReelError, ReelResult};

/// The single narration track. Its duration is the authoritative timeline length.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AudioTrack {
    /// Audio file on disk.
    pub path: PathBuf,
    /// Duration in seconds.
    pub duration_sec: f64,
}

impl AudioTrack {
    /// Create a track with a caller-measured duration.
    pub fn new(path: impl Into<PathBuf>, duration_sec: f64) -> ReelResult<Self> {
        let duration_sec = positive_seconds("audio duration", duration_sec)?;
        Ok(Self {
            path: path.into(),
            duration_sec,
        })
    }

    /// Measure the duration of `path` with `ffprobe`.
    pub fn probe(
        runner: &dyn CommandRunner,
        ffprobe: &Path,
        path: &Path,
        timeout: Duration,
    ) -> ReelResult<Self> {
        let mut inv = Invocation::new(Stage::ProbeAudio, ffprobe, timeout);
        inv.args(["-v", "error", "-print_format", "json", "-show_format"])
            .arg(path);

        let out = runner
            .run(&inv, &CancelToken::new())
            .map_err(|e| ReelError::validation(format!("ffprobe failed for '{}': {e}", path.display())))?;
        let duration_sec = parse_probe_duration(&out.stdout)?;
        tracing::debug!(path = %path.display(), duration_sec, "probed audio duration");
        Self::new(path, duration_sec)
    }
}

fn parse_probe_duration(stdout: &[u8]) -> ReelResult<f64> {
    #[derive(serde::Deserialize)]
    struct ProbeFormat {
        duration: Option<String>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeOut {
        format: Option<ProbeFormat>,
    }

    let parsed: ProbeOut = serde_json::from_slice(stdout)
        .map_err(|e| ReelError::serde(format!("ffprobe json parse failed: {e}")))?;
    let raw = parsed
        .format
        .and_then(|f| f.duration)
        .ok_or_else(|| ReelError::validation("ffprobe reported no container duration"))?;
    raw.trim()
        .parse::<f64>()
        .map_err(|e| ReelError::validation(format!("invalid ffprobe duration '{raw}': {e}")))
}
