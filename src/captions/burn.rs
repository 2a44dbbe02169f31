use std::path::Path;
use std::time::Instant;

use crate::captions::cues::{CaptionCue, to_srt};
use crate::encode::compose::{discard, ensure_nonempty};
use crate::encode::filtergraph::{Chain, Filter, escape_filter_path};
use crate::encode::profile::EncoderProfile;
use crate::encode::runner::{CancelToken, CommandRunner, Invocation, Stage};
use crate::foundation::config::{CaptionStyle, EngineConfig};
use crate::foundation::error::{ReelError, ReelResult};

/// `0xRRGGBB` as an opaque ASS colour (`&H00BBGGRR`).
pub fn ass_colour(rgb: u32) -> String {
    let r = (rgb >> 16) & 0xFF;
    let g = (rgb >> 8) & 0xFF;
    let b = rgb & 0xFF;
    format!("&H00{b:02X}{g:02X}{r:02X}")
}

/// libass `force_style` override string.
pub fn force_style(style: &CaptionStyle) -> String {
    [
        format!("FontName={}", style.font_name),
        format!("FontSize={}", style.font_size),
        format!("Bold={}", u8::from(style.bold)),
        format!("PrimaryColour={}", ass_colour(style.primary_rgb)),
        format!("OutlineColour={}", ass_colour(style.outline_rgb)),
        format!("Outline={}", style.outline),
        format!("Shadow={}", style.shadow),
        format!("Alignment={}", style.alignment),
        format!("MarginV={}", style.margin_v),
    ]
    .join(",")
}

/// Write cues to an SRT file.
pub fn write_cue_file(cues: &[CaptionCue], path: &Path) -> ReelResult<()> {
    if cues.is_empty() {
        return Err(ReelError::caption_burn("no cues to write"));
    }
    std::fs::write(path, to_srt(cues)).map_err(|e| {
        ReelError::caption_burn(format!("write cue file '{}': {e}", path.display()))
    })
}

/// `-vf` chain: subtitle overlay followed by the encoder's pixel-format filters.
pub fn build_filter(cue_file: &Path, profile: &EncoderProfile, style: &CaptionStyle) -> Chain {
    let mut chain = Chain::from([]).then(
        Filter::new("subtitles")
            .kv("filename", escape_filter_path(cue_file))
            .expr("force_style", &force_style(style)),
    );
    for f in profile.output_filters() {
        chain = chain.then(f);
    }
    chain
}

/// Burn-in invocation: re-encode video with the overlay, copy audio unchanged.
pub fn build_invocation(
    composed: &Path,
    cue_file: &Path,
    profile: &EncoderProfile,
    config: &EngineConfig,
    out: &Path,
) -> Invocation {
    let vf = build_filter(cue_file, profile, &config.captions.style);
    let mut inv = Invocation::new(Stage::BurnCaptions, &config.ffmpeg_path, config.timeouts.captions());
    inv.args(["-hide_banner", "-loglevel", "error", "-y"])
        .args(profile.input_args())
        .arg("-i")
        .arg(composed)
        .args(["-vf", &vf.to_string()])
        .args(profile.video_args())
        .args(["-c:a", "copy"])
        .args(["-movflags", "+faststart"])
        .output_path(out);
    inv
}

/// Run the burn-in pass. Every failure comes back as [`ReelError::CaptionBurnFailed`] and
/// leaves no partial output.
#[tracing::instrument(skip_all, fields(cue_file = %cue_file.display()))]
pub fn burn_captions(
    runner: &dyn CommandRunner,
    composed: &Path,
    cue_file: &Path,
    profile: &EncoderProfile,
    config: &EngineConfig,
    out: &Path,
    cancel: &CancelToken,
) -> ReelResult<()> {
    if !cue_file.is_file() {
        return Err(ReelError::caption_burn(format!(
            "cue file '{}' is missing",
            cue_file.display()
        )));
    }
    let inv = build_invocation(composed, cue_file, profile, config, out);
    tracing::debug!(cmd = %inv.display_command(), "caption burn-in command");

    let started = Instant::now();
    if let Err(e) = runner.run(&inv, cancel) {
        discard(out);
        return Err(ReelError::caption_burn(format!("ffmpeg {e}")));
    }
    if let Err(e) = ensure_nonempty(out) {
        discard(out);
        return Err(ReelError::caption_burn(e));
    }
    tracing::info!(elapsed_ms = started.elapsed().as_millis() as u64, "captions burned in");
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/captions/burn.rs"]
mod tests;
