use std::path::Path;
use std::time::Instant;

use crate::assets::audio::AudioTrack;
use crate::encode::filtergraph::{Chain, Filter, FilterGraph, Pad};
use crate::encode::profile::EncoderProfile;
use crate::encode::runner::{CancelToken, CommandRunner, Invocation, Stage};
use crate::foundation::config::EngineConfig;
use crate::foundation::error::{ReelError, ReelResult};
use crate::plan::clip::CompositionPlan;

/// Link carrying the concatenated, encoder-ready video.
pub const OUTPUT_PAD: &str = "outv";

/// Combine every clip subgraph and concatenate the clips in index order.
pub fn build_filtergraph(
    plan: &CompositionPlan,
    profile: &EncoderProfile,
    config: &EngineConfig,
) -> FilterGraph {
    let mut graph = FilterGraph::default();
    let clips = plan.clip_graphs(config.background_blur);

    let mut concat = Chain::from(clips.iter().map(|c| c.output.clone())).then(
        Filter::new("concat")
            .kv("n", clips.len())
            .kv("v", 1)
            .kv("a", 0),
    );
    for f in profile.output_filters() {
        concat = concat.then(f);
    }

    for clip in clips {
        graph.extend(clip.chains);
    }
    graph.extend([concat.into_pad(Pad::named(OUTPUT_PAD))]);
    graph
}

/// Build the single composition invocation: all stills plus the audio in, one MP4 out.
pub fn build_invocation(
    plan: &CompositionPlan,
    audio: &AudioTrack,
    profile: &EncoderProfile,
    config: &EngineConfig,
    out: &Path,
) -> ReelResult<Invocation> {
    plan.validate()?;
    let graph = build_filtergraph(plan, profile, config);
    let audio_input = plan.assets.len();
    let enc = &config.encoder;

    let mut inv = Invocation::new(Stage::Compose, &config.ffmpeg_path, config.timeouts.compose());
    inv.args(["-hide_banner", "-loglevel", "error", "-y"])
        .args(profile.input_args());
    for asset in &plan.assets {
        inv.arg("-i").arg(&asset.path);
    }
    inv.arg("-i").arg(&audio.path);
    inv.args(["-filter_complex", &graph.to_string()])
        .args(["-map", &Pad::named(OUTPUT_PAD).map_arg()])
        .args(["-map", &format!("{audio_input}:a:0")])
        .args(profile.video_args())
        .args(["-c:a", &enc.audio_codec])
        .args(["-b:a", &format!("{}k", enc.audio_bitrate_kbps)])
        .args(["-r", &plan.geometry.fps.to_string()])
        // Audio is authoritative; the video is built to match, so this trims at most a frame.
        .arg("-shortest")
        .args(["-movflags", "+faststart"])
        .output_path(out);
    Ok(inv)
}

/// Run the composition encode. Any failure is fatal for the job.
#[tracing::instrument(skip_all, fields(clips = plan.clips.len(), encoder = profile.encoder.ffmpeg_name()))]
pub fn compose(
    runner: &dyn CommandRunner,
    plan: &CompositionPlan,
    audio: &AudioTrack,
    profile: &EncoderProfile,
    config: &EngineConfig,
    out: &Path,
    cancel: &CancelToken,
) -> ReelResult<()> {
    let inv = build_invocation(plan, audio, profile, config, out)?;
    tracing::debug!(cmd = %inv.display_command(), "composition command");

    let started = Instant::now();
    if let Err(e) = runner.run(&inv, cancel) {
        discard(out);
        return Err(ReelError::composition(format!("ffmpeg {e}")));
    }
    if let Err(e) = ensure_nonempty(out) {
        discard(out);
        return Err(ReelError::composition(e));
    }

    tracing::info!(
        out = %out.display(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "composition encoded"
    );
    Ok(())
}

/// Check that an encode actually produced a file.
pub(crate) fn ensure_nonempty(path: &Path) -> Result<(), String> {
    match std::fs::metadata(path) {
        Ok(m) if m.is_file() && m.len() > 0 => Ok(()),
        Ok(_) => Err(format!("encoder produced an empty output '{}'", path.display())),
        Err(e) => Err(format!("encoder produced no output '{}': {e}", path.display())),
    }
}

/// Remove a partial output, ignoring absence.
pub(crate) fn discard(path: &Path) {
    if let Err(e) = std::fs::remove_file(path)
        && e.kind() != std::io::ErrorKind::NotFound
    {
        tracing::warn!(path = %path.display(), error = %e, "could not remove partial output");
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/compose.rs"]
mod tests;
