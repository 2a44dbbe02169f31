use std::path::{Path, PathBuf};
use std::sync::{Arc, mpsc};
use std::time::{Duration, Instant};

use anyhow::Context as _;

use crate::assets::audio::AudioTrack;
use crate::assets::sniff::{AssetRejection, ValidatedAssets, validate_assets};
use crate::assets::thumbnail::write_thumbnail;
use crate::captions::burn::{burn_captions, write_cue_file};
use crate::captions::cues::{CaptionCue, NarrationScript, clamp_cues, generate_cues, parse_srt};
use crate::encode::compose::compose;
use crate::encode::profile::{EncoderProfile, EncoderSelector};
use crate::encode::runner::{CancelToken, CommandRunner, ProcessRunner};
use crate::foundation::config::EngineConfig;
use crate::foundation::error::{ReelError, ReelResult};
use crate::plan::clip::CompositionPlan;

/// Job lifecycle states, in execution order.
///
/// `Failed` follows `Planning` or `Composing`; caption problems never lead there.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobPhase {
    /// Validating the request and the input images.
    Planning,
    /// Allocating durations and building the clip plan.
    Allocating,
    /// Running the composition encode.
    Composing,
    /// Running the caption burn-in pass.
    Captioning,
    /// No captions for this job.
    SkipCaptions,
    /// Finished; the output exists.
    Done,
    /// Aborted; no output was produced.
    Failed,
}

/// Progress notification sent to [`JobOptions::events`].
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct JobEvent {
    /// Phase just entered.
    pub phase: JobPhase,
    /// Time since the job started.
    pub elapsed: Duration,
    /// Optional human-readable detail (failure reason, clip count).
    pub detail: Option<String>,
}

/// Where captions come from.
#[derive(Clone, Debug, Default)]
pub enum CaptionSource {
    /// No captions.
    #[default]
    None,
    /// Generate evenly spaced cues from narration text.
    Narration(NarrationScript),
    /// Burn a ready-made SRT file.
    SubtitleFile(PathBuf),
}

/// Everything one render job needs.
#[derive(Clone, Debug)]
pub struct JobRequest {
    /// Stills in narration order.
    pub images: Vec<PathBuf>,
    /// Narration audio; its duration drives the timeline.
    pub audio: AudioTrack,
    /// Caption input.
    pub captions: CaptionSource,
    /// Final MP4 destination.
    pub output: PathBuf,
    /// Optional cover thumbnail destination.
    pub thumbnail: Option<PathBuf>,
}

/// Per-job runtime controls.
#[derive(Clone, Debug, Default)]
pub struct JobOptions {
    /// Cancels the job; the running subprocess is killed.
    pub cancel: CancelToken,
    /// Receives every phase transition.
    pub events: Option<mpsc::Sender<JobEvent>>,
}

/// How the caption phase ended.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CaptionOutcome {
    /// Captions were burned in.
    Applied {
        /// Number of cues burned.
        cues: usize,
    },
    /// The job had no captions to burn.
    Skipped,
    /// Burn-in failed; the output is the uncaptioned render.
    Degraded {
        /// Why the caption phase failed.
        reason: String,
    },
}

/// Successful job result.
#[derive(Clone, Debug, serde::Serialize)]
pub struct RenderResult {
    /// Final MP4.
    pub output: PathBuf,
    /// Caption phase outcome.
    pub captions: CaptionOutcome,
    /// Inputs dropped during validation.
    pub rejected: Vec<AssetRejection>,
    /// Clips in the composed timeline.
    pub clips: usize,
    /// Timeline length in seconds.
    pub duration_sec: f64,
    /// Encoder profile used.
    pub profile: EncoderProfile,
    /// Written thumbnail, if one was requested and succeeded.
    pub thumbnail: Option<PathBuf>,
    /// Thumbnail failure reason, if one was requested and failed.
    pub thumbnail_error: Option<String>,
    /// Wall-clock time spent on the job.
    pub elapsed: Duration,
}

impl RenderResult {
    /// `true` when the video was produced but captions could not be applied.
    pub fn is_partial(&self) -> bool {
        matches!(self.captions, CaptionOutcome::Degraded { .. })
    }
}

/// A plan plus the inputs that did not make it in.
#[derive(Clone, Debug, serde::Serialize)]
pub struct PlanReport {
    /// Resolved composition plan.
    pub plan: CompositionPlan,
    /// Inputs dropped during validation.
    pub rejected: Vec<AssetRejection>,
}

struct Progress<'a> {
    events: Option<&'a mpsc::Sender<JobEvent>>,
    started: Instant,
}

impl Progress<'_> {
    fn emit(&self, phase: JobPhase, detail: Option<String>) {
        tracing::debug!(?phase, detail = detail.as_deref().unwrap_or(""), "job phase");
        if let Some(tx) = self.events {
            // A dropped receiver only means nobody is listening.
            let _ = tx.send(JobEvent {
                phase,
                elapsed: self.started.elapsed(),
                detail,
            });
        }
    }

    fn fail(&self, err: ReelError) -> ReelError {
        self.emit(JobPhase::Failed, Some(err.to_string()));
        err
    }
}

/// Render engine. Cheap to share across threads; jobs hold no shared mutable state.
///
/// The encoder profile is resolved once at construction and reused by every job.
pub struct Engine {
    config: EngineConfig,
    runner: Arc<dyn CommandRunner>,
    profile: EncoderProfile,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .field("profile", &self.profile)
            .finish_non_exhaustive()
    }
}

impl Engine {
    /// Engine running real ffmpeg processes; probes the host for an encoder.
    pub fn new(config: EngineConfig) -> ReelResult<Self> {
        Self::with_runner(config, Arc::new(ProcessRunner))
    }

    /// Engine with a custom process runner; probes through it for an encoder.
    pub fn with_runner(config: EngineConfig, runner: Arc<dyn CommandRunner>) -> ReelResult<Self> {
        config.validate()?;
        let profile = EncoderSelector::new(runner.as_ref(), &config).select();
        Ok(Self {
            config,
            runner,
            profile,
        })
    }

    /// Engine with a pre-resolved encoder profile; no probing happens.
    pub fn with_profile(
        config: EngineConfig,
        runner: Arc<dyn CommandRunner>,
        profile: EncoderProfile,
    ) -> ReelResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            runner,
            profile,
        })
    }

    /// Active configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Encoder profile every job uses.
    pub fn profile(&self) -> &EncoderProfile {
        &self.profile
    }

    /// Measure an audio file with the configured `ffprobe`.
    pub fn probe_audio(&self, path: &Path) -> ReelResult<AudioTrack> {
        AudioTrack::probe(
            self.runner.as_ref(),
            &self.config.ffprobe_path,
            path,
            self.config.timeouts.probe(),
        )
    }

    /// Validate the stills and build the composition plan without encoding anything.
    pub fn plan(&self, images: &[PathBuf], audio: &AudioTrack) -> ReelResult<PlanReport> {
        let validated = validate_assets(images)?;
        let plan = CompositionPlan::build(validated.assets, audio.duration_sec, &self.config)?;
        Ok(PlanReport {
            plan,
            rejected: validated.rejected,
        })
    }

    /// Run one job to completion.
    ///
    /// Returns an error only for fatal failures, in which case nothing is written to
    /// `req.output`. Caption failures come back as [`CaptionOutcome::Degraded`].
    #[tracing::instrument(skip_all, fields(output = %req.output.display(), images = req.images.len()))]
    pub fn render(&self, req: &JobRequest, opts: &JobOptions) -> ReelResult<RenderResult> {
        let progress = Progress {
            events: opts.events.as_ref(),
            started: Instant::now(),
        };

        progress.emit(JobPhase::Planning, None);
        let validated = self.validate_request(req).map_err(|e| progress.fail(e))?;
        let rejected = validated.rejected;

        progress.emit(JobPhase::Allocating, None);
        let plan = CompositionPlan::build(validated.assets, req.audio.duration_sec, &self.config)
            .map_err(|e| progress.fail(e))?;

        let scratch = tempfile::Builder::new()
            .prefix("reelforge-")
            .tempdir_in(&self.config.temp_dir)
            .with_context(|| {
                format!(
                    "create job scratch directory in '{}'",
                    self.config.temp_dir.display()
                )
            })
            .map_err(|e| progress.fail(e.into()))?;

        progress.emit(JobPhase::Composing, Some(format!("{} clips", plan.clips.len())));
        let composed = scratch.path().join("composed.mp4");
        compose(
            self.runner.as_ref(),
            &plan,
            &req.audio,
            &self.profile,
            &self.config,
            &composed,
            &opts.cancel,
        )
        .map_err(|e| progress.fail(e))?;

        let (final_video, captions) = match self.prepare_cues(req, scratch.path()) {
            Ok(None) => {
                progress.emit(JobPhase::SkipCaptions, None);
                (composed, CaptionOutcome::Skipped)
            }
            Ok(Some((cue_file, cues))) => {
                progress.emit(JobPhase::Captioning, Some(format!("{cues} cues")));
                let captioned = scratch.path().join("captioned.mp4");
                match burn_captions(
                    self.runner.as_ref(),
                    &composed,
                    &cue_file,
                    &self.profile,
                    &self.config,
                    &captioned,
                    &opts.cancel,
                ) {
                    Ok(()) => (captioned, CaptionOutcome::Applied { cues }),
                    Err(e) => degrade(composed, e),
                }
            }
            Err(e) => {
                progress.emit(JobPhase::Captioning, None);
                degrade(composed, e)
            }
        };

        publish(&final_video, &req.output).map_err(|e| progress.fail(e))?;
        drop(scratch);

        let (thumbnail, thumbnail_error) = match (&req.thumbnail, plan.assets.first()) {
            (Some(path), Some(cover)) => match write_thumbnail(cover, path) {
                Ok(()) => (Some(path.clone()), None),
                Err(e) => {
                    tracing::warn!(error = %e, "thumbnail not written");
                    (None, Some(e.to_string()))
                }
            },
            _ => (None, None),
        };

        let result = RenderResult {
            output: req.output.clone(),
            captions,
            rejected,
            clips: plan.clips.len(),
            duration_sec: plan.total_duration_sec,
            profile: self.profile.clone(),
            thumbnail,
            thumbnail_error,
            elapsed: progress.started.elapsed(),
        };
        progress.emit(
            JobPhase::Done,
            result.is_partial().then(|| "captions degraded".to_owned()),
        );
        tracing::info!(
            clips = result.clips,
            partial = result.is_partial(),
            rejected = result.rejected.len(),
            elapsed_ms = result.elapsed.as_millis() as u64,
            "job done"
        );
        Ok(result)
    }

    fn validate_request(&self, req: &JobRequest) -> ReelResult<ValidatedAssets> {
        if req.output.as_os_str().is_empty() {
            return Err(ReelError::validation("output path must not be empty"));
        }
        if !req.audio.path.is_file() {
            return Err(ReelError::validation(format!(
                "audio file '{}' does not exist",
                req.audio.path.display()
            )));
        }
        let validated = validate_assets(&req.images)?;
        prepare_output_dir(&req.output)?;
        Ok(validated)
    }

    /// Write the job's cue file. `Ok(None)` means the job has no captions.
    fn prepare_cues(&self, req: &JobRequest, scratch: &Path) -> ReelResult<Option<(PathBuf, usize)>> {
        if !self.config.captions.enabled {
            return Ok(None);
        }
        let duration = req.audio.duration_sec;
        let cues: Vec<CaptionCue> = match &req.captions {
            CaptionSource::None => return Ok(None),
            CaptionSource::Narration(script) => {
                let cues = generate_cues(&script.narration_text(), duration, &self.config.captions);
                if cues.is_empty() {
                    tracing::info!("narration is empty, skipping captions");
                    return Ok(None);
                }
                cues
            }
            CaptionSource::SubtitleFile(path) => {
                let raw = std::fs::read_to_string(path).map_err(|e| {
                    ReelError::caption_burn(format!("read subtitle file '{}': {e}", path.display()))
                })?;
                let cues = parse_srt(&raw)
                    .map(|c| clamp_cues(c, duration))
                    .map_err(|e| ReelError::caption_burn(e.to_string()))?;
                if cues.is_empty() {
                    return Err(ReelError::caption_burn(
                        "subtitle file has no cues within the audio",
                    ));
                }
                cues
            }
        };
        let cue_file = scratch.join("captions.srt");
        write_cue_file(&cues, &cue_file)?;
        Ok(Some((cue_file, cues.len())))
    }
}

fn degrade(composed: PathBuf, err: ReelError) -> (PathBuf, CaptionOutcome) {
    tracing::warn!(error = %err, "captions degraded, keeping uncaptioned render");
    (
        composed,
        CaptionOutcome::Degraded {
            reason: err.to_string(),
        },
    )
}

/// Make sure `output` can be published to: its parent exists as a directory and
/// `output` itself is not one.
fn prepare_output_dir(output: &Path) -> ReelResult<()> {
    if output.is_dir() {
        return Err(ReelError::validation(format!(
            "output path '{}' is a directory",
            output.display()
        )));
    }
    if let Some(parent) = output.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(|e| {
            ReelError::validation(format!(
                "output directory '{}' is not usable: {e}",
                parent.display()
            ))
        })?;
    }
    Ok(())
}

/// Move a finished render from the scratch directory to its destination.
fn publish(from: &Path, to: &Path) -> ReelResult<()> {
    prepare_output_dir(to)?;
    if std::fs::rename(from, to).is_ok() {
        return Ok(());
    }
    // Scratch and destination may sit on different filesystems.
    copy_then_persist(from, to)
}

/// Copy through a temp sibling of `to`; `to` only ever holds a complete file.
fn copy_then_persist(from: &Path, to: &Path) -> ReelResult<()> {
    let dir = match to.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut staged = tempfile::Builder::new()
        .prefix(".reelforge-")
        .tempfile_in(dir)
        .with_context(|| format!("stage output in '{}'", dir.display()))?;
    let mut src = std::fs::File::open(from)
        .with_context(|| format!("open '{}'", from.display()))?;
    std::io::copy(&mut src, staged.as_file_mut())
        .with_context(|| format!("copy '{}' to '{}'", from.display(), to.display()))?;
    staged
        .persist(to)
        .map_err(|e| e.error)
        .with_context(|| format!("persist '{}'", to.display()))?;
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/session/job.rs"]
mod tests;
