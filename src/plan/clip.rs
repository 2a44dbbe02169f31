use std::path::PathBuf;

use crate::assets::sniff::MediaAsset;
use crate::encode::filtergraph::{Chain, Filter, Pad};
use crate::foundation::config::{BlurSettings, EngineConfig};
use crate::foundation::core::FrameGeometry;
use crate::foundation::error::{ReelError, ReelResult};
use crate::plan::allocator::{allocate, frame_spans};
use crate::plan::motion::{MotionProfile, profile_for};

/// One timeline slot: which still, for how long, with which motion.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct ClipSpec {
    /// Timeline position; concatenation follows this order.
    pub index: usize,
    /// ffmpeg input index of the still (position in [`CompositionPlan::assets`]).
    pub input: usize,
    /// Still image path.
    pub source: PathBuf,
    /// Allocated display time in seconds.
    pub duration_sec: f64,
    /// First timeline frame of the clip.
    pub start_frame: u64,
    /// Frames rendered for the clip.
    pub frame_count: u64,
    /// Pan/zoom profile.
    pub motion: MotionProfile,
}

/// Engine-internal plan for one job.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct CompositionPlan {
    /// Output geometry.
    pub geometry: FrameGeometry,
    /// Audio-driven timeline length in seconds.
    pub total_duration_sec: f64,
    /// Per-still cap used for allocation.
    pub max_clip_sec: f64,
    /// Usable stills, each passed to ffmpeg once, in caller order.
    pub assets: Vec<MediaAsset>,
    /// Clips in timeline order.
    pub clips: Vec<ClipSpec>,
}

impl CompositionPlan {
    /// Allocate durations and assign motion for `assets` against `total_duration_sec`.
    #[tracing::instrument(skip(assets, config), fields(assets = assets.len()))]
    pub fn build(
        assets: Vec<MediaAsset>,
        total_duration_sec: f64,
        config: &EngineConfig,
    ) -> ReelResult<Self> {
        let geometry = config.geometry;
        let slots = allocate(assets.len(), total_duration_sec, config.max_clip_sec)?;
        let spans = frame_spans(slots.len(), total_duration_sec, &geometry);

        let clips = slots
            .iter()
            .zip(spans)
            .map(|(slot, span)| ClipSpec {
                index: slot.index,
                input: slot.source,
                source: assets[slot.source].path.clone(),
                duration_sec: slot.duration_sec,
                start_frame: span.start,
                frame_count: span.count,
                motion: profile_for(slot.index),
            })
            .collect();

        let plan = Self {
            geometry,
            total_duration_sec,
            max_clip_sec: config.max_clip_sec,
            assets,
            clips,
        };
        plan.validate()?;
        tracing::info!(
            clips = plan.clips.len(),
            frames = plan.total_frames(),
            "composition plan ready"
        );
        Ok(plan)
    }

    /// Sum of clip frame counts.
    pub fn total_frames(&self) -> u64 {
        self.clips.iter().map(|c| c.frame_count).sum()
    }

    /// Check plan invariants before anything is serialized.
    pub fn validate(&self) -> ReelResult<()> {
        if self.assets.is_empty() || self.clips.is_empty() {
            return Err(ReelError::NoUsableAssets);
        }
        let frame = self.geometry.frame_duration_sec();
        let sum: f64 = self.clips.iter().map(|c| c.duration_sec).sum();
        if sum + frame < self.total_duration_sec {
            return Err(ReelError::validation(format!(
                "clips cover {sum:.3}s of a {:.3}s timeline",
                self.total_duration_sec
            )));
        }
        let mut next_frame = 0;
        for (pos, c) in self.clips.iter().enumerate() {
            if c.index != pos {
                return Err(ReelError::validation("clip indices must be contiguous"));
            }
            if c.input >= self.assets.len() {
                return Err(ReelError::validation(format!(
                    "clip {pos} references missing input {}",
                    c.input
                )));
            }
            if c.duration_sec > self.max_clip_sec + 1e-9 {
                return Err(ReelError::validation(format!(
                    "clip {pos} lasts {:.3}s, above the {:.3}s cap",
                    c.duration_sec, self.max_clip_sec
                )));
            }
            if c.frame_count == 0 || c.start_frame != next_frame {
                return Err(ReelError::validation(format!(
                    "clip {pos} has a broken frame span"
                )));
            }
            next_frame += c.frame_count;
            c.motion.validate()?;
        }
        Ok(())
    }

    /// One subgraph per clip, in timeline order.
    pub fn clip_graphs(&self, blur: BlurSettings) -> Vec<ClipGraph> {
        self.clips
            .iter()
            .map(|c| ClipGraph::build(c, &self.geometry, blur))
            .collect()
    }
}

/// Filter chains that turn one still into one clip stream.
#[derive(Clone, Debug, PartialEq)]
pub struct ClipGraph {
    /// Clip index.
    pub index: usize,
    /// Background, foreground and composite chains.
    pub chains: Vec<Chain>,
    /// Link carrying the finished clip.
    pub output: Pad,
}

impl ClipGraph {
    /// Blurred fill behind a fitted foreground, then pan/zoom over the composite.
    pub fn build(clip: &ClipSpec, geometry: &FrameGeometry, blur: BlurSettings) -> Self {
        let (w, h) = (geometry.width, geometry.height);
        let k = clip.index;
        let bg = Pad::named(format!("bg{k}"));
        let fg = Pad::named(format!("fg{k}"));
        let out = Pad::named(format!("v{k}"));

        let background = Chain::from([Pad::input_video(clip.input)])
            .then(
                Filter::new("scale")
                    .pos(w)
                    .pos(h)
                    .kv("force_original_aspect_ratio", "increase"),
            )
            .then(Filter::new("crop").pos(w).pos(h))
            .then(Filter::new("boxblur").pos(blur.radius).pos(blur.power))
            .into_pad(bg.clone());

        let foreground = Chain::from([Pad::input_video(clip.input)])
            .then(
                Filter::new("scale")
                    .pos(w)
                    .pos(h)
                    .kv("force_original_aspect_ratio", "decrease"),
            )
            .into_pad(fg.clone());

        let motion = clip.motion.exprs(clip.frame_count);
        let composite = Chain::from([bg, fg])
            .then(
                Filter::new("overlay")
                    .pos("(W-w)/2")
                    .pos("(H-h)/2")
                    .kv("shortest", 1),
            )
            .then(
                Filter::new("zoompan")
                    .expr("z", &motion.z)
                    .expr("x", &motion.x)
                    .expr("y", &motion.y)
                    .kv("d", clip.frame_count)
                    .kv("s", geometry.size_arg())
                    .kv("fps", geometry.fps),
            )
            .then(Filter::new("setsar").pos(1))
            .into_pad(out.clone());

        Self {
            index: k,
            chains: vec![background, foreground, composite],
            output: out,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/plan/clip.rs"]
mod tests;
