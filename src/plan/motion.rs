use crate::encode::filtergraph::num;
use crate::foundation::error::{ReelError, ReelResult};

/// Horizontal pan direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PanDirection {
    /// Start at the left edge, end at the right edge.
    LeftToRight,
    /// Start at the right edge, end at the left edge.
    RightToLeft,
}

/// Zoom/pan curve, evaluated per output frame `on` in `0..frames`.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MotionCurve {
    /// Linear zoom from `from` at the first frame to `to` at the last frame.
    Zoom {
        /// Zoom factor at the first frame.
        from: f64,
        /// Zoom factor at the last frame.
        to: f64,
    },
    /// Linear zoom that reaches `to` after the `settle` fraction of the clip, then holds.
    ZoomSettle {
        /// Zoom factor at the first frame.
        from: f64,
        /// Zoom factor held after settling.
        to: f64,
        /// Fraction of the clip spent moving, in `(0, 1]`.
        settle: f64,
    },
    /// Fixed zoom with a horizontal pan across the spare width.
    Pan {
        /// Constant zoom factor, must exceed 1 so there is room to pan.
        zoom: f64,
        /// Pan direction.
        direction: PanDirection,
    },
}

/// A named entry of the motion palette.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct MotionProfile {
    /// Stable identifier.
    pub name: &'static str,
    /// Curve parameters.
    pub curve: MotionCurve,
}

const MAX_ZOOM: f64 = 3.0;

/// Fixed motion palette, applied cyclically by clip index.
pub const PALETTE: [MotionProfile; 7] = [
    MotionProfile {
        name: "zoom_in",
        curve: MotionCurve::Zoom { from: 1.0, to: 1.25 },
    },
    MotionProfile {
        name: "zoom_out_hold",
        curve: MotionCurve::ZoomSettle {
            from: 1.3,
            to: 1.0,
            settle: 0.6,
        },
    },
    MotionProfile {
        name: "fast_zoom",
        curve: MotionCurve::Zoom { from: 1.0, to: 1.35 },
    },
    MotionProfile {
        name: "medium_zoom",
        curve: MotionCurve::Zoom { from: 1.0, to: 1.2 },
    },
    MotionProfile {
        name: "ken_burns",
        curve: MotionCurve::Pan {
            zoom: 1.2,
            direction: PanDirection::LeftToRight,
        },
    },
    MotionProfile {
        name: "dynamic_zoom",
        curve: MotionCurve::Zoom { from: 1.0, to: 1.3 },
    },
    MotionProfile {
        name: "slow_zoom",
        curve: MotionCurve::Zoom { from: 1.0, to: 1.15 },
    },
];

/// Profile for the clip at `index`. Adjacent clips never share a profile.
pub fn profile_for(index: usize) -> MotionProfile {
    PALETTE[index % PALETTE.len()]
}

/// `zoompan` expressions for one clip.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ZoomPanExprs {
    /// Zoom factor expression (`z`).
    pub z: String,
    /// Crop window left edge (`x`).
    pub x: String,
    /// Crop window top edge (`y`).
    pub y: String,
}

const CENTER_X: &str = "iw/2-(iw/zoom/2)";
const CENTER_Y: &str = "ih/2-(ih/zoom/2)";

impl MotionProfile {
    /// Check curve parameters before they are serialized into a filtergraph.
    pub fn validate(&self) -> ReelResult<()> {
        let zoom_ok = |z: f64| z.is_finite() && (1.0..=MAX_ZOOM).contains(&z);
        let ok = match self.curve {
            MotionCurve::Zoom { from, to } => zoom_ok(from) && zoom_ok(to),
            MotionCurve::ZoomSettle { from, to, settle } => {
                zoom_ok(from) && zoom_ok(to) && settle.is_finite() && settle > 0.0 && settle <= 1.0
            }
            MotionCurve::Pan { zoom, .. } => zoom_ok(zoom) && zoom > 1.0,
        };
        if !ok {
            return Err(ReelError::validation(format!(
                "motion profile '{}' has out-of-range parameters",
                self.name
            )));
        }
        Ok(())
    }

    /// Build expressions so the motion completes exactly on the clip's last frame.
    pub fn exprs(&self, frames: u64) -> ZoomPanExprs {
        let last = frames.saturating_sub(1).max(1);
        match self.curve {
            MotionCurve::Zoom { from, to } => ZoomPanExprs {
                z: linear(from, to, &format!("on/{last}")),
                x: CENTER_X.to_owned(),
                y: CENTER_Y.to_owned(),
            },
            MotionCurve::ZoomSettle { from, to, settle } => {
                let settle_frames = ((settle * last as f64).round() as u64).max(1);
                let ramp = linear(from, to, &format!("on/{settle_frames}"));
                let z = if to >= from {
                    format!("min({},{})", num(to), ramp)
                } else {
                    format!("max({},{})", num(to), ramp)
                };
                ZoomPanExprs {
                    z,
                    x: CENTER_X.to_owned(),
                    y: CENTER_Y.to_owned(),
                }
            }
            MotionCurve::Pan { zoom, direction } => {
                let progress = match direction {
                    PanDirection::LeftToRight => format!("on/{last}"),
                    PanDirection::RightToLeft => format!("(1-on/{last})"),
                };
                ZoomPanExprs {
                    z: num(zoom),
                    x: format!("(iw-iw/zoom)*{progress}"),
                    y: CENTER_Y.to_owned(),
                }
            }
        }
    }

    /// Zoom factor at frame `on` of a `frames`-long clip, mirroring [`MotionProfile::exprs`].
    pub fn zoom_at(&self, on: u64, frames: u64) -> f64 {
        let last = frames.saturating_sub(1).max(1) as f64;
        let t = (on as f64 / last).min(1.0);
        match self.curve {
            MotionCurve::Zoom { from, to } => from + (to - from) * t,
            MotionCurve::ZoomSettle { from, to, settle } => {
                let settle_frames = (settle * last).round().max(1.0);
                let v = from + (to - from) * (on as f64 / settle_frames);
                if to >= from { v.min(to) } else { v.max(to) }
            }
            MotionCurve::Pan { zoom, .. } => zoom,
        }
    }
}

fn linear(from: f64, to: f64, progress: &str) -> String {
    let delta = to - from;
    if delta == 0.0 {
        num(from)
    } else if delta > 0.0 {
        format!("{}+{}*{progress}", num(from), num(delta))
    } else {
        format!("{}-{}*{progress}", num(from), num(-delta))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/plan/motion.rs"]
mod tests;
