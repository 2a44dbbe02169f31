use crate::foundation::core::{FrameGeometry, positive_seconds};
use crate::foundation::error::{ReelError, ReelResult};

/// One on-screen slot produced by [`allocate`].
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Slot {
    /// 0-based position on the timeline.
    pub index: usize,
    /// Index into the usable image list (`index % image_count`).
    pub source: usize,
    /// Display time in seconds.
    pub duration_sec: f64,
}

/// Distribute `total_sec` across `image_count` stills without exceeding `cap_sec` per slot.
///
/// When every image fits under the cap each one gets `total_sec / image_count`. Otherwise the
/// list is repeated cyclically until `ceil(total_sec / cap_sec)` slots exist and each slot gets
/// `total_sec / slot_count`.
pub fn allocate(image_count: usize, total_sec: f64, cap_sec: f64) -> ReelResult<Vec<Slot>> {
    if image_count == 0 {
        return Err(ReelError::NoUsableAssets);
    }
    let total_sec = positive_seconds("target duration", total_sec)?;
    let cap_sec = positive_seconds("per-image cap", cap_sec)?;

    let even = total_sec / image_count as f64;
    let slot_count = if even <= cap_sec {
        image_count
    } else {
        (total_sec / cap_sec).ceil() as usize
    };
    let duration_sec = total_sec / slot_count as f64;

    tracing::debug!(
        image_count,
        slot_count,
        duration_sec,
        repeated = slot_count > image_count,
        "allocated slots"
    );
    Ok((0..slot_count)
        .map(|index| Slot {
            index,
            source: index % image_count,
            duration_sec,
        })
        .collect())
}

/// Frame range covered by one slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FrameSpan {
    /// First frame (inclusive).
    pub start: u64,
    /// Number of frames, always at least 1.
    pub count: u64,
}

/// Split the timeline into whole-frame spans, one per slot.
///
/// The total is `ceil(total_sec * fps)` so the video never ends before the audio; the muxer's
/// shortest-stream trim removes the sub-frame overhang. Boundaries are spread with integer
/// arithmetic so spans differ by at most one frame and never drift.
pub fn frame_spans(slot_count: usize, total_sec: f64, geometry: &FrameGeometry) -> Vec<FrameSpan> {
    if slot_count == 0 {
        return Vec::new();
    }
    let n = slot_count as u64;
    // Tolerate float noise such as 12.000000001 * 30.
    let exact = total_sec * f64::from(geometry.fps);
    let total_frames = ((exact - 1e-6).ceil().max(0.0) as u64).max(n);

    let boundary = |k: u64| (k * total_frames + n / 2) / n;
    (0..n)
        .map(|k| {
            let start = boundary(k);
            FrameSpan {
                start,
                count: boundary(k + 1) - start,
            }
        })
        .collect()
}

#[cfg(test)]
#[path = "../../tests/unit/plan/allocator.rs"]
mod tests;
