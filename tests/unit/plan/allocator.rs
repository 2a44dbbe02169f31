use super::*;

fn sources(slots: &[Slot]) -> Vec<usize> {
    slots.iter().map(|s| s.source).collect()
}

#[test]
fn five_images_twenty_seconds_cap_four() {
    let slots = allocate(5, 20.0, 4.0).unwrap();
    assert_eq!(slots.len(), 5);
    assert!(slots.iter().all(|s| (s.duration_sec - 4.0).abs() < 1e-12));
    assert_eq!(sources(&slots), vec![0, 1, 2, 3, 4]);
}

#[test]
fn five_images_twenty_seconds_cap_three_repeats_cyclically() {
    let slots = allocate(5, 20.0, 3.0).unwrap();
    assert_eq!(slots.len(), 7);
    assert_eq!(sources(&slots), vec![0, 1, 2, 3, 4, 0, 1]);
    for s in &slots {
        assert!((s.duration_sec - 20.0 / 7.0).abs() < 1e-12);
    }
    let idx: Vec<_> = slots.iter().map(|s| s.index).collect();
    assert_eq!(idx, (0..7).collect::<Vec<_>>());
}

#[test]
fn sums_match_target_and_respect_cap_across_grid() {
    let fps = 30.0;
    for n in 1..=12usize {
        for &d in &[0.5, 3.0, 7.3, 12.0, 20.0, 59.97, 180.0] {
            for &cap in &[1.0, 2.5, 3.0, 4.0, 6.0] {
                let slots = allocate(n, d, cap).unwrap();
                let sum: f64 = slots.iter().map(|s| s.duration_sec).sum();
                assert!((sum - d).abs() <= 1.0 / fps, "n={n} d={d} cap={cap}");
                for s in &slots {
                    assert!(s.duration_sec <= cap + 1e-9, "n={n} d={d} cap={cap}");
                    assert_eq!(s.source, s.index % n);
                }
                if d / n as f64 > cap {
                    assert_eq!(slots.len(), (d / cap).ceil() as usize);
                } else {
                    assert_eq!(slots.len(), n);
                }
            }
        }
    }
}

#[test]
fn zero_images_is_no_usable_assets() {
    assert!(matches!(
        allocate(0, 12.0, 4.0).unwrap_err(),
        ReelError::NoUsableAssets
    ));
}

#[test]
fn invalid_durations_are_rejected() {
    assert!(allocate(3, 0.0, 4.0).is_err());
    assert!(allocate(3, -1.0, 4.0).is_err());
    assert!(allocate(3, 12.0, 0.0).is_err());
    assert!(allocate(3, f64::NAN, 4.0).is_err());
}

#[test]
fn frame_spans_cover_the_timeline_contiguously() {
    let g = FrameGeometry::default();
    let spans = frame_spans(7, 20.0, &g);
    assert_eq!(spans.len(), 7);
    assert_eq!(spans[0].start, 0);
    for w in spans.windows(2) {
        assert_eq!(w[0].start + w[0].count, w[1].start);
    }
    let total: u64 = spans.iter().map(|s| s.count).sum();
    assert_eq!(total, 600);
    assert!(spans.iter().all(|s| s.count == 85 || s.count == 86));
}

#[test]
fn frame_spans_round_partial_frames_up() {
    let g = FrameGeometry::default();
    // 12.01s at 30fps = 360.3 frames.
    let total: u64 = frame_spans(3, 12.01, &g).iter().map(|s| s.count).sum();
    assert_eq!(total, 361);
    let exact: u64 = frame_spans(3, 12.0, &g).iter().map(|s| s.count).sum();
    assert_eq!(exact, 360);
}

#[test]
fn frame_spans_never_emit_empty_clips() {
    let g = FrameGeometry::default();
    // 0.1s is 3 frames, but 5 slots were requested.
    let spans = frame_spans(5, 0.1, &g);
    assert!(spans.iter().all(|s| s.count >= 1));
    assert!(frame_spans(0, 10.0, &g).is_empty());
}
