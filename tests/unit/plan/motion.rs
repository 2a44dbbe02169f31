use super::*;

#[test]
fn palette_entries_are_valid_and_distinct() {
    for p in PALETTE {
        p.validate().unwrap();
    }
    let mut names: Vec<_> = PALETTE.iter().map(|p| p.name).collect();
    names.sort_unstable();
    names.dedup();
    assert_eq!(names.len(), PALETTE.len());
}

#[test]
fn neighbors_never_share_a_profile() {
    for i in 0..50 {
        assert_ne!(profile_for(i).name, profile_for(i + 1).name);
    }
    assert_eq!(profile_for(0).name, profile_for(PALETTE.len()).name);
}

#[test]
fn zoom_expression_reaches_target_on_last_frame() {
    let p = profile_for(0);
    let e = p.exprs(120);
    assert_eq!(e.z, "1+0.25*on/119");
    assert_eq!(e.x, "iw/2-(iw/zoom/2)");
    assert!((p.zoom_at(0, 120) - 1.0).abs() < 1e-12);
    assert!((p.zoom_at(119, 120) - 1.25).abs() < 1e-12);
}

#[test]
fn settle_expression_holds_after_settling() {
    let p = profile_for(1);
    let e = p.exprs(101);
    // settle = round(0.6 * 100) = 60 frames.
    assert_eq!(e.z, "max(1,1.3-0.3*on/60)");
    assert!((p.zoom_at(0, 101) - 1.3).abs() < 1e-12);
    assert!((p.zoom_at(60, 101) - 1.0).abs() < 1e-12);
    assert!((p.zoom_at(100, 101) - 1.0).abs() < 1e-12);
}

#[test]
fn pan_moves_across_spare_width() {
    let p = profile_for(4);
    let e = p.exprs(90);
    assert_eq!(e.z, "1.2");
    assert_eq!(e.x, "(iw-iw/zoom)*on/89");

    let rtl = MotionProfile {
        name: "pan_back",
        curve: MotionCurve::Pan {
            zoom: 1.1,
            direction: PanDirection::RightToLeft,
        },
    };
    assert_eq!(rtl.exprs(90).x, "(iw-iw/zoom)*(1-on/89)");
}

#[test]
fn single_frame_clip_does_not_divide_by_zero() {
    let e = profile_for(0).exprs(1);
    assert_eq!(e.z, "1+0.25*on/1");
}

#[test]
fn out_of_range_parameters_are_rejected() {
    let bad = [
        MotionCurve::Zoom { from: 0.5, to: 1.2 },
        MotionCurve::Zoom {
            from: 1.0,
            to: f64::NAN,
        },
        MotionCurve::ZoomSettle {
            from: 1.3,
            to: 1.0,
            settle: 0.0,
        },
        MotionCurve::Pan {
            zoom: 1.0,
            direction: PanDirection::LeftToRight,
        },
    ];
    for curve in bad {
        assert!(MotionProfile { name: "bad", curve }.validate().is_err());
    }
}
