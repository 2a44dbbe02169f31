use super::*;
use crate::assets::sniff::ImageKind;

fn assets(n: usize) -> Vec<MediaAsset> {
    (0..n)
        .map(|i| MediaAsset {
            source_index: i,
            path: PathBuf::from(format!("/img/{i}.jpg")),
            kind: ImageKind::Jpeg,
            width: 1920,
            height: 1080,
        })
        .collect()
}

fn config(cap: f64) -> EngineConfig {
    EngineConfig {
        max_clip_sec: cap,
        ..EngineConfig::default()
    }
}

#[test]
fn three_images_twelve_seconds_make_three_four_second_clips() {
    let plan = CompositionPlan::build(assets(3), 12.0, &config(4.0)).unwrap();
    assert_eq!(plan.clips.len(), 3);
    for (i, c) in plan.clips.iter().enumerate() {
        assert_eq!(c.index, i);
        assert_eq!(c.input, i);
        assert!((c.duration_sec - 4.0).abs() < 1e-12);
        assert_eq!(c.frame_count, 120);
        assert_eq!(c.start_frame, 120 * i as u64);
    }
    assert_eq!(plan.total_frames(), 360);
}

#[test]
fn repeated_slots_reuse_inputs_in_cyclic_order() {
    let plan = CompositionPlan::build(assets(5), 20.0, &config(3.0)).unwrap();
    let inputs: Vec<_> = plan.clips.iter().map(|c| c.input).collect();
    assert_eq!(inputs, vec![0, 1, 2, 3, 4, 0, 1]);
    assert_eq!(plan.assets.len(), 5);
    assert_eq!(plan.clips[5].source, PathBuf::from("/img/0.jpg"));
    for w in plan.clips.windows(2) {
        assert_ne!(w[0].motion.name, w[1].motion.name);
    }
}

#[test]
fn empty_asset_list_is_rejected() {
    assert!(matches!(
        CompositionPlan::build(Vec::new(), 12.0, &config(4.0)).unwrap_err(),
        ReelError::NoUsableAssets
    ));
}

#[test]
fn validate_catches_tampered_plans() {
    let good = CompositionPlan::build(assets(2), 6.0, &config(4.0)).unwrap();

    let mut over_cap = good.clone();
    over_cap.clips[0].duration_sec = 5.0;
    assert!(over_cap.validate().is_err());

    let mut reordered = good.clone();
    reordered.clips.swap(0, 1);
    assert!(reordered.validate().is_err());

    let mut short = good.clone();
    short.clips.pop();
    assert!(short.validate().is_err());

    let mut dangling = good;
    dangling.clips[1].input = 9;
    assert!(dangling.validate().is_err());
}

#[test]
fn clip_graph_layers_blur_fit_and_motion() {
    let plan = CompositionPlan::build(assets(3), 12.0, &config(4.0)).unwrap();
    let graphs = plan.clip_graphs(BlurSettings::default());
    assert_eq!(graphs.len(), 3);

    let g = &graphs[1];
    assert_eq!(g.output, Pad::named("v1"));
    assert_eq!(g.chains.len(), 3);
    assert_eq!(
        g.chains[0].to_string(),
        "[1:v]scale=1080:1920:force_original_aspect_ratio=increase,crop=1080:1920,boxblur=20:10[bg1]"
    );
    assert_eq!(
        g.chains[1].to_string(),
        "[1:v]scale=1080:1920:force_original_aspect_ratio=decrease[fg1]"
    );

    let zoompan = g.chains[2].find("zoompan").unwrap();
    assert_eq!(zoompan.get("d"), Some("120"));
    assert_eq!(zoompan.get("s"), Some("1080x1920"));
    assert_eq!(zoompan.get("fps"), Some("30"));
    assert_eq!(zoompan.get("z"), Some("'max(1,1.3-0.3*on/71)'"));
    assert!(g.chains[2].to_string().starts_with("[bg1][fg1]overlay=(W-w)/2:(H-h)/2:shortest=1,zoompan="));
}
