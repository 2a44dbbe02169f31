use super::*;
use crate::encode::runner::RecordingRunner;

fn engine(config: EngineConfig) -> Engine {
    let profile = EncoderProfile::software(&config.encoder);
    Engine::with_profile(config, Arc::new(RecordingRunner::new()), profile).unwrap()
}

fn request(dir: &Path, captions: CaptionSource) -> JobRequest {
    JobRequest {
        images: Vec::new(),
        audio: AudioTrack::new(dir.join("voice.mp3"), 12.0).unwrap(),
        captions,
        output: dir.join("out.mp4"),
        thumbnail: None,
    }
}

#[test]
fn publish_creates_parent_and_moves_file() {
    let dir = tempfile::tempdir().unwrap();
    let from = dir.path().join("composed.mp4");
    std::fs::write(&from, b"video").unwrap();
    let to = dir.path().join("nested/deeper/final.mp4");
    publish(&from, &to).unwrap();
    assert_eq!(std::fs::read(&to).unwrap(), b"video");
    assert!(!from.exists());
}

#[test]
fn copy_failure_leaves_destination_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let out_dir = dir.path().join("out");
    std::fs::create_dir(&out_dir).unwrap();
    let to = out_dir.join("final.mp4");
    std::fs::write(&to, b"previous render").unwrap();

    // Opening a directory succeeds but reading it fails, so the copy dies midway.
    let unreadable = dir.path().join("not-a-file");
    std::fs::create_dir(&unreadable).unwrap();
    assert!(copy_then_persist(&unreadable, &to).is_err());

    assert_eq!(std::fs::read(&to).unwrap(), b"previous render");
    let leftovers: Vec<_> = std::fs::read_dir(&out_dir)
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .collect();
    assert_eq!(leftovers, vec![std::ffi::OsString::from("final.mp4")]);
}

#[test]
fn copy_then_persist_replaces_destination() {
    let dir = tempfile::tempdir().unwrap();
    let from = dir.path().join("composed.mp4");
    std::fs::write(&from, b"fresh video").unwrap();
    let to = dir.path().join("final.mp4");
    std::fs::write(&to, b"old").unwrap();
    copy_then_persist(&from, &to).unwrap();
    assert_eq!(std::fs::read(&to).unwrap(), b"fresh video");
}

#[test]
fn output_dir_must_be_a_directory() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, b"file").unwrap();
    let err = prepare_output_dir(&blocker.join("out.mp4")).unwrap_err();
    assert!(matches!(err, ReelError::Validation(_)));
    assert!(prepare_output_dir(dir.path()).is_err());
    prepare_output_dir(&dir.path().join("a/b/out.mp4")).unwrap();
    assert!(dir.path().join("a/b").is_dir());
}

#[test]
fn narration_cues_are_written_to_scratch() {
    let dir = tempfile::tempdir().unwrap();
    let e = engine(EngineConfig::default());
    let req = request(
        dir.path(),
        CaptionSource::Narration(NarrationScript::from_scenes(["one two three", "four five six"])),
    );
    let (file, cues) = e.prepare_cues(&req, dir.path()).unwrap().unwrap();
    assert_eq!(cues, 2);
    let srt = std::fs::read_to_string(file).unwrap();
    assert!(srt.contains("00:00:06,200 --> 00:00:12,000"));
}

#[test]
fn no_source_empty_narration_or_disabled_captions_skip() {
    let dir = tempfile::tempdir().unwrap();
    let e = engine(EngineConfig::default());
    assert!(e.prepare_cues(&request(dir.path(), CaptionSource::None), dir.path()).unwrap().is_none());
    let empty = CaptionSource::Narration(NarrationScript::from_scenes(["  "]));
    assert!(e.prepare_cues(&request(dir.path(), empty), dir.path()).unwrap().is_none());

    let mut cfg = EngineConfig::default();
    cfg.captions.enabled = false;
    let off = engine(cfg);
    let narr = CaptionSource::Narration(NarrationScript::from_scenes(["hello"]));
    assert!(off.prepare_cues(&request(dir.path(), narr), dir.path()).unwrap().is_none());
}

#[test]
fn subtitle_files_are_clamped_to_the_audio() {
    let dir = tempfile::tempdir().unwrap();
    let srt = dir.path().join("whisper.srt");
    std::fs::write(
        &srt,
        "1\n00:00:00,000 --> 00:00:05,000\nhello\n\n2\n00:00:10,000 --> 00:00:15,000\nthere\n\n3\n00:00:13,000 --> 00:00:14,000\nlate\n",
    )
    .unwrap();
    let e = engine(EngineConfig::default());
    let scratch = dir.path().join("scratch");
    std::fs::create_dir(&scratch).unwrap();
    let (file, cues) = e
        .prepare_cues(&request(dir.path(), CaptionSource::SubtitleFile(srt)), &scratch)
        .unwrap()
        .unwrap();
    assert_eq!(cues, 2);
    assert!(std::fs::read_to_string(file).unwrap().contains("00:00:10,000 --> 00:00:12,000"));
}

#[test]
fn malformed_subtitle_file_is_a_caption_error() {
    let dir = tempfile::tempdir().unwrap();
    let srt = dir.path().join("bad.srt");
    std::fs::write(&srt, "this is not srt").unwrap();
    let e = engine(EngineConfig::default());
    let err = e
        .prepare_cues(&request(dir.path(), CaptionSource::SubtitleFile(srt)), dir.path())
        .unwrap_err();
    assert!(matches!(err, ReelError::CaptionBurnFailed(_)));

    let missing = CaptionSource::SubtitleFile(dir.path().join("nope.srt"));
    let err = e.prepare_cues(&request(dir.path(), missing), dir.path()).unwrap_err();
    assert!(!err.is_fatal());
}

#[test]
fn degraded_outcome_marks_result_partial() {
    let (path, outcome) = degrade(PathBuf::from("c.mp4"), ReelError::caption_burn("boom"));
    assert_eq!(path, PathBuf::from("c.mp4"));
    let result = RenderResult {
        output: path,
        captions: outcome,
        rejected: Vec::new(),
        clips: 1,
        duration_sec: 1.0,
        profile: EncoderProfile::software(&EngineConfig::default().encoder),
        thumbnail: None,
        thumbnail_error: None,
        elapsed: Duration::ZERO,
    };
    assert!(result.is_partial());
    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["captions"]["status"], "degraded");
    assert_eq!(json["profile"]["encoder"], "libx264");
}
