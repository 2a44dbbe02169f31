use super::*;

fn inv(stage: Stage, program: &str, args: &[&str], timeout_ms: u64) -> Invocation {
    let mut i = Invocation::new(stage, program, Duration::from_millis(timeout_ms));
    i.args(args);
    i
}

#[test]
fn invocation_helpers_find_flags() {
    let mut i = inv(Stage::Compose, "ffmpeg", &["-i", "a.png", "-i", "b.mp3"], 1000);
    i.output_path(Path::new("/tmp/out.mp4"));
    assert_eq!(i.count_flag("-i"), 2);
    assert_eq!(i.value_of("-i").as_deref(), Some("a.png"));
    assert_eq!(i.output.as_deref(), Some(Path::new("/tmp/out.mp4")));
    assert_eq!(i.args_lossy().last().map(String::as_str), Some("/tmp/out.mp4"));
    assert!(i.display_command().starts_with("ffmpeg -i a.png"));
}

#[test]
fn stderr_tail_keeps_the_end() {
    let long = "x".repeat(STDERR_TAIL_BYTES + 100) + "END";
    let tail = stderr_tail(long.as_bytes());
    assert!(tail.starts_with("..."));
    assert!(tail.ends_with("END"));
    assert_eq!(stderr_tail(b"  short \n"), "short");
}

#[cfg(unix)]
#[test]
fn process_runner_captures_stdout() {
    let out = ProcessRunner
        .run(
            &inv(Stage::ListEncoders, "sh", &["-c", "echo hello"], 5_000),
            &CancelToken::new(),
        )
        .unwrap();
    assert_eq!(String::from_utf8_lossy(&out.stdout).trim(), "hello");
}

#[cfg(unix)]
#[test]
fn process_runner_reports_exit_and_stderr() {
    let err = ProcessRunner
        .run(
            &inv(Stage::Compose, "sh", &["-c", "echo broken >&2; exit 3"], 5_000),
            &CancelToken::new(),
        )
        .unwrap_err();
    match err {
        RunFailure::Exit { stderr, .. } => assert_eq!(stderr, "broken"),
        other => panic!("unexpected: {other:?}"),
    }
}

#[cfg(unix)]
#[test]
fn process_runner_kills_on_timeout() {
    let started = Instant::now();
    let err = ProcessRunner
        .run(
            &inv(Stage::Compose, "sh", &["-c", "sleep 10"], 150),
            &CancelToken::new(),
        )
        .unwrap_err();
    assert!(matches!(err, RunFailure::TimedOut { .. }));
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[cfg(unix)]
#[test]
fn process_runner_kills_on_cancel() {
    let cancel = CancelToken::new();
    let trigger = cancel.clone();
    let handle = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(100));
        trigger.cancel();
    });
    let err = ProcessRunner
        .run(&inv(Stage::Compose, "sh", &["-c", "sleep 10"], 10_000), &cancel)
        .unwrap_err();
    handle.join().unwrap();
    assert!(matches!(err, RunFailure::Cancelled));
}

#[test]
fn process_runner_reports_spawn_failure() {
    let err = ProcessRunner
        .run(
            &inv(Stage::Compose, "/nonexistent/reelforge-no-such-binary", &[], 1_000),
            &CancelToken::new(),
        )
        .unwrap_err();
    assert!(matches!(err, RunFailure::Spawn { .. }));
}

#[test]
fn recording_runner_scripts_and_records() {
    let dir = tempfile::tempdir().unwrap();
    let runner = RecordingRunner::new()
        .on(Stage::BurnCaptions, Scripted::Fail("no font".to_owned()))
        .on(Stage::ListEncoders, Scripted::Stdout(b"listing".to_vec()));

    let mut compose = inv(Stage::Compose, "ffmpeg", &["-y"], 1_000);
    compose.output_path(&dir.path().join("out.mp4"));
    runner.run(&compose, &CancelToken::new()).unwrap();
    assert!(dir.path().join("out.mp4").is_file());

    let listing = runner
        .run(&inv(Stage::ListEncoders, "ffmpeg", &[], 1_000), &CancelToken::new())
        .unwrap();
    assert_eq!(listing.stdout, b"listing");

    let burn = runner.run(&inv(Stage::BurnCaptions, "ffmpeg", &[], 1_000), &CancelToken::new());
    assert!(matches!(burn, Err(RunFailure::Exit { .. })));

    assert_eq!(runner.invocations().len(), 3);
    assert_eq!(runner.invocations_for(Stage::Compose).len(), 1);
}

#[test]
fn recording_runner_honors_cancel() {
    let runner = RecordingRunner::new();
    let cancel = CancelToken::new();
    cancel.cancel();
    let err = runner
        .run(&inv(Stage::Compose, "ffmpeg", &[], 1_000), &cancel)
        .unwrap_err();
    assert!(matches!(err, RunFailure::Cancelled));
    assert_eq!(runner.invocations().len(), 1);
}
