use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};

use reelforge::{
    AudioTrack, CaptionSource, EncoderProfile, Engine, EngineConfig, JobOptions, JobRequest,
    NarrationScript, ProcessRunner,
};

#[derive(Parser, Debug)]
#[command(name = "reelforge", version)]
struct Cli {
    /// Engine config JSON (defaults apply to omitted keys).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging.
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Warnings and errors only.
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Probe the host and print the selected encoder profile as JSON.
    Probe,
    /// Validate inputs and print the composition plan as JSON without encoding.
    Plan(InputArgs),
    /// Render an MP4 (requires `ffmpeg` and, without --audio-duration, `ffprobe`).
    Render(RenderArgs),
}

#[derive(Args, Debug)]
struct InputArgs {
    /// Still images in narration order.
    #[arg(long, num_args = 1.., required = true)]
    images: Vec<PathBuf>,

    /// Narration audio file.
    #[arg(long)]
    audio: PathBuf,

    /// Audio duration in seconds; probed with ffprobe when omitted.
    #[arg(long)]
    audio_duration: Option<f64>,
}

#[derive(Args, Debug)]
struct RenderArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Output MP4 path.
    #[arg(long)]
    out: PathBuf,

    /// Narration script JSON used to generate captions.
    #[arg(long, conflicts_with = "subtitles")]
    script: Option<PathBuf>,

    /// Ready-made SRT file to burn instead of generated captions.
    #[arg(long)]
    subtitles: Option<PathBuf>,

    /// Also write a 1280x720 JPEG thumbnail here.
    #[arg(long)]
    thumbnail: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    let config = match &cli.config {
        Some(path) => EngineConfig::from_path(path)?,
        None => EngineConfig::default(),
    };

    match cli.cmd {
        Command::Probe => cmd_probe(config),
        Command::Plan(args) => cmd_plan(config, args),
        Command::Render(args) => cmd_render(config, args),
    }
}

fn init_tracing(verbose: bool, quiet: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else if quiet {
        tracing::Level::WARN
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    let text = serde_json::to_string_pretty(value).context("serialize output")?;
    println!("{text}");
    Ok(())
}

fn audio_track(engine: &Engine, args: &InputArgs) -> anyhow::Result<AudioTrack> {
    let track = match args.audio_duration {
        Some(d) => AudioTrack::new(&args.audio, d)?,
        None => engine.probe_audio(&args.audio)?,
    };
    Ok(track)
}

fn cmd_probe(config: EngineConfig) -> anyhow::Result<()> {
    let engine = Engine::new(config)?;
    print_json(engine.profile())
}

fn cmd_plan(config: EngineConfig, args: InputArgs) -> anyhow::Result<()> {
    // Planning never encodes, so skip encoder probing.
    let profile = EncoderProfile::software(&config.encoder);
    let engine = Engine::with_profile(config, Arc::new(ProcessRunner), profile)?;
    let audio = audio_track(&engine, &args)?;
    let report = engine.plan(&args.images, &audio)?;
    for r in &report.rejected {
        tracing::warn!(path = %r.path.display(), reason = %r.reason, "image rejected");
    }
    print_json(&report)
}

fn load_captions(args: &RenderArgs) -> anyhow::Result<CaptionSource> {
    if let Some(path) = &args.subtitles {
        return Ok(CaptionSource::SubtitleFile(path.clone()));
    }
    match &args.script {
        Some(path) => Ok(CaptionSource::Narration(NarrationScript::from_path(path)?)),
        None => Ok(CaptionSource::None),
    }
}

fn cmd_render(config: EngineConfig, args: RenderArgs) -> anyhow::Result<()> {
    let engine = Engine::new(config)?;
    let audio = audio_track(&engine, &args.input)?;
    let request = JobRequest {
        images: args.input.images.clone(),
        audio,
        captions: load_captions(&args)?,
        output: args.out.clone(),
        thumbnail: args.thumbnail.clone(),
    };

    let result = engine
        .render(&request, &JobOptions::default())
        .with_context(|| format!("render '{}'", args.out.display()))?;
    if result.is_partial() {
        eprintln!("wrote {} (without captions)", result.output.display());
    } else {
        eprintln!("wrote {}", result.output.display());
    }
    print_json(&result)
}
