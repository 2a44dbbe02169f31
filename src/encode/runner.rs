use std::ffi::{OsStr, OsString};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

/// Which external step an [`Invocation`] belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Stage {
    /// `ffmpeg -encoders` listing.
    ListEncoders,
    /// Tiny trial encode to confirm a hardware encoder works.
    TrialEncode,
    /// `ffprobe` duration measurement.
    ProbeAudio,
    /// Primary single-invocation composition.
    Compose,
    /// Subtitle burn-in pass.
    BurnCaptions,
}

/// A fully-built external command, ready to run.
#[derive(Clone, Debug, PartialEq)]
pub struct Invocation {
    /// Step this command implements.
    pub stage: Stage,
    /// Executable.
    pub program: PathBuf,
    /// Arguments, in order.
    pub args: Vec<OsString>,
    /// Hard wall-clock deadline.
    pub timeout: Duration,
    /// File the command is expected to create, if any.
    pub output: Option<PathBuf>,
}

impl Invocation {
    /// Start a new invocation of `program`.
    pub fn new(stage: Stage, program: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            stage,
            program: program.into(),
            args: Vec::new(),
            timeout,
            output: None,
        }
    }

    /// Append one argument.
    pub fn arg(&mut self, a: impl AsRef<OsStr>) -> &mut Self {
        self.args.push(a.as_ref().to_owned());
        self
    }

    /// Append several arguments.
    pub fn args<I, S>(&mut self, it: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args.extend(it.into_iter().map(|a| a.as_ref().to_owned()));
        self
    }

    /// Append the output path as the final argument and remember it.
    pub fn output_path(&mut self, path: &Path) -> &mut Self {
        self.args.push(path.as_os_str().to_owned());
        self.output = Some(path.to_path_buf());
        self
    }

    /// Arguments as UTF-8 (lossy), for logs and assertions.
    pub fn args_lossy(&self) -> Vec<String> {
        self.args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    /// Value following the first occurrence of `flag`.
    pub fn value_of(&self, flag: &str) -> Option<String> {
        let args = self.args_lossy();
        let pos = args.iter().position(|a| a == flag)?;
        args.get(pos + 1).cloned()
    }

    /// Number of occurrences of `flag`.
    pub fn count_flag(&self, flag: &str) -> usize {
        self.args.iter().filter(|a| a.as_os_str() == flag).count()
    }

    /// Shell-like rendering for debug logs.
    pub fn display_command(&self) -> String {
        let mut s = self.program.display().to_string();
        for a in self.args_lossy() {
            s.push(' ');
            if a.contains([' ', '\'', ';', '[']) {
                s.push('"');
                s.push_str(&a);
                s.push('"');
            } else {
                s.push_str(&a);
            }
        }
        s
    }
}

/// Captured output of a successful invocation.
#[derive(Clone, Debug, Default)]
pub struct InvocationOutput {
    /// Captured stdout.
    pub stdout: Vec<u8>,
    /// Captured stderr.
    pub stderr: Vec<u8>,
}

/// Why an invocation did not complete successfully.
#[derive(thiserror::Error, Debug)]
pub enum RunFailure {
    /// The executable could not be started.
    #[error("failed to spawn '{}': {source}", program.display())]
    Spawn {
        /// Executable that failed to start.
        program: PathBuf,
        /// Underlying OS error.
        source: std::io::Error,
    },
    /// The process ran and exited unsuccessfully.
    #[error("exited with {status}: {stderr}")]
    Exit {
        /// Exit status description.
        status: String,
        /// Tail of captured stderr.
        stderr: String,
    },
    /// The process exceeded its deadline and was killed.
    #[error("timed out after {}s and was killed", after.as_secs_f64())]
    TimedOut {
        /// Deadline that was exceeded.
        after: Duration,
    },
    /// The caller cancelled the job; the process was killed.
    #[error("cancelled")]
    Cancelled,
    /// Waiting on or reading from the process failed.
    #[error("process io error: {0}")]
    Io(String),
}

/// Shared cancellation flag for one job.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Create an un-cancelled token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Any running subprocess of the job is killed.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Return `true` once [`CancelToken::cancel`] was called.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Seam between the engine and external processes.
///
/// Implementations must block until the process finishes, is killed at its deadline, or is
/// killed because `cancel` fired.
pub trait CommandRunner: Send + Sync {
    /// Run `inv` to completion.
    fn run(&self, inv: &Invocation, cancel: &CancelToken) -> Result<InvocationOutput, RunFailure>;
}

/// Runs invocations as real child processes.
#[derive(Clone, Copy, Debug, Default)]
pub struct ProcessRunner;

const POLL_INTERVAL: Duration = Duration::from_millis(25);
const STDERR_TAIL_BYTES: usize = 2048;

type Drain = JoinHandle<std::io::Result<Vec<u8>>>;

impl CommandRunner for ProcessRunner {
    fn run(&self, inv: &Invocation, cancel: &CancelToken) -> Result<InvocationOutput, RunFailure> {
        if cancel.is_cancelled() {
            return Err(RunFailure::Cancelled);
        }
        tracing::debug!(stage = ?inv.stage, cmd = %inv.display_command(), "spawning");

        let mut child = Command::new(&inv.program)
            .args(&inv.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| RunFailure::Spawn {
                program: inv.program.clone(),
                source,
            })?;

        let stdout_drain = child.stdout.take().map(spawn_drain);
        let stderr_drain = child.stderr.take().map(spawn_drain);

        let status = wait_with_deadline(&mut child, inv.timeout, cancel)?;
        let stdout = join_drain(stdout_drain)?;
        let stderr = join_drain(stderr_drain)?;

        if !status.success() {
            return Err(RunFailure::Exit {
                status: status.to_string(),
                stderr: stderr_tail(&stderr),
            });
        }
        Ok(InvocationOutput { stdout, stderr })
    }
}

fn wait_with_deadline(
    child: &mut Child,
    timeout: Duration,
    cancel: &CancelToken,
) -> Result<ExitStatus, RunFailure> {
    let deadline = Instant::now() + timeout;
    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Ok(status),
            Ok(None) => {}
            Err(e) => {
                kill_and_reap(child);
                return Err(RunFailure::Io(format!("failed to poll child: {e}")));
            }
        }
        if cancel.is_cancelled() {
            kill_and_reap(child);
            return Err(RunFailure::Cancelled);
        }
        if Instant::now() >= deadline {
            kill_and_reap(child);
            return Err(RunFailure::TimedOut { after: timeout });
        }
        std::thread::sleep(POLL_INTERVAL);
    }
}

fn kill_and_reap(child: &mut Child) {
    // The child may already have exited between polls.
    let _ = child.kill();
    let _ = child.wait();
}

fn spawn_drain<R: Read + Send + 'static>(mut r: R) -> Drain {
    std::thread::spawn(move || {
        let mut buf = Vec::new();
        r.read_to_end(&mut buf)?;
        Ok(buf)
    })
}

fn join_drain(handle: Option<Drain>) -> Result<Vec<u8>, RunFailure> {
    match handle {
        Some(h) => h
            .join()
            .map_err(|_| RunFailure::Io("output drain thread panicked".to_owned()))?
            .map_err(|e| RunFailure::Io(format!("output read failed: {e}"))),
        None => Ok(Vec::new()),
    }
}

fn stderr_tail(bytes: &[u8]) -> String {
    let text = String::from_utf8_lossy(bytes);
    let text = text.trim();
    if text.len() <= STDERR_TAIL_BYTES {
        return text.to_owned();
    }
    let mut start = text.len() - STDERR_TAIL_BYTES;
    while !text.is_char_boundary(start) {
        start += 1;
    }
    format!("...{}", &text[start..])
}

/// Scripted response for [`RecordingRunner`].
#[derive(Clone, Debug)]
pub enum Scripted {
    /// Succeed with this stdout.
    Stdout(Vec<u8>),
    /// Exit non-zero with this stderr.
    Fail(String),
    /// Report a deadline overrun.
    TimeOut,
    /// Succeed without creating the expected output file.
    NoOutput,
}

/// In-memory [`CommandRunner`] for tests and dry runs.
///
/// Records every invocation. Unscripted stages succeed and, when the invocation names an
/// output file, write a small placeholder there so downstream existence checks pass.
#[derive(Debug, Default)]
pub struct RecordingRunner {
    calls: Mutex<Vec<Invocation>>,
    script: Vec<(Stage, Scripted)>,
}

impl RecordingRunner {
    /// Create a runner where every stage succeeds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the response for `stage`.
    pub fn on(mut self, stage: Stage, response: Scripted) -> Self {
        self.script.retain(|(s, _)| *s != stage);
        self.script.push((stage, response));
        self
    }

    /// Snapshot of recorded invocations, in call order.
    pub fn invocations(&self) -> Vec<Invocation> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Recorded invocations for one stage.
    pub fn invocations_for(&self, stage: Stage) -> Vec<Invocation> {
        self.invocations()
            .into_iter()
            .filter(|i| i.stage == stage)
            .collect()
    }
}

impl CommandRunner for RecordingRunner {
    fn run(&self, inv: &Invocation, cancel: &CancelToken) -> Result<InvocationOutput, RunFailure> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(inv.clone());
        if cancel.is_cancelled() {
            return Err(RunFailure::Cancelled);
        }

        let scripted = self
            .script
            .iter()
            .find(|(s, _)| *s == inv.stage)
            .map(|(_, r)| r.clone());
        let stdout = match scripted {
            Some(Scripted::Fail(stderr)) => {
                return Err(RunFailure::Exit {
                    status: "exit status: 1".to_owned(),
                    stderr,
                });
            }
            Some(Scripted::TimeOut) => return Err(RunFailure::TimedOut { after: inv.timeout }),
            Some(Scripted::NoOutput) => return Ok(InvocationOutput::default()),
            Some(Scripted::Stdout(bytes)) => bytes,
            None => Vec::new(),
        };

        if let Some(out) = inv.output.as_ref() {
            std::fs::write(out, b"recorded").map_err(|e| {
                RunFailure::Io(format!("failed to write '{}': {e}", out.display()))
            })?;
        }
        Ok(InvocationOutput {
            stdout,
            stderr: Vec::new(),
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/runner.rs"]
mod tests;
