//! Engine subprocess runner.
//!
//! Launches a command with a closed stdin and drains stdout and stderr on two
//! reader threads, so a child blocked on one full pipe buffer can never
//! deadlock against a parent blocked on the other. Without a timeout, [`run`]
//! returns only after both streams hit end-of-stream and the process has
//! exited.

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::io::Read;
use std::path::PathBuf;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc;
use std::time::{Duration, Instant};

use crate::error::{TexError, TexResult};

/// Poll interval while waiting on a child under a deadline.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// A single process launch: program, arguments, full environment, and
/// working directory. Built fresh for every pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Program to execute.
    pub program: PathBuf,
    /// Arguments, in order.
    pub args: Vec<OsString>,
    /// The complete environment of the child; nothing else is inherited.
    pub env: BTreeMap<OsString, OsString>,
    /// Working directory of the child, or the caller's if unset.
    pub working_dir: Option<PathBuf>,
}

impl Invocation {
    /// Creates an invocation with no arguments and an empty environment.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: BTreeMap::new(),
            working_dir: None,
        }
    }

    /// Appends an argument.
    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Replaces the environment.
    pub fn env(mut self, env: BTreeMap<OsString, OsString>) -> Self {
        self.env = env;
        self
    }

    /// Sets the working directory.
    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Human-readable command line, for logging.
    pub fn display_command(&self) -> String {
        std::iter::once(self.program.as_os_str())
            .chain(self.args.iter().map(|a| a.as_os_str()))
            .map(|part| part.to_string_lossy())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Exit status and captured output of one launch.
#[derive(Debug, Clone)]
pub struct RunOutput {
    /// Exit status of the process.
    pub status: ExitStatus,
    /// Everything written to stdout.
    pub stdout: Vec<u8>,
    /// Everything written to stderr.
    pub stderr: Vec<u8>,
}

impl RunOutput {
    /// Combined diagnostics: stdout followed by stderr.
    ///
    /// This is a concatenation, not a chronological interleaving.
    pub fn diagnostics(&self) -> Vec<u8> {
        let mut combined = Vec::with_capacity(self.stdout.len() + self.stderr.len());
        combined.extend_from_slice(&self.stdout);
        combined.extend_from_slice(&self.stderr);
        combined
    }
}

/// Runs `invocation` to completion.
///
/// With `timeout` set, a child still running at the deadline is killed and
/// reaped and [`TexError::Timeout`] is returned. The deadline also bounds the
/// drain: a process the engine spawned may inherit the pipes and outlive it,
/// so readers still blocked at the deadline are abandoned.
pub fn run(invocation: &Invocation, timeout: Option<Duration>) -> TexResult<RunOutput> {
    let mut cmd = Command::new(&invocation.program);
    cmd.args(&invocation.args)
        .env_clear()
        .envs(&invocation.env)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    if let Some(ref dir) = invocation.working_dir {
        cmd.current_dir(dir);
    }

    let deadline = timeout.map(|t| Instant::now() + t);
    let mut child = cmd.spawn().map_err(|source| TexError::LaunchFailed {
        program: invocation.program.clone(),
        source,
    })?;

    // Closing stdin signals end-of-input to anything that tries to prompt.
    drop(child.stdin.take());

    let stdout_reader = spawn_drain(child.stdout.take());
    let stderr_reader = spawn_drain(child.stderr.take());

    let status = wait_with_timeout(&mut child, timeout)?;
    let stdout = collect_drain(&stdout_reader, deadline, timeout)?;
    let stderr = collect_drain(&stderr_reader, deadline, timeout)?;

    Ok(RunOutput {
        status,
        stdout,
        stderr,
    })
}

/// Reads `stream` to end-of-stream on a detached thread.
fn spawn_drain<R: Read + Send + 'static>(
    stream: Option<R>,
) -> mpsc::Receiver<std::io::Result<Vec<u8>>> {
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        let mut buf = Vec::new();
        let result = match stream {
            Some(mut stream) => stream.read_to_end(&mut buf).map(|_| buf),
            None => Ok(buf),
        };
        // The receiver is gone once the deadline has passed.
        let _ = tx.send(result);
    });
    rx
}

fn collect_drain(
    reader: &mpsc::Receiver<std::io::Result<Vec<u8>>>,
    deadline: Option<Instant>,
    timeout: Option<Duration>,
) -> TexResult<Vec<u8>> {
    let received = match (deadline, timeout) {
        (Some(deadline), Some(timeout)) => {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match reader.recv_timeout(remaining) {
                Ok(result) => result,
                Err(mpsc::RecvTimeoutError::Timeout) => return Err(timed_out(timeout)),
                Err(mpsc::RecvTimeoutError::Disconnected) => return Err(reader_lost()),
            }
        }
        _ => reader.recv().map_err(|_| reader_lost())?,
    };
    received.map_err(TexError::Io)
}

fn reader_lost() -> TexError {
    TexError::Io(std::io::Error::new(
        std::io::ErrorKind::Other,
        "output reader thread exited without a result",
    ))
}

/// Timeout error with the deadline rounded up to whole seconds.
fn timed_out(timeout: Duration) -> TexError {
    let rounded = timeout.as_secs() + u64::from(timeout.subsec_nanos() > 0);
    TexError::Timeout {
        timeout_secs: rounded,
    }
}

fn wait_with_timeout(child: &mut Child, timeout: Option<Duration>) -> TexResult<ExitStatus> {
    let Some(timeout) = timeout else {
        return child.wait().map_err(TexError::Io);
    };

    let start = Instant::now();
    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Ok(status),
            Ok(None) => {
                if start.elapsed() > timeout {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(timed_out(timeout));
                }
                std::thread::sleep(POLL_INTERVAL);
            }
            Err(e) => return Err(TexError::Io(e)),
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sh(script: &str) -> Invocation {
        let env = std::env::vars_os().collect();
        Invocation::new("sh").arg("-c").arg(script).env(env)
    }

    #[test]
    fn test_captures_both_streams_in_order() {
        let output = run(&sh("printf out; printf err 1>&2"), None).unwrap();
        assert!(output.status.success());
        assert_eq!(output.stdout, b"out".to_vec());
        assert_eq!(output.stderr, b"err".to_vec());
        assert_eq!(output.diagnostics(), b"outerr".to_vec());
    }

    #[test]
    fn test_nonzero_exit_is_a_status_not_an_error() {
        let output = run(&sh("echo failing; exit 3"), None).unwrap();
        assert_eq!(output.status.code(), Some(3));
        assert_eq!(output.stdout, b"failing\n".to_vec());
    }

    #[test]
    fn test_stdin_is_closed() {
        // `cat` would block forever on an open stdin.
        let output = run(&sh("cat; echo done"), Some(Duration::from_secs(10))).unwrap();
        assert!(output.status.success());
        assert_eq!(output.stdout, b"done\n".to_vec());
    }

    #[test]
    fn test_large_output_on_both_pipes_does_not_deadlock() {
        // Well past a 64 KiB pipe buffer on each stream.
        let script = "line=$(printf '%0100d' 0); i=0; \
                      while [ $i -lt 3000 ]; do \
                      echo \"$line\"; echo \"$line\" 1>&2; i=$((i+1)); done";
        let output = run(&sh(script), Some(Duration::from_secs(60))).unwrap();
        assert!(output.status.success());
        assert_eq!(output.stdout.len(), 3000 * 101);
        assert_eq!(output.stderr.len(), 3000 * 101);
    }

    #[test]
    fn test_environment_is_exactly_the_mapping() {
        let mut env = BTreeMap::new();
        env.insert(OsString::from("ONLY_VAR"), OsString::from("42"));
        let inv = Invocation::new("/bin/sh")
            .arg("-c")
            .arg("printf \"$ONLY_VAR:${HOME:-unset}\"")
            .env(env);
        let output = run(&inv, None).unwrap();
        assert_eq!(output.stdout, b"42:unset".to_vec());
    }

    #[test]
    fn test_working_dir_is_applied() {
        let dir = tempfile::tempdir().unwrap();
        let output = run(&sh("pwd").working_dir(dir.path()), None).unwrap();
        let printed = String::from_utf8(output.stdout).unwrap();
        let expected = dir.path().canonicalize().unwrap();
        assert_eq!(
            std::path::Path::new(printed.trim()).canonicalize().unwrap(),
            expected
        );
    }

    #[test]
    fn test_missing_program_is_launch_failure() {
        let inv = Invocation::new("/definitely/not/a/texmill/engine");
        let err = run(&inv, None).unwrap_err();
        assert!(err.is_launch_failure());
        assert!(matches!(err, TexError::LaunchFailed { .. }));
    }

    #[test]
    fn test_timeout_kills_child() {
        let start = Instant::now();
        let err = run(&sh("exec sleep 30"), Some(Duration::from_millis(200))).unwrap_err();
        assert!(matches!(err, TexError::Timeout { timeout_secs: 1 }));
        assert!(start.elapsed() < Duration::from_secs(20));
    }

    #[test]
    fn test_timeout_not_held_up_by_grandchild_on_pipes() {
        // The shell forks `sleep`, which inherits stdout and stderr and
        // survives the kill.
        let start = Instant::now();
        let err = run(&sh("sleep 30; true"), Some(Duration::from_secs(1))).unwrap_err();
        assert!(matches!(err, TexError::Timeout { timeout_secs: 1 }));
        assert!(start.elapsed() < Duration::from_secs(10));
    }

    #[test]
    fn test_timeout_bounds_drain_after_exit() {
        // The child exits at once but a background process keeps the pipes.
        let start = Instant::now();
        let err = run(&sh("sleep 30 & echo started"), Some(Duration::from_secs(1))).unwrap_err();
        assert!(matches!(err, TexError::Timeout { .. }));
        assert!(start.elapsed() < Duration::from_secs(10));
    }

    #[test]
    fn test_sub_second_timeout_rounds_up() {
        let err = timed_out(Duration::from_millis(200));
        assert_eq!(err.to_string(), "TeX engine timed out after 1 seconds");
        assert!(matches!(
            timed_out(Duration::from_secs(3)),
            TexError::Timeout { timeout_secs: 3 }
        ));
    }

    #[test]
    fn test_display_command() {
        let inv = Invocation::new("pdflatex")
            .arg("-halt-on-error")
            .arg("input.tex");
        assert_eq!(inv.display_command(), "pdflatex -halt-on-error input.tex");
    }
}
