//! Multi-pass engine driver.
//!
//! TeX resolves cross-references from the auxiliary files of the previous
//! run, so one pass is never enough. The driver decides the pass count once,
//! up front, from the source text:
//!
//! | source contains `\tableofcontents` | passes |
//! |------------------------------------|--------|
//! | no                                 | 2      |
//! | yes                                | 3      |
//!
//! This is a heuristic. Documents whose references need more passes to
//! settle (e.g. page references that move a page break) are not detected.
//!
//! Only the final pass is reported: earlier statuses and logs are logged at
//! debug level and dropped, so an early failure that a later pass recovers
//! from is invisible.

use std::collections::BTreeMap;
use std::ffi::{OsStr, OsString};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;
use std::time::Duration;

use texmill_doc::TOC_COMMAND;
use tracing::{debug, trace};

use crate::engine::EngineCommand;
use crate::error::{TexError, TexResult};
use crate::process::{self, Invocation, RunOutput};

/// File name of the engine source inside the working directory.
pub const SOURCE_FILE_NAME: &str = "input.tex";

/// Extension of the engine output.
pub const ARTIFACT_EXTENSION: &str = "pdf";

/// Search-path variable the engine consults for relative input files.
pub const SEARCH_PATH_VAR: &str = "TEXINPUTS";

/// Passes for a plain document.
pub const BASE_PASSES: usize = 2;

/// Passes for a document with a table of contents.
pub const TOC_PASSES: usize = 3;

#[cfg(windows)]
const SEARCH_PATH_SEPARATOR: &str = ";";
#[cfg(not(windows))]
const SEARCH_PATH_SEPARATOR: &str = ":";

/// Result of a complete multi-pass sequence, taken from the final pass.
#[derive(Debug, Clone)]
pub struct DriveOutcome {
    /// Exit status of the final pass.
    pub status: ExitStatus,
    /// Combined stdout then stderr of the final pass.
    pub diagnostics: Vec<u8>,
    /// Output file contents; only ever present when `status` is success.
    pub artifact: Option<Vec<u8>>,
    /// Number of passes that ran.
    pub passes: usize,
}

/// Runs one engine pass.
///
/// [`ProcessExecutor`] launches a real process; tests substitute fakes.
pub trait PassExecutor {
    /// Executes the invocation and returns its captured output.
    fn execute(&mut self, invocation: &Invocation) -> TexResult<RunOutput>;
}

/// Executes passes as real subprocesses.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessExecutor {
    /// Per-pass watchdog; `None` waits indefinitely.
    pub timeout: Option<Duration>,
}

impl ProcessExecutor {
    /// Creates an executor with the given per-pass timeout.
    pub fn with_timeout(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }
}

impl PassExecutor for ProcessExecutor {
    fn execute(&mut self, invocation: &Invocation) -> TexResult<RunOutput> {
        process::run(invocation, self.timeout)
    }
}

/// Number of passes for `source`.
pub fn pass_count(source: &str) -> usize {
    if source.contains(TOC_COMMAND) {
        TOC_PASSES
    } else {
        BASE_PASSES
    }
}

/// Path of the engine source inside `work_dir`.
pub fn source_path(work_dir: &Path) -> PathBuf {
    work_dir.join(SOURCE_FILE_NAME)
}

/// Path of the engine output inside `work_dir`: the source name with its
/// extension swapped.
pub fn artifact_path(work_dir: &Path) -> PathBuf {
    source_path(work_dir).with_extension(ARTIFACT_EXTENSION)
}

/// Builds the child environment from `inherited`, prepending `work_dir` to
/// the search path so materialized media resolve by relative name.
///
/// An absent search path becomes `<work_dir><sep>`; the trailing separator
/// keeps the engine's built-in search path active.
pub fn engine_environment<I>(inherited: I, work_dir: &Path) -> BTreeMap<OsString, OsString>
where
    I: IntoIterator<Item = (OsString, OsString)>,
{
    let mut env: BTreeMap<OsString, OsString> = inherited.into_iter().collect();

    let mut search_path = work_dir.as_os_str().to_os_string();
    search_path.push(SEARCH_PATH_SEPARATOR);
    if let Some(previous) = env.get(OsStr::new(SEARCH_PATH_VAR)) {
        search_path.push(previous);
    }
    env.insert(OsString::from(SEARCH_PATH_VAR), search_path);
    env
}

/// Fixed argument template: no prompts, stop at the first error, write into
/// `work_dir`, user arguments, and the input file last.
pub fn engine_args(work_dir: &Path, extra_args: &[String]) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec![
        "-halt-on-error".into(),
        "-interaction".into(),
        "nonstopmode".into(),
        "-output-directory".into(),
        work_dir.as_os_str().to_os_string(),
    ];
    args.extend(extra_args.iter().map(OsString::from));
    args.push(source_path(work_dir).into_os_string());
    args
}

/// Writes `source` to `path` unless the file already exists.
///
/// Returns whether a write happened.
pub fn write_source_once(path: &Path, source: &str) -> TexResult<bool> {
    let mut file = match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => return Ok(false),
        Err(e) => return Err(TexError::WriteSourceFailed(e)),
    };
    file.write_all(source.as_bytes())
        .and_then(|_| file.flush())
        .map_err(TexError::WriteSourceFailed)?;
    Ok(true)
}

/// Runs the engine against `source` the number of times [`pass_count`]
/// decides, inside `work_dir`.
///
/// A launch failure or timeout on any pass aborts the sequence.
pub fn drive<E>(
    executor: &mut E,
    engine: &EngineCommand,
    source: &str,
    work_dir: &Path,
) -> TexResult<DriveOutcome>
where
    E: PassExecutor + ?Sized,
{
    let passes = pass_count(source);
    let env = engine_environment(std::env::vars_os(), work_dir);
    let args = engine_args(work_dir, &engine.extra_args);
    trace!(source, "engine source");

    let mut run_pass = |pass: usize| -> TexResult<RunOutput> {
        let input = source_path(work_dir);
        if write_source_once(&input, source)? {
            debug!(path = %input.display(), bytes = source.len(), "wrote engine source");
        }

        let invocation = Invocation {
            program: engine.program.clone(),
            args: args.clone(),
            env: env.clone(),
            // Relative references in the source keep resolving against the
            // caller's directory; the work dir is reached via TEXINPUTS.
            working_dir: None,
        };
        debug!(pass, passes, command = %invocation.display_command(), "running engine pass");

        let output = executor.execute(&invocation)?;
        debug!(
            pass,
            status = %output.status,
            stdout_bytes = output.stdout.len(),
            stderr_bytes = output.stderr.len(),
            "engine pass finished"
        );
        Ok(output)
    };

    for pass in 1..passes {
        run_pass(pass)?;
    }
    let output = run_pass(passes)?;

    let artifact = if output.status.success() {
        read_artifact(&artifact_path(work_dir))?
    } else {
        None
    };

    Ok(DriveOutcome {
        status: output.status,
        diagnostics: output.diagnostics(),
        artifact,
        passes,
    })
}

fn read_artifact(path: &Path) -> TexResult<Option<Vec<u8>>> {
    if !path.exists() {
        debug!(path = %path.display(), "engine left no output file");
        return Ok(None);
    }
    std::fs::read(path)
        .map(Some)
        .map_err(|source| TexError::ReadArtifactFailed {
            path: path.to_path_buf(),
            source,
        })
}
