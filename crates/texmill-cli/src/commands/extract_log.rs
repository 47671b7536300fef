//! Extract-log command implementation
//!
//! Prints the first error excerpt from an engine log file.

use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;
use std::process::ExitCode;

use texmill_engine::diagnostics;

/// Run the extract-log command
///
/// Writes the excerpt (or the whole log, when it has no error marker) to
/// stdout. Log bytes are passed through without decoding.
pub fn run(log_file: &Path) -> Result<ExitCode> {
    let log = std::fs::read(log_file)
        .with_context(|| format!("Failed to read log file: {}", log_file.display()))?;

    let excerpt = diagnostics::extract(&log);

    std::io::stdout()
        .lock()
        .write_all(&excerpt)
        .context("Failed to write to stdout")?;
    Ok(ExitCode::SUCCESS)
}
