//! Render command implementation
//!
//! Prints the LaTeX source for a JSON document without running an engine.

use anyhow::{bail, Context, Result};
use std::io::Write;
use std::path::Path;
use std::process::ExitCode;

use texmill_doc::{Render, RenderOptions};

use crate::input::{load_input, Input};

/// Run the render command
///
/// Writes to `output`, or stdout when unset.
pub fn run(input: &Path, output: Option<&Path>, toc: bool) -> Result<ExitCode> {
    let loaded = load_input(input)
        .with_context(|| format!("Failed to load input: {}", input.display()))?;
    if matches!(loaded, Input::Tex(_)) {
        bail!("render expects a JSON document, got a TeX source");
    }

    let source = loaded.render(&RenderOptions::default().toc(toc), &loaded.document());

    match output {
        Some(path) => std::fs::write(path, source)
            .with_context(|| format!("Failed to write output: {}", path.display()))?,
        None => std::io::stdout()
            .lock()
            .write_all(source.as_bytes())
            .context("Failed to write to stdout")?,
    }
    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_to_file_with_toc() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("doc.json");
        std::fs::write(&input, r#"{"blocks":[]}"#).unwrap();
        let output = dir.path().join("doc.tex");

        run(&input, Some(&output), true).unwrap();
        let tex = std::fs::read_to_string(&output).unwrap();
        assert!(tex.contains("\\tableofcontents"));
    }

    #[test]
    fn test_render_rejects_tex_input() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("doc.tex");
        std::fs::write(&input, "\\relax").unwrap();

        let err = run(&input, None, false).unwrap_err();
        assert!(err.to_string().contains("expects a JSON document"));
    }
}
