//! Build command implementation
//!
//! Produces a PDF from a JSON document or a TeX source file.

use anyhow::{Context, Result};
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use texmill_doc::RenderOptions;
use texmill_engine::{EngineKind, Orchestrator, OrchestratorConfig, TexError};

use crate::input::load_input;

/// Options for the build command, as parsed from the command line.
#[derive(Debug, Clone, Default)]
pub struct BuildArgs {
    /// Input file (.json or .tex).
    pub input: PathBuf,
    /// Output PDF path; defaults to the input with a `.pdf` extension.
    pub output: Option<PathBuf>,
    /// Engine to run.
    pub engine: EngineKind,
    /// Explicit engine executable.
    pub engine_path: Option<PathBuf>,
    /// Extra engine arguments.
    pub engine_opts: Vec<String>,
    /// Per-pass timeout in seconds.
    pub timeout: Option<u64>,
    /// Emit a table of contents.
    pub toc: bool,
    /// Base directory or URL for relative media.
    pub resource_path: Option<String>,
    /// Keep the working directory.
    pub keep_workdir: bool,
}

/// Run the build command
///
/// # Returns
/// Exit code: 0 on success, 1 if the engine failed
pub fn run(args: &BuildArgs) -> Result<ExitCode> {
    let input = load_input(&args.input)
        .with_context(|| format!("Failed to load input: {}", args.input.display()))?;

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| args.input.with_extension("pdf"));

    let options = render_options(args);
    let orchestrator = Orchestrator::with_config(orchestrator_config(args));

    println!(
        "{} {} ({}) with {}",
        "Building".cyan().bold(),
        args.input.display(),
        input.kind(),
        args.engine
    );

    match orchestrator.build(&input, &options, input.document()) {
        Ok(produced) => {
            for warning in &produced.warnings {
                println!("  {} {}", "!!".yellow(), warning);
            }

            std::fs::write(&output, &produced.pdf)
                .with_context(|| format!("Failed to write output: {}", output.display()))?;

            println!(
                "{} {} ({} bytes, {} passes)",
                "Wrote".green().bold(),
                output.display(),
                produced.pdf.len(),
                produced.passes
            );
            if let Some(dir) = produced.kept_workdir {
                println!("  {} working directory kept at {}", "->".dimmed(), dir.display());
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            report_failure(&err);
            Ok(ExitCode::from(1))
        }
    }
}

fn render_options(args: &BuildArgs) -> RenderOptions {
    let base = args
        .resource_path
        .clone()
        .or_else(|| input_dir(&args.input).map(|dir| dir.to_string_lossy().into_owned()));

    let mut options = RenderOptions::default().toc(args.toc);
    options.source_base = base;
    options
}

fn input_dir(input: &Path) -> Option<&Path> {
    input.parent().filter(|p| !p.as_os_str().is_empty())
}

fn orchestrator_config(args: &BuildArgs) -> OrchestratorConfig {
    let mut config = OrchestratorConfig::new()
        .engine(args.engine)
        .keep_workdir(args.keep_workdir);
    if let Some(ref path) = args.engine_path {
        config = config.engine_path(path);
    }
    if let Some(secs) = args.timeout {
        config = config.timeout_secs(secs);
    }
    for opt in &args.engine_opts {
        config = config.extra_arg(opt);
    }
    config
}

fn report_failure(err: &TexError) {
    eprintln!("{} [{}]", "FAILED".red().bold(), err.code());
    eprintln!("{}", String::from_utf8_lossy(&err.diagnostic_message()));
    if err.is_launch_failure() {
        eprintln!(
            "  {}",
            "Run `texmill doctor` to check the TeX installation.".dimmed()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    #[test]
    fn test_render_options_default_base_is_input_dir() {
        let args = BuildArgs {
            input: PathBuf::from("docs/paper.json"),
            toc: true,
            ..Default::default()
        };
        let options = render_options(&args);
        assert_eq!(options.source_base.as_deref(), Some("docs"));
        assert!(options.toc);

        let args = BuildArgs {
            input: PathBuf::from("paper.json"),
            ..Default::default()
        };
        assert_eq!(render_options(&args).source_base, None);
    }

    #[test]
    fn test_resource_path_overrides_input_dir() {
        let args = BuildArgs {
            input: PathBuf::from("docs/paper.json"),
            resource_path: Some("https://example.com/media/".into()),
            ..Default::default()
        };
        assert_eq!(
            render_options(&args).source_base.as_deref(),
            Some("https://example.com/media/")
        );
    }

    #[test]
    fn test_orchestrator_config_from_args() {
        let args = BuildArgs {
            input: PathBuf::from("a.tex"),
            engine: EngineKind::LuaLatex,
            engine_path: Some(PathBuf::from("/opt/lualatex")),
            engine_opts: vec!["-shell-escape".into()],
            timeout: Some(90),
            keep_workdir: true,
            ..Default::default()
        };
        let config = orchestrator_config(&args);
        assert_eq!(config.engine, EngineKind::LuaLatex);
        assert_eq!(config.engine_path, Some(PathBuf::from("/opt/lualatex")));
        assert_eq!(config.extra_args, vec!["-shell-escape".to_string()]);
        assert_eq!(config.timeout, Some(Duration::from_secs(90)));
        assert!(config.keep_workdir);
    }

    #[test]
    fn test_missing_input_is_an_error() {
        let args = BuildArgs {
            input: PathBuf::from("/nonexistent/texmill/paper.tex"),
            ..Default::default()
        };
        let err = run(&args).unwrap_err();
        assert!(err.to_string().contains("Failed to load input"));
    }
}
