//! Doctor command implementation
//!
//! Checks the TeX installation and the temp directory.

use anyhow::Result;
use colored::Colorize;
use std::path::Path;
use std::process::{Command, ExitCode};

use texmill_engine::{engine, EngineKind, ENGINE_PATH_ENV};

/// Run the doctor command
///
/// Checks:
/// - Engine executables (pdflatex, xelatex, lualatex)
/// - `TEXMILL_ENGINE_PATH` override
/// - Temp directory permissions
///
/// # Returns
/// Exit code: 0 if at least one engine is usable and the temp dir is
/// writable, 1 otherwise
pub fn run() -> Result<ExitCode> {
    println!("{}", "texmill Doctor".cyan().bold());
    println!("{}", "==============".cyan());
    println!();

    println!("{}", "Versions:".bold());
    println!(
        "  {} texmill-cli v{}",
        "->".green(),
        env!("CARGO_PKG_VERSION")
    );
    println!();

    println!("{}", "Engines:".bold());
    let mut engines_found = 0;
    for kind in EngineKind::all() {
        match check_engine(*kind) {
            EngineStatus::Found { path, version } => {
                engines_found += 1;
                println!(
                    "  {} {} {} ({})",
                    "ok".green(),
                    kind,
                    version,
                    path.dimmed()
                );
            }
            EngineStatus::NotFound => {
                println!("  {} {} not found", "!!".yellow(), kind);
            }
            EngineStatus::Error(e) => {
                println!("  {} {} check failed: {}", "!!".red(), kind, e);
            }
        }
    }
    if engines_found == 0 {
        println!(
            "     {}",
            "Install a TeX distribution such as TeX Live or MiKTeX.".dimmed()
        );
    }
    match std::env::var_os(ENGINE_PATH_ENV) {
        Some(path) if Path::new(&path).exists() => println!(
            "  {} {} = {}",
            "->".green(),
            ENGINE_PATH_ENV,
            Path::new(&path).display()
        ),
        Some(path) => println!(
            "  {} {} points at a missing file: {}",
            "!!".yellow(),
            ENGINE_PATH_ENV,
            Path::new(&path).display()
        ),
        None => {}
    }
    println!();

    println!("{}", "Permissions:".bold());
    let temp_ok = match tempfile::Builder::new().prefix("texmill-").tempdir() {
        Ok(dir) => {
            println!(
                "  {} Temp directory is writable ({})",
                "ok".green(),
                std::env::temp_dir().display()
            );
            drop(dir);
            true
        }
        Err(e) => {
            println!("  {} Cannot create temp directory: {}", "!!".red(), e);
            false
        }
    };
    println!();

    if engines_found > 0 && temp_ok {
        println!("{} All checks passed!", "SUCCESS".green().bold());
        Ok(ExitCode::SUCCESS)
    } else {
        println!(
            "{} Some checks failed. See above for details.",
            "WARNING".yellow().bold()
        );
        Ok(ExitCode::from(1))
    }
}

/// Status of an engine check
enum EngineStatus {
    Found { path: String, version: String },
    NotFound,
    Error(String),
}

fn check_engine(kind: EngineKind) -> EngineStatus {
    let Some(path) = engine::find_on_path(kind.as_str()) else {
        return EngineStatus::NotFound;
    };

    match Command::new(&path).arg("--version").output() {
        Ok(output) if output.status.success() => {
            let stdout = String::from_utf8_lossy(&output.stdout);
            EngineStatus::Found {
                path: path.display().to_string(),
                version: parse_engine_version(&stdout).unwrap_or_else(|| "unknown".to_string()),
            }
        }
        Ok(output) => EngineStatus::Error(format!("exited with status: {}", output.status)),
        Err(e) => EngineStatus::Error(e.to_string()),
    }
}

/// First line of `--version` output, e.g.
/// `pdfTeX 3.141592653-2.6-1.40.25 (TeX Live 2023)`.
fn parse_engine_version(output: &str) -> Option<String> {
    output
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(str::to_string)
}
