//! texmill CLI - Command-line interface for producing PDF through a TeX engine
//!
//! This binary provides commands for building PDFs from JSON documents or
//! TeX sources, rendering documents to LaTeX, and inspecting engine logs.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use texmill_cli::commands;
use texmill_cli::commands::build::BuildArgs;
use texmill_cli::logging;
use texmill_engine::EngineKind;

/// texmill - PDF production through an external TeX engine
#[derive(Parser)]
#[command(name = "texmill")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a PDF from a JSON document or a TeX source file
    Build {
        /// Path to the input file (.json or .tex)
        input: PathBuf,

        /// Output PDF path (default: input with a .pdf extension)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// TeX engine (pdflatex, xelatex, lualatex)
        #[arg(long, default_value = "pdflatex")]
        engine: EngineKind,

        /// Path to the engine executable (overrides TEXMILL_ENGINE_PATH and PATH)
        #[arg(long)]
        engine_path: Option<PathBuf>,

        /// Extra argument passed to the engine (repeatable)
        #[arg(long = "engine-opt", allow_hyphen_values = true)]
        engine_opts: Vec<String>,

        /// Kill an engine pass that runs longer than this many seconds
        #[arg(long)]
        timeout: Option<u64>,

        /// Include a table of contents (JSON input only)
        #[arg(long)]
        toc: bool,

        /// Directory or URL used to resolve relative media (default: input directory)
        #[arg(long)]
        resource_path: Option<String>,

        /// Keep the working directory for inspection
        #[arg(long)]
        keep_workdir: bool,
    },

    /// Render a JSON document to LaTeX without running an engine
    Render {
        /// Path to the JSON document
        input: PathBuf,

        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Include a table of contents
        #[arg(long)]
        toc: bool,
    },

    /// Print the first error excerpt from an engine log
    ExtractLog {
        /// Path to the log file
        file: PathBuf,
    },

    /// Check the TeX installation
    Doctor,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let result = match cli.command {
        Commands::Build {
            input,
            output,
            engine,
            engine_path,
            engine_opts,
            timeout,
            toc,
            resource_path,
            keep_workdir,
        } => commands::build::run(&BuildArgs {
            input,
            output,
            engine,
            engine_path,
            engine_opts,
            timeout,
            toc,
            resource_path,
            keep_workdir,
        }),
        Commands::Render { input, output, toc } => {
            commands::render::run(&input, output.as_deref(), toc)
        }
        Commands::ExtractLog { file } => commands::extract_log::run(&file),
        Commands::Doctor => commands::doctor::run(),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {:#}", colored::Colorize::red("error"), e);
            ExitCode::from(1)
        }
    }
}
