//! texmill engine driver
//!
//! This crate turns a [`texmill_doc::Document`] into PDF bytes by running an
//! external TeX engine (pdflatex, xelatex, or lualatex) as a subprocess.
//!
//! # Architecture
//!
//! ```text
//! Orchestrator ──► Resource Materializer ──► Render ──► Multi-Pass Driver
//!                                                         │
//!                                    Process Runner ◄─────┘ (2 or 3 times)
//!                                         │
//!                              Diagnostic Extractor (on failure)
//! ```
//!
//! Every orchestration owns a scoped working directory that holds the
//! source, fetched media, and the engine's output; it is removed on return.
//!
//! # Passes
//!
//! | Source contains | Passes |
//! |-----------------|--------|
//! | `\tableofcontents` | 3 |
//! | otherwise | 2 |
//!
//! Only the final pass's exit status and log are reported.
//!
//! # Example
//!
//! ```no_run
//! use texmill_doc::{Document, LatexWriter, RenderOptions};
//! use texmill_engine::{Orchestrator, OrchestratorConfig};
//!
//! let orchestrator = Orchestrator::with_config(OrchestratorConfig::new().timeout_secs(120));
//! let pdf = orchestrator.make_pdf(&LatexWriter, &RenderOptions::default(), Document::default())?;
//! std::fs::write("out.pdf", pdf)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Engine Requirements
//!
//! The engine executable is searched for in:
//!
//! 1. An explicit path in [`OrchestratorConfig`]
//! 2. `TEXMILL_ENGINE_PATH` environment variable
//! 3. System PATH
//!
//! # Features
//!
//! - `http`: fetch `http`/`https` media with a blocking `reqwest` client.

pub mod diagnostics;
pub mod driver;
pub mod engine;
pub mod error;
pub mod orchestrator;
pub mod process;
pub mod resources;

pub use diagnostics::extract;
pub use driver::{DriveOutcome, PassExecutor, ProcessExecutor};
pub use engine::{EngineCommand, EngineKind, ENGINE_PATH_ENV};
pub use error::{TexError, TexResult, PDF_ERROR_PREFIX};
pub use orchestrator::{produce, Orchestrator, OrchestratorConfig, Produced};
pub use process::{Invocation, RunOutput};
pub use resources::{
    materialize, FetchError, Fetched, Fetcher, Materialized, ResourceWarning, StandardFetcher,
};
