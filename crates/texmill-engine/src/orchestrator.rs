//! Document-to-PDF orchestration.
//!
//! One call owns one scoped working directory: media are materialized into
//! it, the rendered source is driven through the engine inside it, and it is
//! removed when the call returns, on success and failure alike.

use std::path::{Path, PathBuf};
use std::time::Duration;

use texmill_doc::{Document, Render, RenderOptions};
use tracing::{debug, info};

use crate::driver::{self, ProcessExecutor};
use crate::engine::{self, EngineCommand, EngineKind};
use crate::error::{TexError, TexResult};
use crate::resources::{self, Fetcher, ResourceWarning, StandardFetcher};

/// Prefix of every scoped working directory.
pub const WORK_DIR_PREFIX: &str = "texmill-";

/// Configuration for the orchestrator.
#[derive(Debug, Clone, Default)]
pub struct OrchestratorConfig {
    /// Engine to run.
    pub engine: EngineKind,
    /// Explicit engine executable; overrides lookup.
    pub engine_path: Option<PathBuf>,
    /// Extra arguments passed before the input file.
    pub extra_args: Vec<String>,
    /// Per-pass watchdog. `None` waits indefinitely.
    pub timeout: Option<Duration>,
    /// Leave the working directory on disk after the call.
    pub keep_workdir: bool,
}

impl OrchestratorConfig {
    /// Creates a config with defaults: pdflatex, no watchdog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Config for a tool named the way callers of [`produce`] name it.
    ///
    /// A bare engine name is looked up normally. Anything else is launched
    /// as given, with the common argument template.
    pub fn for_tool(tool_name: &str) -> Self {
        match tool_name.parse::<EngineKind>() {
            Ok(kind) => Self::new().engine(kind),
            Err(_) => Self::new()
                .engine(EngineKind::from_tool_name(tool_name).unwrap_or_default())
                .engine_path(tool_name),
        }
    }

    /// Sets the engine.
    pub fn engine(mut self, engine: EngineKind) -> Self {
        self.engine = engine;
        self
    }

    /// Sets the engine executable path.
    pub fn engine_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.engine_path = Some(path.into());
        self
    }

    /// Appends an extra engine argument.
    pub fn extra_arg(mut self, arg: impl Into<String>) -> Self {
        self.extra_args.push(arg.into());
        self
    }

    /// Sets the per-pass timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the per-pass timeout in seconds.
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout = Some(Duration::from_secs(secs));
        self
    }

    /// Keeps the working directory after the call.
    pub fn keep_workdir(mut self, keep: bool) -> Self {
        self.keep_workdir = keep;
        self
    }
}

/// A successful orchestration.
#[derive(Debug, Clone)]
pub struct Produced {
    /// PDF bytes.
    pub pdf: Vec<u8>,
    /// Engine passes that ran.
    pub passes: usize,
    /// Media references left unresolved.
    pub warnings: Vec<ResourceWarning>,
    /// Working directory, when it was kept.
    pub kept_workdir: Option<PathBuf>,
}

/// Drives a document through materialization, rendering, and the engine.
pub struct Orchestrator {
    config: OrchestratorConfig,
    fetcher: Box<dyn Fetcher + Send + Sync>,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Default for Orchestrator {
    fn default() -> Self {
        Self::new()
    }
}

impl Orchestrator {
    /// Creates an orchestrator with default configuration.
    pub fn new() -> Self {
        Self::with_config(OrchestratorConfig::default())
    }

    /// Creates an orchestrator with the given configuration and the
    /// [`StandardFetcher`].
    pub fn with_config(config: OrchestratorConfig) -> Self {
        Self {
            config,
            fetcher: Box::new(StandardFetcher),
        }
    }

    /// Replaces the resource fetcher.
    pub fn with_fetcher(mut self, fetcher: impl Fetcher + Send + Sync + 'static) -> Self {
        self.fetcher = Box::new(fetcher);
        self
    }

    /// Returns the configuration.
    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Resolves the engine executable and arguments.
    pub fn engine_command(&self) -> TexResult<EngineCommand> {
        let program = engine::locate(
            self.config.engine.as_str(),
            self.config.engine_path.as_deref(),
        )?;
        Ok(EngineCommand::new(program).with_extra_args(self.config.extra_args.clone()))
    }

    /// Produces PDF bytes for `document`.
    pub fn make_pdf<R>(
        &self,
        render: &R,
        options: &RenderOptions,
        document: Document,
    ) -> TexResult<Vec<u8>>
    where
        R: Render + ?Sized,
    {
        self.build(render, options, document).map(|produced| produced.pdf)
    }

    /// Like [`Orchestrator::make_pdf`], also reporting passes and unresolved
    /// media.
    pub fn build<R>(
        &self,
        render: &R,
        options: &RenderOptions,
        document: Document,
    ) -> TexResult<Produced>
    where
        R: Render + ?Sized,
    {
        let command = self.engine_command()?;

        let work_dir = tempfile::Builder::new()
            .prefix(WORK_DIR_PREFIX)
            .tempdir()
            .map_err(TexError::TempDir)?;
        debug!(path = %work_dir.path().display(), "created working directory");

        let result = self.build_in(&command, render, options, document, work_dir.path());

        let kept_workdir = if self.config.keep_workdir {
            let path = work_dir.keep();
            info!(path = %path.display(), "keeping working directory");
            Some(path)
        } else {
            // close() reports removal errors that Drop would swallow.
            if let Err(e) = work_dir.close() {
                debug!(error = %e, "failed to remove working directory");
            }
            None
        };

        result.map(|produced| Produced {
            kept_workdir,
            ..produced
        })
    }

    fn build_in<R>(
        &self,
        command: &EngineCommand,
        render: &R,
        options: &RenderOptions,
        document: Document,
        work_dir: &Path,
    ) -> TexResult<Produced>
    where
        R: Render + ?Sized,
    {
        let materialized = resources::materialize(
            options.source_base.as_deref(),
            work_dir,
            document,
            self.fetcher.as_ref(),
        )?;

        let source = render.render(options, &materialized.document);

        let mut executor = ProcessExecutor::with_timeout(self.config.timeout);
        let outcome = driver::drive(&mut executor, command, &source, work_dir)?;

        if !outcome.status.success() {
            return Err(TexError::tool_exit_failure(
                outcome.status.code(),
                outcome.diagnostics,
            ));
        }

        let Some(pdf) = outcome.artifact else {
            return Err(TexError::NoArtifactProduced {
                path: driver::artifact_path(work_dir),
            });
        };

        info!(
            engine = %self.config.engine,
            passes = outcome.passes,
            bytes = pdf.len(),
            "produced PDF"
        );

        Ok(Produced {
            pdf,
            passes: outcome.passes,
            warnings: materialized.warnings,
            kept_workdir: None,
        })
    }
}

/// Produces PDF bytes for `document` with the named tool, or the diagnostic
/// message as bytes.
///
/// The error side starts with [`crate::PDF_ERROR_PREFIX`] when the engine
/// ran and failed.
pub fn produce<R>(
    tool_name: &str,
    render: &R,
    options: &RenderOptions,
    document: Document,
) -> Result<Vec<u8>, Vec<u8>>
where
    R: Render + ?Sized,
{
    Orchestrator::with_config(OrchestratorConfig::for_tool(tool_name))
        .make_pdf(render, options, document)
        .map_err(|err| err.diagnostic_message())
}
