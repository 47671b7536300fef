//! Error types for the engine driver.

use std::path::PathBuf;
use thiserror::Error;

use crate::diagnostics;

/// Fixed prefix of every user-visible PDF production failure.
pub const PDF_ERROR_PREFIX: &str = "Error producing PDF from TeX source.";

/// Result type for engine operations.
pub type TexResult<T> = Result<T, TexError>;

/// Errors that can occur while producing a PDF.
#[derive(Debug, Error)]
pub enum TexError {
    /// The engine executable could not be located.
    #[error("TeX engine '{engine}' not found. Ensure a TeX distribution is installed and in PATH, or set TEXMILL_ENGINE_PATH")]
    EngineNotFound { engine: String },

    /// The engine executable could not be started.
    #[error("Failed to launch '{program}': {source}")]
    LaunchFailed {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The engine did not exit before the watchdog deadline.
    #[error("TeX engine timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    /// The final pass exited with a non-zero status.
    #[error("{}\n{}", PDF_ERROR_PREFIX, .excerpt)]
    ToolExitFailure {
        exit_code: Option<i32>,
        log: Vec<u8>,
        excerpt: String,
    },

    /// The engine exited successfully but left no output file.
    #[error("{}", PDF_ERROR_PREFIX)]
    NoArtifactProduced { path: PathBuf },

    /// Failed to write the engine source file.
    #[error("Failed to write engine source: {0}")]
    WriteSourceFailed(#[source] std::io::Error),

    /// Failed to read the produced output file.
    #[error("Failed to read engine output from {path}: {source}")]
    ReadArtifactFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to create the scoped working directory.
    #[error("Failed to create working directory: {0}")]
    TempDir(#[source] std::io::Error),

    /// IO error during file operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl TexError {
    /// Creates a tool exit failure, extracting the excerpt from `log`.
    pub fn tool_exit_failure(exit_code: Option<i32>, log: Vec<u8>) -> Self {
        let excerpt = diagnostics::summarize(&diagnostics::extract(&log));
        Self::ToolExitFailure {
            exit_code,
            log,
            excerpt,
        }
    }

    /// Returns true for errors raised before the engine could run at all.
    pub fn is_launch_failure(&self) -> bool {
        matches!(
            self,
            TexError::EngineNotFound { .. } | TexError::LaunchFailed { .. }
        )
    }

    /// Stable error code for reporting.
    pub fn code(&self) -> &'static str {
        match self {
            TexError::EngineNotFound { .. } => "TEX_001",
            TexError::LaunchFailed { .. } => "TEX_002",
            TexError::Timeout { .. } => "TEX_003",
            TexError::ToolExitFailure { .. } => "TEX_004",
            TexError::NoArtifactProduced { .. } => "TEX_005",
            TexError::WriteSourceFailed(_) => "TEX_006",
            TexError::ReadArtifactFailed { .. } => "TEX_007",
            TexError::TempDir(_) => "TEX_008",
            TexError::Io(_) => "TEX_009",
        }
    }

    /// The failure as the raw text payload: prefix plus log excerpt for exit
    /// failures, the display message otherwise.
    pub fn diagnostic_message(&self) -> Vec<u8> {
        match self {
            TexError::ToolExitFailure { log, .. } => {
                let mut message = format!("{}\n", PDF_ERROR_PREFIX).into_bytes();
                message.extend_from_slice(&diagnostics::extract(log));
                message
            }
            other => other.to_string().into_bytes(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashSet;

    #[test]
    fn test_error_display() {
        let err = TexError::EngineNotFound {
            engine: "xelatex".into(),
        };
        assert!(err.to_string().contains("'xelatex' not found"));

        let err = TexError::Timeout { timeout_secs: 30 };
        assert!(err.to_string().contains("30 seconds"));

        let err = TexError::NoArtifactProduced {
            path: PathBuf::from("/tmp/x/input.pdf"),
        };
        assert_eq!(err.to_string(), PDF_ERROR_PREFIX);
    }

    #[test]
    fn test_tool_exit_failure_carries_excerpt() {
        let log = b"This is pdfTeX\n! Bad.\nl.1 x\nmore noise\n".to_vec();
        let err = TexError::tool_exit_failure(Some(1), log);

        assert_eq!(
            err.to_string(),
            "Error producing PDF from TeX source.\n! Bad.\nl.1 x\n"
        );
        assert_eq!(
            err.diagnostic_message(),
            b"Error producing PDF from TeX source.\n! Bad.\nl.1 x\n".to_vec()
        );
    }

    #[test]
    fn test_launch_failure_classification() {
        let not_found = TexError::EngineNotFound {
            engine: "pdflatex".into(),
        };
        let launch = TexError::LaunchFailed {
            program: PathBuf::from("/nope"),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        assert!(not_found.is_launch_failure());
        assert!(launch.is_launch_failure());
        assert!(!TexError::Timeout { timeout_secs: 1 }.is_launch_failure());
    }

    #[test]
    fn test_codes_are_distinct() {
        let io = || std::io::Error::from(std::io::ErrorKind::Other);
        let errors = [
            TexError::EngineNotFound { engine: "x".into() },
            TexError::LaunchFailed {
                program: PathBuf::from("/nope"),
                source: io(),
            },
            TexError::Timeout { timeout_secs: 1 },
            TexError::tool_exit_failure(None, Vec::new()),
            TexError::NoArtifactProduced {
                path: PathBuf::new(),
            },
            TexError::WriteSourceFailed(io()),
            TexError::ReadArtifactFailed {
                path: PathBuf::new(),
                source: io(),
            },
            TexError::TempDir(io()),
            TexError::Io(io()),
        ];
        let codes: HashSet<&str> = errors.iter().map(|e| e.code()).collect();
        assert_eq!(codes.len(), errors.len());
        assert_eq!(errors.len(), 9);
    }
}
