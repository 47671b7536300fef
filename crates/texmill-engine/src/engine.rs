//! TeX engine selection and executable lookup.

use std::path::{Path, PathBuf};

use crate::error::{TexError, TexResult};

/// Environment variable overriding the engine executable path.
pub const ENGINE_PATH_ENV: &str = "TEXMILL_ENGINE_PATH";

/// Supported TeX engines.
///
/// All three accept the same non-interactive argument template, so the
/// engine only decides which executable is launched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EngineKind {
    /// pdfTeX with the LaTeX format.
    #[default]
    PdfLatex,
    /// XeTeX with the LaTeX format.
    XeLatex,
    /// LuaTeX with the LaTeX format.
    LuaLatex,
}

impl EngineKind {
    /// Returns the executable name for this engine.
    pub fn as_str(&self) -> &'static str {
        match self {
            EngineKind::PdfLatex => "pdflatex",
            EngineKind::XeLatex => "xelatex",
            EngineKind::LuaLatex => "lualatex",
        }
    }

    /// Returns all engines.
    pub fn all() -> &'static [EngineKind] {
        &[EngineKind::PdfLatex, EngineKind::XeLatex, EngineKind::LuaLatex]
    }

    /// Recognises an engine from a tool name or path such as
    /// `/usr/bin/xelatex` or `lualatex.exe`.
    pub fn from_tool_name(tool: &str) -> Option<EngineKind> {
        let stem = Path::new(tool).file_stem()?.to_str()?;
        stem.to_ascii_lowercase().parse().ok()
    }
}

impl std::fmt::Display for EngineKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for EngineKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pdflatex" => Ok(EngineKind::PdfLatex),
            "xelatex" => Ok(EngineKind::XeLatex),
            "lualatex" => Ok(EngineKind::LuaLatex),
            _ => Err(format!(
                "unknown engine: {} (expected pdflatex, xelatex, or lualatex)",
                s
            )),
        }
    }
}

/// A resolved engine: the executable to launch plus user arguments that go
/// before the input file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineCommand {
    /// Executable path.
    pub program: PathBuf,
    /// Extra arguments inserted ahead of the input file.
    pub extra_args: Vec<String>,
}

impl EngineCommand {
    /// Creates a command with no extra arguments.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            extra_args: Vec::new(),
        }
    }

    /// Sets the extra arguments.
    pub fn with_extra_args(mut self, args: Vec<String>) -> Self {
        self.extra_args = args;
        self
    }
}

/// Finds the executable for `name`.
///
/// Checks, in order: the explicit override, [`ENGINE_PATH_ENV`], then `PATH`.
/// An explicit override that names a missing file is still returned as-is, so
/// the failure surfaces as a launch failure naming that path.
pub fn locate(name: &str, explicit: Option<&Path>) -> TexResult<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(ENGINE_PATH_ENV) {
        let path = PathBuf::from(path);
        if path.exists() {
            return Ok(path);
        }
    }

    find_on_path(name).ok_or_else(|| TexError::EngineNotFound {
        engine: name.to_string(),
    })
}

/// Searches `PATH` only, ignoring any override.
pub fn find_on_path(name: &str) -> Option<PathBuf> {
    which::which(name).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_kind_as_str() {
        assert_eq!(EngineKind::PdfLatex.as_str(), "pdflatex");
        assert_eq!(EngineKind::XeLatex.as_str(), "xelatex");
        assert_eq!(EngineKind::LuaLatex.as_str(), "lualatex");
        assert_eq!(EngineKind::default(), EngineKind::PdfLatex);
    }

    #[test]
    fn test_engine_kind_from_str() {
        for kind in EngineKind::all() {
            assert_eq!(kind.as_str().parse::<EngineKind>().unwrap(), *kind);
        }
        let err = "context".parse::<EngineKind>().unwrap_err();
        assert!(err.contains("unknown engine"));
    }

    #[test]
    fn test_engine_kind_from_tool_name() {
        assert_eq!(EngineKind::from_tool_name("xelatex"), Some(EngineKind::XeLatex));
        assert_eq!(
            EngineKind::from_tool_name("/usr/local/texlive/bin/lualatex"),
            Some(EngineKind::LuaLatex)
        );
        assert_eq!(
            EngineKind::from_tool_name("PDFLATEX.exe"),
            Some(EngineKind::PdfLatex)
        );
        assert_eq!(EngineKind::from_tool_name("tectonic"), None);
        assert_eq!(EngineKind::from_tool_name(""), None);
    }

    #[test]
    fn test_locate_prefers_explicit_path() {
        let path = locate("pdflatex", Some(Path::new("/opt/tex/bin/pdflatex"))).unwrap();
        assert_eq!(path, PathBuf::from("/opt/tex/bin/pdflatex"));
    }

    #[test]
    fn test_locate_unknown_engine() {
        if std::env::var_os(ENGINE_PATH_ENV).is_some() {
            eprintln!("{} is set; skipping lookup test", ENGINE_PATH_ENV);
            return;
        }
        let err = locate("texmill-no-such-engine-binary", None).unwrap_err();
        assert!(matches!(err, TexError::EngineNotFound { .. }));
        assert!(err.is_launch_failure());
    }
}
