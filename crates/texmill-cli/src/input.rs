//! Input loading for JSON documents and raw TeX sources.
//!
//! Dispatches by file extension: `.json` is parsed as a document tree and
//! rendered through the LaTeX writer, `.tex` is passed to the engine as-is.

use std::path::{Path, PathBuf};

use texmill_doc::{Document, LatexWriter, Render, RenderOptions};

/// Recognized document extensions.
pub const JSON_EXTENSIONS: &[&str] = &["json"];

/// Recognized TeX source extensions.
pub const TEX_EXTENSIONS: &[&str] = &["tex", "latex", "ltx"];

/// A loaded input file.
#[derive(Debug, Clone)]
pub enum Input {
    /// A document tree to be rendered.
    Document(Document),
    /// Engine source used verbatim.
    Tex(String),
}

impl Input {
    /// Returns the document to materialize. Raw sources carry none.
    pub fn document(&self) -> Document {
        match self {
            Input::Document(doc) => doc.clone(),
            Input::Tex(_) => Document::default(),
        }
    }

    /// Short name of the input kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Input::Document(_) => "json",
            Input::Tex(_) => "tex",
        }
    }
}

impl Render for Input {
    fn render(&self, options: &RenderOptions, document: &Document) -> String {
        match self {
            Input::Document(_) => LatexWriter.render(options, document),
            Input::Tex(source) => source.clone(),
        }
    }
}

/// Errors that can occur while loading input.
#[derive(Debug)]
pub enum InputError {
    /// File could not be read.
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Unknown file extension.
    UnknownExtension { extension: Option<String> },

    /// JSON parsing failed.
    JsonParse { message: String },
}

impl std::fmt::Display for InputError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InputError::FileRead { path, source } => {
                write!(f, "failed to read file '{}': {}", path.display(), source)
            }
            InputError::UnknownExtension { extension } => match extension {
                Some(ext) => write!(
                    f,
                    "unknown file extension '.{}' (expected .json or .tex)",
                    ext
                ),
                None => write!(f, "file has no extension (expected .json or .tex)"),
            },
            InputError::JsonParse { message } => {
                write!(f, "JSON parse error: {}", message)
            }
        }
    }
}

impl std::error::Error for InputError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            InputError::FileRead { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Loads an input file, dispatching by extension.
pub fn load_input(path: &Path) -> Result<Input, InputError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|s| s.to_lowercase());

    match extension.as_deref() {
        Some(ext) if JSON_EXTENSIONS.contains(&ext) => {
            let content = read(path)?;
            let document = Document::from_json(&content).map_err(|e| InputError::JsonParse {
                message: e.to_string(),
            })?;
            Ok(Input::Document(document))
        }
        Some(ext) if TEX_EXTENSIONS.contains(&ext) => Ok(Input::Tex(read(path)?)),
        _ => Err(InputError::UnknownExtension { extension }),
    }
}

fn read(path: &Path) -> Result<String, InputError> {
    std::fs::read_to_string(path).map_err(|source| InputError::FileRead {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_load_tex_is_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("paper.tex");
        std::fs::write(&path, "\\relax\n").unwrap();

        let input = load_input(&path).unwrap();
        assert_eq!(input.kind(), "tex");
        assert_eq!(
            input.render(&RenderOptions::default(), &input.document()),
            "\\relax\n"
        );
    }

    #[test]
    fn test_load_json_renders_latex() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.JSON");
        std::fs::write(
            &path,
            r#"{"meta":{},"blocks":[{"t":"Para","c":[{"t":"Str","c":"Hello"}]}]}"#,
        )
        .unwrap();

        let input = load_input(&path).unwrap();
        assert_eq!(input.kind(), "json");
        let tex = input.render(&RenderOptions::default(), &input.document());
        assert!(tex.contains("\\begin{document}"));
        assert!(tex.contains("Hello"));
    }

    #[test]
    fn test_unknown_extension() {
        let err = load_input(Path::new("notes.md")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "unknown file extension '.md' (expected .json or .tex)"
        );
        let err = load_input(Path::new("README")).unwrap_err();
        assert!(matches!(err, InputError::UnknownExtension { extension: None }));
    }

    #[test]
    fn test_bad_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            load_input(&path).unwrap_err(),
            InputError::JsonParse { .. }
        ));
    }

    #[test]
    fn test_missing_file() {
        let err = load_input(Path::new("/nonexistent/texmill/doc.json")).unwrap_err();
        assert!(matches!(err, InputError::FileRead { .. }));
    }
}
