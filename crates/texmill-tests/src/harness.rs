//! Test harness utilities: fake engines and sample documents.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

use texmill_doc::{Block, Document, Image, Inline, Meta};

/// Script body that writes `PDFDATA` as the engine output.
pub const WRITES_PDF: &str = r#"printf PDFDATA > "$out/input.pdf""#;

/// Script body that fails with a one-line TeX error.
pub const FAILS_WITH_BAD: &str = r#"printf 'This is pdfTeX\n! Bad.\nl.1 x\nmore noise\n'
exit 1"#;

/// Script body that exits successfully without output.
pub const WRITES_NOTHING: &str = "exit 0";

/// A shell script standing in for the TeX engine.
///
/// Every run appends its output directory (`$5`) to a call log before the
/// body runs. The body sees the output directory as `$out` and the fake's
/// own directory as `$fake`.
#[cfg(unix)]
pub struct FakeEngine {
    dir: TempDir,
    path: PathBuf,
}

#[cfg(unix)]
impl FakeEngine {
    /// Writes a fake engine running `body`.
    pub fn new(body: &str) -> Self {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().expect("Failed to create fake engine dir");
        let path = dir.path().join("fake-pdflatex");
        let script = format!(
            "#!/bin/sh\nout=\"$5\"\nfake='{}'\necho \"$out\" >> \"$fake/calls.log\"\n{}\n",
            dir.path().display(),
            body
        );
        fs::write(&path, script).expect("Failed to write fake engine");
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755))
            .expect("Failed to make fake engine executable");
        Self { dir, path }
    }

    /// Path of the executable script.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path as a tool name for `produce`.
    pub fn tool_name(&self) -> String {
        self.path.to_string_lossy().into_owned()
    }

    /// Directory holding the script and its logs.
    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    /// Output directories of every run, in order.
    pub fn calls(&self) -> Vec<PathBuf> {
        fs::read_to_string(self.dir.path().join("calls.log"))
            .unwrap_or_default()
            .lines()
            .map(PathBuf::from)
            .collect()
    }

    /// Number of times the engine ran.
    pub fn pass_count(&self) -> usize {
        self.calls().len()
    }

    /// Reads a file the script wrote under `$fake`.
    pub fn read_record(&self, name: &str) -> String {
        fs::read_to_string(self.dir.path().join(name))
            .unwrap_or_else(|e| panic!("Failed to read record {}: {}", name, e))
    }
}

/// A small document with a title, a heading, and a paragraph.
pub fn sample_document() -> Document {
    Document {
        meta: Meta {
            title: Some("Sample".to_string()),
            authors: vec!["A. Author".to_string()],
            date: None,
        },
        blocks: vec![
            Block::Header {
                level: 1,
                content: vec![Inline::Str("Introduction".to_string())],
            },
            Block::Para(vec![
                Inline::Str("Hello".to_string()),
                Inline::Space,
                Inline::Str("world.".to_string()),
            ]),
        ],
    }
}

/// A document whose only paragraph holds `images`.
pub fn document_with_images(images: Vec<Image>) -> Document {
    Document::new(vec![Block::Para(
        images.into_iter().map(Inline::Image).collect(),
    )])
}

/// A 1x1 PNG as a base64 data URI.
pub const PNG_DATA_URI: &str = "data:image/png;base64,\
iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mP8z8BQDwAEhQGAhKmMIQAAAABJRU5ErkJggg==";

/// Check if pdflatex is installed.
pub fn is_tex_available() -> bool {
    Command::new("pdflatex")
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// Check if real-engine tests should run based on environment variable.
pub fn should_run_tex_tests() -> bool {
    std::env::var("TEXMILL_RUN_TEX_TESTS")
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}
