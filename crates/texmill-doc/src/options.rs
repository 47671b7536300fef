//! Options shared between the renderer and the PDF engine driver.

use serde::{Deserialize, Serialize};

/// Default LaTeX document class.
pub const DEFAULT_DOCUMENT_CLASS: &str = "article";

/// Rendering options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    /// Base directory or URL used to resolve relative media references.
    pub source_base: Option<String>,
    /// Emit a table of contents.
    pub toc: bool,
    /// LaTeX document class for standalone output.
    pub document_class: String,
    /// Wrap the body in a full preamble and `document` environment.
    pub standalone: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            source_base: None,
            toc: false,
            document_class: DEFAULT_DOCUMENT_CLASS.to_string(),
            standalone: true,
        }
    }
}

impl RenderOptions {
    /// Sets the base used for resolving relative media references.
    pub fn source_base(mut self, base: impl Into<String>) -> Self {
        self.source_base = Some(base.into());
        self
    }

    /// Enables or disables the table of contents.
    pub fn toc(mut self, toc: bool) -> Self {
        self.toc = toc;
        self
    }

    /// Sets the document class.
    pub fn document_class(mut self, class: impl Into<String>) -> Self {
        self.document_class = class.into();
        self
    }

    /// Enables or disables standalone output.
    pub fn standalone(mut self, standalone: bool) -> Self {
        self.standalone = standalone;
        self
    }
}
