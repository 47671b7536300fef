//! The render collaborator interface.

use crate::document::Document;
use crate::options::RenderOptions;

/// Turns a document into engine source text.
///
/// Implemented for [`crate::latex::LatexWriter`] and for any closure of the
/// shape `Fn(&RenderOptions, &Document) -> String`.
pub trait Render {
    /// Renders `document` to source text. Must be deterministic.
    fn render(&self, options: &RenderOptions, document: &Document) -> String;
}

impl<F> Render for F
where
    F: Fn(&RenderOptions, &Document) -> String,
{
    fn render(&self, options: &RenderOptions, document: &Document) -> String {
        self(options, document)
    }
}
