//! texmill document model
//!
//! This crate provides the document tree that texmill turns into PDF, the
//! options that travel with it, and the render interface the engine driver
//! consumes.
//!
//! # Overview
//!
//! - A [`Document`] is metadata plus a tree of [`Block`] and [`Inline`] nodes,
//!   loadable from JSON.
//! - [`Document::map_images`] / [`Document::try_map_images`] rewrite image
//!   references and leave every other node untouched.
//! - [`Render`] is the collaborator that turns a document into engine source;
//!   [`LatexWriter`] is the bundled implementation.
//!
//! # Example
//!
//! ```
//! use texmill_doc::{Block, Document, Image, Inline, LatexWriter, Render, RenderOptions};
//!
//! let doc = Document::new(vec![Block::Para(vec![
//!     Inline::Str("Figure:".into()),
//!     Inline::Space,
//!     Inline::Image(Image::new("plot.png")),
//! ])]);
//!
//! let tex = LatexWriter.render(&RenderOptions::default(), &doc);
//! assert!(tex.contains("\\includegraphics{plot.png}"));
//! ```
//!
//! # Modules
//!
//! - [`document`]: Document, block, inline and image types
//! - [`options`]: Render options
//! - [`render`]: The render collaborator trait
//! - [`latex`]: LaTeX writer
//! - [`error`]: Error types

pub mod document;
pub mod error;
pub mod latex;
pub mod options;
pub mod render;

pub use document::{Block, Document, Image, Inline, Meta};
pub use error::DocumentError;
pub use latex::{LatexWriter, TOC_COMMAND};
pub use options::RenderOptions;
pub use render::Render;
