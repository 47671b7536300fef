//! Document tree types and image traversal.

use serde::{Deserialize, Serialize};

use crate::error::DocumentError;

/// Document metadata used by standalone renderers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Meta {
    /// Document title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Authors, in display order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub authors: Vec<String>,
    /// Free-form date string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

/// A document: metadata plus a sequence of blocks.
///
/// The tree is owned and treated as immutable; rewrites go through
/// [`Document::map_images`] / [`Document::try_map_images`], which consume the
/// document and return a new one with only image nodes replaced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Document {
    /// Document metadata.
    #[serde(default)]
    pub meta: Meta,
    /// Top-level blocks.
    #[serde(default)]
    pub blocks: Vec<Block>,
}

/// Block-level nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "t", content = "c")]
pub enum Block {
    /// A paragraph of inline content.
    Para(Vec<Inline>),
    /// A section heading.
    Header {
        /// Heading depth, starting at 1.
        level: u8,
        /// Heading text.
        content: Vec<Inline>,
    },
    /// Preformatted code.
    CodeBlock(String),
    /// A quotation containing nested blocks.
    BlockQuote(Vec<Block>),
    /// An unordered list; each item is a sequence of blocks.
    BulletList(Vec<Vec<Block>>),
    /// An ordered list; each item is a sequence of blocks.
    OrderedList(Vec<Vec<Block>>),
    /// A horizontal rule.
    HorizontalRule,
    /// Raw content passed through only to writers of the matching format.
    RawBlock {
        /// Target format (e.g. `latex`).
        format: String,
        /// Raw text.
        text: String,
    },
}

/// Inline nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "t", content = "c")]
pub enum Inline {
    /// Plain text.
    Str(String),
    /// Inter-word space.
    Space,
    /// Hard line break.
    LineBreak,
    /// Emphasized text.
    Emph(Vec<Inline>),
    /// Strongly emphasized text.
    Strong(Vec<Inline>),
    /// Inline code.
    Code(String),
    /// Inline math, in TeX notation.
    Math(String),
    /// A hyperlink.
    Link {
        /// Link text.
        content: Vec<Inline>,
        /// Link target.
        target: String,
    },
    /// An embedded media reference.
    Image(Image),
    /// Raw inline content for a specific format.
    RawInline {
        /// Target format (e.g. `latex`).
        format: String,
        /// Raw text.
        text: String,
    },
}

/// An image reference: label content, source locator, and title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Image {
    /// Alternative text / caption content.
    #[serde(default)]
    pub label: Vec<Inline>,
    /// Source locator: a path, URL, or data URI.
    pub source: String,
    /// Title string.
    #[serde(default)]
    pub title: String,
}

impl Image {
    /// Creates an image with no label and an empty title.
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            label: Vec::new(),
            source: source.into(),
            title: String::new(),
        }
    }

    /// Sets the label to a single text node.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = vec![Inline::Str(label.into())];
        self
    }

    /// Sets the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }
}

impl Document {
    /// Creates a document from blocks with empty metadata.
    pub fn new(blocks: Vec<Block>) -> Self {
        Self {
            meta: Meta::default(),
            blocks,
        }
    }

    /// Parses a document from JSON.
    pub fn from_json(json: &str) -> Result<Self, DocumentError> {
        serde_json::from_str(json).map_err(DocumentError::Json)
    }

    /// Serializes the document to pretty-printed JSON.
    pub fn to_json_pretty(&self) -> Result<String, DocumentError> {
        serde_json::to_string_pretty(self).map_err(DocumentError::Json)
    }

    /// Returns every image in document order (including images nested in labels).
    pub fn images(&self) -> Vec<&Image> {
        let mut out = Vec::new();
        for block in &self.blocks {
            collect_block_images(block, &mut out);
        }
        out
    }

    /// Replaces every image node with the result of `f`, preserving order.
    pub fn map_images<F>(self, mut f: F) -> Document
    where
        F: FnMut(Image) -> Image,
    {
        match self.try_map_images::<std::convert::Infallible, _>(|image| Ok(f(image))) {
            Ok(document) => document,
            Err(never) => match never {},
        }
    }

    /// Fallible variant of [`Document::map_images`].
    ///
    /// Images nested inside another image's label are visited before the
    /// enclosing image. The first error aborts the traversal.
    pub fn try_map_images<E, F>(self, mut f: F) -> Result<Document, E>
    where
        F: FnMut(Image) -> Result<Image, E>,
    {
        let blocks = map_blocks(self.blocks, &mut f)?;
        Ok(Document {
            meta: self.meta,
            blocks,
        })
    }
}

fn map_blocks<E, F>(blocks: Vec<Block>, f: &mut F) -> Result<Vec<Block>, E>
where
    F: FnMut(Image) -> Result<Image, E>,
{
    blocks.into_iter().map(|block| map_block(block, f)).collect()
}

fn map_items<E, F>(items: Vec<Vec<Block>>, f: &mut F) -> Result<Vec<Vec<Block>>, E>
where
    F: FnMut(Image) -> Result<Image, E>,
{
    items.into_iter().map(|item| map_blocks(item, f)).collect()
}

fn map_block<E, F>(block: Block, f: &mut F) -> Result<Block, E>
where
    F: FnMut(Image) -> Result<Image, E>,
{
    Ok(match block {
        Block::Para(inlines) => Block::Para(map_inlines(inlines, f)?),
        Block::Header { level, content } => Block::Header {
            level,
            content: map_inlines(content, f)?,
        },
        Block::BlockQuote(blocks) => Block::BlockQuote(map_blocks(blocks, f)?),
        Block::BulletList(items) => Block::BulletList(map_items(items, f)?),
        Block::OrderedList(items) => Block::OrderedList(map_items(items, f)?),
        other @ (Block::CodeBlock(_) | Block::HorizontalRule | Block::RawBlock { .. }) => other,
    })
}

fn map_inlines<E, F>(inlines: Vec<Inline>, f: &mut F) -> Result<Vec<Inline>, E>
where
    F: FnMut(Image) -> Result<Image, E>,
{
    inlines
        .into_iter()
        .map(|inline| map_inline(inline, f))
        .collect()
}

fn map_inline<E, F>(inline: Inline, f: &mut F) -> Result<Inline, E>
where
    F: FnMut(Image) -> Result<Image, E>,
{
    Ok(match inline {
        Inline::Emph(content) => Inline::Emph(map_inlines(content, f)?),
        Inline::Strong(content) => Inline::Strong(map_inlines(content, f)?),
        Inline::Link { content, target } => Inline::Link {
            content: map_inlines(content, f)?,
            target,
        },
        Inline::Image(image) => {
            let image = Image {
                label: map_inlines(image.label, f)?,
                ..image
            };
            Inline::Image(f(image)?)
        }
        other => other,
    })
}

fn collect_block_images<'a>(block: &'a Block, out: &mut Vec<&'a Image>) {
    match block {
        Block::Para(inlines) | Block::Header { content: inlines, .. } => {
            collect_inline_images(inlines, out)
        }
        Block::BlockQuote(blocks) => blocks.iter().for_each(|b| collect_block_images(b, out)),
        Block::BulletList(items) | Block::OrderedList(items) => items
            .iter()
            .flatten()
            .for_each(|b| collect_block_images(b, out)),
        Block::CodeBlock(_) | Block::HorizontalRule | Block::RawBlock { .. } => {}
    }
}

fn collect_inline_images<'a>(inlines: &'a [Inline], out: &mut Vec<&'a Image>) {
    for inline in inlines {
        match inline {
            Inline::Emph(content) | Inline::Strong(content) | Inline::Link { content, .. } => {
                collect_inline_images(content, out)
            }
            Inline::Image(image) => {
                collect_inline_images(&image.label, out);
                out.push(image);
            }
            _ => {}
        }
    }
}
