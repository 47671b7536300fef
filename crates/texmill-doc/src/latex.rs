//! Minimal LaTeX writer.
//!
//! Covers the node set in [`crate::document`] and nothing more; it exists so
//! a document can go from JSON to PDF without an external converter.

use crate::document::{Block, Document, Inline};
use crate::options::RenderOptions;
use crate::render::Render;

/// Literal the engine driver looks for to decide on an extra pass.
pub const TOC_COMMAND: &str = "\\tableofcontents";

/// Renders documents as LaTeX source.
#[derive(Debug, Clone, Copy, Default)]
pub struct LatexWriter;

impl Render for LatexWriter {
    fn render(&self, options: &RenderOptions, document: &Document) -> String {
        let mut out = String::new();
        if options.standalone {
            write_preamble(&mut out, options, document);
        }
        for block in &document.blocks {
            write_block(&mut out, block);
        }
        if options.standalone {
            out.push_str("\\end{document}\n");
        }
        out
    }
}

fn write_preamble(out: &mut String, options: &RenderOptions, document: &Document) {
    out.push_str(&format!("\\documentclass{{{}}}\n", options.document_class));
    out.push_str("\\usepackage{amsmath}\n");
    out.push_str("\\usepackage{graphicx}\n");
    out.push_str("\\usepackage{hyperref}\n");

    let meta = &document.meta;
    if let Some(title) = &meta.title {
        out.push_str(&format!("\\title{{{}}}\n", escape(title)));
    }
    if !meta.authors.is_empty() {
        let authors: Vec<String> = meta.authors.iter().map(|a| escape(a)).collect();
        out.push_str(&format!("\\author{{{}}}\n", authors.join(" \\and ")));
    }
    if let Some(date) = &meta.date {
        out.push_str(&format!("\\date{{{}}}\n", escape(date)));
    }

    out.push_str("\\begin{document}\n");
    if meta.title.is_some() {
        out.push_str("\\maketitle\n");
    }
    if options.toc {
        out.push_str(TOC_COMMAND);
        out.push('\n');
    }
    out.push('\n');
}

fn write_block(out: &mut String, block: &Block) {
    match block {
        Block::Para(inlines) => {
            if let [Inline::Image(image)] = inlines.as_slice() {
                if !image.label.is_empty() {
                    out.push_str("\\begin{figure}[htbp]\n\\centering\n");
                    out.push_str(&format!("\\includegraphics{{{}}}\n", image.source));
                    out.push_str(&format!("\\caption{{{}}}\n", inlines_to_latex(&image.label)));
                    out.push_str("\\end{figure}\n\n");
                    return;
                }
            }
            out.push_str(&inlines_to_latex(inlines));
            out.push_str("\n\n");
        }
        Block::Header { level, content } => {
            let command = match level {
                0 | 1 => "section",
                2 => "subsection",
                3 => "subsubsection",
                4 => "paragraph",
                _ => "subparagraph",
            };
            out.push_str(&format!("\\{}{{{}}}\n\n", command, inlines_to_latex(content)));
        }
        Block::CodeBlock(code) => {
            out.push_str("\\begin{verbatim}\n");
            out.push_str(code);
            if !code.ends_with('\n') {
                out.push('\n');
            }
            out.push_str("\\end{verbatim}\n\n");
        }
        Block::BlockQuote(blocks) => {
            out.push_str("\\begin{quote}\n");
            blocks.iter().for_each(|b| write_block(out, b));
            out.push_str("\\end{quote}\n\n");
        }
        Block::BulletList(items) => write_list(out, "itemize", items),
        Block::OrderedList(items) => write_list(out, "enumerate", items),
        Block::HorizontalRule => {
            out.push_str("\\begin{center}\\rule{0.5\\linewidth}{0.5pt}\\end{center}\n\n");
        }
        Block::RawBlock { format, text } => {
            if is_latex_format(format) {
                out.push_str(text);
                out.push_str("\n\n");
            }
        }
    }
}

fn write_list(out: &mut String, env: &str, items: &[Vec<Block>]) {
    out.push_str(&format!("\\begin{{{}}}\n", env));
    for item in items {
        out.push_str("\\item ");
        let mut body = String::new();
        item.iter().for_each(|b| write_block(&mut body, b));
        out.push_str(body.trim_end());
        out.push('\n');
    }
    out.push_str(&format!("\\end{{{}}}\n\n", env));
}

fn inlines_to_latex(inlines: &[Inline]) -> String {
    let mut out = String::new();
    for inline in inlines {
        match inline {
            Inline::Str(text) => out.push_str(&escape(text)),
            Inline::Space => out.push(' '),
            Inline::LineBreak => out.push_str("\\\\\n"),
            Inline::Emph(content) => {
                out.push_str(&format!("\\emph{{{}}}", inlines_to_latex(content)))
            }
            Inline::Strong(content) => {
                out.push_str(&format!("\\textbf{{{}}}", inlines_to_latex(content)))
            }
            Inline::Code(code) => out.push_str(&format!("\\texttt{{{}}}", escape(code))),
            Inline::Math(math) => out.push_str(&format!("${}$", math)),
            Inline::Link { content, target } => out.push_str(&format!(
                "\\href{{{}}}{{{}}}",
                escape_url(target),
                inlines_to_latex(content)
            )),
            Inline::Image(image) => {
                out.push_str(&format!("\\includegraphics{{{}}}", image.source))
            }
            Inline::RawInline { format, text } => {
                if is_latex_format(format) {
                    out.push_str(text);
                }
            }
        }
    }
    out
}

fn is_latex_format(format: &str) -> bool {
    matches!(format, "latex" | "tex")
}

/// Escapes text for use in LaTeX running text.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\textbackslash{}"),
            '{' | '}' | '$' | '&' | '%' | '#' | '_' => {
                out.push('\\');
                out.push(c);
            }
            '~' => out.push_str("\\textasciitilde{}"),
            '^' => out.push_str("\\textasciicircum{}"),
            _ => out.push(c),
        }
    }
    out
}

fn escape_url(url: &str) -> String {
    url.replace('\\', "/")
        .replace('%', "\\%")
        .replace('#', "\\#")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Image, Meta};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_escape_special_characters() {
        assert_eq!(escape("50% & $5_x #1"), "50\\% \\& \\$5\\_x \\#1");
        assert_eq!(escape("a\\b"), "a\\textbackslash{}b");
        assert_eq!(escape("~^"), "\\textasciitilde{}\\textasciicircum{}");
        assert_eq!(escape("{x}"), "\\{x\\}");
    }

    #[test]
    fn test_standalone_wraps_document() {
        let doc = Document::new(vec![Block::Para(vec![Inline::Str("Hi".into())])]);
        let tex = LatexWriter.render(&RenderOptions::default(), &doc);
        assert!(tex.starts_with("\\documentclass{article}\n"));
        assert!(tex.contains("\\begin{document}\n"));
        assert!(tex.contains("Hi\n\n"));
        assert!(tex.ends_with("\\end{document}\n"));
        assert!(!tex.contains(TOC_COMMAND));
    }

    #[test]
    fn test_toc_option_emits_marker() {
        let doc = Document::default();
        let tex = LatexWriter.render(&RenderOptions::default().toc(true), &doc);
        assert!(tex.contains("\\tableofcontents\n"));
    }

    #[test]
    fn test_fragment_output() {
        let doc = Document::new(vec![Block::Header {
            level: 2,
            content: vec![Inline::Str("Results".into())],
        }]);
        let tex = LatexWriter.render(&RenderOptions::default().standalone(false), &doc);
        assert_eq!(tex, "\\subsection{Results}\n\n");
    }

    #[test]
    fn test_captioned_image_becomes_figure() {
        let doc = Document::new(vec![Block::Para(vec![Inline::Image(
            Image::new("plot.png").with_label("A plot"),
        )])]);
        let tex = LatexWriter.render(&RenderOptions::default().standalone(false), &doc);
        assert_eq!(
            tex,
            "\\begin{figure}[htbp]\n\\centering\n\\includegraphics{plot.png}\n\\caption{A plot}\n\\end{figure}\n\n"
        );
    }

    #[test]
    fn test_lists_and_inline_markup() {
        let doc = Document::new(vec![Block::BulletList(vec![
            vec![Block::Para(vec![Inline::Emph(vec![Inline::Str("one".into())])])],
            vec![Block::Para(vec![Inline::Code("a_b".into())])],
        ])]);
        let tex = LatexWriter.render(&RenderOptions::default().standalone(false), &doc);
        assert_eq!(
            tex,
            "\\begin{itemize}\n\\item \\emph{one}\n\\item \\texttt{a\\_b}\n\\end{itemize}\n\n"
        );
    }

    #[test]
    fn test_raw_blocks_filtered_by_format() {
        let doc = Document::new(vec![
            Block::RawBlock {
                format: "latex".into(),
                text: "\\newpage".into(),
            },
            Block::RawBlock {
                format: "html".into(),
                text: "<hr>".into(),
            },
        ]);
        let tex = LatexWriter.render(&RenderOptions::default().standalone(false), &doc);
        assert_eq!(tex, "\\newpage\n\n");
    }

    #[test]
    fn test_metadata_in_preamble() {
        let doc = Document {
            meta: Meta {
                title: Some("R&D".into()),
                authors: vec!["Ada".into(), "Grace".into()],
                date: None,
            },
            blocks: vec![],
        };
        let tex = LatexWriter.render(&RenderOptions::default(), &doc);
        assert!(tex.contains("\\title{R\\&D}\n"));
        assert!(tex.contains("\\author{Ada \\and Grace}\n"));
        assert!(tex.contains("\\maketitle\n"));
    }

    #[test]
    fn test_closure_implements_render() {
        let render = |_: &RenderOptions, _: &Document| String::from("raw");
        assert_eq!(render.render(&RenderOptions::default(), &Document::default()), "raw");
    }
}
