//! Markup serialization of the document model, and parsing back.
//!
//! The emitted dialect: `p`, `h1`-`h6`, `pre > code`, `img`, `hr`, `ul`/`ol`
//! with `li`, `blockquote`, and inline `a`, `strong`, `em`, `s`, `code`, `br`.
//! Parsing accepts anything, keeps what maps onto the model and unwraps the
//! rest.

use kuchikiki::NodeRef;
use pulldown_cmark_escape::escape_html;
use writeup_common::config::EditorConfig;
use writeup_renderer::dom::{self, Fragment};
use writeup_renderer::sanitize;

use crate::document::{Block, BlockKind, Document, ImageAttrs, MarkKind, MarkSet, TextRun, Wrap};

fn push_escaped(out: &mut String, text: &str) {
    // Writing into a String never fails.
    let _ = escape_html(&mut *out, text);
}

/// Serialize `doc` to markup.
pub fn to_html(doc: &Document, config: &EditorConfig) -> String {
    let mut out = String::new();
    let blocks = doc.blocks();
    let mut i = 0;
    while i < blocks.len() {
        let wrap = blocks[i].wrap;
        let (open, close, item) = match wrap {
            Wrap::None => {
                write_block(&mut out, &blocks[i], config);
                i += 1;
                continue;
            }
            Wrap::BulletList => ("<ul>", "</ul>", true),
            Wrap::OrderedList => ("<ol>", "</ol>", true),
            Wrap::Blockquote => ("<blockquote>", "</blockquote>", false),
        };

        let end = blocks[i..]
            .iter()
            .position(|block| block.wrap != wrap)
            .map_or(blocks.len(), |n| i + n);
        out.push_str(open);
        for block in &blocks[i..end] {
            if item {
                out.push_str("<li>");
            }
            write_block(&mut out, block, config);
            if item {
                out.push_str("</li>");
            }
        }
        out.push_str(close);
        i = end;
    }
    out
}

fn write_block(out: &mut String, block: &Block, config: &EditorConfig) {
    match &block.kind {
        BlockKind::Paragraph => {
            out.push_str("<p>");
            write_inline(out, &block.runs, config);
            out.push_str("</p>");
        }
        BlockKind::Heading(level) => {
            out.push_str(&format!("<h{level}>"));
            write_inline(out, &block.runs, config);
            out.push_str(&format!("</h{level}>"));
        }
        BlockKind::CodeBlock { language } => {
            out.push_str("<pre><code");
            if let Some(language) = language {
                out.push_str(" class=\"language-");
                push_escaped(out, language);
                out.push('"');
            }
            out.push('>');
            push_escaped(out, &block.text());
            out.push_str("</code></pre>");
        }
        BlockKind::Image(image) => {
            out.push_str("<img src=\"");
            push_escaped(out, &image.src);
            out.push('"');
            if let Some(alt) = &image.alt {
                out.push_str(" alt=\"");
                push_escaped(out, alt);
                out.push('"');
            }
            if let Some(title) = &image.title {
                out.push_str(" title=\"");
                push_escaped(out, title);
                out.push('"');
            }
            if !config.image_class.is_empty() {
                out.push_str(" class=\"");
                push_escaped(out, &config.image_class);
                out.push('"');
            }
            out.push('>');
        }
        BlockKind::Rule => out.push_str("<hr>"),
    }
}

/// Inline tags in nesting order, outermost first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InlineTag<'a> {
    Link(&'a str),
    Bold,
    Italic,
    Strike,
    Code,
}

fn inline_tags(marks: &MarkSet) -> Vec<InlineTag<'_>> {
    let mut tags = Vec::new();
    if let Some(href) = &marks.link {
        tags.push(InlineTag::Link(href));
    }
    if marks.bold {
        tags.push(InlineTag::Bold);
    }
    if marks.italic {
        tags.push(InlineTag::Italic);
    }
    if marks.strike {
        tags.push(InlineTag::Strike);
    }
    if marks.code {
        tags.push(InlineTag::Code);
    }
    tags
}

fn open_tag(out: &mut String, tag: InlineTag<'_>, config: &EditorConfig) {
    match tag {
        InlineTag::Link(href) => {
            out.push_str("<a href=\"");
            push_escaped(out, href);
            out.push('"');
            if let Some(target) = &config.link_target {
                out.push_str(" target=\"");
                push_escaped(out, target);
                out.push('"');
            }
            if let Some(rel) = &config.link_rel {
                out.push_str(" rel=\"");
                push_escaped(out, rel);
                out.push('"');
            }
            if !config.link_class.is_empty() {
                out.push_str(" class=\"");
                push_escaped(out, &config.link_class);
                out.push('"');
            }
            out.push('>');
        }
        InlineTag::Bold => out.push_str("<strong>"),
        InlineTag::Italic => out.push_str("<em>"),
        InlineTag::Strike => out.push_str("<s>"),
        InlineTag::Code => out.push_str("<code>"),
    }
}

fn close_tag(out: &mut String, tag: InlineTag<'_>) {
    out.push_str(match tag {
        InlineTag::Link(_) => "</a>",
        InlineTag::Bold => "</strong>",
        InlineTag::Italic => "</em>",
        InlineTag::Strike => "</s>",
        InlineTag::Code => "</code>",
    });
}

fn write_inline(out: &mut String, runs: &[TextRun], config: &EditorConfig) {
    let mut open: Vec<InlineTag<'_>> = Vec::new();
    for run in runs {
        let tags = inline_tags(&run.marks);
        let common = open
            .iter()
            .zip(&tags)
            .take_while(|(a, b)| a == b)
            .count();
        for tag in open.drain(common..).rev() {
            close_tag(out, tag);
        }
        for &tag in &tags[common..] {
            open_tag(out, tag, config);
        }
        open = tags;

        for (i, line) in run.text.split('\n').enumerate() {
            if i > 0 {
                out.push_str("<br>");
            }
            push_escaped(out, line);
        }
    }
    for tag in open.into_iter().rev() {
        close_tag(out, tag);
    }
}

const BLOCK_TAGS: &[&str] = &[
    "p",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "pre",
    "ul",
    "ol",
    "li",
    "blockquote",
    "img",
    "hr",
    "div",
    "table",
    "section",
    "article",
];

/// Parse markup into the document model.
///
/// Input is sanitized first; unknown elements are unwrapped.
pub fn from_html(html: &str) -> Document {
    let fragment = Fragment::parse(&sanitize(html));
    let mut parser = Parser::default();
    parser.blocks(fragment.root(), Wrap::None);
    parser.flush();
    Document::from_blocks(parser.out)
}

#[derive(Default)]
struct Parser {
    out: Vec<Block>,
    /// Paragraph collecting inline content found outside any block.
    pending: Option<Block>,
    /// Images found inside inline content, emitted after their block.
    deferred: Vec<Block>,
}

fn heading_level(tag: &str) -> Option<u8> {
    match tag {
        "h1" => Some(1),
        "h2" => Some(2),
        "h3" => Some(3),
        "h4" => Some(4),
        "h5" => Some(5),
        "h6" => Some(6),
        _ => None,
    }
}

fn attribute(node: &NodeRef, name: &str) -> Option<String> {
    let element = node.as_element()?;
    let attributes = element.attributes.borrow();
    attributes
        .get(name)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_owned)
}

fn image_block(node: &NodeRef) -> Option<Block> {
    let src = attribute(node, "src")?;
    Some(Block::image(ImageAttrs {
        src,
        alt: attribute(node, "alt"),
        title: attribute(node, "title"),
    }))
}

fn code_block_language(pre: &NodeRef) -> Option<String> {
    let code = pre.select_first("code").ok()?;
    let classes = attribute(code.as_node(), "class")?;
    classes
        .split_whitespace()
        .find_map(|class| class.strip_prefix("language-"))
        .filter(|lang| !lang.is_empty())
        .map(str::to_owned)
}

fn contains_block(node: &NodeRef) -> bool {
    node.descendants()
        .any(|d| dom::tag_name(&d).is_some_and(|tag| BLOCK_TAGS.contains(&tag)))
}

/// Collapse whitespace the way a browser renders it, across runs, and trim
/// the block edges.
///
/// Text nodes arrive with every whitespace character turned into a space, so
/// a `'\n'` here is always a hard break.
fn collapse_whitespace(runs: Vec<TextRun>) -> Vec<TextRun> {
    let mut collapsed: Vec<TextRun> = Vec::with_capacity(runs.len());
    let mut after_space = true;
    for run in runs {
        let mut text = String::with_capacity(run.text.len());
        for c in run.text.chars() {
            if c == '\n' {
                text.push('\n');
                after_space = true;
            } else if c.is_ascii_whitespace() {
                if !after_space {
                    text.push(' ');
                    after_space = true;
                }
            } else {
                text.push(c);
                after_space = false;
            }
        }
        collapsed.push(TextRun::marked(text, run.marks));
    }

    // Trailing spaces at the end of the block.
    for run in collapsed.iter_mut().rev() {
        let trimmed = run.text.trim_end_matches(' ').len();
        run.text.truncate(trimmed);
        if !run.text.is_empty() {
            break;
        }
    }
    collapsed
}

impl Parser {
    fn push(&mut self, block: Block) {
        let wrap = block.wrap;
        let skip = block.kind == BlockKind::Paragraph && block.is_empty() && !self.deferred.is_empty();
        if !skip {
            self.out.push(block);
        }
        self.out
            .extend(self.deferred.drain(..).map(|image| image.with_wrap(wrap)));
    }

    fn flush(&mut self) {
        let Some(Block { kind, wrap, runs }) = self.pending.take() else {
            return;
        };
        let block = Block::new(kind)
            .with_wrap(wrap)
            .with_runs(collapse_whitespace(runs));
        if block.is_empty() && self.deferred.is_empty() {
            return;
        }
        self.push(block);
    }

    fn blocks(&mut self, node: &NodeRef, wrap: Wrap) {
        for child in node.children() {
            let Some(tag) = dom::tag_name(&child) else {
                self.inline_outside_block(&child, wrap);
                continue;
            };

            if let Some(level) = heading_level(tag) {
                self.flush();
                let block = self.textblock(BlockKind::Heading(level), &child, wrap);
                self.push(block);
                continue;
            }
            match tag {
                "p" => {
                    self.flush();
                    let block = self.textblock(BlockKind::Paragraph, &child, wrap);
                    self.push(block);
                }
                "pre" => {
                    self.flush();
                    let language = code_block_language(&child).map(Into::into);
                    let block = Block::new(BlockKind::CodeBlock { language })
                        .with_wrap(wrap)
                        .with_runs(vec![TextRun::plain(child.text_contents())]);
                    self.push(block);
                }
                "ul" | "ol" | "blockquote" => {
                    self.flush();
                    let inner = match tag {
                        "ul" => Wrap::BulletList,
                        "ol" => Wrap::OrderedList,
                        _ => Wrap::Blockquote,
                    };
                    self.blocks(&child, inner);
                    self.flush();
                }
                "img" => {
                    self.flush();
                    if let Some(image) = image_block(&child) {
                        self.push(image.with_wrap(wrap));
                    }
                }
                "hr" => {
                    self.flush();
                    self.push(Block::new(BlockKind::Rule).with_wrap(wrap));
                }
                _ if tag == "li" || contains_block(&child) => {
                    self.flush();
                    self.blocks(&child, wrap);
                    self.flush();
                }
                _ => self.inline_outside_block(&child, wrap),
            }
        }
    }

    fn inline_outside_block(&mut self, node: &NodeRef, wrap: Wrap) {
        if self.pending.is_none() {
            let blank = node
                .as_text()
                .is_some_and(|text| text.borrow().trim().is_empty());
            if blank || (node.as_text().is_none() && node.as_element().is_none()) {
                return;
            }
        }
        let mut block = self
            .pending
            .take()
            .unwrap_or_else(|| Block::new(BlockKind::Paragraph).with_wrap(wrap));
        self.inline(node, &MarkSet::default(), &mut block.runs);
        self.pending = Some(block);
    }

    fn textblock(&mut self, kind: BlockKind, node: &NodeRef, wrap: Wrap) -> Block {
        let mut runs = Vec::new();
        for child in node.children() {
            self.inline(&child, &MarkSet::default(), &mut runs);
        }
        Block::new(kind)
            .with_wrap(wrap)
            .with_runs(collapse_whitespace(runs))
    }

    fn inline(&mut self, node: &NodeRef, marks: &MarkSet, runs: &mut Vec<TextRun>) {
        if let Some(text) = node.as_text() {
            let text: String = text
                .borrow()
                .chars()
                .map(|c| if c.is_ascii_whitespace() { ' ' } else { c })
                .collect();
            runs.push(TextRun::marked(text, marks.clone()));
            return;
        }
        let Some(tag) = dom::tag_name(node) else {
            return;
        };

        let mut marks = marks.clone();
        match tag {
            "strong" | "b" => marks.bold = true,
            "em" | "i" => marks.italic = true,
            "s" | "del" | "strike" => marks.strike = true,
            "code" => marks.set(MarkKind::Code, true),
            "a" => marks.link = attribute(node, "href").map(Into::into),
            "br" => {
                runs.push(TextRun::marked("\n", marks));
                return;
            }
            "img" => {
                if let Some(image) = image_block(node) {
                    self.deferred.push(image);
                }
                return;
            }
            _ => {}
        }
        if marks.code {
            marks.set(MarkKind::Code, true);
        }
        for child in node.children() {
            self.inline(&child, &marks, runs);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;

    fn config() -> EditorConfig {
        EditorConfig::default()
    }

    fn round_trip(html: &str) -> String {
        to_html(&from_html(html), &config())
    }

    #[test]
    fn empty_document_is_one_paragraph() {
        assert_eq!(to_html(&Document::new(), &config()), "<p></p>");
        assert_eq!(round_trip(""), "<p></p>");
    }

    #[test]
    fn emitted_markup_is_stable() {
        let inputs = [
            "<h2>Recon</h2><p>Found <strong>two</strong> ports.</p>",
            "<ul><li><p>one</p></li><li><p>two</p></li></ul><p>after</p>",
            "<blockquote><p>quoted <em>text</em></p></blockquote>",
            r#"<pre><code class="language-python">print("hi")
</code></pre>"#,
            "<p>line one<br>line two</p><hr>",
        ];
        for input in inputs {
            let once = round_trip(input);
            assert_eq!(round_trip(&once), once, "input: {input}");
        }
    }

    #[test]
    fn nested_marks_share_outer_tags() {
        let html = round_trip("<p><strong>bold <em>both</em></strong> plain</p>");
        assert_eq!(html, "<p><strong>bold <em>both</em></strong> plain</p>");
    }

    #[test]
    fn links_carry_configured_attributes() {
        let html = round_trip(r#"<p><a href="https://ctf.example">site</a></p>"#);
        insta::assert_snapshot!(html);
    }

    #[test]
    fn images_get_configured_class() {
        let html = round_trip(r#"<p><img src="https://cdn.example/a.png" alt="flag"></p>"#);
        assert_eq!(
            html,
            r#"<img src="https://cdn.example/a.png" alt="flag" class="rounded-lg border border-border max-w-full">"#
        );
    }

    #[test]
    fn unknown_elements_are_unwrapped() {
        let html = round_trip("<div><span>loose <b>text</b></span></div><section><p>inside</p></section>");
        assert_eq!(html, "<p>loose <strong>text</strong></p><p>inside</p>");
    }

    #[test]
    fn code_excludes_other_marks_when_parsing() {
        let html = round_trip("<p><code>a <strong>b</strong></code></p>");
        assert_eq!(html, "<p><code>a b</code></p>");
    }

    #[test]
    fn script_urls_never_become_links() {
        let html = round_trip(r#"<p><a href="javascript:alert(1)">x</a></p>"#);
        assert_eq!(html, "<p>x</p>");
    }

    #[test]
    fn whitespace_is_collapsed() {
        let html = round_trip("<p>\n  a   <em> b </em>  c\n</p>");
        assert_eq!(html, "<p>a <em>b </em>c</p>");
    }
}
