//! The read path: stored markup in, display markup and heading index out.

use kuchikiki::NodeRef;
use serde::Serialize;
use writeup_common::config::RendererConfig;

use crate::dom::{self, Fragment};
use crate::sanitize::Sanitizer;
use crate::toc::{self, HeadingEntry, TableOfContents};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedContent {
    pub html: String,
    pub headings: Vec<HeadingEntry>,
}

impl RenderedContent {
    pub fn table_of_contents(&self) -> TableOfContents {
        TableOfContents::new(self.headings.clone())
    }
}

/// Renders stored post markup for display.
///
/// Every call sanitizes, highlights block code, restyles inline code and
/// indexes headings, in that order.
pub struct ContentRenderer {
    sanitizer: Sanitizer,
    config: RendererConfig,
}

impl Default for ContentRenderer {
    fn default() -> Self {
        Self::new(RendererConfig::default())
    }
}

impl ContentRenderer {
    pub fn new(config: RendererConfig) -> Self {
        Self {
            sanitizer: Sanitizer::new(),
            config,
        }
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    pub fn sanitizer(&self) -> &Sanitizer {
        &self.sanitizer
    }

    pub fn render(&self, raw: &str) -> RenderedContent {
        let safe = self.sanitizer.sanitize(raw);
        self.render_sanitized(&safe)
    }

    /// Render markup that already went through [`Sanitizer::sanitize`].
    pub fn render_sanitized(&self, safe: &str) -> RenderedContent {
        let fragment = Fragment::parse(safe);
        let root = fragment.root();

        #[cfg(feature = "syntax-highlighting")]
        if self.config.highlight_code {
            crate::code_pretty::highlight_code_blocks(root);
        }

        let restyled = restyle_inline_code(root, &self.config.inline_code_classes);
        let headings = toc::index_headings(root, &self.config.toc.id_prefix);
        tracing::debug!(
            inline_code = restyled,
            headings = headings.len(),
            "rendered content"
        );

        RenderedContent {
            html: fragment.to_html(),
            headings,
        }
    }
}

/// Add `classes` to every `code` element that is not inside a `pre`.
///
/// Returns how many elements changed. Running it again changes nothing.
pub fn restyle_inline_code<S: AsRef<str>>(root: &NodeRef, classes: &[S]) -> usize {
    let Ok(codes) = root.select("code") else {
        return 0;
    };
    codes
        .filter(|code| !dom::has_ancestor(code.as_node(), "pre"))
        .filter(|code| dom::add_classes(code, classes))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use writeup_common::config::DEFAULT_INLINE_CODE_CLASSES;

    const MIXED_CODE: &str = "<pre><code>x</code></pre><p>Use <code>y</code> here</p>";

    #[test]
    fn inline_code_is_restyled_block_code_is_not() {
        let fragment = Fragment::parse(MIXED_CODE);
        assert_eq!(
            restyle_inline_code(fragment.root(), DEFAULT_INLINE_CODE_CLASSES),
            1
        );

        let codes: Vec<_> = fragment.root().select("code").unwrap().collect();
        assert_eq!(codes[0].attributes.borrow().get("class"), None);
        let inline = codes[1].attributes.borrow().get("class").map(str::to_owned);
        assert_eq!(inline.as_deref(), Some(DEFAULT_INLINE_CODE_CLASSES.join(" ").as_str()));
    }

    #[test]
    fn restyle_is_idempotent() {
        let fragment = Fragment::parse(MIXED_CODE);
        restyle_inline_code(fragment.root(), DEFAULT_INLINE_CODE_CLASSES);
        let once = fragment.to_html();
        assert_eq!(
            restyle_inline_code(fragment.root(), DEFAULT_INLINE_CODE_CLASSES),
            0
        );
        assert_eq!(fragment.to_html(), once);
    }

    #[test]
    fn render_sanitizes_before_anything_else() {
        let renderer = ContentRenderer::default();
        let rendered = renderer.render(
            r#"<h2 onclick="x()">Intro</h2><script>alert(1)</script><p>Run <code>nc</code></p>"#,
        );
        assert!(!rendered.html.contains("script"));
        assert!(!rendered.html.contains("onclick"));
        assert_eq!(rendered.headings.len(), 1);
        assert_eq!(rendered.headings[0].id, "heading-0");
        assert!(rendered.html.contains(r#"<h2 id="heading-0">Intro</h2>"#));
        assert!(rendered.html.contains("font-mono"));
    }

    #[test]
    fn rendering_rendered_output_is_stable() {
        let renderer = ContentRenderer::default();
        let first = renderer.render(
            r#"<h2>A</h2><pre><code class="language-rust">let a = 1;</code></pre><h3>B</h3><p><code>b</code></p>"#,
        );
        let second = renderer.render(&first.html);
        assert_eq!(first, second);
    }

    #[test]
    fn highlighting_can_be_turned_off() {
        let renderer = ContentRenderer::new(RendererConfig {
            highlight_code: false,
            ..Default::default()
        });
        let rendered =
            renderer.render(r#"<pre><code class="language-rust">fn main() {}</code></pre>"#);
        assert_eq!(
            rendered.html,
            r#"<pre><code class="language-rust">fn main() {}</code></pre>"#
        );
    }
}
