//! Syntax highlighting for fenced code blocks.
//!
//! Runs over the sanitized tree: every `pre > code` with a recognised
//! `language-*` class gets its text replaced by classed `<span>`s.

use std::sync::LazyLock;

use kuchikiki::NodeRef;
use syntect::html::{ClassStyle, ClassedHTMLGenerator};
use syntect::parsing::SyntaxSet;
use syntect::util::LinesWithEndings;

use crate::dom;

/// Marker class set on blocks that were already highlighted.
pub const HIGHLIGHTED_CLASS: &str = "highlighted";

/// Prefix of the classes syntect emits, keeps them apart from utility classes.
pub const CLASS_PREFIX: &str = "hl-";

static SYNTAX_SET: LazyLock<SyntaxSet> = LazyLock::new(SyntaxSet::load_defaults_newlines);

/// Highlight `code` as `lang`.
///
/// Returns `Ok(None)` when no syntax is known for `lang`.
pub fn highlight(
    syntax_set: &SyntaxSet,
    lang: &str,
    code: &str,
) -> Result<Option<String>, syntect::Error> {
    let Some(syntax) = syntax_set.find_syntax_by_token(lang) else {
        return Ok(None);
    };

    let mut generator = ClassedHTMLGenerator::new_with_class_style(
        syntax,
        syntax_set,
        ClassStyle::SpacedPrefixed {
            prefix: CLASS_PREFIX,
        },
    );
    for line in LinesWithEndings::from(code) {
        generator.parse_html_for_line_which_includes_newline(line)?;
    }
    Ok(Some(generator.finalize()))
}

/// Language named by a `language-*` or `lang-*` class.
pub fn code_language(code: &NodeRef) -> Option<String> {
    let element = code.as_element()?;
    let attributes = element.attributes.borrow();
    attributes.get("class")?.split_whitespace().find_map(|class| {
        class
            .strip_prefix("language-")
            .or_else(|| class.strip_prefix("lang-"))
            .filter(|lang| !lang.is_empty())
            .map(str::to_owned)
    })
}

/// Highlight every eligible block under `root`, returns how many changed.
pub fn highlight_code_blocks(root: &NodeRef) -> usize {
    highlight_code_blocks_with(&SYNTAX_SET, root)
}

pub fn highlight_code_blocks_with(syntax_set: &SyntaxSet, root: &NodeRef) -> usize {
    let Ok(blocks) = root.select("pre > code") else {
        return 0;
    };
    let blocks: Vec<_> = blocks.collect();

    let mut highlighted = 0;
    for code in blocks {
        if dom::has_class(&code, HIGHLIGHTED_CLASS) {
            continue;
        }
        let Some(lang) = code_language(code.as_node()) else {
            continue;
        };
        let text = code.as_node().text_contents();

        match highlight(syntax_set, &lang, &text) {
            Ok(Some(html)) => {
                dom::replace_children_with_html(code.as_node(), &html);
                dom::add_classes(&code, &[HIGHLIGHTED_CLASS]);
                highlighted += 1;
            }
            Ok(None) => {
                tracing::trace!(lang = %lang, "no syntax for code block");
            }
            Err(e) => {
                // Leave the block as plain text.
                tracing::warn!(lang = %lang, error = %e, "failed to highlight code block");
            }
        }
    }
    highlighted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Fragment;

    #[test]
    fn highlights_known_language() {
        let fragment = Fragment::parse(
            r#"<pre><code class="language-rust">fn main() {}
</code></pre>"#,
        );
        assert_eq!(highlight_code_blocks(fragment.root()), 1);

        let html = fragment.to_html();
        assert!(html.contains("<span class=\"hl-"));
        assert!(html.contains("highlighted"));
        // Text content is preserved.
        let code = fragment.root().select_first("code").unwrap();
        assert_eq!(code.as_node().text_contents(), "fn main() {}\n");
    }

    #[test]
    fn second_pass_is_a_no_op() {
        let fragment = Fragment::parse(r#"<pre><code class="language-python">print(1)</code></pre>"#);
        assert_eq!(highlight_code_blocks(fragment.root()), 1);
        let first = fragment.to_html();
        assert_eq!(highlight_code_blocks(fragment.root()), 0);
        assert_eq!(fragment.to_html(), first);
    }

    #[test]
    fn unknown_or_missing_language_is_left_alone() {
        let input = r#"<pre><code>plain</code></pre><pre><code class="language-nope">x</code></pre>"#;
        let fragment = Fragment::parse(input);
        assert_eq!(highlight_code_blocks(fragment.root()), 0);
        assert_eq!(fragment.to_html(), input);
    }

    #[test]
    fn inline_code_is_not_highlighted() {
        let input = r#"<p><code class="language-rust">let x = 1;</code></p>"#;
        let fragment = Fragment::parse(input);
        assert_eq!(highlight_code_blocks(fragment.root()), 0);
        assert_eq!(fragment.to_html(), input);
    }
}
