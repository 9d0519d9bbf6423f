//! Thin helpers over the kuchikiki tree used by the render passes.

use kuchikiki::traits::TendrilSink;
use kuchikiki::{ElementData, NodeRef};

/// A parsed markup fragment.
///
/// html5ever always builds a full document; the fragment's content is the
/// children of `<body>`.
pub struct Fragment {
    body: NodeRef,
}

impl Fragment {
    pub fn parse(html: &str) -> Self {
        let document = kuchikiki::parse_html().one(html);
        let body = document
            .select_first("body")
            .map(|body| body.as_node().clone())
            .unwrap_or(document);
        Self { body }
    }

    /// The element whose children are the fragment content.
    pub fn root(&self) -> &NodeRef {
        &self.body
    }

    /// Serialize the fragment content back to markup.
    pub fn to_html(&self) -> String {
        inner_html(&self.body)
    }
}

/// Serialized children of `node`, without the node itself.
pub fn inner_html(node: &NodeRef) -> String {
    let mut out = Vec::new();
    for child in node.children() {
        // Writing into a Vec cannot fail.
        child.serialize(&mut out).ok();
    }
    String::from_utf8(out).unwrap_or_default()
}

/// Local tag name of an element node.
pub fn tag_name(node: &NodeRef) -> Option<&str> {
    node.as_element().map(|element| &*element.name.local)
}

pub fn has_ancestor(node: &NodeRef, tag: &str) -> bool {
    node.ancestors().any(|ancestor| tag_name(&ancestor) == Some(tag))
}

pub fn has_class(element: &ElementData, class: &str) -> bool {
    element
        .attributes
        .borrow()
        .get("class")
        .is_some_and(|value| value.split_whitespace().any(|c| c == class))
}

/// Append the classes the element does not carry yet.
///
/// Returns true if the class attribute changed.
pub fn add_classes<S: AsRef<str>>(element: &ElementData, classes: &[S]) -> bool {
    let mut attributes = element.attributes.borrow_mut();
    let mut current: Vec<String> = attributes
        .get("class")
        .map(|value| value.split_whitespace().map(str::to_owned).collect())
        .unwrap_or_default();

    let mut changed = false;
    for class in classes {
        let class = class.as_ref();
        if !class.is_empty() && !current.iter().any(|c| c == class) {
            current.push(class.to_owned());
            changed = true;
        }
    }

    if changed {
        attributes.insert("class", current.join(" "));
    }
    changed
}

/// Text content with runs of whitespace collapsed to single spaces.
pub fn flattened_text(node: &NodeRef) -> String {
    node.text_contents()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Replace all children of `target` with the content of `html`.
pub fn replace_children_with_html(target: &NodeRef, html: &str) {
    let wrapper = Fragment::parse(&format!("<div>{html}</div>"));
    let Some(source) = wrapper.root().first_child() else {
        return;
    };

    for child in target.children().collect::<Vec<_>>() {
        child.detach();
    }
    for child in source.children().collect::<Vec<_>>() {
        target.append(child);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fragment_round_trip_keeps_body_content_only() {
        let fragment = Fragment::parse("<p>Hello <strong>world</strong></p><p>again</p>");
        assert_eq!(
            fragment.to_html(),
            "<p>Hello <strong>world</strong></p><p>again</p>"
        );
    }

    #[test]
    fn add_classes_skips_existing() {
        let fragment = Fragment::parse(r#"<code class="a b">x</code>"#);
        let code = fragment.root().select_first("code").unwrap();
        assert!(add_classes(&code, &["b", "c"]));
        assert!(!add_classes(&code, &["a", "c"]));
        assert_eq!(
            code.attributes.borrow().get("class"),
            Some("a b c")
        );
    }

    #[test]
    fn ancestor_lookup() {
        let fragment = Fragment::parse("<pre><code>x</code></pre><p><code>y</code></p>");
        let codes: Vec<_> = fragment.root().select("code").unwrap().collect();
        assert!(has_ancestor(codes[0].as_node(), "pre"));
        assert!(!has_ancestor(codes[1].as_node(), "pre"));
    }

    #[test]
    fn replacing_children_parses_markup() {
        let fragment = Fragment::parse("<code>old</code>");
        let code = fragment.root().select_first("code").unwrap();
        replace_children_with_html(code.as_node(), r#"<span class="k">fn</span> main"#);
        assert_eq!(
            fragment.to_html(),
            r#"<code><span class="k">fn</span> main</code>"#
        );
    }
}
