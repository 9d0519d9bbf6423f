//! Markup sanitizer for stored post content.
//!
//! Stored content is untrusted no matter who wrote it. Everything passes
//! through [`Sanitizer::sanitize`] before it reaches the renderer.

use std::sync::LazyLock;

use ammonia::Builder;

/// Embed elements allowed on top of the standard tag set.
pub const EMBED_TAGS: &[&str] = &["iframe"];

/// Attributes an embed keeps. Everything else on an `iframe` is dropped.
pub const EMBED_ATTRIBUTES: &[&str] = &[
    "src",
    "width",
    "height",
    "title",
    "allow",
    "allowfullscreen",
    "frameborder",
    "scrolling",
    "sandbox",
    "loading",
    "referrerpolicy",
];

/// Kept on every element: heading ids and highlighting classes depend on them.
const GENERIC_ATTRIBUTES: &[&str] = &["id", "class"];

static DEFAULT_SANITIZER: LazyLock<Sanitizer> = LazyLock::new(Sanitizer::new);

/// Sanitize with the default allow-list.
pub fn sanitize(raw: &str) -> String {
    DEFAULT_SANITIZER.sanitize(raw)
}

/// Allow-list based sanitizer.
///
/// Standard formatting markup is kept, `script`/`style` are removed together
/// with their content, event handler attributes and non-http(s)/mailto URLs are
/// stripped. Output is stable: sanitizing it again returns it unchanged.
pub struct Sanitizer {
    builder: Builder<'static>,
}

impl Default for Sanitizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Sanitizer {
    pub fn new() -> Self {
        let mut builder = Builder::default();
        builder
            .add_tags(EMBED_TAGS)
            .add_tag_attributes("iframe", EMBED_ATTRIBUTES)
            .add_tag_attributes("a", &["target"])
            .add_generic_attributes(GENERIC_ATTRIBUTES);
        Self { builder }
    }

    pub fn sanitize(&self, raw: &str) -> String {
        let clean = self.builder.clean(raw).to_string();
        if clean.len() != raw.len() {
            tracing::trace!(before = raw.len(), after = clean.len(), "sanitizer altered markup");
        }
        clean
    }
}
