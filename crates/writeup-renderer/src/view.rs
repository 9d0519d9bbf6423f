//! A mounted post body together with its outline.

use std::sync::Arc;

use crate::content::{ContentRenderer, RenderedContent};
use crate::toc::{
    ActiveHeadingTracker, HeadingPosition, IntersectionEntry, ScrollRequest, TableOfContents,
    TrackingBand,
};

/// Owns the rendered content of one post and the scroll tracking for it.
///
/// Replacing the content tears down observation of the old headings before
/// the new ones are observed; after [`unmount`](Self::unmount) every batch is
/// ignored.
pub struct ContentView {
    renderer: Arc<ContentRenderer>,
    raw: Option<String>,
    rendered: RenderedContent,
    toc: TableOfContents,
    tracker: ActiveHeadingTracker,
    mounted: bool,
}

impl ContentView {
    pub fn new(renderer: Arc<ContentRenderer>) -> Self {
        let band = TrackingBand::from(&renderer.config().toc);
        Self {
            renderer,
            raw: None,
            rendered: RenderedContent {
                html: String::new(),
                headings: Vec::new(),
            },
            toc: TableOfContents::default(),
            tracker: ActiveHeadingTracker::new(band),
            mounted: true,
        }
    }

    /// Render `raw` if it differs from what is shown. Returns true if it did.
    pub fn set_content(&mut self, raw: &str) -> bool {
        if !self.mounted || self.raw.as_deref() == Some(raw) {
            return false;
        }

        self.tracker.disconnect();
        self.rendered = self.renderer.render(raw);
        self.toc = self.rendered.table_of_contents();
        self.raw = Some(raw.to_owned());
        self.tracker
            .observe(self.toc.entries().iter().map(|entry| entry.id.clone()));
        true
    }

    pub fn html(&self) -> &str {
        &self.rendered.html
    }

    pub fn rendered(&self) -> &RenderedContent {
        &self.rendered
    }

    pub fn table_of_contents(&self) -> &TableOfContents {
        &self.toc
    }

    pub fn active_heading(&self) -> Option<&str> {
        self.tracker.active()
    }

    /// Outline markup with the active entry highlighted.
    pub fn outline_html(&self) -> Option<String> {
        self.toc.render_html(self.tracker.active())
    }

    pub fn on_intersections(&mut self, batch: &[IntersectionEntry]) -> bool {
        self.tracker.on_intersections(batch)
    }

    pub fn on_scroll(&mut self, positions: &[HeadingPosition], viewport_height: f64) -> bool {
        self.tracker.measure(positions, viewport_height)
    }

    pub fn click_heading(&mut self, id: &str) -> Option<ScrollRequest> {
        self.tracker.select(id)
    }

    pub fn unmount(&mut self) {
        self.tracker.disconnect();
        self.mounted = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view() -> ContentView {
        ContentView::new(Arc::new(ContentRenderer::default()))
    }

    fn hit(id: &str, top: f64) -> IntersectionEntry {
        IntersectionEntry {
            id: id.to_owned(),
            is_intersecting: true,
            top,
        }
    }

    #[test]
    fn same_content_is_not_rerendered() {
        let mut view = view();
        assert!(view.set_content("<h2>A</h2>"));
        assert!(!view.set_content("<h2>A</h2>"));
        assert!(view.set_content("<h2>B</h2>"));
        assert_eq!(view.table_of_contents().entries()[0].text, "B");
    }

    #[test]
    fn replacing_content_drops_old_headings() {
        let mut view = view();
        view.set_content("<h2>A</h2><h2>B</h2>");
        view.on_intersections(&[hit("heading-1", 100.0)]);
        assert_eq!(view.active_heading(), Some("heading-1"));

        view.set_content(r#"<h2 id="other">Other</h2>"#);
        assert_eq!(view.active_heading(), None);
        assert!(!view.on_intersections(&[hit("heading-1", 100.0)]));
        assert!(view.on_intersections(&[hit("other", 100.0)]));
    }

    #[test]
    fn unmounted_view_ignores_everything() {
        let mut view = view();
        view.set_content("<h2>A</h2>");
        view.unmount();
        assert!(!view.on_intersections(&[hit("heading-0", 100.0)]));
        assert!(!view.set_content("<h2>B</h2>"));
    }

    #[test]
    fn empty_outline_renders_nothing() {
        let mut view = view();
        view.set_content("<p>no headings here</p>");
        assert_eq!(view.outline_html(), None);
    }

    #[test]
    fn click_highlights_entry_in_outline() {
        let mut view = view();
        view.set_content("<h2>A</h2><h3>B</h3>");
        assert!(view.click_heading("heading-1").is_some());
        let outline = view.outline_html().unwrap();
        assert!(outline.contains(r##"<a href="#heading-1" class="block pl-4 transition-colors border-l-2 -ml-[1px] border-blue-500"##));
    }
}
