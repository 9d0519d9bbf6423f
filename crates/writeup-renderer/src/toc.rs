//! Heading index, outline and active-section tracking.
//!
//! Headings are collected from the rendered tree in the same pass that gives
//! them ids. Scroll tracking works on the resulting id list plus heading
//! geometry supplied by whoever owns the layout.

use std::collections::HashSet;
use std::fmt;

use kuchikiki::NodeRef;
use pulldown_cmark_escape::{escape_href, escape_html};
use serde::Serialize;
use writeup_common::config::TocConfig;

use crate::dom;

/// Tags that make it into the outline.
pub const INDEXED_HEADINGS: &str = "h2, h3";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeadingEntry {
    pub id: String,
    pub text: String,
    /// 2 or 3.
    pub level: u8,
}

/// Give every `h2`/`h3` under `root` an id and return them in document order.
///
/// Existing ids are kept unless an earlier heading already has the same one.
/// A heading without one gets `{id_prefix}{i}`, `i` being its position among
/// the indexed headings. Generated and duplicate ids get `-{n}` appended
/// until they are unused in the tree.
pub fn index_headings(root: &NodeRef, id_prefix: &str) -> Vec<HeadingEntry> {
    let mut taken: HashSet<String> = root
        .select("[id]")
        .map(|nodes| {
            nodes
                .filter_map(|node| node.attributes.borrow().get("id").map(str::to_owned))
                .filter(|id| !id.is_empty())
                .collect()
        })
        .unwrap_or_default();

    let Ok(headings) = root.select(INDEXED_HEADINGS) else {
        return Vec::new();
    };

    let mut heading_ids = HashSet::new();
    let mut entries = Vec::new();
    for (i, heading) in headings.enumerate() {
        let level = match &*heading.name.local {
            "h2" => 2,
            _ => 3,
        };

        let existing = heading
            .attributes
            .borrow()
            .get("id")
            .filter(|id| !id.is_empty())
            .map(str::to_owned);
        let id = match existing {
            Some(id) if !heading_ids.contains(&id) => id,
            existing => {
                let base = existing.unwrap_or_else(|| format!("{id_prefix}{i}"));
                let id = unique_id(&taken, &base);
                heading.attributes.borrow_mut().insert("id", id.clone());
                taken.insert(id.clone());
                id
            }
        };
        heading_ids.insert(id.clone());

        entries.push(HeadingEntry {
            id,
            text: dom::flattened_text(heading.as_node()),
            level,
        });
    }

    tracing::debug!(headings = entries.len(), "indexed headings");
    entries
}

fn unique_id(taken: &HashSet<String>, base: &str) -> String {
    if !taken.contains(base) {
        return base.to_owned();
    }
    (1..)
        .map(|n| format!("{base}-{n}"))
        .find(|candidate| !taken.contains(candidate))
        .unwrap_or_else(|| base.to_owned())
}

/// A line of the rendered outline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutlineItem<'a> {
    pub entry: &'a HeadingEntry,
    /// 0 for `h2`, 1 for `h3`.
    pub depth: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TableOfContents {
    entries: Vec<HeadingEntry>,
}

impl TableOfContents {
    pub fn new(entries: Vec<HeadingEntry>) -> Self {
        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[HeadingEntry] {
        &self.entries
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.iter().any(|entry| entry.id == id)
    }

    pub fn outline(&self) -> impl Iterator<Item = OutlineItem<'_>> {
        self.entries.iter().map(|entry| OutlineItem {
            entry,
            depth: usize::from(entry.level > 2),
        })
    }

    /// The "On this page" navigation, or `None` when there are no headings.
    pub fn render_html(&self, active: Option<&str>) -> Option<String> {
        if self.is_empty() {
            return None;
        }

        let mut out = String::from(
            "<nav class=\"space-y-1\">\
             <h4 class=\"text-sm font-semibold text-gray-400 uppercase tracking-wider mb-4\">On this page</h4>\
             <ul class=\"space-y-2 text-sm border-l border-gray-800\">",
        );
        for item in self.outline() {
            let mut class = String::from("block pl-4 transition-colors border-l-2 -ml-[1px] ");
            if active == Some(item.entry.id.as_str()) {
                class.push_str("border-blue-500 text-blue-400 font-medium");
            } else {
                class.push_str(
                    "border-transparent text-gray-500 hover:text-gray-300 hover:border-gray-700",
                );
            }
            if item.depth > 0 {
                class.push_str(" ml-4");
            }

            write_item(&mut out, item.entry, &class).ok()?;
        }
        out.push_str("</ul></nav>");
        Some(out)
    }
}

fn write_item(out: &mut String, entry: &HeadingEntry, class: &str) -> fmt::Result {
    out.push_str("<li><a href=\"#");
    escape_href(&mut *out, &entry.id)?;
    out.push_str("\" class=\"");
    out.push_str(class);
    out.push_str("\">");
    escape_html(&mut *out, &entry.text)?;
    out.push_str("</a></li>");
    Ok(())
}

/// The part of the viewport that counts as "being read".
///
/// `top_margin_px` is cut from the top, `bottom_fraction` of the viewport
/// height from the bottom.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackingBand {
    pub top_margin_px: f64,
    pub bottom_fraction: f64,
}

impl Default for TrackingBand {
    fn default() -> Self {
        Self::from(&TocConfig::default())
    }
}

impl From<&TocConfig> for TrackingBand {
    fn from(config: &TocConfig) -> Self {
        Self {
            top_margin_px: config.top_margin_px,
            bottom_fraction: config.bottom_fraction,
        }
    }
}

impl TrackingBand {
    /// Top and bottom edge in viewport coordinates.
    pub fn bounds(&self, viewport_height: f64) -> (f64, f64) {
        let top = self.top_margin_px;
        let bottom = viewport_height * (1.0 - self.bottom_fraction);
        (top, bottom)
    }

    pub fn intersects(&self, viewport_height: f64, top: f64, bottom: f64) -> bool {
        let (band_top, band_bottom) = self.bounds(viewport_height);
        band_top < band_bottom && top < band_bottom && bottom > band_top
    }
}

/// One observation in an intersection batch.
#[derive(Debug, Clone, PartialEq)]
pub struct IntersectionEntry {
    pub id: String,
    pub is_intersecting: bool,
    /// Top edge of the heading in viewport coordinates.
    pub top: f64,
}

/// Heading geometry in viewport coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct HeadingPosition {
    pub id: String,
    pub top: f64,
    pub bottom: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollBehavior {
    Smooth,
    Instant,
}

/// Request for the host to bring a heading into view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrollRequest {
    pub id: String,
    pub behavior: ScrollBehavior,
}

/// Tracks which heading is being read.
///
/// Observation starts with [`observe`](Self::observe) and ends with
/// [`disconnect`](Self::disconnect); batches arriving while disconnected are
/// dropped.
#[derive(Debug, Clone, Default)]
pub struct ActiveHeadingTracker {
    band: TrackingBand,
    observed: Vec<String>,
    connected: bool,
    active: Option<String>,
}

impl ActiveHeadingTracker {
    pub fn new(band: TrackingBand) -> Self {
        Self {
            band,
            ..Default::default()
        }
    }

    pub fn band(&self) -> TrackingBand {
        self.band
    }

    pub fn observe(&mut self, ids: impl IntoIterator<Item = String>) {
        self.observed = ids.into_iter().collect();
        self.connected = true;
        let still_observed = self
            .active
            .as_ref()
            .is_some_and(|active| self.observed.contains(active));
        if !still_observed {
            self.active = None;
        }
    }

    pub fn disconnect(&mut self) {
        self.observed.clear();
        self.connected = false;
    }

    pub fn is_observing(&self) -> bool {
        self.connected
    }

    pub fn active(&self) -> Option<&str> {
        self.active.as_deref()
    }

    /// Apply an intersection batch.
    ///
    /// Among the intersecting entries the one closest to the band's top edge
    /// becomes active. Batches with nothing intersecting keep the current
    /// heading. Returns true if the active heading changed.
    pub fn on_intersections(&mut self, batch: &[IntersectionEntry]) -> bool {
        if !self.connected {
            return false;
        }

        let band_top = self.band.top_margin_px;
        let winner = batch
            .iter()
            .filter(|entry| entry.is_intersecting && self.observed.contains(&entry.id))
            .min_by(|a, b| {
                (a.top - band_top)
                    .abs()
                    .total_cmp(&(b.top - band_top).abs())
            });

        match winner {
            Some(entry) if self.active.as_deref() != Some(entry.id.as_str()) => {
                tracing::trace!(id = %entry.id, "active heading changed");
                self.active = Some(entry.id.clone());
                true
            }
            _ => false,
        }
    }

    /// Turn measured heading geometry into an intersection batch and apply it.
    pub fn measure(&mut self, positions: &[HeadingPosition], viewport_height: f64) -> bool {
        let batch: Vec<_> = positions
            .iter()
            .map(|position| IntersectionEntry {
                id: position.id.clone(),
                is_intersecting: self.band.intersects(
                    viewport_height,
                    position.top,
                    position.bottom,
                ),
                top: position.top,
            })
            .collect();
        self.on_intersections(&batch)
    }

    /// Outline click: mark the heading active right away and ask for a
    /// smooth scroll. Unknown ids are ignored.
    pub fn select(&mut self, id: &str) -> Option<ScrollRequest> {
        if !self.observed.iter().any(|observed| observed == id) {
            return None;
        }
        self.active = Some(id.to_owned());
        Some(ScrollRequest {
            id: id.to_owned(),
            behavior: ScrollBehavior::Smooth,
        })
    }
}
