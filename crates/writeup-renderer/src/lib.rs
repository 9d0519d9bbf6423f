//! Writeup renderer
//!
//! Turns stored post markup into display markup: sanitization, code
//! highlighting, inline code restyling and the heading outline.
//!

#[cfg(feature = "syntax-highlighting")]
pub mod code_pretty;
pub mod content;
pub mod dom;
pub mod sanitize;
pub mod toc;
pub mod view;

pub use content::{ContentRenderer, RenderedContent};
pub use sanitize::{Sanitizer, sanitize};
pub use toc::{ActiveHeadingTracker, HeadingEntry, TableOfContents};
pub use view::ContentView;
