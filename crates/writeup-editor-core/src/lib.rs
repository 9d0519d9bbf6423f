//! writeup-editor-core: rich text editing for writeup posts, without a UI.
//!
//! This crate provides:
//! - `Document` - flat block list with marked text runs
//! - `EditorCommand` and `execute` - every way the document changes
//! - `Editor` - commands plus undo history, toolbar state and HTML round-trip
//! - `ImageUploader` - upload-then-insert flow for attached images
//! - `import_markdown` - markdown to editor markup

pub mod actions;
pub mod document;
pub mod editor;
pub mod execute;
pub mod html;
pub mod image_upload;
pub mod import;
pub mod platform;
pub mod types;
pub mod undo;

pub use actions::{EditorCommand, Key, KeyCombo, Modifiers};
pub use document::{
    Block, BlockKind, Document, EditorState, ImageAttrs, MarkKind, MarkSet, TextRun, Wrap,
};
pub use editor::{ButtonState, Editor, TOOLBAR, ToolbarItem};
pub use image_upload::{
    EditorHandle, ImageFile, ImageInsertError, ImageUploader, InsertOutcome, InsertTarget,
    UPLOAD_FAILED_MESSAGE,
};
pub use import::{ImportError, MarkdownImport, import_markdown, import_markdown_file};
pub use platform::{CollectingNotifier, FixedPosition, Notifier, PositionResolver};
pub use smol_str::SmolStr;
pub use types::{Position, Selection};
pub use undo::{History, UndoManager};
