//! The editor: state, history and the markup it round-trips through.

use smol_str::SmolStr;
use writeup_common::config::EditorConfig;

use crate::actions::{EditorCommand, KeyCombo};
use crate::document::{Block, BlockKind, Document, EditorState, MarkKind};
use crate::execute::{cursor_marks, execute};
use crate::html;
use crate::types::Selection;
use crate::undo::{History, UndoManager};

/// Toolbar entries, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolbarItem {
    Bold,
    Italic,
    Strike,
    Code,
    Heading(u8),
    BulletList,
    OrderedList,
    Blockquote,
    Link,
    Image,
    Undo,
    Redo,
}

pub const TOOLBAR: &[ToolbarItem] = &[
    ToolbarItem::Bold,
    ToolbarItem::Italic,
    ToolbarItem::Strike,
    ToolbarItem::Code,
    ToolbarItem::Heading(1),
    ToolbarItem::Heading(2),
    ToolbarItem::Heading(3),
    ToolbarItem::BulletList,
    ToolbarItem::OrderedList,
    ToolbarItem::Blockquote,
    ToolbarItem::Link,
    ToolbarItem::Image,
    ToolbarItem::Undo,
    ToolbarItem::Redo,
];

impl ToolbarItem {
    /// The command the button runs. Link and image buttons open a prompt or
    /// a file picker first, so they have none.
    pub fn command(self) -> Option<EditorCommand> {
        Some(match self {
            Self::Bold => EditorCommand::ToggleBold,
            Self::Italic => EditorCommand::ToggleItalic,
            Self::Strike => EditorCommand::ToggleStrike,
            Self::Code => EditorCommand::ToggleCode,
            Self::Heading(level) => EditorCommand::ToggleHeading { level },
            Self::BulletList => EditorCommand::ToggleBulletList,
            Self::OrderedList => EditorCommand::ToggleOrderedList,
            Self::Blockquote => EditorCommand::ToggleBlockquote,
            Self::Undo => EditorCommand::Undo,
            Self::Redo => EditorCommand::Redo,
            Self::Link | Self::Image => return None,
        })
    }

    fn mark(self) -> Option<MarkKind> {
        match self {
            Self::Bold => Some(MarkKind::Bold),
            Self::Italic => Some(MarkKind::Italic),
            Self::Strike => Some(MarkKind::Strike),
            Self::Code => Some(MarkKind::Code),
            Self::Link => Some(MarkKind::Link),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonState {
    pub item: ToolbarItem,
    pub active: bool,
    pub enabled: bool,
}

type Snapshot = (Document, Selection);

/// A rich text editor over the block/run model.
///
/// The document only changes through [`execute`](Self::execute) and
/// [`set_content`](Self::set_content).
#[derive(Debug, Clone)]
pub struct Editor {
    state: EditorState,
    history: History<Snapshot>,
    config: EditorConfig,
    editable: bool,
    /// Last markup handed to [`set_content`](Self::set_content).
    last_external: Option<String>,
}

impl Default for Editor {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

impl Editor {
    pub fn new(config: EditorConfig) -> Self {
        Self {
            state: EditorState::default(),
            history: History::new(config.max_undo_steps),
            config,
            editable: true,
            last_external: None,
        }
    }

    pub fn with_content(html: &str, config: EditorConfig) -> Self {
        let mut editor = Self::new(config);
        editor.state = EditorState::new(html::from_html(html));
        editor.last_external = (!html.is_empty()).then(|| html.to_owned());
        editor
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn state(&self) -> &EditorState {
        &self.state
    }

    pub fn document(&self) -> &Document {
        &self.state.doc
    }

    pub fn selection(&self) -> Selection {
        self.state.selection
    }

    pub fn is_editable(&self) -> bool {
        self.editable
    }

    pub fn set_editable(&mut self, editable: bool) {
        self.editable = editable;
    }

    /// Serialized document.
    pub fn to_html(&self) -> String {
        html::to_html(&self.state.doc, &self.config)
    }

    /// Replace the document with external markup.
    ///
    /// Each distinct value is applied at most once, and never when it parses
    /// to the document already loaded. Markup that differs from
    /// [`to_html`](Self::to_html) only in formatting or attributes the model
    /// does not keep leaves the cursor where it is. Returns true if the
    /// document was replaced.
    pub fn set_content(&mut self, html: &str) -> bool {
        if html.is_empty() || self.last_external.as_deref() == Some(html) {
            return false;
        }
        self.last_external = Some(html.to_owned());

        let doc = html::from_html(html);
        if doc == self.state.doc {
            tracing::trace!("external content matches the document");
            return false;
        }
        let previous = std::mem::replace(&mut self.state, EditorState::new(doc));
        self.history.record((previous.doc, previous.selection));
        tracing::debug!(blocks = self.state.doc.len(), "editor content replaced");
        true
    }

    /// Apply a command. Returns true if it applied.
    pub fn execute(&mut self, command: &EditorCommand) -> bool {
        if !self.editable && command.is_edit() {
            return false;
        }
        match command {
            EditorCommand::Undo => self.undo(),
            EditorCommand::Redo => self.redo(),
            _ => {
                let before = (self.state.doc.clone(), self.state.selection);
                let applied = execute(&mut self.state, command);
                if applied && self.state.doc != before.0 {
                    self.history.record(before);
                }
                applied
            }
        }
    }

    /// Dry run of [`execute`](Self::execute).
    pub fn can(&self, command: &EditorCommand) -> bool {
        if !self.editable && command.is_edit() {
            return false;
        }
        match command {
            EditorCommand::Undo => self.history.can_undo(),
            EditorCommand::Redo => self.history.can_redo(),
            _ => {
                let mut dry_run = self.state.clone();
                execute(&mut dry_run, command)
            }
        }
    }

    /// Run the command bound to a key combination. Returns true if handled.
    pub fn handle_key(&mut self, combo: &KeyCombo) -> bool {
        combo
            .command()
            .is_some_and(|command| self.execute(&command))
    }

    fn undo(&mut self) -> bool {
        let current = (self.state.doc.clone(), self.state.selection);
        match self.history.undo(current) {
            Ok((doc, selection)) => {
                self.restore(doc, selection);
                true
            }
            Err(_) => false,
        }
    }

    fn redo(&mut self) -> bool {
        let current = (self.state.doc.clone(), self.state.selection);
        match self.history.redo(current) {
            Ok((doc, selection)) => {
                self.restore(doc, selection);
                true
            }
            Err(_) => false,
        }
    }

    fn restore(&mut self, doc: Document, selection: Selection) {
        self.state.doc = doc;
        self.state.selection = selection;
        self.state.stored_marks = None;
    }

    fn current_block(&self) -> Option<&Block> {
        self.state.current_block()
    }

    /// Target of the link at the cursor or in the selection.
    pub fn link_href(&self) -> Option<SmolStr> {
        if self.state.selection.is_collapsed() {
            return cursor_marks(&self.state).link.or_else(|| {
                let cursor = self.state.cursor();
                self.state
                    .doc
                    .block(cursor.block)?
                    .link_range_at(cursor.offset)
                    .map(|(_, _, href)| href)
            });
        }
        self.state
            .doc
            .ranges(&self.state.selection)
            .into_iter()
            .find_map(|(index, start, end)| {
                self.state
                    .doc
                    .block(index)?
                    .marks_in(start, end)
                    .find_map(|marks| marks.link.clone())
            })
    }

    fn mark_active(&self, kind: MarkKind) -> bool {
        if kind == MarkKind::Link {
            return self.link_href().is_some();
        }
        if self.state.selection.is_collapsed() {
            return cursor_marks(&self.state).has(kind);
        }
        let mut any = false;
        for (index, start, end) in self.state.doc.ranges(&self.state.selection) {
            let Some(block) = self.state.doc.block(index) else {
                continue;
            };
            if !block.accepts_marks() {
                continue;
            }
            for marks in block.marks_in(start, end) {
                if !marks.has(kind) {
                    return false;
                }
                any = true;
            }
        }
        any
    }

    /// Whether `item` reflects the current selection.
    pub fn is_active(&self, item: ToolbarItem) -> bool {
        if let Some(kind) = item.mark() {
            return self.mark_active(kind);
        }
        let block = self.current_block();
        match item {
            ToolbarItem::Heading(level) => {
                block.is_some_and(|block| block.kind == BlockKind::Heading(level))
            }
            ToolbarItem::BulletList => {
                block.is_some_and(|block| block.wrap == crate::document::Wrap::BulletList)
            }
            ToolbarItem::OrderedList => {
                block.is_some_and(|block| block.wrap == crate::document::Wrap::OrderedList)
            }
            ToolbarItem::Blockquote => {
                block.is_some_and(|block| block.wrap == crate::document::Wrap::Blockquote)
            }
            ToolbarItem::Image => block.is_some_and(|block| matches!(block.kind, BlockKind::Image(_))),
            _ => false,
        }
    }

    pub fn is_enabled(&self, item: ToolbarItem) -> bool {
        match item.command() {
            Some(command) => self.can(&command),
            None if item == ToolbarItem::Link => {
                self.editable && self.current_block().is_some_and(Block::accepts_marks)
            }
            None => self.editable,
        }
    }

    /// State of every toolbar button.
    pub fn toolbar(&self) -> Vec<ButtonState> {
        TOOLBAR
            .iter()
            .map(|&item| ButtonState {
                item,
                active: self.is_active(item),
                enabled: self.is_enabled(item),
            })
            .collect()
    }
}
