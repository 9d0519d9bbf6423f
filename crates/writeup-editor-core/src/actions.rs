//! Editor commands and key bindings.
//!
//! `EditorCommand` is the only way the document changes. Toolbar buttons,
//! key bindings and the upload flow all produce commands.

use smol_str::SmolStr;

use crate::document::{ImageAttrs, MarkKind};
use crate::types::{Position, Selection};

/// All editor commands.
#[derive(Debug, Clone, PartialEq)]
pub enum EditorCommand {
    // === Formatting ===
    ToggleBold,
    ToggleItalic,
    ToggleStrike,
    ToggleCode,
    /// Toggle between a heading of `level` and a paragraph.
    ToggleHeading { level: u8 },
    ToggleBulletList,
    ToggleOrderedList,
    ToggleBlockquote,

    /// Result of the link prompt.
    ///
    /// `None` means the prompt was cancelled and nothing changes. An empty
    /// string removes the link, anything else sets it. Both act on the whole
    /// link under a collapsed cursor.
    SetLink { href: Option<String> },

    // === Insertion ===
    /// Replace the selection with an image.
    InsertImage(ImageAttrs),
    /// Insert an image at `position`, leaving the selection alone.
    InsertImageAt {
        position: Position,
        image: ImageAttrs,
    },
    /// Insert text at the selection, replacing it.
    InsertText(String),
    /// Enter.
    SplitBlock,
    /// Shift+Enter.
    InsertHardBreak,

    // === Deletion ===
    DeleteBackward,
    DeleteForward,

    // === Selection ===
    SetSelection(Selection),
    SelectAll,

    // === History ===
    Undo,
    Redo,
}

impl EditorCommand {
    pub fn toggle_mark(kind: MarkKind) -> Option<Self> {
        match kind {
            MarkKind::Bold => Some(Self::ToggleBold),
            MarkKind::Italic => Some(Self::ToggleItalic),
            MarkKind::Strike => Some(Self::ToggleStrike),
            MarkKind::Code => Some(Self::ToggleCode),
            MarkKind::Link => None,
        }
    }

    /// Whether the command can change the document (and so lands in history).
    pub fn is_edit(&self) -> bool {
        !matches!(
            self,
            Self::SetSelection(_) | Self::SelectAll | Self::Undo | Self::Redo
        )
    }
}

/// Key values for keyboard input.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    /// A character key.
    Character(SmolStr),
    Backspace,
    Delete,
    Enter,
    Tab,
    Escape,
}

impl Key {
    pub fn character(s: impl Into<SmolStr>) -> Self {
        Self::Character(s.into())
    }
}

/// Modifier key state for a key combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Modifiers {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Self = Self {
        ctrl: false,
        alt: false,
        shift: false,
        meta: false,
    };

    pub const CTRL: Self = Self {
        ctrl: true,
        ..Self::NONE
    };

    pub const SHIFT: Self = Self {
        shift: true,
        ..Self::NONE
    };

    pub const META: Self = Self {
        meta: true,
        ..Self::NONE
    };

    /// Cmd on Mac, Ctrl elsewhere.
    pub fn primary(is_mac: bool) -> Self {
        if is_mac { Self::META } else { Self::CTRL }
    }

    fn has_primary(&self) -> bool {
        self.ctrl || self.meta
    }
}

/// A key combination for triggering a command.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyCombo {
    pub key: Key,
    pub modifiers: Modifiers,
}

impl KeyCombo {
    pub fn new(key: Key) -> Self {
        Self {
            key,
            modifiers: Modifiers::NONE,
        }
    }

    pub fn with_modifiers(key: Key, modifiers: Modifiers) -> Self {
        Self { key, modifiers }
    }

    /// The command bound to this combination, if any.
    ///
    /// Plain character keys are left to text input.
    pub fn command(&self) -> Option<EditorCommand> {
        let m = self.modifiers;
        match &self.key {
            Key::Enter if m.shift => Some(EditorCommand::InsertHardBreak),
            Key::Enter => Some(EditorCommand::SplitBlock),
            Key::Backspace => Some(EditorCommand::DeleteBackward),
            Key::Delete => Some(EditorCommand::DeleteForward),
            Key::Character(c) if m.has_primary() && !m.alt => {
                let shift = m.shift;
                match (c.to_ascii_lowercase().as_str(), shift) {
                    ("b", false) => Some(EditorCommand::ToggleBold),
                    ("i", false) => Some(EditorCommand::ToggleItalic),
                    ("e", false) => Some(EditorCommand::ToggleCode),
                    ("s", true) | ("x", true) => Some(EditorCommand::ToggleStrike),
                    ("z", false) => Some(EditorCommand::Undo),
                    ("z", true) | ("y", false) => Some(EditorCommand::Redo),
                    ("a", false) => Some(EditorCommand::SelectAll),
                    ("8", true) => Some(EditorCommand::ToggleBulletList),
                    ("7", true) => Some(EditorCommand::ToggleOrderedList),
                    ("b", true) => Some(EditorCommand::ToggleBlockquote),
                    _ => None,
                }
            }
            Key::Character(c) if m.has_primary() && m.alt => match c.as_str() {
                "1" => Some(EditorCommand::ToggleHeading { level: 1 }),
                "2" => Some(EditorCommand::ToggleHeading { level: 2 }),
                "3" => Some(EditorCommand::ToggleHeading { level: 3 }),
                _ => None,
            },
            _ => None,
        }
    }
}
