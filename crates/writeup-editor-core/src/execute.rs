//! Command execution.
//!
//! This module provides the `execute` function that applies `EditorCommand`
//! operations to an `EditorState`. Returns true if the command applied.
//! History commands are handled by the editor and are never applicable here.

use crate::actions::EditorCommand;
use crate::document::{Block, BlockKind, EditorState, ImageAttrs, MarkKind, MarkSet, Wrap};
use crate::types::{Position, Selection};

/// Execute a command on the editor state.
///
/// This is the central dispatch point for all editing operations.
pub fn execute(state: &mut EditorState, command: &EditorCommand) -> bool {
    match command {
        EditorCommand::ToggleBold => toggle_mark(state, MarkKind::Bold),
        EditorCommand::ToggleItalic => toggle_mark(state, MarkKind::Italic),
        EditorCommand::ToggleStrike => toggle_mark(state, MarkKind::Strike),
        EditorCommand::ToggleCode => toggle_mark(state, MarkKind::Code),
        EditorCommand::ToggleHeading { level } => toggle_heading(state, *level),
        EditorCommand::ToggleBulletList => toggle_wrap(state, Wrap::BulletList),
        EditorCommand::ToggleOrderedList => toggle_wrap(state, Wrap::OrderedList),
        EditorCommand::ToggleBlockquote => toggle_wrap(state, Wrap::Blockquote),
        EditorCommand::SetLink { href } => set_link(state, href.as_deref()),
        EditorCommand::InsertImage(image) => insert_image(state, image),
        EditorCommand::InsertImageAt { position, image } => {
            insert_image_at(state, *position, image)
        }
        EditorCommand::InsertText(text) => insert_text(state, text),
        EditorCommand::SplitBlock => split_block(state),
        EditorCommand::InsertHardBreak => insert_text(state, "\n"),
        EditorCommand::DeleteBackward => delete_backward(state),
        EditorCommand::DeleteForward => delete_forward(state),
        EditorCommand::SetSelection(selection) => set_selection(state, *selection),
        EditorCommand::SelectAll => {
            let all = Selection::new(state.doc.start(), state.doc.end());
            set_selection(state, all)
        }
        EditorCommand::Undo | EditorCommand::Redo => false,
    }
}

/// Marks typed text at `offset` picks up.
///
/// Links do not extend past their ends.
pub fn inherited_marks(block: &Block, offset: usize) -> MarkSet {
    if !block.accepts_marks() {
        return MarkSet::default();
    }
    let mut marks = block.marks_at(offset);
    if marks.link.is_some() {
        let after = block.marks_in(offset, offset + 1).next();
        let inside = offset > 0 && after.is_some_and(|next| next.link == marks.link);
        if !inside {
            marks.link = None;
        }
    }
    marks
}

/// Marks in effect at the cursor, stored marks included.
pub fn cursor_marks(state: &EditorState) -> MarkSet {
    if let Some(stored) = &state.stored_marks {
        return stored.clone();
    }
    let cursor = state.cursor();
    state
        .doc
        .block(cursor.block)
        .map(|block| inherited_marks(block, cursor.offset))
        .unwrap_or_default()
}

/// Inline code excludes other marks: only code toggling touches code text.
fn mark_applies(kind: MarkKind, marks: &MarkSet) -> bool {
    kind == MarkKind::Code || !marks.code
}

/// Character ranges of the selection inside blocks that take marks.
fn markable_ranges(state: &EditorState) -> Vec<(usize, usize, usize)> {
    state
        .doc
        .ranges(&state.selection)
        .into_iter()
        .filter(|&(index, start, end)| {
            start < end && state.doc.block(index).is_some_and(Block::accepts_marks)
        })
        .collect()
}

fn toggle_mark(state: &mut EditorState, kind: MarkKind) -> bool {
    if state.selection.is_collapsed() {
        if !state.current_block().is_some_and(Block::accepts_marks) {
            return false;
        }
        let mut marks = cursor_marks(state);
        if !mark_applies(kind, &marks) {
            return false;
        }
        let on = !marks.has(kind);
        marks.set(kind, on);
        state.stored_marks = Some(marks);
        return true;
    }

    let ranges = markable_ranges(state);
    let mut any = false;
    let mut all = true;
    for &(index, start, end) in &ranges {
        let Some(block) = state.doc.block(index) else {
            continue;
        };
        for marks in block.marks_in(start, end) {
            if mark_applies(kind, marks) {
                any = true;
                all &= marks.has(kind);
            }
        }
    }
    if !any {
        return false;
    }

    let on = !all;
    for (index, start, end) in ranges {
        if let Some(block) = state.doc.block_mut(index) {
            block.update_marks(start, end, |marks| {
                if mark_applies(kind, marks) {
                    marks.set(kind, on);
                }
            });
        }
    }
    state.stored_marks = None;
    true
}

fn toggle_heading(state: &mut EditorState, level: u8) -> bool {
    if !(1..=6).contains(&level) {
        return false;
    }
    let targets: Vec<usize> = state
        .selection
        .blocks()
        .filter(|&index| {
            state.doc.block(index).is_some_and(|block| {
                matches!(
                    block.kind,
                    BlockKind::Paragraph | BlockKind::Heading(_) | BlockKind::CodeBlock { .. }
                )
            })
        })
        .collect();
    if targets.is_empty() {
        return false;
    }

    let all = targets.iter().all(|&index| {
        state
            .doc
            .block(index)
            .is_some_and(|block| block.kind == BlockKind::Heading(level))
    });
    let kind = if all {
        BlockKind::Paragraph
    } else {
        BlockKind::Heading(level)
    };
    for index in targets {
        if let Some(block) = state.doc.block_mut(index) {
            block.kind = kind.clone();
        }
    }
    true
}

fn toggle_wrap(state: &mut EditorState, wrap: Wrap) -> bool {
    let targets: Vec<usize> = state
        .selection
        .blocks()
        .filter(|&index| index < state.doc.len())
        .collect();
    if targets.is_empty() {
        return false;
    }

    let all = targets.iter().all(|&index| {
        state
            .doc
            .block(index)
            .is_some_and(|block| block.wrap == wrap)
    });
    let wrap = if all { Wrap::None } else { wrap };
    for index in targets {
        if let Some(block) = state.doc.block_mut(index) {
            block.wrap = wrap;
        }
    }
    true
}

/// The ranges a link command acts on: the selection, or the whole link
/// under a collapsed cursor.
fn link_ranges(state: &EditorState) -> Vec<(usize, usize, usize)> {
    if !state.selection.is_collapsed() {
        return markable_ranges(state);
    }
    let cursor = state.cursor();
    state
        .doc
        .block(cursor.block)
        .filter(|block| block.accepts_marks())
        .and_then(|block| block.link_range_at(cursor.offset))
        .map(|(start, end, _)| vec![(cursor.block, start, end)])
        .unwrap_or_default()
}

fn set_link(state: &mut EditorState, href: Option<&str>) -> bool {
    // Prompt cancelled.
    let Some(href) = href else {
        return false;
    };
    let href = href.trim();
    let ranges = link_ranges(state);

    if href.is_empty() {
        let linked = ranges.iter().any(|&(index, start, end)| {
            state
                .doc
                .block(index)
                .is_some_and(|block| block.marks_in(start, end).any(|m| m.link.is_some()))
        });
        if !linked {
            let stored_link = state
                .stored_marks
                .as_ref()
                .is_some_and(|marks| marks.link.is_some());
            if let Some(stored) = state.stored_marks.as_mut() {
                stored.link = None;
            }
            return stored_link;
        }
        for (index, start, end) in ranges {
            if let Some(block) = state.doc.block_mut(index) {
                block.update_marks(start, end, |marks| marks.link = None);
            }
        }
        return true;
    }

    if ranges.is_empty() {
        // Collapsed cursor outside a link: the next typed text is linked.
        if !state.selection.is_collapsed()
            || !state.current_block().is_some_and(Block::accepts_marks)
        {
            return false;
        }
        let mut marks = cursor_marks(state);
        if marks.code {
            return false;
        }
        marks.link = Some(href.into());
        state.stored_marks = Some(marks);
        return true;
    }

    let eligible = ranges.iter().any(|&(index, start, end)| {
        state
            .doc
            .block(index)
            .is_some_and(|block| block.marks_in(start, end).any(|m| !m.code))
    });
    if !eligible {
        return false;
    }
    for (index, start, end) in ranges {
        if let Some(block) = state.doc.block_mut(index) {
            block.update_marks(start, end, |marks| {
                if !marks.code {
                    marks.link = Some(href.into());
                }
            });
        }
    }
    true
}

/// Remove the selected content, collapsing the selection to its start.
///
/// Returns true if anything was removed.
pub(crate) fn delete_selection(state: &mut EditorState) -> bool {
    let (start, end) = (state.selection.start(), state.selection.end());
    if start >= end {
        return false;
    }

    if start.block == end.block {
        let Some(block) = state.doc.block_mut(start.block) else {
            return false;
        };
        if block.is_atomic() {
            if start.offset > 0 || end.offset == 0 {
                return false;
            }
            state.doc.blocks_mut().remove(start.block);
            state.doc.ensure_not_empty();
        } else {
            block.delete(start.offset, end.offset);
        }
        state.set_cursor(start);
        state.stored_marks = None;
        return true;
    }

    let blocks = state.doc.blocks_mut();
    let start_atomic = blocks[start.block].is_atomic();
    let end_atomic = blocks[end.block].is_atomic();
    let mut remove_from = start.block + 1;
    let mut remove_to = end.block;
    if end_atomic && end.offset >= 1 {
        remove_to = end.block + 1;
    }

    let cursor = if !start_atomic {
        let len = blocks[start.block].len();
        blocks[start.block].delete(start.offset, len);
        if !end_atomic {
            let mut tail = blocks[end.block].split_off(end.offset);
            if blocks[start.block].is_code() {
                tail.iter_mut().for_each(|run| run.marks = MarkSet::default());
            }
            blocks[start.block].append_runs(tail);
            remove_to = end.block + 1;
        }
        start
    } else {
        if start.offset == 0 {
            remove_from = start.block;
        }
        if !end_atomic {
            blocks[end.block].delete(0, end.offset);
        }
        Position::new(remove_from, 0)
    };

    blocks.drain(remove_from..remove_to);
    state.doc.ensure_not_empty();
    state.set_cursor(cursor);
    state.stored_marks = None;
    true
}

/// Move the cursor out of an atomic block into a fresh paragraph.
fn text_position(state: &mut EditorState) -> Position {
    let cursor = state.cursor();
    let Some(block) = state.doc.block(cursor.block) else {
        return state.doc.end();
    };
    if !block.is_atomic() {
        return cursor;
    }
    let paragraph = Block::new(BlockKind::Paragraph).with_wrap(block.wrap);
    let at = if cursor.offset == 0 {
        cursor.block
    } else {
        cursor.block + 1
    };
    state.doc.blocks_mut().insert(at, paragraph);
    Position::new(at, 0)
}

fn insert_text(state: &mut EditorState, text: &str) -> bool {
    if text.is_empty() {
        return false;
    }
    delete_selection(state);
    let position = text_position(state);
    let stored = state.stored_marks.take();
    let Some(block) = state.doc.block_mut(position.block) else {
        return false;
    };

    let marks = if block.accepts_marks() {
        stored.unwrap_or_else(|| inherited_marks(block, position.offset))
    } else {
        MarkSet::default()
    };
    block.insert_text(position.offset, text, marks);
    state.set_cursor(Position::new(
        position.block,
        position.offset + text.chars().count(),
    ));
    true
}

fn split_block(state: &mut EditorState) -> bool {
    delete_selection(state);
    let cursor = state.cursor();
    let Some(block) = state.doc.block(cursor.block) else {
        return false;
    };

    if block.is_atomic() {
        let paragraph = Block::new(BlockKind::Paragraph).with_wrap(block.wrap);
        if cursor.offset == 0 {
            state.doc.blocks_mut().insert(cursor.block, paragraph);
            state.set_cursor(Position::new(cursor.block + 1, 0));
        } else {
            state.doc.blocks_mut().insert(cursor.block + 1, paragraph);
            state.set_cursor(Position::new(cursor.block + 1, 0));
        }
        return true;
    }
    if block.is_code() {
        return insert_text(state, "\n");
    }
    // Enter in an empty list item or quote line leaves the container.
    if block.is_empty() && block.wrap != Wrap::None {
        if let Some(block) = state.doc.block_mut(cursor.block) {
            block.wrap = Wrap::None;
        }
        return true;
    }

    let Some(block) = state.doc.block_mut(cursor.block) else {
        return false;
    };
    let tail = block.split_off(cursor.offset);
    let kind = match &block.kind {
        BlockKind::Heading(_) if tail.is_empty() => BlockKind::Paragraph,
        kind => kind.clone(),
    };
    let next = Block::new(kind).with_wrap(block.wrap).with_runs(tail);
    state.doc.blocks_mut().insert(cursor.block + 1, next);
    state.set_cursor(Position::new(cursor.block + 1, 0));
    state.stored_marks = None;
    true
}

/// Append `runs` to block `into`, dropping marks when it is a code block.
fn join_into(state: &mut EditorState, into: usize, from: usize) {
    let blocks = state.doc.blocks_mut();
    let mut runs = std::mem::take(&mut blocks[from].runs);
    if blocks[into].is_code() {
        runs.iter_mut().for_each(|run| run.marks = MarkSet::default());
    }
    blocks[into].append_runs(runs);
    blocks.remove(from);
}

fn delete_backward(state: &mut EditorState) -> bool {
    if !state.selection.is_collapsed() {
        return delete_selection(state);
    }
    let cursor = state.cursor();
    let Some(block) = state.doc.block(cursor.block) else {
        return false;
    };

    if block.is_atomic() && cursor.offset == 1 {
        state.doc.blocks_mut().remove(cursor.block);
        state.doc.ensure_not_empty();
        let cursor = match cursor.block.checked_sub(1) {
            Some(prev) => Position::new(prev, state.doc.block(prev).map_or(0, Block::len)),
            None => Position::new(0, 0),
        };
        state.set_cursor(cursor);
        return true;
    }
    if !block.is_atomic() && cursor.offset > 0 {
        if let Some(block) = state.doc.block_mut(cursor.block) {
            block.delete(cursor.offset - 1, cursor.offset);
        }
        state.set_cursor(Position::new(cursor.block, cursor.offset - 1));
        return true;
    }

    // At the start of the block.
    if block.wrap != Wrap::None {
        if let Some(block) = state.doc.block_mut(cursor.block) {
            block.wrap = Wrap::None;
        }
        return true;
    }
    let Some(prev_index) = cursor.block.checked_sub(1) else {
        if !block.is_atomic() && block.kind != BlockKind::Paragraph {
            if let Some(block) = state.doc.block_mut(cursor.block) {
                block.kind = BlockKind::Paragraph;
            }
            return true;
        }
        return false;
    };

    let is_atomic = block.is_atomic();
    let Some(prev) = state.doc.block(prev_index) else {
        return false;
    };
    if prev.is_atomic() || (is_atomic && prev.is_empty()) {
        state.doc.blocks_mut().remove(prev_index);
        state.set_cursor(Position::new(prev_index, cursor.offset));
        return true;
    }
    if is_atomic {
        return false;
    }

    let prev_len = prev.len();
    join_into(state, prev_index, cursor.block);
    state.set_cursor(Position::new(prev_index, prev_len));
    true
}

fn delete_forward(state: &mut EditorState) -> bool {
    if !state.selection.is_collapsed() {
        return delete_selection(state);
    }
    let cursor = state.cursor();
    let Some(block) = state.doc.block(cursor.block) else {
        return false;
    };

    if block.is_atomic() && cursor.offset == 0 {
        state.doc.blocks_mut().remove(cursor.block);
        state.doc.ensure_not_empty();
        state.set_cursor(Position::new(cursor.block, 0));
        return true;
    }
    if !block.is_atomic() && cursor.offset < block.len() {
        if let Some(block) = state.doc.block_mut(cursor.block) {
            block.delete(cursor.offset, cursor.offset + 1);
        }
        return true;
    }

    // At the end of the block.
    let is_atomic = block.is_atomic();
    let next_index = cursor.block + 1;
    let Some(next) = state.doc.block(next_index) else {
        return false;
    };
    if next.is_atomic() || (is_atomic && next.is_empty()) {
        state.doc.blocks_mut().remove(next_index);
        return true;
    }
    if is_atomic {
        return false;
    }
    join_into(state, cursor.block, next_index);
    true
}

fn set_selection(state: &mut EditorState, selection: Selection) -> bool {
    let selection = Selection::new(
        state.doc.clamp(selection.anchor),
        state.doc.clamp(selection.head),
    );
    if selection == state.selection {
        return false;
    }
    state.selection = selection;
    state.stored_marks = None;
    true
}

/// How a block was placed relative to the host position.
#[derive(Clone, Copy)]
enum Placement {
    /// Inserted at this index, later blocks shifted by one.
    Inserted(usize),
    /// An empty paragraph at this index was replaced.
    Replaced(usize),
    /// The host block was split at `offset`, the new block sits at `block + 1`.
    Split { block: usize, offset: usize },
}

impl Placement {
    fn index(&self) -> usize {
        match *self {
            Self::Inserted(at) | Self::Replaced(at) => at,
            Self::Split { block, .. } => block + 1,
        }
    }

    /// Where a position from before the placement ends up.
    fn map(&self, position: Position) -> Position {
        match *self {
            Self::Inserted(at) if position.block >= at => {
                Position::new(position.block + 1, position.offset)
            }
            Self::Replaced(at) if position.block == at => Position::new(at, 0),
            Self::Split { block, offset } if position.block == block && position.offset >= offset => {
                Position::new(block + 2, position.offset - offset)
            }
            Self::Split { block, .. } if position.block > block => {
                Position::new(position.block + 2, position.offset)
            }
            _ => position,
        }
    }
}

/// Put `new` at `position`, splitting a text block when needed.
fn place_block(state: &mut EditorState, position: Position, new: Block) -> Option<Placement> {
    let blocks = state.doc.blocks_mut();
    let host = blocks.get_mut(position.block)?;
    let new = new.with_wrap(host.wrap);

    let placement = if host.is_atomic() {
        let at = if position.offset == 0 {
            position.block
        } else {
            position.block + 1
        };
        Placement::Inserted(at)
    } else if host.is_empty() && host.kind == BlockKind::Paragraph {
        Placement::Replaced(position.block)
    } else if position.offset == 0 {
        Placement::Inserted(position.block)
    } else if position.offset >= host.len() {
        Placement::Inserted(position.block + 1)
    } else {
        Placement::Split {
            block: position.block,
            offset: position.offset,
        }
    };

    match placement {
        Placement::Inserted(at) => blocks.insert(at, new),
        Placement::Replaced(at) => blocks[at] = new,
        Placement::Split { block, offset } => {
            let host = &mut blocks[block];
            let tail = host.split_off(offset);
            let rest = Block::new(host.kind.clone())
                .with_wrap(host.wrap)
                .with_runs(tail);
            blocks.insert(block + 1, new);
            blocks.insert(block + 2, rest);
        }
    }
    Some(placement)
}

fn insert_image(state: &mut EditorState, image: &ImageAttrs) -> bool {
    if image.src.is_empty() {
        return false;
    }
    delete_selection(state);
    let cursor = state.cursor();
    let Some(placement) = place_block(state, cursor, Block::image(image.clone())) else {
        return false;
    };
    state.set_cursor(Position::new(placement.index(), 1));
    state.stored_marks = None;
    true
}

fn insert_image_at(state: &mut EditorState, position: Position, image: &ImageAttrs) -> bool {
    if image.src.is_empty() || position.block >= state.doc.len() {
        return false;
    }
    let position = state.doc.clamp(position);
    let selection = state.selection;
    let Some(placement) = place_block(state, position, Block::image(image.clone())) else {
        return false;
    };
    state.selection = Selection::new(
        state.doc.clamp(placement.map(selection.anchor)),
        state.doc.clamp(placement.map(selection.head)),
    );
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Document, TextRun};

    fn state(blocks: Vec<Block>) -> EditorState {
        EditorState::new(Document::from_blocks(blocks))
    }

    fn select(state: &mut EditorState, anchor: (usize, usize), head: (usize, usize)) {
        state.selection = Selection::new(
            Position::new(anchor.0, anchor.1),
            Position::new(head.0, head.1),
        );
    }

    fn link(href: &str) -> MarkSet {
        MarkSet {
            link: Some(href.into()),
            ..Default::default()
        }
    }

    #[test]
    fn toggle_bold_adds_then_removes() {
        let mut state = state(vec![Block::paragraph("hello world")]);
        select(&mut state, (0, 0), (0, 5));
        assert!(execute(&mut state, &EditorCommand::ToggleBold));
        assert!(state.doc.blocks()[0].runs[0].marks.bold);
        assert!(execute(&mut state, &EditorCommand::ToggleBold));
        assert_eq!(state.doc.blocks()[0].runs, vec![TextRun::plain("hello world")]);
    }

    #[test]
    fn partially_bold_selection_becomes_bold() {
        let mut state = state(vec![Block::paragraph("abcd")]);
        select(&mut state, (0, 0), (0, 2));
        execute(&mut state, &EditorCommand::ToggleBold);
        select(&mut state, (0, 0), (0, 4));
        execute(&mut state, &EditorCommand::ToggleBold);
        assert_eq!(state.doc.blocks()[0].runs.len(), 1);
        assert!(state.doc.blocks()[0].runs[0].marks.bold);
    }

    #[test]
    fn marks_do_not_apply_in_code_blocks() {
        let mut state = state(vec![
            Block::new(BlockKind::CodeBlock { language: None }).with_runs(vec![TextRun::plain("x = 1")]),
        ]);
        select(&mut state, (0, 0), (0, 5));
        assert!(!execute(&mut state, &EditorCommand::ToggleBold));
        state.selection = Selection::collapsed(Position::new(0, 2));
        assert!(!execute(&mut state, &EditorCommand::ToggleItalic));
    }

    #[test]
    fn collapsed_toggle_sets_stored_marks() {
        let mut state = state(vec![Block::paragraph("ab")]);
        state.selection = Selection::collapsed(Position::new(0, 2));
        assert!(execute(&mut state, &EditorCommand::ToggleItalic));
        assert!(execute(&mut state, &EditorCommand::InsertText("c".into())));
        let runs = &state.doc.blocks()[0].runs;
        assert_eq!(runs[1].text, "c");
        assert!(runs[1].marks.italic);
        assert_eq!(state.stored_marks, None);
    }

    #[test]
    fn heading_toggle_round_trips() {
        let mut state = state(vec![Block::paragraph("Title")]);
        assert!(execute(&mut state, &EditorCommand::ToggleHeading { level: 2 }));
        assert_eq!(state.doc.blocks()[0].kind, BlockKind::Heading(2));
        assert!(execute(&mut state, &EditorCommand::ToggleHeading { level: 2 }));
        assert_eq!(state.doc.blocks()[0].kind, BlockKind::Paragraph);
        assert!(!execute(&mut state, &EditorCommand::ToggleHeading { level: 9 }));
    }

    #[test]
    fn list_toggle_over_selection() {
        let mut state = state(vec![Block::paragraph("a"), Block::paragraph("b")]);
        select(&mut state, (0, 0), (1, 1));
        execute(&mut state, &EditorCommand::ToggleBulletList);
        assert!(state.doc.blocks().iter().all(|b| b.wrap == Wrap::BulletList));
        execute(&mut state, &EditorCommand::ToggleOrderedList);
        assert!(state.doc.blocks().iter().all(|b| b.wrap == Wrap::OrderedList));
        execute(&mut state, &EditorCommand::ToggleOrderedList);
        assert!(state.doc.blocks().iter().all(|b| b.wrap == Wrap::None));
    }

    #[test]
    fn cancelled_link_prompt_changes_nothing() {
        let mut state = state(vec![Block::paragraph("").with_runs(vec![
            TextRun::plain("go "),
            TextRun::marked("here", link("https://a")),
        ])]);
        state.selection = Selection::collapsed(Position::new(0, 5));
        let before = state.clone();
        assert!(!execute(&mut state, &EditorCommand::SetLink { href: None }));
        assert_eq!(state, before);
    }

    #[test]
    fn empty_link_removes_whole_link() {
        let mut state = state(vec![Block::paragraph("").with_runs(vec![
            TextRun::plain("go "),
            TextRun::marked("here", link("https://a")),
        ])]);
        state.selection = Selection::collapsed(Position::new(0, 5));
        assert!(execute(&mut state, &EditorCommand::SetLink { href: Some(String::new()) }));
        assert_eq!(state.doc.blocks()[0].runs, vec![TextRun::plain("go here")]);
    }

    #[test]
    fn url_replaces_whole_link_under_cursor() {
        let mut state = state(vec![Block::paragraph("").with_runs(vec![
            TextRun::plain("go "),
            TextRun::marked("here", link("https://a")),
        ])]);
        state.selection = Selection::collapsed(Position::new(0, 4));
        assert!(execute(
            &mut state,
            &EditorCommand::SetLink {
                href: Some("https://b".into())
            }
        ));
        assert_eq!(
            state.doc.blocks()[0].runs,
            vec![TextRun::plain("go "), TextRun::marked("here", link("https://b"))]
        );
    }

    #[test]
    fn typing_after_a_link_does_not_extend_it() {
        let mut state = state(vec![
            Block::paragraph("").with_runs(vec![TextRun::marked("here", link("https://a"))]),
        ]);
        state.selection = Selection::collapsed(Position::new(0, 4));
        execute(&mut state, &EditorCommand::InsertText("!".into()));
        assert_eq!(
            state.doc.blocks()[0].runs,
            vec![TextRun::marked("here", link("https://a")), TextRun::plain("!")]
        );
    }

    #[test]
    fn enter_splits_and_backspace_joins() {
        let mut state = state(vec![Block::heading(2, "Recon notes")]);
        state.selection = Selection::collapsed(Position::new(0, 5));
        assert!(execute(&mut state, &EditorCommand::SplitBlock));
        assert_eq!(state.doc.len(), 2);
        assert_eq!(state.doc.blocks()[1].kind, BlockKind::Heading(2));
        assert_eq!(state.cursor(), Position::new(1, 0));

        assert!(execute(&mut state, &EditorCommand::DeleteBackward));
        assert_eq!(state.doc.len(), 1);
        assert_eq!(state.doc.blocks()[0].text(), "Recon notes");
        assert_eq!(state.cursor(), Position::new(0, 5));
    }

    #[test]
    fn enter_at_end_of_heading_starts_paragraph() {
        let mut state = state(vec![Block::heading(1, "Intro")]);
        state.selection = Selection::collapsed(Position::new(0, 5));
        execute(&mut state, &EditorCommand::SplitBlock);
        assert_eq!(state.doc.blocks()[1].kind, BlockKind::Paragraph);
    }

    #[test]
    fn enter_in_empty_list_item_leaves_list() {
        let mut state = state(vec![
            Block::paragraph("item").with_wrap(Wrap::BulletList),
            Block::new(BlockKind::Paragraph).with_wrap(Wrap::BulletList),
        ]);
        state.selection = Selection::collapsed(Position::new(1, 0));
        execute(&mut state, &EditorCommand::SplitBlock);
        assert_eq!(state.doc.blocks()[1].wrap, Wrap::None);
        assert_eq!(state.doc.len(), 2);
    }

    #[test]
    fn deleting_across_blocks_merges_the_ends() {
        let mut state = state(vec![
            Block::paragraph("abc"),
            Block::image(ImageAttrs::new("x.png")),
            Block::paragraph("def"),
        ]);
        select(&mut state, (0, 1), (2, 2));
        assert!(execute(&mut state, &EditorCommand::DeleteBackward));
        assert_eq!(state.doc.len(), 1);
        assert_eq!(state.doc.blocks()[0].text(), "af");
        assert_eq!(state.cursor(), Position::new(0, 1));
    }

    #[test]
    fn select_all_then_type_replaces_everything() {
        let mut state = state(vec![
            Block::heading(2, "A"),
            Block::paragraph("B"),
            Block::image(ImageAttrs::new("x.png")),
        ]);
        assert!(execute(&mut state, &EditorCommand::SelectAll));
        assert!(execute(&mut state, &EditorCommand::InsertText("new".into())));
        assert_eq!(state.doc.len(), 1);
        assert_eq!(state.doc.blocks()[0].text(), "new");
    }

    #[test]
    fn image_replaces_selection_in_the_middle_of_text() {
        let mut state = state(vec![Block::paragraph("before after")]);
        select(&mut state, (0, 6), (0, 7));
        assert!(execute(
            &mut state,
            &EditorCommand::InsertImage(ImageAttrs::new("https://cdn/x.png"))
        ));
        let kinds: Vec<_> = state.doc.blocks().iter().map(|b| b.text()).collect();
        assert_eq!(kinds, ["before", "", "after"]);
        assert!(state.doc.blocks()[1].is_atomic());
        assert_eq!(state.cursor(), Position::new(1, 1));
    }

    #[test]
    fn image_fills_empty_paragraph() {
        let mut state = state(vec![Block::new(BlockKind::Paragraph)]);
        execute(&mut state, &EditorCommand::InsertImage(ImageAttrs::new("a.png")));
        assert_eq!(state.doc.len(), 1);
        assert_eq!(
            state.doc.blocks()[0].kind,
            BlockKind::Image(ImageAttrs::new("a.png"))
        );
    }

    #[test]
    fn image_drop_keeps_selection_on_same_text() {
        let mut state = state(vec![Block::paragraph("one"), Block::paragraph("two")]);
        state.selection = Selection::collapsed(Position::new(1, 2));
        assert!(execute(
            &mut state,
            &EditorCommand::InsertImageAt {
                position: Position::new(0, 3),
                image: ImageAttrs::new("a.png"),
            }
        ));
        assert!(state.doc.blocks()[1].is_atomic());
        assert_eq!(state.cursor(), Position::new(2, 2));
        assert!(!execute(
            &mut state,
            &EditorCommand::InsertImageAt {
                position: Position::new(10, 0),
                image: ImageAttrs::new("a.png"),
            }
        ));
    }

    #[test]
    fn backspace_at_start_of_first_heading_clears_it() {
        let mut state = state(vec![Block::heading(1, "T")]);
        assert!(execute(&mut state, &EditorCommand::DeleteBackward));
        assert_eq!(state.doc.blocks()[0].kind, BlockKind::Paragraph);
        assert!(!execute(&mut state, &EditorCommand::DeleteBackward));
    }
}
