//! Block/run document model.
//!
//! A document is a flat list of blocks. Each block carries a kind, the
//! container it sits in (list or blockquote) and its inline content as runs
//! of text sharing one mark set. A `'\n'` inside a non-code block is a hard
//! line break.

use smol_str::SmolStr;

use crate::types::{Position, Selection};

/// Inline formatting kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MarkKind {
    Bold,
    Italic,
    Strike,
    Code,
    Link,
}

/// The marks carried by a run of text.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct MarkSet {
    pub bold: bool,
    pub italic: bool,
    pub strike: bool,
    pub code: bool,
    /// Link target.
    pub link: Option<SmolStr>,
}

impl MarkSet {
    pub fn has(&self, kind: MarkKind) -> bool {
        match kind {
            MarkKind::Bold => self.bold,
            MarkKind::Italic => self.italic,
            MarkKind::Strike => self.strike,
            MarkKind::Code => self.code,
            MarkKind::Link => self.link.is_some(),
        }
    }

    /// Turn a mark off, or on for everything except links.
    ///
    /// Inline code excludes every other mark, so switching it on clears them.
    pub fn set(&mut self, kind: MarkKind, on: bool) {
        match kind {
            MarkKind::Bold => self.bold = on,
            MarkKind::Italic => self.italic = on,
            MarkKind::Strike => self.strike = on,
            MarkKind::Code => {
                if on {
                    *self = Self {
                        code: true,
                        ..Default::default()
                    };
                } else {
                    self.code = false;
                }
            }
            MarkKind::Link => {
                if !on {
                    self.link = None;
                }
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// A run of text with uniform marks.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TextRun {
    pub text: String,
    pub marks: MarkSet,
}

impl TextRun {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            marks: MarkSet::default(),
        }
    }

    pub fn marked(text: impl Into<String>, marks: MarkSet) -> Self {
        Self {
            text: text.into(),
            marks,
        }
    }

    /// Length in characters.
    pub fn len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ImageAttrs {
    pub src: String,
    pub alt: Option<String>,
    pub title: Option<String>,
}

impl ImageAttrs {
    pub fn new(src: impl Into<String>) -> Self {
        Self {
            src: src.into(),
            alt: None,
            title: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BlockKind {
    Paragraph,
    /// Level 1 to 6.
    Heading(u8),
    CodeBlock { language: Option<SmolStr> },
    Image(ImageAttrs),
    Rule,
}

/// Container a block sits in.
///
/// Nested containers are flattened to the innermost one.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Wrap {
    #[default]
    None,
    BulletList,
    OrderedList,
    Blockquote,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Block {
    pub kind: BlockKind,
    pub wrap: Wrap,
    pub runs: Vec<TextRun>,
}

fn byte_index(text: &str, char_offset: usize) -> usize {
    text.char_indices()
        .nth(char_offset)
        .map(|(i, _)| i)
        .unwrap_or(text.len())
}

impl Block {
    pub fn new(kind: BlockKind) -> Self {
        Self {
            kind,
            wrap: Wrap::None,
            runs: Vec::new(),
        }
    }

    pub fn paragraph(text: impl Into<String>) -> Self {
        Self::new(BlockKind::Paragraph).with_runs(vec![TextRun::plain(text)])
    }

    pub fn heading(level: u8, text: impl Into<String>) -> Self {
        Self::new(BlockKind::Heading(level)).with_runs(vec![TextRun::plain(text)])
    }

    pub fn image(attrs: ImageAttrs) -> Self {
        Self::new(BlockKind::Image(attrs))
    }

    pub fn with_runs(mut self, runs: Vec<TextRun>) -> Self {
        self.runs = runs;
        self.normalize();
        self
    }

    pub fn with_wrap(mut self, wrap: Wrap) -> Self {
        self.wrap = wrap;
        self
    }

    /// Images and rules: no inline content, length 1.
    pub fn is_atomic(&self) -> bool {
        matches!(self.kind, BlockKind::Image(_) | BlockKind::Rule)
    }

    pub fn is_code(&self) -> bool {
        matches!(self.kind, BlockKind::CodeBlock { .. })
    }

    /// Whether inline marks may be applied inside this block.
    pub fn accepts_marks(&self) -> bool {
        matches!(self.kind, BlockKind::Paragraph | BlockKind::Heading(_))
    }

    pub fn len(&self) -> usize {
        if self.is_atomic() {
            1
        } else {
            self.runs.iter().map(TextRun::len).sum()
        }
    }

    pub fn is_empty(&self) -> bool {
        !self.is_atomic() && self.runs.iter().all(TextRun::is_empty)
    }

    pub fn text(&self) -> String {
        self.runs.iter().map(|run| run.text.as_str()).collect()
    }

    /// Drop empty runs and merge neighbours with equal marks.
    pub fn normalize(&mut self) {
        let mut merged: Vec<TextRun> = Vec::with_capacity(self.runs.len());
        for run in self.runs.drain(..) {
            if run.is_empty() {
                continue;
            }
            match merged.last_mut() {
                Some(last) if last.marks == run.marks => last.text.push_str(&run.text),
                _ => merged.push(run),
            }
        }
        self.runs = merged;
    }

    /// Make sure a run starts at `offset`, returns that run's index.
    fn split_at(&mut self, offset: usize) -> usize {
        let mut start = 0;
        for i in 0..self.runs.len() {
            if offset == start {
                return i;
            }
            let len = self.runs[i].len();
            if offset < start + len {
                let at = byte_index(&self.runs[i].text, offset - start);
                let tail = self.runs[i].text.split_off(at);
                let marks = self.runs[i].marks.clone();
                self.runs.insert(i + 1, TextRun { text: tail, marks });
                return i + 1;
            }
            start += len;
        }
        self.runs.len()
    }

    pub fn insert_text(&mut self, offset: usize, text: &str, marks: MarkSet) {
        if text.is_empty() || self.is_atomic() {
            return;
        }
        let i = self.split_at(offset);
        self.runs.insert(i, TextRun::marked(text, marks));
        self.normalize();
    }

    pub fn delete(&mut self, start: usize, end: usize) {
        if start >= end || self.is_atomic() {
            return;
        }
        let a = self.split_at(start);
        let b = self.split_at(end);
        self.runs.drain(a..b);
        self.normalize();
    }

    /// Remove and return everything from `offset` on.
    pub fn split_off(&mut self, offset: usize) -> Vec<TextRun> {
        if self.is_atomic() {
            return Vec::new();
        }
        let i = self.split_at(offset);
        let tail = self.runs.split_off(i);
        self.normalize();
        tail
    }

    pub fn append_runs(&mut self, runs: Vec<TextRun>) {
        self.runs.extend(runs);
        self.normalize();
    }

    /// Run `f` on the marks of every character in `start..end`.
    pub fn update_marks(&mut self, start: usize, end: usize, f: impl Fn(&mut MarkSet)) {
        if start >= end || self.is_atomic() {
            return;
        }
        let a = self.split_at(start);
        let b = self.split_at(end);
        for run in &mut self.runs[a..b] {
            f(&mut run.marks);
        }
        self.normalize();
    }

    /// Marks of each character slice overlapping `start..end`.
    pub fn marks_in(&self, start: usize, end: usize) -> impl Iterator<Item = &MarkSet> {
        let mut run_start = 0;
        self.runs.iter().filter_map(move |run| {
            let run_end = run_start + run.len();
            let overlaps = run_start < end && run_end > start;
            run_start = run_end;
            overlaps.then_some(&run.marks)
        })
    }

    /// Marks the character before `offset` carries, or the first one at 0.
    pub fn marks_at(&self, offset: usize) -> MarkSet {
        let previous = offset.saturating_sub(1);
        self.marks_in(previous, previous + 1)
            .next()
            .cloned()
            .unwrap_or_default()
    }

    /// Character range of the link touching `offset`, with its target.
    pub fn link_range_at(&self, offset: usize) -> Option<(usize, usize, SmolStr)> {
        let mut spans = Vec::new();
        let mut start = 0;
        for run in &self.runs {
            let end = start + run.len();
            spans.push((start, end, run.marks.link.clone()));
            start = end;
        }

        let hit = spans
            .iter()
            .position(|(s, e, link)| link.is_some() && *s < offset.max(1) && *e >= offset)
            .or_else(|| {
                spans
                    .iter()
                    .position(|(s, _, link)| link.is_some() && *s == offset)
            })?;
        let href = spans[hit].2.clone()?;

        let mut first = hit;
        while first > 0 && spans[first - 1].2.as_ref() == Some(&href) {
            first -= 1;
        }
        let mut last = hit;
        while last + 1 < spans.len() && spans[last + 1].2.as_ref() == Some(&href) {
            last += 1;
        }
        Some((spans[first].0, spans[last].1, href))
    }
}

/// An ordered list of blocks, never empty.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Document {
    blocks: Vec<Block>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        Self {
            blocks: vec![Block::new(BlockKind::Paragraph)],
        }
    }

    pub fn from_blocks(blocks: Vec<Block>) -> Self {
        let mut doc = Self { blocks };
        doc.ensure_not_empty();
        doc
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub(crate) fn blocks_mut(&mut self) -> &mut Vec<Block> {
        &mut self.blocks
    }

    pub fn block(&self, index: usize) -> Option<&Block> {
        self.blocks.get(index)
    }

    pub(crate) fn block_mut(&mut self, index: usize) -> Option<&mut Block> {
        self.blocks.get_mut(index)
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// True for a document holding a single empty paragraph.
    pub fn is_empty(&self) -> bool {
        self.blocks.len() == 1
            && self.blocks[0].kind == BlockKind::Paragraph
            && self.blocks[0].is_empty()
    }

    pub(crate) fn ensure_not_empty(&mut self) {
        if self.blocks.is_empty() {
            self.blocks.push(Block::new(BlockKind::Paragraph));
        }
    }

    pub fn start(&self) -> Position {
        Position::new(0, 0)
    }

    pub fn end(&self) -> Position {
        let last = self.blocks.len().saturating_sub(1);
        Position::new(last, self.blocks.get(last).map_or(0, Block::len))
    }

    /// Nearest valid position.
    pub fn clamp(&self, position: Position) -> Position {
        match self.blocks.get(position.block) {
            Some(block) => Position::new(position.block, position.offset.min(block.len())),
            None => self.end(),
        }
    }

    /// `(block, start, end)` character ranges covered by `selection`.
    pub fn ranges(&self, selection: &Selection) -> Vec<(usize, usize, usize)> {
        let (start, end) = (selection.start(), selection.end());
        selection
            .blocks()
            .filter_map(|index| {
                let block = self.blocks.get(index)?;
                let from = if index == start.block { start.offset } else { 0 };
                let to = if index == end.block {
                    end.offset
                } else {
                    block.len()
                };
                Some((index, from.min(block.len()), to.min(block.len())))
            })
            .collect()
    }

    pub fn plain_text(&self) -> String {
        self.blocks
            .iter()
            .map(Block::text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Everything a command can change.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EditorState {
    pub doc: Document,
    pub selection: Selection,
    /// Marks for the next typed text, set by toggling with a collapsed cursor.
    pub stored_marks: Option<MarkSet>,
}

impl EditorState {
    pub fn new(doc: Document) -> Self {
        Self {
            doc,
            selection: Selection::default(),
            stored_marks: None,
        }
    }

    pub fn cursor(&self) -> Position {
        self.selection.head
    }

    pub fn set_cursor(&mut self, position: Position) {
        self.selection = Selection::collapsed(self.doc.clamp(position));
    }

    pub fn current_block(&self) -> Option<&Block> {
        self.doc.block(self.selection.start().block)
    }
}
