//! Undo/redo management for editor operations.
//!
//! Provides:
//! - `UndoManager` trait for abstracting undo implementations
//! - `History<T>` - bounded snapshot stacks

use std::collections::VecDeque;

/// Trait for managing undo/redo operations.
pub trait UndoManager {
    /// Check if undo is available.
    fn can_undo(&self) -> bool;

    /// Check if redo is available.
    fn can_redo(&self) -> bool;

    /// Clear all undo/redo history.
    fn clear_history(&mut self);
}

/// Snapshot history with a bounded undo stack.
///
/// `record` takes the state from before an edit. `undo` and `redo` swap the
/// current state with the top of the respective stack.
#[derive(Debug, Clone)]
pub struct History<T> {
    undo_stack: VecDeque<T>,
    redo_stack: Vec<T>,
    max_steps: usize,
}

impl<T> Default for History<T> {
    fn default() -> Self {
        Self::new(100)
    }
}

impl<T> History<T> {
    pub fn new(max_steps: usize) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: Vec::new(),
            max_steps,
        }
    }

    /// Record the state from before an edit. Clears the redo stack.
    pub fn record(&mut self, before: T) {
        if self.max_steps == 0 {
            return;
        }
        self.redo_stack.clear();
        self.undo_stack.push_back(before);
        while self.undo_stack.len() > self.max_steps {
            self.undo_stack.pop_front();
        }
    }

    /// Step back. Returns the state to restore; `current` goes to redo.
    pub fn undo(&mut self, current: T) -> Result<T, T> {
        match self.undo_stack.pop_back() {
            Some(previous) => {
                self.redo_stack.push(current);
                Ok(previous)
            }
            None => Err(current),
        }
    }

    /// Step forward. Returns the state to restore; `current` goes to undo.
    pub fn redo(&mut self, current: T) -> Result<T, T> {
        match self.redo_stack.pop() {
            Some(next) => {
                self.undo_stack.push_back(current);
                Ok(next)
            }
            None => Err(current),
        }
    }

    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }
}

impl<T> UndoManager for History<T> {
    fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    fn clear_history(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}
