//! Undo/Redo History
//!
//! Two stacks of recorded actions, most recent at the back. An entry may be
//! the head of a group: `number_of_connected_actions` further entries below
//! it belong to the same user-visible step and are undone/redone with it.
//!
//! ```text
//! do(a) do(b) do(c, connected = 2)
//! ┌──────────────────────────────────────┐
//! │ Undo: [a, b, c(2)]   Redo: []         │
//! └──────────────────────────────────────┘
//! undo()   reverts c, b, a in that order
//! ┌──────────────────────────────────────┐
//! │ Undo: []   Redo: [b, a, c(2)]         │
//! └──────────────────────────────────────┘
//! redo()   applies a, b, c in that order
//! ┌──────────────────────────────────────┐
//! │ Undo: [a, b, c(2)]   Redo: []         │
//! └──────────────────────────────────────┘
//! ```
//!
//! The history knows nothing about what an action does; actions implement
//! [`Reversible`] against some target.

use std::collections::VecDeque;

pub mod commands;

#[cfg(test)]
mod tests;

pub use commands::Command;

/// An action that can be reverted and re-applied against `T`
pub trait Reversible<T> {
    /// Undo the action's effect
    fn revert(&self, target: &mut T) -> bool;
    /// Re-apply the action's effect
    fn apply(&self, target: &mut T) -> bool;
}

/// Configuration for the history.
#[derive(Debug, Clone)]
pub struct HistoryConfig {
    /// Maximum number of entries kept on either stack.
    pub max_depth: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self { max_depth: 100 }
    }
}

/// One recorded action
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry<A> {
    pub action: A,
    /// Entries directly below this one that belong to the same step
    pub number_of_connected_actions: usize,
}

/// Undo/redo stacks over actions of type `A`
#[derive(Debug, Clone)]
pub struct History<A> {
    undo_stack: VecDeque<HistoryEntry<A>>,
    redo_stack: VecDeque<HistoryEntry<A>>,
    config: HistoryConfig,
}

impl<A> Default for History<A> {
    fn default() -> Self {
        Self::new(HistoryConfig::default())
    }
}

/// Drop the oldest entries beyond `max_depth`. A group cut by the drop
/// keeps only the part still on the stack, so no head counts more steps
/// than actually sit below it.
fn truncate<A>(stack: &mut VecDeque<HistoryEntry<A>>, max_depth: usize) {
    if stack.len() <= max_depth {
        return;
    }
    let excess = stack.len() - max_depth;
    stack.drain(..excess);

    // Complete steps below the current entry, oldest first
    let mut steps = 0;
    for entry in stack.iter_mut() {
        entry.number_of_connected_actions = entry.number_of_connected_actions.min(steps);
        steps = steps - entry.number_of_connected_actions + 1;
    }
}

impl<A> History<A> {
    pub fn new(config: HistoryConfig) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: VecDeque::new(),
            config,
        }
    }

    // ========================================================================
    // Core Operations
    // ========================================================================

    /// Record an already-performed action. Clears the redo stack.
    pub fn do_action(&mut self, action: A, number_of_connected_actions: usize) {
        self.redo_stack.clear();
        self.push_undo(HistoryEntry {
            action,
            number_of_connected_actions,
        });
    }

    /// Record a group of already-performed actions, in the order they were
    /// performed, as a single step. The last one heads the group.
    pub fn do_group(&mut self, actions: Vec<A>) {
        let connected = actions.len().saturating_sub(1);
        let last = actions.len().saturating_sub(1);
        for (i, action) in actions.into_iter().enumerate() {
            self.do_action(action, if i == last { connected } else { 0 });
        }
    }

    /// Revert the most recent step. No-op on an empty stack.
    pub fn undo<T>(&mut self, target: &mut T)
    where
        A: Reversible<T>,
    {
        let Some(entry) = self.undo_stack.pop_back() else {
            return;
        };
        entry.action.revert(target);
        for _ in 0..entry.number_of_connected_actions {
            self.undo(target);
        }
        self.push_redo(entry);
    }

    /// Re-apply the most recently undone step. No-op on an empty stack.
    ///
    /// The connected entries are re-applied before the group head, so a
    /// group replays in the order it was originally performed.
    pub fn redo<T>(&mut self, target: &mut T)
    where
        A: Reversible<T>,
    {
        let Some(entry) = self.redo_stack.pop_back() else {
            return;
        };
        for _ in 0..entry.number_of_connected_actions {
            self.redo(target);
        }
        entry.action.apply(target);
        self.push_undo(entry);
    }

    // ========================================================================
    // Stack management
    // ========================================================================

    fn push_undo(&mut self, entry: HistoryEntry<A>) {
        self.undo_stack.push_back(entry);
        truncate(&mut self.undo_stack, self.config.max_depth);
    }

    fn push_redo(&mut self, entry: HistoryEntry<A>) {
        self.redo_stack.push_back(entry);
        truncate(&mut self.redo_stack, self.config.max_depth);
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Undo entries, oldest first
    pub fn undo_stack(&self) -> &VecDeque<HistoryEntry<A>> {
        &self.undo_stack
    }

    /// Redo entries, oldest first
    pub fn redo_stack(&self) -> &VecDeque<HistoryEntry<A>> {
        &self.redo_stack
    }

    pub fn config(&self) -> &HistoryConfig {
        &self.config
    }
}
