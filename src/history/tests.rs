//! Unit tests for the history stacks

use crate::history::{History, HistoryConfig, Reversible};

/// Appends to / pops from a log so replay order is observable
#[derive(Debug, Clone, PartialEq)]
struct Push(u32);

impl Reversible<Vec<u32>> for Push {
    fn revert(&self, target: &mut Vec<u32>) -> bool {
        target.pop() == Some(self.0)
    }

    fn apply(&self, target: &mut Vec<u32>) -> bool {
        target.push(self.0);
        true
    }
}

fn record(history: &mut History<Push>, target: &mut Vec<u32>, value: u32, connected: usize) {
    target.push(value);
    history.do_action(Push(value), connected);
}

#[test]
fn test_undo_redo_single() {
    let mut history = History::default();
    let mut log = Vec::new();
    record(&mut history, &mut log, 1, 0);
    record(&mut history, &mut log, 2, 0);

    history.undo(&mut log);
    assert_eq!(log, vec![1]);
    history.redo(&mut log);
    assert_eq!(log, vec![1, 2]);
}

#[test]
fn test_empty_stacks_are_noops() {
    let mut history: History<Push> = History::default();
    let mut log = vec![7];
    history.undo(&mut log);
    history.redo(&mut log);
    assert_eq!(log, vec![7]);
    assert!(!history.can_undo());
    assert!(!history.can_redo());
}

#[test]
fn test_group_undoes_as_one_step() {
    let mut history = History::default();
    let mut log = Vec::new();
    record(&mut history, &mut log, 1, 0);
    record(&mut history, &mut log, 2, 0);
    record(&mut history, &mut log, 3, 0);
    record(&mut history, &mut log, 4, 2);

    history.undo(&mut log);
    // Entries 4, 3 and 2 were reverted in reverse order
    assert_eq!(log, vec![1]);
    assert_eq!(history.undo_stack().len(), 1);
    assert_eq!(history.redo_stack().len(), 3);

    history.redo(&mut log);
    assert_eq!(log, vec![1, 2, 3, 4]);
    let stack: Vec<(u32, usize)> = history
        .undo_stack()
        .iter()
        .map(|e| (e.action.0, e.number_of_connected_actions))
        .collect();
    assert_eq!(stack, vec![(1, 0), (2, 0), (3, 0), (4, 2)]);
}

#[test]
fn test_group_reassembles_over_repeated_cycles() {
    let mut history = History::default();
    let mut log = Vec::new();
    for (value, connected) in [(1, 0), (2, 1), (3, 0), (4, 0), (5, 2)] {
        record(&mut history, &mut log, value, connected);
    }
    let original: Vec<_> = history.undo_stack().iter().cloned().collect();

    for _ in 0..3 {
        history.undo(&mut log);
        history.undo(&mut log);
        assert!(log.is_empty());
        history.redo(&mut log);
        history.redo(&mut log);
        assert_eq!(log, vec![1, 2, 3, 4, 5]);
    }
    let after: Vec<_> = history.undo_stack().iter().cloned().collect();
    assert_eq!(after, original);
}

#[test]
fn test_do_group_marks_last_entry() {
    let mut history = History::default();
    let mut log = vec![1, 2, 3];
    history.do_group(vec![Push(1), Push(2), Push(3)]);
    assert_eq!(history.undo_stack().back().unwrap().number_of_connected_actions, 2);
    history.undo(&mut log);
    assert!(log.is_empty());
    history.do_group(Vec::new());
    assert!(history.can_redo());
}

#[test]
fn test_do_clears_redo() {
    let mut history = History::default();
    let mut log = Vec::new();
    record(&mut history, &mut log, 1, 0);
    history.undo(&mut log);
    assert!(history.can_redo());
    record(&mut history, &mut log, 2, 0);
    assert!(!history.can_redo());
}

#[test]
fn test_capacity_keeps_most_recent() {
    let mut history = History::new(HistoryConfig { max_depth: 100 });
    let mut log = Vec::new();
    for value in 0..150 {
        record(&mut history, &mut log, value, 0);
    }
    assert_eq!(history.undo_stack().len(), 100);
    let kept: Vec<u32> = history.undo_stack().iter().map(|e| e.action.0).collect();
    assert_eq!(kept, (50..150).collect::<Vec<_>>());
}

#[test]
fn test_redo_reapplies_capacity() {
    let mut history = History::new(HistoryConfig { max_depth: 3 });
    let mut log = Vec::new();
    for value in 0..3 {
        record(&mut history, &mut log, value, 0);
    }
    history.undo(&mut log);
    assert_eq!(history.undo_stack().len(), 2);
    history.redo(&mut log);
    assert_eq!(history.undo_stack().len(), 3);
    let kept: Vec<u32> = history.undo_stack().iter().map(|e| e.action.0).collect();
    assert_eq!(kept, vec![0, 1, 2]);
}

#[test]
fn test_truncated_group_stays_one_step() {
    let mut history = History::new(HistoryConfig { max_depth: 3 });
    let mut log = Vec::new();
    record(&mut history, &mut log, 1, 0);
    record(&mut history, &mut log, 2, 1);
    record(&mut history, &mut log, 3, 0);
    // Drops 1, the bottom half of the group headed by 2
    record(&mut history, &mut log, 4, 0);
    let counts: Vec<(u32, usize)> = history
        .undo_stack()
        .iter()
        .map(|e| (e.action.0, e.number_of_connected_actions))
        .collect();
    assert_eq!(counts, vec![(2, 0), (3, 0), (4, 0)]);

    history.undo(&mut log);
    history.undo(&mut log);
    history.undo(&mut log);
    assert_eq!(log, vec![1]);
    assert!(!history.can_undo());

    history.redo(&mut log);
    assert_eq!(log, vec![1, 2]);
    history.redo(&mut log);
    assert_eq!(log, vec![1, 2, 3]);
    history.redo(&mut log);
    assert_eq!(log, vec![1, 2, 3, 4]);
    assert!(!history.can_redo());
}

#[test]
fn test_group_larger_than_capacity_keeps_newest_part() {
    let mut history = History::new(HistoryConfig { max_depth: 3 });
    let mut log = vec![1, 2, 3, 4, 5];
    history.do_group((1..=5).map(Push).collect());
    assert_eq!(history.undo_stack().len(), 3);
    assert_eq!(history.undo_stack().back().unwrap().number_of_connected_actions, 2);

    history.undo(&mut log);
    assert_eq!(log, vec![1, 2]);
    history.redo(&mut log);
    assert_eq!(log, vec![1, 2, 3, 4, 5]);
}

#[test]
fn test_truncation_keeps_nested_groups_intact() {
    let mut history = History::new(HistoryConfig { max_depth: 4 });
    let mut log = Vec::new();
    // Two steps: [1, 2(1)] and [3, 4, 5(2)]
    for (value, connected) in [(1, 0), (2, 1), (3, 0), (4, 0), (5, 2)] {
        record(&mut history, &mut log, value, connected);
    }
    let counts: Vec<usize> = history
        .undo_stack()
        .iter()
        .map(|e| e.number_of_connected_actions)
        .collect();
    assert_eq!(counts, vec![0, 0, 0, 2]);

    history.undo(&mut log);
    assert_eq!(log, vec![1, 2]);
    history.redo(&mut log);
    assert_eq!(log, vec![1, 2, 3, 4, 5]);
}
