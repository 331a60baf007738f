//! Undo history for bulk document operations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::TaskId;

/// One task's document list as it was before a bulk operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListSnapshot {
    /// Owning task.
    pub task_id: TaskId,
    /// The list, in order.
    pub documents: Vec<String>,
}

/// Everything one bulk operation may have changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UndoEntry {
    /// Which operation captured the entry, e.g. `"delete"`.
    pub operation: String,
    /// When it was captured.
    pub taken_at: DateTime<Utc>,
    /// Captured lists, one per affected task.
    pub lists: Vec<ListSnapshot>,
}

/// LIFO stack of [`UndoEntry`]s. There is no redo.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UndoStack {
    entries: Vec<UndoEntry>,
}

impl UndoStack {
    /// An empty stack.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pushes an entry on top. Earlier entries stay.
    pub fn push(&mut self, entry: UndoEntry) {
        self.entries.push(entry);
    }

    /// Removes and returns the most recent entry.
    pub fn pop(&mut self) -> Option<UndoEntry> {
        self.entries.pop()
    }

    /// The most recent entry.
    #[must_use]
    pub fn peek(&self) -> Option<&UndoEntry> {
        self.entries.last()
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there is nothing to undo.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn entry(operation: &str) -> UndoEntry {
        UndoEntry {
            operation: operation.to_string(),
            taken_at: Utc::now(),
            lists: vec![ListSnapshot {
                task_id: Uuid::from_u128(1),
                documents: vec!["a.pdf".into()],
            }],
        }
    }

    #[test]
    fn pops_most_recent_first() {
        let mut stack = UndoStack::new();
        stack.push(entry("delete"));
        stack.push(entry("rename"));
        assert_eq!(stack.len(), 2);
        assert_eq!(stack.pop().unwrap().operation, "rename");
        assert_eq!(stack.peek().unwrap().operation, "delete");
        stack.pop();
        assert!(stack.pop().is_none());
    }

    #[test]
    fn serializes_as_plain_array() {
        let mut stack = UndoStack::new();
        stack.push(entry("delete"));
        let value = serde_json::to_value(&stack).unwrap();
        assert!(value.is_array());
        let back: UndoStack = serde_json::from_value(value).unwrap();
        assert_eq!(back, stack);
    }
}
