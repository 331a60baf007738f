//! In-list document reorder for a single task.

use crate::error::BoardError;
use crate::model::TaskId;

/// A completed drag of a document within one task's list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocumentMove {
    /// Owner of the document list.
    pub task_id: TaskId,
    /// Index the document was picked up from.
    pub from_index: usize,
    /// Index the document was dropped at.
    pub to_index: usize,
}

/// Returns the reordered list: splice out at `from_index`, splice in at `to_index`.
///
/// # Errors
///
/// Returns [`BoardError::Validation`] if either index is outside the list.
pub fn reorder(documents: &[String], mv: &DocumentMove) -> Result<Vec<String>, BoardError> {
    let len = documents.len();
    if mv.from_index >= len || mv.to_index >= len {
        return Err(BoardError::Validation(format!(
            "document index out of range (from {}, to {}, list has {len})",
            mv.from_index, mv.to_index
        )));
    }
    let mut list = documents.to_vec();
    let moved = list.remove(mv.from_index);
    list.insert(mv.to_index, moved);
    Ok(list)
}
