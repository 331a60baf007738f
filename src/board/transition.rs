//! Status transition engine: turns a task move into a partial update.

use crate::model::{Column, TaskId, TaskPatch, Urgency};

/// A completed drag of a task card from one column to another.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskMove {
    /// The dragged task.
    pub task_id: TaskId,
    /// Column the card was picked up from.
    pub from: Column,
    /// Column the card was dropped on.
    pub to: Column,
}

/// Computes the patch for a task move, or `None` for a same-column drop.
///
/// Rules, first match wins:
/// 1. dropping on `urgent` sets urgency to urgent and keeps the stage;
/// 2. leaving `urgent` sets the stage to the target and urgency to normal;
/// 3. any other move sets the stage and leaves urgency alone.
#[must_use]
pub fn transition(mv: &TaskMove) -> Option<TaskPatch> {
    if mv.from == mv.to {
        return None;
    }
    let patch = match (mv.from, mv.to) {
        (_, Column::Urgent) => TaskPatch { urgency: Some(Urgency::Urgent), ..TaskPatch::default() },
        (Column::Urgent, Column::Stage(stage)) => TaskPatch {
            stage: Some(stage),
            urgency: Some(Urgency::Normal),
            ..TaskPatch::default()
        },
        (Column::Stage(_), Column::Stage(stage)) => {
            TaskPatch { stage: Some(stage), ..TaskPatch::default() }
        }
    };
    Some(patch)
}
