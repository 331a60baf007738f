//! Drag coordinator: turns UI drop events into board commands.
//!
//! The gesture layer hands over a plain [`DropEvent`]; nothing here depends on
//! a UI toolkit. Container ids are either a column key (`urgent`, `nieuw`, ...)
//! or `documents:{taskId}` for one task's document list.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::reorder::DocumentMove;
use super::transition::TaskMove;
use crate::error::BoardError;
use crate::model::{Column, TaskId};

const DOCUMENTS_PREFIX: &str = "documents:";

/// One end of a drag: the container and the index inside it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DropLocation {
    /// Container id.
    pub container_id: String,
    /// Position inside the container.
    pub index: usize,
}

/// A completed drag as reported by the gesture layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DropEvent {
    /// Id of the dragged item.
    pub draggable_id: String,
    /// Where the drag started.
    pub source: DropLocation,
    /// Where it ended; `None` when dropped outside any target.
    pub destination: Option<DropLocation>,
}

/// A parsed container id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Container {
    /// A board column.
    Column(Column),
    /// The document list of one task.
    Documents(TaskId),
}

impl Container {
    /// The container id for a task's document list.
    #[must_use]
    pub fn documents_id(task_id: TaskId) -> String {
        format!("{DOCUMENTS_PREFIX}{task_id}")
    }
}

impl FromStr for Container {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(raw) = s.strip_prefix(DOCUMENTS_PREFIX) {
            let id = Uuid::parse_str(raw).map_err(|e| {
                BoardError::Validation(format!("bad task id in container {s:?}: {e}"))
            })?;
            return Ok(Container::Documents(id));
        }
        s.parse::<Column>()
            .map(Container::Column)
            .map_err(|e| BoardError::Validation(e.to_string()))
    }
}

/// What a drop asks the board to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragCommand {
    /// Move a task card between columns.
    MoveTask(TaskMove),
    /// Reorder a document within its task's list.
    ReorderDocument(DocumentMove),
}

/// Interprets a drop event.
///
/// Returns `Ok(None)` for drops that must have no side effect: no
/// destination, same position, or a source/destination pair that is not a
/// supported combination.
///
/// # Errors
///
/// Returns [`BoardError::Validation`] if a container or task id is malformed.
pub fn interpret(event: &DropEvent) -> Result<Option<DragCommand>, BoardError> {
    let Some(destination) = &event.destination else {
        tracing::debug!(item = %event.draggable_id, "drop cancelled outside any target");
        return Ok(None);
    };
    let source: Container = event.source.container_id.parse()?;
    let target: Container = destination.container_id.parse()?;

    match (source, target) {
        (Container::Column(from), Container::Column(to)) => {
            if from == to {
                return Ok(None);
            }
            let task_id = Uuid::parse_str(&event.draggable_id).map_err(|e| {
                BoardError::Validation(format!("bad task id {:?}: {e}", event.draggable_id))
            })?;
            Ok(Some(DragCommand::MoveTask(TaskMove { task_id, from, to })))
        }
        (Container::Documents(owner), Container::Documents(target_owner))
            if owner == target_owner =>
        {
            if event.source.index == destination.index {
                return Ok(None);
            }
            Ok(Some(DragCommand::ReorderDocument(DocumentMove {
                task_id: owner,
                from_index: event.source.index,
                to_index: destination.index,
            })))
        }
        _ => {
            tracing::debug!(
                source = %event.source.container_id,
                destination = %destination.container_id,
                "rejecting drop between unrelated containers"
            );
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::WorkflowStage;
    use serde_json::json;

    const TASK: &str = "00000000-0000-0000-0000-00000000000a";

    fn event(source: &str, src_idx: usize, dest: Option<(&str, usize)>) -> DropEvent {
        DropEvent {
            draggable_id: TASK.to_string(),
            source: DropLocation { container_id: source.to_string(), index: src_idx },
            destination: dest.map(|(c, i)| DropLocation { container_id: c.to_string(), index: i }),
        }
    }

    #[test]
    fn column_to_column_is_a_task_move() {
        let cmd = interpret(&event("in_behandeling", 0, Some(("urgent", 2)))).unwrap().unwrap();
        let DragCommand::MoveTask(mv) = cmd else { panic!("expected move") };
        assert_eq!(mv.from, Column::Stage(WorkflowStage::InProgress));
        assert_eq!(mv.to, Column::Urgent);
        assert_eq!(mv.task_id.to_string(), TASK);
    }

    #[test]
    fn same_document_list_is_a_reorder() {
        let container = format!("documents:{TASK}");
        let cmd = interpret(&event(&container, 2, Some((&container, 0)))).unwrap().unwrap();
        assert_eq!(
            cmd,
            DragCommand::ReorderDocument(DocumentMove {
                task_id: Uuid::parse_str(TASK).unwrap(),
                from_index: 2,
                to_index: 0,
            })
        );
    }

    #[test]
    fn missing_destination_is_ignored() {
        assert_eq!(interpret(&event("nieuw", 0, None)).unwrap(), None);
    }

    #[test]
    fn same_column_drop_is_ignored() {
        assert_eq!(interpret(&event("nieuw", 0, Some(("nieuw", 3)))).unwrap(), None);
    }

    #[test]
    fn column_to_document_list_is_rejected() {
        let container = format!("documents:{TASK}");
        assert_eq!(interpret(&event("nieuw", 0, Some((&container, 0)))).unwrap(), None);
    }

    #[test]
    fn documents_across_tasks_are_rejected() {
        let a = format!("documents:{TASK}");
        let b = "documents:00000000-0000-0000-0000-00000000000b";
        assert_eq!(interpret(&event(&a, 0, Some((b, 0)))).unwrap(), None);
    }

    #[test]
    fn unknown_container_is_a_validation_error() {
        let err = interpret(&event("archief", 0, Some(("nieuw", 0)))).unwrap_err();
        assert!(matches!(err, BoardError::Validation(_)));
    }

    #[test]
    fn decodes_gesture_payload() {
        let payload = json!({
            "draggableId": TASK,
            "source": {"containerId": "urgent", "index": 0},
            "destination": null
        });
        let event: DropEvent = serde_json::from_value(payload).unwrap();
        assert!(event.destination.is_none());
        assert_eq!(event.source.container_id, "urgent");
    }
}
