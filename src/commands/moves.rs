//! `careboard move`, `reorder` and `drop` commands.

use crate::board::{DocumentMove, DropEvent};
use crate::model::{Column, TaskId};
use crate::service::BoardService;

/// Execute the `move` command.
///
/// # Errors
///
/// Returns an error string if the task is unknown or the update fails.
pub async fn run_move(service: &BoardService, task: TaskId, column: Column) -> Result<(), String> {
    if service.move_to(task, column).await? {
        println!("Moved {task} to {column}.");
    } else {
        println!("Task {task} is already in {column}.");
    }
    Ok(())
}

/// Execute the `reorder` command.
///
/// # Errors
///
/// Returns an error string for unknown tasks, bad indices or a failed update.
pub async fn run_reorder(
    service: &BoardService,
    task: TaskId,
    from: usize,
    to: usize,
) -> Result<(), String> {
    let mv = DocumentMove { task_id: task, from_index: from, to_index: to };
    if service.reorder_documents(&mv).await? {
        let order = service.task(task).await?.documents;
        println!("New order: {}", order.join(", "));
    } else {
        println!("Order unchanged.");
    }
    Ok(())
}

/// Execute the `drop` command with a JSON drop event.
///
/// # Errors
///
/// Returns an error string if the JSON is malformed or the drop fails.
pub async fn run_drop(service: &BoardService, event: &str) -> Result<(), String> {
    let event: DropEvent =
        serde_json::from_str(event).map_err(|e| format!("Invalid drop event: {e}"))?;
    if service.handle_drop(&event).await? {
        println!("Drop applied.");
    } else {
        println!("Drop ignored.");
    }
    Ok(())
}
