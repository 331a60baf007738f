//! `careboard board` command.

use serde::Serialize;

use crate::board::Board;
use crate::model::{Column, Task};
use crate::service::BoardService;

#[derive(Serialize)]
struct ColumnView<'a> {
    column: &'static str,
    tasks: &'a [Task],
}

/// Execute the `board` command.
///
/// Prints every column, urgent first, with its tasks in fetch order.
///
/// # Errors
///
/// Returns an error string if the task list cannot be loaded.
pub async fn run(service: &BoardService, json: bool) -> Result<(), String> {
    let board = service.board().await?;
    if json {
        let view: Vec<ColumnView<'_>> = board
            .columns()
            .map(|(column, tasks)| ColumnView { column: column.key(), tasks })
            .collect();
        let out = serde_json::to_string_pretty(&view)
            .map_err(|e| format!("Failed to encode board: {e}"))?;
        println!("{out}");
        return Ok(());
    }
    print!("{}", render(&board));
    Ok(())
}

/// Plain-text rendering of the board.
#[must_use]
pub fn render(board: &Board) -> String {
    let mut out = String::new();
    for (column, tasks) in board.columns() {
        out.push_str(&format!("{} ({})\n", heading(column), tasks.len()));
        for task in tasks {
            let description = task.description.as_deref().unwrap_or("-");
            let docs = match task.documents.len() {
                0 => String::new(),
                1 => "  [1 document]".to_string(),
                n => format!("  [{n} documents]"),
            };
            out.push_str(&format!("  {}  {description}{docs}\n", task.id));
        }
    }
    out.push_str(&format!("\n{} task(s) total.\n", board.len()));
    out
}

fn heading(column: Column) -> String {
    column.key().to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::project;
    use crate::model::{Urgency, WorkflowStage};
    use chrono::Utc;
    use uuid::Uuid;

    #[test]
    fn renders_urgent_column_first() {
        let mut urgent = Task::new(Uuid::from_u128(1), Utc::now());
        urgent.urgency = Urgency::Urgent;
        urgent.description = Some("Indicatie aanvragen".into());
        let mut done = Task::new(Uuid::from_u128(2), Utc::now());
        done.stage = WorkflowStage::Done;
        done.documents = vec!["a.pdf".into(), "b.pdf".into()];

        let text = render(&project(&[done, urgent]));
        let urgent_at = text.find("URGENT (1)").unwrap();
        let done_at = text.find("AFGEHANDELD (1)").unwrap();
        assert!(urgent_at < done_at);
        assert!(text.contains("Indicatie aanvragen"));
        assert!(text.contains("[2 documents]"));
        assert!(text.contains("2 task(s) total."));
    }
}
