//! Board projector: the pure mapping from task records to column buckets.

use std::collections::BTreeMap;

use crate::model::{Column, Task, TaskId};

/// Tasks grouped into board columns.
///
/// Every column, including the `urgent` pseudo-column, always has a bucket,
/// possibly empty.
#[derive(Debug, Clone, PartialEq)]
pub struct Board {
    columns: BTreeMap<Column, Vec<Task>>,
}

impl Board {
    /// Tasks in the given column, in fetch order.
    #[must_use]
    pub fn column(&self, column: Column) -> &[Task] {
        self.columns.get(&column).map_or(&[], Vec::as_slice)
    }

    /// Iterates over all columns in board order.
    pub fn columns(&self) -> impl Iterator<Item = (Column, &[Task])> {
        self.columns.iter().map(|(column, tasks)| (*column, tasks.as_slice()))
    }

    /// The column currently holding the task, if it is on the board.
    #[must_use]
    pub fn locate(&self, id: TaskId) -> Option<Column> {
        self.columns
            .iter()
            .find(|(_, tasks)| tasks.iter().any(|t| t.id == id))
            .map(|(column, _)| *column)
    }

    /// Looks up a task anywhere on the board.
    #[must_use]
    pub fn task(&self, id: TaskId) -> Option<&Task> {
        self.columns.values().flatten().find(|t| t.id == id)
    }

    /// Total number of tasks across all columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.values().map(Vec::len).sum()
    }

    /// Returns `true` if no column holds a task.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Projects a task list onto the board.
///
/// Urgent tasks go to the `urgent` pseudo-column whatever their stage; all
/// other tasks go to the column of their stage. Bucket order is input order.
#[must_use]
pub fn project(tasks: &[Task]) -> Board {
    let mut columns: BTreeMap<Column, Vec<Task>> =
        Column::ALL.iter().map(|c| (*c, Vec::new())).collect();
    for task in tasks {
        columns.entry(task.column()).or_default().push(task.clone());
    }
    Board { columns }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Urgency, WorkflowStage};
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    fn task(n: u128, stage: WorkflowStage, urgency: Urgency) -> Task {
        let mut t = Task::new(Uuid::from_u128(n), Utc.timestamp_opt(1_700_000_000, 0).unwrap());
        t.stage = stage;
        t.urgency = urgency;
        t
    }

    fn sample() -> Vec<Task> {
        vec![
            task(1, WorkflowStage::InProgress, Urgency::Normal),
            task(2, WorkflowStage::Done, Urgency::Urgent),
            task(3, WorkflowStage::New, Urgency::Normal),
            task(4, WorkflowStage::InProgress, Urgency::Normal),
            task(5, WorkflowStage::FollowUp, Urgency::Urgent),
        ]
    }

    #[test]
    fn every_column_has_a_bucket() {
        let board = project(&[]);
        assert_eq!(board.columns().count(), 6);
        assert!(board.is_empty());
    }

    #[test]
    fn each_task_lands_in_exactly_one_bucket() {
        let tasks = sample();
        let board = project(&tasks);
        assert_eq!(board.len(), tasks.len());
        for t in &tasks {
            let holding: Vec<Column> = board
                .columns()
                .filter(|(_, bucket)| bucket.iter().any(|b| b.id == t.id))
                .map(|(c, _)| c)
                .collect();
            assert_eq!(holding.len(), 1);
            let expected =
                if t.urgency == Urgency::Urgent { Column::Urgent } else { Column::Stage(t.stage) };
            assert_eq!(holding[0], expected);
        }
    }

    #[test]
    fn urgent_overrides_stage() {
        let board = project(&sample());
        let urgent: Vec<u128> =
            board.column(Column::Urgent).iter().map(|t| t.id.as_u128()).collect();
        assert_eq!(urgent, vec![2, 5]);
        assert!(board.column(Column::Stage(WorkflowStage::Done)).is_empty());
    }

    #[test]
    fn preserves_input_order_within_bucket() {
        let board = project(&sample());
        let ids: Vec<u128> = board
            .column(Column::Stage(WorkflowStage::InProgress))
            .iter()
            .map(|t| t.id.as_u128())
            .collect();
        assert_eq!(ids, vec![1, 4]);
    }

    #[test]
    fn projection_is_idempotent() {
        let tasks = sample();
        assert_eq!(project(&tasks), project(&tasks));
    }

    #[test]
    fn locate_finds_column_of_task() {
        let board = project(&sample());
        assert_eq!(board.locate(Uuid::from_u128(5)), Some(Column::Urgent));
        assert_eq!(board.locate(Uuid::from_u128(3)), Some(Column::Stage(WorkflowStage::New)));
        assert_eq!(board.locate(Uuid::from_u128(99)), None);
    }
}
