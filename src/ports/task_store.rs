//! Remote task store port.

use crate::model::{Client, Task, TaskId, TaskPatch};

use super::PortFuture;

/// Reads and writes task and client rows in the remote persistent store.
///
/// Writes are plain partial updates; conflicting writes from different
/// clients resolve last-writer-wins at the store.
pub trait TaskStore: Send + Sync {
    /// Fetches every task, most recently updated first.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be reached or the rows cannot be decoded.
    fn fetch_tasks(&self) -> PortFuture<'_, Vec<Task>>;

    /// Fetches every client, ordered by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be reached or the rows cannot be decoded.
    fn fetch_clients(&self) -> PortFuture<'_, Vec<Client>>;

    /// Applies a partial update to one task.
    ///
    /// # Errors
    ///
    /// Returns an error if the task does not exist or the write is rejected.
    fn update_task<'a>(&'a self, id: TaskId, patch: &'a TaskPatch) -> PortFuture<'a, ()>;
}
