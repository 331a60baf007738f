//! Task record model: tasks, clients, document descriptors and the enums
//! that decide where a task sits on the board.

pub mod stage;
pub mod task;

pub use stage::{Column, ParseEnumError, Urgency, WorkflowStage};
pub use task::{
    document_path, Client, ClientId, DocumentDescriptor, RenameStatus, Task, TaskId, TaskPatch,
};
