//! Document management: multi-select, bulk rename and delete, undo and the
//! repair pass for half-finished renames.

pub mod bulk;
pub mod repair;
pub mod selection;
pub mod template;
pub mod undo;

pub use bulk::{
    BulkReport, DocumentEngine, DocumentHistory, ItemOutcome, StatusTable, UndoReport,
};
pub use repair::{PendingRepair, RepairReport};
pub use selection::{SelectedDocuments, Selection};
pub use template::RenameTemplate;
pub use undo::{ListSnapshot, UndoEntry, UndoStack};
