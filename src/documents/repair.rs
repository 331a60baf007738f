//! Leftovers of partially failed renames and the pass that cleans them up.
//!
//! A rename is copy, remove, then list update. When a later step fails the
//! earlier ones are not rolled back; what is left over is recorded here.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::{document_path, TaskId};
use crate::service::BoardService;

/// One inconsistency left behind by a failed rename step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PendingRepair {
    /// The copy exists but the old object could not be removed, so the task
    /// still lists the old name and the new object is unreferenced.
    OrphanedCopy {
        /// Owning task.
        task_id: TaskId,
        /// Name of the unreferenced copy.
        name: String,
    },
    /// The object was moved but the task's list still names the old object.
    StaleListEntry {
        /// Owning task.
        task_id: TaskId,
        /// Name still in the list.
        old: String,
        /// Name of the object in storage.
        new: String,
    },
}

impl PendingRepair {
    /// The task the repair belongs to.
    #[must_use]
    pub fn task_id(&self) -> TaskId {
        match self {
            PendingRepair::OrphanedCopy { task_id, .. }
            | PendingRepair::StaleListEntry { task_id, .. } => *task_id,
        }
    }
}

impl fmt::Display for PendingRepair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PendingRepair::OrphanedCopy { task_id, name } => {
                write!(f, "unreferenced copy {}", document_path(*task_id, name))
            }
            PendingRepair::StaleListEntry { task_id, old, new } => {
                write!(f, "task {task_id} lists {old:?} but the object is now {new:?}")
            }
        }
    }
}

/// Outcome of a repair pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepairReport {
    /// Repairs that were applied or turned out to be unnecessary.
    pub resolved: Vec<PendingRepair>,
    /// Repairs that failed again and stay pending.
    pub remaining: Vec<PendingRepair>,
}

/// Applies one repair. `lists` holds the current document list per task and
/// is kept up to date with any list this writes.
pub(crate) async fn apply(
    service: &BoardService,
    lists: &mut HashMap<TaskId, Vec<String>>,
    repair: &PendingRepair,
) -> Result<(), String> {
    let storage = service.context().storage.as_ref();
    match repair {
        PendingRepair::OrphanedCopy { task_id, name } => {
            if lists.get(task_id).is_some_and(|list| list.contains(name)) {
                tracing::debug!(task = %task_id, name = %name, "copy is referenced, leaving it");
                return Ok(());
            }
            storage.remove(&document_path(*task_id, name)).await.map_err(|e| e.to_string())
        }
        PendingRepair::StaleListEntry { task_id, old, new } => {
            let Some(list) = lists.get_mut(task_id) else {
                tracing::debug!(task = %task_id, "task is gone, nothing to repair");
                return Ok(());
            };
            let Some(position) = list.iter().position(|n| n == old) else {
                return Ok(());
            };
            if !storage.exists(&document_path(*task_id, new)).await.map_err(|e| e.to_string())? {
                tracing::warn!(
                    task = %task_id,
                    name = %new,
                    "renamed object is missing, dropping repair"
                );
                return Ok(());
            }
            let mut updated = list.clone();
            updated[position].clone_from(new);
            service.write_documents(*task_id, &updated).await.map_err(|e| e.to_string())?;
            *list = updated;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn serializes_with_kind_tag() {
        let repair = PendingRepair::OrphanedCopy { task_id: Uuid::nil(), name: "b.pdf".into() };
        let json = serde_json::to_value(&repair).unwrap();
        assert_eq!(json["kind"], "orphaned_copy");
        assert_eq!(json["name"], "b.pdf");
    }

    #[test]
    fn display_names_the_object() {
        let repair = PendingRepair::OrphanedCopy { task_id: Uuid::nil(), name: "b.pdf".into() };
        assert_eq!(
            repair.to_string(),
            "unreferenced copy tasks/00000000-0000-0000-0000-000000000000/b.pdf"
        );
    }
}
