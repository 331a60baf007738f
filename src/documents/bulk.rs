//! Bulk document operations over the current selection.
//!
//! Every operation validates before touching anything remote, captures an
//! undo entry, runs its items concurrently and records a terminal status per
//! item. A failed item never aborts the batch and nothing is retried.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use futures::future::join_all;
use serde::{Deserialize, Serialize};

use super::repair::{self, PendingRepair, RepairReport};
use super::selection::{SelectedDocuments, Selection};
use super::template::RenameTemplate;
use super::undo::{ListSnapshot, UndoEntry, UndoStack};
use crate::error::BoardError;
use crate::model::{document_path, DocumentDescriptor, RenameStatus, Task, TaskId};
use crate::ports::Notification;
use crate::service::BoardService;

/// The part of the engine's state that outlives one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentHistory {
    /// Snapshots for undo.
    #[serde(default)]
    pub undo: UndoStack,
    /// Leftovers of partially failed renames.
    #[serde(default)]
    pub repairs: Vec<PendingRepair>,
}

/// Final state of one selected document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemOutcome {
    /// Owning task.
    pub task_id: TaskId,
    /// Name before the operation.
    pub name: String,
    /// Name after a rename.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_name: Option<String>,
    /// `success` or `error`.
    pub status: RenameStatus,
    /// What went wrong, for `error` items.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ItemOutcome {
    fn new(
        task_id: TaskId,
        name: &str,
        new_name: Option<&str>,
        result: Result<(), String>,
    ) -> Self {
        let (status, error) = match result {
            Ok(()) => (RenameStatus::Success, None),
            Err(e) => (RenameStatus::Error, Some(e)),
        };
        Self {
            task_id,
            name: name.to_string(),
            new_name: new_name.map(str::to_string),
            status,
            error,
        }
    }

    fn succeeded(&self) -> bool {
        self.status == RenameStatus::Success
    }
}

/// Per-item results of a bulk delete or rename.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BulkReport {
    /// `"delete"` or `"rename"`.
    pub operation: &'static str,
    /// One entry per selected document.
    pub items: Vec<ItemOutcome>,
}

impl BulkReport {
    /// Number of items that ended in `success`.
    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.items.iter().filter(|i| i.succeeded()).count()
    }

    /// Number of items that ended in `error`.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.items.len() - self.succeeded()
    }
}

/// Result of an undo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UndoReport {
    /// Operation the undone entry was captured for.
    pub operation: String,
    /// Tasks whose list was restored.
    pub restored: Vec<TaskId>,
    /// Tasks whose restore write failed, with the error.
    pub failed: Vec<(TaskId, String)>,
}

/// One planned rename within a task.
#[derive(Debug, Clone)]
struct RenameItem {
    position: usize,
    old: String,
    new: String,
}

#[derive(Debug, Clone)]
struct RenamePlan {
    task_id: TaskId,
    current: Vec<String>,
    items: Vec<RenameItem>,
}

/// Per-document status of the current and past batches.
///
/// Clones share one table, so a handle taken before an operation shows its
/// items settle while it runs.
#[derive(Debug, Clone, Default)]
pub struct StatusTable(Arc<Mutex<HashMap<(TaskId, String), RenameStatus>>>);

impl StatusTable {
    /// Status of one document; `pending` if it was never part of a batch.
    #[must_use]
    pub fn get(&self, task_id: TaskId, name: &str) -> RenameStatus {
        self.lock().get(&(task_id, name.to_string())).copied().unwrap_or_default()
    }

    /// Number of documents with a recorded status.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// True if no document has a recorded status.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn set(&self, task_id: TaskId, name: &str, status: RenameStatus) {
        self.lock().insert((task_id, name.to_string()), status);
    }

    fn remove(&self, task_id: TaskId, name: &str) {
        self.lock().remove(&(task_id, name.to_string()));
    }

    fn forget_tasks(&self, tasks: &HashSet<TaskId>) {
        self.lock().retain(|(task_id, _), _| !tasks.contains(task_id));
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<(TaskId, String), RenameStatus>> {
        self.0.lock().expect("status table lock poisoned")
    }
}

/// Selection, per-document status and history for bulk operations.
#[derive(Debug, Default)]
pub struct DocumentEngine {
    selection: Selection,
    statuses: StatusTable,
    history: DocumentHistory,
}

impl DocumentEngine {
    /// An engine with an empty selection and no history.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// An engine resuming from saved history.
    #[must_use]
    pub fn with_history(history: DocumentHistory) -> Self {
        Self { history, ..Self::default() }
    }

    /// Gives back the history, e.g. to persist it.
    #[must_use]
    pub fn into_history(self) -> DocumentHistory {
        self.history
    }

    /// Current history.
    #[must_use]
    pub fn history(&self) -> &DocumentHistory {
        &self.history
    }

    /// Current selection.
    #[must_use]
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Mutable access to the selection.
    pub fn selection_mut(&mut self) -> &mut Selection {
        &mut self.selection
    }

    /// Status of one document; `pending` if it was never part of a batch.
    #[must_use]
    pub fn status(&self, task_id: TaskId, name: &str) -> RenameStatus {
        self.statuses.get(task_id, name)
    }

    /// Number of documents with a recorded status.
    #[must_use]
    pub fn tracked(&self) -> usize {
        self.statuses.len()
    }

    /// A handle onto the live status table.
    #[must_use]
    pub fn statuses(&self) -> StatusTable {
        self.statuses.clone()
    }

    /// Descriptors for a task's documents, carrying their bulk status.
    #[must_use]
    pub fn descriptors(&self, task: &Task) -> Vec<DocumentDescriptor> {
        let mut descriptors = task.descriptors();
        for d in &mut descriptors {
            d.rename_status = self.status(task.id, &d.name);
        }
        descriptors
    }

    /// Deletes every selected document from storage and from its task's list.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::Validation`] if nothing is selected and
    /// [`BoardError::Fetch`] if the task list could not be loaded. Item
    /// failures are reported in the [`BulkReport`], not as an error.
    pub async fn delete_selected(
        &mut self,
        service: &BoardService,
    ) -> Result<BulkReport, BoardError> {
        let groups = self.selection.resolve(&service.tasks().await?);
        if groups.is_empty() {
            return Err(BoardError::Validation("no documents selected".into()));
        }
        self.push_snapshot(service, "delete", &groups);
        tracing::info!(
            tasks = groups.len(),
            documents = groups.iter().map(|g| g.names.len()).sum::<usize>(),
            "bulk delete started"
        );

        let per_task = join_all(groups.iter().map(|group| delete_group(service, group))).await;
        let report =
            BulkReport { operation: "delete", items: per_task.into_iter().flatten().collect() };

        for item in &report.items {
            self.statuses.set(item.task_id, &item.name, item.status);
        }
        self.deselect_succeeded(&report, &groups);
        finish(service, &report, "Deleted").await;
        Ok(report)
    }

    /// Renames every selected document according to `template`.
    ///
    /// Within one task the renames run one after another; different tasks
    /// proceed concurrently.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::Validation`] if nothing is selected or the new
    /// names are unusable, and [`BoardError::Fetch`] if the task list could
    /// not be loaded. Item failures are reported in the [`BulkReport`].
    pub async fn rename_selected(
        &mut self,
        service: &BoardService,
        template: &RenameTemplate,
    ) -> Result<BulkReport, BoardError> {
        let groups = self.selection.resolve(&service.tasks().await?);
        if groups.is_empty() {
            return Err(BoardError::Validation("no documents selected".into()));
        }
        let plans = plan_renames(&groups, template)?;
        self.push_snapshot(service, "rename", &groups);
        for plan in &plans {
            for item in &plan.items {
                self.statuses.set(plan.task_id, &item.old, RenameStatus::Renaming);
            }
        }
        tracing::info!(tasks = plans.len(), "bulk rename started");

        let statuses = &self.statuses;
        let per_task =
            join_all(plans.iter().map(|plan| rename_group(service, plan, statuses))).await;
        let mut items = Vec::new();
        for (outcomes, repairs) in per_task {
            items.extend(outcomes);
            for repair in repairs {
                tracing::warn!(%repair, "rename left an inconsistency behind");
                self.history.repairs.push(repair);
            }
        }
        let report = BulkReport { operation: "rename", items };
        self.selection.clear();
        finish(service, &report, "Renamed").await;
        Ok(report)
    }

    /// Restores every list captured by the most recent bulk operation.
    ///
    /// The entry is consumed even if some restore writes fail.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::NothingToUndo`] if the stack is empty.
    pub async fn undo(&mut self, service: &BoardService) -> Result<UndoReport, BoardError> {
        let entry = self.history.undo.pop().ok_or(BoardError::NothingToUndo)?;
        tracing::info!(
            operation = %entry.operation,
            tasks = entry.lists.len(),
            "undoing bulk operation"
        );

        let results = join_all(entry.lists.iter().map(|snapshot| async move {
            (snapshot.task_id, service.write_documents(snapshot.task_id, &snapshot.documents).await)
        }))
        .await;

        let mut report = UndoReport {
            operation: entry.operation.clone(),
            restored: Vec::new(),
            failed: Vec::new(),
        };
        for (task_id, result) in results {
            match result {
                Ok(()) => report.restored.push(task_id),
                Err(e) => {
                    tracing::warn!(task = %task_id, error = %e, "restore write failed");
                    report.failed.push((task_id, e.to_string()));
                }
            }
        }

        let touched: HashSet<TaskId> = entry.lists.iter().map(|s| s.task_id).collect();
        self.statuses.forget_tasks(&touched);

        if let Err(e) = service.refresh().await {
            tracing::warn!(error = %e, "re-fetch after undo failed");
        }
        if report.failed.is_empty() {
            service.notify(Notification::success(format!("Undid {}", entry.operation)));
        } else {
            service.notify(Notification::failure(format!(
                "Undo of {} restored {} of {} lists",
                entry.operation,
                report.restored.len(),
                entry.lists.len()
            )));
        }
        Ok(report)
    }

    /// Retries every pending repair. Repairs that fail again stay pending.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::Fetch`] if the task list could not be loaded.
    pub async fn repair(&mut self, service: &BoardService) -> Result<RepairReport, BoardError> {
        if self.history.repairs.is_empty() {
            return Ok(RepairReport::default());
        }
        let mut lists: HashMap<TaskId, Vec<String>> =
            service.tasks().await?.into_iter().map(|t| (t.id, t.documents)).collect();

        let mut report = RepairReport::default();
        for pending in std::mem::take(&mut self.history.repairs) {
            match repair::apply(service, &mut lists, &pending).await {
                Ok(()) => report.resolved.push(pending),
                Err(e) => {
                    tracing::warn!(repair = %pending, error = %e, "repair failed, keeping it");
                    report.remaining.push(pending);
                }
            }
        }
        self.history.repairs.clone_from(&report.remaining);

        if let Err(e) = service.refresh().await {
            tracing::warn!(error = %e, "re-fetch after repair failed");
        }
        if report.remaining.is_empty() {
            service
                .notify(Notification::success(format!("Repaired {} items", report.resolved.len())));
        } else {
            service.notify(Notification::failure(format!(
                "{} repairs still pending",
                report.remaining.len()
            )));
        }
        Ok(report)
    }

    fn push_snapshot(
        &mut self,
        service: &BoardService,
        operation: &str,
        groups: &[SelectedDocuments],
    ) {
        self.history.undo.push(UndoEntry {
            operation: operation.to_string(),
            taken_at: service.context().clock.now(),
            lists: groups
                .iter()
                .map(|g| ListSnapshot { task_id: g.task_id, documents: g.current.clone() })
                .collect(),
        });
    }

    fn deselect_succeeded(&mut self, report: &BulkReport, groups: &[SelectedDocuments]) {
        let lists: HashMap<TaskId, &[String]> =
            groups.iter().map(|g| (g.task_id, g.current.as_slice())).collect();
        for item in report.items.iter().filter(|i| i.succeeded()) {
            let remaining = lists.get(&item.task_id).copied().unwrap_or_default();
            self.selection.deselect(item.task_id, &item.name, remaining);
        }
    }
}

/// Removes one task's selected objects concurrently, then writes its list once.
async fn delete_group(service: &BoardService, group: &SelectedDocuments) -> Vec<ItemOutcome> {
    let storage = service.context().storage.as_ref();
    let removals = join_all(group.names.iter().map(|name| async move {
        let path = document_path(group.task_id, name);
        storage.remove(&path).await.map_err(|e| format!("removing {path} failed: {e}"))
    }))
    .await;

    let removed: HashSet<&str> = group
        .names
        .iter()
        .zip(&removals)
        .filter(|(_, result)| result.is_ok())
        .map(|(name, _)| name.as_str())
        .collect();

    let write = if removed.is_empty() {
        Ok(())
    } else {
        let remaining: Vec<String> =
            group.current.iter().filter(|n| !removed.contains(n.as_str())).cloned().collect();
        service
            .write_documents(group.task_id, &remaining)
            .await
            .map_err(|e| format!("updating document list failed: {e}"))
    };

    group
        .names
        .iter()
        .zip(removals)
        .map(|(name, removal)| {
            let result = removal.and_then(|()| write.clone());
            if let Err(e) = &result {
                tracing::warn!(
                    task = %group.task_id,
                    name = %name,
                    error = %e,
                    "document not deleted"
                );
            }
            ItemOutcome::new(group.task_id, name, None, result)
        })
        .collect()
}

/// Computes new names and rejects the batch if any is unusable.
fn plan_renames(
    groups: &[SelectedDocuments],
    template: &RenameTemplate,
) -> Result<Vec<RenamePlan>, BoardError> {
    let mut plans = Vec::with_capacity(groups.len());
    for group in groups {
        let mut items = Vec::with_capacity(group.names.len());
        let mut targets = HashSet::new();
        for (i, old) in group.names.iter().enumerate() {
            let Some(position) = group.current.iter().position(|n| n == old) else {
                continue;
            };
            let new = template.render(old, i + 1, group.task_id);
            if new.is_empty() || new.contains('/') {
                return Err(BoardError::Validation(format!(
                    "{old:?} would be renamed to invalid name {new:?}"
                )));
            }
            let clashes_with_existing = new != *old && group.current.contains(&new);
            if clashes_with_existing || !targets.insert(new.clone()) {
                return Err(BoardError::Validation(format!(
                    "renaming {old:?} to {new:?} would clash with another document of task {}",
                    group.task_id
                )));
            }
            items.push(RenameItem { position, old: old.clone(), new });
        }
        plans.push(RenamePlan { task_id: group.task_id, current: group.current.clone(), items });
    }
    Ok(plans)
}

/// Runs one task's renames in order over a local copy of its list.
///
/// Each item's status settles as soon as that item is done; a renamed item
/// is tracked under its new name.
async fn rename_group(
    service: &BoardService,
    plan: &RenamePlan,
    statuses: &StatusTable,
) -> (Vec<ItemOutcome>, Vec<PendingRepair>) {
    let mut list = plan.current.clone();
    let mut outcomes = Vec::with_capacity(plan.items.len());
    let mut repairs = Vec::new();
    for item in &plan.items {
        let result = rename_one(service, plan.task_id, &mut list, item, &mut repairs).await;
        match &result {
            Ok(()) => {
                statuses.remove(plan.task_id, &item.old);
                statuses.set(plan.task_id, &item.new, RenameStatus::Success);
            }
            Err(e) => {
                tracing::warn!(
                    task = %plan.task_id,
                    name = %item.old,
                    error = %e,
                    "document not renamed"
                );
                statuses.set(plan.task_id, &item.old, RenameStatus::Error);
            }
        }
        outcomes.push(ItemOutcome::new(plan.task_id, &item.old, Some(item.new.as_str()), result));
    }
    (outcomes, repairs)
}

async fn rename_one(
    service: &BoardService,
    task_id: TaskId,
    list: &mut [String],
    item: &RenameItem,
    repairs: &mut Vec<PendingRepair>,
) -> Result<(), String> {
    if item.old == item.new {
        return Ok(());
    }
    let storage = service.context().storage.as_ref();
    let from = document_path(task_id, &item.old);
    let to = document_path(task_id, &item.new);

    storage.copy(&from, &to).await.map_err(|e| format!("copying to {to} failed: {e}"))?;
    if let Err(e) = storage.remove(&from).await {
        repairs.push(PendingRepair::OrphanedCopy { task_id, name: item.new.clone() });
        return Err(format!("removing {from} failed: {e}"));
    }
    list[item.position].clone_from(&item.new);
    if let Err(e) = service.write_documents(task_id, list).await {
        list[item.position].clone_from(&item.old);
        repairs.push(PendingRepair::StaleListEntry {
            task_id,
            old: item.old.clone(),
            new: item.new.clone(),
        });
        return Err(format!("updating document list failed: {e}"));
    }
    Ok(())
}

/// Refreshes once and sends one summary notification for the batch.
async fn finish(service: &BoardService, report: &BulkReport, verb: &str) {
    if let Err(e) = service.refresh().await {
        tracing::warn!(error = %e, "re-fetch after bulk {} failed", report.operation);
    }
    let total = report.items.len();
    let failed = report.failed();
    if failed == 0 {
        tracing::info!(operation = report.operation, total, "bulk operation finished");
        service.notify(Notification::success(format!("{verb} {total} documents")));
    } else {
        tracing::warn!(
            operation = report.operation,
            total,
            failed,
            "bulk operation partially failed"
        );
        service.notify(Notification::failure(format!(
            "{verb} {} of {total} documents; {failed} failed",
            report.succeeded()
        )));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::WorkflowStage;
    use crate::ports::NotificationKind;
    use crate::service::tests::{harness, task_with, Harness};
    use uuid::Uuid;

    fn id(n: u128) -> TaskId {
        Uuid::from_u128(n)
    }

    /// Two tasks with stored objects for every listed document.
    fn seeded() -> Harness {
        let h = harness(vec![
            task_with(1, WorkflowStage::New, &["a.pdf", "b.pdf", "c.pdf"]),
            task_with(2, WorkflowStage::Done, &["x.pdf", "y.pdf"]),
        ]);
        for (task, name) in [(1, "a.pdf"), (1, "b.pdf"), (1, "c.pdf"), (2, "x.pdf"), (2, "y.pdf")] {
            h.store.put_object(document_path(id(task), name));
        }
        h
    }

    fn docs(h: &Harness, task: u128) -> Vec<String> {
        h.store.task(id(task)).unwrap().documents
    }

    #[tokio::test]
    async fn delete_then_undo_restores_lists() {
        let h = seeded();
        let mut engine = DocumentEngine::new();
        engine.selection_mut().toggle_document(id(1), "a.pdf");
        engine.selection_mut().toggle_document(id(1), "c.pdf");
        engine.selection_mut().toggle_document(id(2), "y.pdf");

        let report = engine.delete_selected(&h.service).await.unwrap();
        assert_eq!((report.succeeded(), report.failed()), (3, 0));
        assert_eq!(docs(&h, 1), vec!["b.pdf"]);
        assert_eq!(docs(&h, 2), vec!["x.pdf"]);
        for (task, name) in [(1, "a.pdf"), (1, "c.pdf"), (2, "y.pdf")] {
            assert!(!h.store.objects().contains(&document_path(id(task), name)));
        }
        assert!(engine.selection().is_empty());

        let undo = engine.undo(&h.service).await.unwrap();
        assert_eq!(undo.restored.len(), 2);
        assert_eq!(docs(&h, 1), vec!["a.pdf", "b.pdf", "c.pdf"]);
        assert_eq!(docs(&h, 2), vec!["x.pdf", "y.pdf"]);
        assert!(matches!(engine.undo(&h.service).await, Err(BoardError::NothingToUndo)));
    }

    #[tokio::test]
    async fn delete_with_nothing_selected_is_rejected() {
        let h = seeded();
        let mut engine = DocumentEngine::new();
        assert!(matches!(engine.delete_selected(&h.service).await, Err(BoardError::Validation(_))));
        assert!(engine.history().undo.is_empty());
        assert!(h.notes.notifications().is_empty());
    }

    #[tokio::test]
    async fn failed_removal_keeps_that_name_listed() {
        let h = seeded();
        h.store.faults().fail_remove_of(document_path(id(1), "b.pdf"));
        let mut engine = DocumentEngine::new();
        engine.selection_mut().toggle_task(id(1));

        let report = engine.delete_selected(&h.service).await.unwrap();
        assert_eq!((report.succeeded(), report.failed()), (2, 1));
        assert_eq!(docs(&h, 1), vec!["b.pdf"]);
        assert_eq!(engine.status(id(1), "b.pdf"), RenameStatus::Error);
        assert!(engine.selection().is_document_selected(id(1), "b.pdf"));
        assert!(!engine.selection().is_document_selected(id(1), "a.pdf"));
        assert_eq!(h.notes.count(NotificationKind::Failure), 1);
    }

    #[tokio::test]
    async fn failed_list_write_fails_the_whole_task() {
        let h = seeded();
        h.store.faults().fail_updates_for(id(2));
        let mut engine = DocumentEngine::new();
        engine.selection_mut().toggle_document(id(1), "a.pdf");
        engine.selection_mut().toggle_task(id(2));

        let report = engine.delete_selected(&h.service).await.unwrap();
        assert_eq!((report.succeeded(), report.failed()), (1, 2));
        assert_eq!(docs(&h, 2), vec!["x.pdf", "y.pdf"]);
        assert_eq!(docs(&h, 1), vec!["b.pdf", "c.pdf"]);
    }

    #[tokio::test]
    async fn rename_settles_every_item() {
        let h = seeded();
        h.store.faults().fail_copy_from(document_path(id(2), "x.pdf"));
        let mut engine = DocumentEngine::new();
        engine.selection_mut().toggle_document(id(1), "a.pdf");
        engine.selection_mut().toggle_document(id(1), "c.pdf");
        engine.selection_mut().toggle_task(id(2));
        let template: RenameTemplate = "{n}-{stem}{ext}".parse().unwrap();

        let report = engine.rename_selected(&h.service, &template).await.unwrap();
        assert_eq!(report.items.len(), 4);
        assert!(report.items.iter().all(|i| i.status.is_settled()));
        assert_eq!(report.failed(), 1);
        assert_eq!(engine.tracked(), 4);

        assert_eq!(docs(&h, 1), vec!["1-a.pdf", "b.pdf", "2-c.pdf"]);
        assert_eq!(docs(&h, 2), vec!["x.pdf", "2-y.pdf"]);
        assert!(h.store.objects().contains(&document_path(id(1), "1-a.pdf")));
        assert!(!h.store.objects().contains(&document_path(id(1), "a.pdf")));
        assert_eq!(engine.status(id(1), "1-a.pdf"), RenameStatus::Success);
        assert_eq!(engine.status(id(2), "x.pdf"), RenameStatus::Error);
        assert!(engine.history().repairs.is_empty());

        engine.undo(&h.service).await.unwrap();
        assert_eq!(docs(&h, 1), vec!["a.pdf", "b.pdf", "c.pdf"]);
    }

    #[tokio::test]
    async fn clashing_names_are_rejected_before_any_call() {
        let h = seeded();
        let mut engine = DocumentEngine::new();
        engine.selection_mut().toggle_task(id(1));
        let template: RenameTemplate = "dossier{ext}".parse().unwrap();

        let err = engine.rename_selected(&h.service, &template).await.unwrap_err();
        assert!(matches!(err, BoardError::Validation(_)));
        assert_eq!(h.store.objects().len(), 5);
        assert!(engine.history().undo.is_empty());
    }

    #[tokio::test]
    async fn failed_removal_during_rename_leaves_orphan_for_repair() {
        let h = seeded();
        h.store.faults().fail_remove_of(document_path(id(1), "a.pdf"));
        let mut engine = DocumentEngine::new();
        engine.selection_mut().toggle_document(id(1), "a.pdf");
        let template: RenameTemplate = "nieuw-{stem}{ext}".parse().unwrap();

        let report = engine.rename_selected(&h.service, &template).await.unwrap();
        assert_eq!(report.failed(), 1);
        assert_eq!(docs(&h, 1), vec!["a.pdf", "b.pdf", "c.pdf"]);
        assert_eq!(
            engine.history().repairs,
            vec![PendingRepair::OrphanedCopy { task_id: id(1), name: "nieuw-a.pdf".into() }]
        );

        h.store.faults().clear();
        let repaired = engine.repair(&h.service).await.unwrap();
        assert_eq!(repaired.resolved.len(), 1);
        assert!(engine.history().repairs.is_empty());
        assert!(!h.store.objects().contains(&document_path(id(1), "nieuw-a.pdf")));
        assert!(h.store.objects().contains(&document_path(id(1), "a.pdf")));
    }

    #[tokio::test]
    async fn failed_list_write_during_rename_is_repaired_later() {
        let h = seeded();
        h.store.faults().fail_updates_for(id(2));
        let mut engine = DocumentEngine::new();
        engine.selection_mut().toggle_document(id(2), "y.pdf");
        let template: RenameTemplate = "{stem}-v2{ext}".parse().unwrap();

        engine.rename_selected(&h.service, &template).await.unwrap();
        assert_eq!(docs(&h, 2), vec!["x.pdf", "y.pdf"]);
        assert_eq!(engine.history().repairs.len(), 1);

        // Still failing: the repair stays pending.
        let again = engine.repair(&h.service).await.unwrap();
        assert_eq!(again.remaining.len(), 1);

        h.store.faults().clear();
        engine.repair(&h.service).await.unwrap();
        assert_eq!(docs(&h, 2), vec!["x.pdf", "y-v2.pdf"]);
        assert!(engine.history().repairs.is_empty());
    }

    #[tokio::test]
    async fn renames_run_in_order_within_a_task_and_interleave_across_tasks() {
        let h = seeded();
        let mut engine = DocumentEngine::new();
        let tasks = h.service.tasks().await.unwrap();
        engine.selection_mut().set_all_tasks(&tasks, true);
        let template: RenameTemplate = "{n}-{stem}{ext}".parse().unwrap();

        let report = engine.rename_selected(&h.service, &template).await.unwrap();
        assert_eq!(report.failed(), 0);

        let calls = h.store.calls();
        let of = |task: u128| -> Vec<String> {
            let key = id(task).to_string();
            calls.iter().filter(|c| c.contains(&key)).cloned().collect()
        };
        let path = |task: u128, name: &str| document_path(id(task), name);
        let steps = |task: u128, renames: &[(&str, &str)]| -> Vec<String> {
            renames
                .iter()
                .flat_map(|(old, new)| {
                    [
                        format!("copy {} {}", path(task, old), path(task, new)),
                        format!("remove {}", path(task, old)),
                        format!("update {}", id(task)),
                    ]
                })
                .collect()
        };
        assert_eq!(
            of(1),
            steps(1, &[("a.pdf", "1-a.pdf"), ("b.pdf", "2-b.pdf"), ("c.pdf", "3-c.pdf")])
        );
        assert_eq!(of(2), steps(2, &[("x.pdf", "1-x.pdf"), ("y.pdf", "2-y.pdf")]));

        let first_two = calls.iter().position(|c| c.contains(&id(2).to_string())).unwrap();
        let last_one = calls.iter().rposition(|c| c.contains(&id(1).to_string())).unwrap();
        assert!(first_two < last_one, "tasks did not interleave: {calls:?}");
    }

    #[tokio::test]
    async fn rename_statuses_pass_through_renaming() {
        let h = seeded();
        let mut engine = DocumentEngine::new();
        engine.selection_mut().toggle_document(id(1), "a.pdf");
        engine.selection_mut().toggle_document(id(1), "b.pdf");
        let statuses = engine.statuses();
        let template: RenameTemplate = "new-{stem}{ext}".parse().unwrap();

        let mut rename = std::pin::pin!(engine.rename_selected(&h.service, &template));
        while statuses.get(id(1), "a.pdf") == RenameStatus::Pending {
            assert!(futures::poll!(rename.as_mut()).is_pending());
        }
        assert_eq!(statuses.get(id(1), "a.pdf"), RenameStatus::Renaming);
        assert_eq!(statuses.get(id(1), "b.pdf"), RenameStatus::Renaming);

        while statuses.get(id(1), "new-a.pdf") != RenameStatus::Success {
            assert!(futures::poll!(rename.as_mut()).is_pending());
        }
        assert_eq!(statuses.get(id(1), "b.pdf"), RenameStatus::Renaming);

        let report = rename.await.unwrap();
        assert_eq!(report.succeeded(), 2);
        assert_eq!(statuses.get(id(1), "new-b.pdf"), RenameStatus::Success);
        assert_eq!(statuses.get(id(1), "a.pdf"), RenameStatus::Pending);
        assert_eq!(statuses.len(), 2);
    }

    #[tokio::test]
    async fn descriptors_carry_statuses() {
        let h = seeded();
        h.store.faults().fail_remove_of(document_path(id(2), "x.pdf"));
        let mut engine = DocumentEngine::new();
        engine.selection_mut().toggle_document(id(2), "x.pdf");
        engine.delete_selected(&h.service).await.unwrap();

        let task = h.service.task(id(2)).await.unwrap();
        let statuses: Vec<RenameStatus> =
            engine.descriptors(&task).iter().map(|d| d.rename_status).collect();
        assert_eq!(statuses, vec![RenameStatus::Error, RenameStatus::Pending]);
    }

    #[tokio::test]
    async fn history_survives_a_round_trip() {
        let h = seeded();
        let mut engine = DocumentEngine::new();
        engine.selection_mut().toggle_document(id(1), "b.pdf");
        engine.delete_selected(&h.service).await.unwrap();

        let mut resumed = DocumentEngine::with_history(engine.into_history());
        resumed.undo(&h.service).await.unwrap();
        assert_eq!(docs(&h, 1), vec!["a.pdf", "b.pdf", "c.pdf"]);
    }
}
