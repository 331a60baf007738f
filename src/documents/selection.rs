//! Multi-select state for bulk document operations.

use std::collections::{BTreeMap, BTreeSet};

use crate::model::{Task, TaskId};

/// The selected documents of one task, in list order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedDocuments {
    /// Owning task.
    pub task_id: TaskId,
    /// The task's full list at resolution time.
    pub current: Vec<String>,
    /// Selected names, in the order they appear in `current`.
    pub names: Vec<String>,
}

/// Selected tasks plus, per task, selected document names.
///
/// Selecting a task selects all of its documents.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    tasks: BTreeSet<TaskId>,
    documents: BTreeMap<TaskId, BTreeSet<String>>,
}

impl Selection {
    /// An empty selection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Flips one task. Returns whether it is selected afterwards.
    pub fn toggle_task(&mut self, id: TaskId) -> bool {
        if self.tasks.remove(&id) {
            false
        } else {
            self.tasks.insert(id)
        }
    }

    /// Flips one document. Returns whether it is selected afterwards.
    pub fn toggle_document(&mut self, task_id: TaskId, name: &str) -> bool {
        let names = self.documents.entry(task_id).or_default();
        let selected = if names.remove(name) { false } else { names.insert(name.to_string()) };
        if names.is_empty() {
            self.documents.remove(&task_id);
        }
        selected
    }

    /// Global "select all tasks": selects every task, or clears the task selection.
    pub fn set_all_tasks(&mut self, tasks: &[Task], selected: bool) {
        self.tasks = if selected { tasks.iter().map(|t| t.id).collect() } else { BTreeSet::new() };
    }

    /// Per-task "select all documents": selects every document of the task, or none.
    pub fn set_all_documents(&mut self, task: &Task, selected: bool) {
        if selected && !task.documents.is_empty() {
            self.documents.insert(task.id, task.documents.iter().cloned().collect());
        } else {
            self.documents.remove(&task.id);
        }
    }

    /// Whether the task itself is selected.
    #[must_use]
    pub fn is_task_selected(&self, id: TaskId) -> bool {
        self.tasks.contains(&id)
    }

    /// Whether a document is selected, directly or through its task.
    #[must_use]
    pub fn is_document_selected(&self, task_id: TaskId, name: &str) -> bool {
        self.tasks.contains(&task_id)
            || self.documents.get(&task_id).is_some_and(|n| n.contains(name))
    }

    /// Whether nothing at all is selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty() && self.documents.is_empty()
    }

    /// Drops one document from the selection, including when it was only
    /// selected through its task.
    pub fn deselect(&mut self, task_id: TaskId, name: &str, remaining: &[String]) {
        if self.tasks.remove(&task_id) {
            let rest: BTreeSet<String> = remaining.iter().filter(|n| *n != name).cloned().collect();
            if !rest.is_empty() {
                self.documents.insert(task_id, rest);
            }
        }
        if let Some(names) = self.documents.get_mut(&task_id) {
            names.remove(name);
            if names.is_empty() {
                self.documents.remove(&task_id);
            }
        }
    }

    /// Clears everything.
    pub fn clear(&mut self) {
        self.tasks.clear();
        self.documents.clear();
    }

    /// Resolves the selection against the current task list.
    ///
    /// Groups follow the order of `tasks`; names follow each task's list
    /// order. Names no longer in the list and tasks without selected
    /// documents are left out.
    #[must_use]
    pub fn resolve(&self, tasks: &[Task]) -> Vec<SelectedDocuments> {
        tasks
            .iter()
            .filter_map(|task| {
                let whole_task = self.tasks.contains(&task.id);
                let picked = self.documents.get(&task.id);
                let names: Vec<String> = task
                    .documents
                    .iter()
                    .filter(|name| whole_task || picked.is_some_and(|p| p.contains(*name)))
                    .cloned()
                    .collect();
                (!names.is_empty()).then(|| SelectedDocuments {
                    task_id: task.id,
                    current: task.documents.clone(),
                    names,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn task(n: u128, docs: &[&str]) -> Task {
        let mut task = Task::new(Uuid::from_u128(n), Utc::now());
        task.documents = docs.iter().map(|d| (*d).to_string()).collect();
        task
    }

    #[test]
    fn toggling_twice_deselects() {
        let mut sel = Selection::new();
        let id = Uuid::from_u128(1);
        assert!(sel.toggle_document(id, "a.pdf"));
        assert!(!sel.toggle_document(id, "a.pdf"));
        assert!(sel.is_empty());
        assert!(sel.toggle_task(id));
        assert!(!sel.toggle_task(id));
        assert!(sel.is_empty());
    }

    #[test]
    fn resolve_follows_list_order_and_merges_task_selection() {
        let tasks = vec![task(1, &["a.pdf", "b.pdf", "c.pdf"]), task(2, &["x.pdf", "y.pdf"])];
        let mut sel = Selection::new();
        sel.toggle_document(Uuid::from_u128(1), "c.pdf");
        sel.toggle_document(Uuid::from_u128(1), "a.pdf");
        sel.toggle_task(Uuid::from_u128(2));

        let groups = sel.resolve(&tasks);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].names, vec!["a.pdf", "c.pdf"]);
        assert_eq!(groups[1].names, vec!["x.pdf", "y.pdf"]);
        assert_eq!(groups[1].current, vec!["x.pdf", "y.pdf"]);
    }

    #[test]
    fn resolve_skips_vanished_names_and_empty_tasks() {
        let tasks = vec![task(1, &["a.pdf"]), task(2, &[])];
        let mut sel = Selection::new();
        sel.toggle_document(Uuid::from_u128(1), "gone.pdf");
        sel.toggle_task(Uuid::from_u128(2));
        assert!(sel.resolve(&tasks).is_empty());
    }

    #[test]
    fn select_all_is_set_assignment() {
        let tasks = vec![task(1, &["a.pdf", "b.pdf"]), task(2, &["x.pdf"])];
        let mut sel = Selection::new();
        sel.set_all_tasks(&tasks, true);
        assert!(sel.is_task_selected(Uuid::from_u128(2)));
        sel.set_all_tasks(&tasks, true);
        sel.set_all_tasks(&tasks, false);
        assert!(sel.is_empty());

        sel.set_all_documents(&tasks[0], true);
        assert!(sel.is_document_selected(Uuid::from_u128(1), "b.pdf"));
        sel.set_all_documents(&tasks[0], false);
        assert!(sel.is_empty());
    }

    #[test]
    fn deselect_splits_a_task_selection() {
        let t = task(1, &["a.pdf", "b.pdf"]);
        let mut sel = Selection::new();
        sel.toggle_task(t.id);
        sel.deselect(t.id, "a.pdf", &t.documents);
        assert!(!sel.is_task_selected(t.id));
        assert!(!sel.is_document_selected(t.id, "a.pdf"));
        assert!(sel.is_document_selected(t.id, "b.pdf"));
    }
}
