//! Board service: gesture → mutation → notification → invalidate → refetch.
//!
//! The service owns the query cache and the change-feed hub. Every mutation
//! goes to the store first; only on success is the cache invalidated and the
//! task list re-fetched. A failed mutation is logged, reported through the
//! notifier and leaves the cache exactly as it was.

use std::sync::Arc;

use crate::board::{
    interpret, project, reorder, transition, Board, DocumentMove, DragCommand, DropEvent, TaskMove,
};
use crate::context::ServiceContext;
use crate::error::{BoardError, PortError};
use crate::model::{Client, Column, Task, TaskId, TaskPatch};
use crate::ports::{ChangeEvent, Notification};
use crate::sync::{bind_cache, deliver_next, ChangeFeed, QueryCache, QueryKey, SubscriptionId};

/// Task board over one service context.
pub struct BoardService {
    ctx: ServiceContext,
    cache: Arc<QueryCache>,
    feed: ChangeFeed,
    subscriptions: Vec<SubscriptionId>,
}

impl BoardService {
    /// Creates a service and subscribes its cache to the change feed.
    #[must_use]
    pub fn new(ctx: ServiceContext) -> Self {
        let cache = Arc::new(QueryCache::new());
        let feed = ChangeFeed::new();
        let subscriptions = bind_cache(&feed, &cache);
        Self { ctx, cache, feed, subscriptions }
    }

    /// The ports this service talks to.
    #[must_use]
    pub fn context(&self) -> &ServiceContext {
        &self.ctx
    }

    /// The query cache.
    #[must_use]
    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    /// The change-feed hub, for additional subscribers.
    #[must_use]
    pub fn feed(&self) -> &ChangeFeed {
        &self.feed
    }

    /// All tasks, most recently updated first.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::Fetch`] if the list had to be fetched and the fetch failed.
    pub async fn tasks(&self) -> Result<Vec<Task>, BoardError> {
        Ok(self.cache.tasks(self.ctx.store.as_ref()).await?)
    }

    /// All clients.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::Fetch`] if the list had to be fetched and the fetch failed.
    pub async fn clients(&self) -> Result<Vec<Client>, BoardError> {
        Ok(self.cache.clients(self.ctx.store.as_ref()).await?)
    }

    /// The current board projection.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::Fetch`] if the task list could not be loaded.
    pub async fn board(&self) -> Result<Board, BoardError> {
        Ok(project(&self.tasks().await?))
    }

    /// One task from the current list.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::NotFound`] if the task is not in the list.
    pub async fn task(&self, id: TaskId) -> Result<Task, BoardError> {
        self.tasks().await?.into_iter().find(|t| t.id == id).ok_or(BoardError::NotFound(id))
    }

    /// Applies a column move. Returns `false` if the move was a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::Mutation`] if the store rejected the update.
    pub async fn move_task(&self, mv: &TaskMove) -> Result<bool, BoardError> {
        let Some(patch) = transition(mv) else {
            tracing::debug!(
                task = %mv.task_id,
                column = %mv.from,
                "drop on own column, nothing to do"
            );
            return Ok(false);
        };
        self.dispatch(mv.task_id, &patch, "move task", format!("Task moved to {}", mv.to)).await?;
        Ok(true)
    }

    /// Moves a task to `to` from whichever column it is shown in now.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::NotFound`] for unknown tasks and
    /// [`BoardError::Mutation`] if the store rejected the update.
    pub async fn move_to(&self, id: TaskId, to: Column) -> Result<bool, BoardError> {
        let from = self.board().await?.locate(id).ok_or(BoardError::NotFound(id))?;
        self.move_task(&TaskMove { task_id: id, from, to }).await
    }

    /// Persists a reordered document list for one task.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::Validation`] for out-of-range indices,
    /// [`BoardError::NotFound`] for unknown tasks and
    /// [`BoardError::Mutation`] if the store rejected the update.
    pub async fn reorder_documents(&self, mv: &DocumentMove) -> Result<bool, BoardError> {
        let task = self.task(mv.task_id).await?;
        let documents = reorder(&task.documents, mv)?;
        if documents == task.documents {
            tracing::debug!(task = %mv.task_id, "document order unchanged");
            return Ok(false);
        }
        let patch = TaskPatch::documents(documents);
        self.dispatch(mv.task_id, &patch, "reorder documents", "Document order saved".to_string())
            .await?;
        Ok(true)
    }

    /// Handles a completed drag. Returns `false` if the drop had no effect.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::Validation`] for malformed drops and whatever
    /// the resulting move or reorder returns.
    pub async fn handle_drop(&self, event: &DropEvent) -> Result<bool, BoardError> {
        match interpret(event)? {
            None => Ok(false),
            Some(DragCommand::MoveTask(mv)) => self.move_task(&mv).await,
            Some(DragCommand::ReorderDocument(mv)) => self.reorder_documents(&mv).await,
        }
    }

    /// Writes a task's document list without notification or cache handling.
    ///
    /// Used by the bulk engine, which reports and refreshes once per batch.
    ///
    /// # Errors
    ///
    /// Returns the store error.
    pub async fn write_documents(&self, id: TaskId, documents: &[String]) -> Result<(), PortError> {
        let patch = TaskPatch::documents(documents.to_vec());
        self.ctx.store.update_task(id, &patch).await
    }

    /// Invalidates the task list and re-fetches it.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::Fetch`] if the re-fetch failed; the entry stays stale.
    pub async fn refresh(&self) -> Result<(), BoardError> {
        self.cache.invalidate(QueryKey::Tasks);
        self.tasks().await.map(|_| ())
    }

    /// Reports a mutation outcome through the notifier.
    pub fn notify(&self, notification: Notification) {
        self.ctx.notifier.notify(notification);
    }

    /// Waits for the next remote change and publishes it to the hub.
    /// `Ok(None)` when the feed closed.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::Fetch`] if the feed transport failed.
    pub async fn sync_next(&self) -> Result<Option<ChangeEvent>, BoardError> {
        Ok(deliver_next(self.ctx.changes.as_ref(), &self.feed).await?)
    }

    async fn dispatch(
        &self,
        id: TaskId,
        patch: &TaskPatch,
        operation: &'static str,
        success: String,
    ) -> Result<(), BoardError> {
        tracing::info!(task = %id, operation, "dispatching mutation");
        if let Err(e) = self.ctx.store.update_task(id, patch).await {
            tracing::error!(task = %id, operation, error = %e, "mutation failed");
            self.notify(Notification::failure(format!("Failed to {operation}: {e}")));
            return Err(BoardError::mutation(operation, &e));
        }
        self.notify(Notification::success(success));
        if let Err(e) = self.refresh().await {
            tracing::warn!(error = %e, "re-fetch after mutation failed");
        }
        Ok(())
    }
}

impl Drop for BoardService {
    fn drop(&mut self) {
        for id in self.subscriptions.drain(..) {
            self.feed.unsubscribe(id);
        }
    }
}
