//! In-memory remote store: tasks, clients, document objects and a broadcast
//! change feed, with fault injection for failure-path tests.

use std::collections::{BTreeSet, HashSet, VecDeque};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use super::clock::SteppingClock;
use crate::error::PortError;
use crate::model::{Client, Task, TaskId, TaskPatch};
use crate::ports::{
    ChangeEvent, ChangeFeedSource, Clock, Entity, FeedOperation, ObjectStorage, PortFuture,
    TaskStore,
};

const FEED_CAPACITY: usize = 256;

/// Serialized form of a [`MemoryStore`], used by the `memory` backend.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemorySnapshot {
    /// Task rows.
    #[serde(default)]
    pub tasks: Vec<Task>,
    /// Client rows.
    #[serde(default)]
    pub clients: Vec<Client>,
    /// Paths of stored document objects.
    #[serde(default)]
    pub objects: BTreeSet<String>,
}

/// Failures to inject into the next store or storage calls.
#[derive(Debug, Default)]
pub struct Faults {
    fetches: AtomicUsize,
    updates: Mutex<HashSet<TaskId>>,
    copies: Mutex<HashSet<String>>,
    removals: Mutex<HashSet<String>>,
}

impl Faults {
    /// Makes the next task or client fetch fail.
    pub fn fail_next_fetch(&self) {
        self.fetches.fetch_add(1, Ordering::SeqCst);
    }

    /// Makes every update of the task fail until cleared.
    pub fn fail_updates_for(&self, id: TaskId) {
        self.updates.lock().expect("faults lock poisoned").insert(id);
    }

    /// Makes every copy from `path` fail until cleared.
    pub fn fail_copy_from(&self, path: impl Into<String>) {
        self.copies.lock().expect("faults lock poisoned").insert(path.into());
    }

    /// Makes every removal of `path` fail until cleared.
    pub fn fail_remove_of(&self, path: impl Into<String>) {
        self.removals.lock().expect("faults lock poisoned").insert(path.into());
    }

    /// Clears every injected failure.
    pub fn clear(&self) {
        self.fetches.store(0, Ordering::SeqCst);
        self.updates.lock().expect("faults lock poisoned").clear();
        self.copies.lock().expect("faults lock poisoned").clear();
        self.removals.lock().expect("faults lock poisoned").clear();
    }

    fn take_fetch(&self) -> bool {
        self.fetches
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }

    fn update_fails(&self, id: TaskId) -> bool {
        self.updates.lock().expect("faults lock poisoned").contains(&id)
    }

    fn copy_fails(&self, path: &str) -> bool {
        self.copies.lock().expect("faults lock poisoned").contains(path)
    }

    fn remove_fails(&self, path: &str) -> bool {
        self.removals.lock().expect("faults lock poisoned").contains(path)
    }
}

#[derive(Debug, Default)]
struct State {
    tasks: Vec<Task>,
    clients: Vec<Client>,
    objects: BTreeSet<String>,
}

/// Remote store held in process memory.
///
/// Every write stamps `updated_at` from the store's clock and publishes a
/// change event to all subscribers, like a database trigger would.
pub struct MemoryStore {
    state: Mutex<State>,
    clock: Box<dyn Clock>,
    events: broadcast::Sender<ChangeEvent>,
    faults: Faults,
    calls: Mutex<Vec<String>>,
}

impl MemoryStore {
    /// Creates an empty store with a deterministic stepping clock.
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(Box::new(SteppingClock::default()))
    }

    /// Creates an empty store stamping writes with the given clock.
    #[must_use]
    pub fn with_clock(clock: Box<dyn Clock>) -> Self {
        let (events, _) = broadcast::channel(FEED_CAPACITY);
        Self {
            state: Mutex::new(State::default()),
            clock,
            events,
            faults: Faults::default(),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Creates a store holding the rows of a snapshot as-is.
    #[must_use]
    pub fn from_snapshot(snapshot: MemorySnapshot, clock: Box<dyn Clock>) -> Self {
        let store = Self::with_clock(clock);
        {
            let mut state = store.lock();
            state.tasks = snapshot.tasks;
            state.clients = snapshot.clients;
            state.objects = snapshot.objects;
        }
        store
    }

    /// Loads a YAML snapshot file; a missing file yields an empty store.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path, clock: Box<dyn Clock>) -> Result<Self, String> {
        if !path.exists() {
            return Ok(Self::with_clock(clock));
        }
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read snapshot {}: {e}", path.display()))?;
        let snapshot: MemorySnapshot = serde_yaml::from_str(&content)
            .map_err(|e| format!("Failed to parse snapshot {}: {e}", path.display()))?;
        Ok(Self::from_snapshot(snapshot, clock))
    }

    /// Writes the current rows and objects to a YAML snapshot file.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn save(&self, path: &Path) -> Result<(), String> {
        let yaml = serde_yaml::to_string(&self.snapshot())
            .map_err(|e| format!("Failed to serialize snapshot: {e}"))?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create {}: {e}", parent.display()))?;
        }
        std::fs::write(path, yaml)
            .map_err(|e| format!("Failed to write snapshot {}: {e}", path.display()))
    }

    /// Current rows and objects.
    #[must_use]
    pub fn snapshot(&self) -> MemorySnapshot {
        let state = self.lock();
        MemorySnapshot {
            tasks: state.tasks.clone(),
            clients: state.clients.clone(),
            objects: state.objects.clone(),
        }
    }

    /// Inserts a task row, stamping `updated_at`.
    pub fn insert_task(&self, mut task: Task) {
        task.updated_at = self.clock.now();
        self.lock().tasks.push(task);
        self.publish(Entity::Tasks, FeedOperation::Insert);
    }

    /// Deletes a task row. Returns `true` if it existed.
    pub fn delete_task(&self, id: TaskId) -> bool {
        let removed = {
            let mut state = self.lock();
            let before = state.tasks.len();
            state.tasks.retain(|t| t.id != id);
            state.tasks.len() != before
        };
        if removed {
            self.publish(Entity::Tasks, FeedOperation::Delete);
        }
        removed
    }

    /// Inserts a client row.
    pub fn insert_client(&self, mut client: Client) {
        client.updated_at = Some(self.clock.now());
        self.lock().clients.push(client);
        self.publish(Entity::Clients, FeedOperation::Insert);
    }

    /// Stores an object at `path` without going through the storage port.
    pub fn put_object(&self, path: impl Into<String>) {
        self.lock().objects.insert(path.into());
    }

    /// Paths of all stored objects, sorted.
    #[must_use]
    pub fn objects(&self) -> Vec<String> {
        self.lock().objects.iter().cloned().collect()
    }

    /// Reads one task row directly.
    #[must_use]
    pub fn task(&self, id: TaskId) -> Option<Task> {
        self.lock().tasks.iter().find(|t| t.id == id).cloned()
    }

    /// Injected failures.
    #[must_use]
    pub fn faults(&self) -> &Faults {
        &self.faults
    }

    /// Opens a new change-feed subscription.
    #[must_use]
    pub fn subscribe(&self) -> MemoryFeed {
        MemoryFeed {
            inner: tokio::sync::Mutex::new(FeedState {
                receiver: self.events.subscribe(),
                backlog: VecDeque::new(),
            }),
        }
    }

    fn publish(&self, entity: Entity, operation: FeedOperation) {
        // No subscribers is fine.
        let _ = self.events.send(ChangeEvent::new(entity, operation));
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().expect("store lock poisoned")
    }

    /// Every write that reached the store, in order, as `"copy FROM TO"`,
    /// `"remove PATH"` or `"update TASK_ID"`. Failed writes are included.
    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("calls lock poisoned").clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().expect("calls lock poisoned").push(call);
    }

    fn apply_update(&self, id: TaskId, patch: &TaskPatch) -> Result<(), PortError> {
        self.record(format!("update {id}"));
        if self.faults.update_fails(id) {
            return Err(format!("update of task {id} rejected").into());
        }
        let now = self.clock.now();
        {
            let mut state = self.lock();
            let task = state
                .tasks
                .iter_mut()
                .find(|t| t.id == id)
                .ok_or_else(|| format!("task {id} not found"))?;
            patch.apply_to(task);
            task.updated_at = now;
        }
        self.publish(Entity::Tasks, FeedOperation::Update);
        Ok(())
    }

    fn apply_copy(&self, from: &str, to: &str) -> Result<(), PortError> {
        self.record(format!("copy {from} {to}"));
        if self.faults.copy_fails(from) {
            return Err(format!("copy of {from} rejected").into());
        }
        let mut state = self.lock();
        if !state.objects.contains(from) {
            return Err(format!("object {from} not found").into());
        }
        if !state.objects.insert(to.to_string()) {
            return Err(format!("object {to} already exists").into());
        }
        Ok(())
    }

    fn apply_remove(&self, path: &str) -> Result<(), PortError> {
        self.record(format!("remove {path}"));
        if self.faults.remove_fails(path) {
            return Err(format!("removal of {path} rejected").into());
        }
        self.lock().objects.remove(path);
        Ok(())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskStore for MemoryStore {
    fn fetch_tasks(&self) -> PortFuture<'_, Vec<Task>> {
        Box::pin(async move {
            if self.faults.take_fetch() {
                return Err("task fetch failed".into());
            }
            let mut tasks = self.lock().tasks.clone();
            tasks.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
            Ok(tasks)
        })
    }

    fn fetch_clients(&self) -> PortFuture<'_, Vec<Client>> {
        Box::pin(async move {
            if self.faults.take_fetch() {
                return Err("client fetch failed".into());
            }
            let mut clients = self.lock().clients.clone();
            clients.sort_by(|a, b| a.name.cmp(&b.name));
            Ok(clients)
        })
    }

    fn update_task<'a>(&'a self, id: TaskId, patch: &'a TaskPatch) -> PortFuture<'a, ()> {
        Box::pin(async move {
            // Yield so concurrent callers interleave like real network calls.
            tokio::task::yield_now().await;
            self.apply_update(id, patch)
        })
    }
}

impl ObjectStorage for MemoryStore {
    fn copy<'a>(&'a self, from: &'a str, to: &'a str) -> PortFuture<'a, ()> {
        Box::pin(async move {
            tokio::task::yield_now().await;
            self.apply_copy(from, to)
        })
    }

    fn remove<'a>(&'a self, path: &'a str) -> PortFuture<'a, ()> {
        Box::pin(async move {
            tokio::task::yield_now().await;
            self.apply_remove(path)
        })
    }

    fn exists<'a>(&'a self, path: &'a str) -> PortFuture<'a, bool> {
        Box::pin(async move { Ok(self.lock().objects.contains(path)) })
    }
}

struct FeedState {
    receiver: broadcast::Receiver<ChangeEvent>,
    backlog: VecDeque<ChangeEvent>,
}

/// A subscription to a [`MemoryStore`]'s change feed.
pub struct MemoryFeed {
    inner: tokio::sync::Mutex<FeedState>,
}

impl ChangeFeedSource for MemoryFeed {
    fn next_event(&self) -> PortFuture<'_, Option<ChangeEvent>> {
        Box::pin(async move {
            let mut feed = self.inner.lock().await;
            if let Some(event) = feed.backlog.pop_front() {
                return Ok(Some(event));
            }
            match feed.receiver.recv().await {
                Ok(event) => Ok(Some(event)),
                Err(broadcast::error::RecvError::Closed) => Ok(None),
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    // Which tables changed is unknown: invalidate both.
                    tracing::warn!(missed, "change feed lagged, invalidating everything");
                    feed.backlog.push_back(ChangeEvent::new(Entity::Clients, FeedOperation::Any));
                    Ok(Some(ChangeEvent::new(Entity::Tasks, FeedOperation::Any)))
                }
            }
        })
    }
}
