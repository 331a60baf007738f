//! Object storage port for task documents.

use super::PortFuture;

/// Stores uploaded task documents under `tasks/{taskId}/{fileName}`.
///
/// There is no atomic move: a rename is a [`copy`](ObjectStorage::copy)
/// followed by a [`remove`](ObjectStorage::remove).
pub trait ObjectStorage: Send + Sync {
    /// Copies the object at `from` to `to`, overwriting nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if the source is missing or the target already exists.
    fn copy<'a>(&'a self, from: &'a str, to: &'a str) -> PortFuture<'a, ()>;

    /// Removes the object at `path`. Removing an absent object succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage backend rejects the removal.
    fn remove<'a>(&'a self, path: &'a str) -> PortFuture<'a, ()>;

    /// Returns `true` if an object exists at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage backend cannot be queried.
    fn exists<'a>(&'a self, path: &'a str) -> PortFuture<'a, bool>;
}
