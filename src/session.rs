//! Session state that survives between runs: recently viewed clients and the
//! bulk-document history (undo stack and pending repairs).
//!
//! The state is an explicit value. Commands load it, pass it along and save
//! it back; nothing reads it implicitly.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::documents::DocumentHistory;
use crate::model::{Client, ClientId};

/// How many recently viewed clients are remembered.
pub const MAX_RECENT_CLIENTS: usize = 5;

/// A client the user looked at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentClient {
    /// Client identifier.
    pub id: ClientId,
    /// Display name at the time of viewing.
    pub name: String,
    /// When it was viewed.
    pub viewed_at: DateTime<Utc>,
}

/// Persisted per-user session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    /// Most recent first, at most [`MAX_RECENT_CLIENTS`], no duplicates.
    #[serde(default)]
    pub recent_clients: Vec<RecentClient>,
    /// Undo stack and pending repairs of the document engine.
    #[serde(default)]
    pub documents: DocumentHistory,
}

impl SessionState {
    /// Loads the session file; a missing file starts a fresh session.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, String> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read session {}: {e}", path.display()))?;
        serde_json::from_str(&content)
            .map_err(|e| format!("Failed to parse session {}: {e}", path.display()))
    }

    /// Writes the session file, creating its directory if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn save(&self, path: &Path) -> Result<(), String> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| format!("Failed to serialize session: {e}"))?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create {}: {e}", parent.display()))?;
        }
        std::fs::write(path, json)
            .map_err(|e| format!("Failed to write session {}: {e}", path.display()))
    }

    /// Deletes the session file. A missing file is fine.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists and cannot be removed.
    pub fn clear(path: &Path) -> Result<(), String> {
        match std::fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(format!("Failed to remove session {}: {e}", path.display())),
        }
    }

    /// Puts a client at the front of the recent list.
    pub fn record_client_view(&mut self, client: &Client, at: DateTime<Utc>) {
        self.recent_clients.retain(|c| c.id != client.id);
        self.recent_clients.insert(
            0,
            RecentClient { id: client.id, name: client.name.clone(), viewed_at: at },
        );
        self.recent_clients.truncate(MAX_RECENT_CLIENTS);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn client(n: u128) -> Client {
        Client { id: Uuid::from_u128(n), name: format!("Cliënt {n}"), updated_at: None }
    }

    #[test]
    fn recent_clients_are_deduplicated_and_capped() {
        let mut session = SessionState::default();
        for n in 1..=7 {
            session.record_client_view(&client(n), Utc::now());
        }
        session.record_client_view(&client(5), Utc::now());

        let ids: Vec<u128> = session.recent_clients.iter().map(|c| c.id.as_u128()).collect();
        assert_eq!(ids, vec![5, 7, 6, 4, 3]);
    }

    #[test]
    fn load_save_clear_lifecycle() {
        let dir = std::env::temp_dir().join("careboard_session_test");
        let _ = std::fs::remove_dir_all(&dir);
        let path = dir.join("nested").join("session.json");

        assert_eq!(SessionState::load(&path).unwrap(), SessionState::default());

        let mut session = SessionState::default();
        session.record_client_view(&client(1), Utc::now());
        session.save(&path).unwrap();
        assert_eq!(SessionState::load(&path).unwrap(), session);

        SessionState::clear(&path).unwrap();
        SessionState::clear(&path).unwrap();
        assert_eq!(SessionState::load(&path).unwrap(), SessionState::default());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = std::env::temp_dir().join("careboard_session_corrupt_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("session.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(SessionState::load(&path).is_err());
        let _ = std::fs::remove_dir_all(&dir);
    }
}
