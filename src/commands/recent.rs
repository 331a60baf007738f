//! `careboard recent` command.

use std::path::Path;

use crate::model::ClientId;
use crate::service::BoardService;
use crate::session::SessionState;

/// Execute the `recent` command.
///
/// With `view`, records that the client was viewed first. With `clear`,
/// deletes the whole session file, undo history included.
///
/// # Errors
///
/// Returns an error string if the client is unknown or the session file
/// cannot be read or written.
pub async fn run(
    service: &BoardService,
    session_path: &Path,
    view: Option<ClientId>,
    clear: bool,
) -> Result<(), String> {
    if clear {
        SessionState::clear(session_path)?;
        println!("Session cleared.");
        return Ok(());
    }

    let mut session = SessionState::load(session_path)?;
    if let Some(id) = view {
        let clients = service.clients().await?;
        let client = clients
            .iter()
            .find(|c| c.id == id)
            .ok_or_else(|| format!("client {id} not found"))?;
        session.record_client_view(client, service.context().clock.now());
        session.save(session_path)?;
    }

    if session.recent_clients.is_empty() {
        println!("No recently viewed clients.");
    }
    for client in &session.recent_clients {
        println!("{}  {}  {}", client.viewed_at.format("%Y-%m-%d %H:%M"), client.id, client.name);
    }
    Ok(())
}
