//! `careboard watch` command.

use crate::config::Backend;
use crate::service::BoardService;

/// Execute the `watch` command.
///
/// Loads the board, then prints one line per remote change with the task
/// count after the cache re-fetched. Runs until the feed closes or `count`
/// events were seen.
///
/// The memory backend only publishes writes made by the running process, so
/// it is rejected up front instead of blocking forever.
///
/// # Errors
///
/// Returns an error string on the memory backend, or if the feed transport
/// or a re-fetch fails.
pub async fn run(
    service: &BoardService,
    backend: Backend,
    count: Option<u64>,
) -> Result<(), String> {
    if backend == Backend::Memory {
        return Err("watch needs the rest backend (set CAREBOARD_URL); \
            the memory backend only sees its own writes"
            .to_string());
    }

    let board = service.board().await?;
    println!("Watching for changes ({} task(s) on the board)...", board.len());

    let mut seen = 0;
    while count.is_none_or(|max| seen < max) {
        let Some(event) = service.sync_next().await? else {
            println!("Change feed closed.");
            break;
        };
        seen += 1;
        let board = service.board().await?;
        println!("{} {} -> {} task(s)", event.entity, event.operation, board.len());
    }
    Ok(())
}
