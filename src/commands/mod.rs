//! Command dispatch and handlers.

pub mod board;
pub mod documents;
pub mod moves;
pub mod recent;
pub mod watch;

use crate::cli::Command;
use crate::config::BoardConfig;
use crate::context::ServiceContext;
use crate::service::BoardService;

/// Dispatch a parsed command to its handler.
///
/// Configuration comes from the environment (see [`BoardConfig`]). With the
/// memory backend the snapshot file is written back after the command,
/// whether it succeeded or not.
///
/// # Errors
///
/// Returns an error string if configuration is invalid or the command fails.
pub fn dispatch(command: &Command) -> Result<(), String> {
    let config = BoardConfig::from_env()?;
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("Failed to start runtime: {e}"))?;

    let service = BoardService::new(ServiceContext::from_config(&config)?);
    let result = runtime.block_on(dispatch_with_service(command, &service, &config));
    drop(service);
    result
}

/// Dispatch a command against an existing service.
async fn dispatch_with_service(
    command: &Command,
    service: &BoardService,
    config: &BoardConfig,
) -> Result<(), String> {
    match command {
        Command::Board { json } => board::run(service, *json).await,
        Command::Move { task, column } => moves::run_move(service, *task, *column).await,
        Command::Reorder { task, from, to } => moves::run_reorder(service, *task, *from, *to).await,
        Command::Drop { event } => moves::run_drop(service, event).await,
        Command::DeleteDocs { selection } => {
            documents::run_delete(service, &config.session, selection).await
        }
        Command::RenameDocs { template, selection } => {
            documents::run_rename(service, &config.session, template, selection).await
        }
        Command::Undo => documents::run_undo(service, &config.session).await,
        Command::Repair => documents::run_repair(service, &config.session).await,
        Command::Watch { count } => watch::run(service, config.backend, *count).await,
        Command::Recent { view, clear } => {
            recent::run(service, &config.session, *view, *clear).await
        }
    }
}
