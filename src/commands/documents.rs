//! `careboard delete-docs`, `rename-docs`, `undo` and `repair` commands.
//!
//! The document history lives in the session file, so `undo` and `repair`
//! work across invocations.

use std::path::Path;

use crate::cli::SelectionArgs;
use crate::documents::{BulkReport, DocumentEngine, RenameTemplate};
use crate::model::RenameStatus;
use crate::service::BoardService;
use crate::session::SessionState;

/// Execute the `delete-docs` command.
///
/// # Errors
///
/// Returns an error string if nothing is selected, the session cannot be
/// read or written, or any document failed.
pub async fn run_delete(
    service: &BoardService,
    session_path: &Path,
    selection: &SelectionArgs,
) -> Result<(), String> {
    let (mut session, mut engine) = open(session_path)?;
    select(service, &mut engine, selection).await?;
    let result = engine.delete_selected(service).await;
    close(&mut session, engine, session_path)?;
    report(&result?)
}

/// Execute the `rename-docs` command.
///
/// # Errors
///
/// Returns an error string if nothing is selected, a new name is unusable,
/// the session cannot be read or written, or any document failed.
pub async fn run_rename(
    service: &BoardService,
    session_path: &Path,
    template: &RenameTemplate,
    selection: &SelectionArgs,
) -> Result<(), String> {
    let (mut session, mut engine) = open(session_path)?;
    select(service, &mut engine, selection).await?;
    let result = engine.rename_selected(service, template).await;
    close(&mut session, engine, session_path)?;
    let report_result = report(&result?);
    let pending = session.documents.repairs.len();
    if pending > 0 {
        eprintln!("{pending} repair(s) pending; run `careboard repair`.");
    }
    report_result
}

/// Execute the `undo` command.
///
/// # Errors
///
/// Returns an error string if there is nothing to undo or a restore failed.
pub async fn run_undo(service: &BoardService, session_path: &Path) -> Result<(), String> {
    let (mut session, mut engine) = open(session_path)?;
    let result = engine.undo(service).await;
    close(&mut session, engine, session_path)?;
    let undone = result?;
    println!("Undid {}: restored {} task list(s).", undone.operation, undone.restored.len());
    if undone.failed.is_empty() {
        return Ok(());
    }
    for (task, error) in &undone.failed {
        eprintln!("  {task}: {error}");
    }
    Err(format!("{} list(s) could not be restored", undone.failed.len()))
}

/// Execute the `repair` command.
///
/// # Errors
///
/// Returns an error string if the session cannot be read or written or some
/// repairs are still pending afterwards.
pub async fn run_repair(service: &BoardService, session_path: &Path) -> Result<(), String> {
    let (mut session, mut engine) = open(session_path)?;
    let result = engine.repair(service).await;
    close(&mut session, engine, session_path)?;
    let repaired = result?;
    if repaired.resolved.is_empty() && repaired.remaining.is_empty() {
        println!("Nothing to repair.");
        return Ok(());
    }
    for item in &repaired.resolved {
        println!("repaired  {item}");
    }
    for item in &repaired.remaining {
        println!("pending   {item}");
    }
    if repaired.remaining.is_empty() {
        Ok(())
    } else {
        Err(format!("{} repair(s) still pending", repaired.remaining.len()))
    }
}

fn open(session_path: &Path) -> Result<(SessionState, DocumentEngine), String> {
    let mut session = SessionState::load(session_path)?;
    let engine = DocumentEngine::with_history(std::mem::take(&mut session.documents));
    Ok((session, engine))
}

fn close(
    session: &mut SessionState,
    engine: DocumentEngine,
    session_path: &Path,
) -> Result<(), String> {
    session.documents = engine.into_history();
    session.save(session_path)
}

/// Applies the command-line selection to the engine.
async fn select(
    service: &BoardService,
    engine: &mut DocumentEngine,
    args: &SelectionArgs,
) -> Result<(), String> {
    if args.all {
        let tasks = service.tasks().await?;
        engine.selection_mut().set_all_tasks(&tasks, true);
    }
    let selection = engine.selection_mut();
    for task in &args.tasks {
        if !selection.is_task_selected(*task) {
            selection.toggle_task(*task);
        }
    }
    for doc in &args.docs {
        if !selection.is_document_selected(doc.task_id, &doc.name) {
            selection.toggle_document(doc.task_id, &doc.name);
        }
    }
    Ok(())
}

fn report(report: &BulkReport) -> Result<(), String> {
    for item in &report.items {
        let status = match item.status {
            RenameStatus::Success => "ok",
            _ => "FAILED",
        };
        match (&item.new_name, &item.error) {
            (_, Some(error)) => println!("{status:<6}  {}  {}: {error}", item.task_id, item.name),
            (Some(new), None) => println!("{status:<6}  {}  {} -> {new}", item.task_id, item.name),
            (None, None) => println!("{status:<6}  {}  {}", item.task_id, item.name),
        }
    }
    println!("\n{} of {} document(s) done.", report.succeeded(), report.items.len());
    match report.failed() {
        0 => Ok(()),
        n => Err(format!("{n} document(s) failed")),
    }
}
