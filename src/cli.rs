//! CLI argument definitions.

use std::str::FromStr;

use clap::{Args, Parser, Subcommand};

use crate::documents::RenameTemplate;
use crate::model::{ClientId, Column, TaskId};

/// Top-level CLI parser for `careboard`.
#[derive(Debug, Parser)]
#[command(name = "careboard", version, about = "Task board for home-care case management")]
pub struct Cli {
    /// The command to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Supported top-level subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show every column with its tasks.
    Board {
        /// Print the board as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Move a task to a column (`urgent`, `nieuw`, `in_behandeling`, ...).
    Move {
        /// Task to move.
        task: TaskId,
        /// Destination column.
        column: Column,
    },
    /// Move one document within a task's list.
    Reorder {
        /// Owning task.
        task: TaskId,
        /// Current index.
        from: usize,
        /// New index.
        to: usize,
    },
    /// Apply a drop event given as JSON.
    Drop {
        /// `{"draggableId", "source": {"containerId", "index"}, "destination": ...}`.
        event: String,
    },
    /// Delete the selected documents.
    DeleteDocs {
        /// Which documents.
        #[command(flatten)]
        selection: SelectionArgs,
    },
    /// Rename the selected documents using a template.
    RenameDocs {
        /// New-name template with `{stem}`, `{ext}`, `{n}` and `{task}`.
        template: RenameTemplate,
        /// Which documents.
        #[command(flatten)]
        selection: SelectionArgs,
    },
    /// Undo the most recent bulk document operation.
    Undo,
    /// Retry cleanup left behind by partially failed renames.
    Repair,
    /// Follow the change feed and print each remote change.
    ///
    /// Requires the rest backend; the memory backend has no remote writers.
    Watch {
        /// Stop after this many events.
        #[arg(long)]
        count: Option<u64>,
    },
    /// Show, record or clear recently viewed clients.
    Recent {
        /// Record a view of this client.
        #[arg(long, conflicts_with = "clear")]
        view: Option<ClientId>,
        /// Forget the whole session.
        #[arg(long)]
        clear: bool,
    },
}

/// Document selection shared by the bulk commands.
#[derive(Debug, Args)]
pub struct SelectionArgs {
    /// Select one document, as `TASK_ID:NAME`. Repeatable.
    #[arg(long = "doc", value_name = "TASK_ID:NAME")]
    pub docs: Vec<DocRef>,
    /// Select every document of a task. Repeatable.
    #[arg(long = "task", value_name = "TASK_ID")]
    pub tasks: Vec<TaskId>,
    /// Select every document of every task.
    #[arg(long)]
    pub all: bool,
}

/// A `TASK_ID:NAME` reference to one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocRef {
    /// Owning task.
    pub task_id: TaskId,
    /// Document name.
    pub name: String,
}

impl FromStr for DocRef {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (task, name) =
            s.split_once(':').ok_or_else(|| format!("expected TASK_ID:NAME, got {s:?}"))?;
        let task_id = task.parse().map_err(|e| format!("invalid task id {task:?}: {e}"))?;
        if name.is_empty() {
            return Err(format!("missing document name in {s:?}"));
        }
        Ok(Self { task_id, name: name.to_string() })
    }
}
