//! Task, client and document types as stored in the remote store.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::stage::{lenient_stage, lenient_urgency, Column, Urgency, WorkflowStage};

/// Identifier of a task row.
pub type TaskId = Uuid;

/// Identifier of a client row.
pub type ClientId = Uuid;

/// A task on the board, mirroring one row of the `taken` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Unique task identifier.
    pub id: TaskId,
    /// The client this task belongs to.
    #[serde(default)]
    pub client_id: Option<ClientId>,
    /// Free-text description.
    #[serde(rename = "beschrijving", default)]
    pub description: Option<String>,
    /// Workflow stage.
    #[serde(rename = "status", deserialize_with = "lenient_stage", default)]
    pub stage: WorkflowStage,
    /// Urgency overlay.
    #[serde(rename = "prioriteit", deserialize_with = "lenient_urgency", default)]
    pub urgency: Urgency,
    /// Optional deadline.
    #[serde(default)]
    pub deadline: Option<NaiveDate>,
    /// Optional scheduled date.
    #[serde(rename = "taak_datum", default)]
    pub scheduled_date: Option<NaiveDate>,
    /// Optional scheduled time of day.
    #[serde(rename = "taak_tijd", default)]
    pub scheduled_time: Option<NaiveTime>,
    /// Free-text notes.
    #[serde(rename = "notities", default)]
    pub notes: Option<String>,
    /// Optional insurer reference.
    #[serde(rename = "verzekeraar_id", default)]
    pub insurer_id: Option<Uuid>,
    /// Ordered list of attached document names.
    #[serde(rename = "upload_documenten", default, with = "document_list")]
    pub documents: Vec<String>,
    /// Last modification time, maintained by the store.
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Creates a task in stage `new` with normal urgency and no documents.
    #[must_use]
    pub fn new(id: TaskId, updated_at: DateTime<Utc>) -> Self {
        Self {
            id,
            client_id: None,
            description: None,
            stage: WorkflowStage::New,
            urgency: Urgency::Normal,
            deadline: None,
            scheduled_date: None,
            scheduled_time: None,
            notes: None,
            insurer_id: None,
            documents: Vec::new(),
            updated_at,
        }
    }

    /// The single column this task is shown in.
    #[must_use]
    pub fn column(&self) -> Column {
        match self.urgency {
            Urgency::Urgent => Column::Urgent,
            Urgency::Normal => Column::Stage(self.stage),
        }
    }

    /// Document descriptors for this task's list, all in `pending` state.
    #[must_use]
    pub fn descriptors(&self) -> Vec<DocumentDescriptor> {
        self.documents
            .iter()
            .enumerate()
            .map(|(position, name)| DocumentDescriptor::new(self.id, position, name))
            .collect()
    }
}

/// A client row from the `clienten` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    /// Unique client identifier.
    pub id: ClientId,
    /// Display name.
    #[serde(rename = "naam")]
    pub name: String,
    /// Last modification time, maintained by the store.
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Storage path of a task document: `tasks/{taskId}/{fileName}`.
#[must_use]
pub fn document_path(task_id: TaskId, name: &str) -> String {
    format!("tasks/{task_id}/{name}")
}

/// Progress of one document in a bulk rename.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenameStatus {
    /// Not touched yet.
    #[default]
    Pending,
    /// Rename chain in flight.
    Renaming,
    /// Renamed and list updated.
    Success,
    /// Some step of the chain failed.
    Error,
}

impl RenameStatus {
    /// Whether the status is terminal for a bulk rename.
    #[must_use]
    pub fn is_settled(self) -> bool {
        matches!(self, RenameStatus::Success | RenameStatus::Error)
    }
}

/// Metadata for one uploaded file attached to a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentDescriptor {
    /// File name as stored in the task's list.
    pub name: String,
    /// Object path in storage.
    pub path: String,
    /// Index in the owning task's ordered list.
    pub position: usize,
    /// Transient rename progress.
    pub rename_status: RenameStatus,
}

impl DocumentDescriptor {
    /// Builds a `pending` descriptor for the document at `position`.
    #[must_use]
    pub fn new(task_id: TaskId, position: usize, name: &str) -> Self {
        Self {
            name: name.to_string(),
            path: document_path(task_id, name),
            position,
            rename_status: RenameStatus::Pending,
        }
    }
}

/// Partial update sent to the store for one task.
///
/// Only the fields an operation is allowed to write are set; the rest are
/// omitted from the serialized body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TaskPatch {
    /// New workflow stage.
    #[serde(rename = "status", skip_serializing_if = "Option::is_none")]
    pub stage: Option<WorkflowStage>,
    /// New urgency.
    #[serde(rename = "prioriteit", skip_serializing_if = "Option::is_none")]
    pub urgency: Option<Urgency>,
    /// Replacement document list.
    #[serde(
        rename = "upload_documenten",
        skip_serializing_if = "Option::is_none",
        serialize_with = "document_list::serialize_some"
    )]
    pub documents: Option<Vec<String>>,
}

impl TaskPatch {
    /// A patch that only replaces the document list.
    #[must_use]
    pub fn documents(documents: Vec<String>) -> Self {
        Self { documents: Some(documents), ..Self::default() }
    }

    /// Returns `true` when the patch would not change anything.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stage.is_none() && self.urgency.is_none() && self.documents.is_none()
    }

    /// Applies the patch to an in-memory task.
    pub fn apply_to(&self, task: &mut Task) {
        if let Some(stage) = self.stage {
            task.stage = stage;
        }
        if let Some(urgency) = self.urgency {
            task.urgency = urgency;
        }
        if let Some(documents) = &self.documents {
            task.documents.clone_from(documents);
        }
    }
}

/// Serde helpers for `upload_documenten`.
///
/// The column holds a JSON-encoded string array. Reads also accept a plain
/// array and `null`; an encoded value that does not parse decodes as an
/// empty list.
mod document_list {
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        List(Vec<String>),
        Encoded(String),
    }

    pub fn serialize<S>(names: &[String], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let encoded = serde_json::to_string(names).map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&encoded)
    }

    #[allow(clippy::ref_option)]
    pub fn serialize_some<S>(names: &Option<Vec<String>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serialize(names.as_deref().unwrap_or_default(), serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<Raw>::deserialize(deserializer)? {
            None => Ok(Vec::new()),
            Some(Raw::List(names)) => Ok(names),
            Some(Raw::Encoded(text)) if text.trim().is_empty() => Ok(Vec::new()),
            Some(Raw::Encoded(text)) => Ok(serde_json::from_str(&text).unwrap_or_else(|err| {
                tracing::warn!(%err, value = %text, "malformed document list, treating as empty");
                Vec::new()
            })),
        }
    }
}
