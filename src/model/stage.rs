//! Workflow stage, urgency and board column enums.
//!
//! The persisted literals are the Dutch values stored in the `taken` table.
//! Parsing caller input is strict; decoding persisted rows is lenient and maps
//! unknown literals to a safe default with a warning.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

/// Error returned when a stage, urgency or column literal is not recognized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseEnumError {
    /// Which enum was being parsed (e.g. "workflow stage").
    pub kind: &'static str,
    /// The rejected input.
    pub value: String,
}

impl fmt::Display for ParseEnumError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown {}: {:?}", self.kind, self.value)
    }
}

impl std::error::Error for ParseEnumError {}

/// Primary lifecycle phase of a task.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub enum WorkflowStage {
    /// Freshly created, nobody has picked it up yet.
    #[default]
    #[serde(rename = "nieuw")]
    New,
    /// Someone is working on it.
    #[serde(rename = "in_behandeling")]
    InProgress,
    /// Blocked on information from the client or a third party.
    #[serde(rename = "wachten_op_info")]
    WaitingInfo,
    /// Needs a follow-up action later on.
    #[serde(rename = "opvolging")]
    FollowUp,
    /// Finished.
    #[serde(rename = "afgehandeld")]
    Done,
}

impl WorkflowStage {
    /// All stages in board order.
    pub const ALL: [WorkflowStage; 5] = [
        WorkflowStage::New,
        WorkflowStage::InProgress,
        WorkflowStage::WaitingInfo,
        WorkflowStage::FollowUp,
        WorkflowStage::Done,
    ];

    /// The persisted literal for this stage.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            WorkflowStage::New => "nieuw",
            WorkflowStage::InProgress => "in_behandeling",
            WorkflowStage::WaitingInfo => "wachten_op_info",
            WorkflowStage::FollowUp => "opvolging",
            WorkflowStage::Done => "afgehandeld",
        }
    }

    /// Decodes a persisted literal, falling back to [`WorkflowStage::New`].
    #[must_use]
    pub fn from_persisted(raw: &str) -> Self {
        raw.parse().unwrap_or_else(|_| {
            tracing::warn!(value = raw, "unrecognized workflow stage, placing task in new");
            WorkflowStage::New
        })
    }
}

impl fmt::Display for WorkflowStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkflowStage {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "nieuw" | "new" => Ok(WorkflowStage::New),
            "in_behandeling" | "in_progress" => Ok(WorkflowStage::InProgress),
            "wachten_op_info" | "waiting_info" => Ok(WorkflowStage::WaitingInfo),
            "opvolging" | "follow_up" => Ok(WorkflowStage::FollowUp),
            "afgehandeld" | "done" => Ok(WorkflowStage::Done),
            other => Err(ParseEnumError { kind: "workflow stage", value: other.to_string() }),
        }
    }
}

/// Urgency overlay of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Urgency {
    /// Regular priority.
    #[default]
    #[serde(rename = "normaal")]
    Normal,
    /// Shown in the `urgent` pseudo-column regardless of stage.
    #[serde(rename = "urgent")]
    Urgent,
}

impl Urgency {
    /// The persisted literal for this urgency.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Urgency::Normal => "normaal",
            Urgency::Urgent => "urgent",
        }
    }

    /// Decodes a persisted literal, falling back to [`Urgency::Normal`].
    #[must_use]
    pub fn from_persisted(raw: &str) -> Self {
        raw.parse().unwrap_or_else(|_| {
            tracing::warn!(value = raw, "unrecognized priority in store, treating as normal");
            Urgency::Normal
        })
    }
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Urgency {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "normaal" | "normal" => Ok(Urgency::Normal),
            "urgent" => Ok(Urgency::Urgent),
            other => Err(ParseEnumError { kind: "urgency", value: other.to_string() }),
        }
    }
}

/// A board column: one per workflow stage plus the `urgent` pseudo-column.
///
/// Ordering follows the board's left-to-right layout, `urgent` first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Column {
    /// Pseudo-column holding every urgent task.
    Urgent,
    /// Column for non-urgent tasks in the given stage.
    Stage(WorkflowStage),
}

impl Column {
    /// Every column in board order.
    pub const ALL: [Column; 6] = [
        Column::Urgent,
        Column::Stage(WorkflowStage::New),
        Column::Stage(WorkflowStage::InProgress),
        Column::Stage(WorkflowStage::WaitingInfo),
        Column::Stage(WorkflowStage::FollowUp),
        Column::Stage(WorkflowStage::Done),
    ];

    /// The container key used by the board UI for this column.
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Column::Urgent => "urgent",
            Column::Stage(stage) => stage.as_str(),
        }
    }
}

impl From<WorkflowStage> for Column {
    fn from(stage: WorkflowStage) -> Self {
        Column::Stage(stage)
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Column {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "urgent" {
            return Ok(Column::Urgent);
        }
        s.parse::<WorkflowStage>()
            .map(Column::Stage)
            .map_err(|_| ParseEnumError { kind: "column", value: s.to_string() })
    }
}

pub(crate) fn lenient_stage<'de, D>(deserializer: D) -> Result<WorkflowStage, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().map_or(WorkflowStage::New, WorkflowStage::from_persisted))
}

pub(crate) fn lenient_urgency<'de, D>(deserializer: D) -> Result<Urgency, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().map_or(Urgency::Normal, Urgency::from_persisted))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_parses_persisted_and_english_names() {
        assert_eq!("in_behandeling".parse::<WorkflowStage>().unwrap(), WorkflowStage::InProgress);
        assert_eq!("follow_up".parse::<WorkflowStage>().unwrap(), WorkflowStage::FollowUp);
    }

    #[test]
    fn stage_parse_rejects_unknown_literal() {
        let err = "archived".parse::<WorkflowStage>().unwrap_err();
        assert_eq!(err.value, "archived");
        assert!(err.to_string().contains("workflow stage"));
    }

    #[test]
    fn persisted_stage_falls_back_to_new() {
        assert_eq!(WorkflowStage::from_persisted("gearchiveerd"), WorkflowStage::New);
        assert_eq!(WorkflowStage::from_persisted("opvolging"), WorkflowStage::FollowUp);
    }

    #[test]
    fn column_parses_urgent_and_stages() {
        assert_eq!("urgent".parse::<Column>().unwrap(), Column::Urgent);
        assert_eq!("afgehandeld".parse::<Column>().unwrap(), Column::Stage(WorkflowStage::Done));
        assert!("documents:1".parse::<Column>().is_err());
    }

    #[test]
    fn columns_are_ordered_urgent_first() {
        let mut cols = Column::ALL.to_vec();
        cols.reverse();
        cols.sort();
        assert_eq!(cols, Column::ALL.to_vec());
    }

    #[test]
    fn urgency_serializes_as_dutch_literal() {
        assert_eq!(serde_json::to_string(&Urgency::Normal).unwrap(), "\"normaal\"");
        let stage = serde_json::to_string(&WorkflowStage::WaitingInfo).unwrap();
        assert_eq!(stage, "\"wachten_op_info\"");
    }
}
