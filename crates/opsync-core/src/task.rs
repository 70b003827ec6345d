//! Canonical task and local record types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{CoreError, ExternalId};

/// Title used when upstream omits a subject.
pub const DEFAULT_TITLE: &str = "No title";
/// Project name used when upstream omits the project link.
pub const DEFAULT_PROJECT: &str = "Unknown project";
/// Status used when upstream omits the status link.
pub const DEFAULT_STATUS: &str = "unknown";
/// Assignee used when upstream omits the assignee link.
pub const DEFAULT_ASSIGNEE: &str = "Unassigned";
/// Priority used when upstream omits the priority link.
pub const DEFAULT_PRIORITY: &str = "Normal";

/// The normalized task shape produced from upstream data.
///
/// This is the unit of reconciliation: it is compared against the local
/// record with the same [`ExternalId`] and then written back as a whole.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalTask {
    /// Stable upstream key.
    pub external_id: ExternalId,

    pub title: String,

    /// May be empty.
    pub description: String,

    /// Project display name.
    pub project: String,

    /// Trailing path segment of the upstream project href.
    pub project_id: Option<String>,

    pub status: String,

    pub assignee: String,

    pub responsible: Option<String>,

    pub priority: String,

    pub estimated_hours: Option<f64>,

    pub spent_hours: Option<f64>,

    /// Relation links, `None` when the task has no links at all.
    pub related_to: Option<Vec<RelatedLink>>,

    /// Upstream creation time as `YYYY-MM-DD HH:MM:SS` (UTC).
    pub op_created_at: Option<String>,

    /// Upstream update time as `YYYY-MM-DD HH:MM:SS` (UTC).
    pub op_updated_at: Option<String>,
}

impl CanonicalTask {
    /// Create a task carrying the upstream defaults for every optional field.
    pub fn new(external_id: impl Into<ExternalId>, title: impl Into<String>) -> Self {
        Self {
            external_id: external_id.into(),
            title: title.into(),
            description: String::new(),
            project: DEFAULT_PROJECT.to_string(),
            project_id: None,
            status: DEFAULT_STATUS.to_string(),
            assignee: DEFAULT_ASSIGNEE.to_string(),
            responsible: None,
            priority: DEFAULT_PRIORITY.to_string(),
            estimated_hours: None,
            spent_hours: None,
            related_to: None,
            op_created_at: None,
            op_updated_at: None,
        }
    }

    /// Builder method to set the status.
    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = status.into();
        self
    }

    /// Builder method to set the assignee.
    pub fn with_assignee(mut self, assignee: impl Into<String>) -> Self {
        self.assignee = assignee.into();
        self
    }

    /// Builder method to set the responsible person.
    pub fn with_responsible(mut self, responsible: Option<String>) -> Self {
        self.responsible = responsible;
        self
    }

    /// Builder method to set the priority.
    pub fn with_priority(mut self, priority: impl Into<String>) -> Self {
        self.priority = priority.into();
        self
    }

    /// Builder method to set the project name and id.
    pub fn with_project(mut self, project: impl Into<String>, project_id: Option<String>) -> Self {
        self.project = project.into();
        self.project_id = project_id;
        self
    }

    /// Serialize the relation links the way they are persisted.
    pub fn related_to_json(&self) -> Result<Option<String>, CoreError> {
        match &self.related_to {
            Some(links) => Ok(Some(serde_json::to_string(links)?)),
            None => Ok(None),
        }
    }

    /// Parse persisted relation links.
    pub fn parse_related_to(raw: Option<&str>) -> Result<Option<Vec<RelatedLink>>, CoreError> {
        match raw {
            Some(text) if !text.is_empty() => Ok(Some(serde_json::from_str(text)?)),
            _ => Ok(None),
        }
    }
}

/// Kind of relation between two upstream tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkType {
    Parent,
    Child,
    Related,
    Blocks,
    BlockedBy,
}

impl LinkType {
    /// Wire name of the link type.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Parent => "parent",
            Self::Child => "child",
            Self::Related => "related",
            Self::Blocks => "blocks",
            Self::BlockedBy => "blocked_by",
        }
    }

    /// Title used when the upstream link carries none.
    pub fn default_title(&self) -> &'static str {
        match self {
            Self::Parent => "Parent task",
            Self::Child => "Child task",
            Self::Related => "Related task",
            Self::Blocks => "Blocked task",
            Self::BlockedBy => "Blocking task",
        }
    }
}

impl fmt::Display for LinkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LinkType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "parent" => Ok(Self::Parent),
            "child" => Ok(Self::Child),
            "related" => Ok(Self::Related),
            "blocks" => Ok(Self::Blocks),
            "blocked_by" => Ok(Self::BlockedBy),
            other => Err(CoreError::UnknownLinkType(other.to_string())),
        }
    }
}

/// One `{type, id, title}` relation descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelatedLink {
    #[serde(rename = "type")]
    pub link_type: LinkType,
    pub id: String,
    pub title: String,
}

impl RelatedLink {
    pub fn new(link_type: LinkType, id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            link_type,
            id: id.into(),
            title: title.into(),
        }
    }
}

/// A task as persisted in the local store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredTask {
    /// Local row identifier.
    pub id: i64,

    #[serde(flatten)]
    pub task: CanonicalTask,

    /// When the local row was first written.
    pub created_at: DateTime<Utc>,

    /// When the local row was last written.
    pub updated_at: DateTime<Utc>,
}
