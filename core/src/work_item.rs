//! Work items — the obligations the engine classifies.
//!
//! RULE: The engine never mutates a WorkItem. Every classification,
//! rollup and alert is a fresh projection of an immutable snapshot.

use crate::{error::SlaError, types::EntityId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Incident,
    Task,
    AccessRequest,
}

impl ItemKind {
    pub const ALL: [ItemKind; 3] = [Self::Incident, Self::Task, Self::AccessRequest];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Incident      => "incident",
            Self::Task          => "task",
            Self::AccessRequest => "access_request",
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemKind {
    type Err = SlaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "incident"       => Ok(Self::Incident),
            "task"           => Ok(Self::Task),
            "access_request" => Ok(Self::AccessRequest),
            other            => Err(SlaError::UnknownKind(other.to_string())),
        }
    }
}

/// Canonical form of a category label: trimmed, lowercase, words joined
/// by '-'. Blank labels mean "no category".
pub fn normalize_category(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(
        trimmed
            .to_ascii_lowercase()
            .replace(['_', ' '], "-"),
    )
}

fn deserialize_category<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(normalize_category))
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkItem {
    pub id:            EntityId,
    pub kind:          ItemKind,
    /// Kind-specific sub-type, always in canonical form. Access requests
    /// carry none.
    #[serde(default, deserialize_with = "deserialize_category")]
    pub category:      Option<String>,
    pub created_at:    DateTime<Utc>,
    /// Set once, when the item reaches a terminal state.
    #[serde(default)]
    pub resolved_at:   Option<DateTime<Utc>>,
    #[serde(default)]
    pub site_id:       Option<EntityId>,
    #[serde(default)]
    pub region:        Option<String>,
    #[serde(default)]
    pub technician_id: Option<EntityId>,
}

impl WorkItem {
    pub fn new(
        id: impl Into<EntityId>,
        kind: ItemKind,
        category: Option<&str>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            category: category.and_then(normalize_category),
            created_at,
            resolved_at: None,
            site_id: None,
            region: None,
            technician_id: None,
        }
    }

    pub fn incident(id: impl Into<EntityId>, severity: &str, created_at: DateTime<Utc>) -> Self {
        Self::new(id, ItemKind::Incident, Some(severity), created_at)
    }

    pub fn task(id: impl Into<EntityId>, task_type: &str, created_at: DateTime<Utc>) -> Self {
        Self::new(id, ItemKind::Task, Some(task_type), created_at)
    }

    pub fn access_request(id: impl Into<EntityId>, created_at: DateTime<Utc>) -> Self {
        Self::new(id, ItemKind::AccessRequest, None, created_at)
    }

    pub fn resolved(mut self, at: DateTime<Utc>) -> Self {
        self.resolved_at = Some(at);
        self
    }

    pub fn at_site(mut self, site_id: impl Into<EntityId>) -> Self {
        self.site_id = Some(site_id.into());
        self
    }

    pub fn in_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn assigned_to(mut self, technician_id: impl Into<EntityId>) -> Self {
        self.technician_id = Some(technician_id.into());
        self
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved_at.is_some()
    }
}
