//! SLA alert events and the sinks that receive them.
//!
//! RULE: Events are derived from the alert feed of one evaluation pass.
//! Delivery happens after every rollup has been computed; a sink never
//! influences what the engine reports.

use crate::{
    alert_ranker::{AlertEntry, AlertLevel},
    error::SlaResult,
    types::EntityId,
    work_item::ItemKind,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum SlaEvent {
    SlaBreach {
        item_id:         EntityId,
        kind:            ItemKind,
        category:        Option<String>,
        deadline:        DateTime<Utc>,
        overdue_minutes: i64,
        site_id:         Option<EntityId>,
        region:          Option<String>,
        technician_id:   Option<EntityId>,
        detected_at:     DateTime<Utc>,
    },
    SlaWarning {
        item_id:           EntityId,
        kind:              ItemKind,
        category:          Option<String>,
        alert_level:       AlertLevel,
        deadline:          DateTime<Utc>,
        remaining_minutes: i64,
        percent_used:      f64,
        site_id:           Option<EntityId>,
        region:            Option<String>,
        technician_id:     Option<EntityId>,
        detected_at:       DateTime<Utc>,
    },
}

impl SlaEvent {
    /// Breached entries become breach events; Critical and AtRisk become
    /// warnings.
    pub fn from_alert(alert: &AlertEntry, detected_at: DateTime<Utc>) -> Self {
        match alert.alert_level {
            AlertLevel::Breached => Self::SlaBreach {
                item_id:         alert.item_id.clone(),
                kind:            alert.kind,
                category:        alert.category.clone(),
                deadline:        alert.deadline,
                overdue_minutes: -alert.remaining_minutes,
                site_id:         alert.site_id.clone(),
                region:          alert.region.clone(),
                technician_id:   alert.technician_id.clone(),
                detected_at,
            },
            level => Self::SlaWarning {
                item_id:           alert.item_id.clone(),
                kind:              alert.kind,
                category:          alert.category.clone(),
                alert_level:       level,
                deadline:          alert.deadline,
                remaining_minutes: alert.remaining_minutes,
                percent_used:      alert.percent_used,
                site_id:           alert.site_id.clone(),
                region:            alert.region.clone(),
                technician_id:     alert.technician_id.clone(),
                detected_at,
            },
        }
    }

    pub fn event_type(&self) -> &'static str {
        match self {
            Self::SlaBreach { .. }  => "sla_breach",
            Self::SlaWarning { .. } => "sla_warning",
        }
    }

    pub fn item_id(&self) -> &str {
        match self {
            Self::SlaBreach { item_id, .. } | Self::SlaWarning { item_id, .. } => item_id,
        }
    }

    pub fn detected_at(&self) -> DateTime<Utc> {
        match self {
            Self::SlaBreach { detected_at, .. } | Self::SlaWarning { detected_at, .. } => *detected_at,
        }
    }
}

/// Receives alert events in feed order.
pub trait AlertSink {
    fn deliver(&mut self, event: &SlaEvent) -> SlaResult<()>;
}

/// Keeps every delivered event in memory.
#[derive(Debug, Default)]
pub struct CollectingSink {
    pub events: Vec<SlaEvent>,
}

impl AlertSink for CollectingSink {
    fn deliver(&mut self, event: &SlaEvent) -> SlaResult<()> {
        self.events.push(event.clone());
        Ok(())
    }
}

/// Writes each event to the log at warn level.
#[derive(Debug, Default)]
pub struct LogSink;

impl AlertSink for LogSink {
    fn deliver(&mut self, event: &SlaEvent) -> SlaResult<()> {
        match event {
            SlaEvent::SlaBreach { item_id, kind, overdue_minutes, .. } => {
                log::warn!("SLA breach: {kind} {item_id} overdue by {overdue_minutes} min");
            }
            SlaEvent::SlaWarning { item_id, kind, alert_level, remaining_minutes, .. } => {
                log::warn!("SLA {alert_level}: {kind} {item_id} due in {remaining_minutes} min");
            }
        }
        Ok(())
    }
}

/// An event as persisted to the alert log table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertLogEntry {
    pub id:          Option<i64>,
    pub detected_at: DateTime<Utc>,
    pub event_type:  String,
    pub item_id:     EntityId,
    pub payload:     String, // JSON-serialized SlaEvent
}

impl AlertLogEntry {
    pub fn from_event(event: &SlaEvent) -> SlaResult<Self> {
        Ok(Self {
            id:          None,
            detected_at: event.detected_at(),
            event_type:  event.event_type().to_string(),
            item_id:     event.item_id().to_string(),
            payload:     serde_json::to_string(event)?,
        })
    }

    pub fn event(&self) -> SlaResult<SlaEvent> {
        Ok(serde_json::from_str(&self.payload)?)
    }
}
