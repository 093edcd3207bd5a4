//! The per-item SLA classifier.
//!
//! One item + its window + one reference instant → deadline, elapsed
//! ratio, remaining time and status. Every rollup and the alert ranker
//! go through here; nothing else computes a status.
//!
//! Status granularity is asymmetric on purpose:
//!   - open items get the four-state rule (WithinSla → AtRisk → Critical → Breached)
//!   - resolved items get the binary rule (WithinSla | Breached)
//!
//! Items resolved before they were created are a data-quality fault:
//! they classify as `Outcome::InvalidTiming` with no ratio or status.

use crate::{
    config::StatusThresholds,
    error::SlaResult,
    rules::RuleTable,
    types::Minutes,
    work_item::WorkItem,
};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SlaStatus {
    WithinSla,
    AtRisk,
    Critical,
    Breached,
}

impl SlaStatus {
    pub const ALL: [SlaStatus; 4] = [Self::WithinSla, Self::AtRisk, Self::Critical, Self::Breached];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WithinSla => "WITHIN_SLA",
            Self::AtRisk    => "AT_RISK",
            Self::Critical  => "CRITICAL",
            Self::Breached  => "BREACHED",
        }
    }
}

impl fmt::Display for SlaStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Outcome {
    Open {
        status:            SlaStatus,
        elapsed_ratio:     f64,
        /// Signed; negative once the deadline has passed.
        remaining_minutes: i64,
    },
    Resolved {
        status:         SlaStatus,
        elapsed_ratio:  f64,
        actual_minutes: i64,
    },
    InvalidTiming,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct Classification {
    pub window_minutes: Minutes,
    pub deadline:       DateTime<Utc>,
    pub outcome:        Outcome,
}

impl Classification {
    pub fn status(&self) -> Option<SlaStatus> {
        match self.outcome {
            Outcome::Open { status, .. } | Outcome::Resolved { status, .. } => Some(status),
            Outcome::InvalidTiming => None,
        }
    }

    pub fn elapsed_ratio(&self) -> Option<f64> {
        match self.outcome {
            Outcome::Open { elapsed_ratio, .. } | Outcome::Resolved { elapsed_ratio, .. } => {
                Some(elapsed_ratio)
            }
            Outcome::InvalidTiming => None,
        }
    }

    pub fn remaining_minutes(&self) -> Option<i64> {
        match self.outcome {
            Outcome::Open { remaining_minutes, .. } => Some(remaining_minutes),
            _ => None,
        }
    }

    /// Creation → resolution, for resolved items with valid timing.
    pub fn actual_minutes(&self) -> Option<i64> {
        match self.outcome {
            Outcome::Resolved { actual_minutes, .. } => Some(actual_minutes),
            _ => None,
        }
    }

    /// Share of the window consumed, as a percentage rounded to 2 places.
    pub fn percent_used(&self) -> Option<f64> {
        self.elapsed_ratio().map(|r| (r * 10_000.0).round() / 100.0)
    }

    pub fn is_open(&self) -> bool {
        matches!(self.outcome, Outcome::Open { .. })
    }

    pub fn has_valid_timing(&self) -> bool {
        !matches!(self.outcome, Outcome::InvalidTiming)
    }
}

/// Whole minutes, rounded toward negative infinity: any overrun, however
/// short, reads as at least one minute overdue.
fn floor_minutes(delta: Duration) -> i64 {
    delta.num_milliseconds().div_euclid(60_000)
}

/// Classify one item against an explicit window. Pure and idempotent for a
/// fixed `now`.
pub fn classify_with_window(
    item: &WorkItem,
    window_minutes: Minutes,
    thresholds: &StatusThresholds,
    now: DateTime<Utc>,
) -> Classification {
    let window = Duration::minutes(i64::from(window_minutes));
    let window_ms = window.num_milliseconds() as f64;
    let deadline = item.created_at + window;

    let outcome = match item.resolved_at {
        None => {
            let elapsed_ratio = (now - item.created_at).num_milliseconds() as f64 / window_ms;
            let status = if deadline < now {
                SlaStatus::Breached
            } else if elapsed_ratio >= thresholds.critical_ratio {
                SlaStatus::Critical
            } else if elapsed_ratio >= thresholds.at_risk_ratio {
                SlaStatus::AtRisk
            } else {
                SlaStatus::WithinSla
            };
            Outcome::Open {
                status,
                elapsed_ratio,
                remaining_minutes: floor_minutes(deadline - now),
            }
        }
        Some(resolved_at) if resolved_at < item.created_at => {
            log::warn!(
                "work item {} ({}) resolved at {resolved_at} before creation at {}; timing excluded",
                item.id,
                item.kind,
                item.created_at,
            );
            Outcome::InvalidTiming
        }
        Some(resolved_at) => {
            let actual = resolved_at - item.created_at;
            let status = if actual > window {
                SlaStatus::Breached
            } else {
                SlaStatus::WithinSla
            };
            Outcome::Resolved {
                status,
                elapsed_ratio: actual.num_milliseconds() as f64 / window_ms,
                actual_minutes: actual.num_minutes(),
            }
        }
    };

    Classification { window_minutes, deadline, outcome }
}

/// Rule table + thresholds bundled for repeated use within a pass.
#[derive(Debug, Clone)]
pub struct Classifier {
    rules:      RuleTable,
    thresholds: StatusThresholds,
}

impl Classifier {
    pub fn new(rules: RuleTable, thresholds: StatusThresholds) -> Self {
        Self { rules, thresholds }
    }

    /// Fails only when the item's (kind, category) has no rule.
    pub fn classify(&self, item: &WorkItem, now: DateTime<Utc>) -> SlaResult<Classification> {
        let window = self.rules.window_for_item(item)?;
        Ok(classify_with_window(item, window, &self.thresholds, now))
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(RuleTable::defaults(), StatusThresholds::default())
    }
}
