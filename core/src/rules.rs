//! SLA rule table — (kind, category) → window in minutes.
//!
//! The table is configuration, not logic. Lookups are total over the
//! configured keys: an unmapped category is an error, never a silent
//! fallback to some default window.

use crate::{
    error::{SlaError, SlaResult},
    types::Minutes,
    work_item::{normalize_category, ItemKind, WorkItem},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SlaRule {
    pub kind:           ItemKind,
    #[serde(default)]
    pub category:       Option<String>,
    pub window_minutes: Minutes,
}

type RuleKey = (ItemKind, Option<String>);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleTable {
    windows: BTreeMap<RuleKey, Minutes>,
}

impl RuleTable {
    pub fn empty() -> Self {
        Self { windows: BTreeMap::new() }
    }

    /// The contractual defaults.
    pub fn defaults() -> Self {
        let mut table = Self::empty();
        for (kind, category, minutes) in [
            (ItemKind::Incident,      Some("critical"),            240),
            (ItemKind::Incident,      Some("major"),               480),
            (ItemKind::Incident,      Some("minor"),               1440),
            (ItemKind::Task,          Some("routine-maintenance"), 4320),
            (ItemKind::Task,          Some("corrective"),          2880),
            (ItemKind::AccessRequest, None,                        120),
        ] {
            table.windows.insert((kind, category.map(String::from)), minutes);
        }
        table
    }

    /// Build a table from an explicit rule list. Duplicate keys and
    /// zero-minute windows are rejected.
    pub fn from_rules(rules: impl IntoIterator<Item = SlaRule>) -> SlaResult<Self> {
        let mut table = Self::empty();
        for rule in rules {
            let key = Self::key(rule.kind, rule.category.as_deref());
            if table.windows.contains_key(&key) {
                return Err(SlaError::DuplicateRule { kind: key.0, category: key.1 });
            }
            table.insert(key, rule.window_minutes)?;
        }
        Ok(table)
    }

    /// Replace or add entries key by key, leaving every other rule as is.
    pub fn with_overrides(mut self, overrides: impl IntoIterator<Item = SlaRule>) -> SlaResult<Self> {
        let overrides = Self::from_rules(overrides)?;
        self.windows.extend(overrides.windows);
        Ok(self)
    }

    pub fn window_for(&self, kind: ItemKind, category: Option<&str>) -> Option<Minutes> {
        self.windows.get(&Self::key(kind, category)).copied()
    }

    /// Window for a specific item; surfaces the item id when unmapped.
    pub fn window_for_item(&self, item: &WorkItem) -> SlaResult<Minutes> {
        self.window_for(item.kind, item.category.as_deref())
            .ok_or_else(|| SlaError::UnmappedCategory {
                item_id:  item.id.clone(),
                kind:     item.kind,
                category: item.category.clone(),
            })
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    fn insert(&mut self, key: RuleKey, window_minutes: Minutes) -> SlaResult<()> {
        if window_minutes == 0 {
            return Err(SlaError::InvalidWindow { kind: key.0, category: key.1 });
        }
        self.windows.insert(key, window_minutes);
        Ok(())
    }

    fn key(kind: ItemKind, category: Option<&str>) -> RuleKey {
        (kind, category.and_then(normalize_category))
    }
}

impl Default for RuleTable {
    fn default() -> Self {
        Self::defaults()
    }
}
