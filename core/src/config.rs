use crate::{
    error::{SlaError, SlaResult},
    rules::{RuleTable, SlaRule},
    work_item::ItemKind,
};
use serde::{Deserialize, Serialize};

// ── Classification thresholds ──────────────────────────────────────

/// Elapsed-ratio cut-offs for open items. Equivalent to
/// "remaining ≤ (1 − ratio)·W" for every window size.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StatusThresholds {
    pub at_risk_ratio:  f64,
    pub critical_ratio: f64,
}

impl Default for StatusThresholds {
    fn default() -> Self {
        Self { at_risk_ratio: 0.7, critical_ratio: 0.9 }
    }
}

// ── Reporting windows ──────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ReportingWindows {
    /// Trailing window for the executive overview, trends and snapshots.
    pub trailing_days:     i64,
    pub long_recent_days:  i64,
    pub short_recent_days: i64,
}

/// Upper bound on any reporting window; larger spans fall outside the
/// representable date range.
pub const MAX_WINDOW_DAYS: i64 = 36_500;

impl Default for ReportingWindows {
    fn default() -> Self {
        Self { trailing_days: 90, long_recent_days: 30, short_recent_days: 7 }
    }
}

// ── Site reliability ───────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SiteConfig {
    /// Strictly more incidents than this → High risk.
    pub high_risk_incidents:        u32,
    /// Strictly more incidents than this → Medium risk.
    pub medium_risk_incidents:      u32,
    /// Incidents in the short window at or above this → HighFrequency.
    pub high_frequency_incidents:   u32,
    /// Mean resolution strictly above this → SlowResolution.
    pub slow_resolution_minutes:    f64,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            high_risk_incidents:      5,
            medium_risk_incidents:    2,
            high_frequency_incidents: 3,
            slow_resolution_minutes:  480.0,
        }
    }
}

// ── Technician performance ─────────────────────────────────────────

/// Which compliance figure drives the technician performance level.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum PerformanceBasis {
    /// Incident compliance only; task compliance is reported, not scored.
    #[default]
    IncidentOnly,
    /// Incident and task compliance pooled over evaluated items.
    Blended,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TechnicianConfig {
    pub high_workload:     u32,
    pub medium_workload:   u32,
    pub excellent_pct:     f64,
    pub good_pct:          f64,
    pub needs_support_pct: f64,
    pub performance_basis: PerformanceBasis,
}

impl Default for TechnicianConfig {
    fn default() -> Self {
        Self {
            high_workload:     20,
            medium_workload:   10,
            excellent_pct:     95.0,
            good_pct:          80.0,
            needs_support_pct: 60.0,
            performance_basis: PerformanceBasis::IncidentOnly,
        }
    }
}

// ── Regional analytics ─────────────────────────────────────────────

/// How incident and task compliance blend into a region's overall score.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ComplianceWeighting {
    /// Unweighted mean of the two percentages.
    #[default]
    Equal,
    /// Weighted by the number of evaluated items behind each percentage.
    ByVolume,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RegionalConfig {
    pub weighting:     ComplianceWeighting,
    pub excellent_pct: f64,
    pub good_pct:      f64,
    pub at_risk_pct:   f64,
}

impl Default for RegionalConfig {
    fn default() -> Self {
        Self {
            weighting:     ComplianceWeighting::Equal,
            excellent_pct: 95.0,
            good_pct:      85.0,
            at_risk_pct:   70.0,
        }
    }
}

// ── Alert feed ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AlertConfig {
    /// Extend the feed with AtRisk items (priority 3).
    pub include_at_risk: bool,
    pub item_kinds:      Vec<ItemKind>,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            include_at_risk: false,
            item_kinds:      vec![ItemKind::Incident, ItemKind::Task],
        }
    }
}

// ── Penalty schedule ───────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PenaltyTier {
    pub min_delay_hours: f64,
    pub penalty_pct:     f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PenaltyConfig {
    pub quarterly_fee:         f64,
    pub per_fault_cap_pct:     f64,
    pub aggregate_cap_pct:     f64,
    /// Breached faults per quarter that give the client a termination right.
    pub termination_threshold: u32,
    /// Ascending by `min_delay_hours`; delays below the first tier cost nothing.
    pub tiers:                 Vec<PenaltyTier>,
}

impl Default for PenaltyConfig {
    fn default() -> Self {
        Self {
            quarterly_fee:         2_700_000.0,
            per_fault_cap_pct:     10.0,
            aggregate_cap_pct:     20.0,
            termination_threshold: 3,
            tiers: vec![
                PenaltyTier { min_delay_hours: 4.0,  penalty_pct: 10.0 },
                PenaltyTier { min_delay_hours: 8.0,  penalty_pct: 15.0 },
                PenaltyTier { min_delay_hours: 16.0, penalty_pct: 20.0 },
                PenaltyTier { min_delay_hours: 24.0, penalty_pct: 30.0 },
            ],
        }
    }
}

// ── Files ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
struct RulesFile {
    /// When false, listed rules override the defaults key by key.
    #[serde(default)]
    replace_defaults: bool,
    rules:            Vec<SlaRule>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct DashboardConfigFile {
    thresholds: StatusThresholds,
    windows:    ReportingWindows,
    site:       SiteConfig,
    technician: TechnicianConfig,
    regional:   RegionalConfig,
    alerts:     AlertConfig,
    penalty:    PenaltyConfig,
}

#[derive(Debug, Clone, Default)]
pub struct SlaConfig {
    pub rules:      RuleTable,
    pub thresholds: StatusThresholds,
    pub windows:    ReportingWindows,
    pub site:       SiteConfig,
    pub technician: TechnicianConfig,
    pub regional:   RegionalConfig,
    pub alerts:     AlertConfig,
    pub penalty:    PenaltyConfig,
}

impl SlaConfig {
    /// Load from the data/ directory.
    /// In tests, use SlaConfig::default().
    pub fn load(data_dir: &str) -> anyhow::Result<Self> {
        let rules_path = format!("{data_dir}/sla_rules.json");
        let rules_content = std::fs::read_to_string(&rules_path)
            .map_err(|e| anyhow::anyhow!("Cannot read {rules_path}: {e}"))?;
        let rules_file: RulesFile = serde_json::from_str(&rules_content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {rules_path}: {e}"))?;
        let rules = if rules_file.replace_defaults {
            RuleTable::from_rules(rules_file.rules)?
        } else {
            RuleTable::defaults().with_overrides(rules_file.rules)?
        };

        let dashboard_path = format!("{data_dir}/dashboard_config.json");
        let dashboard_content = std::fs::read_to_string(&dashboard_path)
            .map_err(|e| anyhow::anyhow!("Cannot read {dashboard_path}: {e}"))?;
        let dashboard: DashboardConfigFile = serde_json::from_str(&dashboard_content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {dashboard_path}: {e}"))?;

        let config = Self {
            rules,
            thresholds: dashboard.thresholds,
            windows:    dashboard.windows,
            site:       dashboard.site,
            technician: dashboard.technician,
            regional:   dashboard.regional,
            alerts:     dashboard.alerts,
            penalty:    dashboard.penalty,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn with_rules(mut self, rules: RuleTable) -> Self {
        self.rules = rules;
        self
    }

    pub fn validate(&self) -> SlaResult<()> {
        let t = &self.thresholds;
        if !(0.0 < t.at_risk_ratio && t.at_risk_ratio < t.critical_ratio && t.critical_ratio <= 1.0) {
            return Err(SlaError::InvalidConfig(format!(
                "thresholds must satisfy 0 < at_risk ({}) < critical ({}) <= 1",
                t.at_risk_ratio, t.critical_ratio
            )));
        }
        let w = &self.windows;
        let spans = [w.trailing_days, w.long_recent_days, w.short_recent_days];
        if spans.iter().any(|&days| days <= 0 || days > MAX_WINDOW_DAYS) {
            return Err(SlaError::InvalidConfig(format!(
                "reporting windows must be between 1 and {MAX_WINDOW_DAYS} days, got {spans:?}"
            )));
        }
        if self.site.medium_risk_incidents > self.site.high_risk_incidents {
            return Err(SlaError::InvalidConfig(
                "site medium_risk_incidents exceeds high_risk_incidents".into(),
            ));
        }
        if self.technician.medium_workload > self.technician.high_workload {
            return Err(SlaError::InvalidConfig(
                "technician medium_workload exceeds high_workload".into(),
            ));
        }
        if self
            .penalty
            .tiers
            .windows(2)
            .any(|pair| pair[0].min_delay_hours >= pair[1].min_delay_hours)
        {
            return Err(SlaError::InvalidConfig(
                "penalty tiers must be strictly ascending by min_delay_hours".into(),
            ));
        }
        if self.rules.is_empty() {
            return Err(SlaError::InvalidConfig("rule table is empty".into()));
        }
        Ok(())
    }
}
