//! slawatch-core: SLA classification and aggregation for field-service
//! work items (incidents, tasks, access requests).
//!
//! A pass takes an immutable WorkSnapshot and one reference instant and
//! produces classifications, dashboard rollups and a ranked alert feed.

pub mod alert_ranker;
pub mod classifier;
pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod event;
pub mod executive_overview;
pub mod item_monitor;
pub mod penalty;
pub mod query;
pub mod regional_analytics;
pub mod rng;
pub mod rollup;
pub mod rules;
pub mod site_reliability;
pub mod snapshot;
pub mod store;
pub mod synth;
pub mod technician_performance;
pub mod trend_analysis;
pub mod types;
pub mod work_item;
