//! Seeded synthetic snapshots for demos, benchmarks and determinism tests.
//!
//! All generation is deterministic: same seed, same `now`, same snapshot.
//! Ids are UUIDs built from RNG bits, never from the platform RNG.

use crate::{
    rng::SeededRng,
    rules::RuleTable,
    snapshot::{SiteRef, TechnicianRef, WorkSnapshot},
    work_item::{ItemKind, WorkItem},
};
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

const REGIONS: &[&str] = &["north", "south", "east", "west", "central"];

const SITE_PREFIXES: &[&str] = &[
    "Harbor", "Ridge", "Valley", "Summit", "Lakeside", "Granite", "Cedar", "Meadow",
];

const FIRST_NAMES: &[&str] = &[
    "Alex", "Sam", "Jordan", "Taylor", "Morgan", "Casey", "Riley", "Jamie", "Avery", "Quinn",
];

const LAST_NAMES: &[&str] = &[
    "Okafor", "Lindqvist", "Moreau", "Tanaka", "Silva", "Kowalski", "Nguyen", "Haddad",
];

const SEVERITIES: &[&str] = &["critical", "major", "minor"];
const TASK_TYPES: &[&str] = &["routine-maintenance", "corrective"];

// Stable stream indexes. Append only.
const SITE_STREAM: u64 = 0;
const TECHNICIAN_STREAM: u64 = 1;
const ITEM_STREAM: u64 = 2;

#[derive(Debug, Clone)]
pub struct SnapshotGenerator {
    pub seed:             u64,
    pub item_count:       usize,
    pub site_count:       usize,
    pub technician_count: usize,
    /// Items are created within this many days before `now`.
    pub days:             i64,
    /// Share of items that reach a terminal state.
    pub resolved_share:   f64,
    /// Share of resolved items carrying a resolution before creation.
    pub bad_timing_share: f64,
}

impl SnapshotGenerator {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            item_count:       500,
            site_count:       12,
            technician_count: 15,
            days:             90,
            resolved_share:   0.75,
            bad_timing_share: 0.01,
        }
    }

    pub fn with_items(mut self, item_count: usize) -> Self {
        self.item_count = item_count;
        self
    }

    pub fn generate(&self, now: DateTime<Utc>) -> WorkSnapshot {
        let sites = self.sites();
        let technicians = self.technicians();
        let rules = RuleTable::defaults();
        let mut rng = SeededRng::new(self.seed, ITEM_STREAM).with_name("items");

        let mut items = Vec::with_capacity(self.item_count);
        for _ in 0..self.item_count {
            items.push(self.item(&mut rng, now, &rules, &sites, &technicians));
        }

        log::debug!(
            "synth[{}]: seed {} produced {} items, {} sites, {} technicians",
            rng.name,
            self.seed,
            items.len(),
            sites.len(),
            technicians.len(),
        );
        WorkSnapshot::new(now, items)
            .with_sites(sites)
            .with_technicians(technicians)
    }

    fn sites(&self) -> Vec<SiteRef> {
        let mut rng = SeededRng::new(self.seed, SITE_STREAM).with_name("sites");
        (0..self.site_count)
            .map(|n| {
                let prefix = rng.pick(SITE_PREFIXES).copied().unwrap_or("Site");
                SiteRef {
                    site_id: format!("site-{:03}", n + 1),
                    name:    format!("{prefix} {:02}", n + 1),
                    region:  rng.pick(REGIONS).map(|r| r.to_string()),
                }
            })
            .collect()
    }

    fn technicians(&self) -> Vec<TechnicianRef> {
        let mut rng = SeededRng::new(self.seed, TECHNICIAN_STREAM).with_name("technicians");
        (0..self.technician_count)
            .map(|n| {
                let first = rng.pick(FIRST_NAMES).copied().unwrap_or("Pat");
                let last = rng.pick(LAST_NAMES).copied().unwrap_or("Doe");
                TechnicianRef {
                    technician_id: format!("tech-{:03}", n + 1),
                    full_name:     format!("{first} {last}"),
                }
            })
            .collect()
    }

    fn item(
        &self,
        rng: &mut SeededRng,
        now: DateTime<Utc>,
        rules: &RuleTable,
        sites: &[SiteRef],
        technicians: &[TechnicianRef],
    ) -> WorkItem {
        let id = Uuid::from_u128((u128::from(rng.next_u64()) << 64) | u128::from(rng.next_u64()));
        let age_seconds = rng.next_u64_below((self.days.max(1) * 86_400) as u64) as i64;
        let created_at = now - Duration::seconds(age_seconds);

        let roll = rng.next_f64();
        let mut item = if roll < 0.5 {
            let severity = rng.pick(SEVERITIES).copied().unwrap_or("minor");
            WorkItem::incident(id.to_string(), severity, created_at)
        } else if roll < 0.85 {
            let task_type = rng.pick(TASK_TYPES).copied().unwrap_or("corrective");
            WorkItem::task(id.to_string(), task_type, created_at)
        } else {
            WorkItem::access_request(id.to_string(), created_at)
        };

        if let Some(site) = rng.pick(sites) {
            item = item.at_site(site.site_id.clone());
            if let Some(region) = &site.region {
                item = item.in_region(region.clone());
            }
        }
        if item.kind != ItemKind::AccessRequest {
            if let Some(technician) = rng.pick(technicians) {
                item = item.assigned_to(technician.technician_id.clone());
            }
        }

        if rng.chance(self.resolved_share) {
            let window = rules
                .window_for(item.kind, item.category.as_deref())
                .unwrap_or(60);
            // Between 10% and 160% of the window.
            let factor = 0.1 + rng.next_f64() * 1.5;
            let took = Duration::seconds((f64::from(window) * 60.0 * factor) as i64);
            let resolved_at = if rng.chance(self.bad_timing_share) {
                created_at - took
            } else {
                created_at + took
            };
            if resolved_at <= now {
                item = item.resolved(resolved_at);
            }
        }
        item
    }
}
