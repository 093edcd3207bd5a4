//! sla-report: headless SLA dashboard runner.
//!
//! Usage:
//!   sla-report --seed 12345 --items 2000
//!   sla-report --db work.db --generate --seed 7 --now 2026-03-01T12:00:00Z
//!   sla-report --db work.db --json > dashboard.json

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use slawatch_core::{
    clock::{Clock, FixedClock, SystemClock},
    config::SlaConfig,
    engine::{Dashboard, SlaEngine},
    event::LogSink,
    snapshot::{SnapshotProvider, SnapshotWindow, StaticSnapshotProvider},
    store::SlaStore,
    synth::SnapshotGenerator,
};
use std::{env, path::Path};

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let seed = parse_arg(&args, "--seed", 42u64);
    let item_count = parse_arg(&args, "--items", 500usize);
    let generate = args.iter().any(|a| a == "--generate");
    let json = args.iter().any(|a| a == "--json");
    let db = string_arg(&args, "--db");
    let data_dir = string_arg(&args, "--data-dir").unwrap_or("./data");

    let now = match string_arg(&args, "--now") {
        Some(raw) => DateTime::parse_from_rfc3339(raw)
            .with_context(|| format!("--now must be RFC 3339, got {raw}"))?
            .with_timezone(&Utc),
        None => SystemClock.now(),
    };
    let clock = FixedClock::new(now);

    let config = if Path::new(data_dir).is_dir() {
        SlaConfig::load(data_dir)?
    } else {
        log::warn!("{data_dir} not found, using built-in defaults");
        SlaConfig::default()
    };
    let window = SnapshotWindow::trailing(now, config.windows.trailing_days);
    let engine = SlaEngine::new(config)?;

    if !json {
        println!("sla-report");
        println!("  seed:      {seed}");
        println!("  now:       {now}");
        println!("  db:        {}", db.unwrap_or("(synthetic)"));
        println!("  data_dir:  {data_dir}");
        println!();
    }

    let dashboard = match db {
        Some(path) => {
            let mut store = SlaStore::open(path)?;
            store.migrate()?;
            if generate {
                let synthetic = SnapshotGenerator::new(seed).with_items(item_count).generate(now);
                store.insert_snapshot(&synthetic)?;
            }
            let snapshot = store.snapshot(window)?;
            let dashboard = engine.evaluate(&snapshot, &clock);
            let published = engine.publish_alerts(&snapshot, now, &mut store)?;
            log::info!("{published} alerts appended to the alert log");
            dashboard
        }
        None => {
            let synthetic = SnapshotGenerator::new(seed).with_items(item_count).generate(now);
            let snapshot = StaticSnapshotProvider::new(synthetic.items)
                .with_sites(synthetic.sites)
                .with_technicians(synthetic.technicians)
                .snapshot(window)?;
            engine.publish_alerts(&snapshot, now, &mut LogSink)?;
            engine.evaluate(&snapshot, &clock)
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&dashboard)?);
    } else {
        print_summary(&dashboard);
    }

    if !dashboard.is_complete() {
        anyhow::bail!("{} rollups failed", dashboard.failures.len());
    }
    Ok(())
}

fn print_summary(dashboard: &Dashboard) {
    println!("Evaluated {} items at {}", dashboard.item_count, dashboard.evaluated_at);

    if let Some(exec) = &dashboard.executive {
        println!();
        println!("Executive overview (since {})", exec.window_start.date_naive());
        println!("  resolved items:    {}", exec.total_items);
        println!("  within SLA:        {}", exec.within_sla_count);
        println!("  breached:          {}", exec.breached_count);
        println!("  invalid timing:    {}", exec.invalid_timing_count);
        println!("  compliance:        {}", pct(exec.compliance_percentage));
    }

    if let Some(regions) = &dashboard.regions {
        println!();
        println!("Regions");
        for r in regions {
            let status = r.region_status.map_or("-".to_string(), |s| format!("{s:?}"));
            println!(
                "  {:<10} overall {:>8}  incidents {:>8}  tasks {:>8}  {status}",
                r.region,
                pct(r.overall_compliance),
                pct(r.incident_compliance),
                pct(r.task_compliance),
            );
        }
    }

    if let Some(sites) = &dashboard.sites {
        println!();
        println!("Top sites by incident count");
        for s in sites.iter().take(5) {
            println!(
                "  {:<10} {:<14} incidents {:>3} (open {:>2})  risk {:?}  {:?}",
                s.site_id, s.site_name.as_deref().unwrap_or("-"), s.incident_count, s.open_incidents, s.risk_level, s.site_status,
            );
        }
    }

    if let Some(alerts) = &dashboard.alerts {
        println!();
        println!("Alert feed: {} entries", alerts.len());
        for a in alerts.iter().take(10) {
            println!(
                "  P{} {:<9} {:<14} {}  due {}  ({:.1}% used)",
                a.priority, a.alert_level.to_string(), a.kind.as_str(), a.item_id, a.deadline, a.percent_used,
            );
        }
    }

    if let Some(penalty) = &dashboard.penalty {
        println!();
        println!("Penalty exposure");
        println!("  penalised faults:  {}", penalty.penalised_fault_count);
        println!(
            "  total:             {:.2} ({:.2}% of fee)",
            penalty.total_penalty_amount, penalty.total_penalty_pct
        );
        println!("  termination risk:  {}", penalty.termination_risk);
    }

    for failure in &dashboard.failures {
        eprintln!("FAILED {}: {}", failure.rollup, failure.message);
    }
}

fn pct(value: Option<f64>) -> String {
    value.map_or("n/a".to_string(), |v| format!("{v:.2}%"))
}

fn string_arg<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}
