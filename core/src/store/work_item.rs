//! Site, technician and work item queries.

use super::{from_millis, SlaStore};
use crate::{
    error::SlaResult,
    snapshot::{SiteRef, SnapshotProvider, SnapshotWindow, TechnicianRef, WorkSnapshot},
    work_item::{normalize_category, ItemKind, WorkItem},
};
use rusqlite::params;

type ItemRow = (String, String, Option<String>, i64, Option<i64>, Option<String>, Option<String>, Option<String>);

impl SlaStore {
    // ── Directories ───────────────────────────────────────────

    pub fn insert_site(&self, site: &SiteRef) -> SlaResult<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO site (site_id, name, region) VALUES (?1, ?2, ?3)",
            params![site.site_id, site.name, site.region],
        )?;
        Ok(())
    }

    pub fn insert_technician(&self, technician: &TechnicianRef) -> SlaResult<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO technician (technician_id, full_name) VALUES (?1, ?2)",
            params![technician.technician_id, technician.full_name],
        )?;
        Ok(())
    }

    pub fn list_sites(&self) -> SlaResult<Vec<SiteRef>> {
        let mut stmt = self
            .conn
            .prepare("SELECT site_id, name, region FROM site ORDER BY site_id")?;
        let sites = stmt
            .query_map([], |r| {
                Ok(SiteRef {
                    site_id: r.get(0)?,
                    name:    r.get(1)?,
                    region:  r.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(sites)
    }

    pub fn list_technicians(&self) -> SlaResult<Vec<TechnicianRef>> {
        let mut stmt = self
            .conn
            .prepare("SELECT technician_id, full_name FROM technician ORDER BY technician_id")?;
        let technicians = stmt
            .query_map([], |r| {
                Ok(TechnicianRef {
                    technician_id: r.get(0)?,
                    full_name:     r.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(technicians)
    }

    // ── Work items ────────────────────────────────────────────

    pub fn insert_work_item(&self, item: &WorkItem) -> SlaResult<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO work_item (
                item_id, kind, category, created_at, resolved_at,
                site_id, region, technician_id
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                item.id,
                item.kind.as_str(),
                item.category,
                item.created_at.timestamp_millis(),
                item.resolved_at.map(|at| at.timestamp_millis()),
                item.site_id,
                item.region,
                item.technician_id,
            ],
        )?;
        Ok(())
    }

    /// Write a whole snapshot in one transaction.
    pub fn insert_snapshot(&self, snapshot: &WorkSnapshot) -> SlaResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        for site in &snapshot.sites {
            self.insert_site(site)?;
        }
        for technician in &snapshot.technicians {
            self.insert_technician(technician)?;
        }
        for item in &snapshot.items {
            self.insert_work_item(item)?;
        }
        tx.commit()?;
        log::debug!("store: wrote {} work items", snapshot.items.len());
        Ok(())
    }

    pub fn work_item_count(&self) -> SlaResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM work_item", [], |r| r.get(0))?;
        Ok(count as u64)
    }

    /// Open items plus resolved items created inside the window, by id.
    pub fn load_snapshot(&self, window: SnapshotWindow) -> SlaResult<WorkSnapshot> {
        let mut stmt = self.conn.prepare(
            "SELECT item_id, kind, category, created_at, resolved_at,
                    site_id, region, technician_id
             FROM work_item
             WHERE resolved_at IS NULL OR created_at >= ?1
             ORDER BY item_id",
        )?;
        let rows: Vec<ItemRow> = stmt
            .query_map(params![window.since().timestamp_millis()], |r| {
                Ok((
                    r.get(0)?,
                    r.get(1)?,
                    r.get(2)?,
                    r.get(3)?,
                    r.get(4)?,
                    r.get(5)?,
                    r.get(6)?,
                    r.get(7)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut items = Vec::with_capacity(rows.len());
        for (id, kind, category, created_at, resolved_at, site_id, region, technician_id) in rows {
            let kind: ItemKind = kind.parse()?;
            let created_at = from_millis(created_at, &id, "created_at")?;
            let resolved_at = resolved_at
                .map(|ms| from_millis(ms, &id, "resolved_at"))
                .transpose()?;
            items.push(WorkItem {
                id,
                kind,
                category: category.as_deref().and_then(normalize_category),
                created_at,
                resolved_at,
                site_id,
                region,
                technician_id,
            });
        }

        Ok(WorkSnapshot::new(window.until, items)
            .with_sites(self.list_sites()?)
            .with_technicians(self.list_technicians()?))
    }
}

impl SnapshotProvider for SlaStore {
    fn snapshot(&self, window: SnapshotWindow) -> SlaResult<WorkSnapshot> {
        self.load_snapshot(window)
    }
}
