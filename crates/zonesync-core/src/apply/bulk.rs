//! Zone-file round trip per zone
//!
//! For each affected zone: export the zone file, apply every queued change
//! to a [`ZoneFile`], export it again (advancing the SOA serial) and import
//! the result. A failing mutation is skipped; a failing export, parse or
//! import aborts only that zone.

use async_trait::async_trait;
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::{Arc, LazyLock};
use tracing::{debug, error, info, warn};

use super::ChangeRunner;
use crate::changes::{Change, CreateChange, DeleteChange, UpdateChange, format_fields};
use crate::error::Result;
use crate::metrics::SyncMetrics;
use crate::traits::{DnsProvider, Zone};
use crate::zonefile::ZoneFile;

static TTL_DIRECTIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?mi)^[ \t]*\$TTL[ \t]+(-?\d+)\b").expect("TTL directive pattern is valid")
});

/// TTL from the first `$TTL` directive holding a plain non-negative integer
pub fn ttl_directive(text: &str) -> Option<u32> {
    let captures = TTL_DIRECTIVE.captures(text)?;
    captures.get(1)?.as_str().parse::<u32>().ok()
}

#[derive(Debug)]
struct ZonePlan {
    zone: Zone,
    creates: Vec<CreateChange>,
    updates: Vec<UpdateChange>,
    deletes: Vec<DeleteChange>,
}

impl ZonePlan {
    fn new(zone: Zone) -> Self {
        Self {
            zone,
            creates: Vec::new(),
            updates: Vec::new(),
            deletes: Vec::new(),
        }
    }
}

#[derive(Debug, Default)]
struct Applied {
    creates: u64,
    updates: u64,
    deletes: u64,
    skipped: u64,
}

impl Applied {
    fn total(&self) -> u64 {
        self.creates + self.updates + self.deletes
    }
}

/// Applies changes with two provider calls per zone
///
/// Dry-run still exports each affected zone so the would-be zone file can be
/// logged; only the import is withheld.
pub struct BulkRunner {
    provider: Arc<dyn DnsProvider>,
    metrics: Arc<SyncMetrics>,
    dry_run: bool,
    zones: BTreeMap<String, ZonePlan>,
}

impl BulkRunner {
    pub fn new(provider: Arc<dyn DnsProvider>, metrics: Arc<SyncMetrics>, dry_run: bool) -> Self {
        Self {
            provider,
            metrics,
            dry_run,
            zones: BTreeMap::new(),
        }
    }

    fn plan(&mut self, zone: &Zone) -> &mut ZonePlan {
        self.zones
            .entry(zone.id.clone())
            .or_insert_with(|| ZonePlan::new(zone.clone()))
    }

    async fn apply_zone(&self, plan: ZonePlan) -> Result<()> {
        let ZonePlan {
            zone,
            creates,
            updates,
            deletes,
        } = plan;
        let (text, _) = self.provider.export_zonefile(&zone).await?;

        let ttl = match ttl_directive(&text) {
            Some(ttl) => ttl,
            None => {
                debug!("No usable $TTL in zone {}, using zone TTL {}", zone.name, zone.ttl);
                zone.ttl
            }
        };
        let mut model = ZoneFile::parse(&text, &zone.name, ttl)?;
        let applied = self.mutate(&mut model, creates, updates, deletes);

        if applied.total() == 0 {
            self.metrics.record_skipped(applied.skipped);
            info!("No change applied to zone {}, skipping import", zone.name);
            return Ok(());
        }

        let zonefile = model.export()?;
        if self.dry_run {
            info!("[DRY-RUN] Would import zone file for {}:\n{}", zone.name, zonefile);
            return Ok(());
        }

        self.provider.import_zonefile(&zone, &zonefile).await?;
        self.metrics.record_zone_imported();
        for _ in 0..applied.creates {
            self.metrics.record_create();
        }
        for _ in 0..applied.updates {
            self.metrics.record_update();
        }
        for _ in 0..applied.deletes {
            self.metrics.record_delete();
        }
        self.metrics.record_skipped(applied.skipped);
        info!(
            "Imported zone {}: {} create(s), {} update(s), {} delete(s), {} skipped",
            zone.name, applied.creates, applied.updates, applied.deletes, applied.skipped
        );
        Ok(())
    }

    fn mutate(
        &self,
        model: &mut ZoneFile,
        creates: Vec<CreateChange>,
        updates: Vec<UpdateChange>,
        deletes: Vec<DeleteChange>,
    ) -> Applied {
        let mut applied = Applied::default();

        for change in deletes {
            let result = model.delete(&change.rrset.name, &change.rrset.rtype);
            if self.settle(Change::Delete(change), result) {
                applied.deletes += 1;
            } else {
                applied.skipped += 1;
            }
        }

        for change in creates {
            let opts = &change.opts;
            let result = model.add(&opts.name, &opts.rtype, opts.ttl, &opts.records);
            if self.settle(Change::Create(change), result) {
                applied.creates += 1;
            } else {
                applied.skipped += 1;
            }
        }

        for change in updates {
            if change.ttl().is_none() && change.records().is_none() {
                warn!(
                    "Zone files carry no labels, skipping label update of {} {}",
                    change.rrset().name,
                    change.rrset().rtype
                );
                applied.skipped += 1;
                continue;
            }
            let rrset = change.rrset();
            let ttl = change.ttl().or(rrset.ttl);
            let records = change.records().unwrap_or(&rrset.records);
            let result = model.update(&rrset.name, &rrset.rtype, ttl, records);
            if self.settle(Change::Update(change), result) {
                applied.updates += 1;
            } else {
                applied.skipped += 1;
            }
        }

        applied
    }

    /// Log the outcome of one mutation; true when it took effect
    fn settle(&self, change: Change, result: Result<()>) -> bool {
        let fields = format_fields(&change.describe_for_log());
        match result {
            Ok(()) if self.dry_run => {
                info!("[DRY-RUN] Would {} record set: {}", change.action(), fields);
                true
            }
            Ok(()) => {
                debug!("Applied {} to zone model: {}", change.action(), fields);
                true
            }
            Err(e) => {
                warn!("Skipping {} ({}): {}", change.action(), e, fields);
                false
            }
        }
    }
}

#[async_trait]
impl ChangeRunner for BulkRunner {
    fn add_create(&mut self, change: CreateChange) {
        let zone = change.zone.clone();
        self.plan(&zone).creates.push(change);
    }

    fn add_update(&mut self, change: UpdateChange) {
        let zone = change.rrset().zone.clone();
        self.plan(&zone).updates.push(change);
    }

    fn add_delete(&mut self, change: DeleteChange) {
        let zone = change.rrset.zone.clone();
        self.plan(&zone).deletes.push(change);
    }

    fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    async fn apply_changes(&mut self) -> Result<()> {
        let zones = std::mem::take(&mut self.zones);
        let mut first_error = None;

        for (_, plan) in zones {
            let name = plan.zone.name.clone();
            if let Err(e) = self.apply_zone(plan).await {
                error!("Failed to apply changes to zone {}: {}", name, e);
                self.metrics.record_provider_error();
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
