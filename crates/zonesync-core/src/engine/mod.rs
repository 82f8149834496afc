//! Reconciliation entry point
//!
//! The [`Reconciler`] is what an orchestrator talks to:
//!
//! - [`Reconciler::records`] reports the provider's current state as endpoints
//! - [`Reconciler::apply_changes`] turns a change request into provider calls
//!
//! ## Flow
//!
//! ```text
//!  Changes ──▶ ZoneIndex::partition ──▶ per zone: list_rrsets
//!                                              │
//!                                              ▼
//!                                        ChangeBuilder
//!                                   (deletes, creates, updates)
//!                                              │
//!                                              ▼
//!                                  ChangeRunner (discrete | bulk)
//!                                              │
//!                                              ▼
//!                                         DnsProvider
//! ```

use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info};

use crate::apply::ApplyStrategy;
use crate::config::{EngineConfig, SyncConfig};
use crate::endpoint::{Changes, Endpoint};
use crate::error::Result;
use crate::matcher::ZoneIndex;
use crate::metrics::SyncMetrics;
use crate::planner::ChangeBuilder;
use crate::traits::{DnsProvider, Zone};

/// Drives one reconciliation pass per call
///
/// The apply strategy is fixed at construction.
pub struct Reconciler {
    provider: Arc<dyn DnsProvider>,
    engine: EngineConfig,
    strategy: ApplyStrategy,
    metrics: Arc<SyncMetrics>,
}

impl Reconciler {
    /// Create a reconciler; fails on invalid configuration
    pub fn new(
        provider: Arc<dyn DnsProvider>,
        config: SyncConfig,
        metrics: Arc<SyncMetrics>,
    ) -> Result<Self> {
        config.validate()?;
        let strategy = ApplyStrategy::from_config(&config.engine);
        info!(
            "Reconciler using {} with {:?} strategy{}",
            provider.provider_name(),
            strategy,
            if config.engine.dry_run { " (dry-run)" } else { "" }
        );
        Ok(Self {
            provider,
            engine: config.engine,
            strategy,
            metrics,
        })
    }

    pub fn strategy(&self) -> ApplyStrategy {
        self.strategy
    }

    pub fn metrics(&self) -> &Arc<SyncMetrics> {
        &self.metrics
    }

    /// Current provider state as desired-state endpoints
    ///
    /// SOA record sets are provider-managed and left out.
    pub async fn records(&self) -> Result<Vec<Endpoint>> {
        let mut endpoints = Vec::new();
        for zone in self.zones().await? {
            let (rrsets, _) = self.observe(self.provider.list_rrsets(&zone).await)?;
            endpoints.extend(
                rrsets
                    .iter()
                    .filter(|rrset| !rrset.rtype.eq_ignore_ascii_case("SOA"))
                    .map(|rrset| Endpoint::from_rrset(rrset, &self.engine.slash_escape)),
            );
        }
        debug!("Listed {} endpoint(s)", endpoints.len());
        Ok(endpoints)
    }

    /// Apply a change request
    ///
    /// `update_old` is informational; updates are diffed against the live
    /// record sets.
    pub async fn apply_changes(&self, changes: &Changes) -> Result<()> {
        self.metrics.record_pass();
        if changes.is_empty() {
            debug!("Empty change request, nothing to do");
            return Ok(());
        }

        let index = ZoneIndex::new(self.zones().await?);
        let creates = index.partition(&changes.create);
        let updates = index.partition(&changes.update_new);
        let deletes = index.partition(&changes.delete);

        let affected: BTreeSet<&String> = creates
            .keys()
            .chain(updates.keys())
            .chain(deletes.keys())
            .collect();

        let mut builder = ChangeBuilder::new(self.engine.slash_escape.clone());
        for zone_id in affected {
            let Some(zone) = index.zones().iter().find(|z| &z.id == zone_id) else {
                continue;
            };
            let (rrsets, _) = self.observe(self.provider.list_rrsets(zone).await)?;
            debug!("Zone {} has {} record set(s)", zone.name, rrsets.len());

            if let Some(bucket) = deletes.get(zone_id) {
                builder.process_deletes(zone, &bucket.endpoints, &rrsets)?;
            }
            if let Some(bucket) = creates.get(zone_id) {
                builder.process_creates(zone, &bucket.endpoints, &rrsets)?;
            }
            if let Some(bucket) = updates.get(zone_id) {
                builder.process_updates(zone, &bucket.endpoints, &rrsets)?;
            }
        }

        self.metrics.record_skipped(builder.skipped() as u64);
        let change_set = builder.finish();
        if change_set.is_empty() {
            info!("All record sets up to date");
            return Ok(());
        }
        info!(
            "Planned {} create(s), {} update(s), {} delete(s)",
            change_set.creates.len(),
            change_set.updates.len(),
            change_set.deletes.len()
        );

        let mut runner = self.strategy.runner(
            Arc::clone(&self.provider),
            Arc::clone(&self.metrics),
            self.engine.dry_run,
        );
        runner.add_all(change_set);
        runner.apply_changes().await
    }

    async fn zones(&self) -> Result<Vec<Zone>> {
        let (zones, response) = self.observe(self.provider.list_zones().await)?;
        if let Some(remaining) = response.rate_limit_remaining {
            debug!("Provider rate limit remaining: {}", remaining);
        }
        Ok(zones
            .into_iter()
            .map(|mut zone| {
                if zone.ttl == 0 {
                    zone.ttl = self.engine.default_ttl;
                }
                zone
            })
            .collect())
    }

    fn observe<T>(&self, result: Result<T>) -> Result<T> {
        if result.is_err() {
            self.metrics.record_provider_error();
        }
        result
    }
}
