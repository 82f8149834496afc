//! One provider call per change

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};

use super::ChangeRunner;
use crate::changes::{Change, CreateChange, DeleteChange, UpdateChange, format_fields};
use crate::error::Result;
use crate::metrics::SyncMetrics;
use crate::traits::DnsProvider;

/// Applies deletes, then creates, then updates
///
/// The first failing call aborts the rest of the queue. In dry-run mode
/// every change is logged and no provider call is made.
pub struct DiscreteRunner {
    provider: Arc<dyn DnsProvider>,
    metrics: Arc<SyncMetrics>,
    dry_run: bool,
    creates: Vec<CreateChange>,
    updates: Vec<UpdateChange>,
    deletes: Vec<DeleteChange>,
}

impl DiscreteRunner {
    pub fn new(provider: Arc<dyn DnsProvider>, metrics: Arc<SyncMetrics>, dry_run: bool) -> Self {
        Self {
            provider,
            metrics,
            dry_run,
            creates: Vec::new(),
            updates: Vec::new(),
            deletes: Vec::new(),
        }
    }

    fn observe<T>(&self, result: Result<T>) -> Result<T> {
        if result.is_err() {
            self.metrics.record_provider_error();
        }
        result
    }

    async fn delete(&self, change: DeleteChange) -> Result<()> {
        let fields = format_fields(&Change::Delete(change.clone()).describe_for_log());
        if self.dry_run {
            info!("[DRY-RUN] Would delete record set: {}", fields);
            return Ok(());
        }
        self.observe(self.provider.delete_rrset(&change.rrset).await)?;
        self.metrics.record_delete();
        info!("Deleted record set: {}", fields);
        Ok(())
    }

    async fn create(&self, change: CreateChange) -> Result<()> {
        let fields = format_fields(&Change::Create(change.clone()).describe_for_log());
        if self.dry_run {
            info!("[DRY-RUN] Would create record set: {}", fields);
            return Ok(());
        }
        let (rrset, _) =
            self.observe(self.provider.create_rrset(&change.zone, &change.opts).await)?;
        self.metrics.record_create();
        info!("Created record set {}: {}", rrset.id, fields);
        Ok(())
    }

    async fn update(&self, change: UpdateChange) -> Result<()> {
        let fields = format_fields(&Change::Update(change.clone()).describe_for_log());
        if self.dry_run {
            info!("[DRY-RUN] Would update record set: {}", fields);
            return Ok(());
        }
        let rrset = change.rrset();
        if let Some(records) = change.records() {
            self.observe(self.provider.set_rrset_records(rrset, records).await)?;
            debug!("Set records of {} {}", rrset.name, rrset.rtype);
        }
        if let Some(ttl) = change.ttl() {
            self.observe(self.provider.change_rrset_ttl(rrset, ttl).await)?;
            debug!("Changed TTL of {} {} to {}", rrset.name, rrset.rtype, ttl);
        }
        if let Some(labels) = change.labels() {
            self.observe(self.provider.update_rrset_labels(rrset, labels).await)?;
            debug!("Updated labels of {} {}", rrset.name, rrset.rtype);
        }
        self.metrics.record_update();
        info!("Updated record set: {}", fields);
        Ok(())
    }
}

#[async_trait]
impl ChangeRunner for DiscreteRunner {
    fn add_create(&mut self, change: CreateChange) {
        self.creates.push(change);
    }

    fn add_update(&mut self, change: UpdateChange) {
        self.updates.push(change);
    }

    fn add_delete(&mut self, change: DeleteChange) {
        self.deletes.push(change);
    }

    fn is_empty(&self) -> bool {
        self.creates.is_empty() && self.updates.is_empty() && self.deletes.is_empty()
    }

    async fn apply_changes(&mut self) -> Result<()> {
        let deletes = std::mem::take(&mut self.deletes);
        let creates = std::mem::take(&mut self.creates);
        let updates = std::mem::take(&mut self.updates);
        debug!(
            "Applying {} delete(s), {} create(s), {} update(s) via {}",
            deletes.len(),
            creates.len(),
            updates.len(),
            self.provider.provider_name()
        );

        for change in deletes {
            self.delete(change).await?;
        }
        for change in creates {
            self.create(change).await?;
        }
        for change in updates {
            self.update(change).await?;
        }
        Ok(())
    }
}
