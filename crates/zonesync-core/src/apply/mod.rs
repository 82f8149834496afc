//! Change appliers
//!
//! Two strategies share the [`ChangeRunner`] contract:
//!
//! - [`DiscreteRunner`]: one provider call per change (up to three per update)
//! - [`BulkRunner`]: per zone, export the zone file, mutate it locally and
//!   import it back
//!
//! The strategy is chosen once from configuration via [`ApplyStrategy`].

mod bulk;
mod discrete;

pub use bulk::{BulkRunner, ttl_directive};
pub use discrete::DiscreteRunner;

use async_trait::async_trait;
use std::sync::Arc;

use crate::changes::{CreateChange, DeleteChange, UpdateChange};
use crate::config::EngineConfig;
use crate::error::Result;
use crate::metrics::SyncMetrics;
use crate::planner::ChangeSet;
use crate::traits::DnsProvider;

/// Queue of changes applied in one go
///
/// A runner is filled once and applied once.
#[async_trait]
pub trait ChangeRunner: Send {
    fn add_create(&mut self, change: CreateChange);

    fn add_update(&mut self, change: UpdateChange);

    fn add_delete(&mut self, change: DeleteChange);

    /// Whether nothing is queued
    fn is_empty(&self) -> bool;

    /// Queue a whole change set
    fn add_all(&mut self, changes: ChangeSet) {
        for change in changes.deletes {
            self.add_delete(change);
        }
        for change in changes.creates {
            self.add_create(change);
        }
        for change in changes.updates {
            self.add_update(change);
        }
    }

    /// Execute every queued change against the provider
    async fn apply_changes(&mut self) -> Result<()>;
}

/// Which applier a reconciler uses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyStrategy {
    Discrete,
    Bulk,
}

impl ApplyStrategy {
    pub fn from_config(config: &EngineConfig) -> Self {
        if config.bulk_mode {
            ApplyStrategy::Bulk
        } else {
            ApplyStrategy::Discrete
        }
    }

    /// Fresh, empty runner of this strategy
    pub fn runner(
        self,
        provider: Arc<dyn DnsProvider>,
        metrics: Arc<SyncMetrics>,
        dry_run: bool,
    ) -> Box<dyn ChangeRunner> {
        match self {
            ApplyStrategy::Discrete => Box::new(DiscreteRunner::new(provider, metrics, dry_run)),
            ApplyStrategy::Bulk => Box::new(BulkRunner::new(provider, metrics, dry_run)),
        }
    }
}
