//! Change-set builder
//!
//! Diffs desired endpoints against a zone's existing record sets. Nothing
//! here talks to the provider; the output is a [`ChangeSet`] for an applier.
//!
//! Deletes should be processed before creates within a zone: a create for a
//! record set that the same pass deletes is a replacement, not an update.

use std::collections::{BTreeSet, HashSet};
use tracing::{debug, warn};

use crate::changes::{CreateChange, DeleteChange, UpdateChange};
use crate::endpoint::{self, Endpoint};
use crate::error::Result;
use crate::matcher;
use crate::names::RecordName;
use crate::traits::{RRSet, RRSetCreateOpts, Zone};

/// Changes computed for one pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    pub creates: Vec<CreateChange>,
    pub updates: Vec<UpdateChange>,
    pub deletes: Vec<DeleteChange>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.creates.is_empty() && self.updates.is_empty() && self.deletes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.creates.len() + self.updates.len() + self.deletes.len()
    }
}

type RecordKey = (String, RecordName, String);

/// Accumulates changes across zones and action categories
#[derive(Debug)]
pub struct ChangeBuilder {
    slash_escape: String,
    changes: ChangeSet,
    /// Keys with a create or update already emitted
    emitted: HashSet<RecordKey>,
    /// Keys with a delete already emitted
    deleted: HashSet<RecordKey>,
    skipped: usize,
}

impl ChangeBuilder {
    pub fn new(slash_escape: impl Into<String>) -> Self {
        Self {
            slash_escape: slash_escape.into(),
            changes: ChangeSet::default(),
            emitted: HashSet::new(),
            deleted: HashSet::new(),
            skipped: 0,
        }
    }

    /// Number of endpoints skipped so far
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Finish the pass
    pub fn finish(self) -> ChangeSet {
        self.changes
    }

    /// Emit a create for every endpoint without a record set
    ///
    /// An endpoint that unexpectedly matches an existing record set is
    /// diffed like an update instead of being created once per target value,
    /// so the set is never written twice in one pass.
    pub fn process_creates(
        &mut self,
        zone: &Zone,
        endpoints: &[&Endpoint],
        rrsets: &[RRSet],
    ) -> Result<()> {
        for endpoint in endpoints {
            let key = record_key(zone, endpoint);
            if self.emitted.contains(&key) {
                warn!(
                    "Duplicate create for {} {} in zone {}, skipping",
                    endpoint.dns_name, endpoint.record_type, zone.name
                );
                self.skipped += 1;
                continue;
            }

            let existing = matcher::find_rrset(endpoint, zone, rrsets)
                .filter(|_| !self.deleted.contains(&key));
            if let Some(rrset) = existing {
                warn!(
                    "Record set {} {} already exists in zone {}, updating instead of creating",
                    rrset.name, rrset.rtype, zone.name
                );
                self.diff(endpoint, zone, rrset)?;
                self.emitted.insert(key);
                continue;
            }

            if endpoint.targets.is_empty() {
                warn!(
                    "Endpoint {} {} has no targets, skipping create",
                    endpoint.dns_name, endpoint.record_type
                );
                self.skipped += 1;
                continue;
            }

            let labels = endpoint::extract_hetzner_labels(endpoint, &self.slash_escape)?;
            let opts = RRSetCreateOpts {
                name: matcher::record_name(endpoint, zone).to_string(),
                rtype: endpoint.record_type.to_ascii_uppercase(),
                ttl: endpoint.configured_ttl(),
                records: matcher::adjusted_targets(endpoint, zone),
                labels,
            };
            debug!("Planned create of {} {} in zone {}", opts.name, opts.rtype, zone.name);
            self.changes.creates.push(CreateChange {
                zone: zone.clone(),
                opts,
            });
            self.emitted.insert(key);
        }
        Ok(())
    }

    /// Emit an update for every endpoint whose record set differs
    pub fn process_updates(
        &mut self,
        zone: &Zone,
        endpoints: &[&Endpoint],
        rrsets: &[RRSet],
    ) -> Result<()> {
        for endpoint in endpoints {
            let key = record_key(zone, endpoint);
            let Some(rrset) = matcher::find_rrset(endpoint, zone, rrsets) else {
                warn!(
                    "No record set found for update of {} {} in zone {}, skipping",
                    endpoint.dns_name, endpoint.record_type, zone.name
                );
                self.skipped += 1;
                continue;
            };
            if self.emitted.contains(&key) || self.deleted.contains(&key) {
                warn!(
                    "Record set {} {} in zone {} already has a pending change, skipping update",
                    rrset.name, rrset.rtype, zone.name
                );
                self.skipped += 1;
                continue;
            }
            self.diff(endpoint, zone, rrset)?;
            self.emitted.insert(key);
        }
        Ok(())
    }

    /// Emit one delete per record set holding the endpoint's values
    pub fn process_deletes(
        &mut self,
        zone: &Zone,
        endpoints: &[&Endpoint],
        rrsets: &[RRSet],
    ) -> Result<()> {
        for endpoint in endpoints {
            let Some(rrset) = matcher::find_rrset_by_value(endpoint, zone, rrsets) else {
                warn!(
                    "No record set found for delete of {} {} in zone {}, skipping",
                    endpoint.dns_name, endpoint.record_type, zone.name
                );
                self.skipped += 1;
                continue;
            };
            let key = record_key(zone, endpoint);
            if !self.deleted.insert(key) {
                debug!("Delete of {} {} already planned", rrset.name, rrset.rtype);
                continue;
            }
            self.changes.deletes.push(DeleteChange {
                rrset: rrset.clone(),
            });
        }
        Ok(())
    }

    fn diff(&mut self, endpoint: &Endpoint, zone: &Zone, rrset: &RRSet) -> Result<()> {
        let desired = matcher::adjusted_targets(endpoint, zone);
        let records = (!same_values(&desired, &rrset.records)).then_some(desired);

        let ttl = endpoint
            .configured_ttl()
            .filter(|ttl| rrset.ttl != Some(*ttl));

        let desired_labels = endpoint::extract_hetzner_labels(endpoint, &self.slash_escape)?;
        let labels = (desired_labels != rrset.labels).then_some(desired_labels);

        match UpdateChange::new(rrset.clone(), ttl, records, labels) {
            Some(update) => self.changes.updates.push(update),
            None => debug!("Record set {} {} is up to date", rrset.name, rrset.rtype),
        }
        Ok(())
    }
}

fn record_key(zone: &Zone, endpoint: &Endpoint) -> RecordKey {
    (
        zone.id.clone(),
        matcher::record_name(endpoint, zone),
        endpoint.record_type.to_ascii_uppercase(),
    )
}

fn same_values(a: &[String], b: &[String]) -> bool {
    a.iter().collect::<BTreeSet<_>>() == b.iter().collect::<BTreeSet<_>>()
}
