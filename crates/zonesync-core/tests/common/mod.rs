//! Test doubles and common utilities for reconciliation contract tests
//!
//! [`InMemoryProvider`] keeps zones, record sets and zone-file text in
//! memory and records every call it receives, so tests can assert both the
//! outcome and the exact sequence of provider round trips.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use zonesync_core::config::{EngineConfig, ProviderConfig, SyncConfig};
use zonesync_core::error::{Error, Result};
use zonesync_core::traits::{ApiResponse, DnsProvider, RRSet, RRSetCreateOpts, Zone};

/// Zone file for `alpha.com` with one A record `www`
pub const ALPHA_ZONEFILE: &str = "\
$ORIGIN alpha.com.
$TTL 3600
; SOA Record
@\tIN\tSOA\thydrogen.ns.hetzner.com. dns.hetzner.com. 2024010100 86400 10800 3600000 3600

@\tIN\tNS\thydrogen.ns.hetzner.com.
www\tIN\tA\t116.202.181.2
";

#[derive(Default)]
struct State {
    zones: Vec<Zone>,
    rrsets: HashMap<String, Vec<RRSet>>,
    zonefiles: HashMap<String, String>,
    imported: HashMap<String, String>,
    calls: Vec<String>,
    fail_on: Option<&'static str>,
}

/// A DnsProvider backed by in-memory state
///
/// Clones share state, so a test can keep one handle and give another to
/// the reconciler.
#[derive(Clone, Default)]
pub struct InMemoryProvider {
    state: Arc<Mutex<State>>,
    call_count: Arc<AtomicUsize>,
}

impl InMemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a zone with its record sets and zone-file text
    pub fn with_zone(self, zone: Zone, rrsets: Vec<RRSet>, zonefile: &str) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            state.rrsets.insert(zone.id.clone(), rrsets);
            state.zonefiles.insert(zone.id.clone(), zonefile.to_string());
            state.zones.push(zone);
        }
        self
    }

    /// Make every call of the named method fail
    pub fn fail_on(&self, method: &'static str) {
        self.state.lock().unwrap().fail_on = Some(method);
    }

    /// Calls received so far, e.g. `"delete_rrset www/A"`
    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Number of calls that would mutate provider state
    pub fn write_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| !c.starts_with("list_") && !c.starts_with("export_"))
            .count()
    }

    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Last zone-file text imported for a zone
    pub fn imported(&self, zone_id: &str) -> Option<String> {
        self.state.lock().unwrap().imported.get(zone_id).cloned()
    }

    /// Current record sets of a zone
    pub fn rrsets(&self, zone_id: &str) -> Vec<RRSet> {
        self.state
            .lock()
            .unwrap()
            .rrsets
            .get(zone_id)
            .cloned()
            .unwrap_or_default()
    }

    fn enter(&self, method: &'static str, detail: String) -> Result<()> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.lock().unwrap();
        if detail.is_empty() {
            state.calls.push(method.to_string());
        } else {
            state.calls.push(format!("{} {}", method, detail));
        }
        if state.fail_on == Some(method) {
            return Err(Error::provider("memory", format!("{} failed", method)));
        }
        Ok(())
    }

    fn modify(&self, rrset: &RRSet, f: impl FnOnce(&mut RRSet)) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        let sets = state.rrsets.entry(rrset.zone.id.clone()).or_default();
        let existing = sets
            .iter_mut()
            .find(|r| r.id == rrset.id)
            .ok_or_else(|| Error::not_found(rrset.id.clone()))?;
        f(existing);
        Ok(())
    }
}

#[async_trait]
impl DnsProvider for InMemoryProvider {
    async fn list_zones(&self) -> Result<(Vec<Zone>, ApiResponse)> {
        self.enter("list_zones", String::new())?;
        Ok((self.state.lock().unwrap().zones.clone(), ApiResponse::default()))
    }

    async fn list_rrsets(&self, zone: &Zone) -> Result<(Vec<RRSet>, ApiResponse)> {
        self.enter("list_rrsets", zone.name.clone())?;
        Ok((self.rrsets(&zone.id), ApiResponse::default()))
    }

    async fn create_rrset(
        &self,
        zone: &Zone,
        opts: &RRSetCreateOpts,
    ) -> Result<(RRSet, ApiResponse)> {
        self.enter("create_rrset", format!("{}/{}", opts.name, opts.rtype))?;
        let rrset = rrset(zone, &opts.name, &opts.rtype, opts.ttl, &[]);
        let rrset = RRSet {
            records: opts.records.clone(),
            labels: opts.labels.clone(),
            ..rrset
        };
        self.state
            .lock()
            .unwrap()
            .rrsets
            .entry(zone.id.clone())
            .or_default()
            .push(rrset.clone());
        Ok((rrset, ApiResponse::default()))
    }

    async fn change_rrset_ttl(&self, rrset: &RRSet, ttl: u32) -> Result<ApiResponse> {
        self.enter("change_rrset_ttl", rrset.id.clone())?;
        self.modify(rrset, |r| r.ttl = Some(ttl))?;
        Ok(ApiResponse::default())
    }

    async fn set_rrset_records(&self, rrset: &RRSet, values: &[String]) -> Result<ApiResponse> {
        self.enter("set_rrset_records", rrset.id.clone())?;
        self.modify(rrset, |r| r.records = values.to_vec())?;
        Ok(ApiResponse::default())
    }

    async fn update_rrset_labels(
        &self,
        rrset: &RRSet,
        labels: &BTreeMap<String, String>,
    ) -> Result<ApiResponse> {
        self.enter("update_rrset_labels", rrset.id.clone())?;
        self.modify(rrset, |r| r.labels = labels.clone())?;
        Ok(ApiResponse::default())
    }

    async fn delete_rrset(&self, rrset: &RRSet) -> Result<ApiResponse> {
        self.enter("delete_rrset", rrset.id.clone())?;
        let mut state = self.state.lock().unwrap();
        if let Some(sets) = state.rrsets.get_mut(&rrset.zone.id) {
            sets.retain(|r| r.id != rrset.id);
        }
        Ok(ApiResponse::default())
    }

    async fn export_zonefile(&self, zone: &Zone) -> Result<(String, ApiResponse)> {
        self.enter("export_zonefile", zone.name.clone())?;
        let state = self.state.lock().unwrap();
        let text = state
            .zonefiles
            .get(&zone.id)
            .cloned()
            .ok_or_else(|| Error::not_found(zone.name.clone()))?;
        Ok((text, ApiResponse::default()))
    }

    async fn import_zonefile(&self, zone: &Zone, zonefile: &str) -> Result<ApiResponse> {
        self.enter("import_zonefile", zone.name.clone())?;
        let mut state = self.state.lock().unwrap();
        state.zonefiles.insert(zone.id.clone(), zonefile.to_string());
        state.imported.insert(zone.id.clone(), zonefile.to_string());
        Ok(ApiResponse::default())
    }

    fn provider_name(&self) -> &'static str {
        "memory"
    }
}

pub fn zone(id: &str, name: &str, ttl: u32) -> Zone {
    Zone {
        id: id.to_string(),
        name: name.to_string(),
        ttl,
    }
}

pub fn alpha() -> Zone {
    zone("1", "alpha.com", 3600)
}

pub fn rrset(zone: &Zone, name: &str, rtype: &str, ttl: Option<u32>, records: &[&str]) -> RRSet {
    RRSet {
        id: format!("{}/{}", name, rtype),
        zone: zone.clone(),
        name: name.to_string(),
        rtype: rtype.to_string(),
        ttl,
        records: records.iter().map(|r| r.to_string()).collect(),
        labels: BTreeMap::new(),
    }
}

/// Provider holding `alpha.com` with `www A 116.202.181.2`
pub fn alpha_provider() -> InMemoryProvider {
    let alpha = alpha();
    let www = rrset(&alpha, "www", "A", None, &["116.202.181.2"]);
    InMemoryProvider::new().with_zone(alpha, vec![www], ALPHA_ZONEFILE)
}

pub fn config(bulk_mode: bool, dry_run: bool) -> SyncConfig {
    SyncConfig {
        provider: ProviderConfig::hetzner("test-token"),
        engine: EngineConfig {
            bulk_mode,
            dry_run,
            ..EngineConfig::default()
        },
    }
}
