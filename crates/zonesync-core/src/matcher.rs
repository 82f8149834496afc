//! Matching desired endpoints against zones and existing record sets

use std::collections::BTreeMap;
use tracing::debug;

use crate::endpoint::Endpoint;
use crate::names::{self, RecordName};
use crate::traits::{RRSet, Zone};

/// Zones indexed for suffix lookup
#[derive(Debug, Clone, Default)]
pub struct ZoneIndex {
    zones: Vec<Zone>,
}

impl ZoneIndex {
    pub fn new(zones: Vec<Zone>) -> Self {
        Self { zones }
    }

    pub fn zones(&self) -> &[Zone] {
        &self.zones
    }

    /// Zone owning `dns_name`; the longest matching zone name wins
    pub fn find_zone(&self, dns_name: &str) -> Option<&Zone> {
        let name = dns_name.trim_end_matches('.').to_ascii_lowercase();
        self.zones
            .iter()
            .filter(|zone| {
                let zone_name = zone.name.trim_end_matches('.').to_ascii_lowercase();
                name == zone_name || name.ends_with(&format!(".{}", zone_name))
            })
            .max_by_key(|zone| zone.name.trim_end_matches('.').len())
    }

    /// Group endpoints by owning zone, keyed by zone id
    ///
    /// Endpoints outside every known zone are dropped.
    pub fn partition<'a>(&self, endpoints: &'a [Endpoint]) -> BTreeMap<String, ZoneBucket<'a>> {
        let mut buckets: BTreeMap<String, ZoneBucket<'a>> = BTreeMap::new();
        for endpoint in endpoints {
            let Some(zone) = self.find_zone(&endpoint.dns_name) else {
                debug!("No zone found for endpoint {}", endpoint.dns_name);
                continue;
            };
            buckets
                .entry(zone.id.clone())
                .or_insert_with(|| ZoneBucket {
                    zone: zone.clone(),
                    endpoints: Vec::new(),
                })
                .endpoints
                .push(endpoint);
        }
        buckets
    }
}

/// Endpoints that belong to one zone
#[derive(Debug, Clone)]
pub struct ZoneBucket<'a> {
    pub zone: Zone,
    pub endpoints: Vec<&'a Endpoint>,
}

/// Zone-relative name of an endpoint
pub fn record_name(endpoint: &Endpoint, zone: &Zone) -> RecordName {
    RecordName::from_dns_name(&endpoint.dns_name, &zone.name)
}

/// Existing record set with the endpoint's name and type, if any
pub fn find_rrset<'a>(endpoint: &Endpoint, zone: &Zone, rrsets: &'a [RRSet]) -> Option<&'a RRSet> {
    let wanted = record_name(endpoint, zone);
    rrsets.iter().find(|rrset| {
        rrset.zone.id == zone.id
            && rrset.rtype.eq_ignore_ascii_case(&endpoint.record_type)
            && RecordName::from_rrset_name(&rrset.name) == wanted
    })
}

/// Record set holding at least one of the endpoint's target values
///
/// Name and type must match as well. An endpoint without targets matches on
/// name and type alone.
pub fn find_rrset_by_value<'a>(
    endpoint: &Endpoint,
    zone: &Zone,
    rrsets: &'a [RRSet],
) -> Option<&'a RRSet> {
    find_rrset(endpoint, zone, rrsets).filter(|rrset| {
        endpoint.targets.is_empty()
            || rrset.records.iter().any(|value| {
                endpoint
                    .targets
                    .iter()
                    .any(|target| names::value_matches(&rrset.rtype, value, target, &zone.name))
            })
    })
}

/// Endpoint targets as the provider stores them
pub fn adjusted_targets(endpoint: &Endpoint, zone: &Zone) -> Vec<String> {
    endpoint
        .targets
        .iter()
        .map(|target| names::adjust_target(&endpoint.record_type, target, &zone.name))
        .collect()
}
