//! Typed change objects
//!
//! A pass produces [`Change`] values; appliers consume them once. Each
//! variant renders its own log fields through [`Change::describe_for_log`].

use std::collections::BTreeMap;

use crate::traits::{RRSet, RRSetCreateOpts, Zone};

/// Create a record set that does not exist yet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateChange {
    pub zone: Zone,
    pub opts: RRSetCreateOpts,
}

/// Modify an existing record set
///
/// Only fields that differ carry a payload, and at least one always does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateChange {
    rrset: RRSet,
    ttl: Option<u32>,
    records: Option<Vec<String>>,
    labels: Option<BTreeMap<String, String>>,
}

impl UpdateChange {
    /// Build an update; `None` when no payload is present
    pub fn new(
        rrset: RRSet,
        ttl: Option<u32>,
        records: Option<Vec<String>>,
        labels: Option<BTreeMap<String, String>>,
    ) -> Option<Self> {
        if ttl.is_none() && records.is_none() && labels.is_none() {
            return None;
        }
        Some(Self {
            rrset,
            ttl,
            records,
            labels,
        })
    }

    pub fn rrset(&self) -> &RRSet {
        &self.rrset
    }

    pub fn ttl(&self) -> Option<u32> {
        self.ttl
    }

    pub fn records(&self) -> Option<&[String]> {
        self.records.as_deref()
    }

    pub fn labels(&self) -> Option<&BTreeMap<String, String>> {
        self.labels.as_ref()
    }
}

/// Remove an existing record set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteChange {
    pub rrset: RRSet,
}

/// One pending change
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    Create(CreateChange),
    Update(UpdateChange),
    Delete(DeleteChange),
}

impl Change {
    /// Zone the change applies to
    pub fn zone(&self) -> &Zone {
        match self {
            Change::Create(c) => &c.zone,
            Change::Update(u) => &u.rrset.zone,
            Change::Delete(d) => &d.rrset.zone,
        }
    }

    /// Short action name
    pub fn action(&self) -> &'static str {
        match self {
            Change::Create(_) => "create",
            Change::Update(_) => "update",
            Change::Delete(_) => "delete",
        }
    }

    /// Key/value fields describing the change
    pub fn describe_for_log(&self) -> Vec<(&'static str, String)> {
        match self {
            Change::Create(c) => vec![
                ("zone", c.zone.name.clone()),
                ("name", c.opts.name.clone()),
                ("type", c.opts.rtype.clone()),
                ("ttl", describe_ttl(c.opts.ttl)),
                ("records", c.opts.records.join(",")),
                ("labels", describe_labels(&c.opts.labels)),
            ],
            Change::Update(u) => {
                let mut fields = vec![
                    ("zone", u.rrset.zone.name.clone()),
                    ("name", u.rrset.name.clone()),
                    ("type", u.rrset.rtype.clone()),
                ];
                if let Some(ttl) = u.ttl {
                    fields.push(("old_ttl", describe_ttl(u.rrset.ttl)));
                    fields.push(("new_ttl", ttl.to_string()));
                }
                if let Some(records) = &u.records {
                    fields.push(("old_records", u.rrset.records.join(",")));
                    fields.push(("new_records", records.join(",")));
                }
                if let Some(labels) = &u.labels {
                    fields.push(("old_labels", describe_labels(&u.rrset.labels)));
                    fields.push(("new_labels", describe_labels(labels)));
                }
                fields
            }
            Change::Delete(d) => vec![
                ("zone", d.rrset.zone.name.clone()),
                ("name", d.rrset.name.clone()),
                ("type", d.rrset.rtype.clone()),
                ("records", d.rrset.records.join(",")),
            ],
        }
    }
}

/// Render log fields as `key=value` pairs
pub fn format_fields(fields: &[(&'static str, String)]) -> String {
    fields
        .iter()
        .map(|(key, value)| format!("{}={}", key, value))
        .collect::<Vec<_>>()
        .join(" ")
}

fn describe_ttl(ttl: Option<u32>) -> String {
    ttl.map(|t| t.to_string()).unwrap_or_else(|| "default".to_string())
}

fn describe_labels(labels: &BTreeMap<String, String>) -> String {
    labels
        .iter()
        .map(|(k, v)| format!("{}:{}", k, v))
        .collect::<Vec<_>>()
        .join(",")
}
