//! Desired-state endpoints and the label transport
//!
//! Endpoints arrive from the external orchestrator in its camelCase JSON
//! form. Provider labels have no first-class field there, so they travel as
//! a provider-specific property:
//!
//! ```text
//! webhook/hetzner-labels = "env=prod;project--slash--team=dns"
//! ```
//!
//! Pairs are `;`-separated and any `/` in a key is replaced by a
//! configurable escape token.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::LazyLock;

use crate::error::LabelError;
use crate::names::{self, RecordName};
use crate::traits::RRSet;

/// Reserved provider-specific property carrying labels
pub const LABELS_PROPERTY: &str = "webhook/hetzner-labels";

/// Default replacement for `/` inside transported label keys
pub const DEFAULT_SLASH_ESCAPE: &str = "--slash--";

const MAX_LABEL_LEN: usize = 63;

static LABEL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_./-]*$").expect("label pattern is valid"));

/// A provider-specific property attached to an endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderSpecific {
    pub name: String,
    pub value: String,
}

/// One desired DNS record set
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Endpoint {
    /// Fully qualified name
    pub dns_name: String,
    /// Record type mnemonic
    pub record_type: String,
    /// Target values; order is irrelevant
    #[serde(default)]
    pub targets: Vec<String>,
    /// Requested TTL; zero or absent means "not configured"
    #[serde(default, rename = "recordTTL", skip_serializing_if = "Option::is_none")]
    pub record_ttl: Option<u32>,
    /// Orchestrator-owned labels
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub provider_specific: Vec<ProviderSpecific>,
}

impl Endpoint {
    pub fn new(
        dns_name: impl Into<String>,
        record_type: impl Into<String>,
        targets: Vec<String>,
    ) -> Self {
        Self {
            dns_name: dns_name.into(),
            record_type: record_type.into(),
            targets,
            ..Self::default()
        }
    }

    /// Set the TTL
    pub fn with_ttl(mut self, ttl: u32) -> Self {
        self.record_ttl = Some(ttl);
        self
    }

    /// Attach a provider-specific property
    pub fn with_provider_specific(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.provider_specific.push(ProviderSpecific {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    /// TTL if one was actually requested
    pub fn configured_ttl(&self) -> Option<u32> {
        self.record_ttl.filter(|ttl| *ttl > 0)
    }

    /// Look up a provider-specific property
    pub fn provider_specific_value(&self, name: &str) -> Option<&str> {
        self.provider_specific
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.value.as_str())
    }

    /// Desired-state view of an existing record set
    pub fn from_rrset(rrset: &RRSet, slash_escape: &str) -> Self {
        let zone = &rrset.zone.name;
        Self {
            dns_name: RecordName::from_rrset_name(&rrset.name).to_dns_name(zone),
            record_type: rrset.rtype.clone(),
            targets: rrset
                .records
                .iter()
                .map(|value| names::target_from_value(&rrset.rtype, value, zone))
                .collect(),
            record_ttl: rrset.ttl,
            labels: BTreeMap::new(),
            provider_specific: get_provider_specific(&rrset.labels, slash_escape),
        }
    }
}

/// Change request from the orchestrator
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Changes {
    #[serde(default)]
    pub create: Vec<Endpoint>,
    #[serde(default)]
    pub update_old: Vec<Endpoint>,
    #[serde(default)]
    pub update_new: Vec<Endpoint>,
    #[serde(default)]
    pub delete: Vec<Endpoint>,
}

impl Changes {
    /// Whether there is nothing to do
    pub fn is_empty(&self) -> bool {
        self.create.is_empty() && self.update_new.is_empty() && self.delete.is_empty()
    }
}

/// Encode labels as the reserved provider-specific property
///
/// An empty label map yields no property at all.
pub fn get_provider_specific(
    labels: &BTreeMap<String, String>,
    slash_escape: &str,
) -> Vec<ProviderSpecific> {
    if labels.is_empty() {
        return Vec::new();
    }
    let value = labels
        .iter()
        .map(|(key, value)| format!("{}={}", key.replace('/', slash_escape), value))
        .collect::<Vec<_>>()
        .join(";");
    vec![ProviderSpecific {
        name: LABELS_PROPERTY.to_string(),
        value,
    }]
}

/// Decode the labels an endpoint carries; no property means no labels
pub fn extract_hetzner_labels(
    endpoint: &Endpoint,
    slash_escape: &str,
) -> Result<BTreeMap<String, String>, LabelError> {
    match endpoint.provider_specific_value(LABELS_PROPERTY) {
        Some(value) => decode_labels(value, slash_escape),
        None => Ok(BTreeMap::new()),
    }
}

/// Decode a `;`-joined `key=value` list
pub fn decode_labels(
    encoded: &str,
    slash_escape: &str,
) -> Result<BTreeMap<String, String>, LabelError> {
    let mut labels = BTreeMap::new();
    for pair in encoded.split(';').filter(|p| !p.is_empty()) {
        let (raw_key, value) = pair
            .split_once('=')
            .ok_or_else(|| LabelError::MalformedPair(pair.to_string()))?;
        let key = if slash_escape.is_empty() {
            raw_key.to_string()
        } else {
            raw_key.replace(slash_escape, "/")
        };
        if key.is_empty() {
            return Err(LabelError::EmptyKey);
        }
        validate_label_text("key", &key)?;
        validate_label_text("value", value)?;
        labels.insert(key, value.to_string());
    }
    Ok(labels)
}

fn validate_label_text(field: &'static str, text: &str) -> Result<(), LabelError> {
    if !LABEL_RE.is_match(text) {
        return Err(LabelError::DisallowedCharacters {
            field,
            text: text.to_string(),
        });
    }
    if text.len() > MAX_LABEL_LEN {
        return Err(LabelError::TooLong {
            field,
            text: text.to_string(),
        });
    }
    Ok(())
}
