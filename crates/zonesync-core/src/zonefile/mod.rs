//! In-memory zone file model
//!
//! A zone file exported by the provider is parsed into record sets keyed by
//! owner name and type code, mutated by the bulk applier, then written back
//! out with a freshly incremented SOA serial.
//!
//! ## Lifecycle
//!
//! ```text
//! text ──parse──▶ ZoneFile ──add/update/delete──▶ ZoneFile ──export──▶ text
//! ```
//!
//! [`ZoneFile::export`] consumes the model: a new mutation cycle always
//! starts from a fresh export of the provider's zone.
//!
//! Record types without a grammar here (CAA, TLSA, ...) survive a round trip
//! untouched but cannot be added or replaced.

mod lexer;
mod rdata;

pub use rdata::{RData, Soa};

use chrono::{NaiveDate, Utc};
use hickory_proto::rr::RecordType;
use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::soa::SerialNumber;
use lexer::{Entry, Token};

/// Fixed first line of every exported zone file
pub const EXPORT_HEADER: &str = "; Zone file generated by zonesync";

const CLASSES: &[&str] = &["IN", "CH", "HS", "CS"];

/// Record set key: fully qualified owner name and numeric type code
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RecordKey {
    /// Lowercase owner name with trailing dot
    pub name: String,
    /// Numeric record type
    pub rtype: u16,
}

impl RecordKey {
    fn new(name: &str, rtype: RecordType) -> Self {
        Self {
            name: name.to_ascii_lowercase(),
            rtype: u16::from(rtype),
        }
    }
}

/// A single resource record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRecord {
    /// Fully qualified owner name
    pub name: String,
    pub ttl: u32,
    pub class: String,
    pub rdata: RData,
}

impl ResourceRecord {
    /// Zone-file line for this record
    pub fn to_line(&self) -> String {
        format!(
            "{}\t{}\t{}\t{}\t{}",
            self.name,
            self.ttl,
            self.class,
            self.rdata.type_name(),
            self.rdata
        )
    }
}

/// Parsed zone file
#[derive(Debug, Clone)]
pub struct ZoneFile {
    origin: String,
    ttl: u32,
    records: BTreeMap<RecordKey, Vec<ResourceRecord>>,
    soa_key: Option<RecordKey>,
}

impl ZoneFile {
    /// Parse zone text for the zone `origin`
    ///
    /// `ttl` is the configured zone TTL; it applies to records without an
    /// explicit TTL until a usable `$TTL` directive says otherwise; a negative
    /// or malformed `$TTL` is ignored. Parsing fails when the text holds no
    /// records at all.
    pub fn parse(text: &str, origin: &str, ttl: u32) -> Result<Self> {
        let origin = fqdn(origin);
        let mut zone = Self {
            origin: origin.clone(),
            ttl,
            records: BTreeMap::new(),
            soa_key: None,
        };

        let mut current_origin = origin;
        let mut default_ttl = ttl;
        let mut last_owner: Option<String> = None;

        for entry in lexer::entries(text)? {
            let first = &entry.tokens[0];
            if !entry.inherits_owner && !first.quoted && first.text.starts_with('$') {
                match first.text.to_ascii_uppercase().as_str() {
                    "$ORIGIN" => {
                        let name = directive_arg(&entry)?;
                        current_origin = fqdn(&rdata::absolute_name(name, &current_origin));
                    }
                    "$TTL" => {
                        let value = directive_arg(&entry)?;
                        match rdata::parse_ttl(value) {
                            Some(parsed) => {
                                default_ttl = parsed;
                                zone.ttl = parsed;
                            }
                            None => warn!(
                                "Ignoring unusable $TTL '{}' on line {}, keeping TTL {}",
                                value, entry.line, default_ttl
                            ),
                        }
                    }
                    other => {
                        return Err(Error::zone_parse(
                            entry.line,
                            format!("unsupported directive {}", other),
                        ));
                    }
                }
                continue;
            }

            let (rtype, record) =
                parse_record(&entry, &current_origin, default_ttl, last_owner.as_deref())?;
            last_owner = Some(record.name.clone());
            zone.insert(rtype, record);
        }

        if zone.records.is_empty() {
            return Err(Error::zone_parse(0, "zone file contains no records"));
        }

        debug!(
            "Parsed zone {} with {} record set(s)",
            zone.origin,
            zone.records.len()
        );
        Ok(zone)
    }

    fn insert(&mut self, rtype: RecordType, record: ResourceRecord) {
        let key = RecordKey::new(&record.name, rtype);
        if rtype == RecordType::SOA {
            self.soa_key = Some(key.clone());
        }
        self.records.entry(key).or_default().push(record);
    }

    /// Zone origin with trailing dot
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Configured zone TTL (0 when unset)
    pub fn ttl(&self) -> u32 {
        self.ttl
    }

    /// Number of record sets
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the model holds no record sets
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Look up a record set by (possibly relative) name and type mnemonic
    pub fn get(&self, name: &str, rtype: &str) -> Option<&[ResourceRecord]> {
        let rtype = rdata::record_type(rtype)?;
        let key = RecordKey::new(&rdata::absolute_name(name, &self.origin), rtype);
        self.records.get(&key).map(Vec::as_slice)
    }

    /// Iterate over all record sets in key order
    pub fn record_sets(&self) -> impl Iterator<Item = (&RecordKey, &[ResourceRecord])> {
        self.records.iter().map(|(key, set)| (key, set.as_slice()))
    }

    /// The SOA data, if the zone has one
    pub fn soa(&self) -> Option<&Soa> {
        let key = self.soa_key.as_ref()?;
        self.records.get(key)?.iter().find_map(|rr| match &rr.rdata {
            RData::Soa(soa) => Some(soa),
            _ => None,
        })
    }

    /// Add a new record set
    ///
    /// `name` is `@`, relative to the origin, or absolute. Fails if a set for
    /// this name and type already exists.
    pub fn add(&mut self, name: &str, rtype: &str, ttl: Option<u32>, values: &[String]) -> Result<()> {
        let (key, set) = self.build_set(name, rtype, ttl, values)?;
        if self.records.contains_key(&key) {
            return Err(Error::RecordSetExists {
                name: key.name,
                rtype: rtype.to_ascii_uppercase(),
            });
        }
        self.records.insert(key, set);
        Ok(())
    }

    /// Replace an existing record set wholesale
    pub fn update(
        &mut self,
        name: &str,
        rtype: &str,
        ttl: Option<u32>,
        values: &[String],
    ) -> Result<()> {
        let (key, set) = self.build_set(name, rtype, ttl, values)?;
        match self.records.get_mut(&key) {
            Some(existing) => {
                *existing = set;
                Ok(())
            }
            None => Err(Error::RecordSetMissing {
                name: key.name,
                rtype: rtype.to_ascii_uppercase(),
            }),
        }
    }

    /// Remove an existing record set
    pub fn delete(&mut self, name: &str, rtype: &str) -> Result<()> {
        let record_type = rdata::record_type(rtype)
            .ok_or_else(|| Error::TypeNotRecognized(rtype.to_string()))?;
        if record_type == RecordType::SOA {
            return Err(Error::invalid_input("the SOA record cannot be deleted"));
        }
        let key = RecordKey::new(&rdata::absolute_name(name, &self.origin), record_type);
        match self.records.remove(&key) {
            Some(_) => Ok(()),
            None => Err(Error::RecordSetMissing {
                name: key.name,
                rtype: rtype.to_ascii_uppercase(),
            }),
        }
    }

    fn build_set(
        &self,
        name: &str,
        rtype: &str,
        ttl: Option<u32>,
        values: &[String],
    ) -> Result<(RecordKey, Vec<ResourceRecord>)> {
        let record_type = rdata::record_type(rtype)
            .filter(|t| rdata::is_mutable(*t))
            .ok_or_else(|| Error::TypeNotRecognized(rtype.to_string()))?;
        if values.is_empty() {
            return Err(Error::invalid_input(format!(
                "no values given for {} {}",
                name, rtype
            )));
        }
        if record_type == RecordType::CNAME && values.len() > 1 {
            return Err(Error::record_data(
                "CNAME",
                values.join(","),
                "a CNAME record set holds exactly one value",
            ));
        }

        let owner = rdata::absolute_name(name, &self.origin).to_ascii_lowercase();
        let ttl = ttl.unwrap_or_else(|| self.effective_ttl());

        let mut set = Vec::with_capacity(values.len());
        for value in values {
            let fields = value_fields(record_type, value)?;
            let rdata = rdata::parse_fields(record_type, &fields, &self.origin)
                .map_err(|reason| Error::record_data(rtype.to_ascii_uppercase(), value, reason))?;
            set.push(ResourceRecord {
                name: owner.clone(),
                ttl,
                class: "IN".to_string(),
                rdata,
            });
        }

        Ok((RecordKey::new(&owner, record_type), set))
    }

    fn effective_ttl(&self) -> u32 {
        if self.ttl > 0 {
            self.ttl
        } else {
            self.soa().map(|soa| soa.minimum).unwrap_or_default()
        }
    }

    /// Serialize the zone, advancing the SOA serial against today's date
    pub fn export(self) -> Result<String> {
        self.export_at(Utc::now().date_naive())
    }

    /// Serialize the zone, advancing the SOA serial against `today`
    pub fn export_at(mut self, today: NaiveDate) -> Result<String> {
        let soa_count: usize = self
            .records
            .iter()
            .filter(|(key, _)| key.rtype == u16::from(RecordType::SOA))
            .map(|(_, set)| set.len())
            .sum();
        let soa_key = match (&self.soa_key, soa_count) {
            (Some(key), 1) => key.clone(),
            _ => {
                return Err(Error::invalid_input(format!(
                    "zone {} must hold exactly one SOA record, found {}",
                    self.origin, soa_count
                )));
            }
        };

        let soa_line = {
            let soa_record = self
                .records
                .get_mut(&soa_key)
                .and_then(|set| set.first_mut())
                .ok_or_else(|| Error::invalid_input("SOA record vanished"))?;
            let RData::Soa(soa) = &mut soa_record.rdata else {
                return Err(Error::invalid_input("SOA key does not hold SOA data"));
            };
            let mut serial = SerialNumber::parse_at(&soa.serial.to_string(), today)?;
            serial.inc_at(today)?;
            debug!("Advancing SOA serial of {}: {} -> {}", self.origin, soa.serial, serial);
            soa.serial = serial.as_u32();
            soa_record.to_line()
        };

        let ttl = self.effective_ttl();

        let mut lines = vec![
            EXPORT_HEADER.to_string(),
            format!("$ORIGIN {}", self.origin),
            format!("$TTL {}", ttl),
            soa_line,
        ];
        for (key, set) in &self.records {
            if *key == soa_key {
                continue;
            }
            lines.extend(set.iter().map(ResourceRecord::to_line));
        }

        let mut text = lines.join("\n");
        text.push('\n');
        Ok(text)
    }
}

fn fqdn(name: &str) -> String {
    let name = name.to_ascii_lowercase();
    if name.ends_with('.') {
        name
    } else {
        format!("{}.", name)
    }
}

fn directive_arg(entry: &Entry) -> Result<&str> {
    entry
        .tokens
        .get(1)
        .map(|t| t.text.as_str())
        .ok_or_else(|| Error::zone_parse(entry.line, "directive without argument"))
}

/// Record-data fields for a reconciler-supplied value
///
/// TXT values without quotes are taken as one character string.
fn value_fields(rtype: RecordType, value: &str) -> Result<Vec<Token>> {
    if rtype == RecordType::TXT && !value.contains('"') {
        return Ok(vec![Token::quoted(value)]);
    }
    lexer::value_tokens(value)
}

fn parse_record(
    entry: &Entry,
    origin: &str,
    default_ttl: u32,
    last_owner: Option<&str>,
) -> Result<(RecordType, ResourceRecord)> {
    let mut tokens = entry.tokens.iter();

    let owner = if entry.inherits_owner {
        last_owner
            .map(str::to_string)
            .ok_or_else(|| Error::zone_parse(entry.line, "record without owner name"))?
    } else {
        let name = tokens
            .next()
            .map(|t| t.text.as_str())
            .unwrap_or_default();
        rdata::absolute_name(name, origin).to_ascii_lowercase()
    };

    let mut ttl = None;
    let mut class = None;
    let (record_type, mnemonic) = loop {
        let token = tokens
            .next()
            .ok_or_else(|| Error::zone_parse(entry.line, "missing record type"))?;
        if token.quoted {
            return Err(Error::zone_parse(entry.line, "unexpected quoted string"));
        }
        if ttl.is_none()
            && let Some(value) = rdata::parse_ttl(&token.text)
        {
            ttl = Some(value);
            continue;
        }
        let upper = token.text.to_ascii_uppercase();
        if class.is_none() && CLASSES.contains(&upper.as_str()) {
            class = Some(upper);
            continue;
        }
        match rdata::record_type(&upper) {
            Some(rtype) => break (rtype, upper),
            None => {
                return Err(Error::zone_parse(
                    entry.line,
                    format!("unknown record type '{}'", token.text),
                ));
            }
        }
    };

    let fields: Vec<Token> = tokens.cloned().collect();
    let rdata = if rdata::has_grammar(record_type) {
        rdata::parse_fields(record_type, &fields, origin)
            .map_err(|reason| Error::zone_parse(entry.line, format!("{} {}", mnemonic, reason)))?
    } else {
        RData::opaque(&mnemonic, &fields)
    };

    Ok((
        record_type,
        ResourceRecord {
            name: owner,
            ttl: ttl.unwrap_or(default_ttl),
            class: class.unwrap_or_else(|| "IN".to_string()),
            rdata,
        },
    ))
}
