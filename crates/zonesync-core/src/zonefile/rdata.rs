//! Typed record data
//!
//! Only the record types the reconciler writes get a real grammar. Anything
//! else read from a zone file is carried as [`RData::Opaque`] text and written
//! back exactly as it was tokenized.

use hickory_proto::rr::RecordType;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

use super::lexer::Token;

/// Start-of-authority data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Soa {
    /// Primary name server
    pub mname: String,
    /// Maintainer mailbox
    pub rname: String,
    /// Zone serial number
    pub serial: u32,
    pub refresh: u32,
    pub retry: u32,
    pub expire: u32,
    /// Minimum (negative caching) TTL
    pub minimum: u32,
}

/// Record data of a single resource record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RData {
    A(Ipv4Addr),
    Aaaa(Ipv6Addr),
    Cname(String),
    Ns(String),
    Mx {
        preference: u16,
        exchange: String,
    },
    Srv {
        priority: u16,
        weight: u16,
        port: u16,
        target: String,
    },
    /// Character strings, escapes kept verbatim
    Txt(Vec<String>),
    Soa(Soa),
    /// A type without a grammar here, preserved as written
    Opaque {
        /// Type mnemonic as it appeared in the source
        rtype: String,
        text: String,
    },
}

impl RData {
    /// Type mnemonic for serialization
    pub fn type_name(&self) -> &str {
        match self {
            RData::A(_) => "A",
            RData::Aaaa(_) => "AAAA",
            RData::Cname(_) => "CNAME",
            RData::Ns(_) => "NS",
            RData::Mx { .. } => "MX",
            RData::Srv { .. } => "SRV",
            RData::Txt(_) => "TXT",
            RData::Soa(_) => "SOA",
            RData::Opaque { rtype, .. } => rtype,
        }
    }

    pub(crate) fn opaque(rtype: &str, fields: &[Token]) -> Self {
        RData::Opaque {
            rtype: rtype.to_string(),
            text: fields
                .iter()
                .map(Token::render)
                .collect::<Vec<_>>()
                .join(" "),
        }
    }
}

impl fmt::Display for RData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RData::A(addr) => write!(f, "{}", addr),
            RData::Aaaa(addr) => write!(f, "{}", addr),
            RData::Cname(target) | RData::Ns(target) => write!(f, "{}", target),
            RData::Mx {
                preference,
                exchange,
            } => write!(f, "{} {}", preference, exchange),
            RData::Srv {
                priority,
                weight,
                port,
                target,
            } => write!(f, "{} {} {} {}", priority, weight, port, target),
            RData::Txt(strings) => {
                let quoted: Vec<String> = strings.iter().map(|s| format!("\"{}\"", s)).collect();
                write!(f, "{}", quoted.join(" "))
            }
            RData::Soa(soa) => write!(
                f,
                "{} {} {} {} {} {} {}",
                soa.mname, soa.rname, soa.serial, soa.refresh, soa.retry, soa.expire, soa.minimum
            ),
            RData::Opaque { text, .. } => write!(f, "{}", text),
        }
    }
}

/// Resolve a type mnemonic, including the generic `TYPEnnn` form
pub(crate) fn record_type(mnemonic: &str) -> Option<RecordType> {
    let upper = mnemonic.to_ascii_uppercase();
    if let Some(code) = upper.strip_prefix("TYPE") {
        return code.parse::<u16>().ok().map(RecordType::from);
    }
    RecordType::from_str(&upper).ok()
}

/// Types the zone model can build from reconciler input
pub(crate) fn is_mutable(rtype: RecordType) -> bool {
    matches!(
        rtype,
        RecordType::A
            | RecordType::AAAA
            | RecordType::CNAME
            | RecordType::NS
            | RecordType::MX
            | RecordType::SRV
            | RecordType::TXT
    )
}

/// Types parsed into structured data when read from a zone file
pub(crate) fn has_grammar(rtype: RecordType) -> bool {
    is_mutable(rtype) || rtype == RecordType::SOA
}

/// Expand a possibly relative domain name against `origin`
pub(crate) fn absolute_name(name: &str, origin: &str) -> String {
    if name == "@" {
        origin.to_string()
    } else if name.ends_with('.') {
        name.to_string()
    } else {
        format!("{}.{}", name, origin)
    }
}

/// Parse the record-data fields of a type with a grammar
///
/// The error is a bare reason; callers attach line numbers or values.
pub(crate) fn parse_fields(
    rtype: RecordType,
    fields: &[Token],
    origin: &str,
) -> Result<RData, String> {
    match rtype {
        RecordType::A => match parse_address(single(fields)?)? {
            IpAddr::V4(addr) => Ok(RData::A(addr)),
            IpAddr::V6(_) => Err("IPv6 address given for an A record".to_string()),
        },
        RecordType::AAAA => match parse_address(single(fields)?)? {
            IpAddr::V6(addr) => Ok(RData::Aaaa(addr)),
            IpAddr::V4(_) => Err("IPv4 address given for an AAAA record".to_string()),
        },
        RecordType::CNAME => Ok(RData::Cname(absolute_name(single(fields)?, origin))),
        RecordType::NS => Ok(RData::Ns(absolute_name(single(fields)?, origin))),
        RecordType::MX => {
            let [preference, exchange] = exact::<2>(fields)?;
            Ok(RData::Mx {
                preference: number(preference, "preference")?,
                exchange: absolute_name(exchange, origin),
            })
        }
        RecordType::SRV => {
            let [priority, weight, port, target] = exact::<4>(fields)?;
            Ok(RData::Srv {
                priority: number(priority, "priority")?,
                weight: number(weight, "weight")?,
                port: number(port, "port")?,
                target: absolute_name(target, origin),
            })
        }
        RecordType::TXT => {
            if fields.is_empty() {
                return Err("expected at least one character string".to_string());
            }
            Ok(RData::Txt(fields.iter().map(|t| t.text.clone()).collect()))
        }
        RecordType::SOA => {
            let [mname, rname, serial, refresh, retry, expire, minimum] = exact::<7>(fields)?;
            Ok(RData::Soa(Soa {
                mname: absolute_name(mname, origin),
                rname: absolute_name(rname, origin),
                serial: number(serial, "serial")?,
                refresh: duration(refresh, "refresh")?,
                retry: duration(retry, "retry")?,
                expire: duration(expire, "expire")?,
                minimum: duration(minimum, "minimum")?,
            }))
        }
        other => Err(format!("no grammar for type {}", other)),
    }
}

/// Parse a TTL, accepting BIND unit suffixes (`1h30m`, `2d`, `1w`)
pub(crate) fn parse_ttl(text: &str) -> Option<u32> {
    if text.is_empty() || !text.as_bytes()[0].is_ascii_digit() {
        return None;
    }
    if let Ok(seconds) = text.parse::<u32>() {
        return Some(seconds);
    }

    let mut total: u64 = 0;
    let mut digits = String::new();
    for c in text.chars() {
        if c.is_ascii_digit() {
            digits.push(c);
            continue;
        }
        let unit: u64 = match c.to_ascii_lowercase() {
            's' => 1,
            'm' => 60,
            'h' => 3_600,
            'd' => 86_400,
            'w' => 604_800,
            _ => return None,
        };
        let amount: u64 = digits.parse().ok()?;
        total = total.checked_add(amount.checked_mul(unit)?)?;
        digits.clear();
    }
    if !digits.is_empty() {
        total = total.checked_add(digits.parse().ok()?)?;
    }
    u32::try_from(total).ok()
}

fn single(fields: &[Token]) -> Result<&str, String> {
    let [value] = exact::<1>(fields)?;
    Ok(value)
}

fn exact<const N: usize>(fields: &[Token]) -> Result<[&str; N], String> {
    if fields.len() != N {
        return Err(format!("expected {} field(s), found {}", N, fields.len()));
    }
    Ok(std::array::from_fn(|i| fields[i].text.as_str()))
}

fn parse_address(text: &str) -> Result<IpAddr, String> {
    text.parse::<IpAddr>()
        .map_err(|_| format!("'{}' is not an IP address", text))
}

fn number<T: FromStr>(text: &str, field: &str) -> Result<T, String> {
    text.parse::<T>()
        .map_err(|_| format!("{} '{}' is not a valid number", field, text))
}

fn duration(text: &str, field: &str) -> Result<u32, String> {
    parse_ttl(text).ok_or_else(|| format!("{} '{}' is not a valid duration", field, text))
}
