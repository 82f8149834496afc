//! Name normalization between endpoints and record sets
//!
//! Endpoints carry fully qualified DNS names; record sets carry names
//! relative to their zone, with `@` standing for the apex. [`RecordName`]
//! keeps the three shapes apart so every conversion is an explicit match.

use std::fmt;

/// Apex marker used by record sets
pub const APEX: &str = "@";

/// A record-set owner name relative to a zone
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RecordName {
    /// The zone name itself
    Apex,
    /// A name below the zone, without the zone suffix
    Relative(String),
    /// A name outside the zone, with trailing dot
    Absolute(String),
}

impl RecordName {
    /// Classify a fully qualified name against `zone`
    pub fn from_dns_name(dns_name: &str, zone: &str) -> Self {
        let name = bare(dns_name);
        let zone = bare(zone);
        if name == zone {
            return RecordName::Apex;
        }
        match strip_zone(&name, &zone) {
            Some(relative) => RecordName::Relative(relative.to_string()),
            None => RecordName::Absolute(format!("{}.", name)),
        }
    }

    /// Interpret a record-set name as stored by the provider
    pub fn from_rrset_name(name: &str) -> Self {
        if name == APEX || name.is_empty() {
            RecordName::Apex
        } else if name.ends_with('.') {
            RecordName::Absolute(name.to_ascii_lowercase())
        } else {
            RecordName::Relative(name.to_ascii_lowercase())
        }
    }

    /// Fully qualified form without trailing dot
    pub fn to_dns_name(&self, zone: &str) -> String {
        let zone = bare(zone);
        match self {
            RecordName::Apex => zone,
            RecordName::Relative(name) => format!("{}.{}", name, zone),
            RecordName::Absolute(name) => bare(name),
        }
    }
}

impl fmt::Display for RecordName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordName::Apex => f.write_str(APEX),
            RecordName::Relative(name) | RecordName::Absolute(name) => f.write_str(name),
        }
    }
}

/// Record value as the provider stores it for a desired target
///
/// CNAME targets inside the zone become zone-relative; any other CNAME
/// target gets a trailing dot. Values of other types pass through.
pub fn adjust_target(record_type: &str, target: &str, zone: &str) -> String {
    if !record_type.eq_ignore_ascii_case("CNAME") {
        return target.to_string();
    }
    let name = bare(target);
    match strip_zone(&name, &bare(zone)) {
        Some(relative) => relative.to_string(),
        None => format!("{}.", name),
    }
}

/// Desired-state target for a stored record value, inverse of [`adjust_target`]
pub fn target_from_value(record_type: &str, value: &str, zone: &str) -> String {
    if !record_type.eq_ignore_ascii_case("CNAME") {
        return value.to_string();
    }
    if value == APEX {
        return bare(zone);
    }
    if value.ends_with('.') {
        return bare(value);
    }
    format!("{}.{}", value.to_ascii_lowercase(), bare(zone))
}

/// Whether a stored value and a desired target denote the same record
pub fn value_matches(record_type: &str, value: &str, target: &str, zone: &str) -> bool {
    adjust_target(record_type, target, zone) == value
}

/// Lowercase name without trailing dot
fn bare(name: &str) -> String {
    name.trim_end_matches('.').to_ascii_lowercase()
}

fn strip_zone<'a>(name: &'a str, zone: &str) -> Option<&'a str> {
    name.strip_suffix(zone)
        .and_then(|prefix| prefix.strip_suffix('.'))
        .filter(|prefix| !prefix.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_name_classification() {
        assert_eq!(RecordName::from_dns_name("alpha.com", "alpha.com"), RecordName::Apex);
        assert_eq!(
            RecordName::from_dns_name("www.alpha.com.", "alpha.com"),
            RecordName::Relative("www".to_string())
        );
        assert_eq!(
            RecordName::from_dns_name("a.b.Alpha.com", "alpha.com."),
            RecordName::Relative("a.b".to_string())
        );
        assert_eq!(
            RecordName::from_dns_name("www.notalpha.com", "alpha.com"),
            RecordName::Absolute("www.notalpha.com.".to_string())
        );
    }

    #[test]
    fn test_record_name_display_and_back() {
        assert_eq!(RecordName::Apex.to_string(), "@");
        assert_eq!(RecordName::from_rrset_name("@").to_dns_name("alpha.com"), "alpha.com");
        assert_eq!(
            RecordName::from_rrset_name("ftp").to_dns_name("alpha.com."),
            "ftp.alpha.com"
        );
    }

    #[test]
    fn test_cname_target_in_zone_is_relative() {
        assert_eq!(adjust_target("CNAME", "www.alpha.com", "alpha.com"), "www");
        assert_eq!(adjust_target("CNAME", "www.alpha.com.", "alpha.com"), "www");
    }

    #[test]
    fn test_cname_target_outside_zone_is_absolute() {
        assert_eq!(
            adjust_target("CNAME", "www.beta.com", "alpha.com"),
            "www.beta.com."
        );
        assert_eq!(adjust_target("CNAME", "alpha.com", "alpha.com"), "alpha.com.");
    }

    #[test]
    fn test_other_types_are_untouched() {
        assert_eq!(adjust_target("A", "1.2.3.4", "alpha.com"), "1.2.3.4");
        assert_eq!(adjust_target("TXT", "www.alpha.com", "alpha.com"), "www.alpha.com");
    }

    #[test]
    fn test_target_from_value_inverts_adjustment() {
        assert_eq!(target_from_value("CNAME", "www", "alpha.com"), "www.alpha.com");
        assert_eq!(target_from_value("CNAME", "x.beta.com.", "alpha.com"), "x.beta.com");
        assert!(value_matches("CNAME", "www", "www.alpha.com", "alpha.com"));
        assert!(!value_matches("CNAME", "www.alpha.com.", "www.alpha.com", "alpha.com"));
    }
}
