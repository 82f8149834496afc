// # DNS Provider Trait
//
// Defines the facade the reconciliation core drives. Implementations wrap a
// provider's REST API; the core only ever sees zones, record sets and zone
// file text.
//
// ## Implementations
//
// - Hetzner Cloud: `zonesync-provider-hetzner` crate
//
// ## Usage
//
// ```rust,ignore
// use zonesync_core::DnsProvider;
//
// async fn dump(provider: &dyn DnsProvider) -> zonesync_core::Result<()> {
//     let (zones, _) = provider.list_zones().await?;
//     for zone in &zones {
//         let (text, _) = provider.export_zonefile(zone).await?;
//         println!("{}", text);
//     }
//     Ok(())
// }
// ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A DNS zone at the provider
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Zone {
    /// Provider identifier
    pub id: String,
    /// Zone name without trailing dot
    pub name: String,
    /// Default TTL of the zone
    pub ttl: u32,
}

/// A record set at the provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RRSet {
    /// Opaque provider identifier
    pub id: String,
    /// Owning zone
    pub zone: Zone,
    /// Zone-relative name, `@` for the apex
    pub name: String,
    /// Record type mnemonic
    pub rtype: String,
    /// Record set TTL; `None` means the zone default applies
    pub ttl: Option<u32>,
    /// Record values
    pub records: Vec<String>,
    /// Provider labels
    pub labels: BTreeMap<String, String>,
}

/// Parameters for creating a record set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RRSetCreateOpts {
    pub name: String,
    pub rtype: String,
    pub ttl: Option<u32>,
    pub records: Vec<String>,
    pub labels: BTreeMap<String, String>,
}

/// Pagination state reported by list calls
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub per_page: u32,
    pub next_page: Option<u32>,
    pub total_entries: Option<u32>,
}

/// Response metadata returned alongside every provider call
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiResponse {
    /// Requests left in the current rate-limit window
    pub rate_limit_remaining: Option<u32>,
    /// Size of the rate-limit window
    pub rate_limit_limit: Option<u32>,
    /// Pagination of the last page fetched, for list calls
    pub pagination: Option<Pagination>,
}

/// Trait for DNS provider facades
///
/// Implementations translate each call into a single provider API round
/// trip (list calls may follow pagination). They must not retry, cache or
/// decide whether a change is needed: the core owns those decisions.
///
/// # Cancellation
///
/// Every call is a future; dropping it abandons the request. Timeouts belong
/// to the implementation's HTTP client.
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// List all zones visible to the credentials
    async fn list_zones(&self) -> Result<(Vec<Zone>, ApiResponse), crate::Error>;

    /// List every record set of a zone
    async fn list_rrsets(&self, zone: &Zone) -> Result<(Vec<RRSet>, ApiResponse), crate::Error>;

    /// Create a record set
    async fn create_rrset(
        &self,
        zone: &Zone,
        opts: &RRSetCreateOpts,
    ) -> Result<(RRSet, ApiResponse), crate::Error>;

    /// Change the TTL of a record set
    async fn change_rrset_ttl(&self, rrset: &RRSet, ttl: u32) -> Result<ApiResponse, crate::Error>;

    /// Replace the values of a record set
    async fn set_rrset_records(
        &self,
        rrset: &RRSet,
        values: &[String],
    ) -> Result<ApiResponse, crate::Error>;

    /// Replace the labels of a record set
    async fn update_rrset_labels(
        &self,
        rrset: &RRSet,
        labels: &BTreeMap<String, String>,
    ) -> Result<ApiResponse, crate::Error>;

    /// Delete a record set
    async fn delete_rrset(&self, rrset: &RRSet) -> Result<ApiResponse, crate::Error>;

    /// Export a zone as master-file text
    async fn export_zonefile(&self, zone: &Zone) -> Result<(String, ApiResponse), crate::Error>;

    /// Replace a zone's contents with master-file text
    async fn import_zonefile(&self, zone: &Zone, zonefile: &str)
    -> Result<ApiResponse, crate::Error>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}

/// Helper trait for constructing DNS providers from configuration
pub trait DnsProviderFactory: Send + Sync {
    /// Create a DnsProvider instance from configuration
    ///
    /// Fails with a configuration error when required settings (such as the
    /// API token) are missing.
    fn create(
        &self,
        config: &crate::config::ProviderConfig,
    ) -> Result<Box<dyn DnsProvider>, crate::Error>;
}
