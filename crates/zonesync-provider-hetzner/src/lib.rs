// # Hetzner Cloud DNS Provider
//
// This crate provides the Hetzner Cloud DNS implementation of the zonesync
// provider facade.
//
// ## Behavior
//
// - One HTTP round trip per facade call (list calls follow pagination)
// - Full error propagation; no retry, no backoff, no caching
// - HTTP timeout configured (30 seconds)
// - Specific error handling for HTTP status codes (401/403, 404, 409, 429, 5xx)
// - Rate-limit headers surfaced through `ApiResponse`
//
// ## Security Requirements
//
// - API token NEVER appears in logs or Debug output
// - Provider construction fails if the token is empty
//
// ## API Reference
//
// Hetzner Cloud API v1 (https://docs.hetzner.cloud/):
// - List zones: GET `/zones`
// - List record sets: GET `/zones/:id/rrsets`
// - Create record set: POST `/zones/:id/rrsets`
// - Change TTL: POST `/zones/:id/rrsets/:name/:type/actions/change_ttl`
// - Set records: POST `/zones/:id/rrsets/:name/:type/actions/set_records`
// - Update labels: PUT `/zones/:id/rrsets/:name/:type`
// - Delete record set: DELETE `/zones/:id/rrsets/:name/:type`
// - Export zone file: GET `/zones/:id/zonefile`
// - Import zone file: POST `/zones/:id/actions/import_zonefile`

use async_trait::async_trait;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use zonesync_core::config::ProviderConfig;
use zonesync_core::traits::{
    ApiResponse, DnsProvider, DnsProviderFactory, Pagination, RRSet, RRSetCreateOpts, Zone,
};
use zonesync_core::{Error, Result};

/// Hetzner Cloud API base URL
pub const HETZNER_API_BASE: &str = "https://api.hetzner.cloud/v1";

/// Default HTTP timeout for API requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

const PER_PAGE: u32 = 100;

const PROVIDER: &str = "hetzner";

/// Hetzner Cloud DNS provider
///
/// Stateless: every call maps onto the API directly. Deciding whether a call
/// is needed belongs to the reconciler.
pub struct HetznerProvider {
    /// ⚠️ NEVER log this value
    api_token: String,

    /// API root without trailing slash
    base_url: String,

    client: reqwest::Client,
}

// Custom Debug implementation that hides the API token
impl std::fmt::Debug for HetznerProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HetznerProvider")
            .field("api_token", &"<REDACTED>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl HetznerProvider {
    /// Create a new Hetzner provider
    ///
    /// `base_url` overrides the public API root. Fails with a configuration
    /// error if the token is empty.
    pub fn new(api_token: impl Into<String>, base_url: Option<String>) -> Result<Self> {
        let api_token = api_token.into();
        if api_token.trim().is_empty() {
            return Err(Error::config("Hetzner API token cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        let base_url = base_url
            .unwrap_or_else(|| HETZNER_API_BASE.to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            api_token,
            base_url,
            client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn rrset_path(rrset: &RRSet) -> String {
        format!("/zones/{}/rrsets/{}/{}", rrset.zone.id, rrset.name, rrset.rtype)
    }

    /// Send a request and map non-success statuses to errors
    async fn send(&self, request: RequestBuilder, context: &str) -> Result<(Response, ApiResponse)> {
        let response = request
            .bearer_auth(&self.api_token)
            .send()
            .await
            .map_err(|e| Error::http(format!("{}: request failed: {}", context, e)))?;

        let meta = ApiResponse {
            rate_limit_remaining: header_u32(&response, "RateLimit-Remaining"),
            rate_limit_limit: header_u32(&response, "RateLimit-Limit"),
            pagination: None,
        };
        if let Some(remaining) = meta.rate_limit_remaining {
            tracing::debug!("{}: {} request(s) left in rate-limit window", context, remaining);
        }

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            return Err(map_status(status, &body, context));
        }
        Ok((response, meta))
    }

    async fn send_json<T: serde::de::DeserializeOwned>(
        &self,
        request: RequestBuilder,
        context: &str,
    ) -> Result<(T, ApiResponse)> {
        let (response, meta) = self.send(request, context).await?;
        let body = response
            .json::<T>()
            .await
            .map_err(|e| Error::provider(PROVIDER, format!("{}: failed to parse response: {}", context, e)))?;
        Ok((body, meta))
    }

    async fn paginate<T, F>(&self, path: &str, context: &str, mut take: F) -> Result<(Vec<T>, ApiResponse)>
    where
        F: FnMut(Page) -> Result<Vec<T>>,
    {
        let mut items = Vec::new();
        let mut page = 1;
        loop {
            let request = self
                .client
                .get(self.url(path))
                .query(&[("page", page), ("per_page", PER_PAGE)]);
            let (body, mut meta): (Page, ApiResponse) = self.send_json(request, context).await?;
            let pagination = body.meta.as_ref().map(|m| m.pagination.clone());
            items.extend(take(body)?);

            match pagination {
                Some(Pagination {
                    next_page: Some(next),
                    ..
                }) if next > page => page = next,
                other => {
                    meta.pagination = other;
                    tracing::debug!("{}: fetched {} item(s)", context, items.len());
                    return Ok((items, meta));
                }
            }
        }
    }
}

/// Map an HTTP error status to a core error
fn map_status(status: StatusCode, body: &str, context: &str) -> Error {
    match status.as_u16() {
        401 | 403 => Error::auth(format!(
            "{}: invalid API token or insufficient permissions. Status: {}",
            context, status
        )),
        404 => Error::not_found(format!("{}: {}", context, body)),
        409 => Error::provider(
            PROVIDER,
            format!("{}: conflict with another change. Status: {}", context, status),
        ),
        429 => Error::rate_limited(format!("{}: rate limit exceeded. Status: {}", context, status)),
        500..=599 => Error::provider(
            PROVIDER,
            format!("{}: server error (transient): {} - {}", context, status, body),
        ),
        _ => Error::provider(PROVIDER, format!("{}: {} - {}", context, status, body)),
    }
}

fn header_u32(response: &Response, name: &str) -> Option<u32> {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}

/// Accept numeric or string identifiers
fn id_string<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Num(u64),
        Str(String),
    }
    Ok(match Id::deserialize(deserializer)? {
        Id::Num(n) => n.to_string(),
        Id::Str(s) => s,
    })
}

#[derive(Debug, Deserialize)]
struct Page {
    #[serde(default)]
    zones: Vec<ApiZone>,
    #[serde(default)]
    rrsets: Vec<ApiRRSet>,
    meta: Option<Meta>,
}

#[derive(Debug, Deserialize)]
struct Meta {
    pagination: Pagination,
}

#[derive(Debug, Deserialize)]
struct ApiZone {
    #[serde(deserialize_with = "id_string")]
    id: String,
    name: String,
    #[serde(default)]
    ttl: u32,
}

impl From<ApiZone> for Zone {
    fn from(zone: ApiZone) -> Self {
        Zone {
            id: zone.id,
            name: zone.name,
            ttl: zone.ttl,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiRRSet {
    #[serde(deserialize_with = "id_string")]
    id: String,
    name: String,
    #[serde(rename = "type")]
    rtype: String,
    ttl: Option<u32>,
    #[serde(default)]
    labels: BTreeMap<String, String>,
    #[serde(default)]
    records: Vec<ApiRecord>,
}

impl ApiRRSet {
    fn into_rrset(self, zone: &Zone) -> RRSet {
        RRSet {
            id: self.id,
            zone: zone.clone(),
            name: self.name,
            rtype: self.rtype,
            ttl: self.ttl,
            records: self.records.into_iter().map(|r| r.value).collect(),
            labels: self.labels,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiRecord {
    value: String,
}

fn api_records(values: &[String]) -> Vec<ApiRecord> {
    values
        .iter()
        .map(|value| ApiRecord {
            value: value.clone(),
        })
        .collect()
}

#[derive(Debug, Serialize)]
struct CreateRRSetRequest<'a> {
    name: &'a str,
    #[serde(rename = "type")]
    rtype: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    ttl: Option<u32>,
    records: Vec<ApiRecord>,
    labels: &'a BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct CreateRRSetResponse {
    rrset: ApiRRSet,
}

#[derive(Debug, Serialize, Deserialize)]
struct ZoneFileBody {
    zonefile: String,
}

#[async_trait]
impl DnsProvider for HetznerProvider {
    async fn list_zones(&self) -> Result<(Vec<Zone>, ApiResponse)> {
        self.paginate("/zones", "list zones", |page| {
            Ok(page.zones.into_iter().map(Zone::from).collect())
        })
        .await
    }

    async fn list_rrsets(&self, zone: &Zone) -> Result<(Vec<RRSet>, ApiResponse)> {
        let path = format!("/zones/{}/rrsets", zone.id);
        let context = format!("list rrsets of {}", zone.name);
        self.paginate(&path, &context, |page| {
            Ok(page.rrsets.into_iter().map(|r| r.into_rrset(zone)).collect())
        })
        .await
    }

    async fn create_rrset(
        &self,
        zone: &Zone,
        opts: &RRSetCreateOpts,
    ) -> Result<(RRSet, ApiResponse)> {
        let body = CreateRRSetRequest {
            name: &opts.name,
            rtype: &opts.rtype,
            ttl: opts.ttl,
            records: api_records(&opts.records),
            labels: &opts.labels,
        };
        let request = self
            .client
            .post(self.url(&format!("/zones/{}/rrsets", zone.id)))
            .json(&body);
        let (created, meta): (CreateRRSetResponse, _) =
            self.send_json(request, "create rrset").await?;
        tracing::debug!("Created rrset {} {} in {}", opts.name, opts.rtype, zone.name);
        Ok((created.rrset.into_rrset(zone), meta))
    }

    async fn change_rrset_ttl(&self, rrset: &RRSet, ttl: u32) -> Result<ApiResponse> {
        let request = self
            .client
            .post(self.url(&format!("{}/actions/change_ttl", Self::rrset_path(rrset))))
            .json(&serde_json::json!({ "ttl": ttl }));
        let (_, meta) = self.send(request, "change rrset ttl").await?;
        Ok(meta)
    }

    async fn set_rrset_records(&self, rrset: &RRSet, values: &[String]) -> Result<ApiResponse> {
        let request = self
            .client
            .post(self.url(&format!("{}/actions/set_records", Self::rrset_path(rrset))))
            .json(&serde_json::json!({ "records": api_records(values) }));
        let (_, meta) = self.send(request, "set rrset records").await?;
        Ok(meta)
    }

    async fn update_rrset_labels(
        &self,
        rrset: &RRSet,
        labels: &BTreeMap<String, String>,
    ) -> Result<ApiResponse> {
        let request = self
            .client
            .put(self.url(&Self::rrset_path(rrset)))
            .json(&serde_json::json!({ "labels": labels }));
        let (_, meta) = self.send(request, "update rrset labels").await?;
        Ok(meta)
    }

    async fn delete_rrset(&self, rrset: &RRSet) -> Result<ApiResponse> {
        let request = self.client.delete(self.url(&Self::rrset_path(rrset)));
        let (_, meta) = self.send(request, "delete rrset").await?;
        Ok(meta)
    }

    async fn export_zonefile(&self, zone: &Zone) -> Result<(String, ApiResponse)> {
        let request = self
            .client
            .get(self.url(&format!("/zones/{}/zonefile", zone.id)));
        let (body, meta): (ZoneFileBody, _) = self.send_json(request, "export zonefile").await?;
        Ok((body.zonefile, meta))
    }

    async fn import_zonefile(&self, zone: &Zone, zonefile: &str) -> Result<ApiResponse> {
        let request = self
            .client
            .post(self.url(&format!("/zones/{}/actions/import_zonefile", zone.id)))
            .json(&ZoneFileBody {
                zonefile: zonefile.to_string(),
            });
        let (_, meta) = self.send(request, "import zonefile").await?;
        tracing::debug!("Imported zone file for {}", zone.name);
        Ok(meta)
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER
    }
}

/// Factory for creating Hetzner providers
pub struct HetznerFactory;

impl DnsProviderFactory for HetznerFactory {
    fn create(&self, config: &ProviderConfig) -> Result<Box<dyn DnsProvider>> {
        match config {
            ProviderConfig::Hetzner {
                api_token,
                base_url,
            } => Ok(Box::new(HetznerProvider::new(
                api_token.clone(),
                base_url.clone(),
            )?)),
            _ => Err(Error::config("Invalid config for Hetzner provider")),
        }
    }
}

/// Register the Hetzner provider with a registry
///
/// # Example
///
/// ```rust
/// use zonesync_core::ProviderRegistry;
///
/// let registry = ProviderRegistry::new();
/// zonesync_provider_hetzner::register(&registry);
/// assert!(registry.has_provider("hetzner"));
/// ```
pub fn register(registry: &zonesync_core::ProviderRegistry) {
    registry.register_provider(PROVIDER, Box::new(HetznerFactory));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factory_creation() {
        let provider = HetznerFactory.create(&ProviderConfig::hetzner("test_token"));
        assert!(provider.is_ok());
    }

    #[test]
    fn test_factory_missing_token() {
        let provider = HetznerFactory.create(&ProviderConfig::hetzner(""));
        assert!(matches!(provider, Err(Error::Config(_))));
    }

    #[test]
    fn test_factory_rejects_foreign_config() {
        let config = ProviderConfig::Custom {
            factory: "other".to_string(),
            config: serde_json::json!({}),
        };
        assert!(HetznerFactory.create(&config).is_err());
    }

    #[test]
    fn test_api_token_not_exposed_in_debug() {
        let provider = HetznerProvider::new("secret_token_12345", None).unwrap();
        let debug_str = format!("{:?}", provider);
        assert!(!debug_str.contains("secret_token"));
        assert!(debug_str.contains("HetznerProvider"));
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let provider =
            HetznerProvider::new("token", Some("http://localhost:8080/v1/".to_string())).unwrap();
        assert_eq!(provider.url("/zones"), "http://localhost:8080/v1/zones");
    }

    #[test]
    fn test_status_mapping() {
        assert!(matches!(
            map_status(StatusCode::UNAUTHORIZED, "", "x"),
            Error::Authentication(_)
        ));
        assert!(matches!(map_status(StatusCode::NOT_FOUND, "", "x"), Error::NotFound(_)));
        assert!(matches!(
            map_status(StatusCode::TOO_MANY_REQUESTS, "", "x"),
            Error::RateLimited(_)
        ));
        assert!(matches!(
            map_status(StatusCode::BAD_GATEWAY, "", "x"),
            Error::Provider { .. }
        ));
    }

    #[test]
    fn test_rrset_deserializes_numeric_zone_ids() {
        let json = r#"{"id": 42, "name": "alpha.com", "ttl": 3600}"#;
        let zone: Zone = serde_json::from_str::<ApiZone>(json).unwrap().into();
        assert_eq!(zone.id, "42");
    }
}
