//! HTTP-level tests for the Hetzner provider against a mock API server

use serde_json::json;
use std::collections::BTreeMap;
use wiremock::matchers::{bearer_token, body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};
use zonesync_core::traits::{DnsProvider, RRSet, RRSetCreateOpts, Zone};
use zonesync_core::Error;
use zonesync_provider_hetzner::HetznerProvider;

fn provider(server: &MockServer) -> HetznerProvider {
    HetznerProvider::new("test-token", Some(server.uri())).unwrap()
}

fn alpha() -> Zone {
    Zone {
        id: "42".to_string(),
        name: "alpha.com".to_string(),
        ttl: 3600,
    }
}

fn www() -> RRSet {
    RRSet {
        id: "www/A".to_string(),
        zone: alpha(),
        name: "www".to_string(),
        rtype: "A".to_string(),
        ttl: None,
        records: vec!["1.1.1.1".to_string()],
        labels: BTreeMap::new(),
    }
}

fn page_meta(page: u32, next: Option<u32>) -> serde_json::Value {
    json!({
        "pagination": {
            "page": page,
            "per_page": 100,
            "previous_page": null,
            "next_page": next,
            "last_page": 2,
            "total_entries": 2
        }
    })
}

#[tokio::test]
async fn list_zones_follows_pagination() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/zones"))
        .and(query_param("page", "1"))
        .and(bearer_token("test-token"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("RateLimit-Remaining", "3599")
                .set_body_json(json!({
                    "zones": [{"id": 42, "name": "alpha.com", "ttl": 3600}],
                    "meta": page_meta(1, Some(2))
                })),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/zones"))
        .and(query_param("page", "2"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("RateLimit-Remaining", "3598")
                .insert_header("RateLimit-Limit", "3600")
                .set_body_json(json!({
                    "zones": [{"id": 43, "name": "beta.com", "ttl": 300}],
                    "meta": page_meta(2, None)
                })),
        )
        .mount(&server)
        .await;

    let (zones, response) = provider(&server).list_zones().await.unwrap();

    assert_eq!(zones.len(), 2);
    assert_eq!(zones[0].id, "42");
    assert_eq!(zones[1].name, "beta.com");
    assert_eq!(response.rate_limit_remaining, Some(3598));
    assert_eq!(response.rate_limit_limit, Some(3600));
    assert_eq!(response.pagination.unwrap().page, 2);
}

#[tokio::test]
async fn list_rrsets_flattens_record_values() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/zones/42/rrsets"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "rrsets": [{
                "id": "www/A",
                "name": "www",
                "type": "A",
                "ttl": null,
                "labels": {"env": "prod"},
                "records": [{"value": "1.1.1.1", "comment": ""}, {"value": "2.2.2.2"}],
                "zone": 42
            }],
            "meta": page_meta(1, None)
        })))
        .mount(&server)
        .await;

    let (rrsets, _) = provider(&server).list_rrsets(&alpha()).await.unwrap();

    assert_eq!(rrsets.len(), 1);
    assert_eq!(rrsets[0].records, vec!["1.1.1.1".to_string(), "2.2.2.2".to_string()]);
    assert_eq!(rrsets[0].ttl, None);
    assert_eq!(rrsets[0].labels.get("env").map(String::as_str), Some("prod"));
    assert_eq!(rrsets[0].zone, alpha());
}

#[tokio::test]
async fn create_rrset_posts_records() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/zones/42/rrsets"))
        .and(body_json(json!({
            "name": "ftp",
            "type": "A",
            "ttl": 7200,
            "records": [{"value": "116.202.181.1"}],
            "labels": {}
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "rrset": {
                "id": "ftp/A",
                "name": "ftp",
                "type": "A",
                "ttl": 7200,
                "labels": {},
                "records": [{"value": "116.202.181.1"}]
            },
            "action": {"id": 1, "status": "running"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let opts = RRSetCreateOpts {
        name: "ftp".to_string(),
        rtype: "A".to_string(),
        ttl: Some(7200),
        records: vec!["116.202.181.1".to_string()],
        labels: BTreeMap::new(),
    };
    let (rrset, _) = provider(&server).create_rrset(&alpha(), &opts).await.unwrap();
    assert_eq!(rrset.id, "ftp/A");
    assert_eq!(rrset.ttl, Some(7200));
}

#[tokio::test]
async fn rrset_actions_hit_their_endpoints() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/zones/42/rrsets/www/A/actions/set_records"))
        .and(body_json(json!({"records": [{"value": "9.9.9.9"}]})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"action": {"id": 1}})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/zones/42/rrsets/www/A/actions/change_ttl"))
        .and(body_json(json!({"ttl": 60})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"action": {"id": 2}})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/zones/42/rrsets/www/A"))
        .and(body_json(json!({"labels": {"env": "prod"}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"rrset": {}})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/zones/42/rrsets/www/A"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"action": {"id": 3}})))
        .expect(1)
        .mount(&server)
        .await;

    let provider = provider(&server);
    let rrset = www();
    provider
        .set_rrset_records(&rrset, &["9.9.9.9".to_string()])
        .await
        .unwrap();
    provider.change_rrset_ttl(&rrset, 60).await.unwrap();
    let labels = BTreeMap::from([("env".to_string(), "prod".to_string())]);
    provider.update_rrset_labels(&rrset, &labels).await.unwrap();
    provider.delete_rrset(&rrset).await.unwrap();
}

#[tokio::test]
async fn zonefile_export_and_import() {
    let server = MockServer::start().await;
    let text = "$ORIGIN alpha.com.\n@ IN SOA ns1 hostmaster 2024010100 1 1 1 1\n";
    Mock::given(method("GET"))
        .and(path("/zones/42/zonefile"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"zonefile": text})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/zones/42/actions/import_zonefile"))
        .and(body_json(json!({"zonefile": text})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"action": {"id": 4}})))
        .expect(1)
        .mount(&server)
        .await;

    let provider = provider(&server);
    let (exported, _) = provider.export_zonefile(&alpha()).await.unwrap();
    assert_eq!(exported, text);
    provider.import_zonefile(&alpha(), &exported).await.unwrap();
}

#[tokio::test]
async fn error_statuses_are_mapped() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/zones"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/zones/42/zonefile"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/zones/42/rrsets/www/A"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let provider = provider(&server);
    assert!(matches!(
        provider.list_zones().await,
        Err(Error::Authentication(_))
    ));
    assert!(matches!(
        provider.export_zonefile(&alpha()).await,
        Err(Error::RateLimited(_))
    ));
    match provider.delete_rrset(&www()).await {
        Err(Error::Provider { message, .. }) => assert!(message.contains("maintenance")),
        other => panic!("unexpected result: {:?}", other),
    }
}
