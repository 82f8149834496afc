//! Contract Test: Reconciliation Semantics
//!
//! Constraints verified:
//! - An endpoint identical to its record set produces no provider write
//! - Create and update never both target the same record set in one pass
//! - Update or delete without a record set is skipped, not fatal
//! - Invalid configuration prevents construction
//! - Listing converts record sets back into endpoints

mod common;

use common::*;
use std::sync::Arc;
use tokio_test::assert_ok;
use zonesync_core::endpoint::LABELS_PROPERTY;
use zonesync_core::{Changes, Endpoint, Error, Reconciler, SyncMetrics};

fn discrete(provider: &InMemoryProvider) -> Reconciler {
    Reconciler::new(
        Arc::new(provider.clone()),
        config(false, false),
        Arc::new(SyncMetrics::new()),
    )
    .expect("valid config")
}

#[tokio::test]
async fn identical_endpoint_produces_no_write() {
    let alpha = alpha();
    let mut www = rrset(&alpha, "www", "A", Some(300), &["1.1.1.1", "2.2.2.2"]);
    www.labels.insert("project/sub".to_string(), "prefix.value".to_string());
    let provider = InMemoryProvider::new().with_zone(alpha, vec![www], ALPHA_ZONEFILE);
    let reconciler = discrete(&provider);

    let changes = Changes {
        update_new: vec![
            Endpoint::new("www.alpha.com", "A", vec!["2.2.2.2".into(), "1.1.1.1".into()])
                .with_ttl(300)
                .with_provider_specific(LABELS_PROPERTY, "project--slash--sub=prefix.value"),
        ],
        ..Changes::default()
    };
    assert_ok!(reconciler.apply_changes(&changes).await);

    assert_eq!(provider.write_calls(), 0);
}

#[tokio::test]
async fn create_and_update_of_same_record_set_yield_one_change() {
    let provider = alpha_provider();
    let reconciler = discrete(&provider);

    let changes = Changes {
        create: vec![Endpoint::new("www.alpha.com", "A", vec!["3.3.3.3".into()])],
        update_new: vec![Endpoint::new("www.alpha.com", "A", vec!["4.4.4.4".into()])],
        ..Changes::default()
    };
    reconciler.apply_changes(&changes).await.unwrap();

    let writes: Vec<String> = provider
        .calls()
        .into_iter()
        .filter(|c| !c.starts_with("list_"))
        .collect();
    assert_eq!(writes, vec!["set_rrset_records www/A"]);
    assert_eq!(provider.rrsets("1")[0].records, vec!["3.3.3.3".to_string()]);
}

#[tokio::test]
async fn missing_record_sets_are_skipped() {
    let provider = alpha_provider();
    let metrics = Arc::new(SyncMetrics::new());
    let reconciler = Reconciler::new(
        Arc::new(provider.clone()),
        config(false, false),
        Arc::clone(&metrics),
    )
    .unwrap();

    let changes = Changes {
        update_new: vec![Endpoint::new("nope.alpha.com", "A", vec!["1.1.1.1".into()])],
        delete: vec![Endpoint::new("gone.alpha.com", "A", vec!["1.1.1.1".into()])],
        ..Changes::default()
    };
    reconciler.apply_changes(&changes).await.unwrap();

    assert_eq!(provider.write_calls(), 0);
    assert_eq!(metrics.snapshot().skipped, 2);
}

#[tokio::test]
async fn endpoints_outside_known_zones_are_ignored() {
    let provider = alpha_provider();
    let reconciler = discrete(&provider);

    let changes = Changes {
        create: vec![Endpoint::new("www.gamma.com", "A", vec!["1.1.1.1".into()])],
        ..Changes::default()
    };
    reconciler.apply_changes(&changes).await.unwrap();

    assert_eq!(provider.calls(), vec!["list_zones"]);
}

#[tokio::test]
async fn empty_token_fails_construction() {
    let mut config = config(false, false);
    config.provider = zonesync_core::ProviderConfig::hetzner("");
    let result = Reconciler::new(
        Arc::new(alpha_provider()),
        config,
        Arc::new(SyncMetrics::new()),
    );
    assert!(matches!(result, Err(Error::Config(_))));
}

#[tokio::test]
async fn records_lists_endpoints_with_labels() {
    let alpha = alpha();
    let mut apex = rrset(&alpha, "@", "A", Some(600), &["116.202.181.2"]);
    apex.labels.insert("owner/team".to_string(), "dns".to_string());
    let alias = rrset(&alpha, "ftp", "CNAME", None, &["www"]);
    let soa = rrset(&alpha, "@", "SOA", None, &["ns1 hostmaster 1 2 3 4 5"]);
    let provider = InMemoryProvider::new().with_zone(alpha, vec![apex, alias, soa], ALPHA_ZONEFILE);
    let reconciler = discrete(&provider);

    let endpoints = assert_ok!(reconciler.records().await);
    assert_eq!(endpoints.len(), 2);

    assert_eq!(endpoints[0].dns_name, "alpha.com");
    assert_eq!(endpoints[0].record_ttl, Some(600));
    assert_eq!(
        endpoints[0].provider_specific_value(LABELS_PROPERTY),
        Some("owner--slash--team=dns")
    );

    assert_eq!(endpoints[1].dns_name, "ftp.alpha.com");
    assert_eq!(endpoints[1].targets, vec!["www.alpha.com".to_string()]);
}

#[tokio::test]
async fn listed_records_round_trip_without_changes() {
    let provider = alpha_provider();
    let reconciler = discrete(&provider);

    let current = reconciler.records().await.unwrap();
    let changes = Changes {
        update_old: current.clone(),
        update_new: current,
        ..Changes::default()
    };
    reconciler.apply_changes(&changes).await.unwrap();

    assert_eq!(provider.write_calls(), 0);
}
