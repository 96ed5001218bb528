//! Flattening, skipping and renaming of targets

use std::sync::Arc;
use std::time::Duration;

use tcpingmap::{Endpoint, Orchestrator, ProbeResult, TargetConfig, TargetKey};

use crate::common::{GaugeProber, TableResolver};

fn orchestrator(resolver: TableResolver) -> (Orchestrator, Arc<TableResolver>) {
    let resolver = Arc::new(resolver);
    let prober = Arc::new(GaugeProber::new(Duration::ZERO));
    (Orchestrator::new(resolver.clone(), prober), resolver)
}

#[tokio::test]
async fn test_leaf_without_port_is_excluded() {
    let (orchestrator, _) = orchestrator(TableResolver::new());
    let config = TargetConfig::from_json(
        r#"{"East":{"CityA":{"ISP1":{"ip":"10.0.0.1","port":80},"ISP2":{"ip":"10.0.0.2"}}}}"#,
    )
    .unwrap();

    let targets = orchestrator.resolve_targets(&config).await;
    assert_eq!(targets.len(), 1);
    assert_eq!(targets[0].key, TargetKey::new("East", "CityA", "ISP1"));

    let snapshot = orchestrator.run_cycle(&config).await;
    assert_eq!(snapshot.len(), 1);
    assert!(snapshot.get("East-CityA (ISP2)").is_none());
}

#[tokio::test]
async fn test_leaf_without_ip_is_excluded() {
    let (orchestrator, _) = orchestrator(TableResolver::new());
    let config = TargetConfig::from_json(r#"{"East":{"CityA":{"ISP1":{"port":80}}}}"#).unwrap();

    assert!(orchestrator.resolve_targets(&config).await.is_empty());
}

#[tokio::test]
async fn test_malformed_port_only_drops_its_leaf() {
    let (orchestrator, _) = orchestrator(TableResolver::new());
    let config = TargetConfig::from_json(
        r#"{"East":{"CityA":{
            "ISP1":{"ip":"10.0.0.1","port":80},
            "ISP2":{"ip":"10.0.0.2","port":70000},
            "ISP3":{"ip":"10.0.0.3","port":"eighty"}
        }}}"#,
    )
    .unwrap();

    let snapshot = orchestrator.run_cycle(&config).await;

    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot.get("East-CityA (ISP1)"), Some(&ProbeResult::new(Some(1.0))));
}

#[tokio::test]
async fn test_unresolvable_host_is_skipped() {
    let (orchestrator, resolver) =
        orchestrator(TableResolver::new().with_host("good.example", &["10.0.0.7"]));
    let config = TargetConfig::new()
        .with_target("East", "CityA", "ISP1", Endpoint::new("good.example", 80))
        .with_target("East", "CityA", "ISP2", Endpoint::new("bad.example", 80));

    let snapshot = orchestrator.run_cycle(&config).await;

    assert_eq!(resolver.lookups(), 2);
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot.get("East-CityA (ISP1)"), Some(&ProbeResult::new(Some(7.0))));
}

#[tokio::test]
async fn test_hostname_prefers_ipv4() {
    let (orchestrator, _) = orchestrator(
        TableResolver::new().with_host("dual.example", &["2001:db8::1", "10.0.0.9"]),
    );
    let config =
        TargetConfig::new().with_target("East", "CityA", "ISP1", Endpoint::new("dual.example", 443));

    let targets = orchestrator.resolve_targets(&config).await;

    assert_eq!(targets[0].ip.to_string(), "10.0.0.9");
    assert_eq!(targets[0].port, 443);
}

#[tokio::test]
async fn test_empty_resolution_gives_empty_snapshot() {
    let (orchestrator, _) = orchestrator(TableResolver::new());
    let config =
        TargetConfig::new().with_target("East", "CityA", "ISP1", Endpoint::new("nowhere.example", 80));

    let snapshot = orchestrator.run_cycle(&config).await;

    assert!(snapshot.is_empty());
    assert_eq!(serde_json::to_string(&snapshot).unwrap(), "{}");
}

#[tokio::test]
async fn test_names_with_separator_are_kept_intact() {
    let (orchestrator, _) = orchestrator(TableResolver::new());
    let config = TargetConfig::new()
        .with_target("North-East", "City-A", "ISP", Endpoint::new("10.0.0.4", 80));

    let targets = orchestrator.resolve_targets(&config).await;
    assert_eq!(targets[0].key.region, "North-East");
    assert_eq!(targets[0].key.subregion, "City-A");

    let snapshot = orchestrator.run_cycle(&config).await;
    assert!(snapshot.get("North-East-City-A (ISP)").is_some());
}
