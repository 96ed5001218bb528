//! Worker pool bounds and failure isolation

use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use tcpingmap::{Endpoint, Orchestrator, ProbeResult, SystemResolver, TargetConfig};

use crate::common::{FlakyProber, GaugeProber, TableResolver};

fn wide_config(count: usize) -> TargetConfig {
    (0..count).fold(TargetConfig::new(), |config, i| {
        let host = format!("10.0.{}.{}", i / 250, i % 250);
        config.with_target("Region", format!("City{i}"), "ISP", Endpoint::new(host, 80))
    })
}

#[tokio::test]
async fn test_no_more_than_fifty_probes_in_flight() {
    let _ = tracing_subscriber::fmt::try_init();

    let prober = Arc::new(GaugeProber::new(Duration::from_millis(20)));
    let orchestrator = Orchestrator::new(Arc::new(SystemResolver::new()), prober.clone());

    let snapshot = orchestrator.run_cycle(&wide_config(120)).await;

    assert_eq!(snapshot.len(), 120);
    assert_eq!(prober.calls(), 120);
    assert!(prober.peak() <= 50, "peak concurrency was {}", prober.peak());
    assert!(prober.peak() > 1, "probes should overlap");
}

#[tokio::test]
async fn test_small_batches_use_one_worker_per_target() {
    let prober = Arc::new(GaugeProber::new(Duration::from_millis(50)));
    let orchestrator = Orchestrator::new(Arc::new(SystemResolver::new()), prober.clone())
        .with_max_workers(50);

    orchestrator.run_cycle(&wide_config(3)).await;

    assert!(prober.peak() <= 3);
}

#[tokio::test]
async fn test_custom_worker_cap() {
    let prober = Arc::new(GaugeProber::new(Duration::from_millis(10)));
    let orchestrator = Orchestrator::new(Arc::new(SystemResolver::new()), prober.clone())
        .with_max_workers(4);

    let snapshot = orchestrator.run_cycle(&wide_config(20)).await;

    assert_eq!(snapshot.len(), 20);
    assert!(prober.peak() <= 4, "peak concurrency was {}", prober.peak());
}

#[tokio::test]
async fn test_panicking_probe_reports_no_data() {
    let poisoned: IpAddr = "10.0.0.2".parse().unwrap();
    let orchestrator = Orchestrator::new(
        Arc::new(TableResolver::new()),
        Arc::new(FlakyProber { poisoned }),
    );
    let config = TargetConfig::new()
        .with_target("East", "CityA", "ISP1", Endpoint::new("10.0.0.1", 80))
        .with_target("East", "CityA", "ISP2", Endpoint::new("10.0.0.2", 80))
        .with_target("East", "CityB", "ISP1", Endpoint::new("10.0.0.3", 80));

    let snapshot = orchestrator.run_cycle(&config).await;

    assert_eq!(snapshot.len(), 3);
    assert_eq!(snapshot.get("East-CityA (ISP2)"), Some(&ProbeResult::no_data()));
    assert_eq!(snapshot.get("East-CityA (ISP1)"), Some(&ProbeResult::new(Some(1.0))));
    assert_eq!(snapshot.get("East-CityB (ISP1)"), Some(&ProbeResult::new(Some(1.0))));
}
