// tests/metrics_gateway.rs
use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusBuilder;
use x_monitor::gateway::memory::{MemoryGateway, Op};
use x_monitor::{RunCoordinator, TermStore};

#[tokio::test]
async fn metrics_exposed_after_gateway_traffic() {
    // Install a local recorder for the test
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .expect("recorder");

    let gw = Arc::new(MemoryGateway::new().with_terms(["#AI"]));
    let store = TermStore::new(gw.clone());
    let runs = RunCoordinator::new(gw.clone());

    store.load().await.unwrap();
    store.create("$ORCL", false).await.unwrap();
    let ai = store.terms().remove(0);
    runs.run_now(&ai).await.unwrap();

    gw.fail(Op::ListTerms);
    let _ = store.load().await;

    // Scrape metrics text and check series presence by substring
    let out = handle.render();
    assert!(out.contains("gateway_requests_total"));
    assert!(out.contains("op=\"list_terms\""));
    assert!(out.contains("gateway_errors_total"));
    assert!(out.contains("gateway_request_ms"));
    assert!(out.contains("term_mutations_total"));
    assert!(out.contains("manual_runs_total"));
}
