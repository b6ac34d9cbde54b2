//! Demo that walks a term through its lifecycle against the in-memory backend
//! (no network). Set RUST_LOG=x_monitor=debug to watch the gateway traffic.

use std::sync::Arc;

use x_monitor::{telemetry, Monitor, MonitorConfig, MemoryGateway};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    telemetry::init_tracing();

    let gateway = Arc::new(MemoryGateway::new().with_terms(["#AI"]));
    let monitor = Monitor::new(gateway, &MonitorConfig::default());

    monitor.terms.load().await?;
    monitor.terms.create("$ORCL", false).await?;
    if let Err(e) = monitor.terms.create("   ", false).await {
        println!("rejected locally: {e}");
    }

    let orcl = monitor
        .terms
        .terms()
        .into_iter()
        .find(|t| t.keyword == "$ORCL")
        .ok_or_else(|| anyhow::anyhow!("created term missing after reload"))?;
    monitor.terms.set_restrict_following(orcl.id, true).await?;
    let orcl = monitor
        .terms
        .get(orcl.id)
        .ok_or_else(|| anyhow::anyhow!("term vanished after update"))?;

    let out = monitor.runs.run_now(&orcl).await?;
    println!("Summary generated for {}:\n{}", out.keyword, out.summary);

    monitor.results.load().await?;
    for card in monitor.results.cards() {
        println!("#{} {}: {}", card.id, card.term_label, card.preview.join(" / "));
    }

    for t in monitor.terms.terms() {
        println!(
            "{} {} following_only={} active={}",
            t.id, t.keyword, t.restrict_following, t.active
        );
    }

    println!("monitor-demo done");
    Ok(())
}
