// src/gateway/mod.rs
pub mod http;
pub mod memory;
pub mod wire;

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use metrics::{counter, histogram};

use crate::error::GatewayError;
use crate::model::{AnalysisResult, NewTerm, ResultId, RunOutcome, RunRequest, Term, TermId, TermPatch};
use crate::telemetry::ensure_metrics_described;

pub use http::HttpGateway;
pub use memory::MemoryGateway;

pub type GatewayResult<T> = std::result::Result<T, GatewayError>;

/// Backend REST contract consumed by the stores. Implementations return the strict
/// domain model; decoding leniency lives in the adapter (see `wire`).
#[async_trait]
pub trait Gateway: Send + Sync {
    async fn list_terms(&self) -> GatewayResult<Vec<Term>>;
    async fn create_term(&self, term: &NewTerm) -> GatewayResult<Term>;
    async fn update_term(&self, id: TermId, patch: &TermPatch) -> GatewayResult<Term>;
    async fn delete_term(&self, id: TermId) -> GatewayResult<()>;
    async fn list_results(&self) -> GatewayResult<Vec<AnalysisResult>>;
    async fn get_result(&self, id: ResultId) -> GatewayResult<AnalysisResult>;
    async fn manual_run(&self, request: &RunRequest) -> GatewayResult<RunOutcome>;
    /// Adapter name for diagnostics.
    fn name(&self) -> &'static str;
}

/// Convenient alias used by the stores and binaries.
pub type DynGateway = Arc<dyn Gateway>;

/// Await one gateway round trip, recording latency/error metrics under `op`.
pub(crate) async fn instrumented<T, F>(op: &'static str, call: F) -> GatewayResult<T>
where
    F: Future<Output = GatewayResult<T>>,
{
    ensure_metrics_described();

    let t0 = std::time::Instant::now();
    let out = call.await;
    let ms = t0.elapsed().as_secs_f64() * 1_000.0;

    counter!("gateway_requests_total", "op" => op).increment(1);
    histogram!("gateway_request_ms", "op" => op).record(ms);
    if let Err(e) = &out {
        counter!("gateway_errors_total", "op" => op).increment(1);
        tracing::debug!(op, error = %e, "gateway call failed");
    }
    out
}
