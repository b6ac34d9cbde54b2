// src/lib.rs
// Public library surface for the binaries and integration tests.

pub mod config;
pub mod error;
pub mod gateway;
pub mod model;
pub mod ranking;
pub mod results;
pub mod run;
pub mod telemetry;
pub mod terms;

// ---- Re-exports for stable public API ----
pub use crate::config::MonitorConfig;
pub use crate::error::{GatewayError, MonitorError};
pub use crate::gateway::{DynGateway, Gateway, HttpGateway, MemoryGateway};
pub use crate::model::{AnalysisResult, Post, ResultId, RunOutcome, Term, TermId};
pub use crate::ranking::{rank_top_posts, segment_summary, SummarySegments};
pub use crate::results::{ResultCard, ResultsBoard};
pub use crate::run::{RunCoordinator, RunState};
pub use crate::terms::TermStore;

use std::sync::Arc;

/// Everything a front end needs, wired to one gateway.
pub struct Monitor {
    pub terms: TermStore,
    pub runs: RunCoordinator,
    pub results: ResultsBoard,
}

impl Monitor {
    pub fn new(gateway: DynGateway, cfg: &MonitorConfig) -> Self {
        tracing::debug!(gateway = gateway.name(), "monitor wired");
        Self {
            terms: TermStore::new(gateway.clone()),
            runs: RunCoordinator::new(gateway.clone()),
            results: ResultsBoard::with_limits(gateway, cfg.top_posts, cfg.preview_lines),
        }
    }

    /// Build against the REST backend described by `cfg`.
    pub fn connect(cfg: &MonitorConfig) -> Result<Self, GatewayError> {
        let http = HttpGateway::new(cfg)?;
        tracing::info!(gateway = http.name(), base_url = http.base_url(), "using http gateway");
        let gateway: DynGateway = Arc::new(http);
        Ok(Self::new(gateway, cfg))
    }
}
