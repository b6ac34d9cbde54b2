// src/gateway/memory.rs
//! In-process backend for tests and local demos. Records every call, can be told to
//! fail specific operations, and can hold manual runs open until released.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};
use parking_lot::Mutex;
use tokio::sync::Notify;

use super::{Gateway, GatewayResult};
use crate::error::GatewayError;
use crate::model::{
    AnalysisResult, NewTerm, ResultId, RunOutcome, RunRequest, Term, TermId, TermPatch,
};

/// Gateway operation, used for call recording and failure injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    ListTerms,
    CreateTerm,
    UpdateTerm,
    DeleteTerm,
    ListResults,
    GetResult,
    ManualRun,
}

/// A recorded request, with the exact payload the caller sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    ListTerms,
    CreateTerm(NewTerm),
    UpdateTerm(TermId, TermPatch),
    DeleteTerm(TermId),
    ListResults,
    GetResult(ResultId),
    ManualRun(RunRequest),
}

impl Call {
    pub fn op(&self) -> Op {
        match self {
            Call::ListTerms => Op::ListTerms,
            Call::CreateTerm(_) => Op::CreateTerm,
            Call::UpdateTerm(..) => Op::UpdateTerm,
            Call::DeleteTerm(_) => Op::DeleteTerm,
            Call::ListResults => Op::ListResults,
            Call::GetResult(_) => Op::GetResult,
            Call::ManualRun(_) => Op::ManualRun,
        }
    }
}

#[derive(Debug, Default)]
struct Backend {
    terms: Vec<Term>,
    results: Vec<AnalysisResult>,
    next_term_id: i64,
    next_result_id: i64,
}

#[derive(Default)]
pub struct MemoryGateway {
    backend: Mutex<Backend>,
    calls: Mutex<Vec<Call>>,
    failing: Mutex<HashSet<Op>>,
    run_gate: Mutex<Option<Arc<Notify>>>,
}

/// Fixed clock so ids and timestamps are reproducible across runs.
fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 9, 6, 8, 0, 0)
        .single()
        .unwrap_or_default()
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed backend-side terms, bypassing call recording.
    pub fn with_terms<I, S>(self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        {
            let mut b = self.backend.lock();
            for kw in keywords {
                b.insert_term(NewTerm::new(kw, false));
            }
        }
        self
    }

    /// Seed a stored result, bypassing call recording.
    pub fn push_result(&self, result: AnalysisResult) {
        let mut b = self.backend.lock();
        b.next_result_id = b.next_result_id.max(result.id.0);
        b.results.push(result);
    }

    /// Make every subsequent call of `op` fail (until `recover`).
    pub fn fail(&self, op: Op) {
        self.failing.lock().insert(op);
    }

    pub fn recover(&self, op: Op) {
        self.failing.lock().remove(&op);
    }

    /// Hold manual runs open until the returned handle is notified.
    pub fn hold_runs(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.run_gate.lock() = Some(gate.clone());
        gate
    }

    pub fn release_runs(&self) {
        let gate = self.run_gate.lock().take();
        if let Some(gate) = gate {
            gate.notify_waiters();
            // a run that recorded itself but has not parked yet picks this up
            gate.notify_one();
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn calls_of(&self, op: Op) -> Vec<Call> {
        self.calls
            .lock()
            .iter()
            .filter(|c| c.op() == op)
            .cloned()
            .collect()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().clear();
    }

    /// Backend-side view, independent of any client store.
    pub fn backend_terms(&self) -> Vec<Term> {
        self.backend.lock().terms.clone()
    }

    /// Rename a term behind the client's back (simulates a concurrent editor).
    pub fn rename_term(&self, id: TermId, keyword: &str) {
        let mut b = self.backend.lock();
        if let Some(t) = b.terms.iter_mut().find(|t| t.id == id) {
            t.keyword = keyword.to_string();
        }
    }

    fn record(&self, call: Call) -> GatewayResult<()> {
        let op = call.op();
        self.calls.lock().push(call);
        if self.failing.lock().contains(&op) {
            return Err(GatewayError::Status {
                status: 500,
                message: format!("simulated {op:?} failure"),
            });
        }
        Ok(())
    }
}

impl Backend {
    fn insert_term(&mut self, new: NewTerm) -> Term {
        self.next_term_id += 1;
        let term = Term {
            id: TermId(self.next_term_id),
            keyword: new.keyword,
            restrict_following: new.restrict_following,
            active: new.active,
            created_at: epoch() + ChronoDuration::minutes(self.next_term_id),
        };
        self.terms.push(term.clone());
        term
    }
}

#[async_trait]
impl Gateway for MemoryGateway {
    async fn list_terms(&self) -> GatewayResult<Vec<Term>> {
        self.record(Call::ListTerms)?;
        Ok(self.backend.lock().terms.clone())
    }

    async fn create_term(&self, term: &NewTerm) -> GatewayResult<Term> {
        self.record(Call::CreateTerm(term.clone()))?;
        Ok(self.backend.lock().insert_term(term.clone()))
    }

    async fn update_term(&self, id: TermId, patch: &TermPatch) -> GatewayResult<Term> {
        self.record(Call::UpdateTerm(id, patch.clone()))?;
        let mut b = self.backend.lock();
        let term = b
            .terms
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| GatewayError::NotFound("Term not found".into()))?;
        if let Some(active) = patch.active {
            term.active = active;
        }
        if let Some(rf) = patch.restrict_following {
            term.restrict_following = rf;
        }
        Ok(term.clone())
    }

    async fn delete_term(&self, id: TermId) -> GatewayResult<()> {
        self.record(Call::DeleteTerm(id))?;
        let mut b = self.backend.lock();
        let before = b.terms.len();
        b.terms.retain(|t| t.id != id);
        if b.terms.len() == before {
            return Err(GatewayError::NotFound("Term not found".into()));
        }
        Ok(())
    }

    async fn list_results(&self) -> GatewayResult<Vec<AnalysisResult>> {
        self.record(Call::ListResults)?;
        // Newest first, like the REST backend.
        let mut out = self.backend.lock().results.clone();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(out)
    }

    async fn get_result(&self, id: ResultId) -> GatewayResult<AnalysisResult> {
        self.record(Call::GetResult(id))?;
        self.backend
            .lock()
            .results
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or_else(|| GatewayError::NotFound("Result not found".into()))
    }

    async fn manual_run(&self, request: &RunRequest) -> GatewayResult<RunOutcome> {
        let gate = self.run_gate.lock().clone();
        self.record(Call::ManualRun(request.clone()))?;
        if let Some(gate) = gate {
            gate.notified().await;
        }
        // Re-check after a hold so tests can fail a run while it is in flight.
        if self.failing.lock().contains(&Op::ManualRun) {
            return Err(GatewayError::Transport("simulated run timeout".into()));
        }

        let mut b = self.backend.lock();
        let summary = format!("Summary for {}:\nNo notable activity.", request.keyword);
        let term = b.terms.iter().find(|t| t.keyword == request.keyword).cloned();
        if let Some(term) = term {
            b.next_result_id += 1;
            let result = AnalysisResult {
                id: ResultId(b.next_result_id),
                monitored_term: Some(term),
                summary: Some(summary.clone()),
                tweets_raw: Vec::new(),
                created_at: epoch() + ChronoDuration::hours(b.next_result_id),
            };
            b.results.push(result);
        }
        Ok(RunOutcome {
            keyword: request.keyword.clone(),
            summary,
            tweet_count: 0,
        })
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
