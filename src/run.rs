//! # Manual runs
//! Drives one on-demand analysis run at a time.
//!
//! State machine: `Idle -> Running(term) -> Idle`. A second request while a run is in
//! flight is rejected with `Busy`, never queued. The return to `Idle` happens in a
//! drop guard, so it also holds when the gateway fails or the caller drops the future.

use metrics::counter;
use parking_lot::Mutex;
use tracing::{info, warn};

use crate::error::{MonitorError, Result};
use crate::gateway::{instrumented, DynGateway};
use crate::model::{RunOutcome, RunRequest, Term, TermId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunState {
    #[default]
    Idle,
    Running(TermId),
}

pub struct RunCoordinator {
    gateway: DynGateway,
    state: Mutex<RunState>,
}

/// Resets the coordinator to `Idle` when the run settles, whatever the outcome.
struct RunningGuard<'a> {
    state: &'a Mutex<RunState>,
}

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        *self.state.lock() = RunState::Idle;
    }
}

impl RunCoordinator {
    pub fn new(gateway: DynGateway) -> Self {
        Self {
            gateway,
            state: Mutex::new(RunState::Idle),
        }
    }

    pub fn state(&self) -> RunState {
        *self.state.lock()
    }

    /// Term whose run is in flight, if any.
    pub fn current(&self) -> Option<TermId> {
        match self.state() {
            RunState::Idle => None,
            RunState::Running(id) => Some(id),
        }
    }

    pub fn is_running(&self, id: TermId) -> bool {
        self.state() == RunState::Running(id)
    }

    /// Request a manual run for `term` and wait for its summary.
    pub async fn run_now(&self, term: &Term) -> Result<RunOutcome> {
        let _guard = self.begin(term.id)?;
        let request = RunRequest::from(term);
        info!(term_id = %term.id, keyword = %term.keyword, "manual run started");

        match instrumented("manual_run", self.gateway.manual_run(&request)).await {
            Ok(outcome) => {
                counter!("manual_runs_total", "outcome" => "ok").increment(1);
                info!(
                    term_id = %term.id,
                    tweet_count = outcome.tweet_count,
                    "manual run finished"
                );
                Ok(outcome)
            }
            Err(source) => {
                counter!("manual_runs_total", "outcome" => "error").increment(1);
                warn!(term_id = %term.id, keyword = %term.keyword, error = %source, "manual run failed");
                Err(MonitorError::Run {
                    keyword: term.keyword.clone(),
                    source,
                })
            }
        }
    }

    fn begin(&self, id: TermId) -> Result<RunningGuard<'_>> {
        let mut state = self.state.lock();
        if let RunState::Running(running) = *state {
            counter!("manual_runs_busy_total").increment(1);
            warn!(requested = %id, running = %running, "manual run rejected: busy");
            return Err(MonitorError::Busy { running });
        }
        *state = RunState::Running(id);
        Ok(RunningGuard { state: &self.state })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::memory::{MemoryGateway, Op};
    use chrono::Utc;
    use std::sync::Arc;

    fn term(id: i64, kw: &str) -> Term {
        Term {
            id: TermId(id),
            keyword: kw.into(),
            restrict_following: false,
            active: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn starts_idle() {
        let c = RunCoordinator::new(Arc::new(MemoryGateway::new()));
        assert_eq!(c.state(), RunState::Idle);
        assert_eq!(c.current(), None);
        assert!(!c.is_running(TermId(1)));
    }

    #[tokio::test]
    async fn dropped_run_future_still_returns_to_idle() {
        let gw = Arc::new(MemoryGateway::new());
        let _gate = gw.hold_runs();
        let c = RunCoordinator::new(gw.clone());
        let t = term(1, "#AI");

        {
            let fut = c.run_now(&t);
            tokio::pin!(fut);
            // First poll registers the run and parks on the held gateway call.
            let polled = futures_poll_once(fut.as_mut()).await;
            assert!(polled.is_none());
            assert!(c.is_running(t.id));
        }
        assert_eq!(c.state(), RunState::Idle);
        assert_eq!(gw.calls_of(Op::ManualRun).len(), 1);
    }

    async fn futures_poll_once<F: std::future::Future + Unpin>(fut: F) -> Option<F::Output> {
        tokio::select! {
            biased;
            out = fut => Some(out),
            _ = std::future::ready(()) => None,
        }
    }
}
