//! # Results board
//! Fetched analysis results plus the display state around them: which single card is
//! expanded, and the summary segmentation cached per result.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{MonitorError, Result};
use crate::gateway::{instrumented, DynGateway};
use crate::model::{AnalysisResult, Post, ResultId};
use crate::ranking::{rank_top_posts, segment_summary, SummarySegments};
use crate::ranking::{DEFAULT_PREVIEW_LINES, DEFAULT_TOP_POSTS};

/// Display-ready view of one result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultCard {
    pub id: ResultId,
    pub term_label: String,
    pub created_at: DateTime<Utc>,
    pub expanded: bool,
    pub preview: Vec<String>,
    /// Remaining summary lines; empty while collapsed.
    pub rest: Vec<String>,
    /// Top posts by engagement; empty while collapsed.
    pub top_posts: Vec<Post>,
    /// Expanding would reveal more summary lines or posts.
    pub has_more: bool,
}

#[derive(Default)]
struct BoardState {
    results: Vec<AnalysisResult>,
    expanded: Option<ResultId>,
    segments: HashMap<ResultId, Arc<SummarySegments>>,
}

pub struct ResultsBoard {
    gateway: DynGateway,
    state: Mutex<BoardState>,
    top_posts: usize,
    preview_lines: usize,
}

impl ResultsBoard {
    pub fn new(gateway: DynGateway) -> Self {
        Self::with_limits(gateway, DEFAULT_TOP_POSTS, DEFAULT_PREVIEW_LINES)
    }

    pub fn with_limits(gateway: DynGateway, top_posts: usize, preview_lines: usize) -> Self {
        Self {
            gateway,
            state: Mutex::new(BoardState::default()),
            top_posts,
            preview_lines,
        }
    }

    /// Fetch all results (newest first, as the backend orders them).
    /// On failure the previous list stays in place.
    pub async fn load(&self) -> Result<()> {
        let fresh = instrumented("list_results", self.gateway.list_results())
            .await
            .map_err(|source| {
                warn!(error = %source, "loading results failed");
                MonitorError::Fetch {
                    what: "results",
                    source,
                }
            })?;
        debug!(count = fresh.len(), "results loaded");

        let mut st = self.state.lock();
        st.segments.clear();
        if let Some(id) = st.expanded {
            if !fresh.iter().any(|r| r.id == id) {
                st.expanded = None;
            }
        }
        st.results = fresh;
        Ok(())
    }

    /// Fetch a single result and upsert it into the list.
    pub async fn fetch(&self, id: ResultId) -> Result<AnalysisResult> {
        let result = instrumented("get_result", self.gateway.get_result(id))
            .await
            .map_err(|source| {
                warn!(result_id = %id, error = %source, "loading result failed");
                MonitorError::Fetch {
                    what: "result",
                    source,
                }
            })?;

        let mut st = self.state.lock();
        st.segments.remove(&id);
        match st.results.iter_mut().find(|r| r.id == id) {
            Some(slot) => *slot = result.clone(),
            None => st.results.push(result.clone()),
        }
        Ok(result)
    }

    pub fn results(&self) -> Vec<AnalysisResult> {
        self.state.lock().results.clone()
    }

    pub fn get(&self, id: ResultId) -> Option<AnalysisResult> {
        self.state.lock().results.iter().find(|r| r.id == id).cloned()
    }

    pub fn is_expanded(&self, id: ResultId) -> bool {
        self.state.lock().expanded == Some(id)
    }

    /// Expand `id` (collapsing any other card), or collapse it if already expanded.
    /// Returns whether `id` is expanded afterwards.
    pub fn toggle_expanded(&self, id: ResultId) -> bool {
        let mut st = self.state.lock();
        st.expanded = if st.expanded == Some(id) { None } else { Some(id) };
        st.expanded.is_some()
    }

    /// Segmented summary, computed once per result until the next load/fetch.
    pub fn segments(&self, id: ResultId) -> Option<Arc<SummarySegments>> {
        let mut st = self.state.lock();
        if let Some(seg) = st.segments.get(&id) {
            return Some(seg.clone());
        }
        let result = st.results.iter().find(|r| r.id == id)?;
        let seg = Arc::new(segment_summary(result.summary.as_deref(), self.preview_lines));
        st.segments.insert(id, seg.clone());
        Some(seg)
    }

    /// Top posts for a result, regardless of its expanded state.
    pub fn top_posts(&self, id: ResultId) -> Vec<Post> {
        let st = self.state.lock();
        st.results
            .iter()
            .find(|r| r.id == id)
            .map(|r| {
                rank_top_posts(&r.tweets_raw, self.top_posts)
                    .into_iter()
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn card(&self, id: ResultId) -> Option<ResultCard> {
        let segments = self.segments(id)?;
        let result = self.get(id)?;
        let expanded = self.is_expanded(id);

        let (rest, top_posts) = if expanded {
            (segments.rest.clone(), self.top_posts(id))
        } else {
            (Vec::new(), Vec::new())
        };

        Some(ResultCard {
            id,
            term_label: result.term_label().to_string(),
            created_at: result.created_at,
            expanded,
            preview: segments.preview.clone(),
            rest,
            top_posts,
            has_more: segments.has_more() || !result.tweets_raw.is_empty(),
        })
    }

    /// Cards for every loaded result, in list order.
    pub fn cards(&self) -> Vec<ResultCard> {
        let ids: Vec<ResultId> = self.state.lock().results.iter().map(|r| r.id).collect();
        ids.into_iter().filter_map(|id| self.card(id)).collect()
    }
}
