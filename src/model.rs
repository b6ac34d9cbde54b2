//! Strict domain model. Gateway responses are normalized into these types once
//! (see `gateway::wire`), so nothing downstream re-checks for absent fields.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Label shown when a result has no back-reference to its term.
pub const UNKNOWN_TERM_LABEL: &str = "Unknown Term";

/// Gateway-assigned term identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TermId(pub i64);

impl fmt::Display for TermId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Gateway-assigned result identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultId(pub i64);

impl fmt::Display for ResultId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A keyword, `#hashtag` or `$ticker` being monitored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Term {
    pub id: TermId,
    pub keyword: String,
    pub restrict_following: bool,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

/// Body of a create request. New terms always start active.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTerm {
    pub keyword: String,
    pub restrict_following: bool,
    pub active: bool,
}

impl NewTerm {
    pub fn new(keyword: impl Into<String>, restrict_following: bool) -> Self {
        Self {
            keyword: keyword.into(),
            restrict_following,
            active: true,
        }
    }
}

/// Partial update. Unset fields are not serialized, so the backend never sees
/// (and never overwrites) fields the caller did not change.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restrict_following: Option<bool>,
}

impl TermPatch {
    pub fn active(value: bool) -> Self {
        Self {
            active: Some(value),
            ..Self::default()
        }
    }

    pub fn restrict_following(value: bool) -> Self {
        Self {
            restrict_following: Some(value),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_none() && self.restrict_following.is_none()
    }
}

/// Output of one analysis run for a term.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub id: ResultId,
    pub monitored_term: Option<Term>,
    pub summary: Option<String>,
    pub tweets_raw: Vec<Post>,
    pub created_at: DateTime<Utc>,
}

impl AnalysisResult {
    /// Keyword of the producing term, or a placeholder when the reference is missing.
    pub fn term_label(&self) -> &str {
        self.monitored_term
            .as_ref()
            .map(|t| t.keyword.as_str())
            .unwrap_or(UNKNOWN_TERM_LABEL)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub username: String,
    pub verified: bool,
}

/// Engagement counters. Missing counters are zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicMetrics {
    pub like_count: u64,
    pub retweet_count: u64,
    pub reply_count: u64,
}

/// A single social post referenced by a result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub author: Option<Author>,
    pub text: String,
    pub created_at: Option<DateTime<Utc>>,
    pub public_metrics: Option<PublicMetrics>,
    pub url: String,
}

impl Post {
    /// Likes plus retweets. Replies are displayed but do not count.
    pub fn engagement(&self) -> u64 {
        self.public_metrics
            .map(|m| m.like_count.saturating_add(m.retweet_count))
            .unwrap_or(0)
    }
}

/// Body of a manual-run request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunRequest {
    pub keyword: String,
    pub restrict_following: bool,
}

impl From<&Term> for RunRequest {
    fn from(term: &Term) -> Self {
        Self {
            keyword: term.keyword.clone(),
            restrict_following: term.restrict_following,
        }
    }
}

/// What the backend returns for a manual run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunOutcome {
    pub keyword: String,
    pub summary: String,
    pub tweet_count: u64,
}
