// src/gateway/wire.rs
//! Lenient wire shapes for the REST backend and their normalization into the strict
//! model. Every optional/duck-typed field gets its default here and nowhere else.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use crate::error::GatewayError;
use crate::model::{
    AnalysisResult, Author, Post, PublicMetrics, ResultId, RunOutcome, Term, TermId,
};

#[derive(Debug, Deserialize)]
struct WireTerm {
    id: i64,
    keyword: String,
    #[serde(default)]
    restrict_following: Option<bool>,
    #[serde(default)]
    active: Option<bool>,
    #[serde(default)]
    created_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireResult {
    id: i64,
    #[serde(default)]
    monitored_term: Option<WireTerm>,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    tweets_raw: Option<Value>,
    #[serde(default)]
    created_at: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WireId {
    Number(serde_json::Number),
    Text(String),
}

#[derive(Debug, Deserialize)]
struct WirePost {
    id: WireId,
    #[serde(default)]
    author: Option<WireAuthor>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    created_at: Option<String>,
    #[serde(default)]
    public_metrics: Option<WireMetrics>,
    #[serde(default)]
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireAuthor {
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    verified: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct WireMetrics {
    #[serde(default)]
    like_count: Option<u64>,
    #[serde(default)]
    retweet_count: Option<u64>,
    #[serde(default)]
    reply_count: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct WireRunResponse {
    summary: Option<String>,
    #[serde(default)]
    tweet_count: Option<u64>,
    #[serde(default)]
    keyword: Option<String>,
}

/// Parse RFC 3339, falling back to a naive ISO timestamp interpreted as UTC
/// (the backend stores timezone-less datetimes).
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

fn required_timestamp(raw: Option<&str>, what: &str) -> Result<DateTime<Utc>, GatewayError> {
    let raw = raw.ok_or_else(|| GatewayError::Decode(format!("{what}: missing created_at")))?;
    parse_timestamp(raw)
        .ok_or_else(|| GatewayError::Decode(format!("{what}: bad created_at '{raw}'")))
}

impl WireTerm {
    fn into_term(self) -> Result<Term, GatewayError> {
        let created_at =
            required_timestamp(self.created_at.as_deref(), &format!("term {}", self.id))?;
        Ok(Term {
            id: TermId(self.id),
            keyword: self.keyword,
            restrict_following: self.restrict_following.unwrap_or(false),
            active: self.active.unwrap_or(true),
            created_at,
        })
    }
}

impl WireResult {
    fn into_result(self) -> Result<AnalysisResult, GatewayError> {
        let created_at =
            required_timestamp(self.created_at.as_deref(), &format!("result {}", self.id))?;

        // The term reference is lookup-only; a malformed one degrades to "unknown".
        let monitored_term = self.monitored_term.and_then(|t| match t.into_term() {
            Ok(term) => Some(term),
            Err(e) => {
                tracing::debug!(result_id = self.id, error = %e, "dropping bad term reference");
                None
            }
        });

        Ok(AnalysisResult {
            id: ResultId(self.id),
            monitored_term,
            summary: self.summary,
            tweets_raw: self.tweets_raw.as_ref().map(normalize_posts).unwrap_or_default(),
            created_at,
        })
    }
}

impl WirePost {
    fn into_post(self) -> Post {
        let id = match self.id {
            WireId::Number(n) => n.to_string(),
            WireId::Text(s) => s,
        };
        let author = self.author.and_then(|a| {
            a.username.map(|username| Author {
                username,
                verified: a.verified.unwrap_or(false),
            })
        });
        let public_metrics = self.public_metrics.map(|m| PublicMetrics {
            like_count: m.like_count.unwrap_or(0),
            retweet_count: m.retweet_count.unwrap_or(0),
            reply_count: m.reply_count.unwrap_or(0),
        });
        let url = self
            .url
            .filter(|u| !u.trim().is_empty())
            .unwrap_or_else(|| format!("https://twitter.com/i/status/{id}"));

        Post {
            author,
            text: self.text.unwrap_or_default(),
            created_at: self.created_at.as_deref().and_then(parse_timestamp),
            public_metrics,
            url,
            id,
        }
    }
}

/// Normalize a raw `tweets_raw` payload. Anything that is not an array yields no
/// posts; array elements that are not post-shaped are skipped.
pub fn normalize_posts(raw: &Value) -> Vec<Post> {
    let Some(items) = raw.as_array() else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| match WirePost::deserialize(item) {
            Ok(p) => Some(p.into_post()),
            Err(e) => {
                tracing::debug!(error = %e, "skipping malformed post");
                None
            }
        })
        .collect()
}

fn decode<T: serde::de::DeserializeOwned>(body: &[u8]) -> Result<T, GatewayError> {
    serde_json::from_slice(body).map_err(|e| GatewayError::Decode(e.to_string()))
}

pub fn terms_from_json(body: &[u8]) -> Result<Vec<Term>, GatewayError> {
    decode::<Vec<WireTerm>>(body)?
        .into_iter()
        .map(WireTerm::into_term)
        .collect()
}

pub fn term_from_json(body: &[u8]) -> Result<Term, GatewayError> {
    decode::<WireTerm>(body)?.into_term()
}

pub fn results_from_json(body: &[u8]) -> Result<Vec<AnalysisResult>, GatewayError> {
    decode::<Vec<WireResult>>(body)?
        .into_iter()
        .map(WireResult::into_result)
        .collect()
}

pub fn result_from_json(body: &[u8]) -> Result<AnalysisResult, GatewayError> {
    decode::<WireResult>(body)?.into_result()
}

/// `requested_keyword` fills in for backends that only return the summary.
pub fn run_outcome_from_json(
    body: &[u8],
    requested_keyword: &str,
) -> Result<RunOutcome, GatewayError> {
    let resp: WireRunResponse = decode(body)?;
    let summary = resp
        .summary
        .ok_or_else(|| GatewayError::Decode("run response without summary".into()))?;
    Ok(RunOutcome {
        keyword: resp.keyword.unwrap_or_else(|| requested_keyword.to_string()),
        summary,
        tweet_count: resp.tweet_count.unwrap_or(0),
    })
}

/// Pull a human-readable message out of an error body (`detail` or `message`).
pub fn error_message(body: &[u8]) -> Option<String> {
    let v: Value = serde_json::from_slice(body).ok()?;
    ["detail", "message"]
        .iter()
        .find_map(|k| v.get(*k).and_then(Value::as_str))
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(str::to_string)
}
