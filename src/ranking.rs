//! # Ranking
//! Pure, side-effect-free views over a result's raw data:
//! top posts by engagement and summary segmentation for progressive disclosure.

use std::cmp::Reverse;

use serde::Serialize;

use crate::model::Post;

pub const DEFAULT_TOP_POSTS: usize = 5;
pub const DEFAULT_PREVIEW_LINES: usize = 2;
pub const NO_SUMMARY_PLACEHOLDER: &str = "No summary available";

/// Posts ordered by descending engagement (likes + retweets), truncated to `limit`.
///
/// Ties keep their input order. The input is borrowed and never reordered.
pub fn rank_top_posts(posts: &[Post], limit: usize) -> Vec<&Post> {
    let mut ranked: Vec<&Post> = posts.iter().collect();
    // `sort_by_key` is stable.
    ranked.sort_by_key(|p| Reverse(p.engagement()));
    ranked.truncate(limit);
    ranked
}

/// Summary split into the always-visible preview and the expandable rest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SummarySegments {
    pub preview: Vec<String>,
    pub rest: Vec<String>,
}

impl SummarySegments {
    pub fn has_more(&self) -> bool {
        !self.rest.is_empty()
    }
}

/// Split `summary` into non-blank lines; the first `preview_lines` form the preview.
///
/// A missing or empty summary becomes the single placeholder line. Text made only of
/// blank lines yields an empty preview.
pub fn segment_summary(summary: Option<&str>, preview_lines: usize) -> SummarySegments {
    let mut lines: Vec<String> = match summary {
        None | Some("") => vec![NO_SUMMARY_PLACEHOLDER.to_string()],
        Some(text) => text
            .lines()
            .filter(|l| !l.trim().is_empty())
            .map(str::to_string)
            .collect(),
    };

    let rest = lines.split_off(preview_lines.min(lines.len()));
    SummarySegments {
        preview: lines,
        rest,
    }
}
