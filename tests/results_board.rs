// tests/results_board.rs
//
// Result cards: term label fallback, collapsed vs expanded content,
// top-post ranking and stale-list behaviour on fetch failures.

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use x_monitor::gateway::memory::{MemoryGateway, Op};
use x_monitor::model::{AnalysisResult, Author, PublicMetrics};
use x_monitor::{MonitorError, Post, ResultId, ResultsBoard, Term, TermId};

fn post(id: &str, likes: u64, retweets: u64, replies: u64) -> Post {
    Post {
        id: id.into(),
        author: Some(Author {
            username: format!("user_{id}"),
            verified: false,
        }),
        text: format!("text {id}"),
        created_at: None,
        public_metrics: Some(PublicMetrics {
            like_count: likes,
            retweet_count: retweets,
            reply_count: replies,
        }),
        url: format!("https://twitter.com/i/status/{id}"),
    }
}

fn ai_term() -> Term {
    Term {
        id: TermId(1),
        keyword: "#AI".into(),
        restrict_following: false,
        active: true,
        created_at: Utc.with_ymd_and_hms(2025, 9, 1, 8, 0, 0).unwrap(),
    }
}

fn seeded() -> Arc<MemoryGateway> {
    let gw = Arc::new(MemoryGateway::new());
    gw.push_result(AnalysisResult {
        id: ResultId(1),
        monitored_term: Some(ai_term()),
        summary: Some("Headline\n\nSecond line\nThird line\nFourth line".into()),
        tweets_raw: vec![
            post("p1", 1, 0, 50),
            post("p2", 10, 5, 0),
            post("p3", 3, 1, 0),
            post("p4", 2, 2, 0),
            post("p5", 0, 0, 0),
            post("p6", 20, 0, 0),
            post("p7", 0, 4, 0),
        ],
        created_at: Utc.with_ymd_and_hms(2025, 9, 6, 8, 0, 0).unwrap(),
    });
    gw.push_result(AnalysisResult {
        id: ResultId(2),
        monitored_term: None,
        summary: None,
        tweets_raw: Vec::new(),
        created_at: Utc.with_ymd_and_hms(2025, 9, 7, 8, 0, 0).unwrap(),
    });
    gw
}

#[tokio::test]
async fn collapsed_cards_show_preview_only() {
    let board = ResultsBoard::new(seeded());
    board.load().await.unwrap();

    let cards = board.cards();
    assert_eq!(cards.len(), 2);
    // newest first
    assert_eq!(cards[0].id, ResultId(2));
    assert_eq!(cards[0].term_label, "Unknown Term");
    assert_eq!(cards[0].preview, vec!["No summary available"]);
    assert!(!cards[0].has_more, "nothing to reveal without summary or posts");

    let c = &cards[1];
    assert_eq!(c.term_label, "#AI");
    assert!(!c.expanded);
    assert_eq!(c.preview, vec!["Headline", "Second line"]);
    assert!(c.rest.is_empty());
    assert!(c.top_posts.is_empty());
    assert!(c.has_more);
}

#[tokio::test]
async fn expanded_card_shows_rest_and_top_five_posts() {
    let board = ResultsBoard::new(seeded());
    board.load().await.unwrap();
    assert!(board.toggle_expanded(ResultId(1)));

    let c = board.card(ResultId(1)).unwrap();
    assert!(c.expanded);
    assert_eq!(c.rest, vec!["Third line", "Fourth line"]);

    // p6=20, p2=15, then p3/p4/p7 all score 4 in input order; replies ignored.
    let ids: Vec<&str> = c.top_posts.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec!["p6", "p2", "p3", "p4", "p7"]);

    // Input collection untouched.
    let raw = board.get(ResultId(1)).unwrap().tweets_raw;
    assert_eq!(raw[0].id, "p1");
    assert_eq!(raw.len(), 7);
}

#[tokio::test]
async fn configured_limits_are_respected() {
    let board = ResultsBoard::with_limits(seeded(), 2, 1);
    board.load().await.unwrap();
    board.toggle_expanded(ResultId(1));

    let c = board.card(ResultId(1)).unwrap();
    assert_eq!(c.preview, vec!["Headline"]);
    assert_eq!(c.rest.len(), 3);
    assert_eq!(c.top_posts.len(), 2);
}

#[tokio::test]
async fn failed_load_keeps_previous_results() {
    let gw = seeded();
    let board = ResultsBoard::new(gw.clone());
    board.load().await.unwrap();

    gw.fail(Op::ListResults);
    let err = board.load().await.unwrap_err();
    assert!(matches!(err, MonitorError::Fetch { what: "results", .. }));
    assert_eq!(board.results().len(), 2);
}

#[tokio::test]
async fn fetch_upserts_single_result() {
    let gw = seeded();
    let board = ResultsBoard::new(gw.clone());

    let r = board.fetch(ResultId(1)).await.unwrap();
    assert_eq!(r.term_label(), "#AI");
    assert_eq!(board.results().len(), 1);

    board.fetch(ResultId(1)).await.unwrap();
    assert_eq!(board.results().len(), 1, "re-fetch replaces in place");

    let err = board.fetch(ResultId(99)).await.unwrap_err();
    assert!(matches!(err, MonitorError::Fetch { what: "result", .. }));
}

#[tokio::test]
async fn reload_collapses_card_that_disappeared() {
    let gw = Arc::new(MemoryGateway::new());
    let board = ResultsBoard::new(gw.clone());
    board.toggle_expanded(ResultId(5));
    assert!(board.is_expanded(ResultId(5)));

    board.load().await.unwrap();
    assert!(!board.is_expanded(ResultId(5)));
}
