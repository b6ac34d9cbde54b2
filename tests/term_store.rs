// tests/term_store.rs
//
// TermStore behaviour against the in-memory backend:
// validation before network, reload-after-mutation, partial updates,
// last-known-good state on failures.

use std::sync::Arc;
use std::time::Duration;

use x_monitor::gateway::memory::{Call, MemoryGateway, Op};
use x_monitor::gateway::{Gateway, GatewayResult};
use x_monitor::model::{AnalysisResult, NewTerm, ResultId, RunOutcome, RunRequest, Term, TermPatch};
use x_monitor::{MonitorError, TermId, TermStore};

fn setup(gw: MemoryGateway) -> (Arc<MemoryGateway>, TermStore) {
    let gw = Arc::new(gw);
    let store = TermStore::new(gw.clone());
    (gw, store)
}

#[tokio::test]
async fn empty_keyword_is_rejected_without_network() {
    let (gw, store) = setup(MemoryGateway::new());

    for kw in ["", "   ", "\t\n"] {
        let err = store.create(kw, false).await.unwrap_err();
        assert!(
            matches!(err, MonitorError::Validation(_)),
            "expected ValidationError for {kw:?}, got {err:?}"
        );
    }
    assert!(gw.calls().is_empty(), "no gateway call may be issued");
}

#[tokio::test]
async fn create_reloads_server_assigned_fields() {
    let (gw, store) = setup(MemoryGateway::new().with_terms(["#AI"]));
    store.load().await.unwrap();
    gw.clear_calls();

    store.create("$ORCL", false).await.unwrap();

    // Mutation first, reload strictly after it.
    let calls = gw.calls();
    assert_eq!(calls.len(), 2);
    assert!(matches!(&calls[0], Call::CreateTerm(t) if t.keyword == "$ORCL" && t.active && !t.restrict_following));
    assert_eq!(calls[1], Call::ListTerms);

    let server = gw
        .backend_terms()
        .into_iter()
        .find(|t| t.keyword == "$ORCL")
        .expect("backend has the term");
    let local = store
        .terms()
        .into_iter()
        .find(|t| t.keyword == "$ORCL")
        .expect("store has the term after reload");
    assert_eq!(local.id, server.id);
    assert_eq!(local.created_at, server.created_at);
    assert_eq!(store.len(), 2);
}

#[tokio::test]
async fn failed_create_leaves_state_unchanged() {
    let (gw, store) = setup(MemoryGateway::new().with_terms(["#AI"]));
    store.load().await.unwrap();
    let before = store.terms();
    gw.clear_calls();
    gw.fail(Op::CreateTerm);

    let err = store.create("$ORCL", true).await.unwrap_err();
    assert!(matches!(err, MonitorError::Mutation { .. }), "got {err:?}");
    assert_eq!(store.terms(), before);
    assert!(
        gw.calls_of(Op::ListTerms).is_empty(),
        "no reload after a failed mutation"
    );
}

#[tokio::test]
async fn failed_load_keeps_previous_list() {
    let (gw, store) = setup(MemoryGateway::new().with_terms(["#AI", "rust"]));
    store.load().await.unwrap();
    let before = store.terms();

    gw.fail(Op::ListTerms);
    let err = store.load().await.unwrap_err();
    assert!(matches!(err, MonitorError::Fetch { what: "terms", .. }), "got {err:?}");
    assert_eq!(store.terms(), before);
}

#[tokio::test]
async fn set_active_sends_only_the_changed_field() {
    let (gw, store) = setup(MemoryGateway::new().with_terms(["#AI"]));
    store.load().await.unwrap();
    let id = store.terms()[0].id;
    gw.clear_calls();

    store.set_active(id, false).await.unwrap();

    let updates = gw.calls_of(Op::UpdateTerm);
    assert_eq!(updates, vec![Call::UpdateTerm(id, TermPatch::active(false))]);
    if let Call::UpdateTerm(_, patch) = &updates[0] {
        assert_eq!(
            serde_json::to_value(patch).unwrap(),
            serde_json::json!({ "active": false })
        );
    }
    assert!(!store.get(id).unwrap().active);
    assert_eq!(gw.calls().last(), Some(&Call::ListTerms));
}

#[tokio::test]
async fn set_restrict_following_does_not_touch_active() {
    let (gw, store) = setup(MemoryGateway::new().with_terms(["#AI"]));
    store.load().await.unwrap();
    let id = store.terms()[0].id;
    store.set_active(id, false).await.unwrap();
    gw.clear_calls();

    store.set_restrict_following(id, true).await.unwrap();

    assert_eq!(
        gw.calls_of(Op::UpdateTerm),
        vec![Call::UpdateTerm(id, TermPatch::restrict_following(true))]
    );
    let t = store.get(id).unwrap();
    assert!(t.restrict_following);
    assert!(!t.active, "active must survive an unrelated update");
}

#[tokio::test]
async fn reload_picks_up_concurrent_server_changes() {
    let (gw, store) = setup(MemoryGateway::new().with_terms(["#AI", "rust"]));
    store.load().await.unwrap();
    let rust = store.terms()[1].id;

    // Someone else renames a term; our toggle's reload must reflect it.
    gw.rename_term(rust, "rustlang");
    store.set_active(store.terms()[0].id, false).await.unwrap();

    assert_eq!(store.get(rust).unwrap().keyword, "rustlang");
}

#[tokio::test]
async fn remove_deletes_then_reloads() {
    let (gw, store) = setup(MemoryGateway::new().with_terms(["#AI", "rust"]));
    store.load().await.unwrap();
    let id = store.terms()[0].id;
    gw.clear_calls();

    store.remove(id).await.unwrap();

    assert_eq!(gw.calls(), vec![Call::DeleteTerm(id), Call::ListTerms]);
    assert!(store.get(id).is_none());
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn remove_unknown_term_is_a_mutation_error() {
    let (_gw, store) = setup(MemoryGateway::new().with_terms(["#AI"]));
    store.load().await.unwrap();

    let err = store.remove(TermId(999)).await.unwrap_err();
    assert!(matches!(err, MonitorError::Mutation { action: "delete term", .. }));
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn mutation_applied_but_reload_failed_keeps_last_known_list() {
    let (gw, store) = setup(MemoryGateway::new().with_terms(["#AI"]));
    store.load().await.unwrap();
    let before = store.terms();
    let id = before[0].id;

    gw.fail(Op::ListTerms);
    let err = store.set_active(id, false).await.unwrap_err();
    assert!(matches!(err, MonitorError::Fetch { .. }), "got {err:?}");
    assert_eq!(store.terms(), before, "no partially-applied local change");

    gw.recover(Op::ListTerms);
    store.load().await.unwrap();
    assert!(!store.get(id).unwrap().active);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_mutations_do_not_interleave_reloads() {
    let (gw, store) = setup(MemoryGateway::new().with_terms(["a", "b", "c", "d"]));
    store.load().await.unwrap();
    let ids: Vec<TermId> = store.terms().iter().map(|t| t.id).collect();
    gw.clear_calls();

    let store = Arc::new(store);
    let handles: Vec<_> = ids
        .iter()
        .map(|&id| {
            let s = store.clone();
            tokio::spawn(async move { s.set_active(id, false).await })
        })
        .collect();
    for h in handles {
        h.await.unwrap().unwrap();
    }

    // Every update is immediately followed by its own reload.
    let ops: Vec<Op> = gw.calls().iter().map(Call::op).collect();
    assert_eq!(ops.len(), 8);
    for pair in ops.chunks(2) {
        assert_eq!(pair, [Op::UpdateTerm, Op::ListTerms]);
    }
    assert!(store.terms().iter().all(|t| !t.active));
}

/// Delegates to the in-memory backend but suspends inside `update_term`, so a
/// concurrent caller gets to run while the first write is in flight.
struct SlowUpdates(Arc<MemoryGateway>);

#[async_trait::async_trait]
impl Gateway for SlowUpdates {
    async fn list_terms(&self) -> GatewayResult<Vec<Term>> {
        self.0.list_terms().await
    }
    async fn create_term(&self, term: &NewTerm) -> GatewayResult<Term> {
        self.0.create_term(term).await
    }
    async fn update_term(&self, id: TermId, patch: &TermPatch) -> GatewayResult<Term> {
        tokio::time::sleep(Duration::from_millis(50)).await;
        self.0.update_term(id, patch).await
    }
    async fn delete_term(&self, id: TermId) -> GatewayResult<()> {
        self.0.delete_term(id).await
    }
    async fn list_results(&self) -> GatewayResult<Vec<AnalysisResult>> {
        self.0.list_results().await
    }
    async fn get_result(&self, id: ResultId) -> GatewayResult<AnalysisResult> {
        self.0.get_result(id).await
    }
    async fn manual_run(&self, request: &RunRequest) -> GatewayResult<RunOutcome> {
        self.0.manual_run(request).await
    }
    fn name(&self) -> &'static str {
        "slow-updates"
    }
}

#[tokio::test]
async fn concurrent_toggles_each_see_the_previous_flip() {
    let gw = Arc::new(MemoryGateway::new().with_terms(["#AI"]));
    let store = TermStore::new(Arc::new(SlowUpdates(gw.clone())));
    store.load().await.unwrap();
    let id = store.terms()[0].id;
    gw.clear_calls();

    let (a, b) = tokio::join!(store.toggle_active(id), store.toggle_active(id));
    a.unwrap();
    b.unwrap();

    let patches: Vec<Option<bool>> = gw
        .calls_of(Op::UpdateTerm)
        .into_iter()
        .filter_map(|c| match c {
            Call::UpdateTerm(_, patch) => Some(patch.active),
            _ => None,
        })
        .collect();
    assert_eq!(patches, vec![Some(false), Some(true)]);
    assert!(store.get(id).unwrap().active, "two flips cancel out");
}
