//! # Term store
//! Single source of truth for the monitored-term list, kept in sync with the gateway.
//!
//! Mutations never patch the local list. Each successful write is followed by a full
//! reload, so server-assigned fields (`id`, `created_at`) and concurrent edits made
//! elsewhere always come from the backend. A failed call leaves the list untouched.

use metrics::counter;
use parking_lot::RwLock;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, info, warn};

use crate::error::{MonitorError, Result};
use crate::gateway::{instrumented, DynGateway};
use crate::model::{NewTerm, Term, TermId, TermPatch};

pub struct TermStore {
    gateway: DynGateway,
    terms: RwLock<Vec<Term>>,
    /// Held across a mutation and its reload so two reloads never interleave.
    sync: AsyncMutex<()>,
}

impl TermStore {
    pub fn new(gateway: DynGateway) -> Self {
        Self {
            gateway,
            terms: RwLock::new(Vec::new()),
            sync: AsyncMutex::new(()),
        }
    }

    /// Snapshot of the local list, in gateway order.
    pub fn terms(&self) -> Vec<Term> {
        self.terms.read().clone()
    }

    pub fn get(&self, id: TermId) -> Option<Term> {
        self.terms.read().iter().find(|t| t.id == id).cloned()
    }

    pub fn len(&self) -> usize {
        self.terms.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.read().is_empty()
    }

    /// Fetch the full list and replace local state.
    pub async fn load(&self) -> Result<()> {
        let _guard = self.sync.lock().await;
        self.reload().await
    }

    /// Validate, submit `{keyword, restrict_following, active: true}`, then reload.
    pub async fn create(&self, keyword: &str, restrict_following: bool) -> Result<()> {
        if keyword.trim().is_empty() {
            return Err(MonitorError::Validation("keyword must not be empty".into()));
        }
        let new = NewTerm::new(keyword, restrict_following);

        let _guard = self.sync.lock().await;
        let created = instrumented("create_term", self.gateway.create_term(&new))
            .await
            .map_err(|source| {
                warn!(keyword, error = %source, "creating term failed");
                MonitorError::Mutation {
                    action: "add term",
                    source,
                }
            })?;
        counter!("term_mutations_total", "kind" => "create").increment(1);
        info!(term_id = %created.id, keyword, "term created");

        self.reload().await
    }

    pub async fn set_active(&self, id: TermId, active: bool) -> Result<()> {
        self.update(id, TermPatch::active(active), "update term status")
            .await
    }

    pub async fn set_restrict_following(&self, id: TermId, value: bool) -> Result<()> {
        self.update(id, TermPatch::restrict_following(value), "update following filter")
            .await
    }

    /// Flip `active` based on the locally known value.
    ///
    /// The value is read under `sync`, so a queued toggle sees the list reloaded by
    /// the one before it.
    pub async fn toggle_active(&self, id: TermId) -> Result<()> {
        let _guard = self.sync.lock().await;
        let current = self.known(id)?;
        self.update_locked(id, TermPatch::active(!current.active), "update term status")
            .await
    }

    /// Flip `restrict_following` based on the locally known value.
    pub async fn toggle_restrict_following(&self, id: TermId) -> Result<()> {
        let _guard = self.sync.lock().await;
        let current = self.known(id)?;
        self.update_locked(
            id,
            TermPatch::restrict_following(!current.restrict_following),
            "update following filter",
        )
        .await
    }

    /// Delete a term. Asking the user for confirmation is the caller's job.
    pub async fn remove(&self, id: TermId) -> Result<()> {
        let _guard = self.sync.lock().await;
        instrumented("delete_term", self.gateway.delete_term(id))
            .await
            .map_err(|source| {
                warn!(term_id = %id, error = %source, "deleting term failed");
                MonitorError::Mutation {
                    action: "delete term",
                    source,
                }
            })?;
        counter!("term_mutations_total", "kind" => "delete").increment(1);
        info!(term_id = %id, "term deleted");

        self.reload().await
    }

    async fn update(&self, id: TermId, patch: TermPatch, action: &'static str) -> Result<()> {
        let _guard = self.sync.lock().await;
        self.update_locked(id, patch, action).await
    }

    /// Caller must hold `sync`.
    async fn update_locked(&self, id: TermId, patch: TermPatch, action: &'static str) -> Result<()> {
        instrumented("update_term", self.gateway.update_term(id, &patch))
            .await
            .map_err(|source| {
                warn!(term_id = %id, ?patch, error = %source, "updating term failed");
                MonitorError::Mutation { action, source }
            })?;
        counter!("term_mutations_total", "kind" => "update").increment(1);
        debug!(term_id = %id, ?patch, "term updated");

        self.reload().await
    }

    fn known(&self, id: TermId) -> Result<Term> {
        self.get(id)
            .ok_or_else(|| MonitorError::Validation(format!("unknown term {id}")))
    }

    /// Caller must hold `sync`.
    async fn reload(&self) -> Result<()> {
        let fresh = instrumented("list_terms", self.gateway.list_terms())
            .await
            .map_err(|source| {
                warn!(error = %source, "loading terms failed; keeping last-known list");
                MonitorError::Fetch {
                    what: "terms",
                    source,
                }
            })?;
        debug!(count = fresh.len(), "terms loaded");
        *self.terms.write() = fresh;
        Ok(())
    }
}
