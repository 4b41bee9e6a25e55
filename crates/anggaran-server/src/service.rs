//! BudgetService: the single coordinator between HTTP handlers and the
//! tree engine and storage crates.
//!
//! All business logic flows through [`BudgetService`]. Handlers are thin
//! wrappers that delegate to these methods.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use uuid::Uuid;

use anggaran_core::{
    deletion, Baseline, BudgetTree, DeferredDeletions, DeletionPrompt, ItemId, ItemPayload,
    ItemRecord, ItemScope,
};
use anggaran_storage::{
    delete_immediately, load_tree, save_tree, Category, ItemStore, LoadedTree, Period,
    SqliteStore, StorageError,
};

use crate::error::ApiError;
use crate::schema::editor::{Edit, EditResponse, SaveResponse, SessionView};

/// One open editor: a working tree plus what it was loaded from.
#[derive(Debug, Clone)]
pub struct EditorSession {
    pub scope: ItemScope,
    pub tree: BudgetTree,
    pub deferred: DeferredDeletions,
    /// Records as last fetched, used to skip unchanged updates at save.
    pub baseline: Baseline,
    pub orphans: Vec<i64>,
    pub last_active: Instant,
}

impl EditorSession {
    fn from_loaded(scope: ItemScope, loaded: LoadedTree) -> Self {
        EditorSession {
            scope,
            tree: loaded.tree,
            deferred: DeferredDeletions::new(),
            baseline: loaded.baseline,
            orphans: loaded.orphans,
            last_active: Instant::now(),
        }
    }

    fn view(&self, session_id: Uuid) -> SessionView {
        SessionView {
            session_id,
            category_id: self.scope.category,
            period_id: self.scope.period,
            tree: self.tree.roots.clone(),
            deferred: self.deferred.clone(),
            orphans: self.orphans.clone(),
        }
    }
}

/// Idle time after which an editor session is dropped: one working day.
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(8 * 60 * 60);

/// The central service owning the store and every open editor session.
pub struct BudgetService {
    store: SqliteStore,
    sessions: HashMap<Uuid, EditorSession>,
    session_ttl: Duration,
}

impl BudgetService {
    /// Creates a BudgetService backed by the SQLite database at `db_path`.
    pub fn new(db_path: &str) -> Result<Self, ApiError> {
        let store = SqliteStore::new(db_path)
            .map_err(|e| ApiError::InternalError(format!("failed to open store: {}", e)))?;
        Ok(BudgetService {
            store,
            sessions: HashMap::new(),
            session_ttl: DEFAULT_SESSION_TTL,
        })
    }

    /// Creates a BudgetService on an in-memory database (for testing).
    pub fn in_memory() -> Result<Self, ApiError> {
        let store = SqliteStore::in_memory()
            .map_err(|e| ApiError::InternalError(format!("failed to open test store: {}", e)))?;
        Ok(BudgetService {
            store,
            sessions: HashMap::new(),
            session_ttl: DEFAULT_SESSION_TTL,
        })
    }

    /// Replaces the idle timeout for editor sessions.
    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = ttl;
        self
    }

    // -----------------------------------------------------------------------
    // Catalog
    // -----------------------------------------------------------------------

    pub fn list_categories(&self) -> Result<Vec<Category>, ApiError> {
        Ok(self.store.list_categories()?)
    }

    pub fn create_category(&mut self, name: &str) -> Result<Category, ApiError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ApiError::BadRequest("category name must not be empty".into()));
        }
        let category = self.store.create_category(name)?;
        tracing::info!(id = category.id.0, name, "created category");
        Ok(category)
    }

    pub fn list_periods(&self) -> Result<Vec<Period>, ApiError> {
        Ok(self.store.list_periods()?)
    }

    pub fn create_period(&mut self, name: &str, year: i32) -> Result<Period, ApiError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ApiError::BadRequest("period name must not be empty".into()));
        }
        let period = self.store.create_period(name, year)?;
        tracing::info!(id = period.id.0, name, year, "created period");
        Ok(period)
    }

    /// Fails with 404 unless both halves of the scope exist.
    fn check_scope(&self, scope: ItemScope) -> Result<(), ApiError> {
        if !self
            .store
            .list_categories()?
            .iter()
            .any(|c| c.id == scope.category)
        {
            return Err(StorageError::CategoryNotFound(scope.category.0).into());
        }
        if !self.store.list_periods()?.iter().any(|p| p.id == scope.period) {
            return Err(StorageError::PeriodNotFound(scope.period.0).into());
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Flat items
    // -----------------------------------------------------------------------

    pub fn list_items(&self, scope: ItemScope) -> Result<Vec<ItemRecord>, ApiError> {
        self.check_scope(scope)?;
        Ok(self.store.list_items(scope)?)
    }

    pub fn create_item(&mut self, payload: &ItemPayload) -> Result<ItemRecord, ApiError> {
        Ok(self.store.create_item(payload)?)
    }

    pub fn update_item(&mut self, id: i64, payload: &ItemPayload) -> Result<ItemRecord, ApiError> {
        Ok(self.store.update_item(id, payload)?)
    }

    pub fn delete_item(&mut self, id: i64) -> Result<(), ApiError> {
        self.store.delete_item(id)?;
        tracing::info!(item = id, "deleted item");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Editor sessions
    // -----------------------------------------------------------------------

    /// Loads a category/period into a new session. An empty scope opens with
    /// the single seeded root `A`.
    pub fn open_session(&mut self, scope: ItemScope) -> Result<SessionView, ApiError> {
        self.sweep_idle_sessions(Instant::now());
        self.check_scope(scope)?;
        let loaded = load_tree(&self.store, scope)?;
        let session_id = Uuid::new_v4();
        let session = EditorSession::from_loaded(scope, loaded);
        let view = session.view(session_id);
        self.sessions.insert(session_id, session);
        tracing::info!(%session_id, %scope, "opened editor session");
        Ok(view)
    }

    /// Drops sessions idle for longer than the session TTL, along with their
    /// unsaved work. Returns how many were dropped.
    pub fn sweep_idle_sessions(&mut self, now: Instant) -> usize {
        let ttl = self.session_ttl;
        let before = self.sessions.len();
        self.sessions.retain(|session_id, session| {
            let active = now.saturating_duration_since(session.last_active) <= ttl;
            if !active {
                tracing::info!(%session_id, scope = %session.scope, "expired idle editor session");
            }
            active
        });
        before - self.sessions.len()
    }

    /// Looks up a live session and marks it as used.
    fn session(&mut self, session_id: Uuid) -> Result<&mut EditorSession, ApiError> {
        let now = Instant::now();
        self.sweep_idle_sessions(now);
        let session = self
            .sessions
            .get_mut(&session_id)
            .ok_or_else(|| ApiError::NotFound(format!("editor session {} not found", session_id)))?;
        session.last_active = now;
        Ok(session)
    }

    pub fn session_view(&mut self, session_id: Uuid) -> Result<SessionView, ApiError> {
        Ok(self.session(session_id)?.view(session_id))
    }

    /// Discards a session and any unsaved work in it.
    pub fn close_session(&mut self, session_id: Uuid) -> Result<(), ApiError> {
        match self.sessions.remove(&session_id) {
            Some(_) => {
                tracing::info!(%session_id, "closed editor session");
                Ok(())
            }
            None => Err(ApiError::NotFound(format!(
                "editor session {} not found",
                session_id
            ))),
        }
    }

    /// Applies one edit. A rejected edit leaves the session untouched.
    ///
    /// Items that are marked for deletion, or sit under a marked ancestor,
    /// accept no field changes and no new children until they are unmarked.
    pub fn apply_edit(&mut self, session_id: Uuid, edit: Edit) -> Result<EditResponse, ApiError> {
        let current = self.session(session_id)?.clone();
        let mut next = current.clone();
        let mut created = None;

        match edit {
            Edit::AddChild { parent } => {
                deletion::ensure_editable(&current.tree, &current.deferred, parent)?;
                let (tree, id) = current.tree.add_child(parent)?;
                next.tree = tree;
                created = Some(id);
            }
            Edit::AddSibling { after, level } => {
                let (tree, id) = current.tree.add_sibling(after, level)?;
                // Only the landing spot matters: a marked `after` is fine when
                // the new item does not end up beneath a marked ancestor.
                deletion::ensure_editable(&tree, &current.deferred, id)?;
                next.tree = tree;
                created = Some(id);
            }
            Edit::UpdateField { item, change } => {
                deletion::ensure_editable(&current.tree, &current.deferred, item)?;
                next.tree = current.tree.update_field(item, change)?;
            }
            Edit::Remove { item } => {
                next.tree = deletion::remove_unsaved(&current.tree, &current.deferred, item)?;
            }
            Edit::MarkForDeletion { item } => {
                next.deferred = deletion::mark_for_deletion(&current.tree, &current.deferred, item)?;
            }
            Edit::Unmark { item } => {
                next.deferred = deletion::unmark(&current.tree, &current.deferred, item)?;
            }
            Edit::DeleteNow { item } => {
                let deleted = delete_immediately(
                    &mut self.store,
                    &current.tree,
                    &current.deferred,
                    &current.baseline,
                    item,
                )?;
                next.tree = deleted.tree;
                next.deferred = deleted.deferred;
                next.baseline = deleted.baseline;
            }
        }

        let view = next.view(session_id);
        self.sessions.insert(session_id, next);
        Ok(EditResponse {
            created,
            session: view,
        })
    }

    pub fn deletion_prompt(
        &mut self,
        session_id: Uuid,
        item: ItemId,
    ) -> Result<DeletionPrompt, ApiError> {
        let session = self.session(session_id)?;
        Ok(deletion::deletion_prompt(
            &session.tree,
            &session.deferred,
            item,
        )?)
    }

    /// Saves the session's tree and replaces it with the reloaded canonical
    /// state. On failure the working tree and deferred set are kept.
    pub fn save(&mut self, session_id: Uuid) -> Result<SaveResponse, ApiError> {
        let session = self.session(session_id)?.clone();
        let outcome = save_tree(
            &mut self.store,
            &session.tree,
            &session.deferred,
            &session.baseline,
            session.scope,
        )
        .map_err(|err| {
            tracing::warn!(%session_id, error = %err, "save failed, keeping working tree");
            err
        })?;

        let saved = EditorSession::from_loaded(session.scope, outcome.loaded);
        let view = saved.view(session_id);
        self.sessions.insert(session_id, saved);
        Ok(SaveResponse {
            report: outcome.report,
            session: view,
        })
    }
}
