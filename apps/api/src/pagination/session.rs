//! Live preview sessions.
//!
//! A session owns one exclusive measure surface and a sequence of immutable
//! snapshots identified by a monotonically increasing revision. Every edit
//! creates a new revision and requests a measured pass. Passes run one at a
//! time; a pass whose revision is no longer the latest, either when it gets
//! the surface or when its measurement completes, is discarded. Only the
//! latest revision ever commits its pagination.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::resume::ResumeDocument;
use crate::models::sections::{SectionKey, SectionOrder, SectionOrderError};
use crate::models::theme::Theme;
use crate::pagination::content::ensure_unique_item_ids;
use crate::pagination::measurer::{Measure, SurfaceMeasurer};
use crate::pagination::pipeline::{paginate, LayoutSnapshot, Pagination};
use crate::pagination::renderer::{render_document, RenderedDocument};

// ────────────────────────────────────────────────────────────────────────────
// Section edits
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum SectionChange {
    Show { section: SectionKey },
    Hide { section: SectionKey },
    Move { section: SectionKey, to_index: usize },
    Reorder { order: Vec<SectionKey> },
}

impl SectionChange {
    pub fn apply(&self, order: &mut SectionOrder) -> Result<(), SectionOrderError> {
        match self {
            SectionChange::Show { section } => order.set_visible(*section, true),
            SectionChange::Hide { section } => order.set_visible(*section, false),
            SectionChange::Move { section, to_index } => order.move_section(*section, *to_index),
            SectionChange::Reorder { order: keys } => order.reorder(keys),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Pass results
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PassStatus {
    Committed,
    /// A newer revision arrived; this pass's result was thrown away.
    Superseded,
}

#[derive(Debug, Clone, Serialize)]
pub struct PassOutcome {
    pub revision: u64,
    pub status: PassStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
}

impl PassOutcome {
    fn superseded(revision: u64) -> Self {
        Self {
            revision,
            status: PassStatus::Superseded,
            pagination: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CommittedLayout {
    pub revision: u64,
    pub committed_at: DateTime<Utc>,
    pub pagination: Pagination,
    #[serde(skip)]
    pub snapshot: Option<LayoutSnapshot>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PreviewView {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub latest_revision: u64,
    pub committed: Option<CommittedLayout>,
}

// ────────────────────────────────────────────────────────────────────────────
// Session
// ────────────────────────────────────────────────────────────────────────────

struct Latest {
    revision: u64,
    snapshot: LayoutSnapshot,
}

pub struct PreviewSession {
    id: Uuid,
    created_at: DateTime<Utc>,
    /// Last time a client looked the session up; drives idle eviction.
    last_touched: RwLock<Instant>,
    measurer: Arc<dyn Measure>,
    latest: RwLock<Latest>,
    /// Held for the whole of a pass; one pass per session at a time.
    pass_lock: Mutex<()>,
    committed: RwLock<Option<CommittedLayout>>,
}

impl PreviewSession {
    /// New session at revision 1. No pass has run yet.
    pub fn new(id: Uuid, snapshot: LayoutSnapshot, measurer: Arc<dyn Measure>) -> Self {
        Self {
            id,
            created_at: Utc::now(),
            last_touched: RwLock::new(Instant::now()),
            measurer,
            latest: RwLock::new(Latest {
                revision: 1,
                snapshot,
            }),
            pass_lock: Mutex::new(()),
            committed: RwLock::new(None),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    async fn touch(&self) {
        *self.last_touched.write().await = Instant::now();
    }

    async fn idle_for(&self, now: Instant) -> Duration {
        now.saturating_duration_since(*self.last_touched.read().await)
    }

    pub async fn latest_revision(&self) -> u64 {
        self.latest.read().await.revision
    }

    /// Replaces the document (and optionally the theme) and re-paginates.
    pub async fn submit_document(&self, document: ResumeDocument, theme: Option<Theme>) -> Result<PassOutcome, AppError> {
        ensure_unique_item_ids(&document)?;
        self.submit_with(move |current| {
            let mut next = current.clone();
            next.document = Arc::new(document);
            if let Some(theme) = theme {
                next.theme = theme;
            }
            Ok(next)
        })
        .await
    }

    /// Applies one section edit (show/hide/move/reorder) and re-paginates.
    pub async fn update_sections(&self, change: SectionChange) -> Result<PassOutcome, AppError> {
        self.submit_with(move |current| {
            let mut next = current.clone();
            change.apply(&mut next.sections)?;
            Ok(next)
        })
        .await
    }

    /// Runs a pass for whatever revision is latest right now.
    pub async fn refresh(&self) -> Result<PassOutcome, AppError> {
        let (revision, snapshot) = {
            let latest = self.latest.read().await;
            (latest.revision, latest.snapshot.clone())
        };
        self.run_pass(revision, snapshot).await
    }

    /// Derives the next snapshot from the latest one, publishes it as a new
    /// revision and runs its pass. A rejected edit leaves the revision as is.
    pub async fn submit_with<F>(&self, change: F) -> Result<PassOutcome, AppError>
    where
        F: FnOnce(&LayoutSnapshot) -> Result<LayoutSnapshot, AppError>,
    {
        let (revision, snapshot) = {
            let mut latest = self.latest.write().await;
            let next = change(&latest.snapshot)?;
            latest.revision += 1;
            latest.snapshot = next.clone();
            (latest.revision, next)
        };
        self.run_pass(revision, snapshot).await
    }

    async fn run_pass(&self, revision: u64, snapshot: LayoutSnapshot) -> Result<PassOutcome, AppError> {
        let _pass = self.pass_lock.lock().await;

        if self.is_stale(revision).await {
            debug!(session = %self.id, revision, "Pass superseded before measuring");
            return Ok(PassOutcome::superseded(revision));
        }

        let pagination = paginate(self.measurer.as_ref(), &snapshot).await?;

        if self.is_stale(revision).await {
            debug!(session = %self.id, revision, "Pass superseded after measuring; discarding");
            return Ok(PassOutcome::superseded(revision));
        }

        *self.committed.write().await = Some(CommittedLayout {
            revision,
            committed_at: Utc::now(),
            pagination: pagination.clone(),
            snapshot: Some(snapshot),
        });
        info!(
            session = %self.id,
            revision,
            pages = pagination.page_count(),
            "Preview layout committed"
        );

        Ok(PassOutcome {
            revision,
            status: PassStatus::Committed,
            pagination: Some(pagination),
        })
    }

    async fn is_stale(&self, revision: u64) -> bool {
        self.latest.read().await.revision != revision
    }

    pub async fn committed(&self) -> Option<CommittedLayout> {
        self.committed.read().await.clone()
    }

    pub async fn view(&self) -> PreviewView {
        PreviewView {
            id: self.id,
            created_at: self.created_at,
            latest_revision: self.latest_revision().await,
            committed: self.committed().await,
        }
    }

    /// Printable pages for the last committed layout.
    pub async fn render_committed(&self) -> Result<RenderedDocument, AppError> {
        let committed = self.committed.read().await;
        match committed.as_ref() {
            Some(CommittedLayout {
                pagination,
                snapshot: Some(snapshot),
                ..
            }) => render_document(pagination, snapshot),
            _ => Err(AppError::NotFound(format!(
                "Preview {} has no committed layout yet",
                self.id
            ))),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Registry
// ────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct PreviewRegistry {
    sessions: RwLock<HashMap<Uuid, Arc<PreviewSession>>>,
}

impl PreviewRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a session with its own measure surface.
    pub async fn create(&self, snapshot: LayoutSnapshot) -> Arc<PreviewSession> {
        let id = Uuid::new_v4();
        let session = Arc::new(PreviewSession::new(id, snapshot, Arc::new(SurfaceMeasurer::new())));
        self.sessions.write().await.insert(id, session.clone());
        info!(session = %id, "Preview session opened");
        session
    }

    /// Looks a session up and marks it as recently used.
    pub async fn get(&self, id: Uuid) -> Result<Arc<PreviewSession>, AppError> {
        let session = self
            .sessions
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Preview {id} not found")))?;
        session.touch().await;
        Ok(session)
    }

    pub async fn remove(&self, id: Uuid) -> Result<(), AppError> {
        match self.sessions.write().await.remove(&id) {
            Some(_) => {
                info!(session = %id, "Preview session closed");
                Ok(())
            }
            None => Err(AppError::NotFound(format!("Preview {id} not found"))),
        }
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Drops every session nobody has looked up for longer than `max_idle`.
    /// A pass still running on an evicted session finishes on its own handle.
    pub async fn evict_idle(&self, max_idle: Duration) -> usize {
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;
        let mut idle = Vec::new();
        for (id, session) in sessions.iter() {
            if session.idle_for(now).await > max_idle {
                idle.push(*id);
            }
        }
        for id in &idle {
            sessions.remove(id);
            info!(session = %id, "Idle preview session evicted");
        }
        idle.len()
    }

    /// Periodically evicts sessions idle for longer than `idle_timeout`.
    pub fn spawn_idle_sweeper(self: Arc<Self>, idle_timeout: Duration) -> JoinHandle<()> {
        let period = (idle_timeout / 4).max(Duration::from_secs(1));
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;
                let evicted = self.evict_idle(idle_timeout).await;
                if evicted > 0 {
                    let open = self.len().await;
                    info!(evicted, open, "Idle preview sweep complete");
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use tokio::sync::{Notify, Semaphore};

    use super::*;
    use crate::models::resume::ExperienceItem;
    use crate::pagination::measurer::Measurements;
    use crate::pagination::page_setup::PageSetup;
    use crate::pagination::pipeline::Fidelity;

    fn make_snapshot(entries: usize) -> LayoutSnapshot {
        LayoutSnapshot {
            document: Arc::new(make_document(entries)),
            sections: SectionOrder::default(),
            theme: Theme::default(),
            setup: PageSetup::default(),
        }
    }

    fn make_document(entries: usize) -> ResumeDocument {
        ResumeDocument {
            summary: "Reliability engineer.".to_string(),
            experience: (0..entries)
                .map(|i| ExperienceItem {
                    position: format!("SRE {i}"),
                    company: "Hooli".to_string(),
                    ..Default::default()
                })
                .collect(),
            ..Default::default()
        }
    }

    /// Measurer that parks every pass until the test hands out a permit.
    struct GatedMeasurer {
        inner: SurfaceMeasurer,
        gate: Semaphore,
        entered: Notify,
        calls: AtomicUsize,
    }

    impl GatedMeasurer {
        fn new() -> Self {
            Self {
                inner: SurfaceMeasurer::new(),
                gate: Semaphore::new(0),
                entered: Notify::new(),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl Measure for GatedMeasurer {
        async fn measure(&self, snapshot: &LayoutSnapshot) -> Result<Measurements, AppError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.entered.notify_one();
            self.gate
                .acquire()
                .await
                .map_err(|e| AppError::Internal(anyhow::anyhow!(e)))?
                .forget();
            self.inner.measure(snapshot).await
        }
    }

    async fn wait_for_revision(session: &PreviewSession, revision: u64) {
        while session.latest_revision().await < revision {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn test_refresh_commits_measured_layout() {
        let session = PreviewSession::new(Uuid::new_v4(), make_snapshot(2), Arc::new(SurfaceMeasurer::new()));
        let outcome = session.refresh().await.unwrap();
        assert_eq!(outcome.status, PassStatus::Committed);
        assert_eq!(outcome.revision, 1);

        let committed = session.committed().await.unwrap();
        assert_eq!(committed.revision, 1);
        assert_eq!(committed.pagination.fidelity, Fidelity::Measured);
    }

    #[tokio::test]
    async fn test_newer_revision_supersedes_in_flight_pass() {
        let measurer = Arc::new(GatedMeasurer::new());
        let session = Arc::new(PreviewSession::new(Uuid::new_v4(), make_snapshot(1), measurer.clone()));

        let first = tokio::spawn({
            let session = session.clone();
            async move { session.submit_document(make_document(3), None).await }
        });
        measurer.entered.notified().await;

        let second = tokio::spawn({
            let session = session.clone();
            async move { session.submit_document(make_document(8), None).await }
        });
        wait_for_revision(&session, 3).await;
        measurer.gate.add_permits(2);

        let first = first.await.unwrap().unwrap();
        let second = second.await.unwrap().unwrap();
        assert_eq!((first.revision, first.status), (2, PassStatus::Superseded));
        assert!(first.pagination.is_none());
        assert_eq!((second.revision, second.status), (3, PassStatus::Committed));

        let committed = session.committed().await.unwrap();
        assert_eq!(committed.revision, 3);
        let snapshot = committed.snapshot.unwrap();
        assert_eq!(snapshot.document.experience.len(), 8);
    }

    #[tokio::test]
    async fn test_stale_queued_pass_never_measures() {
        let measurer = Arc::new(GatedMeasurer::new());
        let session = Arc::new(PreviewSession::new(Uuid::new_v4(), make_snapshot(1), measurer.clone()));

        let mut handles = Vec::new();
        handles.push(tokio::spawn({
            let session = session.clone();
            async move { session.submit_document(make_document(2), None).await }
        }));
        measurer.entered.notified().await;
        for entries in [3, 4] {
            let session = session.clone();
            handles.push(tokio::spawn(async move {
                session.submit_document(make_document(entries), None).await
            }));
        }
        wait_for_revision(&session, 4).await;
        measurer.gate.add_permits(2);

        let mut committed = 0;
        for handle in handles {
            if handle.await.unwrap().unwrap().status == PassStatus::Committed {
                committed += 1;
            }
        }
        assert_eq!(committed, 1);
        // The first pass and the latest one measured; the middle one was skipped.
        assert_eq!(measurer.calls.load(Ordering::SeqCst), 2);
        assert_eq!(session.committed().await.unwrap().revision, 4);
    }

    #[tokio::test]
    async fn test_section_change_is_applied() {
        let session = PreviewSession::new(Uuid::new_v4(), make_snapshot(2), Arc::new(SurfaceMeasurer::new()));
        let outcome = session
            .update_sections(SectionChange::Hide {
                section: SectionKey::Experience,
            })
            .await;
        // Experience is required and cannot be hidden.
        assert!(matches!(outcome, Err(AppError::Validation(_))));
        assert_eq!(session.latest_revision().await, 1);

        let outcome = session
            .update_sections(SectionChange::Move {
                section: SectionKey::Experience,
                to_index: 0,
            })
            .await
            .unwrap();
        assert_eq!(outcome.status, PassStatus::Committed);
        let pagination = outcome.pagination.unwrap();
        assert_eq!(pagination.pages[0].sections[0].section_id, SectionKey::Experience);
    }

    #[tokio::test]
    async fn test_duplicate_entry_ids_are_rejected() {
        let session = PreviewSession::new(Uuid::new_v4(), make_snapshot(2), Arc::new(SurfaceMeasurer::new()));
        let mut document = make_document(2);
        document.experience[1].id = document.experience[0].id;

        let outcome = session.submit_document(document, None).await;
        assert!(matches!(outcome, Err(AppError::Validation(_))));
        assert_eq!(session.latest_revision().await, 1);
        assert!(session.committed().await.is_none());
    }

    #[test]
    fn test_section_change_wire_format() {
        let change: SectionChange =
            serde_json::from_str(r#"{"action":"move","section":"skills","to_index":2}"#).unwrap();
        assert!(matches!(
            change,
            SectionChange::Move {
                section: SectionKey::Skills,
                to_index: 2
            }
        ));
    }

    #[tokio::test]
    async fn test_render_committed_requires_a_pass() {
        let session = PreviewSession::new(Uuid::new_v4(), make_snapshot(2), Arc::new(SurfaceMeasurer::new()));
        assert!(matches!(session.render_committed().await, Err(AppError::NotFound(_))));
        session.refresh().await.unwrap();
        let rendered = session.render_committed().await.unwrap();
        assert_eq!(rendered.page_count, 1);
    }

    #[tokio::test]
    async fn test_registry_lifecycle() {
        let registry = PreviewRegistry::new();
        let session = registry.create(make_snapshot(1)).await;
        assert_eq!(registry.len().await, 1);
        assert_eq!(registry.get(session.id()).await.unwrap().id(), session.id());

        registry.remove(session.id()).await.unwrap();
        assert!(matches!(registry.get(session.id()).await, Err(AppError::NotFound(_))));
        assert!(matches!(registry.remove(session.id()).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_sessions_are_evicted() {
        let registry = PreviewRegistry::new();
        let kept = registry.create(make_snapshot(1)).await;
        let dropped = registry.create(make_snapshot(1)).await;

        tokio::time::advance(Duration::from_secs(600)).await;
        registry.get(kept.id()).await.unwrap();
        tokio::time::advance(Duration::from_secs(1500)).await;

        assert_eq!(registry.evict_idle(Duration::from_secs(1800)).await, 1);
        assert_eq!(registry.len().await, 1);
        assert!(registry.get(kept.id()).await.is_ok());
        assert!(matches!(registry.get(dropped.id()).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_sweeper_runs_in_background() {
        let registry = Arc::new(PreviewRegistry::new());
        let sweeper = registry.clone().spawn_idle_sweeper(Duration::from_secs(60));
        registry.create(make_snapshot(1)).await;

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(registry.len().await, 1);
        tokio::time::sleep(Duration::from_secs(90)).await;
        assert_eq!(registry.len().await, 0);
        sweeper.abort();
    }
}
