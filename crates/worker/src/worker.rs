//! The worker as a whole: lifecycle state plus every event it handles.
//!
//! ### States
//! `Parsed -> Installing -> Installed -> Activating -> Activated`. A failed
//! install ends in `Redundant`; a failed activation cleanup falls back to
//! `Installed`. Install always skips waiting, so `start` runs both steps
//! back to back and then claims every open page.
//!
//! Fetches are only intercepted while `Activated`; in every other state
//! they go straight to the network.

use serde::{Deserialize, Serialize};
use sworker_core::{CacheDb, Error, WorkerRequest};
use tokio::sync::RwLock;

use crate::clients::{Session, Sessions, ShowOutcome};
use crate::fetch::NetworkError;
use crate::lifecycle::{self, CleanupReport, InstallReport};
use crate::notify::{ClickAction, Notification, NotificationCenter};
use crate::router::{Bypass, Handled, Router};
use crate::sync::{self, SyncReport};

/// Page the `view` notification action brings up.
pub const HOME_PATH: &str = "/";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum WorkerState {
    Parsed,
    Installing,
    Installed,
    Activating,
    Activated,
    Redundant,
}

/// Commands a page can post to the worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ControlMessage {
    /// Delete every store that is not current.
    CacheCleanup,
}

impl ControlMessage {
    /// Parse a message type. Unknown types are `None` and get ignored.
    pub fn from_type(kind: &str) -> Option<Self> {
        match kind {
            "CACHE_CLEANUP" => Some(Self::CacheCleanup),
            _ => None,
        }
    }
}

/// Result of clicking a notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ClickOutcome {
    Dismissed,
    Shown { page: ShowOutcome },
}

pub struct ServiceWorker {
    router: Router,
    state: RwLock<WorkerState>,
    sessions: Sessions,
    notifications: NotificationCenter,
    outbox: Option<CacheDb>,
}

impl ServiceWorker {
    pub fn new(router: Router) -> Self {
        Self {
            router,
            state: RwLock::new(WorkerState::Parsed),
            sessions: Sessions::new(),
            notifications: NotificationCenter::new(),
            outbox: None,
        }
    }

    /// Attach the durable outbox used by background sync.
    pub fn with_outbox(mut self, outbox: CacheDb) -> Self {
        self.outbox = Some(outbox);
        self
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn sessions(&self) -> &Sessions {
        &self.sessions
    }

    pub fn outbox(&self) -> Option<&CacheDb> {
        self.outbox.as_ref()
    }

    pub async fn state(&self) -> WorkerState {
        *self.state.read().await
    }

    async fn transition(&self, from: WorkerState, to: WorkerState) -> Result<(), Error> {
        let mut state = self.state.write().await;
        if *state != from {
            return Err(Error::InvalidState(format!("cannot move to {to:?} from {:?}", *state)));
        }
        tracing::info!("worker state {:?} -> {:?}", from, to);
        *state = to;
        Ok(())
    }

    /// Pre-cache the asset lists. Failure leaves the worker redundant.
    pub async fn install(&self) -> Result<InstallReport, Error> {
        self.transition(WorkerState::Parsed, WorkerState::Installing).await?;
        match lifecycle::install(&self.router).await {
            Ok(report) => {
                self.transition(WorkerState::Installing, WorkerState::Installed).await?;
                Ok(report)
            }
            Err(e) => {
                tracing::error!("install failed: {}", e);
                self.transition(WorkerState::Installing, WorkerState::Redundant).await?;
                Err(e)
            }
        }
    }

    /// Drop stale stores, then take control of every open page.
    ///
    /// Pages are only claimed once cleanup has finished. A failed cleanup
    /// puts the worker back to `Installed` so activation can be retried.
    pub async fn activate(&self) -> Result<CleanupReport, Error> {
        self.transition(WorkerState::Installed, WorkerState::Activating).await?;
        let report = match lifecycle::activate(&self.router).await {
            Ok(report) => report,
            Err(e) => {
                tracing::warn!("cleanup during activation failed: {}", e);
                self.transition(WorkerState::Activating, WorkerState::Installed).await?;
                return Err(e);
            }
        };
        let claimed = self.sessions.claim().await;
        tracing::debug!("claimed {} sessions", claimed);
        self.transition(WorkerState::Activating, WorkerState::Activated).await?;
        Ok(report)
    }

    /// Install, skip waiting, activate.
    pub async fn start(&self) -> Result<CleanupReport, Error> {
        self.install().await?;
        self.activate().await
    }

    /// Handle a fetch event from a page.
    pub async fn fetch(&self, request: &WorkerRequest) -> Result<Handled, NetworkError> {
        if self.state().await != WorkerState::Activated {
            return self.router.passthrough(request, Bypass::NotActive).await;
        }
        self.router.handle(request).await
    }

    /// A page loads. Pages loaded under an activated worker start controlled.
    pub async fn open_page(&self, url: &str) -> Session {
        let controlled = self.state().await == WorkerState::Activated;
        let session = self.sessions.open_as(url, controlled).await;
        tracing::debug!(id = session.id, controlled, "page opened at {}", url);
        session
    }

    /// A page goes away. Returns whether it was open.
    pub async fn close_page(&self, id: u64) -> bool {
        self.sessions.close(id).await
    }

    /// Handle a control message.
    pub async fn message(&self, message: ControlMessage) -> Result<CleanupReport, Error> {
        match message {
            ControlMessage::CacheCleanup => lifecycle::cleanup(&self.router).await,
        }
    }

    /// Handle a push event.
    pub async fn push(&self, payload: Option<&str>) -> Notification {
        self.notifications.show(payload).await
    }

    pub async fn notifications(&self) -> Vec<Notification> {
        self.notifications.list().await
    }

    /// Handle a click on a shown notification.
    pub async fn notification_click(&self, id: &str, action: Option<&str>) -> Result<ClickOutcome, Error> {
        match self.notifications.click(id, action).await? {
            ClickAction::Dismiss => Ok(ClickOutcome::Dismissed),
            ClickAction::View => Ok(ClickOutcome::Shown { page: self.sessions.show(HOME_PATH).await }),
        }
    }

    /// Handle a background sync event.
    pub async fn sync(&self, tag: &str) -> Result<SyncReport, Error> {
        match &self.outbox {
            Some(outbox) => sync::replay(outbox, self.router.fetcher().as_ref(), tag).await,
            None => {
                tracing::debug!(tag, "no outbox attached; nothing to sync");
                Ok(SyncReport { tag: tag.to_string(), ..Default::default() })
            }
        }
    }

    /// Wait for background revalidations.
    pub async fn settle(&self) -> usize {
        self.router.settle().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::Source;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use crate::testing::{ORIGIN, ScriptedFetcher, get, site_url};
    use sworker_core::{CacheStorage, Manifest, MemoryStorage, StoreInfo, StoreNames, WorkerResponse};
    use url::Url;

    fn worker(storage: Arc<dyn CacheStorage>, fetcher: Arc<ScriptedFetcher>) -> ServiceWorker {
        let router = Router::new(Manifest::new(Url::parse(ORIGIN).unwrap()), StoreNames::default(), storage, fetcher);
        ServiceWorker::new(router)
    }

    fn serve_site(fetcher: &ScriptedFetcher) {
        let manifest = Manifest::new(Url::parse(ORIGIN).unwrap());
        for url in manifest.static_urls().unwrap() {
            fetcher.ok(url.as_str(), "asset");
        }
        for url in manifest.external_urls().unwrap() {
            fetcher.ok(url.as_str(), "external");
        }
    }

    #[tokio::test]
    async fn test_start_reaches_activated_and_claims() {
        let storage = Arc::new(MemoryStorage::new());
        let fetcher = Arc::new(ScriptedFetcher::new());
        serve_site(&fetcher);
        storage.open("static-cache-v0.9").await.unwrap();
        let sw = worker(storage.clone(), fetcher);
        sw.sessions().open("/").await;

        let report = sw.start().await.unwrap();
        assert_eq!(report.deleted, vec!["static-cache-v0.9".to_string()]);
        assert_eq!(sw.state().await, WorkerState::Activated);
        assert!(sw.sessions().list().await.iter().all(|s| s.controlled));
    }

    /// Memory storage whose store listing can be made to fail.
    struct FlakyStorage {
        inner: MemoryStorage,
        fail_keys: AtomicBool,
    }

    #[async_trait::async_trait]
    impl CacheStorage for FlakyStorage {
        async fn open(&self, name: &str) -> Result<(), Error> {
            self.inner.open(name).await
        }
        async fn keys(&self) -> Result<Vec<String>, Error> {
            if self.fail_keys.load(Ordering::SeqCst) {
                return Err(Error::MigrationFailed("storage unavailable".into()));
            }
            self.inner.keys().await
        }
        async fn delete(&self, name: &str) -> Result<bool, Error> {
            self.inner.delete(name).await
        }
        async fn match_in(&self, name: &str, request: &WorkerRequest) -> Result<Option<WorkerResponse>, Error> {
            self.inner.match_in(name, request).await
        }
        async fn match_any(&self, request: &WorkerRequest) -> Result<Option<WorkerResponse>, Error> {
            self.inner.match_any(request).await
        }
        async fn put(&self, name: &str, request: &WorkerRequest, response: &WorkerResponse) -> Result<(), Error> {
            self.inner.put(name, request, response).await
        }
        async fn put_all(&self, name: &str, entries: &[(WorkerRequest, WorkerResponse)]) -> Result<(), Error> {
            self.inner.put_all(name, entries).await
        }
        async fn stats(&self) -> Result<Vec<StoreInfo>, Error> {
            self.inner.stats().await
        }
    }

    #[tokio::test]
    async fn test_failed_cleanup_blocks_claim_and_activation() {
        let storage = Arc::new(FlakyStorage { inner: MemoryStorage::new(), fail_keys: AtomicBool::new(true) });
        storage.open("leftover_v0").await.unwrap();
        let fetcher = Arc::new(ScriptedFetcher::new());
        serve_site(&fetcher);
        let sw = worker(storage.clone(), fetcher);
        sw.sessions().open("/").await;

        let err = sw.start().await.unwrap_err();
        assert!(matches!(err, Error::MigrationFailed(_)));
        assert_eq!(sw.state().await, WorkerState::Installed);
        assert!(sw.sessions().list().await.iter().all(|s| !s.controlled));

        let style = get(&site_url("/styles.css"));
        let handled = sw.fetch(&style).await.unwrap();
        assert!(matches!(handled, Handled::Passthrough { reason: Bypass::NotActive, .. }));

        storage.fail_keys.store(false, Ordering::SeqCst);
        let report = sw.activate().await.unwrap();
        assert_eq!(report.deleted, vec!["leftover_v0".to_string()]);
        assert_eq!(sw.state().await, WorkerState::Activated);
        assert!(sw.sessions().list().await.iter().all(|s| s.controlled));
    }

    #[tokio::test]
    async fn test_failed_install_is_redundant_and_passes_through() {
        let storage = Arc::new(MemoryStorage::new());
        let fetcher = Arc::new(ScriptedFetcher::new());
        let sw = worker(storage.clone(), fetcher.clone());

        assert!(matches!(sw.start().await, Err(Error::InstallFailed(_))));
        assert_eq!(sw.state().await, WorkerState::Redundant);

        let style = site_url("/styles.css");
        fetcher.ok(&style, "body{}");
        let handled = sw.fetch(&get(&style)).await.unwrap();
        assert_eq!(handled.source(), Source::Passthrough);
        assert!(matches!(handled, Handled::Passthrough { reason: Bypass::NotActive, .. }));
        assert!(storage.stats().await.unwrap().iter().all(|s| s.entries == 0));
    }

    #[tokio::test]
    async fn test_activate_requires_install() {
        let sw = worker(Arc::new(MemoryStorage::new()), Arc::new(ScriptedFetcher::new()));
        assert!(matches!(sw.activate().await, Err(Error::InvalidState(_))));
        assert_eq!(sw.state().await, WorkerState::Parsed);
    }

    #[tokio::test]
    async fn test_activated_worker_serves_precache_offline() {
        let fetcher = Arc::new(ScriptedFetcher::new());
        serve_site(&fetcher);
        let sw = worker(Arc::new(MemoryStorage::new()), fetcher.clone());
        sw.start().await.unwrap();

        fetcher.set_offline(true);
        let handled = sw.fetch(&get(&site_url("/Pictures/profile.jpg"))).await.unwrap();
        assert_eq!(handled.source(), Source::Cache);
        assert_eq!(handled.response().body.as_ref(), b"asset");
    }

    #[tokio::test]
    async fn test_cleanup_message() {
        let storage = Arc::new(MemoryStorage::new());
        storage.open("leftover_v0").await.unwrap();
        storage.open("dynamic-cache-v1.0").await.unwrap();
        let sw = worker(storage.clone(), Arc::new(ScriptedFetcher::new()));

        let report = sw.message(ControlMessage::CacheCleanup).await.unwrap();
        assert_eq!(report.deleted, vec!["leftover_v0".to_string()]);
        assert_eq!(storage.keys().await.unwrap(), vec!["dynamic-cache-v1.0".to_string()]);
    }

    #[test]
    fn test_control_message_parsing() {
        assert_eq!(ControlMessage::from_type("CACHE_CLEANUP"), Some(ControlMessage::CacheCleanup));
        assert_eq!(ControlMessage::from_type("SKIP_WAITING"), None);

        let parsed: ControlMessage = serde_json::from_str(r#"{"type":"CACHE_CLEANUP"}"#).unwrap();
        assert_eq!(parsed, ControlMessage::CacheCleanup);
    }

    #[tokio::test]
    async fn test_push_then_view_click_opens_home() {
        let sw = worker(Arc::new(MemoryStorage::new()), Arc::new(ScriptedFetcher::new()));
        let n = sw.push(Some("New post")).await;
        assert_eq!(sw.notifications().await.len(), 1);

        let outcome = sw.notification_click(&n.id, Some("view")).await.unwrap();
        let ClickOutcome::Shown { page: ShowOutcome::Opened { session } } = outcome else {
            panic!("expected a new session, got {outcome:?}");
        };
        let sessions = sw.sessions().list().await;
        assert_eq!(sessions[0].id, session);
        assert_eq!(sessions[0].url, HOME_PATH);
        assert!(sw.notifications().await.is_empty());
    }

    #[tokio::test]
    async fn test_pages_opened_after_activation_are_controlled() {
        let fetcher = Arc::new(ScriptedFetcher::new());
        serve_site(&fetcher);
        let sw = worker(Arc::new(MemoryStorage::new()), fetcher);

        let early = sw.open_page("/").await;
        assert!(!early.controlled);
        sw.start().await.unwrap();
        let late = sw.open_page("/projects.html").await;
        assert!(late.controlled);
        assert!(sw.sessions().list().await.iter().all(|s| s.controlled));

        assert!(sw.close_page(early.id).await);
        assert!(!sw.close_page(early.id).await);
        assert_eq!(sw.sessions().list().await, vec![late]);
    }

    #[tokio::test]
    async fn test_close_click_dismisses() {
        let sw = worker(Arc::new(MemoryStorage::new()), Arc::new(ScriptedFetcher::new()));
        let n = sw.push(None).await;
        assert_eq!(sw.notification_click(&n.id, Some("close")).await.unwrap(), ClickOutcome::Dismissed);
        assert!(sw.sessions().list().await.is_empty());
    }

    #[tokio::test]
    async fn test_sync_without_outbox() {
        let sw = worker(Arc::new(MemoryStorage::new()), Arc::new(ScriptedFetcher::new()));
        let report = sw.sync(sync::CONTACT_FORM_SYNC).await.unwrap();
        assert_eq!(report.replayed, 0);
    }

    #[tokio::test]
    async fn test_sync_replays_outbox() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let fetcher = Arc::new(ScriptedFetcher::new());
        fetcher.ok(&site_url("/contact"), "ok");
        db.enqueue_submission(sync::CONTACT_FORM_SYNC, "POST", &site_url("/contact"), None, b"hi")
            .await
            .unwrap();
        let sw = worker(Arc::new(db.clone()), fetcher).with_outbox(db);

        let report = sw.sync(sync::CONTACT_FORM_SYNC).await.unwrap();
        assert_eq!(report.replayed, 1);
    }
}
