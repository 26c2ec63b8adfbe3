//! Page sessions the worker can see and control.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

/// One open page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct Session {
    pub id: u64,
    pub url: String,
    pub focused: bool,
    /// Set once the worker has claimed the page.
    pub controlled: bool,
}

/// What happened when the worker asked for a page to be shown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ShowOutcome {
    Focused { session: u64 },
    Opened { session: u64 },
}

/// Registry of open sessions.
#[derive(Debug, Default)]
pub struct Sessions {
    open: RwLock<Vec<Session>>,
    next_id: AtomicU64,
}

impl Sessions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new, unfocused and uncontrolled page.
    pub async fn open(&self, url: &str) -> Session {
        self.open_as(url, false).await
    }

    /// Register a new, unfocused page, already controlled or not.
    pub async fn open_as(&self, url: &str, controlled: bool) -> Session {
        let mut session = self.new_session(url, false);
        session.controlled = controlled;
        self.open.write().await.push(session.clone());
        session
    }

    fn new_session(&self, url: &str, focused: bool) -> Session {
        Session {
            id: self.next_id.fetch_add(1, Ordering::SeqCst) + 1,
            url: url.to_string(),
            focused,
            controlled: false,
        }
    }

    pub async fn close(&self, id: u64) -> bool {
        let mut open = self.open.write().await;
        let before = open.len();
        open.retain(|s| s.id != id);
        open.len() != before
    }

    pub async fn list(&self) -> Vec<Session> {
        self.open.read().await.clone()
    }

    /// Take control of every open page. Returns how many were newly claimed.
    pub async fn claim(&self) -> usize {
        let mut open = self.open.write().await;
        let mut claimed = 0;
        for session in open.iter_mut().filter(|s| !s.controlled) {
            session.controlled = true;
            claimed += 1;
        }
        claimed
    }

    /// Focus an existing page and point it at `url`, or open a new one.
    ///
    /// The focused page is preferred, then the oldest one.
    pub async fn show(&self, url: &str) -> ShowOutcome {
        let mut open = self.open.write().await;
        let Some(target) = open.iter().position(|s| s.focused).or((!open.is_empty()).then_some(0)) else {
            let session = self.new_session(url, true);
            let id = session.id;
            open.push(session);
            return ShowOutcome::Opened { session: id };
        };

        for session in open.iter_mut() {
            session.focused = false;
        }
        let session = &mut open[target];
        session.focused = true;
        session.url = url.to_string();
        ShowOutcome::Focused { session: session.id }
    }
}
