//! Push notifications and their click handling.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sworker_core::Error;
use tokio::sync::RwLock;

pub const TITLE: &str = "Ahmed Portfolio Update";
pub const DEFAULT_BODY: &str = "Portfolio update available";
pub const ICON: &str = "/Pictures/profile.jpg";
pub const PRIMARY_KEY: &str = "portfolio-update";
pub const VIBRATE: [u32; 3] = [100, 50, 100];

pub const ACTION_VIEW: &str = "view";
pub const ACTION_CLOSE: &str = "close";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct NotificationAction {
    pub action: String,
    pub title: String,
    pub icon: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct NotificationData {
    /// Unix milliseconds.
    pub date_of_arrival: i64,
    pub primary_key: String,
}

/// A notification as shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct Notification {
    pub id: String,
    pub title: String,
    pub body: String,
    pub icon: String,
    pub badge: String,
    pub vibrate: Vec<u32>,
    pub data: NotificationData,
    pub actions: Vec<NotificationAction>,
}

/// What a click asks the worker to do once the notification is closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickAction {
    /// Bring the site to the front.
    View,
    /// Nothing beyond closing.
    Dismiss,
}

/// Notifications currently on screen.
#[derive(Debug, Default)]
pub struct NotificationCenter {
    shown: RwLock<Vec<Notification>>,
    next_id: AtomicU64,
}

impl NotificationCenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Show a notification for a push message. An empty or absent payload
    /// gets the default body.
    pub async fn show(&self, payload: Option<&str>) -> Notification {
        let body = payload
            .filter(|p| !p.is_empty())
            .unwrap_or(DEFAULT_BODY)
            .to_string();

        let notification = Notification {
            id: format!("n-{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1),
            title: TITLE.to_string(),
            body,
            icon: ICON.to_string(),
            badge: ICON.to_string(),
            vibrate: VIBRATE.to_vec(),
            data: NotificationData {
                date_of_arrival: Utc::now().timestamp_millis(),
                primary_key: PRIMARY_KEY.to_string(),
            },
            actions: vec![
                NotificationAction {
                    action: ACTION_VIEW.to_string(),
                    title: "View Portfolio".to_string(),
                    icon: ICON.to_string(),
                },
                NotificationAction { action: ACTION_CLOSE.to_string(), title: "Close".to_string(), icon: ICON.to_string() },
            ],
        };

        tracing::info!(id = %notification.id, "showing notification: {}", notification.body);
        self.shown.write().await.push(notification.clone());
        notification
    }

    pub async fn list(&self) -> Vec<Notification> {
        self.shown.read().await.clone()
    }

    /// Close the clicked notification and decide what follows.
    pub async fn click(&self, id: &str, action: Option<&str>) -> Result<ClickAction, Error> {
        let mut shown = self.shown.write().await;
        let index = shown
            .iter()
            .position(|n| n.id == id)
            .ok_or_else(|| Error::UnknownNotification(id.to_string()))?;
        shown.remove(index);

        let outcome = match action {
            Some(ACTION_VIEW) => ClickAction::View,
            _ => ClickAction::Dismiss,
        };
        tracing::debug!(id, ?action, ?outcome, "notification clicked");
        Ok(outcome)
    }
}
