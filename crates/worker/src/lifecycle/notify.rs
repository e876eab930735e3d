//! Push notifications and notification clicks.

use serde::Serialize;
use stowaway_core::AppConfig;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotificationAction {
    pub action: String,
    pub title: String,
    pub icon: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotificationData {
    /// Milliseconds since the Unix epoch.
    pub date_of_arrival: i64,
    pub primary_key: u32,
}

/// A user-visible notification the host should show.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub icon: String,
    pub badge: String,
    pub vibrate: Vec<u32>,
    pub data: NotificationData,
    pub actions: Vec<NotificationAction>,
}

pub const ACTION_EXPLORE: &str = "explore";
pub const ACTION_CLOSE: &str = "close";

/// Build the notification for a push. Always produces one.
pub fn notification_for_push(config: &AppConfig, payload: Option<&str>) -> Notification {
    let icon = format!("{}icons/icon-192x192.png", config.static_prefix);
    let badge = format!("{}icons/icon-72x72.png", config.static_prefix);

    let body = match payload.map(str::trim) {
        Some(text) if !text.is_empty() => text.to_string(),
        _ => format!("New notification from {}", config.app_name),
    };

    Notification {
        title: config.app_name.clone(),
        body,
        icon,
        badge: badge.clone(),
        vibrate: vec![100, 50, 100],
        data: NotificationData { date_of_arrival: chrono::Utc::now().timestamp_millis(), primary_key: 1 },
        actions: vec![
            NotificationAction { action: ACTION_EXPLORE.into(), title: "View details".into(), icon: badge.clone() },
            NotificationAction { action: ACTION_CLOSE.into(), title: "Close".into(), icon: badge },
        ],
    }
}

/// What the host does after a notification is clicked. The notification
/// itself is always dismissed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClickAction {
    OpenWindow { url: String },
    Dismiss,
}

pub fn click_action(action: Option<&str>, root_url: &str) -> ClickAction {
    match action {
        Some(ACTION_CLOSE) => ClickAction::Dismiss,
        _ => ClickAction::OpenWindow { url: root_url.to_string() },
    }
}
