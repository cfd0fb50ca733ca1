//! System notifications shown by the worker.

use std::sync::{Mutex, MutexGuard};

use serde::{Deserialize, Serialize};

use super::ShowNotification;

pub const DEFAULT_TITLE: &str = "Pokédex!";
pub const DEFAULT_BODY: &str = "Local notification";
pub const DEFAULT_ICON: &str = "/icons/icon-192.png";
pub const DEFAULT_TAG: &str = "pokedex-local";
pub const DEFAULT_URL: &str = "/";

/// Action id that always opens a new window.
pub const OPEN_ACTION: &str = "open";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationAction {
    pub action: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub icon: String,
    /// Notifications sharing a tag replace each other.
    pub tag: String,
    /// Page to bring up on click.
    pub url: String,
    /// Alert again even when replacing a notification with the same tag.
    pub renotify: bool,
    pub actions: Vec<NotificationAction>,
}

impl Notification {
    /// Fill every field the message left out with its default.
    pub fn from_message(msg: ShowNotification) -> Self {
        Self {
            title: msg.title.unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            body: msg.body.unwrap_or_else(|| DEFAULT_BODY.to_string()),
            icon: msg.icon.unwrap_or_else(|| DEFAULT_ICON.to_string()),
            tag: msg.tag.unwrap_or_else(|| DEFAULT_TAG.to_string()),
            url: msg.url.unwrap_or_else(|| DEFAULT_URL.to_string()),
            renotify: true,
            actions: vec![NotificationAction {
                action: OPEN_ACTION.to_string(),
                title: "Open".to_string(),
            }],
        }
    }
}

/// Notifications currently on screen.
#[derive(Debug, Default)]
pub struct NotificationCenter {
    active: Mutex<Vec<Notification>>,
}

impl NotificationCenter {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Notification>> {
        self.active.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Display `notification`, replacing any with the same tag.
    /// Returns whether one was replaced.
    pub fn show(&self, notification: Notification) -> bool {
        let mut active = self.lock();
        let replaced = match active.iter().position(|n| n.tag == notification.tag) {
            Some(idx) => {
                active.remove(idx);
                true
            }
            None => false,
        };
        active.push(notification);
        replaced
    }

    pub fn close(&self, tag: &str) -> Option<Notification> {
        let mut active = self.lock();
        let idx = active.iter().position(|n| n.tag == tag)?;
        Some(active.remove(idx))
    }

    pub fn get(&self, tag: &str) -> Option<Notification> {
        self.lock().iter().find(|n| n.tag == tag).cloned()
    }

    pub fn active(&self) -> Vec<Notification> {
        self.lock().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_missing_fields() {
        let n = Notification::from_message(ShowNotification::default());
        assert_eq!(n.title, "Pokédex!");
        assert_eq!(n.body, "Local notification");
        assert_eq!(n.icon, "/icons/icon-192.png");
        assert_eq!(n.tag, "pokedex-local");
        assert_eq!(n.url, "/");
        assert!(n.renotify);
        assert_eq!(n.actions.len(), 1);
        assert_eq!(n.actions[0].action, "open");
        assert_eq!(n.actions[0].title, "Open");
    }

    #[test]
    fn test_message_fields_win() {
        let n = Notification::from_message(ShowNotification {
            title: Some("Pokémon!".into()),
            url: Some("/pokemon/25".into()),
            ..Default::default()
        });
        assert_eq!(n.title, "Pokémon!");
        assert_eq!(n.url, "/pokemon/25");
        assert_eq!(n.body, DEFAULT_BODY);
    }

    #[test]
    fn test_same_tag_replaces() {
        let center = NotificationCenter::new();
        let first = Notification::from_message(ShowNotification {
            body: Some("one".into()),
            ..Default::default()
        });
        let second = Notification::from_message(ShowNotification {
            body: Some("two".into()),
            ..Default::default()
        });
        assert!(!center.show(first));
        assert!(center.show(second));

        let active = center.active();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].body, "two");
    }

    #[test]
    fn test_close_removes() {
        let center = NotificationCenter::new();
        center.show(Notification::from_message(ShowNotification::default()));
        assert!(center.get(DEFAULT_TAG).is_some());
        assert!(center.close(DEFAULT_TAG).is_some());
        assert!(center.close(DEFAULT_TAG).is_none());
        assert!(center.active().is_empty());
    }
}
