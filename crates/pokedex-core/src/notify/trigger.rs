//! Page-side notification trigger.
//!
//! Asks for permission, then hands a personalized `SHOW_NOTIFICATION`
//! message to the active worker. Without a worker the page shows a basic
//! notification itself.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::models::{sprite_url, PokemonSummary};
use crate::worker::{
    Notification, ShowNotification, WorkerError, WorkerHandle, WorkerMessage, WorkerState,
};

pub const UNSUPPORTED_ALERT: &str = "This terminal does not support notifications.";
pub const PERMISSION_ALERT: &str = "You must allow notifications to continue.";
pub const NO_ACTIVE_WORKER: &str = "No active worker to receive the message.";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    #[default]
    Default,
    Granted,
    Denied,
}

/// Where the trigger posts its messages.
pub trait MessageTarget {
    fn is_active(&self) -> bool;
    fn post(&self, message: WorkerMessage) -> Result<(), WorkerError>;
}

impl MessageTarget for WorkerHandle {
    fn is_active(&self) -> bool {
        self.state() == WorkerState::Activated
    }

    fn post(&self, message: WorkerMessage) -> Result<(), WorkerError> {
        self.post_message(message)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// Notifications are turned off; alert [`UNSUPPORTED_ALERT`].
    Unsupported,
    /// Permission was never asked; prompt, then call
    /// [`NotificationTrigger::resolve_permission`] and try again.
    PermissionRequired,
    /// Permission refused; alert [`PERMISSION_ALERT`].
    Denied,
    /// Message handed to the worker.
    Posted(ShowNotification),
    /// No worker registered; show this notification in-page.
    Fallback(Notification),
    /// A worker is registered but cannot take messages.
    NoActiveWorker,
}

/// The message for `entry`: its name in the body, its sprite as the icon,
/// and its detail page as the click target.
pub fn personalized_message(entry: &PokemonSummary, sprite_base: &str) -> ShowNotification {
    let id = entry.id();
    ShowNotification {
        title: Some("Pokémon!".to_string()),
        body: Some(format!(
            "{} (#{}) wants to be caught!",
            entry.display_name(),
            id
        )),
        icon: Some(sprite_url(sprite_base, id)),
        tag: Some(format!("pokedex-{}", id)),
        url: Some(format!("/pokemon/{}", id)),
    }
}

#[derive(Debug, Clone)]
pub struct NotificationTrigger {
    supported: bool,
    permission: Permission,
    sprite_base: String,
}

impl NotificationTrigger {
    pub fn new(supported: bool, permission: Permission, sprite_base: impl Into<String>) -> Self {
        Self {
            supported,
            permission,
            sprite_base: sprite_base.into(),
        }
    }

    pub fn permission(&self) -> Permission {
        self.permission
    }

    pub fn is_supported(&self) -> bool {
        self.supported
    }

    /// Record the user's answer to the permission prompt.
    pub fn resolve_permission(&mut self, granted: bool) -> Permission {
        self.permission = if granted {
            Permission::Granted
        } else {
            Permission::Denied
        };
        info!(permission = ?self.permission, "Notification permission");
        self.permission
    }

    /// Send a notification about `entry`.
    pub fn send<T: MessageTarget>(
        &self,
        entry: &PokemonSummary,
        worker: Option<&T>,
    ) -> TriggerOutcome {
        if !self.supported {
            return TriggerOutcome::Unsupported;
        }
        match self.permission {
            Permission::Default => return TriggerOutcome::PermissionRequired,
            Permission::Denied => return TriggerOutcome::Denied,
            Permission::Granted => {}
        }

        let message = personalized_message(entry, &self.sprite_base);
        let Some(worker) = worker else {
            return TriggerOutcome::Fallback(Notification::from_message(message));
        };
        if !worker.is_active() {
            warn!("{}", NO_ACTIVE_WORKER);
            return TriggerOutcome::NoActiveWorker;
        }

        match worker.post(WorkerMessage::ShowNotification(message.clone())) {
            Ok(()) => TriggerOutcome::Posted(message),
            Err(e) => {
                warn!(error = %e, "{}", NO_ACTIVE_WORKER);
                TriggerOutcome::NoActiveWorker
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SPRITE_BASE_URL;
    use std::cell::RefCell;

    struct FakeWorker {
        active: bool,
        posted: RefCell<Vec<WorkerMessage>>,
    }

    impl FakeWorker {
        fn new(active: bool) -> Self {
            Self {
                active,
                posted: RefCell::new(Vec::new()),
            }
        }
    }

    impl MessageTarget for FakeWorker {
        fn is_active(&self) -> bool {
            self.active
        }

        fn post(&self, message: WorkerMessage) -> Result<(), WorkerError> {
            self.posted.borrow_mut().push(message);
            Ok(())
        }
    }

    fn pikachu() -> PokemonSummary {
        PokemonSummary::new("pikachu", "https://pokeapi.co/api/v2/pokemon/25/")
    }

    fn granted() -> NotificationTrigger {
        NotificationTrigger::new(true, Permission::Granted, SPRITE_BASE_URL)
    }

    #[test]
    fn test_personalized_message() {
        let msg = personalized_message(&pikachu(), SPRITE_BASE_URL);
        assert_eq!(msg.title.as_deref(), Some("Pokémon!"));
        assert!(msg.body.as_deref().unwrap().contains("Pikachu"));
        assert_eq!(msg.url.as_deref(), Some("/pokemon/25"));
        assert_eq!(msg.tag.as_deref(), Some("pokedex-25"));
        assert_eq!(
            msg.icon.as_deref(),
            Some("https://raw.githubusercontent.com/PokeAPI/sprites/master/sprites/pokemon/25.png")
        );
    }

    #[test]
    fn test_posts_to_active_worker() {
        let worker = FakeWorker::new(true);
        let outcome = granted().send(&pikachu(), Some(&worker));
        assert!(matches!(outcome, TriggerOutcome::Posted(_)));
        assert_eq!(worker.posted.borrow().len(), 1);
    }

    #[test]
    fn test_inactive_worker_warns() {
        let worker = FakeWorker::new(false);
        assert_eq!(
            granted().send(&pikachu(), Some(&worker)),
            TriggerOutcome::NoActiveWorker
        );
        assert!(worker.posted.borrow().is_empty());
    }

    #[test]
    fn test_no_worker_uses_fallback() {
        match granted().send::<FakeWorker>(&pikachu(), None) {
            TriggerOutcome::Fallback(n) => {
                assert_eq!(n.title, "Pokémon!");
                assert_eq!(n.url, "/pokemon/25");
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn test_permission_flow() {
        let worker = FakeWorker::new(true);
        let mut trigger = NotificationTrigger::new(true, Permission::Default, SPRITE_BASE_URL);
        assert_eq!(
            trigger.send(&pikachu(), Some(&worker)),
            TriggerOutcome::PermissionRequired
        );

        trigger.resolve_permission(false);
        assert_eq!(trigger.send(&pikachu(), Some(&worker)), TriggerOutcome::Denied);

        trigger.resolve_permission(true);
        assert!(matches!(
            trigger.send(&pikachu(), Some(&worker)),
            TriggerOutcome::Posted(_)
        ));
    }

    #[test]
    fn test_unsupported() {
        let trigger = NotificationTrigger::new(false, Permission::Granted, SPRITE_BASE_URL);
        assert_eq!(
            trigger.send::<FakeWorker>(&pikachu(), None),
            TriggerOutcome::Unsupported
        );
    }

    #[test]
    fn test_permission_serde() {
        assert_eq!(serde_json::to_string(&Permission::Granted).unwrap(), "\"granted\"");
        let p: Permission = serde_json::from_str("\"denied\"").unwrap();
        assert_eq!(p, Permission::Denied);
    }
}
