//! Notifications from the page's side.

pub mod trigger;

pub use trigger::{
    personalized_message, MessageTarget, NotificationTrigger, Permission, TriggerOutcome,
    NO_ACTIVE_WORKER, PERMISSION_ALERT, UNSUPPORTED_ALERT,
};
