use tokio::sync::mpsc;
use tracing::debug;
use url::Url;

use super::Notification;

/// Things the worker makes happen outside itself: notifications appearing
/// and windows being focused or opened. The page listens on the receiving
/// end; nothing is ever sent back.
#[derive(Debug, Clone, PartialEq)]
pub enum PlatformEvent {
    NotificationShown(Notification),
    NotificationClosed { tag: String },
    ClientFocused { client_id: String, url: Url },
    WindowOpened { client_id: String, url: Url },
    ControllerChanged { client_id: String },
}

pub type PlatformSender = mpsc::UnboundedSender<PlatformEvent>;
pub type PlatformReceiver = mpsc::UnboundedReceiver<PlatformEvent>;

pub fn platform_channel() -> (PlatformSender, PlatformReceiver) {
    mpsc::unbounded_channel()
}

/// Send without caring whether anyone is still listening.
pub(crate) fn emit(tx: &PlatformSender, event: PlatformEvent) {
    if let Err(e) = tx.send(event) {
        debug!(event = ?e.0, "No listener for platform event");
    }
}
