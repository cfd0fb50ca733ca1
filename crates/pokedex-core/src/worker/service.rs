//! The offline caching worker: lifecycle, fetch interception, page messages
//! and notification clicks.

use std::fmt;
use std::sync::{Arc, RwLock};

use futures::future::try_join_all;
use tracing::{debug, info, warn};
use url::Url;

use crate::cache::CacheStorage;
use crate::net::{Fetch, FetchError, Request};

use super::notifications::{DEFAULT_URL, OPEN_ACTION};
use super::platform::{emit, PlatformEvent, PlatformSender};
use super::strategy::{respond, FetchOutcome, StrategyContext};
use super::{
    Client, Clients, Decision, Notification, NotificationCenter, NotificationClick, Router,
    WorkerConfig, WorkerError, WorkerMessage,
};

/// Lifecycle of a worker version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Parsed,
    Installing,
    Installed,
    Activating,
    Activated,
    /// Install failed; this version will never control anything.
    Redundant,
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            WorkerState::Parsed => "parsed",
            WorkerState::Installing => "installing",
            WorkerState::Installed => "installed",
            WorkerState::Activating => "activating",
            WorkerState::Activated => "activated",
            WorkerState::Redundant => "redundant",
        };
        write!(f, "{}", s)
    }
}

/// How a notification click was resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickOutcome {
    Focused(Client),
    Opened(Client),
}

pub struct CacheWorker {
    config: WorkerConfig,
    router: Router,
    ctx: StrategyContext,
    state: RwLock<WorkerState>,
    clients: Arc<Clients>,
    notifications: NotificationCenter,
    events: PlatformSender,
}

impl CacheWorker {
    pub fn new(
        config: WorkerConfig,
        caches: Arc<dyn CacheStorage>,
        network: Arc<dyn Fetch>,
        clients: Arc<Clients>,
        events: PlatformSender,
    ) -> Result<Self, WorkerError> {
        let ctx = StrategyContext {
            caches,
            network,
            runtime_cache: config.runtime_cache.clone(),
            shell_document: config.resolve(&config.shell_document)?,
        };

        Ok(Self {
            router: Router::for_config(&config),
            config,
            ctx,
            state: RwLock::new(WorkerState::Parsed),
            clients,
            notifications: NotificationCenter::new(),
            events,
        })
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    pub fn clients(&self) -> &Arc<Clients> {
        &self.clients
    }

    pub fn notifications(&self) -> &NotificationCenter {
        &self.notifications
    }

    pub fn caches(&self) -> &Arc<dyn CacheStorage> {
        &self.ctx.caches
    }

    pub fn state(&self) -> WorkerState {
        *self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn set_state(&self, state: WorkerState) {
        *self.state.write().unwrap_or_else(|e| e.into_inner()) = state;
        debug!(%state, "Worker state changed");
    }

    fn expect_state(&self, expected: WorkerState) -> Result<(), WorkerError> {
        let found = self.state();
        if found == expected {
            Ok(())
        } else {
            Err(WorkerError::InvalidState { expected, found })
        }
    }

    /// Pre-cache the app shell into the static store.
    ///
    /// All-or-nothing: every shell asset must be fetched successfully before
    /// anything is stored. On failure the worker becomes redundant.
    pub async fn install(&self) -> Result<(), WorkerError> {
        self.expect_state(WorkerState::Parsed)?;
        self.set_state(WorkerState::Installing);

        match self.precache_shell().await {
            Ok(count) => {
                info!(count, store = %self.config.static_cache, "App shell cached");
                self.set_state(WorkerState::Installed);
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Install failed");
                self.set_state(WorkerState::Redundant);
                Err(e)
            }
        }
    }

    async fn precache_shell(&self) -> Result<usize, WorkerError> {
        let requests = self
            .config
            .app_shell
            .iter()
            .map(|path| self.config.resolve(path).map(Request::get))
            .collect::<Result<Vec<_>, _>>()?;

        let network = &self.ctx.network;
        let responses = try_join_all(requests.iter().map(|req| network.fetch(req)))
            .await
            .map_err(|e| WorkerError::InstallFailed(e.to_string()))?;

        if let Some((req, resp)) = requests
            .iter()
            .zip(&responses)
            .find(|(_, resp)| !resp.is_success())
        {
            return Err(WorkerError::InstallFailed(format!(
                "{} returned {}",
                req.url, resp.status
            )));
        }

        let store = &self.config.static_cache;
        self.ctx.caches.open(store)?;
        for (req, resp) in requests.iter().zip(&responses) {
            self.ctx.caches.put(store, &req.cache_key(), resp)?;
        }
        Ok(requests.len())
    }

    /// Activate as soon as installation finishes instead of waiting for
    /// older pages to close.
    pub fn skip_waiting(&self) -> Result<(), WorkerError> {
        self.activate()
    }

    /// Remove every store this version does not know, then take control of
    /// all open pages.
    pub fn activate(&self) -> Result<(), WorkerError> {
        self.expect_state(WorkerState::Installed)?;
        self.set_state(WorkerState::Activating);

        if let Err(e) = self.purge_outdated_caches() {
            warn!(error = %e, "Activation failed");
            self.set_state(WorkerState::Redundant);
            return Err(e);
        }

        let claimed = self.clients.claim();
        self.set_state(WorkerState::Activated);
        info!(claimed, "Worker activated");
        Ok(())
    }

    fn purge_outdated_caches(&self) -> Result<(), WorkerError> {
        let known = self.config.known_caches();
        for store in self.ctx.caches.keys()? {
            if !known.contains(&store.as_str()) {
                info!(store = %store, "Deleting outdated cache");
                self.ctx.caches.delete(&store)?;
            }
        }
        Ok(())
    }

    pub fn decide(&self, request: &Request) -> Decision {
        self.router.decide(request, &self.config.origin)
    }

    /// Answer an intercepted request. `None` means the worker stays out of
    /// it and the request should go straight to the network.
    pub async fn handle_fetch(
        &self,
        request: &Request,
    ) -> Option<Result<FetchOutcome, FetchError>> {
        match self.decide(request) {
            Decision::Bypass => None,
            Decision::Handle { route, strategy } => {
                debug!(url = %request.url, route, %strategy, "Intercepted request");
                Some(respond(strategy, &self.ctx, request).await)
            }
        }
    }

    /// Handle a page message. Returns the notification shown, if any.
    pub fn handle_message(&self, message: WorkerMessage) -> Option<Notification> {
        match message {
            WorkerMessage::ShowNotification(msg) => {
                let notification = Notification::from_message(msg);
                self.notifications.show(notification.clone());
                info!(tag = %notification.tag, title = %notification.title, "Showing notification");
                emit(
                    &self.events,
                    PlatformEvent::NotificationShown(notification.clone()),
                );
                Some(notification)
            }
            WorkerMessage::Unknown => {
                debug!("Ignoring unknown message");
                None
            }
        }
    }

    /// Close the clicked notification and bring up the page it points at:
    /// focus a window already showing it (or the root page), otherwise open
    /// a new one. The "open" action always opens a new window.
    pub fn handle_notification_click(
        &self,
        click: NotificationClick,
    ) -> Result<ClickOutcome, WorkerError> {
        let target = match self.notifications.close(&click.tag) {
            Some(notification) => notification.url,
            None => {
                debug!(tag = %click.tag, "Clicked notification is no longer shown");
                DEFAULT_URL.to_string()
            }
        };
        emit(
            &self.events,
            PlatformEvent::NotificationClosed {
                tag: click.tag.clone(),
            },
        );

        if click.action.as_deref() != Some(OPEN_ACTION) {
            let existing = self
                .clients
                .match_all(true)
                .into_iter()
                .find(|c| window_shows(&c.url, &target));
            if let Some(client) = existing {
                return Ok(ClickOutcome::Focused(self.clients.focus(&client.id)?));
            }
        }

        let url = self.config.resolve(&target)?;
        Ok(ClickOutcome::Opened(self.clients.open_window(url)))
    }
}

fn window_shows(url: &Url, target: &str) -> bool {
    let path = url.path();
    path == target || path == "/" || target == "/"
}
