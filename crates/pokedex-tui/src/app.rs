//! Application state management for the Pokédex TUI.
//!
//! This module contains the core `App` struct: UI state, the catalog view
//! state, the caching worker and the background fetch channel.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use url::Url;

use pokedex_core::api::{ApiError, PokeApiClient, ITEMS_PER_PAGE};
use pokedex_core::cache::{CacheStorage, CachedData, DiskCacheStorage};
use pokedex_core::catalog::{CatalogState, Effect, LoadTarget, Message};
use pokedex_core::models::{PokemonPage, PokemonSummary};
use pokedex_core::net::{ControlledFetcher, Fetch, HttpFetcher, Request, ResponseSource};
use pokedex_core::notify::{
    NotificationTrigger, Permission, TriggerOutcome, NO_ACTIVE_WORKER, PERMISSION_ALERT,
    UNSUPPORTED_ALERT,
};
use pokedex_core::worker::config::RUNTIME_CACHE;
use pokedex_core::worker::{
    platform_channel, register, CacheWorker, Clients, Notification, NotificationClick,
    PlatformEvent, PlatformReceiver, PlatformSender, WorkerConfig, WorkerError, WorkerHandle,
};

use crate::assets::{self, AppManifest};
use crate::config::Config;
use crate::utils::{png_dimensions, pokemon_id_from_path};

// ============================================================================
// Constants
// ============================================================================

/// Buffer size for the background fetch channel.
/// A page, the index, a sprite and the manifest can be in flight at once.
const CHANNEL_BUFFER_SIZE: usize = 32;

/// Cards per grid row. Five rows of four cover a full page.
pub const GRID_COLUMNS: usize = 4;

/// Shown until the manifest has been read.
const DEFAULT_TITLE: &str = "Pokédex";

// ============================================================================
// UI State Types
// ============================================================================

/// Overall application state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Normal,
    Searching,
    ShowingHelp,
    ConfirmingQuit,
    PromptingPermission,
    ShowingAlert,
    ShowingNotification,
    Quitting,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpriteInfo {
    pub bytes: usize,
    pub dimensions: Option<(u32, u32)>,
    pub source: ResponseSource,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpriteStatus {
    Loading,
    Loaded(SpriteInfo),
    Failed(String),
}

// ============================================================================
// Background Task Results
// ============================================================================

/// Results sent back from spawned fetch tasks.
enum FetchResult {
    Page {
        offset: u64,
        result: Result<PokemonPage, ApiError>,
    },
    Index(Result<Vec<PokemonSummary>, ApiError>),
    Sprite {
        id: String,
        result: Result<SpriteInfo, ApiError>,
    },
    Manifest(Result<AppManifest, String>),
}

// ============================================================================
// Main Application Struct
// ============================================================================

pub struct App {
    pub config: Config,
    config_path: PathBuf,

    // UI State
    pub state: AppState,
    pub catalog: CatalogState,
    pub selection: usize,
    pub search_input: String,
    pub title: String,
    pub sprites: HashMap<String, SpriteStatus>,
    pub alert: Option<String>,
    pub notification: Option<Notification>,
    /// Whether the popup came from the worker (clicks go back to it) or
    /// from the in-page fallback.
    notification_via_worker: bool,
    pub status_message: Option<String>,
    /// When the current listing page was stored in the runtime cache.
    pub page_cache: Option<CachedData<()>>,
    pub trigger: NotificationTrigger,
    pending_notification: Option<PokemonSummary>,
    pending_select: Option<String>,

    // Services
    api: PokeApiClient,
    network: Arc<HttpFetcher>,
    fetcher: Arc<ControlledFetcher>,
    caches: Arc<DiskCacheStorage>,
    worker: Option<WorkerHandle>,
    pub worker_error: Option<String>,
    clients: Arc<Clients>,
    client_id: String,
    origin: Url,

    // Background channels
    platform_rx: PlatformReceiver,
    fetch_tx: mpsc::Sender<FetchResult>,
    fetch_rx: mpsc::Receiver<FetchResult>,
}

impl App {
    /// Build the app, register the caching worker and start the initial
    /// fetches. A worker that fails to register leaves the page running
    /// uncontrolled.
    pub async fn new(config: Config, config_path: PathBuf, cache_root: &Path) -> Result<Self> {
        let origin = Url::parse(&config.app_origin)
            .with_context(|| format!("Invalid app origin {}", config.app_origin))?;

        let network = Arc::new(
            HttpFetcher::new()?.with_local_origin(origin.clone(), assets::bundled()),
        );
        network.set_offline(config.offline_mode);

        let caches = Arc::new(DiskCacheStorage::new(cache_root.join("caches"))?);
        let (events_tx, platform_rx) = platform_channel();
        let clients = Arc::new(Clients::new(events_tx.clone()));
        let client_id = clients.add_window(origin.clone());

        let fetcher = Arc::new(ControlledFetcher::new(network.clone(), client_id.clone()));
        let api = PokeApiClient::with_bases(
            fetcher.clone(),
            &config.api_base_url,
            &config.sprite_base_url,
        );

        let (worker, worker_error) = match Self::register_worker(
            &origin,
            caches.clone(),
            network.clone(),
            clients.clone(),
            events_tx,
        )
        .await
        {
            Ok(handle) => {
                info!(state = %handle.state(), "Caching worker registered");
                fetcher.set_worker(handle.worker().clone());
                (Some(handle), None)
            }
            Err(e) => {
                error!(error = %e, "Worker registration failed");
                (None, Some(e.to_string()))
            }
        };

        let trigger = NotificationTrigger::new(
            config.notifications_enabled,
            config.notification_permission,
            config.sprite_base_url.clone(),
        );
        let (catalog, effects) = CatalogState::new();
        let (fetch_tx, fetch_rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);

        let app = Self {
            config,
            config_path,

            state: AppState::Normal,
            catalog,
            selection: 0,
            search_input: String::new(),
            title: DEFAULT_TITLE.to_string(),
            sprites: HashMap::new(),
            alert: None,
            notification: None,
            notification_via_worker: false,
            status_message: Some("Loading...".to_string()),
            page_cache: None,
            trigger,
            pending_notification: None,
            pending_select: None,

            api,
            network,
            fetcher,
            caches,
            worker,
            worker_error,
            clients,
            client_id,
            origin,

            platform_rx,
            fetch_tx,
            fetch_rx,
        };

        app.run_effects(effects);
        app.load_manifest();
        Ok(app)
    }

    async fn register_worker(
        origin: &Url,
        caches: Arc<DiskCacheStorage>,
        network: Arc<HttpFetcher>,
        clients: Arc<Clients>,
        events: PlatformSender,
    ) -> Result<WorkerHandle, WorkerError> {
        let worker = CacheWorker::new(
            WorkerConfig::new(origin.clone()),
            caches,
            network,
            clients,
            events,
        )?;
        register(worker).await
    }

    // =========================================================================
    // Status
    // =========================================================================

    pub fn is_offline(&self) -> bool {
        self.network.is_offline()
    }

    pub fn worker_label(&self) -> String {
        match &self.worker {
            Some(handle) if self.fetcher.controller().is_some() => {
                format!("worker {} (controlling)", handle.state())
            }
            Some(handle) => format!("worker {}", handle.state()),
            None => "no worker".to_string(),
        }
    }

    fn save_config(&self) {
        if let Err(e) = self.config.save_to(&self.config_path) {
            warn!(error = %e, "Failed to save config");
        }
    }

    // =========================================================================
    // Background Fetches
    // =========================================================================

    fn run_effects(&self, effects: Vec<Effect>) {
        for effect in effects {
            let api = self.api.clone();
            let tx = self.fetch_tx.clone();
            match effect {
                Effect::FetchPage { limit, offset } => {
                    debug!(limit, offset, "Fetching page");
                    tokio::spawn(async move {
                        let result = api.fetch_page(limit, offset).await;
                        let _ = tx.send(FetchResult::Page { offset, result }).await;
                    });
                }
                Effect::FetchIndex => {
                    debug!("Fetching name index");
                    tokio::spawn(async move {
                        let result = api.fetch_index().await;
                        let _ = tx.send(FetchResult::Index(result)).await;
                    });
                }
            }
        }
    }

    /// Boot the shell the way a browser would: navigate to the origin, then
    /// read the manifest for the title.
    fn load_manifest(&self) {
        let fetcher = self.fetcher.clone();
        let origin = self.origin.clone();
        let tx = self.fetch_tx.clone();

        tokio::spawn(async move {
            let result = async {
                let shell = fetcher
                    .fetch(&Request::navigate(origin.clone()))
                    .await
                    .map_err(|e| e.to_string())?;
                debug!(status = shell.status.as_u16(), source = ?shell.source, "App shell loaded");

                let url = origin.join("/manifest.json").map_err(|e| e.to_string())?;
                let manifest = fetcher
                    .fetch(&Request::get(url))
                    .await
                    .map_err(|e| e.to_string())?;
                manifest.json::<AppManifest>().map_err(|e| e.to_string())
            }
            .await;
            let _ = tx.send(FetchResult::Manifest(result)).await;
        });
    }

    /// Fetch the selected entry's sprite, once.
    pub fn ensure_sprite(&mut self) {
        let Some(entry) = self.selected_entry() else {
            return;
        };
        let id = entry.id().to_string();
        if id.is_empty() || self.sprites.contains_key(&id) {
            return;
        }

        self.sprites.insert(id.clone(), SpriteStatus::Loading);
        let api = self.api.clone();
        let tx = self.fetch_tx.clone();
        tokio::spawn(async move {
            let result = api.fetch_sprite(&id).await.map(|resp| SpriteInfo {
                bytes: resp.body.len(),
                dimensions: png_dimensions(&resp.body),
                source: resp.source,
            });
            let _ = tx.send(FetchResult::Sprite { id, result }).await;
        });
    }

    /// Apply worker events, then completed fetches.
    pub fn check_background_tasks(&mut self) {
        let mut events = Vec::new();
        while let Ok(event) = self.platform_rx.try_recv() {
            events.push(event);
        }
        for event in events {
            self.handle_platform_event(event);
        }

        let mut results = Vec::new();
        while let Ok(result) = self.fetch_rx.try_recv() {
            results.push(result);
        }
        for result in results {
            self.process_fetch_result(result);
        }
    }

    fn process_fetch_result(&mut self, result: FetchResult) {
        match result {
            FetchResult::Page { offset, result } => match result {
                Ok(page) => {
                    self.dispatch(Message::PageLoaded {
                        offset,
                        count: page.count,
                        results: page.results,
                    });
                    if self.shows_offset(offset) {
                        self.page_cache = self.cached_page(offset);
                        self.status_message = None;
                    }
                    self.select_pending();
                }
                Err(e) => {
                    self.status_message = Some(user_message(&e));
                    self.dispatch(Message::LoadFailed {
                        what: LoadTarget::Page,
                        error: e.to_string(),
                    });
                }
            },
            FetchResult::Index(result) => match result {
                Ok(index) => {
                    info!(entries = index.len(), "Name index loaded");
                    self.dispatch(Message::IndexLoaded(index));
                    self.select_pending();
                }
                Err(e) => {
                    self.dispatch(Message::LoadFailed {
                        what: LoadTarget::Index,
                        error: e.to_string(),
                    });
                }
            },
            FetchResult::Sprite { id, result } => {
                let status = match result {
                    Ok(info) => SpriteStatus::Loaded(info),
                    Err(e) => {
                        debug!(id = %id, error = %e, "Sprite unavailable");
                        SpriteStatus::Failed(user_message(&e))
                    }
                };
                self.sprites.insert(id, status);
            }
            FetchResult::Manifest(result) => match result {
                Ok(manifest) => self.title = manifest.name,
                Err(e) => warn!(error = %e, "Failed to load manifest"),
            },
        }
    }

    /// Whether the grid currently shows the server page at `offset`.
    fn shows_offset(&self, offset: u64) -> bool {
        !self.catalog.is_searching() && (self.catalog.page() - 1) * ITEMS_PER_PAGE == offset
    }

    fn cached_page(&self, offset: u64) -> Option<CachedData<()>> {
        let url = self.api.page_url(ITEMS_PER_PAGE, offset).ok()?;
        match self.caches.match_in(RUNTIME_CACHE, url.as_str()) {
            Ok(hit) => hit.map(|cached| CachedData {
                data: (),
                cached_at: cached.cached_at,
            }),
            Err(e) => {
                debug!(error = %e, "Cache lookup failed");
                None
            }
        }
    }

    // =========================================================================
    // Catalog Navigation
    // =========================================================================

    /// Send a message to the catalog and run what it asks for.
    pub fn dispatch(&mut self, msg: Message) {
        let effects = self.catalog.update(msg);
        self.run_effects(effects);

        let len = self.catalog.visible().entries.len();
        if self.selection >= len {
            self.selection = len.saturating_sub(1);
        }
        self.ensure_sprite();
    }

    pub fn selected_entry(&self) -> Option<PokemonSummary> {
        self.catalog.visible().entries.get(self.selection).cloned()
    }

    fn change_page(&mut self, msg: Message) {
        let before = self.catalog.page();
        self.dispatch(msg);
        if self.catalog.page() != before {
            self.selection = 0;
            self.page_cache = None;
            self.ensure_sprite();
        }
    }

    pub fn next_page(&mut self) {
        self.change_page(Message::NextPage);
    }

    pub fn prev_page(&mut self) {
        self.change_page(Message::PrevPage);
    }

    pub fn go_to_page(&mut self, page: u64) {
        self.change_page(Message::GoToPage(page));
    }

    pub fn move_left(&mut self) {
        if self.selection % GRID_COLUMNS == 0 {
            self.prev_page();
        } else {
            self.selection -= 1;
            self.ensure_sprite();
        }
    }

    pub fn move_right(&mut self) {
        let len = self.catalog.visible().entries.len();
        if self.selection % GRID_COLUMNS == GRID_COLUMNS - 1 || self.selection + 1 >= len {
            self.next_page();
        } else {
            self.selection += 1;
            self.ensure_sprite();
        }
    }

    pub fn move_up(&mut self) {
        if self.selection >= GRID_COLUMNS {
            self.selection -= GRID_COLUMNS;
            self.ensure_sprite();
        }
    }

    pub fn move_down(&mut self) {
        let len = self.catalog.visible().entries.len();
        if self.selection + GRID_COLUMNS < len {
            self.selection += GRID_COLUMNS;
            self.ensure_sprite();
        }
    }

    pub fn reload(&mut self) {
        self.sprites
            .retain(|_, status| !matches!(status, SpriteStatus::Failed(_)));
        self.status_message = Some("Reloading...".to_string());
        self.dispatch(Message::Reload);
    }

    // =========================================================================
    // Search
    // =========================================================================

    pub fn start_search(&mut self) {
        self.search_input = self.catalog.search().to_string();
        self.state = AppState::Searching;
    }

    fn apply_search(&mut self) {
        self.selection = 0;
        self.dispatch(Message::SearchChanged(self.search_input.clone()));
    }

    pub fn search_push(&mut self, c: char) {
        self.search_input.push(c);
        self.apply_search();
    }

    pub fn search_pop(&mut self) {
        if self.search_input.pop().is_some() {
            self.apply_search();
        }
    }

    /// Leave search editing, keeping the term.
    pub fn confirm_search(&mut self) {
        self.state = AppState::Normal;
    }

    pub fn clear_search(&mut self) {
        self.state = AppState::Normal;
        if self.search_input.is_empty() && self.catalog.search().is_empty() {
            return;
        }
        self.search_input.clear();
        self.apply_search();
    }

    // =========================================================================
    // Offline Mode
    // =========================================================================

    pub fn toggle_offline(&mut self) {
        let offline = !self.network.is_offline();
        self.network.set_offline(offline);
        self.config.offline_mode = offline;
        self.save_config();

        info!(offline, "Offline mode toggled");
        self.status_message = Some(if offline {
            "Offline: answering from cache".to_string()
        } else {
            "Back online".to_string()
        });
    }

    // =========================================================================
    // Notifications
    // =========================================================================

    /// Ask for permission if it was never asked; otherwise report it.
    pub fn activate_notifications(&mut self) {
        match self.trigger.permission() {
            Permission::Default => {
                self.pending_notification = None;
                self.state = AppState::PromptingPermission;
            }
            permission => {
                info!(?permission, "Notification permission");
                self.status_message =
                    Some(format!("Notifications {}", permission_label(permission)));
            }
        }
    }

    /// Notify about the selected entry.
    pub fn send_notification(&mut self) {
        let Some(entry) = self.selected_entry() else {
            self.status_message = Some("Nothing selected".to_string());
            return;
        };
        let outcome = self.trigger.send(&entry, self.worker.as_ref());
        self.apply_trigger_outcome(entry, outcome);
    }

    fn apply_trigger_outcome(&mut self, entry: PokemonSummary, outcome: TriggerOutcome) {
        match outcome {
            TriggerOutcome::Unsupported => self.show_alert(UNSUPPORTED_ALERT),
            TriggerOutcome::PermissionRequired => {
                self.pending_notification = Some(entry);
                self.state = AppState::PromptingPermission;
            }
            TriggerOutcome::Denied => self.show_alert(PERMISSION_ALERT),
            TriggerOutcome::Posted(_) => {
                self.status_message =
                    Some(format!("Notification sent for {}", entry.display_name()));
            }
            TriggerOutcome::Fallback(notification) => self.show_notification(notification, false),
            TriggerOutcome::NoActiveWorker => {
                self.status_message = Some(NO_ACTIVE_WORKER.to_string());
            }
        }
    }

    /// The user answered the permission prompt. `None` means it was
    /// dismissed without an answer.
    pub fn answer_permission(&mut self, granted: Option<bool>) {
        self.state = AppState::Normal;
        if let Some(granted) = granted {
            self.config.notification_permission = self.trigger.resolve_permission(granted);
            self.save_config();
        }

        match self.pending_notification.take() {
            Some(entry) => {
                let outcome = self.trigger.send(&entry, self.worker.as_ref());
                // A dismissed prompt is not a grant.
                let outcome = match outcome {
                    TriggerOutcome::PermissionRequired => TriggerOutcome::Denied,
                    other => other,
                };
                self.apply_trigger_outcome(entry, outcome);
            }
            None => {
                self.status_message = Some(format!(
                    "Notifications {}",
                    permission_label(self.trigger.permission())
                ));
            }
        }
    }

    pub fn show_alert(&mut self, message: &str) {
        self.alert = Some(message.to_string());
        self.state = AppState::ShowingAlert;
    }

    pub fn dismiss_alert(&mut self) {
        self.alert = None;
        self.state = AppState::Normal;
    }

    fn show_notification(&mut self, notification: Notification, via_worker: bool) {
        self.notification = Some(notification);
        self.notification_via_worker = via_worker;
        self.state = AppState::ShowingNotification;
    }

    /// Click the popup, or one of its actions.
    pub fn click_notification(&mut self, action: Option<&str>) {
        let Some(notification) = self.notification.take() else {
            return;
        };
        self.state = AppState::Normal;

        if self.notification_via_worker {
            if let Some(handle) = &self.worker {
                let click = NotificationClick {
                    tag: notification.tag,
                    action: action.map(str::to_string),
                };
                if let Err(e) = handle.notification_click(click) {
                    warn!(error = %e, "Failed to deliver notification click");
                }
                return;
            }
        }

        // In-page fallback: nobody else routes the click.
        match self.origin.join(&notification.url) {
            Ok(url) => self.navigate_to(&url),
            Err(e) => warn!(error = %e, url = %notification.url, "Bad notification URL"),
        }
    }

    pub fn dismiss_notification(&mut self) {
        let Some(notification) = self.notification.take() else {
            return;
        };
        self.state = AppState::Normal;
        if let Some(handle) = &self.worker {
            handle.worker().notifications().close(&notification.tag);
        }
    }

    // =========================================================================
    // Worker Events
    // =========================================================================

    fn handle_platform_event(&mut self, event: PlatformEvent) {
        debug!(?event, "Platform event");
        match event {
            PlatformEvent::NotificationShown(notification) => {
                self.show_notification(notification, true);
            }
            PlatformEvent::NotificationClosed { tag } => {
                if self.notification.as_ref().is_some_and(|n| n.tag == tag) {
                    self.notification = None;
                    if self.state == AppState::ShowingNotification {
                        self.state = AppState::Normal;
                    }
                }
            }
            PlatformEvent::ClientFocused { client_id, url } => {
                if client_id == self.client_id {
                    self.navigate_to(&url);
                }
            }
            PlatformEvent::WindowOpened { client_id, url } => {
                // A terminal has a single window: show the page here instead.
                info!(url = %url, "Opening window in place");
                self.clients.remove(&client_id);
                self.navigate_to(&url);
                self.status_message = Some(format!("Opened {}", url.path()));
            }
            PlatformEvent::ControllerChanged { client_id } => {
                if client_id == self.client_id {
                    self.status_message = Some("Caching worker now controls this page".to_string());
                }
            }
        }
    }

    /// Show `url` in this window: an entry path selects that entry,
    /// switching pages when needed.
    pub fn navigate_to(&mut self, url: &Url) {
        if let Err(e) = self.clients.navigate(&self.client_id, url.clone()) {
            debug!(error = %e, "Failed to record navigation");
        }

        let Some(id) = pokemon_id_from_path(url.path()).map(str::to_string) else {
            return;
        };
        self.pending_select = Some(id.clone());
        if self.select_pending() {
            return;
        }

        let position = self.catalog.index().iter().position(|p| p.id() == id);
        match position {
            Some(pos) => {
                if self.catalog.is_searching() {
                    self.search_input.clear();
                    self.dispatch(Message::SearchChanged(String::new()));
                }
                let page = pos as u64 / ITEMS_PER_PAGE + 1;
                self.go_to_page(page);
                self.status_message = Some(format!("Showing #{}", id));
            }
            None => {
                self.status_message = Some(format!("#{} is not loaded yet", id));
            }
        }
    }

    /// Select the entry a navigation asked for, once it is on screen.
    fn select_pending(&mut self) -> bool {
        let Some(id) = self.pending_select.clone() else {
            return false;
        };
        let position = self
            .catalog
            .visible()
            .entries
            .iter()
            .position(|p| p.id() == id);
        match position {
            Some(idx) => {
                self.selection = idx;
                self.pending_select = None;
                self.ensure_sprite();
                true
            }
            None => false,
        }
    }
}

fn permission_label(permission: Permission) -> &'static str {
    match permission {
        Permission::Default => "not yet allowed",
        Permission::Granted => "allowed",
        Permission::Denied => "blocked",
    }
}

/// Simplify common errors for the status bar.
fn user_message(error: &ApiError) -> String {
    if error.is_offline() {
        "Offline and not cached".to_string()
    } else if matches!(error, ApiError::RateLimited) {
        "Server is busy. Please wait a moment and try again.".to_string()
    } else if matches!(error, ApiError::Network(_)) {
        "Network error. Check your connection.".to_string()
    } else {
        format!("Error: {}", error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;

    fn pikachu() -> PokemonSummary {
        PokemonSummary::new("pikachu", "https://pokeapi.co/api/v2/pokemon/25/")
    }

    async fn offline_app(permission: Permission) -> (TempDir, App) {
        let dir = TempDir::new().unwrap();
        let config = Config {
            offline_mode: true,
            notification_permission: permission,
            ..Config::default()
        };
        let app = App::new(config, dir.path().join("config.json"), dir.path())
            .await
            .unwrap();
        (dir, app)
    }

    /// Pump background results until `done` holds or a second passes.
    async fn pump_until(app: &mut App, done: impl Fn(&App) -> bool) {
        for _ in 0..100 {
            app.check_background_tasks();
            if done(app) {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    fn load_page(app: &mut App, results: Vec<PokemonSummary>) {
        app.dispatch(Message::PageLoaded {
            offset: 0,
            count: results.len() as u64,
            results,
        });
    }

    #[tokio::test]
    async fn test_worker_controls_page_offline() {
        let (_dir, mut app) = offline_app(Permission::Default).await;
        assert!(app.worker_error.is_none());
        assert!(app.worker_label().contains("controlling"));
        assert!(app.is_offline());

        pump_until(&mut app, |a| !a.catalog.is_loading()).await;
        assert!(!app.catalog.is_loading());
        assert_eq!(app.status_message.as_deref(), Some("Offline and not cached"));

        // The shell was pre-cached from the bundled assets.
        let shell = app
            .fetcher
            .fetch(&Request::navigate(
                Url::parse("http://localhost:5173/pokemon/25").unwrap(),
            ))
            .await
            .unwrap();
        assert_eq!(shell.source, ResponseSource::Cache);
        assert!(shell.text().contains("<div id=\"root\">"));
    }

    #[tokio::test]
    async fn test_stale_page_leaves_status_alone() {
        let (_dir, mut app) = offline_app(Permission::Default).await;
        pump_until(&mut app, |a| !a.catalog.is_loading()).await;
        assert_eq!(app.status_message.as_deref(), Some("Offline and not cached"));

        app.process_fetch_result(FetchResult::Page {
            offset: 40,
            result: Ok(PokemonPage {
                count: 1,
                results: vec![pikachu()],
            }),
        });
        assert_eq!(app.status_message.as_deref(), Some("Offline and not cached"));
        assert!(app.page_cache.is_none());
        assert!(app.catalog.visible().entries.is_empty());

        app.process_fetch_result(FetchResult::Page {
            offset: 0,
            result: Ok(PokemonPage {
                count: 1,
                results: vec![pikachu()],
            }),
        });
        assert!(app.status_message.is_none());
        assert_eq!(app.catalog.visible().entries, vec![pikachu()]);
    }

    #[tokio::test]
    async fn test_send_notification_round_trip() {
        let (_dir, mut app) = offline_app(Permission::Granted).await;
        load_page(&mut app, vec![pikachu()]);

        app.send_notification();
        pump_until(&mut app, |a| a.notification.is_some()).await;
        assert_eq!(app.state, AppState::ShowingNotification);
        let shown = app.notification.clone().unwrap();
        assert_eq!(shown.title, "Pokémon!");
        assert_eq!(shown.tag, "pokedex-25");

        // Our window is at "/", so the click focuses it.
        app.click_notification(None);
        assert_eq!(app.state, AppState::Normal);
        pump_until(&mut app, |a| {
            a.clients
                .get(&a.client_id)
                .is_some_and(|c| c.focused)
        })
        .await;
        assert!(app.clients.get(&app.client_id).unwrap().focused);
        assert!(app.notification.is_none());
    }

    #[tokio::test]
    async fn test_permission_prompt_then_send() {
        let (dir, mut app) = offline_app(Permission::Default).await;
        load_page(&mut app, vec![pikachu()]);

        app.send_notification();
        assert_eq!(app.state, AppState::PromptingPermission);

        app.answer_permission(Some(true));
        assert_eq!(app.config.notification_permission, Permission::Granted);
        let saved = Config::load_from(&dir.path().join("config.json")).unwrap();
        assert_eq!(saved.notification_permission, Permission::Granted);
        assert!(app.status_message.as_deref().unwrap().contains("Pikachu"));
    }

    #[tokio::test]
    async fn test_dismissed_prompt_alerts() {
        let (_dir, mut app) = offline_app(Permission::Default).await;
        load_page(&mut app, vec![pikachu()]);

        app.send_notification();
        app.answer_permission(None);
        assert_eq!(app.state, AppState::ShowingAlert);
        assert_eq!(app.alert.as_deref(), Some(PERMISSION_ALERT));
        assert_eq!(app.trigger.permission(), Permission::Default);
    }

    #[tokio::test]
    async fn test_disabled_notifications_alert() {
        let dir = TempDir::new().unwrap();
        let config = Config {
            offline_mode: true,
            notifications_enabled: false,
            ..Config::default()
        };
        let mut app = App::new(config, dir.path().join("config.json"), dir.path())
            .await
            .unwrap();
        load_page(&mut app, vec![pikachu()]);

        app.send_notification();
        assert_eq!(app.alert.as_deref(), Some(UNSUPPORTED_ALERT));
    }

    #[tokio::test]
    async fn test_grid_navigation_and_selection_clamp() {
        let (_dir, mut app) = offline_app(Permission::Default).await;
        let entries: Vec<_> = (1..=6)
            .map(|i| {
                PokemonSummary::new(
                    format!("mon-{}", i),
                    format!("https://pokeapi.co/api/v2/pokemon/{}/", i),
                )
            })
            .collect();
        load_page(&mut app, entries);

        app.move_down();
        assert_eq!(app.selection, GRID_COLUMNS);
        app.move_right();
        assert_eq!(app.selection, GRID_COLUMNS + 1);
        app.move_up();
        assert_eq!(app.selection, 1);
        app.move_left();
        assert_eq!(app.selection, 0);
        // Single page: moving past the edge stays put.
        app.move_left();
        assert_eq!(app.selection, 0);
        assert_eq!(app.catalog.page(), 1);
    }

    #[tokio::test]
    async fn test_navigate_selects_entry() {
        let (_dir, mut app) = offline_app(Permission::Default).await;
        load_page(
            &mut app,
            vec![
                PokemonSummary::new("bulbasaur", "https://pokeapi.co/api/v2/pokemon/1/"),
                pikachu(),
            ],
        );

        app.navigate_to(&Url::parse("http://localhost:5173/pokemon/25").unwrap());
        assert_eq!(app.selection, 1);
        assert_eq!(
            app.clients.get(&app.client_id).unwrap().url.path(),
            "/pokemon/25"
        );
    }

    #[tokio::test]
    async fn test_search_editing() {
        let (_dir, mut app) = offline_app(Permission::Default).await;
        app.dispatch(Message::IndexLoaded(vec![
            PokemonSummary::new("bulbasaur", "https://pokeapi.co/api/v2/pokemon/1/"),
            pikachu(),
        ]));

        app.start_search();
        for c in "pika".chars() {
            app.search_push(c);
        }
        assert_eq!(app.catalog.visible().match_count, Some(1));
        app.confirm_search();
        assert_eq!(app.state, AppState::Normal);
        assert_eq!(app.catalog.search(), "pika");

        app.clear_search();
        assert!(!app.catalog.is_searching());
    }
}
