//! Pages (windows) within the worker's scope.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use tracing::debug;
use url::Url;

use super::platform::{emit, PlatformEvent, PlatformSender};
use super::WorkerError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientType {
    Window,
    Worker,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Client {
    pub id: String,
    pub url: Url,
    pub client_type: ClientType,
    pub focused: bool,
    /// Whether the worker answers this client's requests.
    pub controlled: bool,
}

/// Every client the worker knows about.
pub struct Clients {
    clients: Mutex<Vec<Client>>,
    next_id: AtomicU64,
    // Set once the worker claims its scope; later windows start controlled.
    claimed: AtomicBool,
    events: PlatformSender,
}

impl Clients {
    pub fn new(events: PlatformSender) -> Self {
        Self {
            clients: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
            claimed: AtomicBool::new(false),
            events,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Client>> {
        self.clients.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn insert(&self, url: Url, client_type: ClientType) -> Client {
        let id = format!("client-{}", self.next_id.fetch_add(1, Ordering::Relaxed));
        let client = Client {
            id,
            url,
            client_type,
            focused: false,
            controlled: self.claimed.load(Ordering::Relaxed),
        };
        self.lock().push(client.clone());
        client
    }

    /// A page loaded before (or without) the worker. Returns its id.
    pub fn add_window(&self, url: Url) -> String {
        self.insert(url, ClientType::Window).id
    }

    pub fn remove(&self, id: &str) -> bool {
        let mut clients = self.lock();
        let before = clients.len();
        clients.retain(|c| c.id != id);
        clients.len() != before
    }

    pub fn get(&self, id: &str) -> Option<Client> {
        self.lock().iter().find(|c| c.id == id).cloned()
    }

    /// Point a client at a new URL, e.g. after in-app navigation.
    pub fn navigate(&self, id: &str, url: Url) -> Result<(), WorkerError> {
        let mut clients = self.lock();
        let client = clients
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| WorkerError::ClientNotFound(id.to_string()))?;
        client.url = url;
        Ok(())
    }

    /// Window clients, in creation order. Uncontrolled ones only when asked.
    pub fn match_all(&self, include_uncontrolled: bool) -> Vec<Client> {
        self.lock()
            .iter()
            .filter(|c| c.client_type == ClientType::Window)
            .filter(|c| include_uncontrolled || c.controlled)
            .cloned()
            .collect()
    }

    pub fn is_controlled(&self, id: &str) -> bool {
        self.lock().iter().any(|c| c.id == id && c.controlled)
    }

    pub fn focus(&self, id: &str) -> Result<Client, WorkerError> {
        let focused = {
            let mut clients = self.lock();
            if !clients.iter().any(|c| c.id == id) {
                return Err(WorkerError::ClientNotFound(id.to_string()));
            }
            let mut focused = None;
            for client in clients.iter_mut() {
                client.focused = client.id == id;
                if client.focused {
                    focused = Some(client.clone());
                }
            }
            focused.ok_or_else(|| WorkerError::ClientNotFound(id.to_string()))?
        };

        emit(
            &self.events,
            PlatformEvent::ClientFocused {
                client_id: focused.id.clone(),
                url: focused.url.clone(),
            },
        );
        Ok(focused)
    }

    /// Open a new window at `url`.
    pub fn open_window(&self, url: Url) -> Client {
        let client = self.insert(url, ClientType::Window);
        debug!(client = %client.id, url = %client.url, "Opened window");
        emit(
            &self.events,
            PlatformEvent::WindowOpened {
                client_id: client.id.clone(),
                url: client.url.clone(),
            },
        );
        client
    }

    /// Take control of every client in scope. Returns how many changed hands.
    pub fn claim(&self) -> usize {
        self.claimed.store(true, Ordering::Relaxed);
        let newly_controlled: Vec<String> = {
            let mut clients = self.lock();
            clients
                .iter_mut()
                .filter(|c| !c.controlled)
                .map(|c| {
                    c.controlled = true;
                    c.id.clone()
                })
                .collect()
        };

        for client_id in &newly_controlled {
            emit(
                &self.events,
                PlatformEvent::ControllerChanged {
                    client_id: client_id.clone(),
                },
            );
        }
        newly_controlled.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::worker::platform::platform_channel;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_claim_controls_existing_and_future_windows() {
        let (tx, mut rx) = platform_channel();
        let clients = Clients::new(tx);
        let id = clients.add_window(url("http://localhost/"));
        assert!(!clients.is_controlled(&id));
        assert!(clients.match_all(false).is_empty());

        assert_eq!(clients.claim(), 1);
        assert!(clients.is_controlled(&id));
        assert_eq!(
            rx.try_recv().unwrap(),
            PlatformEvent::ControllerChanged { client_id: id }
        );

        let opened = clients.open_window(url("http://localhost/pokemon/1"));
        assert!(opened.controlled);
        assert_eq!(clients.claim(), 0);
    }

    #[test]
    fn test_focus_is_exclusive() {
        let (tx, _rx) = platform_channel();
        let clients = Clients::new(tx);
        let a = clients.add_window(url("http://localhost/"));
        let b = clients.add_window(url("http://localhost/pokemon/4"));

        clients.focus(&a).unwrap();
        clients.focus(&b).unwrap();
        assert!(!clients.get(&a).unwrap().focused);
        assert!(clients.get(&b).unwrap().focused);
        assert!(matches!(
            clients.focus("client-99"),
            Err(WorkerError::ClientNotFound(_))
        ));
    }

    #[test]
    fn test_navigate_and_remove() {
        let (tx, _rx) = platform_channel();
        let clients = Clients::new(tx);
        let id = clients.add_window(url("http://localhost/"));
        clients.navigate(&id, url("http://localhost/pokemon/7")).unwrap();
        assert_eq!(clients.get(&id).unwrap().url.path(), "/pokemon/7");

        assert!(clients.remove(&id));
        assert!(clients.match_all(true).is_empty());
    }
}
