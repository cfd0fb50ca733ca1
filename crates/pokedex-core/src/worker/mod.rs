//! The offline caching worker.
//!
//! A [`CacheWorker`] sits between the page and the network. Once registered
//! it pre-caches the app shell, purges stores left by older versions, takes
//! control of open pages and answers their requests with a per-route caching
//! strategy. It also shows notifications on request and routes clicks on
//! them back to a window.

pub mod clients;
pub mod config;
pub mod error;
pub mod messages;
pub mod notifications;
pub mod platform;
pub mod register;
pub mod router;
pub mod service;
pub mod strategy;

pub use clients::{Client, ClientType, Clients};
pub use config::WorkerConfig;
pub use error::WorkerError;
pub use messages::{NotificationClick, ShowNotification, WorkerMessage};
pub use notifications::{Notification, NotificationAction, NotificationCenter};
pub use platform::{platform_channel, PlatformEvent, PlatformReceiver, PlatformSender};
pub use register::{register, WorkerHandle};
pub use router::{Decision, Route, Router, Strategy};
pub use service::{CacheWorker, ClickOutcome, WorkerState};
pub use strategy::{FetchOutcome, StrategyContext, OFFLINE_BODY};
