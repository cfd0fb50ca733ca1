use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::{CacheWorker, NotificationClick, WorkerError, WorkerMessage, WorkerState};

enum WorkerEvent {
    Message(WorkerMessage),
    NotificationClick(NotificationClick),
}

/// A running worker. Messages and clicks are queued and handled on the
/// worker's own task; nothing is ever answered back through the handle.
pub struct WorkerHandle {
    worker: Arc<CacheWorker>,
    tx: mpsc::UnboundedSender<WorkerEvent>,
    task: JoinHandle<()>,
}

/// Install and activate `worker`, then start its event loop.
///
/// Activation happens right after install (skip waiting), so the returned
/// handle's worker already controls every known client.
pub async fn register(worker: CacheWorker) -> Result<WorkerHandle, WorkerError> {
    worker.install().await?;
    worker.skip_waiting()?;

    let worker = Arc::new(worker);
    let (tx, rx) = mpsc::unbounded_channel();
    let task = tokio::spawn(run(worker.clone(), rx));

    Ok(WorkerHandle { worker, tx, task })
}

async fn run(worker: Arc<CacheWorker>, mut rx: mpsc::UnboundedReceiver<WorkerEvent>) {
    while let Some(event) = rx.recv().await {
        let worker = worker.clone();
        tokio::spawn(async move {
            match event {
                WorkerEvent::Message(message) => {
                    worker.handle_message(message);
                }
                WorkerEvent::NotificationClick(click) => {
                    if let Err(e) = worker.handle_notification_click(click) {
                        warn!(error = %e, "Notification click failed");
                    }
                }
            }
        });
    }
    debug!("Worker event loop stopped");
}

impl WorkerHandle {
    pub fn worker(&self) -> &Arc<CacheWorker> {
        &self.worker
    }

    pub fn state(&self) -> WorkerState {
        self.worker.state()
    }

    pub fn post_message(&self, message: WorkerMessage) -> Result<(), WorkerError> {
        self.tx
            .send(WorkerEvent::Message(message))
            .map_err(|_| WorkerError::Closed)
    }

    pub fn notification_click(&self, click: NotificationClick) -> Result<(), WorkerError> {
        self.tx
            .send(WorkerEvent::NotificationClick(click))
            .map_err(|_| WorkerError::Closed)
    }
}

impl Drop for WorkerHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}
