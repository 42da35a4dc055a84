//! Ordered background persistence for the application state.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::models::{Activity, GridData, Theme};
use crate::remote::RemoteStore;
use crate::storage::StorageFacade;

/// A value to persist, captured at mutation time.
#[derive(Debug, Clone)]
pub enum Snapshot {
    Activities(Vec<Activity>),
    /// Months to replace; months not included are left as stored.
    Grid(GridData),
    Theme(Theme),
}

enum Command {
    Save(Snapshot),
    Flush(oneshot::Sender<()>),
}

/// Single worker draining snapshots in enqueue order.
pub(crate) struct PersistenceQueue {
    sender: Option<mpsc::UnboundedSender<Command>>,
    worker: Option<JoinHandle<()>>,
}

impl PersistenceQueue {
    /// Spawn the worker on the current Tokio runtime.
    pub(crate) fn spawn<R: RemoteStore>(storage: Arc<StorageFacade<R>>) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let worker = tokio::spawn(run(storage, receiver));
        Self {
            sender: Some(sender),
            worker: Some(worker),
        }
    }

    /// Queue a snapshot. Never blocks the caller.
    pub(crate) fn enqueue(&self, snapshot: Snapshot) {
        let Some(sender) = &self.sender else {
            tracing::warn!("Persistence queue closed; dropping snapshot");
            return;
        };
        if sender.send(Command::Save(snapshot)).is_err() {
            tracing::warn!("Persistence worker stopped; dropping snapshot");
        }
    }

    /// Wait until everything queued so far has been written.
    pub(crate) async fn flush(&self) {
        let Some(sender) = &self.sender else {
            return;
        };
        let (ack, done) = oneshot::channel();
        if sender.send(Command::Flush(ack)).is_ok() {
            let _ = done.await;
        }
    }

    /// Drain the queue and stop the worker.
    pub(crate) async fn close(&mut self) {
        self.sender.take();
        if let Some(worker) = self.worker.take() {
            if let Err(error) = worker.await {
                tracing::warn!("Persistence worker ended abnormally: {}", error);
            }
        }
    }
}

async fn run<R: RemoteStore>(
    storage: Arc<StorageFacade<R>>,
    mut receiver: mpsc::UnboundedReceiver<Command>,
) {
    while let Some(command) = receiver.recv().await {
        match command {
            Command::Save(snapshot) => save(&storage, snapshot).await,
            Command::Flush(ack) => {
                let _ = ack.send(());
            }
        }
    }
    tracing::debug!("Persistence worker stopped");
}

async fn save<R: RemoteStore>(storage: &StorageFacade<R>, snapshot: Snapshot) {
    let (what, result) = match &snapshot {
        Snapshot::Activities(activities) => {
            ("activities", storage.save_activities(activities).await)
        }
        Snapshot::Grid(grid) => ("grid data", storage.save_grid_data(grid).await),
        Snapshot::Theme(theme) => ("theme", storage.save_theme(*theme).await),
    };
    match result {
        Ok(()) => tracing::debug!("Persisted {}", what),
        Err(error) => tracing::warn!("Failed to persist {}: {}", what, error),
    }
}
