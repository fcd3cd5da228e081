//! Serialized update application.
//!
//! Version numbers are assigned read-current-then-write-next, so two updates
//! for the same file must never be applied at the same time. The queue owns
//! the store on a single worker task and applies messages in arrival order,
//! whatever number of producers feed it.

use crate::dispatcher::{DispatchStats, UpdateDispatcher};
use crate::message::UpdateMessage;
use crate::store::VersionStore;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info};

enum QueueCommand {
    Update(UpdateMessage),
    Json(String),
    Flush(oneshot::Sender<DispatchStats>),
}

/// Handle for submitting updates to the worker. Cheap to clone.
#[derive(Clone)]
pub struct UpdateQueue {
    tx: mpsc::UnboundedSender<QueueCommand>,
}

impl UpdateQueue {
    /// Spawn the worker task.
    ///
    /// The worker stops once every handle is dropped and returns the store.
    pub fn spawn(store: VersionStore) -> (Self, JoinHandle<VersionStore>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(run(store, rx));
        (Self { tx }, handle)
    }

    /// Queue a typed update. Returns `false` if the worker has stopped.
    pub fn send(&self, message: UpdateMessage) -> bool {
        self.tx.send(QueueCommand::Update(message)).is_ok()
    }

    /// Queue a raw JSON payload. Returns `false` if the worker has stopped.
    pub fn send_json(&self, json: impl Into<String>) -> bool {
        self.tx.send(QueueCommand::Json(json.into())).is_ok()
    }

    /// Wait until everything queued so far has been applied.
    pub async fn flush(&self) -> Option<DispatchStats> {
        let (reply, rx) = oneshot::channel();
        self.tx.send(QueueCommand::Flush(reply)).ok()?;
        rx.await.ok()
    }
}

async fn run(mut store: VersionStore, mut rx: mpsc::UnboundedReceiver<QueueCommand>) -> VersionStore {
    let mut dispatcher = UpdateDispatcher::new();
    debug!("Update queue started");

    while let Some(command) = rx.recv().await {
        match command {
            QueueCommand::Update(message) => {
                dispatcher.dispatch(&mut store, &message);
            }
            QueueCommand::Json(json) => {
                dispatcher.dispatch_json(&mut store, &json);
            }
            QueueCommand::Flush(reply) => {
                let _ = reply.send(dispatcher.stats());
            }
        }
    }

    let stats = dispatcher.stats();
    info!(
        received = stats.received,
        versioned = stats.versioned,
        dropped = stats.dropped,
        "Update queue closed"
    );
    store
}
