use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

use crate::storage::{KeyValueStore, StorageError, StorageKey};

enum WriteCommand {
    Save { key: StorageKey, json: String },
    Remove { key: StorageKey },
    Flush(oneshot::Sender<()>),
}

/// Fire-and-forget persistence.
///
/// Callers hand over serialized documents and return immediately; a
/// background task applies them to the store strictly in submission order,
/// so a later save of a key can never be overtaken by an earlier one.
/// Write failures are logged and dropped.
pub struct PersistenceWriter {
    sender: mpsc::UnboundedSender<WriteCommand>,
}

impl PersistenceWriter {
    /// Starts the writer task. Must be called from within a tokio runtime.
    pub fn spawn(storage: Arc<dyn KeyValueStore>) -> Self {
        let (sender, mut receiver) = mpsc::unbounded_channel::<WriteCommand>();

        tokio::spawn(async move {
            debug!("Persistence writer started");

            while let Some(command) = receiver.recv().await {
                match command {
                    WriteCommand::Save { key, json } => {
                        if let Err(e) = storage.save(key, json).await {
                            error!(key = %key, error = %e, "Persisting document failed");
                        }
                    }
                    WriteCommand::Remove { key } => {
                        if let Err(e) = storage.remove(key).await {
                            error!(key = %key, error = %e, "Removing document failed");
                        }
                    }
                    WriteCommand::Flush(done) => {
                        let _ = done.send(());
                    }
                }
            }

            info!("Persistence writer stopped");
        });

        Self { sender }
    }

    /// Queues `value` to be written under `key`
    pub fn save<T>(&self, key: StorageKey, value: &T)
    where
        T: Serialize + ?Sized,
    {
        let json = match serde_json::to_string(value) {
            Ok(json) => json,
            Err(source) => {
                let e = StorageError::Serialization { key, source };
                error!(error = %e, "Dropping write");
                return;
            }
        };

        if self.sender.send(WriteCommand::Save { key, json }).is_err() {
            warn!(key = %key, "Persistence writer has stopped, dropping write");
        }
    }

    pub fn remove(&self, key: StorageKey) {
        if self.sender.send(WriteCommand::Remove { key }).is_err() {
            warn!(key = %key, "Persistence writer has stopped, dropping removal");
        }
    }

    /// Waits until every write queued so far has been applied
    pub async fn flush(&self) -> Result<(), StorageError> {
        let (done, wait) = oneshot::channel();
        self.sender
            .send(WriteCommand::Flush(done))
            .map_err(|_| StorageError::WriterClosed)?;
        wait.await.map_err(|_| StorageError::WriterClosed)
    }
}
