use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::backends::ProgressStore;
use crate::models::ProgressCheckpoint;

#[derive(Debug)]
enum QueueMessage {
    Checkpoint(ProgressCheckpoint),
    Flush(oneshot::Sender<()>),
}

/// Background writer for progress checkpoints.
///
/// The worker task is spawned on the runtime rather than inside any player
/// view, so a checkpoint submitted while a view is being torn down is still
/// delivered. Checkpoints reach the store one at a time in submission order.
/// The worker keeps draining after the last handle is dropped and exits once
/// the queue is empty.
#[derive(Debug, Clone)]
pub struct CheckpointQueue {
    sender: mpsc::UnboundedSender<QueueMessage>,
}

struct CheckpointQueueWorker {
    store: Arc<dyn ProgressStore>,
    receiver: mpsc::UnboundedReceiver<QueueMessage>,
}

impl CheckpointQueue {
    pub fn spawn(store: Arc<dyn ProgressStore>) -> (Self, JoinHandle<()>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let worker = CheckpointQueueWorker { store, receiver };
        let handle = tokio::spawn(worker.run());
        (Self { sender }, handle)
    }

    /// Queue a checkpoint without waiting for delivery.
    pub fn submit(&self, checkpoint: ProgressCheckpoint) -> bool {
        match self.sender.send(QueueMessage::Checkpoint(checkpoint)) {
            Ok(()) => true,
            Err(mpsc::error::SendError(message)) => {
                warn!("Checkpoint queue is closed, dropping {:?}", message);
                false
            }
        }
    }

    /// Resolves once every checkpoint submitted before this call was handled.
    pub async fn flush(&self) {
        let (tx, rx) = oneshot::channel();
        if self.sender.send(QueueMessage::Flush(tx)).is_ok() {
            let _ = rx.await;
        }
    }
}

impl CheckpointQueueWorker {
    async fn run(mut self) {
        while let Some(message) = self.receiver.recv().await {
            match message {
                QueueMessage::Checkpoint(checkpoint) => self.deliver(checkpoint).await,
                QueueMessage::Flush(done) => {
                    let _ = done.send(());
                }
            }
        }
        debug!("Checkpoint queue drained, worker exiting");
    }

    async fn deliver(&self, checkpoint: ProgressCheckpoint) {
        match self.store.save_progress(&checkpoint).await {
            Ok(()) => debug!(
                "Saved progress for {}: {}s (finished: {}, seq: {}, read at {}, {:?})",
                checkpoint.title_id,
                checkpoint.position_seconds,
                checkpoint.finished,
                checkpoint.sequence,
                checkpoint.read_at.format("%H:%M:%S%.3f"),
                checkpoint.reason
            ),
            Err(e) => warn!(
                "Failed to save progress for {} at {}s: {}",
                checkpoint.title_id, checkpoint.position_seconds, e
            ),
        }
    }
}
