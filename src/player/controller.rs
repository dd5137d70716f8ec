use anyhow::Result;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use super::progress_tracker::{ProgressTracker, TrackerSnapshot};

/// Media element events and queries forwarded to the tracker task
#[derive(Debug)]
pub enum TrackerCommand {
    /// Element started or resumed playback
    Play,
    /// Element paused
    Pause,
    /// Element reached end of stream
    Ended,
    /// Element entered (`true`) or left fullscreen
    FullscreenChanged(bool),
    /// Explicitly (re)start the checkpoint timer
    StartTracking,
    /// Get the tracker state
    Snapshot {
        respond_to: oneshot::Sender<TrackerSnapshot>,
    },
    /// Write the final checkpoint and stop
    Teardown { respond_to: oneshot::Sender<()> },
}

/// Owns a [`ProgressTracker`] and applies events to it one at a time, so
/// events from the element are handled in the order they were raised.
pub struct TrackerController {
    tracker: ProgressTracker,
    receiver: mpsc::UnboundedReceiver<TrackerCommand>,
}

/// Cheap, cloneable sender side of a [`TrackerController`]
#[derive(Debug, Clone)]
pub struct TrackerHandle {
    sender: mpsc::UnboundedSender<TrackerCommand>,
}

impl TrackerController {
    pub fn new(tracker: ProgressTracker) -> (TrackerHandle, TrackerController) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let controller = TrackerController { tracker, receiver };
        (TrackerHandle { sender }, controller)
    }

    /// Create a controller and run it on the current runtime.
    pub fn spawn(tracker: ProgressTracker) -> (TrackerHandle, JoinHandle<()>) {
        let (handle, controller) = Self::new(tracker);
        (handle, tokio::spawn(controller.run()))
    }

    /// Run the event loop. Tears the tracker down on an explicit
    /// [`TrackerCommand::Teardown`] or once every handle is dropped.
    pub async fn run(mut self) {
        debug!(
            "TrackerController event loop started for session {}",
            self.tracker.session_id()
        );

        let mut teardown_ack = None;

        while let Some(command) = self.receiver.recv().await {
            match command {
                TrackerCommand::Play => {
                    trace!("Play");
                    self.tracker.on_play().await;
                }
                TrackerCommand::Pause => {
                    trace!("Pause");
                    self.tracker.on_pause().await;
                }
                TrackerCommand::Ended => {
                    trace!("Ended");
                    self.tracker.on_ended().await;
                }
                TrackerCommand::FullscreenChanged(entered) => {
                    trace!("Fullscreen changed: {}", entered);
                    self.tracker.on_fullscreen_change(entered).await;
                }
                TrackerCommand::StartTracking => self.tracker.start_tracking(),
                TrackerCommand::Snapshot { respond_to } => {
                    let _ = respond_to.send(self.tracker.snapshot());
                }
                TrackerCommand::Teardown { respond_to } => {
                    teardown_ack = Some(respond_to);
                    break;
                }
            }
        }

        self.tracker.teardown().await;
        if let Some(ack) = teardown_ack {
            let _ = ack.send(());
        }
        debug!("TrackerController event loop finished");
    }
}

impl TrackerHandle {
    fn send(&self, command: TrackerCommand) -> Result<()> {
        self.sender
            .send(command)
            .map_err(|_| anyhow::anyhow!("Tracker controller disconnected"))
    }

    pub fn play(&self) -> Result<()> {
        self.send(TrackerCommand::Play)
    }

    pub fn pause(&self) -> Result<()> {
        self.send(TrackerCommand::Pause)
    }

    pub fn ended(&self) -> Result<()> {
        self.send(TrackerCommand::Ended)
    }

    pub fn fullscreen_changed(&self, entered: bool) -> Result<()> {
        self.send(TrackerCommand::FullscreenChanged(entered))
    }

    pub fn start_tracking(&self) -> Result<()> {
        self.send(TrackerCommand::StartTracking)
    }

    /// Get the tracker state once every earlier event has been applied
    pub async fn snapshot(&self) -> Result<TrackerSnapshot> {
        let (respond_to, response) = oneshot::channel();
        self.send(TrackerCommand::Snapshot { respond_to })?;
        response
            .await
            .map_err(|_| anyhow::anyhow!("Failed to receive response from tracker controller"))
    }

    /// Tear the tracker down. Resolves once the final checkpoint has been
    /// queued, not when it has been written.
    pub async fn teardown(self) -> Result<()> {
        let (respond_to, response) = oneshot::channel();
        self.send(TrackerCommand::Teardown { respond_to })?;
        response
            .await
            .map_err(|_| anyhow::anyhow!("Failed to receive response from tracker controller"))
    }
}
