use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tokio::{
    sync::{
        mpsc::{self, error::TrySendError},
        watch,
    },
    task::JoinHandle,
};

use super::{MotionController, MoveOutcome};

/// Bounded queue of movements drained by a single worker task.
///
/// Submitting never waits for the robot. The worker publishes what it is doing on a
/// watch channel and is aborted, mid-travel if need be, when the queue is dropped.
pub struct MotionQueue {
    queue: mpsc::Sender<String>,
    status: watch::Receiver<MotionStatus>,
    task: JoinHandle<()>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct MotionStatus {
    pub busy: bool,
    pub completed: u64,
    pub last: Option<LastMovement>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LastMovement {
    pub zone: String,
    pub outcome: MoveOutcome,
}

#[derive(Debug, Error, PartialEq)]
pub enum SubmitError {
    #[error("Motion queue is full")]
    Full,

    #[error("Motion worker has stopped")]
    Closed,
}

impl MotionQueue {
    pub fn spawn(controller: Arc<MotionController>, depth: usize) -> Self {
        let (queue, rx) = mpsc::channel(depth.max(1));
        let (status_tx, status) = watch::channel(MotionStatus::default());

        let task = tokio::spawn(motion_worker(controller, rx, status_tx));

        Self {
            queue,
            status,
            task,
        }
    }

    pub fn submit(&self, zone: String) -> Result<(), SubmitError> {
        self.queue.try_send(zone).map_err(|e| match e {
            TrySendError::Full(_) => SubmitError::Full,
            TrySendError::Closed(_) => SubmitError::Closed,
        })
    }

    pub fn status(&self) -> MotionStatus {
        self.status.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<MotionStatus> {
        self.status.clone()
    }
}

impl Drop for MotionQueue {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[tracing::instrument(skip_all)]
async fn motion_worker(
    controller: Arc<MotionController>,
    mut queue: mpsc::Receiver<String>,
    status: watch::Sender<MotionStatus>,
) {
    while let Some(zone) = queue.recv().await {
        status.send_modify(|s| s.busy = true);

        let outcome = controller.move_to_zone(&zone).await;

        if outcome == MoveOutcome::Failed {
            tracing::warn!("Queued movement to {zone} failed");
        }

        status.send_modify(|s| {
            s.busy = false;
            s.completed += 1;
            s.last = Some(LastMovement { zone, outcome });
        });
    }

    tracing::debug!("Motion queue closed");
}
