// crates/jobs/src/control.rs
//! Acknowledged handoff between a job's callers and its worker.
//!
//! A caller sends an acknowledgement slot through a capacity-1 channel and
//! waits until the worker fills it. The send therefore completes only once the
//! worker has taken the signal at its checkpoint. If the worker is gone the
//! slot is dropped with the channel and the caller returns instead of hanging.

use tokio::sync::{mpsc, oneshot};

/// A control signal taken by the worker; acknowledging it releases the caller.
#[derive(Debug)]
pub(crate) struct Signal(oneshot::Sender<()>);

impl Signal {
    pub(crate) fn ack(self) {
        let _ = self.0.send(());
    }
}

/// Caller side of one control channel.
#[derive(Debug, Clone)]
pub(crate) struct Handoff {
    tx: mpsc::Sender<Signal>,
}

impl Handoff {
    /// Hand a signal to the worker and wait for it to be acknowledged.
    ///
    /// Returns false if the worker stopped before taking it.
    pub(crate) async fn send(&self) -> bool {
        let (ack_tx, ack_rx) = oneshot::channel();
        if self.tx.send(Signal(ack_tx)).await.is_err() {
            return false;
        }
        ack_rx.await.is_ok()
    }
}

/// Worker side of one control channel.
#[derive(Debug)]
pub(crate) struct Checkpoint {
    rx: mpsc::Receiver<Signal>,
}

impl Checkpoint {
    /// Take a pending signal without waiting.
    pub(crate) fn poll(&mut self) -> Option<Signal> {
        self.rx.try_recv().ok()
    }

    /// Wait for the next signal. `None` once every caller handle is gone.
    pub(crate) async fn wait(&mut self) -> Option<Signal> {
        self.rx.recv().await
    }
}

fn handoff() -> (Handoff, Checkpoint) {
    let (tx, rx) = mpsc::channel(1);
    (Handoff { tx }, Checkpoint { rx })
}

/// The three caller handles owned by a job until release.
#[derive(Debug, Clone)]
pub(crate) struct Controls {
    pub pause: Handoff,
    pub resume: Handoff,
    pub terminate: Handoff,
}

/// The three checkpoints owned by the worker.
#[derive(Debug)]
pub(crate) struct Checkpoints {
    pub pause: Checkpoint,
    pub resume: Checkpoint,
    pub terminate: Checkpoint,
}

pub(crate) fn channels() -> (Controls, Checkpoints) {
    let (pause, pause_cp) = handoff();
    let (resume, resume_cp) = handoff();
    let (terminate, terminate_cp) = handoff();
    (
        Controls {
            pause,
            resume,
            terminate,
        },
        Checkpoints {
            pause: pause_cp,
            resume: resume_cp,
            terminate: terminate_cp,
        },
    )
}
