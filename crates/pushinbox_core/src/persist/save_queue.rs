//! Background save worker.
//!
//! # Responsibility
//! - Accept snapshots from the mutation path without blocking it.
//! - Write snapshots to the gateway on a dedicated thread.
//! - Route save failures to logging and an optional reporter callback.
//!
//! # Invariants
//! - Snapshots are written in enqueue order; queued-up snapshots may be
//!   coalesced into the newest one.
//! - A failed save never panics the worker.

use crate::model::notification::NotificationRecord;
use crate::persist::gateway::{PersistenceError, PersistenceGateway};
use log::{debug, error, warn};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Instant;

const SAVE_WORKER_THREAD_NAME: &str = "pushinbox-save";

/// Callback receiving persistence failures from the save worker.
pub type ErrorReporter = Arc<dyn Fn(&PersistenceError) + Send + Sync>;

enum SaveCommand {
    Save(Vec<NotificationRecord>),
    Flush(Sender<()>),
}

/// Fire-and-forget snapshot writer.
pub struct SaveQueue {
    sender: Option<Sender<SaveCommand>>,
    worker: Option<JoinHandle<()>>,
}

impl SaveQueue {
    /// Moves `gateway` onto a new worker thread.
    ///
    /// If the thread cannot be spawned the queue runs detached: snapshots are
    /// dropped and the failure is logged and reported once.
    pub fn spawn(gateway: Box<dyn PersistenceGateway>, reporter: Option<ErrorReporter>) -> Self {
        let (sender, receiver) = mpsc::channel();
        let worker_reporter = reporter.clone();
        let spawned = std::thread::Builder::new()
            .name(SAVE_WORKER_THREAD_NAME.to_string())
            .spawn(move || run_worker(gateway, receiver, worker_reporter));

        match spawned {
            Ok(worker) => Self {
                sender: Some(sender),
                worker: Some(worker),
            },
            Err(err) => {
                let err = PersistenceError::Unavailable(format!("save worker spawn failed: {err}"));
                error!("event=save_worker_start module=persist status=error error={err}");
                if let Some(reporter) = reporter {
                    reporter(&err);
                }
                Self::detached()
            }
        }
    }

    /// Queue with no worker; every snapshot is discarded.
    pub fn detached() -> Self {
        Self {
            sender: None,
            worker: None,
        }
    }

    /// Hands a snapshot to the worker and returns immediately.
    pub fn enqueue(&self, snapshot: Vec<NotificationRecord>) {
        let Some(sender) = &self.sender else {
            debug!(
                "event=store_save module=persist status=skipped reason=detached len={}",
                snapshot.len()
            );
            return;
        };
        if sender.send(SaveCommand::Save(snapshot)).is_err() {
            warn!("event=store_save module=persist status=skipped reason=worker_stopped");
        }
    }

    /// Blocks until every snapshot queued before this call has been handled.
    ///
    /// Returns `false` when no worker is running.
    pub fn flush(&self) -> bool {
        let Some(sender) = &self.sender else {
            return false;
        };
        let (ack_sender, ack_receiver) = mpsc::channel();
        if sender.send(SaveCommand::Flush(ack_sender)).is_err() {
            return false;
        }
        ack_receiver.recv().is_ok()
    }
}

impl Drop for SaveQueue {
    fn drop(&mut self) {
        // Closing the channel lets the worker drain and exit.
        self.sender.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                error!("event=save_worker_stop module=persist status=error error=worker_panicked");
            }
        }
    }
}

fn run_worker(
    mut gateway: Box<dyn PersistenceGateway>,
    receiver: Receiver<SaveCommand>,
    reporter: Option<ErrorReporter>,
) {
    while let Ok(command) = receiver.recv() {
        let mut snapshot = match command {
            SaveCommand::Save(snapshot) => snapshot,
            SaveCommand::Flush(ack) => {
                let _ = ack.send(());
                continue;
            }
        };

        let mut acks = Vec::new();
        let mut coalesced = 0usize;
        while let Ok(next) = receiver.try_recv() {
            match next {
                SaveCommand::Save(newer) => {
                    snapshot = newer;
                    coalesced += 1;
                }
                SaveCommand::Flush(ack) => acks.push(ack),
            }
        }

        write_snapshot(gateway.as_mut(), &snapshot, coalesced, reporter.as_ref());

        for ack in acks {
            let _ = ack.send(());
        }
    }
}

fn write_snapshot(
    gateway: &mut dyn PersistenceGateway,
    snapshot: &[NotificationRecord],
    coalesced: usize,
    reporter: Option<&ErrorReporter>,
) {
    let started_at = Instant::now();
    match gateway.save(snapshot) {
        Ok(()) => debug!(
            "event=store_save module=persist status=ok len={} coalesced={} duration_ms={}",
            snapshot.len(),
            coalesced,
            started_at.elapsed().as_millis()
        ),
        Err(err) => {
            error!(
                "event=store_save module=persist status=error len={} duration_ms={} error={}",
                snapshot.len(),
                started_at.elapsed().as_millis(),
                err
            );
            if let Some(reporter) = reporter {
                reporter(&err);
            }
        }
    }
}
