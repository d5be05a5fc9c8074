//! Single-consumer event queue around the lifecycle state machine.
//!
//! Transport callbacks, user decisions, check requests, and status queries
//! all travel through one bounded `mpsc` channel. [`UpdaterService::run`]
//! applies them one at a time, so no two transitions ever overlap.

use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::lifecycle::UpdateLifecycle;
use super::notifier::UserDecision;
use super::session::SessionSnapshot;
use super::transport::TransportEvent;
use crate::error::{Result, UpdaterError};

/// Default capacity of the updater queue.
pub const DEFAULT_QUEUE_CAPACITY: usize = 32;

enum UpdaterEvent {
    StartCheck,
    Transport(TransportEvent),
    Decision(UserDecision),
    Status(oneshot::Sender<SessionSnapshot>),
}

/// Cloneable sender side of the updater queue.
#[derive(Clone)]
pub struct UpdaterHandle {
    tx: mpsc::Sender<UpdaterEvent>,
}

impl UpdaterHandle {
    pub async fn start_check(&self) -> Result<()> {
        self.send(UpdaterEvent::StartCheck).await
    }

    pub async fn transport_event(&self, event: TransportEvent) -> Result<()> {
        self.send(UpdaterEvent::Transport(event)).await
    }

    /// Deliver a transport event from synchronous code.
    ///
    /// # Errors
    ///
    /// Fails if the queue is full or the service has stopped.
    pub fn try_transport_event(&self, event: TransportEvent) -> Result<()> {
        self.tx
            .try_send(UpdaterEvent::Transport(event))
            .map_err(|e| UpdaterError::Channel(format!("cannot queue transport event: {e}")))
    }

    pub async fn decide(&self, decision: UserDecision) -> Result<()> {
        self.send(UpdaterEvent::Decision(decision)).await
    }

    /// Snapshot of the session, ordered after every event queued before it.
    pub async fn status(&self) -> Result<SessionSnapshot> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(UpdaterEvent::Status(reply_tx)).await?;
        reply_rx
            .await
            .map_err(|e| UpdaterError::Channel(format!("status reply dropped: {e}")))
    }

    /// Whether the service has stopped consuming events.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    async fn send(&self, event: UpdaterEvent) -> Result<()> {
        self.tx
            .send(event)
            .await
            .map_err(|_| UpdaterError::Channel("updater service has stopped".to_owned()))
    }
}

/// Receiving side of the updater queue, waiting for its lifecycle.
pub struct UpdaterInbox {
    rx: mpsc::Receiver<UpdaterEvent>,
}

/// Create the updater queue.
///
/// The handle exists before the lifecycle so collaborators that report back
/// (transport, notifier) can be built with a clone of it.
#[must_use]
pub fn updater_channel(capacity: usize) -> (UpdaterHandle, UpdaterInbox) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (UpdaterHandle { tx }, UpdaterInbox { rx })
}

/// Owns the lifecycle and drains the queue.
pub struct UpdaterService {
    rx: mpsc::Receiver<UpdaterEvent>,
    lifecycle: UpdateLifecycle,
}

impl UpdaterService {
    #[must_use]
    pub fn new(inbox: UpdaterInbox, lifecycle: UpdateLifecycle) -> Self {
        Self {
            rx: inbox.rx,
            lifecycle,
        }
    }

    /// Process events until every handle is dropped or the session enters
    /// `Installing`. Returns the final session snapshot.
    pub async fn run(mut self) -> SessionSnapshot {
        tracing::info!(channel = %self.lifecycle.policy().channel, "updater service started");
        while let Some(event) = self.rx.recv().await {
            self.dispatch(event);
            if self.lifecycle.state().is_terminal() {
                tracing::info!("update installing; updater service stopping");
                break;
            }
        }
        self.rx.close();
        self.lifecycle.snapshot()
    }

    fn dispatch(&mut self, event: UpdaterEvent) {
        match event {
            UpdaterEvent::StartCheck => {
                self.lifecycle.start_check();
            }
            UpdaterEvent::Transport(event) => {
                tracing::debug!(event = event.name(), "transport event");
                self.lifecycle.handle_transport_event(event);
            }
            UpdaterEvent::Decision(decision) => {
                self.lifecycle.handle_decision(decision);
            }
            UpdaterEvent::Status(reply) => {
                let _ = reply.send(self.lifecycle.snapshot());
            }
        }
    }
}

/// Issue `start_check` after `initial_delay`, then every `interval`.
///
/// A zero `interval` disables polling: the task ends without checking.
/// Otherwise it stops when `cancel` fires or the service has gone away.
pub fn spawn_poller(
    handle: UpdaterHandle,
    initial_delay: Duration,
    interval: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        if interval.is_zero() {
            tracing::warn!("zero check interval; poller not started");
            return;
        }

        tokio::select! {
            () = cancel.cancelled() => return,
            () = tokio::time::sleep(initial_delay) => {}
        }

        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                () = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    if handle.start_check().await.is_err() {
                        tracing::debug!("updater service gone; poller stopping");
                        break;
                    }
                }
            }
        }
    })
}
