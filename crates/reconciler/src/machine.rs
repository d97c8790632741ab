//! The reconciliation state machine.
//!
//! All sink mutations, from poll ticks and from the deletion timer, run
//! while holding `state`, so at most one request is in flight and every
//! read of [`SinkState`] is consistent.

use std::{
    sync::{Arc, Weak},
    time::Duration,
};

use {
    chrono::{DateTime, Utc},
    onair_config::DisplayConfig,
    tokio::sync::Mutex,
    tokio_util::sync::CancellationToken,
    tracing::{debug, error, info, warn},
};

use crate::{
    detect::detect,
    dispatch::Dispatcher,
    render::{Presence, RenderedContent, Renderer},
    retry::RetryPolicy,
    scheduler::DeletionScheduler,
    sink::{MessageId, MessageSink, SinkState},
    snapshot::{SnapshotSource, StreamSnapshot},
};

/// Source of "now" for duration rendering.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

#[must_use]
pub fn system_clock() -> Clock {
    Arc::new(Utc::now)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No broadcast and no message.
    Idle,
    /// Broadcast running, message shows live content.
    Live,
    /// Broadcast over, message shows the summary; deletion may be pending.
    Ended,
}

impl Phase {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Live => "live",
            Self::Ended => "ended",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Diagnostic view of the reconciler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub phase: Phase,
    pub message_id: Option<MessageId>,
    pub deletion_pending: bool,
    pub deletion_overdue: bool,
}

/// Static inputs for one reconciler.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Broadcaster login passed to the snapshot source.
    pub resource: String,
    pub display: DisplayConfig,
    pub retry: RetryPolicy,
    /// `None` disables deletion after the broadcast ends.
    pub deletion_delay: Option<Duration>,
}

struct ReconcilerState {
    phase: Phase,
    sink: SinkState,
    last_snapshot: Option<StreamSnapshot>,
    deletion: DeletionScheduler,
    /// A deletion that failed and must be retried on the next absent tick.
    deletion_overdue: bool,
}

/// Mirrors one broadcast into one channel message.
pub struct Reconciler {
    source: Arc<dyn SnapshotSource>,
    dispatcher: Dispatcher,
    renderer: Renderer,
    resource: String,
    deletion_delay: Option<Duration>,
    clock: Clock,
    shutdown: CancellationToken,
    state: Mutex<ReconcilerState>,
}

impl Reconciler {
    pub fn new(
        settings: Settings,
        source: Arc<dyn SnapshotSource>,
        sink: Arc<dyn MessageSink>,
    ) -> Arc<Self> {
        Self::with_clock(settings, source, sink, system_clock())
    }

    pub fn with_clock(
        settings: Settings,
        source: Arc<dyn SnapshotSource>,
        sink: Arc<dyn MessageSink>,
        clock: Clock,
    ) -> Arc<Self> {
        let shutdown = CancellationToken::new();
        Arc::new(Self {
            source,
            dispatcher: Dispatcher::new(sink, settings.retry),
            renderer: Renderer::new(settings.display, settings.resource.clone()),
            resource: settings.resource,
            deletion_delay: settings.deletion_delay,
            clock,
            state: Mutex::new(ReconcilerState {
                phase: Phase::Idle,
                sink: SinkState::default(),
                last_snapshot: None,
                deletion: DeletionScheduler::new(shutdown.clone()),
                deletion_overdue: false,
            }),
            shutdown,
        })
    }

    #[must_use]
    pub fn resource(&self) -> &str {
        &self.resource
    }

    /// Fetch the current snapshot and reconcile against it.
    ///
    /// A failed fetch is logged and handled as "not live".
    pub async fn tick(self: &Arc<Self>) -> Phase {
        let snapshot = match self.source.fetch(&self.resource).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(
                    resource = %self.resource,
                    error = %e,
                    "snapshot query failed, treating as offline"
                );
                None
            },
        };
        self.observe(snapshot).await
    }

    /// Reconcile against an already fetched snapshot. Returns the phase
    /// after this step.
    pub async fn observe(self: &Arc<Self>, snapshot: Option<StreamSnapshot>) -> Phase {
        let mut state = self.state.lock().await;
        let now = (self.clock)();

        match (state.phase, snapshot) {
            (Phase::Idle, None) => {},
            (Phase::Ended, None) => {
                if state.deletion_overdue {
                    self.delete_locked(&mut state).await;
                }
            },
            (phase, Some(snapshot)) => {
                let content = self.renderer.render(&snapshot, Presence::Live, now);
                state.last_snapshot = Some(snapshot);
                if self.apply_locked(&mut state, content, Presence::Live).await {
                    // The deletion stays armed until the message really shows
                    // live content again.
                    if state.deletion.cancel() {
                        info!(
                            resource = %self.resource,
                            "broadcast resumed, pending deletion cancelled"
                        );
                    }
                    state.deletion_overdue = false;
                    if phase != Phase::Live {
                        info!(resource = %self.resource, from = %phase, "broadcast is live");
                    }
                    state.phase = Phase::Live;
                }
            },
            (Phase::Live, None) => {
                let Some(last) = state.last_snapshot.clone() else {
                    warn!(
                        resource = %self.resource,
                        "broadcast ended but no snapshot was kept, skipping summary"
                    );
                    state.phase = Phase::Ended;
                    return state.phase;
                };
                let content = self.renderer.render(&last, Presence::Ended, now);
                if self.apply_locked(&mut state, content, Presence::Ended).await {
                    info!(resource = %self.resource, "broadcast ended");
                    state.phase = Phase::Ended;
                    self.arm_deletion(&mut state);
                }
            },
        }

        state.phase
    }

    /// Snapshot of the current state for diagnostics.
    pub async fn status(&self) -> Status {
        let state = self.state.lock().await;
        Status {
            phase: state.phase,
            message_id: state.sink.message_id,
            deletion_pending: state.deletion.is_pending(),
            deletion_overdue: state.deletion_overdue,
        }
    }

    /// Cancel the deletion timer. The message, if any, is left in place.
    pub async fn shutdown(&self) {
        self.shutdown.cancel();
        let mut state = self.state.lock().await;
        if state.deletion.cancel() {
            info!(resource = %self.resource, "pending deletion dropped on shutdown");
        }
    }

    /// Bring the sink in line with `content`. Returns whether it now shows it.
    async fn apply_locked(
        &self,
        state: &mut ReconcilerState,
        content: RenderedContent,
        presence: Presence,
    ) -> bool {
        let Some(op) = detect(&state.sink, &content, presence) else {
            debug!(resource = %self.resource, "message already up to date");
            return true;
        };

        match self
            .dispatcher
            .apply(op, state.sink.message_id, &content)
            .await
        {
            Ok(id) => {
                debug!(
                    resource = %self.resource,
                    operation = op.as_str(),
                    message_id = %id,
                    "message updated"
                );
                state.sink.confirm(id, content, presence);
                true
            },
            Err(e) => {
                error!(
                    resource = %self.resource,
                    operation = op.as_str(),
                    error = %e,
                    "message update failed, will retry next tick"
                );
                false
            },
        }
    }

    fn arm_deletion(self: &Arc<Self>, state: &mut ReconcilerState) {
        let Some(delay) = self.deletion_delay else {
            return;
        };
        if state.sink.message_id.is_none() || self.shutdown.is_cancelled() {
            return;
        }

        let weak: Weak<Self> = Arc::downgrade(self);
        let generation = state.deletion.schedule(delay, move |generation| async move {
            if let Some(reconciler) = weak.upgrade() {
                reconciler.fire_deletion(generation).await;
            }
        });
        info!(
            resource = %self.resource,
            generation,
            delay_secs = delay.as_secs(),
            "message deletion scheduled"
        );
    }

    async fn fire_deletion(&self, generation: u64) {
        let mut state = self.state.lock().await;
        if !state.deletion.take_if_current(generation) {
            debug!(generation, "stale deletion timer ignored");
            return;
        }
        self.delete_locked(&mut state).await;
    }

    async fn delete_locked(&self, state: &mut ReconcilerState) {
        let Some(id) = state.sink.message_id else {
            state.deletion_overdue = false;
            state.sink.reset();
            state.last_snapshot = None;
            state.phase = Phase::Idle;
            return;
        };

        match self.dispatcher.delete(id).await {
            Ok(()) => {
                info!(resource = %self.resource, message_id = %id, "message deleted");
                state.deletion_overdue = false;
                state.sink.reset();
                state.last_snapshot = None;
                state.phase = Phase::Idle;
            },
            Err(e) => {
                error!(
                    resource = %self.resource,
                    message_id = %id,
                    error = %e,
                    "message deletion failed, will retry next tick"
                );
                state.deletion_overdue = true;
            },
        }
    }
}
