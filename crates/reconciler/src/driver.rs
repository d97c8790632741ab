use std::{sync::Arc, time::Duration};

use {
    tokio::{
        task::JoinHandle,
        time::{self, MissedTickBehavior},
    },
    tokio_util::sync::CancellationToken,
    tracing::{debug, info},
};

use crate::machine::Reconciler;

/// Fixed-interval loop that ticks one reconciler.
///
/// Ticks never overlap: a slow tick delays the next one instead of
/// queueing it. The first tick runs immediately.
pub struct PollDriver;

impl PollDriver {
    pub fn spawn(
        reconciler: Arc<Reconciler>,
        interval: Duration,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            info!(
                resource = reconciler.resource(),
                interval_secs = interval.as_secs(),
                "poll driver started"
            );
            let mut ticker = time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    () = cancel.cancelled() => break,
                    _ = ticker.tick() => {},
                }
                tokio::select! {
                    () = cancel.cancelled() => break,
                    phase = reconciler.tick() => {
                        debug!(resource = reconciler.resource(), %phase, "poll tick done");
                    },
                }
            }

            reconciler.shutdown().await;
            info!(resource = reconciler.resource(), "poll driver stopped");
        })
    }
}
