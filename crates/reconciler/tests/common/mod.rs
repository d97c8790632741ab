#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
    time::Duration,
};

use {
    async_trait::async_trait,
    chrono::{DateTime, TimeZone, Utc},
    onair_config::DisplayConfig,
    onair_reconciler::{
        CaptionFormat, Clock, MessageId, MessageSink, QueryError, Reconciler, RenderedContent,
        RetryPolicy, Settings, SinkError, SinkResult, SnapshotSource, StreamSnapshot,
    },
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    Create(RenderedContent),
    ReplaceMedia(MessageId, RenderedContent),
    UpdateCaption(MessageId, RenderedContent),
    Delete(MessageId),
}

impl Op {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Create(_) => "create",
            Self::ReplaceMedia(..) => "replace_media",
            Self::UpdateCaption(..) => "update_caption",
            Self::Delete(_) => "delete",
        }
    }
}

/// Sink that records every call and can be told to fail.
#[derive(Default)]
pub struct RecordingSink {
    ops: Mutex<Vec<Op>>,
    failures: Mutex<VecDeque<SinkError>>,
    next_id: Mutex<i32>,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queue errors returned by the next calls, in order.
    pub fn fail_next(&self, errors: impl IntoIterator<Item = SinkError>) {
        self.failures.lock().unwrap().extend(errors);
    }

    pub fn ops(&self) -> Vec<Op> {
        self.ops.lock().unwrap().clone()
    }

    pub fn op_names(&self) -> Vec<&'static str> {
        self.ops().iter().map(Op::name).collect()
    }

    fn record(&self, op: Op) -> SinkResult<()> {
        self.ops.lock().unwrap().push(op);
        match self.failures.lock().unwrap().pop_front() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl MessageSink for RecordingSink {
    async fn create(
        &self,
        content: &RenderedContent,
        _format: CaptionFormat,
    ) -> SinkResult<MessageId> {
        self.record(Op::Create(content.clone()))?;
        let mut next = self.next_id.lock().unwrap();
        *next += 1;
        Ok(MessageId(*next))
    }

    async fn replace_media(
        &self,
        id: MessageId,
        content: &RenderedContent,
        _format: CaptionFormat,
    ) -> SinkResult<()> {
        self.record(Op::ReplaceMedia(id, content.clone()))
    }

    async fn update_caption(
        &self,
        id: MessageId,
        content: &RenderedContent,
        _format: CaptionFormat,
    ) -> SinkResult<()> {
        self.record(Op::UpdateCaption(id, content.clone()))
    }

    async fn delete(&self, id: MessageId) -> SinkResult<()> {
        self.record(Op::Delete(id))
    }
}

/// Source returning queued answers, then "offline".
#[derive(Default)]
pub struct ScriptedSource {
    answers: Mutex<VecDeque<Result<Option<StreamSnapshot>, QueryError>>>,
}

impl ScriptedSource {
    pub fn new(
        answers: impl IntoIterator<Item = Result<Option<StreamSnapshot>, QueryError>>,
    ) -> Arc<Self> {
        Arc::new(Self {
            answers: Mutex::new(answers.into_iter().collect()),
        })
    }
}

#[async_trait]
impl SnapshotSource for ScriptedSource {
    async fn fetch(&self, _resource: &str) -> Result<Option<StreamSnapshot>, QueryError> {
        self.answers.lock().unwrap().pop_front().unwrap_or(Ok(None))
    }
}

/// Clock that only moves when told to.
#[derive(Clone)]
pub struct ManualClock(Arc<Mutex<DateTime<Utc>>>);

impl ManualClock {
    pub fn at(now: DateTime<Utc>) -> Self {
        Self(Arc::new(Mutex::new(now)))
    }

    pub fn advance(&self, by: chrono::Duration) {
        *self.0.lock().unwrap() += by;
    }

    pub fn as_clock(&self) -> Clock {
        let inner = Arc::clone(&self.0);
        Arc::new(move || *inner.lock().unwrap())
    }
}

pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 5, 9, 19, 0, 0).unwrap()
}

pub fn snapshot(title: &str, game: &str, viewers: u64) -> StreamSnapshot {
    StreamSnapshot {
        title: title.into(),
        game: game.into(),
        thumbnail_url: "https://static-cdn.example/live_user_kitty-{width}x{height}.jpg".into(),
        started_at: t0(),
        viewer_count: viewers,
    }
}

pub fn settings(deletion_delay: Option<Duration>) -> Settings {
    Settings {
        resource: "kitty".into(),
        display: DisplayConfig::default(),
        retry: RetryPolicy::immediate(3),
        deletion_delay,
    }
}

pub fn reconciler(
    sink: &Arc<RecordingSink>,
    source: Arc<ScriptedSource>,
    clock: &ManualClock,
    deletion_delay: Option<Duration>,
) -> Arc<Reconciler> {
    Reconciler::with_clock(
        settings(deletion_delay),
        source,
        Arc::clone(sink) as Arc<dyn MessageSink>,
        clock.as_clock(),
    )
}
