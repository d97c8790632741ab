//! Mirrors the live/ended state of one broadcast into one channel message.
//!
//! Each poll tick runs snapshot → [`render::Renderer`] → [`detect::detect`]
//! → [`dispatch::Dispatcher`], orchestrated by [`machine::Reconciler`].
//! After the broadcast ends the message can be removed by the
//! [`scheduler::DeletionScheduler`].

pub mod detect;
pub mod dispatch;
pub mod driver;
pub mod error;
pub mod machine;
pub mod markup;
pub mod render;
pub mod retry;
pub mod scheduler;
pub mod sink;
pub mod snapshot;

pub use {
    detect::{SinkOperation, detect},
    driver::PollDriver,
    error::{QueryError, SinkError, SinkResult},
    machine::{Clock, Phase, Reconciler, Settings, Status, system_clock},
    render::{Button, ButtonLayout, Presence, RenderedContent, Renderer, format_duration},
    retry::RetryPolicy,
    sink::{CaptionFormat, MessageId, MessageSink, SinkState},
    snapshot::{SnapshotSource, StreamSnapshot},
};
