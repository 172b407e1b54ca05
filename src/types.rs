// src/types.rs
use std::fmt;
use std::sync::Arc;
use serde::Serialize;
use crate::signal::filter::{FilterParams, FilterPurpose};
use crate::view::ScopeSnapshot;
/// Upper bound on channels per ingest context.
pub const MAX_CHANNELS: usize = 8;
/// Small-integer channel key. Bounds are checked against the ingest's channel count.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ChannelId(pub u8);
impl ChannelId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}
impl From<u8> for ChannelId {
    fn from(value: u8) -> Self {
        ChannelId(value)
    }
}
impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ch{}", self.0)
    }
}
/// One filtered sample. `time` is in milliseconds and strictly increasing per channel.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Sample {
    pub time: i64,
    pub value: f64,
}
impl Sample {
    pub fn new(time: i64, value: f64) -> Self {
        Self { time, value }
    }
}
// Commands sent from the UI side to the ingest engine
#[derive(Clone, Debug)]
pub enum ScopeCommand {
    SetFilter {
        channel: ChannelId,
        purpose: FilterPurpose,
        params: FilterParams,
    },
    BypassFilter {
        channel: ChannelId,
        purpose: FilterPurpose,
    },
    ResetChannel(ChannelId),
    Restart,
    Shutdown,
}
// Messages the engine publishes back
#[derive(Clone, Debug)]
pub enum ScopeMessage {
    Snapshot(Arc<ScopeSnapshot>),
    FilterRejected {
        channel: ChannelId,
        purpose: FilterPurpose,
        reason: String,
    },
    SourceFailed(String),
    Stopped,
}
