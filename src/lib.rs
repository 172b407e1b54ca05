//! Real-time biosignal scope core.
//!
//! Frames go through [`drivers::StreamIngest`] into per-channel filter chains and
//! time-windowed buffers; render ticks take owned [`view::ScopeSnapshot`]s holding sweeps,
//! aligned overlays and magnitude spectra.
pub mod config;
pub mod drivers;
pub mod engine;
pub mod signal;
pub mod tick;
pub mod types;
pub mod view;
pub use config::{ScopeConfig, TimestampUnit};
pub use drivers::{Frame, ScopeError, ScopePipeline, SnapshotPlan, StreamIngest};
pub use engine::{latest_snapshot, spawn_engine};
pub use types::{ChannelId, Sample, ScopeCommand, ScopeMessage, MAX_CHANNELS};
pub use view::{AlignedRow, ScopeSnapshot, SweepView};
