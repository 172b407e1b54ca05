use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use crate::types::{ChannelId, Sample};
/// Oscilloscope sweep of one channel, ready for a renderer.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SweepView {
    pub window_ms: i64,
    /// Current cycle, times remapped onto `[0, window_ms)`.
    pub active: Vec<Sample>,
    /// Previous cycle still visible behind the scanner; drawn dimmed.
    pub history: Vec<Sample>,
    pub scanner: Option<i64>,
    pub cycle_start: Option<i64>,
}
impl SweepView {
    pub fn empty(window_ms: i64) -> Self {
        Self {
            window_ms,
            active: Vec::new(),
            history: Vec::new(),
            scanner: None,
            cycle_start: None,
        }
    }
    pub fn is_empty(&self) -> bool {
        self.active.is_empty() && self.history.is_empty()
    }
}
/// One row of a multi-channel overlay. `None` marks a gap for that channel.
///
/// `values` is positional: entry `k` belongs to the `k`-th channel the overlay was asked
/// for (see [`ScopeSnapshot::overlay_channels`]), not to `ChannelId(k)`. The serialized
/// `ch{k}` keys follow the same positions, so an overlay of channels 1 and 3 emits
/// `ch0` for channel 1 and `ch1` for channel 3.
#[derive(Clone, Debug, PartialEq)]
pub struct AlignedRow {
    pub time: i64,
    pub values: Vec<Option<f64>>,
}
// Renderers expect `{ "time": t, "ch0": v, "ch1": null, ... }`
impl Serialize for AlignedRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len() + 1))?;
        map.serialize_entry("time", &self.time)?;
        for (idx, value) in self.values.iter().enumerate() {
            map.serialize_entry(&format!("ch{idx}"), value)?;
        }
        map.end()
    }
}
#[derive(Clone, Debug, Serialize)]
pub struct ChannelSweep {
    pub channel: ChannelId,
    pub sweep: SweepView,
}
#[derive(Clone, Debug, Serialize)]
pub struct ChannelSpectrum {
    pub channel: ChannelId,
    pub magnitudes: Vec<f64>,
    pub frequencies_hz: Vec<f64>,
}
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct IngestStats {
    pub frames_accepted: u64,
    pub frames_malformed: u64,
    pub frames_dropped_backlog: u64,
    pub samples_stored: u64,
    pub samples_non_finite: u64,
    pub samples_unknown_channel: u64,
    pub timestamps_bumped: u64,
}
/// Owned, immutable copy of everything a render tick needs.
#[derive(Clone, Debug, Serialize)]
pub struct ScopeSnapshot {
    pub latest_time: Option<i64>,
    pub sweeps: Vec<ChannelSweep>,
    /// Channel behind each positional `AlignedRow` value, in order.
    pub overlay_channels: Vec<ChannelId>,
    pub overlay: Vec<AlignedRow>,
    pub spectra: Vec<ChannelSpectrum>,
    pub stats: IngestStats,
}
