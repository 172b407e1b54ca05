use crate::config::ScopeConfig;
use crate::drivers::frame::{decode_str, DecodedPayload, Frame};
use crate::drivers::ScopeError;
use crate::signal::{
    bin_frequencies, sweep, BiquadFilter, ChannelAligner, FilterChain, FilterParams,
    FilterPurpose, SpectrumAnalyzer, TimeWindowedBuffer,
};
use crate::types::{ChannelId, Sample};
use crate::view::{
    AlignedRow, ChannelSpectrum, ChannelSweep, IngestStats, ScopeSnapshot, SweepView,
};
/// Largest accepted frame timestamp magnitude in ms (2^53, exact in `f64`).
pub const MAX_TIMESTAMP_MS: f64 = 9_007_199_254_740_992.0;
/// What a render tick wants copied out of the ingest state.
#[derive(Clone, Debug, PartialEq)]
pub struct SnapshotPlan {
    pub sweep_channels: Vec<ChannelId>,
    pub sweep_window_ms: i64,
    pub overlay_channels: Vec<ChannelId>,
    pub overlay_window_ms: i64,
    pub spectra: bool,
}
impl SnapshotPlan {
    /// Every channel in sweep and overlay, with the configured windows.
    pub fn from_config(config: &ScopeConfig) -> Self {
        let all: Vec<ChannelId> = (0..config.channel_count as u8).map(ChannelId).collect();
        Self {
            sweep_channels: all.clone(),
            sweep_window_ms: config.sweep_window_ms,
            overlay_channels: all,
            overlay_window_ms: config.overlay_window_ms,
            spectra: true,
        }
    }
}
struct ChannelState {
    buffer: TimeWindowedBuffer,
    filters: FilterChain,
    spectrum: SpectrumAnalyzer,
}
impl ChannelState {
    fn new(config: &ScopeConfig) -> Self {
        Self {
            buffer: TimeWindowedBuffer::with_cap(
                config.sample_interval_ms(),
                config.max_samples_per_channel,
            ),
            filters: FilterChain::new(config.sample_rate_hz),
            spectrum: SpectrumAnalyzer::new(config.spectrum_capacity, config.spectrum_min_samples),
        }
    }
    /// Filters and stores one finite raw value. Returns the stored sample.
    fn ingest(&mut self, time: i64, raw: f64) -> Option<Sample> {
        let filtered = if self.filters.is_passthrough() {
            raw
        } else {
            self.filters.process_sample(raw)
        };
        let stored = self.buffer.append(Sample::new(time, filtered))?;
        self.spectrum.push(filtered);
        Some(stored)
    }
    fn reset(&mut self) {
        self.buffer.clear();
        self.filters.reset();
        self.spectrum.reset();
    }
}
/// Owns every channel's buffer, filter chain and spectrum ring, plus the stream-wide
/// timestamp tracker. Single writer; readers get owned copies.
pub struct StreamIngest {
    config: ScopeConfig,
    channels: Vec<ChannelState>,
    aligner: ChannelAligner,
    last_timestamp_ms: Option<i64>,
    stats: IngestStats,
}
impl StreamIngest {
    pub fn new(config: ScopeConfig) -> Result<Self, ScopeError> {
        config.validate()?;
        let channels = (0..config.channel_count)
            .map(|_| ChannelState::new(&config))
            .collect();
        Ok(Self {
            aligner: ChannelAligner::new(config.aligner_default_interval_ms()),
            channels,
            last_timestamp_ms: None,
            stats: IngestStats::default(),
            config,
        })
    }
    pub fn config(&self) -> &ScopeConfig {
        &self.config
    }
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }
    pub fn stats(&self) -> IngestStats {
        self.stats
    }
    pub fn last_timestamp_ms(&self) -> Option<i64> {
        self.last_timestamp_ms
    }
    /// Decodes and ingests one raw JSON payload. Returns how many frames were accepted.
    pub fn ingest_payload(&mut self, text: &str) -> usize {
        let decoded = decode_str(text);
        self.ingest_decoded(decoded)
    }
    pub fn ingest_decoded(&mut self, decoded: DecodedPayload) -> usize {
        self.record_malformed(decoded.malformed);
        decoded
            .frames
            .iter()
            .filter(|frame| self.ingest_frame(frame))
            .count()
    }
    /// Normalises the frame timestamp and routes each channel value through its filters
    /// into its buffer. Returns `false` if the frame was dropped as malformed.
    pub fn ingest_frame(&mut self, frame: &Frame) -> bool {
        let Some((time, bumped)) = self.resolve_timestamp(frame.timestamp) else {
            log::warn!("dropping frame with unusable timestamp {:?}", frame.timestamp);
            self.record_malformed(1);
            return false;
        };
        let mut routed = 0;
        for &(channel, value) in &frame.values {
            if !value.is_finite() {
                log::debug!("dropping non-finite value on {channel} at t={time}");
                self.stats.samples_non_finite += 1;
                continue;
            }
            let Some(state) = self.channels.get_mut(channel.index()) else {
                log::warn!(
                    "ignoring sample for {channel}: only {} channels configured",
                    self.config.channel_count
                );
                self.stats.samples_unknown_channel += 1;
                continue;
            };
            if let Some(stored) = state.ingest(time, value) {
                routed += 1;
                self.stats.samples_stored += 1;
                if stored.time != time {
                    self.stats.timestamps_bumped += 1;
                }
                state.buffer.prune(self.config.retention_ms);
            }
        }
        // the tracker only moves for frames that stored something
        if routed == 0 {
            log::warn!("dropping frame at t={time}: no usable channel value");
            self.record_malformed(1);
            return false;
        }
        if bumped {
            log::debug!("bumped frame timestamp {:?} to {time}", frame.timestamp);
            self.stats.timestamps_bumped += 1;
        }
        self.stats.frames_accepted += 1;
        self.last_timestamp_ms = Some(time);
        true
    }
    pub fn record_malformed(&mut self, frames: usize) {
        self.stats.frames_malformed += frames as u64;
    }
    pub fn record_backlog_drops(&mut self, frames: usize) {
        self.stats.frames_dropped_backlog += frames as u64;
    }
    /// Converts a raw frame timestamp to ms and bumps it past the last accepted frame.
    /// `None` for non-finite or out-of-range timestamps. Nothing is committed here.
    fn resolve_timestamp(&self, raw: Option<f64>) -> Option<(i64, bool)> {
        let step = self.config.sample_interval_ms();
        let time = match raw {
            Some(ts) => {
                let ms = self.config.timestamp_unit.to_millis(ts).round();
                if !(ms.is_finite() && ms.abs() <= MAX_TIMESTAMP_MS) {
                    return None;
                }
                ms as i64
            }
            None => self.last_timestamp_ms.map_or(0, |last| last.saturating_add(step)),
        };
        match self.last_timestamp_ms {
            Some(last) if time <= last => Some((last.saturating_add(step), true)),
            _ => Some((time, false)),
        }
    }
    fn channel(&self, channel: ChannelId) -> Result<&ChannelState, ScopeError> {
        self.channels
            .get(channel.index())
            .ok_or(ScopeError::UnknownChannel {
                channel,
                channel_count: self.channels.len(),
            })
    }
    fn channel_mut(&mut self, channel: ChannelId) -> Result<&mut ChannelState, ScopeError> {
        let channel_count = self.channels.len();
        self.channels
            .get_mut(channel.index())
            .ok_or(ScopeError::UnknownChannel {
                channel,
                channel_count,
            })
    }
    pub fn get_window(
        &self,
        channel: ChannelId,
        window_ms: i64,
    ) -> Result<Vec<Sample>, ScopeError> {
        Ok(self.channel(channel)?.buffer.window(window_ms))
    }
    pub fn get_sweep(&self, channel: ChannelId, window_ms: i64) -> Result<SweepView, ScopeError> {
        let recent = self.channel(channel)?.buffer.window(window_ms);
        Ok(sweep(&recent, window_ms))
    }
    /// Overlay rows for `channels`, each trimmed to `window_ms` behind its own newest sample.
    /// Row values follow the order of `channels`.
    pub fn get_aligned_overlay(
        &self,
        channels: &[ChannelId],
        window_ms: i64,
    ) -> Result<Vec<AlignedRow>, ScopeError> {
        let windows = channels
            .iter()
            .map(|&ch| self.get_window(ch, window_ms))
            .collect::<Result<Vec<_>, _>>()?;
        let slices: Vec<&[Sample]> = windows.iter().map(Vec::as_slice).collect();
        Ok(self.aligner.align(&slices, window_ms))
    }
    /// Magnitude bins of the channel's spectrum ring; empty below the minimum sample count.
    pub fn get_spectrum(&self, channel: ChannelId) -> Result<Vec<f64>, ScopeError> {
        Ok(self.channel(channel)?.spectrum.spectrum())
    }
    /// Validates and applies a filter configuration. On error the previous one stays active.
    pub fn set_filter(
        &mut self,
        channel: ChannelId,
        purpose: FilterPurpose,
        params: FilterParams,
    ) -> Result<(), ScopeError> {
        let state = self.channel_mut(channel)?;
        if let Err(err) = state.filters.set(purpose, params) {
            log::warn!("rejected {purpose:?} filter for {channel}: {err}");
            return Err(err.into());
        }
        log::debug!("{channel} {purpose:?} filter set to {params:?}");
        Ok(())
    }
    pub fn bypass_filter(
        &mut self,
        channel: ChannelId,
        purpose: FilterPurpose,
    ) -> Result<(), ScopeError> {
        self.channel_mut(channel)?.filters.bypass(purpose);
        Ok(())
    }
    pub fn filter(
        &self,
        channel: ChannelId,
        purpose: FilterPurpose,
    ) -> Result<&BiquadFilter, ScopeError> {
        Ok(self.channel(channel)?.filters.get(purpose))
    }
    /// Clears the channel's samples, filter history and spectrum ring. Filter settings stay.
    pub fn reset_channel(&mut self, channel: ChannelId) -> Result<(), ScopeError> {
        self.channel_mut(channel)?.reset();
        Ok(())
    }
    /// Starts over as if no frame had been seen; filter settings stay.
    pub fn restart_stream(&mut self) {
        log::info!("restarting stream: clearing {} channels", self.channels.len());
        for state in &mut self.channels {
            state.reset();
        }
        self.last_timestamp_ms = None;
        self.stats = IngestStats::default();
    }
    pub fn snapshot(&self, plan: &SnapshotPlan) -> Result<ScopeSnapshot, ScopeError> {
        let sweeps = plan
            .sweep_channels
            .iter()
            .map(|&channel| {
                Ok(ChannelSweep {
                    channel,
                    sweep: self.get_sweep(channel, plan.sweep_window_ms)?,
                })
            })
            .collect::<Result<Vec<_>, ScopeError>>()?;
        let overlay = if plan.overlay_channels.is_empty() {
            Vec::new()
        } else {
            self.get_aligned_overlay(&plan.overlay_channels, plan.overlay_window_ms)?
        };
        let mut spectra = Vec::new();
        if plan.spectra {
            for &channel in &plan.sweep_channels {
                let magnitudes = self.get_spectrum(channel)?;
                let frequencies_hz = bin_frequencies(magnitudes.len(), self.config.sample_rate_hz);
                spectra.push(ChannelSpectrum {
                    channel,
                    magnitudes,
                    frequencies_hz,
                });
            }
        }
        Ok(ScopeSnapshot {
            latest_time: self.last_timestamp_ms,
            sweeps,
            overlay_channels: plan.overlay_channels.clone(),
            overlay,
            spectra,
            stats: self.stats,
        })
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::FilterError;
    fn ingest_with(channel_count: usize) -> StreamIngest {
        StreamIngest::new(ScopeConfig {
            channel_count,
            sample_rate_hz: 250.0,
            ..ScopeConfig::default()
        })
        .unwrap()
    }
    #[test]
    fn frames_route_values_per_channel() {
        let mut ingest = ingest_with(2);
        assert!(ingest.ingest_frame(&Frame::new(0.0).with(0, 1.0).with(1, 10.0)));
        assert!(ingest.ingest_frame(&Frame::new(4.0).with(0, 2.0).with(1, 20.0)));
        let ch1 = ingest.get_window(ChannelId(1), 1000).unwrap();
        assert_eq!(ch1, vec![Sample::new(0, 10.0), Sample::new(4, 20.0)]);
        assert_eq!(ingest.stats().samples_stored, 4);
    }
    #[test]
    fn stale_frame_timestamps_are_bumped_across_calls() {
        let mut ingest = ingest_with(1);
        ingest.ingest_payload(r#"{ "timestamp": 100, "channels": { "0": 1 } }"#);
        ingest.ingest_payload(r#"{ "_batch": [
            { "timestamp": 100, "channels": { "0": 2 } },
            { "timestamp": 50, "channels": { "0": 3 } },
            { "channels": { "0": 4 } }
        ] }"#);
        let times: Vec<i64> = ingest
            .get_window(ChannelId(0), 10_000)
            .unwrap()
            .iter()
            .map(|s| s.time)
            .collect();
        assert_eq!(times, vec![100, 104, 108, 112]);
        assert_eq!(ingest.stats().timestamps_bumped, 2);
        assert_eq!(ingest.last_timestamp_ms(), Some(112));
    }
    #[test]
    fn seconds_timestamps_are_scaled() {
        let mut ingest = StreamIngest::new(ScopeConfig {
            channel_count: 1,
            timestamp_unit: crate::config::TimestampUnit::Seconds,
            ..ScopeConfig::default()
        })
        .unwrap();
        ingest.ingest_frame(&Frame::new(12.5).with(0, 1.0));
        assert_eq!(ingest.last_timestamp_ms(), Some(12_500));
    }
    #[test]
    fn malformed_and_non_finite_input_leaves_state_untouched() {
        let mut ingest = ingest_with(1);
        assert_eq!(ingest.ingest_payload("not json"), 0);
        assert_eq!(ingest.ingest_payload(r#"{ "timestamp": 5 }"#), 0);
        assert!(!ingest.ingest_frame(&Frame::new(f64::NAN).with(0, 1.0)));
        assert!(!ingest.ingest_frame(&Frame::new(10.0).with(0, f64::INFINITY).with(3, 1.0)));
        assert!(ingest.get_window(ChannelId(0), 1000).unwrap().is_empty());
        assert_eq!(ingest.last_timestamp_ms(), None);
        let stats = ingest.stats();
        assert_eq!(stats.frames_accepted, 0);
        assert_eq!(stats.frames_malformed, 4);
        assert_eq!(stats.samples_non_finite, 1);
        assert_eq!(stats.samples_unknown_channel, 1);
        assert_eq!(ingest.get_spectrum(ChannelId(0)).unwrap(), Vec::<f64>::new());
    }
    #[test]
    fn frame_without_usable_channels_does_not_move_the_tracker() {
        let mut ingest = ingest_with(1);
        assert_eq!(
            ingest.ingest_payload(r#"{ "timestamp": 100, "channels": { "x": 1, "0": "bad" } }"#),
            0
        );
        assert!(!ingest.ingest_frame(&Frame::new(100.0)));
        assert_eq!(ingest.last_timestamp_ms(), None);
        assert_eq!(ingest.ingest_payload(r#"{ "timestamp": 100, "channels": { "0": 5.0 } }"#), 1);
        let window = ingest.get_window(ChannelId(0), 1000).unwrap();
        assert_eq!(window, vec![Sample::new(100, 5.0)]);
        assert_eq!(ingest.stats().frames_malformed, 2);
        assert_eq!(ingest.stats().timestamps_bumped, 0);
    }
    #[test]
    fn out_of_range_timestamps_are_malformed() {
        let mut ingest = ingest_with(1);
        assert!(!ingest.ingest_frame(&Frame::new(1e300).with(0, 1.0)));
        assert!(!ingest.ingest_frame(&Frame::new(1e300).with(0, 1.0)));
        assert!(!ingest.ingest_frame(&Frame::new(-1e300).with(0, 1.0)));
        assert_eq!(ingest.stats().frames_malformed, 3);
        assert_eq!(ingest.last_timestamp_ms(), None);
        assert!(ingest.get_sweep(ChannelId(0), 1000).unwrap().is_empty());
        // the largest accepted magnitude still leaves room to bump
        assert!(ingest.ingest_frame(&Frame::new(MAX_TIMESTAMP_MS).with(0, 1.0)));
        assert!(ingest.ingest_frame(&Frame::new(MAX_TIMESTAMP_MS).with(0, 2.0)));
        let sweep = ingest.get_sweep(ChannelId(0), 1000).unwrap();
        assert_eq!(sweep.active.len() + sweep.history.len(), 2);
        assert_eq!(ingest.last_timestamp_ms(), Some((1i64 << 53) + 4));
    }
    #[test]
    fn retention_prunes_on_ingest() {
        let mut ingest = StreamIngest::new(ScopeConfig {
            channel_count: 1,
            sample_rate_hz: 100.0,
            retention_ms: 500,
            ..ScopeConfig::default()
        })
        .unwrap();
        for i in 0..200 {
            ingest.ingest_frame(&Frame::new(i as f64 * 10.0).with(0, 0.0));
        }
        let all = ingest.get_window(ChannelId(0), i64::MAX / 2).unwrap();
        assert_eq!(all.first().map(|s| s.time), Some(1490));
        assert_eq!(all.last().map(|s| s.time), Some(1990));
    }
    #[test]
    fn invalid_filter_keeps_previous_configuration() {
        let mut ingest = ingest_with(1);
        let notch = FilterParams::notch(50.0, 30.0, 250.0);
        ingest.set_filter(ChannelId(0), FilterPurpose::Mains, notch).unwrap();
        let err = ingest
            .set_filter(
                ChannelId(0),
                FilterPurpose::Mains,
                FilterParams::notch(200.0, 30.0, 250.0),
            )
            .unwrap_err();
        assert!(matches!(
            err,
            ScopeError::InvalidFilter(FilterError::AboveNyquist { .. })
        ));
        let active = ingest.filter(ChannelId(0), FilterPurpose::Mains).unwrap();
        assert_eq!(active.params(), &notch);
    }
    #[test]
    fn unknown_channel_is_an_error_on_the_read_api() {
        let ingest = ingest_with(2);
        assert!(matches!(
            ingest.get_sweep(ChannelId(5), 1000),
            Err(ScopeError::UnknownChannel { channel_count: 2, .. })
        ));
    }
    #[test]
    fn filtered_values_feed_buffer_and_spectrum() {
        let mut ingest = ingest_with(1);
        ingest
            .set_filter(
                ChannelId(0),
                FilterPurpose::Band,
                FilterParams::bandpass(10.0, 1.0, 250.0),
            )
            .unwrap();
        for i in 0..64 {
            ingest.ingest_frame(&Frame::new(i as f64 * 4.0).with(0, 1.0));
        }
        let window = ingest.get_window(ChannelId(0), 10_000).unwrap();
        // a DC input decays through a bandpass
        assert!(window.last().unwrap().value.abs() < window[0].value.abs());
        assert_eq!(ingest.get_spectrum(ChannelId(0)).unwrap().len(), 32);
    }
    #[test]
    fn reset_and_restart_clear_state_but_keep_filters() {
        let mut ingest = ingest_with(2);
        let notch = FilterParams::notch(50.0, 30.0, 250.0);
        ingest.set_filter(ChannelId(1), FilterPurpose::Mains, notch).unwrap();
        for i in 0..10 {
            ingest.ingest_frame(&Frame::new(i as f64 * 4.0).with(0, 1.0).with(1, 1.0));
        }
        ingest.reset_channel(ChannelId(0)).unwrap();
        assert!(ingest.get_window(ChannelId(0), 1000).unwrap().is_empty());
        assert_eq!(ingest.get_window(ChannelId(1), 1000).unwrap().len(), 10);
        ingest.restart_stream();
        assert_eq!(ingest.last_timestamp_ms(), None);
        assert!(ingest.get_window(ChannelId(1), 1000).unwrap().is_empty());
        assert_eq!(
            ingest.filter(ChannelId(1), FilterPurpose::Mains).unwrap().params(),
            &notch
        );
        // an earlier timestamp is accepted as-is after a restart
        ingest.ingest_frame(&Frame::new(0.0).with(0, 1.0));
        assert_eq!(ingest.last_timestamp_ms(), Some(0));
    }
    #[test]
    fn overlay_columns_follow_the_requested_channel_order() {
        let mut ingest = ingest_with(4);
        ingest.ingest_frame(&Frame::new(0.0).with(1, 10.0).with(3, 30.0));
        let plan = SnapshotPlan {
            overlay_channels: vec![ChannelId(3), ChannelId(1)],
            ..SnapshotPlan::from_config(ingest.config())
        };
        let snapshot = ingest.snapshot(&plan).unwrap();
        assert_eq!(snapshot.overlay_channels, vec![ChannelId(3), ChannelId(1)]);
        assert_eq!(snapshot.overlay[0].values, vec![Some(30.0), Some(10.0)]);
        let row = serde_json::to_value(&snapshot.overlay[0]).unwrap();
        assert_eq!(row, serde_json::json!({ "time": 0, "ch0": 30.0, "ch1": 10.0 }));
    }
    #[test]
    fn snapshot_is_an_owned_copy() {
        let mut ingest = ingest_with(2);
        for i in 0..40 {
            ingest.ingest_frame(&Frame::new(i as f64 * 4.0).with(0, 1.0).with(1, 2.0));
        }
        let plan = SnapshotPlan::from_config(ingest.config());
        let snapshot = ingest.snapshot(&plan).unwrap();
        ingest.ingest_frame(&Frame::new(1000.0).with(0, 5.0));
        assert_eq!(snapshot.sweeps.len(), 2);
        assert_eq!(snapshot.sweeps[0].sweep.active.len(), 40);
        assert_eq!(snapshot.latest_time, Some(156));
        assert_eq!(snapshot.overlay.len(), 40);
        assert_eq!(snapshot.spectra[0].magnitudes.len(), 32);
        assert_eq!(snapshot.spectra[0].frequencies_hz.len(), 32);
    }
}
