use std::path::Path;
use serde::{Deserialize, Serialize};
use crate::drivers::ScopeError;
use crate::types::MAX_CHANNELS;
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimestampUnit {
    #[default]
    Milliseconds,
    /// LSL-style float seconds.
    Seconds,
}
impl TimestampUnit {
    pub fn to_millis(self, raw: f64) -> f64 {
        match self {
            TimestampUnit::Milliseconds => raw,
            TimestampUnit::Seconds => raw * 1000.0,
        }
    }
}
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScopeConfig {
    pub channel_count: usize,
    pub sample_rate_hz: f64,
    /// How far behind the newest sample each channel buffer keeps data.
    pub retention_ms: i64,
    pub max_samples_per_channel: usize,
    pub sweep_window_ms: i64,
    pub overlay_window_ms: i64,
    pub spectrum_capacity: usize,
    pub spectrum_min_samples: usize,
    /// Aligner fallback spacing for channels with fewer than two samples.
    pub default_interval_ms: Option<f64>,
    pub timestamp_unit: TimestampUnit,
    pub frame_queue_capacity: usize,
    pub tick_hz: f64,
}
impl Default for ScopeConfig {
    fn default() -> Self {
        Self {
            channel_count: 4,
            sample_rate_hz: 512.0,
            retention_ms: 4000,
            max_samples_per_channel: 16_384,
            sweep_window_ms: 1000,
            overlay_window_ms: 2000,
            spectrum_capacity: 256,
            spectrum_min_samples: 32,
            default_interval_ms: None,
            timestamp_unit: TimestampUnit::Milliseconds,
            frame_queue_capacity: 64,
            tick_hz: 60.0,
        }
    }
}
impl ScopeConfig {
    pub fn from_json_str(text: &str) -> Result<Self, ScopeError> {
        let config: ScopeConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ScopeError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }
    pub fn validate(&self) -> Result<(), ScopeError> {
        if !(self.sample_rate_hz.is_finite() && self.sample_rate_hz > 0.0) {
            return Err(ScopeError::InvalidSampleRate);
        }
        if self.channel_count == 0 || self.channel_count > MAX_CHANNELS {
            return Err(ScopeError::InvalidConfig(format!(
                "channel_count must be within 1..={MAX_CHANNELS}, got {}",
                self.channel_count
            )));
        }
        if self.retention_ms <= 0 || self.sweep_window_ms <= 0 || self.overlay_window_ms <= 0 {
            return Err(ScopeError::InvalidConfig(
                "retention and display windows must be positive".into(),
            ));
        }
        if self.max_samples_per_channel == 0 || self.frame_queue_capacity == 0 {
            return Err(ScopeError::InvalidConfig(
                "sample cap and frame queue capacity must be non-zero".into(),
            ));
        }
        if self.spectrum_capacity == 0 || self.spectrum_min_samples > self.spectrum_capacity {
            return Err(ScopeError::InvalidConfig(format!(
                "spectrum_min_samples ({}) exceeds spectrum_capacity ({})",
                self.spectrum_min_samples, self.spectrum_capacity
            )));
        }
        if !(self.tick_hz.is_finite() && self.tick_hz > 0.0) {
            return Err(ScopeError::InvalidConfig("tick_hz must be positive".into()));
        }
        if matches!(self.default_interval_ms, Some(ms) if !(ms.is_finite() && ms > 0.0)) {
            return Err(ScopeError::InvalidConfig(
                "default_interval_ms must be positive".into(),
            ));
        }
        Ok(())
    }
    /// Step used to bump non-increasing timestamps: one sample period, at least 1 ms.
    pub fn sample_interval_ms(&self) -> i64 {
        ((1000.0 / self.sample_rate_hz).round() as i64).max(1)
    }
    pub fn aligner_default_interval_ms(&self) -> f64 {
        self.default_interval_ms
            .unwrap_or(1000.0 / self.sample_rate_hz)
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn defaults_are_valid() {
        let config = ScopeConfig::default();
        config.validate().unwrap();
        assert_eq!(config.sample_interval_ms(), 2);
    }
    #[test]
    fn partial_json_fills_defaults() {
        let config = ScopeConfig::from_json_str(
            r#"{ "channel_count": 2, "sample_rate_hz": 250, "timestamp_unit": "seconds" }"#,
        )
        .unwrap();
        assert_eq!(config.channel_count, 2);
        assert_eq!(config.sample_interval_ms(), 4);
        assert_eq!(config.timestamp_unit, TimestampUnit::Seconds);
        assert_eq!(config.sweep_window_ms, 1000);
    }
    #[test]
    fn rejects_too_many_channels() {
        let err = ScopeConfig::from_json_str(r#"{ "channel_count": 9 }"#).unwrap_err();
        assert!(matches!(err, ScopeError::InvalidConfig(_)));
    }
    #[test]
    fn rejects_bad_rate_and_spectrum_bounds() {
        let mut config = ScopeConfig::default();
        config.sample_rate_hz = 0.0;
        assert!(matches!(config.validate(), Err(ScopeError::InvalidSampleRate)));
        let mut config = ScopeConfig::default();
        config.spectrum_min_samples = 512;
        assert!(config.validate().is_err());
    }
    #[test]
    fn malformed_json_is_a_config_error() {
        let err = ScopeConfig::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, ScopeError::Config(_)));
    }
}
