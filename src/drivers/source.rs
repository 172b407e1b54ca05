use std::collections::VecDeque;
use std::f64::consts::PI;
use std::time::Instant;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use crate::drivers::frame::{decode_str, Frame};
use crate::drivers::ScopeError;
/// Anything that can yield decoded frame batches on demand.
///
/// `Ok(None)` means nothing is available right now; it is not end-of-stream.
pub trait FrameSource {
    fn next_batch(&mut self) -> Result<Option<Vec<Frame>>, ScopeError>;
}
/// In-memory source useful for tests and deterministic playback.
pub struct ManualSource {
    queue: VecDeque<Vec<Frame>>,
    malformed: usize,
}
impl ManualSource {
    pub fn new(batches: impl IntoIterator<Item = Vec<Frame>>) -> Self {
        Self {
            queue: batches.into_iter().collect(),
            malformed: 0,
        }
    }
    /// Decodes JSON payloads up front; malformed ones are logged and counted.
    pub fn from_json_payloads<'a>(payloads: impl IntoIterator<Item = &'a str>) -> Self {
        let mut malformed = 0;
        let queue = payloads
            .into_iter()
            .map(|text| {
                let decoded = decode_str(text);
                malformed += decoded.malformed;
                decoded.frames
            })
            .collect();
        Self { queue, malformed }
    }
    pub fn push(&mut self, batch: Vec<Frame>) {
        self.queue.push_back(batch);
    }
    pub fn malformed(&self) -> usize {
        self.malformed
    }
    pub fn is_drained(&self) -> bool {
        self.queue.is_empty()
    }
}
impl FrameSource for ManualSource {
    fn next_batch(&mut self) -> Result<Option<Vec<Frame>>, ScopeError> {
        Ok(self.queue.pop_front())
    }
}
/// Synthetic multi-channel biosignal: one sine per channel, a mains component and noise.
///
/// Timestamps are generated in milliseconds from a sample counter, so consecutive frames can
/// share the same integer millisecond at high rates.
pub struct SimulatedSource {
    sample_rate_hz: f64,
    channel_count: u8,
    frames_per_batch: usize,
    mains_hz: f64,
    noise_amplitude: f64,
    sample_index: u64,
    limit: Option<u64>,
    paced_from: Option<Instant>,
    rng: StdRng,
}
impl SimulatedSource {
    pub fn new(sample_rate_hz: f64, channel_count: u8, seed: u64) -> Self {
        Self {
            sample_rate_hz,
            channel_count,
            frames_per_batch: ((sample_rate_hz / 30.0).ceil() as usize).max(1),
            mains_hz: 50.0,
            noise_amplitude: 2.0,
            sample_index: 0,
            limit: None,
            paced_from: None,
            rng: StdRng::seed_from_u64(seed),
        }
    }
    pub fn with_mains_hz(mut self, mains_hz: f64) -> Self {
        self.mains_hz = mains_hz;
        self
    }
    pub fn with_noise(mut self, amplitude: f64) -> Self {
        self.noise_amplitude = amplitude.max(0.0);
        self
    }
    pub fn with_frames_per_batch(mut self, frames: usize) -> Self {
        self.frames_per_batch = frames.max(1);
        self
    }
    /// Stop after `samples` frames in total.
    pub fn with_limit(mut self, samples: u64) -> Self {
        self.limit = Some(samples);
        self
    }
    /// Only emit the samples that are due by wall clock since the first poll.
    pub fn realtime(mut self) -> Self {
        self.paced_from = Some(Instant::now());
        self
    }
    fn channel_value(&mut self, channel: u8, t_secs: f64) -> f64 {
        // alpha-ish rhythm, one step higher per channel
        let rhythm_hz = 8.0 + 2.0 * channel as f64;
        let rhythm = 40.0 * (2.0 * PI * rhythm_hz * t_secs).sin();
        let mains = 10.0 * (2.0 * PI * self.mains_hz * t_secs).sin();
        let noise = if self.noise_amplitude > 0.0 {
            self.rng.gen_range(-self.noise_amplitude..self.noise_amplitude)
        } else {
            0.0
        };
        rhythm + mains + noise
    }
}
impl FrameSource for SimulatedSource {
    fn next_batch(&mut self) -> Result<Option<Vec<Frame>>, ScopeError> {
        let mut count = match self.paced_from {
            Some(start) => {
                let due = (start.elapsed().as_secs_f64() * self.sample_rate_hz) as u64;
                due.saturating_sub(self.sample_index)
            }
            None => self.frames_per_batch as u64,
        };
        if let Some(limit) = self.limit {
            count = count.min(limit.saturating_sub(self.sample_index));
        }
        if count == 0 {
            return Ok(None);
        }
        let mut batch = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let t_secs = self.sample_index as f64 / self.sample_rate_hz;
            let t_ms = (self.sample_index as f64 * 1000.0 / self.sample_rate_hz).floor();
            let mut frame = Frame::new(t_ms);
            for ch in 0..self.channel_count {
                let value = self.channel_value(ch, t_secs);
                frame = frame.with(ch, value);
            }
            batch.push(frame);
            self.sample_index += 1;
        }
        Ok(Some(batch))
    }
}
