use std::collections::VecDeque;
use crate::types::Sample;
/// Per-channel ordered sample store.
///
/// Timestamps are kept strictly increasing: a sample that does not move past the
/// newest stored time is bumped to `newest + sample_interval_ms` before insertion.
/// Old samples leave only through [`prune`](Self::prune) or the optional hard cap.
#[derive(Clone, Debug)]
pub struct TimeWindowedBuffer {
    data: VecDeque<Sample>,
    sample_interval_ms: i64,
    max_samples: Option<usize>,
}
impl TimeWindowedBuffer {
    pub fn new(sample_interval_ms: i64) -> Self {
        Self {
            data: VecDeque::new(),
            sample_interval_ms: sample_interval_ms.max(1),
            max_samples: None,
        }
    }
    /// Same as [`new`](Self::new) but never holds more than `max_samples` (oldest evicted first).
    pub fn with_cap(sample_interval_ms: i64, max_samples: usize) -> Self {
        Self {
            data: VecDeque::with_capacity(max_samples.min(4096)),
            sample_interval_ms: sample_interval_ms.max(1),
            max_samples: Some(max_samples.max(1)),
        }
    }
    pub fn sample_interval_ms(&self) -> i64 {
        self.sample_interval_ms
    }
    /// Appends a sample and returns it as stored (possibly with a bumped timestamp).
    /// Non-finite values, and samples that cannot be bumped without overflowing, yield `None`.
    pub fn append(&mut self, sample: Sample) -> Option<Sample> {
        if !sample.value.is_finite() {
            log::debug!("refusing non-finite sample at t={}", sample.time);
            return None;
        }
        let mut stored = sample;
        if let Some(last) = self.data.back() {
            if stored.time <= last.time {
                let Some(bumped) = last.time.checked_add(self.sample_interval_ms) else {
                    log::debug!("refusing sample: no room after t={}", last.time);
                    return None;
                };
                stored.time = bumped;
            }
        }
        self.data.push_back(stored);
        if let Some(cap) = self.max_samples {
            if self.data.len() > cap {
                let excess = self.data.len() - cap;
                self.data.drain(..excess);
            }
        }
        Some(stored)
    }
    /// Drops every sample older than `latest - retention_ms`. Returns how many were removed.
    pub fn prune(&mut self, retention_ms: i64) -> usize {
        let Some(latest) = self.latest_time() else {
            return 0;
        };
        let threshold = latest.saturating_sub(retention_ms.max(0));
        let first_kept = self.data.partition_point(|s| s.time < threshold);
        self.data.drain(..first_kept);
        first_kept
    }
    /// Copies out the samples within `[latest - window_ms, latest]`.
    pub fn window(&self, window_ms: i64) -> Vec<Sample> {
        let Some(latest) = self.latest_time() else {
            return Vec::new();
        };
        let start = self.start_index(latest.saturating_sub(window_ms.max(0)));
        self.data.range(start..).copied().collect()
    }
    pub fn latest_time(&self) -> Option<i64> {
        self.data.back().map(|s| s.time)
    }
    pub fn oldest_time(&self) -> Option<i64> {
        self.data.front().map(|s| s.time)
    }
    pub fn iter(&self) -> impl Iterator<Item = &Sample> {
        self.data.iter()
    }
    pub fn len(&self) -> usize {
        self.data.len()
    }
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
    pub fn clear(&mut self) {
        self.data.clear();
    }
    fn start_index(&self, from_time: i64) -> usize {
        self.data.partition_point(|s| s.time < from_time)
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    fn is_strictly_increasing(buf: &TimeWindowedBuffer) -> bool {
        let times: Vec<i64> = buf.iter().map(|s| s.time).collect();
        times.windows(2).all(|w| w[0] < w[1])
    }
    #[test]
    fn duplicate_timestamps_are_bumped() {
        let mut buf = TimeWindowedBuffer::new(2);
        buf.append(Sample::new(100, 1.0));
        let second = buf.append(Sample::new(100, 2.0)).unwrap();
        let third = buf.append(Sample::new(90, 3.0)).unwrap();
        assert_eq!(second.time, 102);
        assert_eq!(third.time, 104);
        assert_eq!(buf.len(), 3);
    }
    #[test]
    fn adversarial_order_stays_monotonic() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut buf = TimeWindowedBuffer::new(4);
        for _ in 0..2000 {
            let t = rng.gen_range(-500..5000);
            buf.append(Sample::new(t, rng.gen_range(-1.0..1.0)));
            if rng.gen_bool(0.05) {
                buf.prune(1000);
            }
        }
        assert!(is_strictly_increasing(&buf));
    }
    #[test]
    fn non_finite_values_never_enter() {
        let mut buf = TimeWindowedBuffer::new(1);
        assert!(buf.append(Sample::new(0, f64::NAN)).is_none());
        assert!(buf.append(Sample::new(1, f64::INFINITY)).is_none());
        assert!(buf.is_empty());
    }
    #[test]
    fn prune_keeps_exactly_the_retention_window() {
        let mut buf = TimeWindowedBuffer::new(1);
        for t in (0..1000).step_by(10) {
            buf.append(Sample::new(t, t as f64));
        }
        let removed = buf.prune(250);
        // latest = 990, threshold = 740
        assert_eq!(removed, 74);
        assert_eq!(buf.oldest_time(), Some(740));
        assert!(buf.iter().all(|s| s.time >= 740));
        assert_eq!(buf.len(), 26);
    }
    #[test]
    fn window_clamps_to_available_history() {
        let mut buf = TimeWindowedBuffer::new(1);
        assert!(buf.window(1000).is_empty());
        buf.append(Sample::new(500, 0.0));
        buf.append(Sample::new(600, 0.0));
        assert_eq!(buf.window(10_000).len(), 2);
        let recent = buf.window(50);
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].time, 600);
    }
    #[test]
    fn bump_past_the_time_range_is_refused() {
        let mut buf = TimeWindowedBuffer::new(4);
        buf.append(Sample::new(i64::MAX - 1, 1.0));
        assert!(buf.append(Sample::new(0, 2.0)).is_none());
        assert_eq!(buf.len(), 1);
        assert_eq!(buf.latest_time(), Some(i64::MAX - 1));
    }
    #[test]
    fn hard_cap_evicts_oldest() {
        let mut buf = TimeWindowedBuffer::with_cap(1, 3);
        for t in 0..5 {
            buf.append(Sample::new(t, 0.0));
        }
        assert_eq!(buf.len(), 3);
        assert_eq!(buf.oldest_time(), Some(2));
    }
}
