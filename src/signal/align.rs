use crate::types::Sample;
use crate::view::AlignedRow;
/// Fraction of a channel's own sample interval within which a neighbour still counts as a match.
pub const MATCH_TOLERANCE_RATIO: f64 = 0.6;
/// Floor for the match tolerance.
pub const MIN_TOLERANCE_MS: f64 = 1.0;
/// Merges independently sampled channels onto one shared time axis.
///
/// Each channel is trimmed to `window_ms` behind its own newest sample, the union of all
/// timestamps becomes the row axis, and every row takes each channel's nearest sample if it
/// lies within `max(0.6 * interval, 1 ms)`. Otherwise that cell is `None`, leaving a gap.
#[derive(Clone, Copy, Debug)]
pub struct ChannelAligner {
    default_interval_ms: f64,
}
impl ChannelAligner {
    pub fn new(default_interval_ms: f64) -> Self {
        Self {
            default_interval_ms: default_interval_ms.max(MIN_TOLERANCE_MS),
        }
    }
    pub fn align(&self, channels: &[&[Sample]], window_ms: i64) -> Vec<AlignedRow> {
        let trimmed: Vec<&[Sample]> = channels
            .iter()
            .map(|samples| trim_to_window(samples, window_ms))
            .collect();
        let tolerances: Vec<f64> = trimmed
            .iter()
            .map(|samples| self.tolerance_ms(samples))
            .collect();
        let mut axis: Vec<i64> = trimmed
            .iter()
            .flat_map(|samples| samples.iter().map(|s| s.time))
            .collect();
        axis.sort_unstable();
        axis.dedup();
        axis.into_iter()
            .map(|t| {
                let values = trimmed
                    .iter()
                    .zip(&tolerances)
                    .map(|(samples, tol)| {
                        nearest(samples, t)
                            .filter(|s| s.time.abs_diff(t) as f64 <= *tol)
                            .map(|s| s.value)
                    })
                    .collect();
                AlignedRow { time: t, values }
            })
            .collect()
    }
    /// Locally estimated spacing of a channel: `(last - first) / (count - 1)`.
    pub fn estimated_interval_ms(&self, samples: &[Sample]) -> f64 {
        match (samples.first(), samples.last()) {
            (Some(first), Some(last)) if samples.len() >= 2 => {
                (last.time - first.time) as f64 / (samples.len() - 1) as f64
            }
            _ => self.default_interval_ms,
        }
    }
    fn tolerance_ms(&self, samples: &[Sample]) -> f64 {
        (MATCH_TOLERANCE_RATIO * self.estimated_interval_ms(samples)).max(MIN_TOLERANCE_MS)
    }
}
fn trim_to_window(samples: &[Sample], window_ms: i64) -> &[Sample] {
    let Some(latest) = samples.last().map(|s| s.time) else {
        return samples;
    };
    let from = latest.saturating_sub(window_ms.max(0));
    let start = samples.partition_point(|s| s.time < from);
    &samples[start..]
}
fn nearest(samples: &[Sample], t: i64) -> Option<&Sample> {
    let idx = samples.partition_point(|s| s.time < t);
    let after = samples.get(idx);
    let before = idx.checked_sub(1).and_then(|i| samples.get(i));
    match (before, after) {
        (Some(b), Some(a)) => {
            if t.abs_diff(b.time) <= a.time.abs_diff(t) {
                Some(b)
            } else {
                Some(a)
            }
        }
        (Some(b), None) => Some(b),
        (None, a) => a,
    }
}
